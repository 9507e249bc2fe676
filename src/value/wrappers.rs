//! Structured-object wrapper classes and their constructor table.
//!
//! Domains with a declared `class` construct instances through one of the
//! named constructors below. Every constructor is total: construction failure
//! yields `None`, never a panic or an error propagation.

use std::collections::BTreeMap;
use std::fmt;

use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use super::Value;

/// A monetary value: minor units (two decimal places) plus an optional
/// currency code. Stored exactly; no floating point survives construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Money {
    units: i64,
    currency: Option<String>,
}

impl Money {
    /// Creates a monetary value from minor units.
    pub fn new(units: i64, currency: Option<String>) -> Self {
        Self { units, currency }
    }

    /// Parses text such as `"12.50"` or `"12.50 USD"`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.trim().split_whitespace();
        let amount = parts.next()?;
        let currency = parts.next().map(str::to_string);
        if parts.next().is_some() {
            return None;
        }
        let units = parse_minor_units(amount)?;
        Some(Self { units, currency })
    }

    /// Converts a number of whole units, accepting at most two decimals.
    pub fn from_number(amount: f64) -> Option<Self> {
        if !amount.is_finite() {
            return None;
        }
        let scaled = amount * 100.0;
        let rounded = scaled.round();
        if (scaled - rounded).abs() > 1e-6 || rounded.abs() > i64::MAX as f64 {
            return None;
        }
        Some(Self {
            units: rounded as i64,
            currency: None,
        })
    }

    /// Minor units (e.g. cents).
    pub fn units(&self) -> i64 {
        self.units
    }

    /// Currency code, if any.
    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.units < 0 { "-" } else { "" };
        let abs = self.units.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)?;
        if let Some(currency) = &self.currency {
            write!(f, " {}", currency)?;
        }
        Ok(())
    }
}

/// Parses a decimal amount with at most two fraction digits into minor units.
fn parse_minor_units(text: &str) -> Option<i64> {
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, text),
    };
    let (whole, fraction) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };
    if whole.is_empty() || fraction.len() > 2 {
        return None;
    }
    let whole: i64 = whole.parse().ok()?;
    let fraction: i64 = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<2}", fraction);
        padded.parse().ok()?
    };
    whole
        .checked_mul(100)?
        .checked_add(fraction)
        .map(|units| sign * units)
}

/// Constructs an instance of the named wrapper class from a raw value.
///
/// This is the dispatch table used by domain instance construction for
/// structured-object domains. Unknown class names yield `None`.
pub fn construct_class(class: &str, value: &Value) -> Option<Value> {
    match class {
        "Money" => construct_money(value),
        "Bytes" => construct_bytes(value),
        "Dict" => construct_dict(value),
        "Group" => construct_group(value),
        "Timestamp" => construct_timestamp(value),
        _ => None,
    }
}

fn construct_money(value: &Value) -> Option<Value> {
    let money = match value {
        Value::Money(m) => m.clone(),
        Value::Str(s) => Money::parse(s)?,
        Value::Float(f) => Money::from_number(*f)?,
        Value::Int(i) => Money::new(i.checked_mul(100)?, None),
        Value::Uint(u) => Money::new(i64::try_from(*u).ok()?.checked_mul(100)?, None),
        _ => return None,
    };
    Some(Value::Money(money))
}

fn construct_bytes(value: &Value) -> Option<Value> {
    let bytes = match value {
        Value::Bytes(b) => b.clone(),
        Value::Str(s) => base64::engine::general_purpose::STANDARD.decode(s).ok()?,
        Value::Sequence(elements) => {
            let mut bytes = Vec::with_capacity(elements.len());
            for element in elements {
                let byte = match element {
                    Value::Int(i) => u8::try_from(*i).ok()?,
                    Value::Uint(u) => u8::try_from(*u).ok()?,
                    Value::Float(f) if f.fract() == 0.0 && (0.0..=255.0).contains(f) => *f as u8,
                    _ => return None,
                };
                bytes.push(byte);
            }
            bytes
        }
        _ => return None,
    };
    Some(Value::Bytes(bytes))
}

fn construct_dict(value: &Value) -> Option<Value> {
    let map: BTreeMap<String, Value> = match value {
        Value::Dict(m) => m.clone(),
        Value::Record(pairs) => pairs.iter().cloned().collect(),
        _ => return None,
    };
    Some(Value::Dict(map))
}

fn construct_group(value: &Value) -> Option<Value> {
    let elements = match value {
        Value::Group(g) => g.clone(),
        Value::Sequence(elements) => {
            let mut unique: Vec<Value> = Vec::with_capacity(elements.len());
            for element in elements {
                if !unique.contains(element) {
                    unique.push(element.clone());
                }
            }
            unique
        }
        _ => return None,
    };
    Some(Value::Group(elements))
}

fn construct_timestamp(value: &Value) -> Option<Value> {
    let timestamp: DateTime<Utc> = match value {
        Value::Timestamp(t) => *t,
        Value::Str(s) => DateTime::parse_from_rfc3339(s).ok()?.with_timezone(&Utc),
        Value::Int(i) => Utc.timestamp_opt(*i, 0).single()?,
        Value::Uint(u) => Utc.timestamp_opt(i64::try_from(*u).ok()?, 0).single()?,
        Value::Float(f) if f.is_finite() => {
            let seconds = f.trunc() as i64;
            let nanos = ((f.fract().abs()) * 1e9) as u32;
            Utc.timestamp_opt(seconds, nanos).single()?
        }
        _ => return None,
    };
    Some(Value::Timestamp(timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_parse() {
        let m = Money::parse("12.50 USD").unwrap();
        assert_eq!(m.units(), 1250);
        assert_eq!(m.currency(), Some("USD"));
        assert_eq!(m.to_string(), "12.50 USD");

        assert_eq!(Money::parse("-3.7").unwrap().units(), -370);
        assert!(Money::parse("12.505").is_none());
        assert!(Money::parse("abc").is_none());
    }

    #[test]
    fn test_money_from_number() {
        assert_eq!(Money::from_number(12.5).unwrap().units(), 1250);
        assert!(Money::from_number(12.505).is_none());
        assert!(Money::from_number(f64::NAN).is_none());
    }

    #[test]
    fn test_bytes_from_base64_and_sequence() {
        let v = construct_class("Bytes", &Value::from("aGk=")).unwrap();
        assert_eq!(v, Value::Bytes(b"hi".to_vec()));

        let v = construct_class(
            "Bytes",
            &Value::Sequence(vec![Value::Float(104.0), Value::Float(105.0)]),
        )
        .unwrap();
        assert_eq!(v, Value::Bytes(b"hi".to_vec()));

        assert!(construct_class("Bytes", &Value::Sequence(vec![Value::Float(300.0)])).is_none());
    }

    #[test]
    fn test_dict_from_record() {
        let v = construct_class(
            "Dict",
            &Value::record([("b", Value::Float(1.0)), ("a", Value::Float(2.0))]),
        )
        .unwrap();
        match v {
            Value::Dict(m) => assert_eq!(m.len(), 2),
            other => panic!("expected dict, got {:?}", other),
        }
    }

    #[test]
    fn test_group_deduplicates() {
        let v = construct_class(
            "Group",
            &Value::Sequence(vec![Value::from("a"), Value::from("a"), Value::from("b")]),
        )
        .unwrap();
        assert_eq!(v.length(), Some(2));
    }

    #[test]
    fn test_timestamp_from_string_and_epoch() {
        let v = construct_class("Timestamp", &Value::from("2026-01-01T00:00:00Z")).unwrap();
        match v {
            Value::Timestamp(t) => assert_eq!(t.timestamp(), 1767225600),
            other => panic!("expected timestamp, got {:?}", other),
        }
        assert!(construct_class("Timestamp", &Value::from("yesterday")).is_none());
        assert!(construct_class("Timestamp", &Value::Int(0)).is_some());
    }

    #[test]
    fn test_unknown_class() {
        assert!(construct_class("Blob", &Value::from("x")).is_none());
    }
}
