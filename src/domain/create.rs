//! Domain instance construction (coercion).
//!
//! Used by category factories, not by the validator. Construction is
//! fail-closed: `None` means the value cannot become an instance of the
//! domain. Order: normalize, then parse (which owns everything when
//! present), then decorator semantics, then kind-specific wrapping, then an
//! exact kind match.

use crate::value::{construct_class, FlagSet, Value, ValueKind};

use super::{Domain, DomainDecor};

/// Coerces a raw value into an instance of the domain, or `None`.
pub fn create_instance(domain: &Domain, value: &Value) -> Option<Value> {
    let value = match &domain.normalize {
        Some(normalize) => normalize.call(value.clone()),
        None => value.clone(),
    };

    if let Some(parse) = &domain.parse {
        // parse owns all validation; its result is final
        return parse.call(&value);
    }

    match &domain.decor {
        DomainDecor::Enum { values } => {
            return values.iter().find(|permitted| **permitted == value).cloned();
        }
        DomainDecor::Flags { values, .. } => return create_flags(&value, values),
        DomainDecor::Plain => {}
    }

    match domain.kind {
        Some(ValueKind::Integer) => wrap_int64(&value),
        Some(ValueKind::Struct) => match &domain.class {
            Some(class) => construct_class(class, &value),
            None => (value.kind() == ValueKind::Struct).then_some(value),
        },
        Some(kind) => (value.kind() == kind).then_some(value),
        None => Some(value),
    }
}

/// String and number input are raw bit patterns; sequences are member lists
/// combined by bit position within the flag value set.
fn create_flags(value: &Value, allowed: &[Value]) -> Option<Value> {
    let flags = match value {
        Value::Flags(flags) => *flags,
        Value::Uint(bits) => FlagSet::new(*bits),
        Value::Int(bits) => FlagSet::new(u64::try_from(*bits).ok()?),
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 && *f >= 0.0 => {
            FlagSet::new(*f as u64)
        }
        Value::Str(text) => FlagSet::parse(text)?,
        Value::Sequence(members) => FlagSet::from_members(members, allowed)?,
        _ => return None,
    };
    Some(Value::Flags(flags))
}

/// Coerces a raw value into the signed 64-bit wrapper. Also used by
/// category factories to build link references.
pub(crate) fn wrap_int64(value: &Value) -> Option<Value> {
    let wrapped = match value {
        Value::Int(i) => *i,
        Value::Uint(u) => i64::try_from(*u).ok()?,
        Value::Float(f)
            if f.is_finite() && f.fract() == 0.0 && (i64::MIN as f64..=i64::MAX as f64).contains(f) =>
        {
            *f as i64
        }
        Value::Str(text) => text.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    Some(Value::Int(wrapped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParseFn;
    use crate::value::FnValue;

    #[test]
    fn test_exact_kind_pass_through() {
        let name = Domain::scalar("Name", ValueKind::String);
        assert_eq!(
            create_instance(&name, &Value::from("Ann")),
            Some(Value::from("Ann"))
        );
        assert_eq!(create_instance(&name, &Value::Float(1.0)), None);
    }

    #[test]
    fn test_normalize_applies_first() {
        let name = Domain::scalar("Name", ValueKind::String).with_normalize(FnValue::new(|v| {
            match v {
                Value::Str(s) => Value::Str(s.trim().to_string()),
                other => other,
            }
        }));
        assert_eq!(
            create_instance(&name, &Value::from("  Ann ")),
            Some(Value::from("Ann"))
        );
    }

    #[test]
    fn test_parse_owns_construction() {
        let port = Domain::scalar("Port", ValueKind::Number).with_parse(ParseFn::new(|v| {
            match v {
                Value::Str(s) => s.parse::<f64>().ok().map(Value::Float),
                _ => None,
            }
        }));
        assert_eq!(
            create_instance(&port, &Value::from("8080")),
            Some(Value::Float(8080.0))
        );
        // parse rejects anything it does not understand, even valid numbers
        assert_eq!(create_instance(&port, &Value::Float(80.0)), None);
    }

    #[test]
    fn test_enum_returns_canonical_member() {
        let color =
            Domain::enumeration("Color", vec![Value::from("Red"), Value::from("Green")]);
        assert_eq!(
            create_instance(&color, &Value::from("Green")),
            Some(Value::from("Green"))
        );
        assert_eq!(create_instance(&color, &Value::from("Blue")), None);
    }

    #[test]
    fn test_flags_from_raw_and_members() {
        let perms = Domain::flags("Perms", vec![Value::from("r"), Value::from("w")]);
        assert_eq!(
            create_instance(&perms, &Value::from("3")),
            Some(Value::Flags(FlagSet::new(3)))
        );
        assert_eq!(
            create_instance(&perms, &Value::Float(2.0)),
            Some(Value::Flags(FlagSet::new(2)))
        );
        assert_eq!(
            create_instance(
                &perms,
                &Value::Sequence(vec![Value::from("r"), Value::from("w")])
            ),
            Some(Value::Flags(FlagSet::new(0b11)))
        );
        assert_eq!(
            create_instance(&perms, &Value::Sequence(vec![Value::from("x")])),
            None
        );
    }

    #[test]
    fn test_integer_wrapping() {
        let id = Domain::scalar("Id", ValueKind::Integer);
        assert_eq!(create_instance(&id, &Value::Float(42.0)), Some(Value::Int(42)));
        assert_eq!(create_instance(&id, &Value::from("42")), Some(Value::Int(42)));
        assert_eq!(create_instance(&id, &Value::Float(4.2)), None);
        assert_eq!(create_instance(&id, &Value::Bool(true)), None);
    }

    #[test]
    fn test_structured_dispatch() {
        let price = Domain::structured("Price", "Money");
        assert!(matches!(
            create_instance(&price, &Value::from("12.50 USD")),
            Some(Value::Money(_))
        ));
        assert_eq!(create_instance(&price, &Value::Bool(true)), None);
    }
}
