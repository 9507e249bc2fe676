//! Domain value validation.
//!
//! `validate_domain` is pure: one domain, one value, a list of defects.
//! Check order is fixed: type tag, then kind-specific rules, then
//! enum/flags membership, then the author check predicate. A type or class
//! mismatch short-circuits the remaining checks; everything else
//! accumulates.

use crate::errors::{DomainReason, ErrorKind, ValidationError};
use crate::value::{Value, ValueKind};

use super::{Domain, DomainDecor, Subtype};

/// Validates a value against a single domain definition. Never panics.
pub fn validate_domain(value: &Value, path: &str, domain: &Domain) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(kind) = domain.kind {
        if value.kind() != kind {
            errors.push(ValidationError::invalid_type(
                path,
                kind.as_str(),
                value.kind().as_str(),
            ));
            return errors;
        }
        match kind {
            ValueKind::String => check_string(value, path, domain, &mut errors),
            ValueKind::Number => check_number(value, path, domain, &mut errors),
            ValueKind::Struct => {
                if !check_struct(value, path, domain, &mut errors) {
                    // class mismatch: no further checks make sense
                    return errors;
                }
            }
            // exact-integer, boolean, function, symbol: the tag is the check
            _ => {}
        }
    }

    match &domain.decor {
        DomainDecor::Enum { values } => {
            if !values.contains(value) {
                errors.push(ValidationError::not_in_enum(path, values, value));
            }
        }
        DomainDecor::Flags { .. } => {
            if !matches!(value, Value::Flags(_) | Value::Uint(_)) {
                errors.push(ValidationError::invalid_class(
                    path,
                    "Flags",
                    value.class_name(),
                ));
            }
        }
        DomainDecor::Plain => {}
    }

    if let Some(check) = &domain.check {
        if !check.call(value) {
            errors.push(ValidationError::new(
                ErrorKind::DomainValidation(DomainReason::Check),
                path,
            ));
        }
    }

    errors
}

fn check_string(value: &Value, path: &str, domain: &Domain, errors: &mut Vec<ValidationError>) {
    let length = value.length().unwrap_or(0);
    if let Some(min) = domain.min {
        if (length as f64) < min {
            errors.push(ValidationError::domain(DomainReason::Min, path));
        }
    }
    if let Some(max_length) = domain.length {
        if length > max_length {
            errors.push(ValidationError::domain(DomainReason::Length, path));
        }
    }
}

fn check_number(value: &Value, path: &str, domain: &Domain, errors: &mut Vec<ValidationError>) {
    let number = match value {
        Value::Float(f) => *f,
        // kind already matched Number, so this arm is unreachable in practice
        _ => f64::NAN,
    };
    // bounds hold only when the comparison is explicitly true, so NaN fails
    // both configured bounds
    if let Some(min) = domain.min {
        if !(number >= min) {
            errors.push(ValidationError::domain(DomainReason::Min, path));
        }
    }
    if let Some(max) = domain.max {
        if !(number <= max) {
            errors.push(ValidationError::domain(DomainReason::Max, path));
        }
    }
    if domain.subtype == Some(Subtype::Integer) && !(number.is_finite() && number.fract() == 0.0) {
        errors.push(ValidationError::domain(DomainReason::Subtype, path));
    }
}

/// Returns false when the class mismatched and validation must stop.
fn check_struct(
    value: &Value,
    path: &str,
    domain: &Domain,
    errors: &mut Vec<ValidationError>,
) -> bool {
    if let Some(class) = &domain.class {
        if value.class_name() != class {
            errors.push(ValidationError::invalid_class(
                path,
                class,
                value.class_name(),
            ));
            return false;
        }
    }
    if let Some(max_length) = domain.length {
        if let Some(length) = value.length() {
            if length > max_length {
                errors.push(ValidationError::domain(DomainReason::Length, path));
            }
        }
    }
    true
}
