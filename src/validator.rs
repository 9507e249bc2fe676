//! Structural and reference validation.
//!
//! `validate_shape` walks the union of declared and present property names
//! and applies a fixed per-property check sequence; a terminating condition
//! stops further checks for that property only, never for the whole object.
//! Two modes exist and are intentionally asymmetric:
//!
//! - full: required properties must be present, whole-object predicates run,
//!   readonly properties are acceptable
//! - patch: absence is always acceptable, whole-object predicates are
//!   skipped, readonly properties present in the patch are forbidden
//!   (`immutable`)
//!
//! Link validation checks shape only (identifier class or embedded record);
//! existence of the referenced instance is out of scope.

use crate::category::{CategoryRef, FieldKind, LinkMode, Shape};
use crate::domain::validate_domain;
use crate::errors::{ErrorKind, ValidationError};
use crate::registry::Registry;
use crate::value::Value;

/// Validation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Whole-value validation
    Full,
    /// Partial-update validation
    Patch,
}

impl Mode {
    /// Whether this is patch mode.
    pub fn is_patch(&self) -> bool {
        matches!(self, Mode::Patch)
    }
}

/// Validates an object against a shape. Returns every defect found.
pub fn validate_shape(
    registry: &Registry,
    shape: &Shape,
    object: &Value,
    mode: Mode,
    path: &str,
) -> Vec<ValidationError> {
    let record = match object {
        Value::Record(pairs) => pairs,
        other => {
            return vec![ValidationError::invalid_type(
                path,
                "struct",
                other.kind().as_str(),
            )]
        }
    };

    // declared properties in declaration order, then undeclared extras in
    // object order
    let mut names: Vec<&str> = shape.iter().map(|(name, _)| name).collect();
    for (name, _) in record {
        if !shape.contains(name) {
            names.push(name);
        }
    }

    let mut errors = Vec::new();
    for name in names {
        let field_path = format!("{}.{}", path, name);

        let Some(def) = shape.get(name) else {
            errors.push(ValidationError::new(
                ErrorKind::UnresolvedProperty,
                field_path,
            ));
            continue;
        };

        if let FieldKind::Validate(check) = &def.kind {
            if !mode.is_patch() && !check.call(object) {
                errors.push(ValidationError::new(ErrorKind::Validation, field_path));
            }
            continue;
        }

        let Some(value) = object.get(name) else {
            if def.required && !mode.is_patch() {
                errors.push(ValidationError::new(
                    ErrorKind::MissingProperty,
                    field_path,
                ));
            }
            continue;
        };

        // read-only fields reject the values a patch supplies; absence above
        // is always acceptable
        if def.read_only && mode.is_patch() {
            errors.push(ValidationError::new(ErrorKind::Immutable, field_path));
            continue;
        }

        if value.is_null() {
            if def.required {
                errors.push(ValidationError::new(ErrorKind::EmptyValue, field_path));
            }
            continue;
        }

        match &def.kind {
            FieldKind::Scalar { domain } => match registry.domain_ref(domain) {
                Some(domain) => errors.extend(validate_domain(value, &field_path, domain)),
                None => errors.push(ValidationError::undefined_entity(field_path.clone())),
            },
            FieldKind::Link {
                category,
                mode: link_mode,
                ..
            } => errors.extend(validate_link(
                registry, value, &field_path, category, *link_mode, mode,
            )),
            // transform fields bypass validation entirely
            FieldKind::Transform(_) => {}
            FieldKind::Validate(_) | FieldKind::Action(_) => {}
        }

        if let Some(check) = &def.validate {
            if !check.call(value) {
                errors.push(ValidationError::new(ErrorKind::PropValidation, field_path));
            }
        }
    }

    errors
}

/// Validates a link value: embedded record, sequence of links, or a single
/// identifier, depending on the link mode.
pub fn validate_link(
    registry: &Registry,
    value: &Value,
    path: &str,
    category: &CategoryRef,
    link_mode: LinkMode,
    mode: Mode,
) -> Vec<ValidationError> {
    match link_mode {
        LinkMode::Include => match registry.category_ref(category) {
            Some(linked) => validate_shape(registry, &linked.shape, value, mode, path),
            None => vec![ValidationError::undefined_entity(path)],
        },
        LinkMode::Many => match value {
            Value::Sequence(elements) => {
                let mut errors = Vec::new();
                for (index, element) in elements.iter().enumerate() {
                    errors.extend(check_identifier(element, &format!("{}[{}]", path, index)));
                }
                errors
            }
            other => vec![ValidationError::invalid_type(
                path,
                "sequence",
                other.kind().as_str(),
            )],
        },
        LinkMode::Single => check_identifier(value, path),
    }
}

/// A link identifier must be the unsigned 64-bit wrapper or a string.
fn check_identifier(value: &Value, path: &str) -> Vec<ValidationError> {
    match value {
        Value::Uint(_) | Value::Str(_) => Vec::new(),
        other => vec![ValidationError::invalid_class(
            path,
            "Uint64",
            other.class_name(),
        )],
    }
}
