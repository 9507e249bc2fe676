//! Category instance factory.
//!
//! Builds a typed record from raw positional or keyed input using the same
//! coercion rules as domain construction. Construction is all-or-nothing:
//! the first property that fails to coerce aborts the whole call. Positional
//! input is arity-checked against the declared shape; surplus values are an
//! error, missing trailing values fall through to default/required
//! resolution.

use crate::domain::{create_instance, wrap_int64};
use crate::errors::CreateError;
use crate::registry::Registry;
use crate::value::Value;

use super::{Category, FieldDef, FieldKind, LinkMode};

/// Raw factory input, classified from the caller's argument list.
enum Input<'a> {
    Positional(&'a [Value]),
    Keyed(&'a Value),
}

/// Classifies the argument list: one sequence is positional, one record is
/// keyed, anything else is treated as positional values.
fn classify(args: &[Value]) -> Input<'_> {
    match args {
        [Value::Sequence(values)] => Input::Positional(values),
        [record @ Value::Record(_)] => Input::Keyed(record),
        _ => Input::Positional(args),
    }
}

/// Constructs an instance of `category` from raw input.
pub(crate) fn create_record(
    registry: &Registry,
    category: &Category,
    args: &[Value],
) -> Result<Value, CreateError> {
    let input = classify(args);

    // whole-object predicate properties never consume input
    let consumable: Vec<(&str, &FieldDef)> = category
        .shape
        .iter()
        .filter(|(_, def)| !matches!(def.kind, FieldKind::Validate(_)))
        .collect();

    if let Input::Positional(values) = &input {
        if values.len() > consumable.len() {
            return Err(CreateError::Arity {
                category: category.name.clone(),
                declared: consumable.len(),
                given: values.len(),
            });
        }
    }

    let mut built: Vec<(String, Value)> = Vec::with_capacity(consumable.len());

    for (position, (name, def)) in consumable.iter().enumerate() {
        let raw = match &input {
            Input::Positional(values) => values.get(position),
            Input::Keyed(record) => record.get(name),
        };
        let path = || format!("{}.{}", category.name, name);

        match raw {
            Some(raw) => {
                let value = construct_field(registry, category, name, def, raw)?;
                built.push((name.to_string(), value));
            }
            None => {
                if let Some(default) = &def.default {
                    let value = construct_field(registry, category, name, def, default)?;
                    built.push((name.to_string(), value));
                } else if def.required {
                    return Err(CreateError::MissingRequired { path: path() });
                }
                // optional with no default: omitted from the result
            }
        }
    }

    Ok(Value::Record(built))
}

/// Constructs one property value according to its field descriptor.
fn construct_field(
    registry: &Registry,
    category: &Category,
    name: &str,
    def: &FieldDef,
    raw: &Value,
) -> Result<Value, CreateError> {
    let path = format!("{}.{}", category.name, name);
    match &def.kind {
        FieldKind::Transform(f) => Ok(f.call(raw.clone())),
        FieldKind::Scalar { domain } => {
            let domain = registry
                .domain_ref(domain)
                .ok_or_else(|| CreateError::UndefinedDomain {
                    name: registry.domain_ref_name(domain),
                })?;
            create_instance(domain, raw).ok_or(CreateError::Coercion { path })
        }
        FieldKind::Link {
            category: linked,
            mode,
            ..
        } => {
            let linked = registry
                .category_ref(linked)
                .ok_or_else(|| CreateError::UndefinedCategory {
                    name: registry.category_ref_name(linked),
                })?;
            match (mode, raw) {
                (LinkMode::Many, Value::Sequence(elements)) => {
                    let mut links = Vec::with_capacity(elements.len());
                    for element in elements {
                        links.push(construct_link(registry, linked, element, &path)?);
                    }
                    Ok(Value::Sequence(links))
                }
                _ => construct_link(registry, linked, raw, &path),
            }
        }
        // actions are extracted before commit; validate fields are filtered
        FieldKind::Validate(_) | FieldKind::Action(_) => {
            Err(CreateError::Coercion { path })
        }
    }
}

/// A structured object constructs a nested instance through the linked
/// category's own factory; anything else becomes a signed 64-bit reference.
fn construct_link(
    registry: &Registry,
    linked: &Category,
    raw: &Value,
    path: &str,
) -> Result<Value, CreateError> {
    match raw {
        Value::Record(_) => create_record(registry, linked, std::slice::from_ref(raw)),
        other => wrap_int64(other).ok_or_else(|| CreateError::Coercion {
            path: path.to_string(),
        }),
    }
}
