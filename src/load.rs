//! Reference loader collaborator: JSON schema fragment files.
//!
//! The assembly pipeline places no constraint on where fragments come from;
//! this loader is the crate's own collaborator for directory-based schemas.
//! Each `*.json` file may carry `domains`, `categories`, `actions`, `views`,
//! `forms`, and `displayModes` sections. Property order in category
//! definitions is preserved (positional factories depend on it). Author
//! callables are not expressible in JSON; loaded definitions simply carry
//! none.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Map;
use thiserror::Error;

use crate::category::{
    Action, ActionDef, CategoryData, FieldDef, LinkMode, Relation, Shape,
};
use crate::domain::{Domain, DomainDecor, Subtype};
use crate::registry::{Fragment, SchemaSource};
use crate::value::{Value, ValueKind};

/// Loader failure, naming the offending file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Directory or file could not be read.
    #[error("failed to read '{path}': {reason}")]
    Io {
        /// Offending path
        path: String,
        /// Underlying reason
        reason: String,
    },

    /// File content is not a valid schema fragment.
    #[error("malformed schema file '{path}': {reason}")]
    Malformed {
        /// Offending path
        path: String,
        /// What was wrong
        reason: String,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaFile {
    #[serde(default)]
    domains: Map<String, serde_json::Value>,
    #[serde(default)]
    categories: Map<String, serde_json::Value>,
    #[serde(default)]
    actions: Map<String, serde_json::Value>,
    #[serde(default)]
    views: Map<String, serde_json::Value>,
    #[serde(default)]
    forms: Map<String, serde_json::Value>,
    #[serde(default)]
    display_modes: Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct DomainSpec {
    #[serde(rename = "type")]
    kind: Option<ValueKind>,
    min: Option<f64>,
    max: Option<f64>,
    length: Option<usize>,
    subtype: Option<Subtype>,
    class: Option<String>,
    #[serde(rename = "enum")]
    enumeration: Option<Vec<serde_json::Value>>,
    flags: Option<Vec<serde_json::Value>>,
    enum_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldEntry {
    /// Shorthand: a bare domain name
    Domain(String),
    /// Full field descriptor
    Full(FieldSpec),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FieldSpec {
    domain: Option<String>,
    category: Option<String>,
    mode: Option<LinkMode>,
    relation: Option<Relation>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    read_only: bool,
    default: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ActionSpec {
    category: String,
    #[serde(default)]
    args: Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct DataSpec {
    category: String,
    #[serde(default)]
    definition: serde_json::Value,
}

/// Loads every `*.json` fragment file in a directory, in file-name order.
pub fn load_dir(dir: &Path) -> Result<Vec<(Fragment, SchemaSource)>, LoadError> {
    let entries = fs::read_dir(dir).map_err(|e| LoadError::Io {
        path: dir.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut paths: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut fragments = Vec::new();
    for path in paths {
        load_file(&path, &mut fragments)?;
    }
    Ok(fragments)
}

/// Loads a single schema fragment file.
pub fn load_file(
    path: &Path,
    fragments: &mut Vec<(Fragment, SchemaSource)>,
) -> Result<(), LoadError> {
    let content = fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let file: SchemaFile = serde_json::from_str(&content).map_err(|e| LoadError::Malformed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let malformed = |reason: String| LoadError::Malformed {
        path: path.display().to_string(),
        reason,
    };
    let source = || {
        SchemaSource::new(
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        )
    };

    if !file.domains.is_empty() {
        let mut domains = Vec::with_capacity(file.domains.len());
        for (name, spec) in file.domains {
            domains.push(parse_domain(&name, spec).map_err(&malformed)?);
        }
        fragments.push((Fragment::Domains(domains), source()));
    }

    for (name, definition) in file.categories {
        let map = as_map(&name, definition).map_err(&malformed)?;
        let shape = parse_shape(&name, map).map_err(&malformed)?;
        fragments.push((Fragment::Category { name, shape }, source()));
    }

    for (name, spec) in file.actions {
        let spec: ActionSpec = serde_json::from_value(spec)
            .map_err(|e| malformed(format!("action '{}': {}", name, e)))?;
        let args = parse_shape(&name, spec.args).map_err(&malformed)?;
        let action = Action {
            name,
            category: spec.category,
            def: ActionDef::new(args),
        };
        fragments.push((Fragment::Action(action), source()));
    }

    for (kind, entries) in [
        ("view", file.views),
        ("form", file.forms),
        ("displayMode", file.display_modes),
    ] {
        for (name, spec) in entries {
            let spec: DataSpec = serde_json::from_value(spec)
                .map_err(|e| malformed(format!("{} '{}': {}", kind, name, e)))?;
            let data = CategoryData {
                name,
                category: spec.category,
                definition: Value::from(spec.definition),
            };
            let fragment = match kind {
                "view" => Fragment::View(data),
                "form" => Fragment::Form(data),
                _ => Fragment::DisplayMode(data),
            };
            fragments.push((fragment, source()));
        }
    }

    Ok(())
}

fn as_map(
    name: &str,
    value: serde_json::Value,
) -> Result<Map<String, serde_json::Value>, String> {
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(format!(
            "'{}' must be an object, got {}",
            name,
            Value::from(other).kind()
        )),
    }
}

fn parse_domain(name: &str, spec: serde_json::Value) -> Result<Domain, String> {
    let spec: DomainSpec =
        serde_json::from_value(spec).map_err(|e| format!("domain '{}': {}", name, e))?;

    let decor = if let Some(values) = spec.enumeration {
        DomainDecor::Enum {
            values: values.into_iter().map(Value::from).collect(),
        }
    } else if spec.flags.is_some() || spec.enum_ref.is_some() {
        DomainDecor::Flags {
            values: spec
                .flags
                .unwrap_or_default()
                .into_iter()
                .map(Value::from)
                .collect(),
            enum_ref: spec.enum_ref,
        }
    } else {
        DomainDecor::Plain
    };

    Ok(Domain {
        name: name.to_string(),
        kind: spec.kind,
        min: spec.min,
        max: spec.max,
        length: spec.length,
        subtype: spec.subtype,
        class: spec.class,
        decor,
        normalize: None,
        parse: None,
        check: None,
    })
}

fn parse_shape(owner: &str, map: Map<String, serde_json::Value>) -> Result<Shape, String> {
    let mut shape = Shape::new();
    for (prop, entry) in map {
        let entry: FieldEntry = serde_json::from_value(entry)
            .map_err(|e| format!("'{}.{}': {}", owner, prop, e))?;
        let spec = match entry {
            FieldEntry::Domain(domain) => {
                shape.insert(prop, FieldDef::scalar(domain));
                continue;
            }
            FieldEntry::Full(spec) => spec,
        };

        let mut def = match (&spec.domain, &spec.category) {
            (Some(domain), None) => FieldDef::scalar(domain.clone()),
            (None, Some(category)) => match spec.mode.unwrap_or(LinkMode::Single) {
                LinkMode::Single => FieldDef::link(category.clone()),
                LinkMode::Include => FieldDef::include(category.clone()),
                LinkMode::Many => FieldDef::many(category.clone()),
            },
            (None, None) if spec.relation == Some(Relation::Hierarchy) => FieldDef::hierarchy(),
            _ => {
                return Err(format!(
                    "'{}.{}' must name exactly one of domain or category",
                    owner, prop
                ))
            }
        };
        if let Some(relation) = spec.relation {
            def = def.with_relation(relation);
        }
        if spec.required {
            def = def.required();
        }
        if spec.read_only {
            def = def.read_only();
        }
        if let Some(default) = spec.default {
            def = def.with_default(Value::from(default));
        }
        shape.insert(prop, def);
    }
    Ok(shape)
}
