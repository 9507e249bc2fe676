//! CLI command implementations
//!
//! Each command assembles a registry from a schema directory, then acts on
//! it. Assembly in the CLI is uncompromising: registration errors or a
//! resolution failure abort the command.

use std::fs;
use std::io::Read;
use std::path::Path;

use serde_json::json;

use crate::load::load_dir;
use crate::registry::{build, Registry, Resolvers};
use crate::value::Value;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};

/// Parse arguments and dispatch
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Dispatch a parsed command
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Check { schema } => check(&schema),
        Command::Validate {
            schema,
            category,
            patch,
            document,
        } => validate(&schema, &category, patch, &document),
        Command::Inspect { schema, name } => inspect(&schema, name.as_deref()),
    }
}

/// Load, assemble, and resolve a schema directory. Errors are fatal.
fn assemble(schema: &Path) -> CliResult<Registry> {
    let fragments = load_dir(schema)?;
    let (mut registry, errors) = build(fragments);
    if let Some(errors) = errors {
        for error in &errors {
            eprintln!("{}", error);
        }
        return Err(CliError::schema_error(format!(
            "{} registration error(s)",
            errors.len()
        )));
    }
    if let Some(error) = registry.resolve(&Resolvers::default()) {
        return Err(CliError::schema_error(error.to_string()));
    }
    Ok(registry)
}

/// Assemble a schema directory and report every problem found
pub fn check(schema: &Path) -> CliResult<()> {
    let fragments = load_dir(schema)?;
    let fragment_count = fragments.len();
    let (mut registry, errors) = build(fragments);

    let mut failed = false;
    if let Some(errors) = &errors {
        failed = true;
        for error in errors {
            eprintln!("{}", error);
        }
    }
    if let Some(error) = registry.resolve(&Resolvers::default()) {
        failed = true;
        eprintln!("{}", error);
    }
    if failed {
        return Err(CliError::schema_error("schema check failed"));
    }

    println!(
        "ok: {} fragment(s), {} domain(s), {} categorie(s)",
        fragment_count,
        registry.domains().count(),
        registry.categories().count()
    );
    Ok(())
}

/// Validate a JSON document against a category
pub fn validate(schema: &Path, category: &str, patch: bool, document: &Path) -> CliResult<()> {
    let registry = assemble(schema)?;
    let raw = read_document(document)?;
    let json: serde_json::Value = serde_json::from_str(&raw)?;
    let value = Value::from(json);

    let errors = if patch {
        registry.validate_patch(category, &value)
    } else {
        registry.validate(category, &value)
    };

    if errors.is_empty() {
        println!("valid");
        return Ok(());
    }
    for error in &errors {
        eprintln!("{}", error);
    }
    Err(CliError::invalid(errors.len()))
}

/// Print an assembled entity, or the registry summary, as JSON
pub fn inspect(schema: &Path, name: Option<&str>) -> CliResult<()> {
    let registry = assemble(schema)?;

    let output = match name {
        None => json!({
            "domains": registry.domains().map(|d| d.name.clone()).collect::<Vec<_>>(),
            "categories": registry.categories().map(|c| c.name.clone()).collect::<Vec<_>>(),
        }),
        Some(name) => {
            if let Some(domain) = registry.domain(name) {
                describe_domain(domain)
            } else if let Some(category) = registry.category(name) {
                describe_category(category)
            } else {
                return Err(CliError::unknown_entity(name));
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn describe_domain(domain: &crate::domain::Domain) -> serde_json::Value {
    let mut out = serde_json::Map::new();
    out.insert("name".into(), json!(domain.name));
    if let Some(kind) = domain.kind {
        out.insert("type".into(), json!(kind.as_str()));
    }
    if let Some(min) = domain.min {
        out.insert("min".into(), json!(min));
    }
    if let Some(max) = domain.max {
        out.insert("max".into(), json!(max));
    }
    if let Some(length) = domain.length {
        out.insert("length".into(), json!(length));
    }
    if let Some(class) = &domain.class {
        out.insert("class".into(), json!(class));
    }
    if let Some(values) = domain.enum_values() {
        let values: Vec<_> = values.iter().map(Value::to_json).collect();
        out.insert("enum".into(), json!(values));
    }
    serde_json::Value::Object(out)
}

fn describe_category(category: &crate::category::Category) -> serde_json::Value {
    let properties: Vec<_> = category.shape.iter().map(|(name, _)| name).collect();
    let mut actions: Vec<_> = category.actions.keys().collect();
    actions.sort();
    let mut references = serde_json::Map::new();
    let mut kinds: Vec<_> = category.references.keys().collect();
    kinds.sort();
    for kind in kinds {
        references.insert(kind.clone(), json!(category.references[kind]));
    }
    json!({
        "name": category.name,
        "properties": properties,
        "actions": actions,
        "references": references,
    })
}

fn read_document(path: &Path) -> CliResult<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}
