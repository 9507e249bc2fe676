//! Assembly Pipeline Tests
//!
//! End-to-end tests for the fragment pipeline:
//! - Fragments register in phase order regardless of submission order
//! - Registration accumulates every defect; resolution fails fast
//! - Resolution populates the reverse reference index
//! - Schema directories load, assemble, and serve the CLI commands

use std::fs;
use std::path::Path;

use metadef::category::{Action, ActionDef, CategoryData, FieldDef, Shape};
use metadef::cli;
use metadef::domain::Domain;
use metadef::errors::{SchemaError, SchemaErrorKind};
use metadef::load::load_dir;
use metadef::registry::{build, Fragment, Phase, Registry, Resolvers, SchemaSource};
use metadef::value::{Value, ValueKind};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn source(name: &str) -> SchemaSource {
    SchemaSource::new(name)
}

fn write_schema(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

const DOMAINS: &str = r#"{
    "domains": {
        "Age": {"type": "number", "min": 0, "max": 150}
    }
}"#;

const PERSON: &str = r#"{
    "categories": {
        "Person": {
            "Name": {"domain": "string", "required": true},
            "Age": "Age"
        }
    }
}"#;

// =============================================================================
// Phase Ordering
// =============================================================================

/// Dependents submitted before their category still register, because the
/// pipeline sorts fragments into phase order first.
#[test]
fn test_unordered_batch_assembles() {
    let fragments = vec![
        (
            Fragment::Action(Action {
                name: "Retire".into(),
                category: "Person".into(),
                def: ActionDef::new(Shape::new()),
            }),
            source("actions.json"),
        ),
        (
            Fragment::View(CategoryData {
                name: "Grid".into(),
                category: "Person".into(),
                definition: Value::Null,
            }),
            source("views.json"),
        ),
        (
            Fragment::Category {
                name: "Person".into(),
                shape: Shape::new().with("Age", FieldDef::scalar("Age")),
            },
            source("person.json"),
        ),
        (
            Fragment::Domains(vec![Domain::scalar("Age", ValueKind::Number)]),
            source("domains.json"),
        ),
    ];
    let (registry, errors) = build(fragments);
    assert!(errors.is_none(), "unexpected: {:?}", errors);

    let person = registry.category("Person").unwrap();
    assert!(person.actions.contains_key("Retire"));
    assert!(person.views.contains_key("Grid"));
    assert_eq!(registry.sources().len(), 4);
}

/// Registration accumulates defects instead of stopping at the first.
#[test]
fn test_registration_accumulates_errors() {
    let fragments = vec![
        (
            Fragment::Domains(vec![
                Domain::scalar("Age", ValueKind::Number),
                Domain::scalar("Age", ValueKind::String),
            ]),
            source("domains.json"),
        ),
        (
            Fragment::View(CategoryData {
                name: "Grid".into(),
                category: "Ghost".into(),
                definition: Value::Null,
            }),
            source("views.json"),
        ),
    ];
    let (_registry, errors) = build(fragments);
    let errors = errors.unwrap();
    assert_eq!(errors.len(), 2);
    let kinds: Vec<_> = errors.iter().map(SchemaError::kind).collect();
    assert!(kinds.contains(&SchemaErrorKind::Duplicate));
    assert!(kinds.contains(&SchemaErrorKind::UnresolvedCategory));
}

// =============================================================================
// Resolution
// =============================================================================

/// Resolution fails fast at the first phase with a defect; the error names
/// that phase.
#[test]
fn test_resolution_fails_fast_on_unknown_domain() {
    let fragments = vec![(
        Fragment::Category {
            name: "Person".into(),
            shape: Shape::new().with("Age", FieldDef::scalar("Ghost")),
        },
        source("person.json"),
    )];
    let (mut registry, errors) = build(fragments);
    assert!(errors.is_none());

    let error = registry.resolve(&Resolvers::default()).unwrap();
    assert_eq!(error.phase, Phase::Domains);
    assert!(matches!(error.error, SchemaError::UnresolvedDomain { .. }));
}

/// Resolution indexes inbound references on the target category, keyed by
/// reference kind.
#[test]
fn test_resolution_populates_reference_index() {
    let fragments = vec![
        (
            Fragment::Category {
                name: "Person".into(),
                shape: Shape::new().with("Name", FieldDef::scalar("string")),
            },
            source("person.json"),
        ),
        (
            Fragment::Category {
                name: "Team".into(),
                shape: Shape::new().with("Members", FieldDef::many("Person")),
            },
            source("team.json"),
        ),
        (
            Fragment::Category {
                name: "Badge".into(),
                shape: Shape::new().with("Owner", FieldDef::link("Person")),
            },
            source("badge.json"),
        ),
    ];
    let (mut registry, errors) = build(fragments);
    assert!(errors.is_none());
    assert!(registry.resolve(&Resolvers::default()).is_none());

    let person = registry.category("Person").unwrap();
    assert_eq!(person.references["Many"], vec!["Team"]);
    assert_eq!(person.references["Link"], vec!["Badge"]);
}

/// Validation verdicts are identical before and after resolution; interning
/// only changes lookup mechanics.
#[test]
fn test_resolution_preserves_validation() {
    fn assemble() -> Registry {
        let fragments = vec![
            (
                Fragment::Domains(vec![Domain::scalar("Age", ValueKind::Number)
                    .with_min(0.0)
                    .with_max(150.0)]),
                source("domains.json"),
            ),
            (
                Fragment::Category {
                    name: "Person".into(),
                    shape: Shape::new().with("Age", FieldDef::scalar("Age").required()),
                },
                source("person.json"),
            ),
        ];
        build(fragments).0
    }

    let unresolved = assemble();
    let mut resolved = assemble();
    assert!(resolved.resolve(&Resolvers::default()).is_none());

    for doc in [
        Value::record([("Age", Value::Float(30.0))]),
        Value::record([("Age", Value::Float(-1.0))]),
        Value::record([("Other", Value::Null)]),
    ] {
        assert_eq!(
            unresolved.validate("Person", &doc),
            resolved.validate("Person", &doc)
        );
    }
}

// =============================================================================
// Directory Loading & CLI
// =============================================================================

/// A schema directory loads into fragments and assembles cleanly.
#[test]
fn test_directory_round_trip() {
    let tmp = TempDir::new().unwrap();
    write_schema(tmp.path(), "10-domains.json", DOMAINS);
    write_schema(tmp.path(), "20-person.json", PERSON);

    let fragments = load_dir(tmp.path()).unwrap();
    let (mut registry, errors) = build(fragments);
    assert!(errors.is_none());
    assert!(registry.resolve(&Resolvers::default()).is_none());

    let doc = Value::record([("Name", Value::from("Marcus")), ("Age", Value::Float(30.0))]);
    assert!(registry.validate("Person", &doc).is_empty());
}

/// The check command accepts a clean schema directory.
#[test]
fn test_cli_check_clean_schema() {
    let tmp = TempDir::new().unwrap();
    write_schema(tmp.path(), "10-domains.json", DOMAINS);
    write_schema(tmp.path(), "20-person.json", PERSON);

    assert!(cli::check(tmp.path()).is_ok());
}

/// The check command fails on a schema with a dangling domain reference.
#[test]
fn test_cli_check_reports_dangling_reference() {
    let tmp = TempDir::new().unwrap();
    write_schema(
        tmp.path(),
        "person.json",
        r#"{"categories": {"Person": {"Age": "Ghost"}}}"#,
    );

    let error = cli::check(tmp.path()).unwrap_err();
    assert_eq!(*error.code(), cli::CliErrorCode::SchemaError);
}

/// The validate command distinguishes valid documents, invalid documents,
/// and patch mode.
#[test]
fn test_cli_validate_modes() {
    let tmp = TempDir::new().unwrap();
    write_schema(tmp.path(), "10-domains.json", DOMAINS);
    write_schema(tmp.path(), "20-person.json", PERSON);

    let good = tmp.path().join("good.json");
    fs::write(&good, r#"{"Name": "Marcus", "Age": 30}"#).unwrap();
    assert!(cli::validate(tmp.path(), "Person", false, &good).is_ok());

    let partial = tmp.path().join("partial.json");
    fs::write(&partial, r#"{"Age": 31}"#).unwrap();
    let error = cli::validate(tmp.path(), "Person", false, &partial).unwrap_err();
    assert_eq!(*error.code(), cli::CliErrorCode::Invalid);
    assert!(cli::validate(tmp.path(), "Person", true, &partial).is_ok());
}
