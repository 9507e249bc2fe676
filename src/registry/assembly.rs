//! Assembly pipeline: phase-ordered registration of schema fragments.
//!
//! Fragments arrive unordered; a stable sort into the fixed phase order
//! (domains, categories, actions, views, forms, display modes) guarantees
//! that intra-batch forward references from a dependent kind to its owning
//! category already exist when the dependent registers. Dependents of a
//! category submitted in a later batch still fail with
//! `unresolvedCategory`, which is correct.

use std::fmt;

use crate::category::{Action, CategoryData, Shape};
use crate::domain::Domain;
use crate::errors::SchemaError;
use crate::observe::{Logger, Severity};

use super::Registry;

/// Registration / resolution phases, in fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Domain definitions
    Domains,
    /// Category definitions
    Categories,
    /// Standalone actions
    Actions,
    /// Views
    Views,
    /// Forms
    Forms,
    /// Display modes
    DisplayModes,
}

impl Phase {
    /// Phase name for logs and errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Domains => "domains",
            Phase::Categories => "categories",
            Phase::Actions => "actions",
            Phase::Views => "views",
            Phase::Forms => "forms",
            Phase::DisplayModes => "displayModes",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Opaque provenance token collected per submitted fragment. Informational
/// only; never consulted by validation or construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSource(String);

impl SchemaSource {
    /// A provenance token (file name, caller tag, ...).
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The token text.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One schema fragment submitted for registration.
#[derive(Debug)]
pub enum Fragment {
    /// A batch of domain definitions
    Domains(Vec<Domain>),
    /// A category definition
    Category {
        /// Category name
        name: String,
        /// Declared shape (may still contain action properties)
        shape: Shape,
    },
    /// A standalone action
    Action(Action),
    /// A view
    View(CategoryData),
    /// A form
    Form(CategoryData),
    /// A display mode
    DisplayMode(CategoryData),
}

impl Fragment {
    /// The registration phase this fragment belongs to.
    pub fn phase(&self) -> Phase {
        match self {
            Fragment::Domains(_) => Phase::Domains,
            Fragment::Category { .. } => Phase::Categories,
            Fragment::Action(_) => Phase::Actions,
            Fragment::View(_) => Phase::Views,
            Fragment::Form(_) => Phase::Forms,
            Fragment::DisplayMode(_) => Phase::DisplayModes,
        }
    }
}

/// Registers an unordered fragment list into a fresh registry.
///
/// Returns the registry (possibly partially valid) together with the
/// accumulated registration errors, `None` when the batch was clean.
pub fn build(
    fragments: Vec<(Fragment, SchemaSource)>,
) -> (Registry, Option<Vec<SchemaError>>) {
    let mut registry = Registry::new();
    let mut errors = Vec::new();

    let mut ordered = fragments;
    // stable: intra-phase submission order is preserved
    ordered.sort_by_key(|(fragment, _)| fragment.phase());

    let total = ordered.len();
    for (fragment, source) in ordered {
        registry.record_source(source);
        match fragment {
            Fragment::Domains(domains) => registry.add_domains(domains, &mut errors),
            Fragment::Category { name, shape } => {
                registry.add_category(name, shape, &mut errors)
            }
            Fragment::Action(action) => registry.add_action(action, &mut errors),
            Fragment::View(data) => registry.add_view(data, &mut errors),
            Fragment::Form(data) => registry.add_form(data, &mut errors),
            Fragment::DisplayMode(data) => registry.add_display_mode(data, &mut errors),
        }
    }

    let fragments_field = total.to_string();
    let errors_field = errors.len().to_string();
    if errors.is_empty() {
        Logger::log(
            Severity::Info,
            "SCHEMA_BATCH_REGISTERED",
            &[("fragments", fragments_field.as_str())],
        );
        (registry, None)
    } else {
        Logger::log_stderr(
            Severity::Warn,
            "SCHEMA_BATCH_ERRORS",
            &[
                ("fragments", fragments_field.as_str()),
                ("errors", errors_field.as_str()),
            ],
        );
        (registry, Some(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::FieldDef;
    use crate::value::Value;

    #[test]
    fn test_phase_order() {
        assert!(Phase::Domains < Phase::Categories);
        assert!(Phase::Categories < Phase::Actions);
        assert!(Phase::Forms < Phase::DisplayModes);
    }

    #[test]
    fn test_out_of_order_batch_registers() {
        // view and category submitted before the domain they depend on
        let fragments = vec![
            (
                Fragment::View(CategoryData {
                    name: "Grid".into(),
                    category: "Person".into(),
                    definition: Value::Null,
                }),
                SchemaSource::new("views.json"),
            ),
            (
                Fragment::Category {
                    name: "Person".into(),
                    shape: Shape::new().with("Age", FieldDef::scalar("Age")),
                },
                SchemaSource::new("person.json"),
            ),
            (
                Fragment::Domains(vec![Domain::scalar(
                    "Age",
                    crate::value::ValueKind::Number,
                )]),
                SchemaSource::new("domains.json"),
            ),
        ];

        let (registry, errors) = build(fragments);
        assert!(errors.is_none());
        assert!(registry.domain("Age").is_some());
        assert!(registry.category("Person").unwrap().views.contains_key("Grid"));
        assert_eq!(registry.sources().len(), 3);
    }

    #[test]
    fn test_errors_accumulate_across_fragments() {
        let fragments = vec![
            (
                Fragment::Category {
                    name: "Person".into(),
                    shape: Shape::new(),
                },
                SchemaSource::new("a.json"),
            ),
            (
                Fragment::Category {
                    name: "Person".into(),
                    shape: Shape::new(),
                },
                SchemaSource::new("b.json"),
            ),
            (
                Fragment::View(CategoryData {
                    name: "Grid".into(),
                    category: "Ghost".into(),
                    definition: Value::Null,
                }),
                SchemaSource::new("c.json"),
            ),
        ];

        let (_registry, errors) = build(fragments);
        assert_eq!(errors.unwrap().len(), 2);
    }
}
