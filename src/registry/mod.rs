//! Schema registry: ownership, registration integrity, and the query
//! surface.
//!
//! The registry owns all domains and categories for its lifetime. It is
//! mutable only during registration and cross-reference resolution; after
//! those phases it is read-mostly and may be shared for concurrent reads.
//! Registration errors accumulate; a batch with several invalid fragments
//! reports all of them.

mod assembly;
mod resolvers;

pub use assembly::{build, Fragment, Phase, SchemaSource};
pub use resolvers::{ReferenceResolver, ResolveError, Resolvers};

use std::collections::HashMap;

use crate::category::{
    create_record, Action, Category, CategoryData, CategoryRef, DomainRef, FieldKind, Relation,
    Shape,
};
use crate::domain::{Domain, DomainDecor};
use crate::errors::{CreateError, SchemaError, ValidationError};
use crate::validator::{validate_shape, Mode};
use crate::value::{Value, ValueKind};

/// Interned domain binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomainId(usize);

/// Interned category binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CategoryId(usize);

/// The in-memory schema registry.
#[derive(Debug, Default)]
pub struct Registry {
    domains: Vec<Domain>,
    domain_ids: HashMap<String, DomainId>,
    categories: Vec<Category>,
    category_ids: HashMap<String, CategoryId>,
    sources: Vec<SchemaSource>,
}

impl Registry {
    /// An empty registry seeded with the standard primitive domains
    /// (`string`, `number`, `integer`, `boolean`), so shapes may name
    /// primitives directly.
    pub fn new() -> Self {
        let mut registry = Self::default();
        for (name, kind) in [
            ("string", ValueKind::String),
            ("number", ValueKind::Number),
            ("integer", ValueKind::Integer),
            ("boolean", ValueKind::Boolean),
        ] {
            registry.insert_domain(Domain::scalar(name, kind));
        }
        registry
    }

    fn insert_domain(&mut self, domain: Domain) {
        let id = DomainId(self.domains.len());
        self.domain_ids.insert(domain.name.clone(), id);
        self.domains.push(domain);
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers a batch of domains, accumulating defects into `errors`.
    ///
    /// A `Flags` domain referencing an `Enum` domain inherits the referenced
    /// value set here; the referent must already be registered (same batch
    /// earlier, or a prior batch).
    pub fn add_domains(&mut self, domains: Vec<Domain>, errors: &mut Vec<SchemaError>) {
        for mut domain in domains {
            if self.domain_ids.contains_key(&domain.name) {
                errors.push(SchemaError::duplicate("domain", &domain.name));
                continue;
            }
            if let DomainDecor::Flags {
                values,
                enum_ref: Some(reference),
            } = &mut domain.decor
            {
                match self.domain(reference).and_then(Domain::enum_values) {
                    Some(inherited) => *values = inherited.to_vec(),
                    None => {
                        errors.push(SchemaError::UnresolvedDomain {
                            name: domain.name.clone(),
                            domain: reference.clone(),
                        });
                        continue;
                    }
                }
            }
            self.insert_domain(domain);
        }
    }

    /// Registers a category, accumulating defects into `errors`.
    ///
    /// `Action` properties are extracted from the shape and registered as
    /// standalone actions after the category commits. Hierarchical relation
    /// roles are claimed first-come; a second claim is a `duplicate` error
    /// and the claiming property stays a plain link.
    pub fn add_category(
        &mut self,
        name: impl Into<String>,
        mut shape: Shape,
        errors: &mut Vec<SchemaError>,
    ) {
        let name = name.into();
        if self.category_ids.contains_key(&name) {
            errors.push(SchemaError::duplicate("category", &name));
            return;
        }

        // extract action properties before the shape is committed
        let action_names: Vec<String> = shape
            .iter()
            .filter(|(_, def)| matches!(def.kind, FieldKind::Action(_)))
            .map(|(prop, _)| prop.to_string())
            .collect();
        let mut actions = Vec::with_capacity(action_names.len());
        for action_name in action_names {
            if let Some(def) = shape.remove(&action_name) {
                if let FieldKind::Action(body) = def.kind {
                    actions.push(Action {
                        name: action_name,
                        category: name.clone(),
                        def: body,
                    });
                }
            }
        }

        let mut category = Category::new(name.clone(), Shape::new());
        for (prop, def) in shape.iter_mut() {
            if let FieldKind::Link {
                category: linked,
                relation,
                ..
            } = &mut def.kind
            {
                // a hierarchy link without an explicit target points home
                if matches!(linked, CategoryRef::Named(target) if target.is_empty()) {
                    *linked = CategoryRef::Named(name.clone());
                }
                if let Some(claimed) = *relation {
                    let slot = category.relations.slot_mut(claimed);
                    if slot.is_none() {
                        *slot = Some(prop.to_string());
                    } else {
                        errors.push(SchemaError::Duplicate {
                            entity: claimed.role_name(),
                            name: format!("{}.{}", name, prop),
                        });
                        *relation = None;
                    }
                }
            }
        }
        category.shape = shape;

        let id = CategoryId(self.categories.len());
        self.category_ids.insert(name, id);
        self.categories.push(category);

        for action in actions {
            self.add_action(action, errors);
        }
    }

    /// Registers a standalone action under its owning category.
    pub fn add_action(&mut self, action: Action, errors: &mut Vec<SchemaError>) {
        let Some(category) = self.owning_category_mut("action", &action.name, &action.category, errors)
        else {
            return;
        };
        if category.actions.contains_key(&action.name) {
            let full = format!("{}.{}", action.category, action.name);
            errors.push(SchemaError::duplicate("action", full));
            return;
        }
        category.actions.insert(action.name.clone(), action);
    }

    /// Registers a view under its owning category.
    pub fn add_view(&mut self, data: CategoryData, errors: &mut Vec<SchemaError>) {
        self.add_category_data("view", data, errors, |category| &mut category.views);
    }

    /// Registers a form under its owning category.
    pub fn add_form(&mut self, data: CategoryData, errors: &mut Vec<SchemaError>) {
        self.add_category_data("form", data, errors, |category| &mut category.forms);
    }

    /// Registers a display mode under its owning category.
    pub fn add_display_mode(&mut self, data: CategoryData, errors: &mut Vec<SchemaError>) {
        self.add_category_data("displayMode", data, errors, |category| {
            &mut category.display_modes
        });
    }

    /// Shared integrity path for category-scoped entities.
    fn add_category_data(
        &mut self,
        entity: &'static str,
        data: CategoryData,
        errors: &mut Vec<SchemaError>,
        map: impl Fn(&mut Category) -> &mut HashMap<String, CategoryData>,
    ) {
        let Some(category) = self.owning_category_mut(entity, &data.name, &data.category, errors)
        else {
            return;
        };
        let entities = map(category);
        if entities.contains_key(&data.name) {
            let full = format!("{}.{}", data.category, data.name);
            errors.push(SchemaError::duplicate(entity, full));
            return;
        }
        entities.insert(data.name.clone(), data);
    }

    /// Resolves the owning category for a dependent entity, recording
    /// `unlinked` / `unresolvedCategory` defects.
    fn owning_category_mut(
        &mut self,
        entity: &'static str,
        name: &str,
        category: &str,
        errors: &mut Vec<SchemaError>,
    ) -> Option<&mut Category> {
        if category.is_empty() {
            errors.push(SchemaError::Unlinked {
                entity,
                name: name.to_string(),
            });
            return None;
        }
        match self.category_ids.get(category).copied() {
            Some(id) => self.categories.get_mut(id.0),
            None => {
                errors.push(SchemaError::UnresolvedCategory {
                    entity,
                    name: name.to_string(),
                    category: category.to_string(),
                });
                None
            }
        }
    }

    pub(crate) fn record_source(&mut self, source: SchemaSource) {
        self.sources.push(source);
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Looks up a domain by name.
    pub fn domain(&self, name: &str) -> Option<&Domain> {
        self.domain_ids.get(name).map(|id| &self.domains[id.0])
    }

    /// Looks up a category by name.
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.category_ids.get(name).map(|id| &self.categories[id.0])
    }

    /// Registered domains, including the seeded primitives.
    pub fn domains(&self) -> impl Iterator<Item = &Domain> {
        self.domains.iter()
    }

    /// Registered categories.
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    /// Provenance tokens collected per registered fragment.
    pub fn sources(&self) -> &[SchemaSource] {
        &self.sources
    }

    /// Resolves a domain reference (by name until interned, by id after).
    pub(crate) fn domain_ref(&self, reference: &DomainRef) -> Option<&Domain> {
        match reference {
            DomainRef::Named(name) => self.domain(name),
            DomainRef::Id(id) => self.domains.get(id.0),
        }
    }

    /// Resolves a category reference.
    pub(crate) fn category_ref(&self, reference: &CategoryRef) -> Option<&Category> {
        match reference {
            CategoryRef::Named(name) => self.category(name),
            CategoryRef::Id(id) => self.categories.get(id.0),
        }
    }

    pub(crate) fn domain_ref_name(&self, reference: &DomainRef) -> String {
        match reference {
            DomainRef::Named(name) => name.clone(),
            DomainRef::Id(id) => self
                .domains
                .get(id.0)
                .map(|d| d.name.clone())
                .unwrap_or_default(),
        }
    }

    pub(crate) fn category_ref_name(&self, reference: &CategoryRef) -> String {
        match reference {
            CategoryRef::Named(name) => name.clone(),
            CategoryRef::Id(id) => self
                .categories
                .get(id.0)
                .map(|c| c.name.clone())
                .unwrap_or_default(),
        }
    }

    // =========================================================================
    // Validation & construction
    // =========================================================================

    /// Validates a whole value against a category. Unknown category names
    /// yield a single `undefinedEntity` error, never a panic.
    pub fn validate(&self, category: &str, value: &Value) -> Vec<ValidationError> {
        self.validate_mode(category, value, Mode::Full)
    }

    /// Validates a partial update against a category.
    pub fn validate_patch(&self, category: &str, value: &Value) -> Vec<ValidationError> {
        self.validate_mode(category, value, Mode::Patch)
    }

    fn validate_mode(&self, category: &str, value: &Value, mode: Mode) -> Vec<ValidationError> {
        match self.category(category) {
            Some(found) => validate_shape(self, &found.shape, value, mode, category),
            None => vec![ValidationError::undefined_entity(category)],
        }
    }

    /// Validates a value against an action's argument shape.
    pub fn validate_action(
        &self,
        category: &str,
        action: &str,
        value: &Value,
        mode: Mode,
    ) -> Vec<ValidationError> {
        let path = format!("{}.{}", category, action);
        let Some(found) = self.category(category) else {
            return vec![ValidationError::undefined_entity(category)];
        };
        match found.actions.get(action) {
            Some(found) => validate_shape(self, &found.def.args, value, mode, &path),
            None => vec![ValidationError::undefined_entity(path)],
        }
    }

    /// Constructs a typed instance of a category from raw positional or
    /// keyed input. Fails closed: any non-coercible property aborts the
    /// whole call.
    pub fn create(&self, category: &str, args: &[Value]) -> Result<Value, CreateError> {
        let found = self
            .category(category)
            .ok_or_else(|| CreateError::UndefinedCategory {
                name: category.to_string(),
            })?;
        create_record(self, found, args)
    }

    /// Categories whose shape claims the given relation role.
    pub fn categories_with_relation(&self, relation: Relation) -> impl Iterator<Item = &Category> {
        self.categories
            .iter()
            .filter(move |category| category.relations.get(relation).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::FieldDef;

    fn person_shape() -> Shape {
        Shape::new()
            .with("Name", FieldDef::scalar("string").required())
            .with("Age", FieldDef::scalar("Age"))
    }

    fn registry_with_person() -> (Registry, Vec<SchemaError>) {
        let mut registry = Registry::new();
        let mut errors = Vec::new();
        registry.add_domains(
            vec![Domain::scalar("Age", ValueKind::Number)
                .with_min(0.0)
                .with_max(150.0)],
            &mut errors,
        );
        registry.add_category("Person", person_shape(), &mut errors);
        (registry, errors)
    }

    #[test]
    fn test_standard_domains_seeded() {
        let registry = Registry::new();
        for name in ["string", "number", "integer", "boolean"] {
            assert!(registry.domain(name).is_some(), "missing seed '{}'", name);
        }
    }

    #[test]
    fn test_duplicate_domain_accumulates() {
        let mut registry = Registry::new();
        let mut errors = Vec::new();
        registry.add_domains(
            vec![
                Domain::scalar("Age", ValueKind::Number),
                Domain::scalar("Age", ValueKind::Number),
            ],
            &mut errors,
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0], SchemaError::duplicate("domain", "Age"));
        assert!(registry.domain("Age").is_some());
    }

    #[test]
    fn test_flags_inherit_enum_values() {
        let mut registry = Registry::new();
        let mut errors = Vec::new();
        registry.add_domains(
            vec![
                Domain::enumeration("Color", vec![Value::from("Red"), Value::from("Green")]),
                Domain::flags_of("ColorSet", "Color"),
            ],
            &mut errors,
        );
        assert!(errors.is_empty());
        match &registry.domain("ColorSet").unwrap().decor {
            DomainDecor::Flags { values, .. } => assert_eq!(values.len(), 2),
            other => panic!("expected flags, got {:?}", other),
        }
    }

    #[test]
    fn test_flags_missing_enum_reference() {
        let mut registry = Registry::new();
        let mut errors = Vec::new();
        registry.add_domains(vec![Domain::flags_of("ColorSet", "Color")], &mut errors);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SchemaError::UnresolvedDomain { .. }));
        assert!(registry.domain("ColorSet").is_none());
    }

    #[test]
    fn test_action_property_extracted() {
        use crate::category::ActionDef;
        let mut registry = Registry::new();
        let mut errors = Vec::new();
        let shape = Shape::new()
            .with("Name", FieldDef::scalar("string"))
            .with(
                "Rename",
                FieldDef::action(ActionDef::new(
                    Shape::new().with("NewName", FieldDef::scalar("string").required()),
                )),
            );
        registry.add_category("Unit", shape, &mut errors);
        assert!(errors.is_empty());

        let unit = registry.category("Unit").unwrap();
        assert!(!unit.shape.contains("Rename"));
        assert!(unit.actions.contains_key("Rename"));
    }

    #[test]
    fn test_hierarchy_defaults_to_self() {
        let mut registry = Registry::new();
        let mut errors = Vec::new();
        let shape = Shape::new()
            .with("Name", FieldDef::scalar("string"))
            .with("Parent", FieldDef::hierarchy());
        registry.add_category("Unit", shape, &mut errors);
        assert!(errors.is_empty());

        let unit = registry.category("Unit").unwrap();
        assert_eq!(unit.relations.get(Relation::Hierarchy), Some("Parent"));
        match &unit.shape.get("Parent").unwrap().kind {
            FieldKind::Link { category, .. } => {
                assert_eq!(*category, CategoryRef::Named("Unit".into()));
            }
            other => panic!("expected link, got {:?}", other),
        }
    }

    #[test]
    fn test_relation_role_exclusive() {
        let mut registry = Registry::new();
        let mut errors = Vec::new();
        let shape = Shape::new()
            .with("First", FieldDef::link("Group").with_relation(Relation::Catalog))
            .with("Second", FieldDef::link("Group").with_relation(Relation::Catalog));
        registry.add_category("Unit", shape, &mut errors);

        assert_eq!(errors.len(), 1);
        match &errors[0] {
            SchemaError::Duplicate { entity, name } => {
                assert_eq!(*entity, "Catalog");
                assert_eq!(name, "Unit.Second");
            }
            other => panic!("expected duplicate, got {:?}", other),
        }
        // the category still registered, first claimant retained
        let unit = registry.category("Unit").unwrap();
        assert_eq!(unit.relations.get(Relation::Catalog), Some("First"));
    }

    #[test]
    fn test_category_data_integrity() {
        let (mut registry, _) = registry_with_person();
        let mut errors = Vec::new();

        registry.add_view(
            CategoryData {
                name: "Grid".into(),
                category: String::new(),
                definition: Value::Null,
            },
            &mut errors,
        );
        registry.add_view(
            CategoryData {
                name: "Grid".into(),
                category: "Ghost".into(),
                definition: Value::Null,
            },
            &mut errors,
        );
        registry.add_view(
            CategoryData {
                name: "Grid".into(),
                category: "Person".into(),
                definition: Value::Null,
            },
            &mut errors,
        );
        registry.add_view(
            CategoryData {
                name: "Grid".into(),
                category: "Person".into(),
                definition: Value::Null,
            },
            &mut errors,
        );

        let kinds: Vec<_> = errors.iter().map(SchemaError::kind).collect();
        assert_eq!(
            kinds,
            vec![
                crate::errors::SchemaErrorKind::Unlinked,
                crate::errors::SchemaErrorKind::UnresolvedCategory,
                crate::errors::SchemaErrorKind::Duplicate,
            ]
        );
        assert!(registry.category("Person").unwrap().views.contains_key("Grid"));
    }

    #[test]
    fn test_validate_unknown_category() {
        let registry = Registry::new();
        let errors = registry.validate("Ghost", &Value::record([("A", Value::Null)]));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, crate::errors::ErrorKind::UndefinedEntity);
    }

    #[test]
    fn test_validate_person_scenarios() {
        let (registry, setup_errors) = registry_with_person();
        assert!(setup_errors.is_empty());

        let errors = registry.validate(
            "Person",
            &Value::record([("Name", Value::from("Ann")), ("Age", Value::Float(200.0))]),
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "Person.Age");

        let errors = registry.validate("Person", &Value::record([("Age", Value::Float(30.0))]));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "Person.Name");
        assert_eq!(errors[0].kind, crate::errors::ErrorKind::MissingProperty);

        let errors =
            registry.validate_patch("Person", &Value::record([("Age", Value::Float(30.0))]));
        assert!(errors.is_empty());
    }
}
