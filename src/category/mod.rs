//! Category descriptors: named entity shapes and their scoped behaviors.
//!
//! A category's shape is an ordered mapping from property name to a field
//! descriptor. Field descriptors form a closed tagged union resolved once at
//! registration time: domain-backed scalars, category links (single,
//! embedded, or sequence), construction-only transform functions, and
//! whole-object validation predicates. `Action`-decorated properties exist
//! only in submitted definitions; registration extracts them into standalone
//! actions.

mod factory;

pub(crate) use factory::create_record;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::CheckFn;
use crate::registry::{CategoryId, DomainId};
use crate::value::{FnValue, Value};

/// Reference to a domain: a name until cross-reference resolution rewrites
/// it into an interned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainRef {
    /// Unresolved name
    Named(String),
    /// Live binding
    Id(DomainId),
}

/// Reference to a category: a name until cross-reference resolution rewrites
/// it into an interned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryRef {
    /// Unresolved name
    Named(String),
    /// Live binding
    Id(CategoryId),
}

/// Link cardinality / embedding mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// One identifier
    Single,
    /// Embedded entity validated inline
    Include,
    /// Ordered sequence of identifiers
    Many,
}

/// Hierarchical relation roles. Each role may be claimed by at most one
/// property per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    /// Grouping catalog
    Catalog,
    /// Partitioning subdivision
    Subdivision,
    /// Tree parent (defaults to self-reference)
    Hierarchy,
    /// Owning master record
    Master,
}

impl Relation {
    /// Role name used in registration errors and the references index.
    pub fn role_name(&self) -> &'static str {
        match self {
            Relation::Catalog => "Catalog",
            Relation::Subdivision => "Subdivision",
            Relation::Hierarchy => "Hierarchy",
            Relation::Master => "Master",
        }
    }
}

/// Field descriptor kind.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Domain-backed scalar or structured field
    Scalar {
        /// The backing domain
        domain: DomainRef,
    },
    /// Category link field
    Link {
        /// The linked category
        category: CategoryRef,
        /// Cardinality / embedding mode
        mode: LinkMode,
        /// Optional hierarchical role claim
        relation: Option<Relation>,
    },
    /// Construction-only transform function; bypasses validation entirely
    Transform(FnValue),
    /// Whole-object predicate, run in full validation mode only
    Validate(CheckFn),
    /// Action definition inside a category definition; extracted at
    /// registration, never present in a committed shape
    Action(ActionDef),
}

/// A property within a category (or action argument) shape.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Descriptor kind
    pub kind: FieldKind,
    /// Must be present in full-mode validation
    pub required: bool,
    /// Must be absent in patch-mode validation
    pub read_only: bool,
    /// Default applied during construction when no input is given
    pub default: Option<Value>,
    /// Per-field predicate, checked after kind-specific validation
    pub validate: Option<CheckFn>,
}

impl FieldDef {
    fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            read_only: false,
            default: None,
            validate: None,
        }
    }

    /// A domain-backed field.
    pub fn scalar(domain: impl Into<String>) -> Self {
        Self::new(FieldKind::Scalar {
            domain: DomainRef::Named(domain.into()),
        })
    }

    /// A single link field.
    pub fn link(category: impl Into<String>) -> Self {
        Self::new(FieldKind::Link {
            category: CategoryRef::Named(category.into()),
            mode: LinkMode::Single,
            relation: None,
        })
    }

    /// An embedded (inline-validated) link field.
    pub fn include(category: impl Into<String>) -> Self {
        Self::new(FieldKind::Link {
            category: CategoryRef::Named(category.into()),
            mode: LinkMode::Include,
            relation: None,
        })
    }

    /// An ordered-sequence link field.
    pub fn many(category: impl Into<String>) -> Self {
        Self::new(FieldKind::Link {
            category: CategoryRef::Named(category.into()),
            mode: LinkMode::Many,
            relation: None,
        })
    }

    /// A tree-parent link. With no explicit target the linked category
    /// defaults to the owning category itself at registration time.
    pub fn hierarchy() -> Self {
        Self::new(FieldKind::Link {
            category: CategoryRef::Named(String::new()),
            mode: LinkMode::Single,
            relation: Some(Relation::Hierarchy),
        })
    }

    /// A construction-only transform field.
    pub fn transform(f: FnValue) -> Self {
        Self::new(FieldKind::Transform(f))
    }

    /// A whole-object validation predicate property.
    pub fn object_check(check: CheckFn) -> Self {
        Self::new(FieldKind::Validate(check))
    }

    /// An action property (extracted at registration).
    pub fn action(def: ActionDef) -> Self {
        Self::new(FieldKind::Action(def))
    }

    /// Marks the field required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the field readonly.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Sets the construction default.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Attaches a per-field predicate.
    pub fn with_validate(mut self, check: CheckFn) -> Self {
        self.validate = Some(check);
        self
    }

    /// Claims a hierarchical relation role (link fields only).
    pub fn with_relation(mut self, relation: Relation) -> Self {
        if let FieldKind::Link { relation: slot, .. } = &mut self.kind {
            *slot = Some(relation);
        }
        self
    }
}

/// An ordered property-name → field-descriptor mapping.
#[derive(Debug, Clone, Default)]
pub struct Shape {
    entries: Vec<(String, FieldDef)>,
}

impl Shape {
    /// An empty shape.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion preserving declaration order.
    pub fn with(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        self.insert(name, def);
        self
    }

    /// Appends a property; replaces an existing one of the same name.
    pub fn insert(&mut self, name: impl Into<String>, def: FieldDef) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = def,
            None => self.entries.push((name, def)),
        }
    }

    /// Looks up a property by name.
    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    /// Mutable lookup, used by the resolvers.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldDef> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d)
    }

    /// Removes and returns a property (action extraction).
    pub fn remove(&mut self, name: &str) -> Option<FieldDef> {
        let position = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(position).1)
    }

    /// Properties in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDef)> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d))
    }

    /// Mutable iteration, used by the resolvers.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut FieldDef)> {
        self.entries.iter_mut().map(|(n, d)| (n.as_str(), d))
    }

    /// Declared property count.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the shape declares nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a property is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Action body: an argument shape plus an opaque executable.
#[derive(Debug, Clone)]
pub struct ActionDef {
    /// Argument shape, validated like a category
    pub args: Shape,
    /// Executable behavior, opaque to the engine
    pub method: Option<FnValue>,
}

impl ActionDef {
    /// An action with the given argument shape and no executable.
    pub fn new(args: Shape) -> Self {
        Self { args, method: None }
    }

    /// Attaches the executable.
    pub fn with_method(mut self, method: FnValue) -> Self {
        self.method = Some(method);
        self
    }
}

/// A category-scoped operation.
#[derive(Debug, Clone)]
pub struct Action {
    /// Action name, unique per category
    pub name: String,
    /// Owning category name
    pub category: String,
    /// Argument shape and executable
    pub def: ActionDef,
}

/// A category-scoped named entity of uniform shape: views, forms, and
/// display modes all register through this one type.
#[derive(Debug, Clone)]
pub struct CategoryData {
    /// Entity name, unique per category and kind
    pub name: String,
    /// Owning category name; empty string means none was given
    pub category: String,
    /// Opaque entity definition
    pub definition: Value,
}

/// Occupants of the four mutually-exclusive hierarchical relation roles.
#[derive(Debug, Clone, Default)]
pub struct Relations {
    /// Property claiming `Catalog`
    pub catalog: Option<String>,
    /// Property claiming `Subdivision`
    pub subdivision: Option<String>,
    /// Property claiming `Hierarchy`
    pub hierarchy: Option<String>,
    /// Property claiming `Master`
    pub master: Option<String>,
}

impl Relations {
    /// The slot for a role.
    pub fn slot_mut(&mut self, relation: Relation) -> &mut Option<String> {
        match relation {
            Relation::Catalog => &mut self.catalog,
            Relation::Subdivision => &mut self.subdivision,
            Relation::Hierarchy => &mut self.hierarchy,
            Relation::Master => &mut self.master,
        }
    }

    /// The property claiming a role, if any.
    pub fn get(&self, relation: Relation) -> Option<&str> {
        match relation {
            Relation::Catalog => self.catalog.as_deref(),
            Relation::Subdivision => self.subdivision.as_deref(),
            Relation::Hierarchy => self.hierarchy.as_deref(),
            Relation::Master => self.master.as_deref(),
        }
    }
}

/// A named entity shape with its scoped behaviors.
#[derive(Debug, Clone)]
pub struct Category {
    /// Registry-wide unique name
    pub name: String,
    /// Ordered field shape (actions already extracted)
    pub shape: Shape,
    /// Actions by name
    pub actions: HashMap<String, Action>,
    /// Views by name
    pub views: HashMap<String, CategoryData>,
    /// Forms by name
    pub forms: HashMap<String, CategoryData>,
    /// Display modes by name
    pub display_modes: HashMap<String, CategoryData>,
    /// Reverse reference index, keyed by reference kind; populated during
    /// cross-reference resolution
    pub references: HashMap<String, Vec<String>>,
    /// Hierarchical relation role occupants
    pub relations: Relations,
}

impl Category {
    /// A category with an empty behavior surface.
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
            actions: HashMap::new(),
            views: HashMap::new(),
            forms: HashMap::new(),
            display_modes: HashMap::new(),
            references: HashMap::new(),
            relations: Relations::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_preserves_declaration_order() {
        let shape = Shape::new()
            .with("Name", FieldDef::scalar("string").required())
            .with("Age", FieldDef::scalar("Age"));
        let names: Vec<_> = shape.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Name", "Age"]);
        assert!(shape.get("Name").unwrap().required);
        assert!(!shape.contains("Missing"));
    }

    #[test]
    fn test_shape_insert_replaces() {
        let mut shape = Shape::new().with("Name", FieldDef::scalar("string"));
        shape.insert("Name", FieldDef::scalar("string").required());
        assert_eq!(shape.len(), 1);
        assert!(shape.get("Name").unwrap().required);
    }

    #[test]
    fn test_relation_claims_only_on_links() {
        let field = FieldDef::link("Unit").with_relation(Relation::Catalog);
        match field.kind {
            FieldKind::Link { relation, .. } => assert_eq!(relation, Some(Relation::Catalog)),
            other => panic!("expected link, got {:?}", other),
        }
        // relation on a scalar is silently ignored
        let field = FieldDef::scalar("string").with_relation(Relation::Catalog);
        assert!(matches!(field.kind, FieldKind::Scalar { .. }));
    }

    #[test]
    fn test_relations_slots() {
        let mut relations = Relations::default();
        *relations.slot_mut(Relation::Master) = Some("Owner".into());
        assert_eq!(relations.get(Relation::Master), Some("Owner"));
        assert_eq!(relations.get(Relation::Catalog), None);
    }
}
