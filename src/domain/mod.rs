//! Domain descriptors: named, reusable value-type definitions.
//!
//! A domain describes what a single value may be: a primitive kind plus
//! optional bounds, an enumeration over permitted literals, a flag set over
//! named bits, or a structured-object wrapper class. Domains also carry
//! optional author-supplied callables (`normalize`, `parse`, `check`), which
//! the engine never inspects, only calls.
//!
//! Validation (`validate_domain`) and construction (`create_instance`) are
//! pure functions over one domain and one value; neither touches the
//! registry.

mod create;
mod validate;

pub use create::create_instance;
pub use validate::validate_domain;

pub(crate) use create::wrap_int64;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::value::{FnValue, Value, ValueKind};

/// Author-supplied membership/constraint predicate.
#[derive(Clone)]
pub struct CheckFn(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl CheckFn {
    /// Wraps a predicate.
    pub fn new(f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Invokes the predicate.
    pub fn call(&self, value: &Value) -> bool {
        (self.0)(value)
    }
}

impl fmt::Debug for CheckFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[check]")
    }
}

/// Author-supplied parser. When present it owns all validation: its result
/// is the constructed instance, `None` is construction failure.
#[derive(Clone)]
pub struct ParseFn(Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>);

impl ParseFn {
    /// Wraps a parser.
    pub fn new(f: impl Fn(&Value) -> Option<Value> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Invokes the parser.
    pub fn call(&self, value: &Value) -> Option<Value> {
        (self.0)(value)
    }
}

impl fmt::Debug for ParseFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[parse]")
    }
}

/// Subtype restriction on a primitive kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subtype {
    /// Number must be a mathematical integer
    Integer,
}

/// Domain decorator: plain, enumeration, or flag set.
#[derive(Debug, Clone)]
pub enum DomainDecor {
    /// No special semantics
    Plain,
    /// Ordered set of permitted literal values
    Enum {
        /// Permitted values, membership by structural equality
        values: Vec<Value>,
    },
    /// Bit-flag set over named positions
    Flags {
        /// Flag values; a member's bit is its position here
        values: Vec<Value>,
        /// Name of an `Enum` domain to inherit values from, resolved at
        /// registration time
        enum_ref: Option<String>,
    },
}

/// A named value-type descriptor.
#[derive(Debug, Clone)]
pub struct Domain {
    /// Registry-wide unique name
    pub name: String,
    /// Declared primitive kind; `None` skips the type check
    pub kind: Option<ValueKind>,
    /// Numeric lower bound, or string length lower bound
    pub min: Option<f64>,
    /// Numeric upper bound
    pub max: Option<f64>,
    /// Length upper bound (strings and structured objects)
    pub length: Option<usize>,
    /// Subtype restriction
    pub subtype: Option<Subtype>,
    /// Structured-object wrapper class name
    pub class: Option<String>,
    /// Decorator
    pub decor: DomainDecor,
    /// Author normalizer, applied before construction
    pub normalize: Option<FnValue>,
    /// Author parser; when present it owns construction entirely
    pub parse: Option<ParseFn>,
    /// Author constraint predicate, checked last during validation
    pub check: Option<CheckFn>,
}

impl Domain {
    /// A plain domain over a primitive kind.
    pub fn scalar(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind: Some(kind),
            min: None,
            max: None,
            length: None,
            subtype: None,
            class: None,
            decor: DomainDecor::Plain,
            normalize: None,
            parse: None,
            check: None,
        }
    }

    /// An enumeration over permitted literal values.
    pub fn enumeration(name: impl Into<String>, values: Vec<Value>) -> Self {
        let mut domain = Self::scalar(name, ValueKind::String);
        domain.kind = None;
        domain.decor = DomainDecor::Enum { values };
        domain
    }

    /// A flag set with an owned value set.
    pub fn flags(name: impl Into<String>, values: Vec<Value>) -> Self {
        let mut domain = Self::scalar(name, ValueKind::Struct);
        domain.kind = None;
        domain.decor = DomainDecor::Flags {
            values,
            enum_ref: None,
        };
        domain
    }

    /// A flag set inheriting its values from an `Enum` domain, resolved when
    /// the flag domain is registered.
    pub fn flags_of(name: impl Into<String>, enum_ref: impl Into<String>) -> Self {
        let mut domain = Self::scalar(name, ValueKind::Struct);
        domain.kind = None;
        domain.decor = DomainDecor::Flags {
            values: Vec::new(),
            enum_ref: Some(enum_ref.into()),
        };
        domain
    }

    /// A structured-object domain over a named wrapper class.
    pub fn structured(name: impl Into<String>, class: impl Into<String>) -> Self {
        let mut domain = Self::scalar(name, ValueKind::Struct);
        domain.class = Some(class.into());
        domain
    }

    /// Sets the lower bound.
    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Sets the numeric upper bound.
    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Sets the length upper bound.
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    /// Restricts the kind to a subtype.
    pub fn with_subtype(mut self, subtype: Subtype) -> Self {
        self.subtype = Some(subtype);
        self
    }

    /// Attaches an author constraint predicate.
    pub fn with_check(mut self, check: CheckFn) -> Self {
        self.check = Some(check);
        self
    }

    /// Attaches an author normalizer.
    pub fn with_normalize(mut self, normalize: FnValue) -> Self {
        self.normalize = Some(normalize);
        self
    }

    /// Attaches an author parser.
    pub fn with_parse(mut self, parse: ParseFn) -> Self {
        self.parse = Some(parse);
        self
    }

    /// Permitted values when this domain is an enumeration.
    pub fn enum_values(&self) -> Option<&[Value]> {
        match &self.decor {
            DomainDecor::Enum { values } => Some(values),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_builder() {
        let age = Domain::scalar("Age", ValueKind::Number)
            .with_min(0.0)
            .with_max(150.0);
        assert_eq!(age.name, "Age");
        assert_eq!(age.kind, Some(ValueKind::Number));
        assert_eq!(age.min, Some(0.0));
        assert_eq!(age.max, Some(150.0));
    }

    #[test]
    fn test_enumeration_has_no_kind_tag() {
        let color =
            Domain::enumeration("Color", vec![Value::from("Red"), Value::from("Green")]);
        assert_eq!(color.kind, None);
        assert_eq!(color.enum_values().unwrap().len(), 2);
    }

    #[test]
    fn test_flags_of_records_reference() {
        let flags = Domain::flags_of("ColorSet", "Color");
        match &flags.decor {
            DomainDecor::Flags { values, enum_ref } => {
                assert!(values.is_empty());
                assert_eq!(enum_ref.as_deref(), Some("Color"));
            }
            other => panic!("expected flags decorator, got {:?}", other),
        }
    }
}
