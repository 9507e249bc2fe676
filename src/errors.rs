//! Error taxonomy for validation, registration, and construction.
//!
//! Expected schema-shape problems are never raised out-of-band: validation
//! returns error collections (possibly empty), registration returns an
//! accumulated aggregate, construction returns an explicit `CreateError`.
//! Nothing in this crate is fatal to the process.

use std::fmt;

use serde::ser::SerializeStruct;
use serde::Serialize;
use thiserror::Error;

use crate::value::Value;

/// Sub-reason for `domainValidation` errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DomainReason {
    /// Numeric lower bound or string length lower bound violated
    Min,
    /// Numeric upper bound violated
    Max,
    /// Length upper bound violated
    Length,
    /// Declared subtype violated (e.g. integer-only numbers)
    Subtype,
    /// Author-supplied check predicate returned false
    Check,
}

impl DomainReason {
    /// Returns the reason tag string.
    pub fn code(&self) -> &'static str {
        match self {
            DomainReason::Min => "min",
            DomainReason::Max => "max",
            DomainReason::Length => "length",
            DomainReason::Subtype => "subtype",
            DomainReason::Check => "check",
        }
    }
}

/// Validation-time error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Value's primitive kind does not match the declared type
    InvalidType,
    /// A domain rule was violated (see `DomainReason`)
    DomainValidation(DomainReason),
    /// Value's wrapper class does not match the expected class
    InvalidClass,
    /// Value is not a member of an enumeration
    Enum,
    /// Property present in the object but not declared in the shape
    UnresolvedProperty,
    /// Readonly property submitted in patch mode
    Immutable,
    /// Required property absent in full mode
    MissingProperty,
    /// Required property present but null
    EmptyValue,
    /// Whole-object predicate returned false
    Validation,
    /// Per-field predicate returned false
    PropValidation,
    /// Unknown category or action lookup
    UndefinedEntity,
}

impl ErrorKind {
    /// Returns the kind tag string.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidType => "invalidType",
            ErrorKind::DomainValidation(_) => "domainValidation",
            ErrorKind::InvalidClass => "invalidClass",
            ErrorKind::Enum => "enum",
            ErrorKind::UnresolvedProperty => "unresolvedProperty",
            ErrorKind::Immutable => "immutable",
            ErrorKind::MissingProperty => "missingProperty",
            ErrorKind::EmptyValue => "emptyValue",
            ErrorKind::Validation => "validation",
            ErrorKind::PropValidation => "propValidation",
            ErrorKind::UndefinedEntity => "undefinedEntity",
        }
    }

    /// Sub-reason for domain validation errors.
    pub fn reason(&self) -> Option<DomainReason> {
        match self {
            ErrorKind::DomainValidation(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "{}/{}", self.code(), reason.code()),
            None => write!(f, "{}", self.code()),
        }
    }
}

/// Structured `{expected, actual}` payload attached to some errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetail {
    /// What the schema permits at this path
    pub expected: Value,
    /// What the value actually was
    pub actual: Value,
}

/// A single validation defect: kind, dot/bracket-qualified path, optional
/// structured detail.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error kind tag
    pub kind: ErrorKind,
    /// Property locator, e.g. `Person.Age` or `Order.Items[2]`
    pub path: String,
    /// Optional `{expected, actual}` payload
    pub detail: Option<ErrorDetail>,
}

impl ValidationError {
    /// Creates an error with no detail payload.
    pub fn new(kind: ErrorKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            detail: None,
        }
    }

    /// Creates an error with an `{expected, actual}` payload.
    pub fn with_detail(
        kind: ErrorKind,
        path: impl Into<String>,
        expected: Value,
        actual: Value,
    ) -> Self {
        Self {
            kind,
            path: path.into(),
            detail: Some(ErrorDetail { expected, actual }),
        }
    }

    /// Type mismatch between a declared kind and an actual value.
    pub fn invalid_type(path: impl Into<String>, expected: &str, actual: &str) -> Self {
        Self::with_detail(
            ErrorKind::InvalidType,
            path,
            Value::Str(expected.into()),
            Value::Str(actual.into()),
        )
    }

    /// Wrapper class mismatch.
    pub fn invalid_class(path: impl Into<String>, expected: &str, actual: &str) -> Self {
        Self::with_detail(
            ErrorKind::InvalidClass,
            path,
            Value::Str(expected.into()),
            Value::Str(actual.into()),
        )
    }

    /// Domain rule violation.
    pub fn domain(reason: DomainReason, path: impl Into<String>) -> Self {
        Self::new(ErrorKind::DomainValidation(reason), path)
    }

    /// Enumeration membership failure; `expected` carries the permitted set.
    pub fn not_in_enum(path: impl Into<String>, permitted: &[Value], actual: &Value) -> Self {
        Self::with_detail(
            ErrorKind::Enum,
            path,
            Value::Sequence(permitted.to_vec()),
            actual.clone(),
        )
    }

    /// Unknown category or action lookup.
    pub fn undefined_entity(path: impl Into<String>) -> Self {
        Self::new(ErrorKind::UndefinedEntity, path)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at '{}'", self.kind, self.path)?;
        if let Some(detail) = &self.detail {
            write!(
                f,
                " (expected {}, got {})",
                detail.expected.to_json(),
                detail.actual.to_json()
            )?;
        }
        Ok(())
    }
}

impl Serialize for ValidationError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = 2 + self.kind.reason().is_some() as usize + self.detail.is_some() as usize;
        let mut state = serializer.serialize_struct("ValidationError", fields)?;
        state.serialize_field("kind", self.kind.code())?;
        if let Some(reason) = self.kind.reason() {
            state.serialize_field("reason", reason.code())?;
        }
        state.serialize_field("path", &self.path)?;
        if let Some(detail) = &self.detail {
            state.serialize_field("detail", detail)?;
        }
        state.end()
    }
}

/// Registration-time error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SchemaErrorKind {
    /// Name already registered (or relation role already claimed)
    Duplicate,
    /// Category-scoped entity names no owning category
    Unlinked,
    /// Named owning category does not exist
    UnresolvedCategory,
    /// Named domain does not exist or is not an enumeration
    UnresolvedDomain,
}

/// A registration defect. Registration accumulates these; it never
/// fails fast.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// An entity (or relation role) was registered twice.
    #[error("duplicate {entity} '{name}'")]
    Duplicate {
        /// Entity kind: "domain", "category", "action", ... or a relation role
        entity: &'static str,
        /// Offending name
        name: String,
    },

    /// A category-scoped entity named no owning category.
    #[error("{entity} '{name}' names no owning category")]
    Unlinked {
        /// Entity kind
        entity: &'static str,
        /// Offending name
        name: String,
    },

    /// A category-scoped entity named a category that does not exist.
    #[error("{entity} '{name}' references unknown category '{category}'")]
    UnresolvedCategory {
        /// Entity kind
        entity: &'static str,
        /// Offending name
        name: String,
        /// Missing category
        category: String,
    },

    /// A definition referenced a domain that does not exist or has the
    /// wrong decorator.
    #[error("'{name}' references unknown or non-enum domain '{domain}'")]
    UnresolvedDomain {
        /// Referencing entity
        name: String,
        /// Missing or mismatched domain
        domain: String,
    },
}

impl SchemaError {
    /// Returns the error kind tag.
    pub fn kind(&self) -> SchemaErrorKind {
        match self {
            SchemaError::Duplicate { .. } => SchemaErrorKind::Duplicate,
            SchemaError::Unlinked { .. } => SchemaErrorKind::Unlinked,
            SchemaError::UnresolvedCategory { .. } => SchemaErrorKind::UnresolvedCategory,
            SchemaError::UnresolvedDomain { .. } => SchemaErrorKind::UnresolvedDomain,
        }
    }

    /// Convenience constructor for duplicates.
    pub fn duplicate(entity: &'static str, name: impl Into<String>) -> Self {
        SchemaError::Duplicate {
            entity,
            name: name.into(),
        }
    }
}

/// A construction failure. Carries the failing property and reason class but
/// deliberately no per-rule diagnostics; callers wanting those run the
/// structural validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateError {
    /// A value could not be coerced into its field's domain.
    #[error("value for '{path}' is not coercible")]
    Coercion {
        /// Property locator
        path: String,
    },

    /// A required property had no input and no default.
    #[error("missing required property '{path}'")]
    MissingRequired {
        /// Property locator
        path: String,
    },

    /// Positional input carried more values than the shape declares.
    #[error("'{category}' declares {declared} properties but {given} positional values given")]
    Arity {
        /// Target category
        category: String,
        /// Declared property count
        declared: usize,
        /// Positional values supplied
        given: usize,
    },

    /// The named category or linked category does not exist.
    #[error("undefined category '{name}'")]
    UndefinedCategory {
        /// Missing category name
        name: String,
    },

    /// A scalar field referenced a domain that does not exist.
    #[error("undefined domain '{name}'")]
    UndefinedDomain {
        /// Missing domain name
        name: String,
    },
}
