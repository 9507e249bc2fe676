//! metadef - A strict, deterministic metadata schema engine
//!
//! Schemas are assembled from fragments (domains, categories, and the
//! behaviors attached to categories) into an immutable [`registry::Registry`],
//! then cross-references are resolved in a fixed phase order. The registry
//! validates documents against category shapes, with distinct full and
//! patch modes, and constructs instances through a fail-closed factory.

pub mod category;
pub mod cli;
pub mod domain;
pub mod errors;
pub mod load;
pub mod observe;
pub mod registry;
pub mod validator;
pub mod value;

pub use errors::{CreateError, SchemaError, ValidationError};
pub use registry::{build, Fragment, Registry, Resolvers, SchemaSource};
pub use validator::Mode;
pub use value::{Value, ValueKind};
