//! Entity schemas
//!
//! Declarative per-field descriptors, resolved against a `TypeRegistry`
//! into immutable entities. All construction errors surface here, never
//! at request time.

mod entity;
mod errors;
mod loader;
mod operation;
mod property;

pub use entity::{Entity, EntityDefinition, TOTAL_COLUMN};
pub use errors::{SchemaError, SchemaResult};
pub use loader::{load_entity, parse_entity, EntityLoader};
pub use operation::{Intent, Operation, Verb, VerbMapping};
pub use property::{
    Hook, Hooks, NormalizerFn, Property, PropertyDescriptor, SanitizerFn, ValidatorFn,
};

pub(crate) use entity::quote;
