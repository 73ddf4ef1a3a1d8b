//! antity - declarative entity schemas for relational persistence
//!
//! One per-field schema drives two things:
//! - a validation pipeline (sanitize, normalize, require, validate) run
//!   over incoming records before they reach storage
//! - a compiler from client filter descriptors to parameterized SQL
//!   predicates, assembled into select and write statements
//!
//! Registries are explicit values passed at construction time; entities
//! are immutable once built and can be shared across threads.

pub mod cli;
pub mod config;
pub mod filter;
pub mod observability;
pub mod pipeline;
pub mod query;
pub mod schema;
pub mod types;
