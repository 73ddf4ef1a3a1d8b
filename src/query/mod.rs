//! Query assembly
//!
//! Selects combine compiled filters, ORDER BY and bound LIMIT/OFFSET with
//! the entity's select projection. Writes are built from the insert,
//! update and merge catalogs. Statements carry SQL text plus positional
//! arguments for a parameterized driver call; [`SqlEntity`] hands them to
//! an [`Executor`].

mod assembler;
mod errors;
mod executor;
mod parser;
pub mod statements;

pub use assembler::{QueryAssembler, SelectRequest, SortOrder, Statement};
pub use errors::{ExecuteError, QueryError, QueryResult};
pub use executor::{Executor, SqlEntity};
pub use parser::{RequestParser, MAX_ROWS};
