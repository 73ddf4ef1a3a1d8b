//! Filter compilation
//!
//! Client filter descriptors become parameterized SQL predicates:
//!
//! - Column identifiers are quoted schema keys, never client text
//! - Values, JSON keys and sub-property names are always bound arguments
//! - A filter that cannot compile is dropped and logged; the rest proceed
//! - The argument list is per call and threaded by `&mut`, never shared
//!
//! ```ignore
//! let modes = MatchModeRegistry::standard();
//! let mut args = SqlArgs::new();
//! let compiled = FilterCompiler::new(&entity, &modes).compile(&filters, &mut args);
//! ```

mod args;
mod compiler;
mod input;
mod match_mode;
mod scalar;
mod structural;

pub use args::SqlArgs;
pub use compiler::{
    CompiledFilters, DroppedFilter, FilterAnomaly, FilterCompiler, ARRAY_AGG_SUFFIX,
    JSON_AGG_SUFFIX,
};
pub use input::{BoolOperator, Filter, FilterInput, FilterMap};
pub use match_mode::{Comparator, MatchMode, MatchModeRegistry};
pub use structural::MAX_OBJECT_DEPTH;
pub use crate::types::FilterCategory;
