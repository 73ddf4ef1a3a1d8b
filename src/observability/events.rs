//! Observable events
//!
//! Every diagnostic names one of these. Events are explicit and typed; the
//! string form is what lands in the `event` field of the log line.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded from file or environment
    ConfigLoaded,
    /// Entity definitions loaded
    EntitiesLoaded,
    /// Entity constructed and catalogs derived
    EntityBuilt,

    // Pipeline
    /// Sanitize stage applied to a field
    Sanitize,
    /// Normalize stage applied to a field
    Normalize,
    /// Require stage checked a field
    Require,
    /// Validate stage checked a field
    Control,
    /// Record rejected by the pipeline
    ValidationFailed,
    /// Deep trim stopped at the depth limit
    SanitizeDepthExceeded,

    // Filters
    /// Filter compiled into a predicate
    FilterCompiled,
    /// Filter dropped (unknown field, illegal mode, malformed value)
    FilterDropped,
    /// Sort field dropped
    SortDropped,

    // Queries
    /// Statement text and arguments assembled
    QueryAssembled,
    /// Statement handed to the executor
    QueryExecuted,
    /// Executor reported an error
    QueryFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::EntitiesLoaded => "ENTITIES_LOADED",
            Event::EntityBuilt => "ENTITY_BUILT",

            Event::Sanitize => "SANITIZE",
            Event::Normalize => "NORMALIZE",
            Event::Require => "REQUIRE",
            Event::Control => "CONTROL",
            Event::ValidationFailed => "VALIDATION_FAILED",
            Event::SanitizeDepthExceeded => "SANITIZE_DEPTH_EXCEEDED",

            Event::FilterCompiled => "FILTER_COMPILED",
            Event::FilterDropped => "FILTER_DROPPED",
            Event::SortDropped => "SORT_DROPPED",

            Event::QueryAssembled => "QUERY_ASSEMBLED",
            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::QueryFailed => "QUERY_FAILED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::FilterDropped.to_string(), "FILTER_DROPPED");
        assert_eq!(Event::SanitizeDepthExceeded.as_str(), "SANITIZE_DEPTH_EXCEEDED");
    }
}
