//! Match modes and their legal categories
//!
//! Each filter category has a closed vocabulary of match modes. A mode
//! maps to one SQL comparator template; the compiler never builds SQL from
//! a mode it has not first checked against the field's category.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::Value;

use crate::types::FilterCategory;

/// Named comparison semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatchMode {
    StartsWith,
    Contains,
    EndsWith,
    NotContains,
    Equals,
    NotEquals,
    Lt,
    Lte,
    Gt,
    Gte,
    Between,
    In,
    Is,
    IsNot,
    Before,
    After,
    StContains,
    StDwithin,
}

impl MatchMode {
    pub const ALL: [MatchMode; 18] = [
        MatchMode::StartsWith,
        MatchMode::Contains,
        MatchMode::EndsWith,
        MatchMode::NotContains,
        MatchMode::Equals,
        MatchMode::NotEquals,
        MatchMode::Lt,
        MatchMode::Lte,
        MatchMode::Gt,
        MatchMode::Gte,
        MatchMode::Between,
        MatchMode::In,
        MatchMode::Is,
        MatchMode::IsNot,
        MatchMode::Before,
        MatchMode::After,
        MatchMode::StContains,
        MatchMode::StDwithin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::StartsWith => "startsWith",
            MatchMode::Contains => "contains",
            MatchMode::EndsWith => "endsWith",
            MatchMode::NotContains => "notContains",
            MatchMode::Equals => "equals",
            MatchMode::NotEquals => "notEquals",
            MatchMode::Lt => "lt",
            MatchMode::Lte => "lte",
            MatchMode::Gt => "gt",
            MatchMode::Gte => "gte",
            MatchMode::Between => "between",
            MatchMode::In => "in",
            MatchMode::Is => "is",
            MatchMode::IsNot => "isNot",
            MatchMode::Before => "before",
            MatchMode::After => "after",
            MatchMode::StContains => "st_contains",
            MatchMode::StDwithin => "st_dwithin",
        }
    }

    /// Exact, case-sensitive parse of the wire name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_str() == s)
    }

    pub fn comparator(&self) -> Comparator {
        use Comparator as C;
        match self {
            MatchMode::Equals | MatchMode::Is => C::Eq,
            MatchMode::NotEquals | MatchMode::IsNot => C::Ne,
            MatchMode::Lt | MatchMode::Before => C::Lt,
            MatchMode::Lte => C::Lte,
            MatchMode::Gt | MatchMode::After => C::Gt,
            MatchMode::Gte => C::Gte,
            MatchMode::StartsWith => C::Like {
                negated: false,
                leading: false,
                trailing: true,
            },
            MatchMode::EndsWith => C::Like {
                negated: false,
                leading: true,
                trailing: false,
            },
            MatchMode::Contains => C::Like {
                negated: false,
                leading: true,
                trailing: true,
            },
            MatchMode::NotContains => C::Like {
                negated: true,
                leading: true,
                trailing: true,
            },
            MatchMode::Between => C::Range,
            MatchMode::In => C::Any,
            MatchMode::StContains => C::Envelope,
            MatchMode::StDwithin => C::Radius,
        }
    }

    /// Null test for a `null` filter value, when the mode has one.
    pub fn null_test(&self) -> Option<&'static str> {
        match self.comparator() {
            Comparator::Eq => Some("IS NULL"),
            Comparator::Ne => Some("IS NOT NULL"),
            _ => None,
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// SQL template a match mode compiles to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    /// LIKE / NOT LIKE, case-folded; wildcards on the marked sides
    Like {
        negated: bool,
        leading: bool,
        trailing: bool,
    },
    /// Two-sided bound, `>=` and `<=`
    Range,
    /// `= ANY($n)` over a bound array
    Any,
    /// Bounding-box containment
    Envelope,
    /// Point-plus-radius proximity
    Radius,
}

impl Comparator {
    /// Infix operator for the binary comparators.
    pub fn operator(&self) -> Option<&'static str> {
        match self {
            Comparator::Eq => Some("="),
            Comparator::Ne => Some("<>"),
            Comparator::Lt => Some("<"),
            Comparator::Lte => Some("<="),
            Comparator::Gt => Some(">"),
            Comparator::Gte => Some(">="),
            Comparator::Like { negated: false, .. } => Some("LIKE"),
            Comparator::Like { negated: true, .. } => Some("NOT LIKE"),
            _ => None,
        }
    }
}

/// Legal match modes per filter category
#[derive(Debug, Clone)]
pub struct MatchModeRegistry {
    modes: BTreeMap<FilterCategory, BTreeSet<MatchMode>>,
}

impl Default for MatchModeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl MatchModeRegistry {
    pub fn standard() -> Self {
        use FilterCategory as C;
        use MatchMode::*;

        let table: [(FilterCategory, &[MatchMode]); 6] = [
            (
                C::String,
                &[StartsWith, Contains, EndsWith, NotContains, Equals, NotEquals, In],
            ),
            (C::Number, &[Equals, NotEquals, Lt, Lte, Gt, Gte, Between, In]),
            (C::Date, &[Is, IsNot, Before, After, Lte, Gte, Between]),
            (C::Boolean, &[Equals, NotEquals]),
            (C::Array, &[In]),
            (C::Geometry, &[StContains, StDwithin]),
        ];

        Self {
            modes: table
                .into_iter()
                .map(|(category, modes)| (category, modes.iter().copied().collect()))
                .collect(),
        }
    }

    /// Adds a mode to a category.
    pub fn with_mode(mut self, category: FilterCategory, mode: MatchMode) -> Self {
        self.modes.entry(category).or_default().insert(mode);
        self
    }

    pub fn allows(&self, category: FilterCategory, mode: MatchMode) -> bool {
        self.modes
            .get(&category)
            .map_or(false, |modes| modes.contains(&mode))
    }

    pub fn modes(&self, category: FilterCategory) -> impl Iterator<Item = MatchMode> + '_ {
        self.modes.get(&category).into_iter().flatten().copied()
    }

    /// Mode used when a filter names none. Geometry infers from the value:
    /// an envelope (`bounds`) means containment, anything else proximity.
    pub fn default_mode(&self, category: FilterCategory, value: &Value) -> MatchMode {
        match category {
            FilterCategory::String | FilterCategory::Number | FilterCategory::Boolean => {
                MatchMode::Equals
            }
            FilterCategory::Date => MatchMode::Is,
            FilterCategory::Array => MatchMode::In,
            FilterCategory::Geometry => {
                if value.get("bounds").is_some() {
                    MatchMode::StContains
                } else {
                    MatchMode::StDwithin
                }
            }
        }
    }
}
