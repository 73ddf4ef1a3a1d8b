//! Logical field types
//!
//! The `TypeRegistry` maps each logical type name to a pure check and the
//! default bounds applied when a property does not set its own. A registry
//! is built once, optionally extended, then passed by reference to every
//! entity that needs it. Entities resolve their types against it at
//! construction, so an unknown type never surfaces at validate time.

mod bounds;
pub mod checks;
mod password;
mod violation;

pub use bounds::{Bounds, Limit};
pub use password::PasswordPolicy;
pub use violation::{json_type_name, TypeViolation};

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Signature shared by every type check
pub type CheckFn = dyn Fn(&Value, &Bounds, bool) -> Result<(), TypeViolation> + Send + Sync;

/// Grouping of logical types that share a match-mode vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterCategory {
    String,
    Number,
    Date,
    Boolean,
    Array,
    Geometry,
}

impl FilterCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterCategory::String => "string",
            FilterCategory::Number => "number",
            FilterCategory::Date => "date",
            FilterCategory::Boolean => "boolean",
            FilterCategory::Array => "array",
            FilterCategory::Geometry => "geometry",
        }
    }
}

impl fmt::Display for FilterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One registered logical type
#[derive(Clone)]
pub struct TypeRule {
    check: Arc<CheckFn>,
    default_bounds: Bounds,
    category: Option<FilterCategory>,
}

impl TypeRule {
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&Value, &Bounds, bool) -> Result<(), TypeViolation> + Send + Sync + 'static,
    {
        Self {
            check: Arc::new(check),
            default_bounds: Bounds::UNBOUNDED,
            category: None,
        }
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.default_bounds = bounds;
        self
    }

    /// Filter category; types without one cannot be filtered on.
    pub fn with_category(mut self, category: FilterCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn default_bounds(&self) -> &Bounds {
        &self.default_bounds
    }

    pub fn category(&self) -> Option<FilterCategory> {
        self.category
    }

    /// Runs the check with already-resolved bounds.
    pub fn check(&self, value: &Value, bounds: &Bounds, strict: bool) -> Result<(), TypeViolation> {
        (self.check)(value, bounds, strict)
    }
}

impl fmt::Debug for TypeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRule")
            .field("default_bounds", &self.default_bounds)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

/// Read-only table of logical types
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    rules: BTreeMap<String, Arc<TypeRule>>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_policy(PasswordPolicy::default())
    }
}

impl TypeRegistry {
    /// Empty registry, for callers assembling their own type set.
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// Built-in types with the given password policy.
    pub fn with_policy(policy: PasswordPolicy) -> Self {
        use checks::*;
        use FilterCategory as C;

        let lengths = Bounds::between(0.0, 999_999_999.0);

        let mut registry = Self::empty();
        registry
            .insert("boolean", TypeRule::new(boolean).with_category(C::Boolean))
            .insert("number", TypeRule::new(number).with_category(C::Number))
            .insert("integer", TypeRule::new(integer).with_category(C::Number))
            .insert("float", TypeRule::new(float).with_category(C::Number))
            .insert("even", TypeRule::new(even).with_category(C::Number))
            .insert("odd", TypeRule::new(odd).with_category(C::Number))
            .insert("positive", TypeRule::new(positive).with_category(C::Number))
            .insert("negative", TypeRule::new(negative).with_category(C::Number))
            .insert("powerOfTwo", TypeRule::new(power_of_two).with_category(C::Number))
            .insert("ascii", TypeRule::new(ascii).with_category(C::Number))
            .insert(
                "string",
                TypeRule::new(string)
                    .with_bounds(lengths)
                    .with_category(C::String),
            )
            .insert("email", TypeRule::new(email).with_category(C::String))
            .insert("regex", TypeRule::new(regex).with_category(C::String))
            .insert("json", TypeRule::new(json).with_category(C::String))
            .insert("jwt", TypeRule::new(jwt).with_category(C::String))
            .insert("slug", TypeRule::new(slug).with_category(C::String))
            .insert("hexadecimal", TypeRule::new(hexadecimal).with_category(C::String))
            .insert("ipAddress", TypeRule::new(ip_address).with_category(C::String))
            .insert("function", TypeRule::new(function).with_category(C::String))
            .insert(
                "array",
                TypeRule::new(array)
                    .with_bounds(lengths)
                    .with_category(C::Array),
            )
            .insert("date", TypeRule::new(date).with_category(C::Date))
            .insert("timestamp", TypeRule::new(timestamp).with_category(C::Date))
            .insert("object", TypeRule::new(object).with_category(C::String))
            .insert("geometry", TypeRule::new(geometry).with_category(C::Geometry))
            .insert("password", password_rule(policy));
        registry
    }

    /// Registers or replaces a type.
    pub fn insert(&mut self, name: impl Into<String>, rule: TypeRule) -> &mut Self {
        self.rules.insert(name.into(), Arc::new(rule));
        self
    }

    /// Builder form of `insert`.
    pub fn with_type(mut self, name: impl Into<String>, rule: TypeRule) -> Self {
        self.insert(name, rule);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TypeRule>> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Convenience: look up and run a check with the type's default bounds.
    pub fn check(&self, name: &str, value: &Value, strict: bool) -> Option<Result<(), TypeViolation>> {
        self.get(name)
            .map(|rule| rule.check(value, rule.default_bounds(), strict))
    }
}

/// Password type: property bounds replace the policy length limits.
fn password_rule(policy: PasswordPolicy) -> TypeRule {
    TypeRule::new(move |value: &Value, bounds: &Bounds, _strict: bool| {
        let s = value
            .as_str()
            .ok_or_else(|| TypeViolation::wrong_type("password", value))?;
        policy
            .with_lengths(bounds.min_len(), bounds.max_len())
            .validate(s)
    })
}
