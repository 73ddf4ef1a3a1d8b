//! Property descriptors and resolved properties
//!
//! A `PropertyDescriptor` is plain data, deserializable from an entity
//! definition and buildable in code. `Property::new` resolves it against a
//! `TypeRegistry`; every construction error surfaces there.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::errors::{SchemaError, SchemaResult};
use super::operation::Operation;
use crate::pipeline::normalizers;
use crate::types::{Bounds, Limit, TypeRegistry, TypeRule, TypeViolation};

pub type SanitizerFn = dyn Fn(Value) -> Value + Send + Sync;
pub type NormalizerFn = dyn Fn(Value) -> Value + Send + Sync;
pub type ValidatorFn = dyn Fn(&Value) -> Result<(), TypeViolation> + Send + Sync;

/// Pipeline hook: the built-in behaviour or a caller-supplied callback
pub enum Hook<F: ?Sized> {
    Default,
    Custom(Arc<F>),
}

impl<F: ?Sized> Hook<F> {
    pub fn custom(&self) -> Option<&F> {
        match self {
            Hook::Default => None,
            Hook::Custom(f) => Some(&**f),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Hook::Custom(_))
    }
}

impl<F: ?Sized> Default for Hook<F> {
    fn default() -> Self {
        Hook::Default
    }
}

impl<F: ?Sized> Clone for Hook<F> {
    fn clone(&self) -> Self {
        match self {
            Hook::Default => Hook::Default,
            Hook::Custom(f) => Hook::Custom(Arc::clone(f)),
        }
    }
}

impl<F: ?Sized> fmt::Debug for Hook<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Default => write!(f, "Default"),
            Hook::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Callbacks attached to a descriptor in code
#[derive(Debug, Clone, Default)]
pub struct Hooks {
    pub sanitizer: Hook<SanitizerFn>,
    pub normalizer: Hook<NormalizerFn>,
    pub validator: Hook<ValidatorFn>,
}

fn default_true() -> bool {
    true
}

/// One field's declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    pub key: String,

    /// Logical type name, resolved against the registry
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Limit>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Limit>,

    #[serde(default)]
    pub required: bool,

    /// False marks the field as not exposed to unrestricted mutation
    #[serde(default = "default_true")]
    pub safe: bool,

    /// Strict checking, no coercion
    #[serde(default)]
    pub type_check: bool,

    /// Operation tags; absent means every operation
    #[serde(default, alias = "methods", skip_serializing_if = "Option::is_none")]
    pub operations: Option<Vec<String>>,

    #[serde(default = "default_true")]
    pub sanitize: bool,

    #[serde(default)]
    pub normalize: bool,

    #[serde(default = "default_true", alias = "control")]
    pub validate: bool,

    /// Named normalizer (see `pipeline::normalizers::NAMES`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalizer: Option<String>,

    #[serde(skip)]
    pub hooks: Hooks,
}

impl PropertyDescriptor {
    /// Descriptor with every flag at its default.
    pub fn new(key: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            type_name: type_name.into(),
            min: None,
            max: None,
            required: false,
            safe: true,
            type_check: false,
            operations: None,
            sanitize: true,
            normalize: false,
            validate: true,
            normalizer: None,
            hooks: Hooks::default(),
        }
    }

    pub fn min(mut self, min: impl Into<Limit>) -> Self {
        self.min = Some(min.into());
        self
    }

    pub fn max(mut self, max: impl Into<Limit>) -> Self {
        self.max = Some(max.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unsafe_for_mutation(mut self) -> Self {
        self.safe = false;
        self
    }

    pub fn strict(mut self) -> Self {
        self.type_check = true;
        self
    }

    pub fn operations(mut self, operations: &[Operation]) -> Self {
        self.operations = Some(operations.iter().map(|op| op.as_str().to_string()).collect());
        self
    }

    pub fn without_sanitize(mut self) -> Self {
        self.sanitize = false;
        self
    }

    pub fn without_validation(mut self) -> Self {
        self.validate = false;
        self
    }

    /// Enables normalization with a named normalizer.
    pub fn normalize_with(mut self, name: impl Into<String>) -> Self {
        self.normalize = true;
        self.normalizer = Some(name.into());
        self
    }

    pub fn sanitizer<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.hooks.sanitizer = Hook::Custom(Arc::new(f));
        self
    }

    /// Enables normalization with a custom callback.
    pub fn normalizer<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.normalize = true;
        self.hooks.normalizer = Hook::Custom(Arc::new(f));
        self
    }

    pub fn validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<(), TypeViolation> + Send + Sync + 'static,
    {
        self.hooks.validator = Hook::Custom(Arc::new(f));
        self
    }
}

/// A descriptor resolved against a type registry
#[derive(Debug, Clone)]
pub struct Property {
    key: String,
    type_name: String,
    rule: Arc<TypeRule>,
    bounds: Bounds,
    required: bool,
    safe: bool,
    type_check: bool,
    operations: [bool; 5],
    sanitize: bool,
    normalize: bool,
    validate: bool,
    hooks: Hooks,
}

impl Property {
    pub fn new(descriptor: PropertyDescriptor, types: &TypeRegistry) -> SchemaResult<Self> {
        let PropertyDescriptor {
            key,
            type_name,
            min,
            max,
            required,
            safe,
            type_check,
            operations,
            sanitize,
            normalize,
            validate,
            normalizer,
            mut hooks,
        } = descriptor;

        check_key(&key)?;

        let rule = types
            .get(&type_name)
            .cloned()
            .ok_or_else(|| SchemaError::unknown_type(&key, &type_name))?;

        let operations = match operations {
            None => [true; 5],
            Some(tags) => {
                let mut set = [false; 5];
                for tag in &tags {
                    let op = Operation::parse(tag)
                        .ok_or_else(|| SchemaError::invalid_operation(&key, tag))?;
                    set[op.index()] = true;
                }
                set
            }
        };

        if let (Some(name), false) = (&normalizer, hooks.normalizer.is_custom()) {
            let f = normalizers::named(name).ok_or_else(|| SchemaError::UnknownNormalizer {
                key: key.clone(),
                name: name.clone(),
            })?;
            hooks.normalizer = Hook::Custom(f);
        }

        let bounds = Bounds::new(min, max).or(rule.default_bounds());
        if bounds.is_inverted() {
            return Err(SchemaError::InvalidBounds {
                key,
                min: bounds.min_label(),
                max: bounds.max_label(),
            });
        }

        Ok(Self {
            key,
            type_name,
            rule,
            bounds,
            required,
            safe,
            type_check,
            operations,
            sanitize,
            normalize,
            validate,
            hooks,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn rule(&self) -> &TypeRule {
        &self.rule
    }

    /// Effective bounds: own bounds over the type defaults.
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_safe(&self) -> bool {
        self.safe
    }

    pub fn is_strict(&self) -> bool {
        self.type_check
    }

    pub fn sanitizes(&self) -> bool {
        self.sanitize
    }

    /// True only when enabled and a normalizer is attached.
    pub fn normalizes(&self) -> bool {
        self.normalize && self.hooks.normalizer.is_custom()
    }

    pub fn validates(&self) -> bool {
        self.validate
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn applies_to(&self, op: Operation) -> bool {
        self.operations[op.index()]
    }

    pub fn operations(&self) -> impl Iterator<Item = Operation> + '_ {
        Operation::ALL.into_iter().filter(|op| self.applies_to(*op))
    }

    /// Custom validator if any, otherwise the type check with this
    /// property's bounds and strictness.
    pub fn check(&self, value: &Value) -> Result<(), TypeViolation> {
        match &self.hooks.validator {
            Hook::Custom(validator) => validator(value),
            Hook::Default => self.rule.check(value, &self.bounds, self.type_check),
        }
    }
}

/// Keys become quoted identifiers, so they must be non-empty and free of
/// quotes and control characters.
fn check_key(key: &str) -> SchemaResult<()> {
    if key.trim().is_empty() {
        return Err(SchemaError::invalid_key(key, "key must be a non-empty string"));
    }
    if key.contains('"') {
        return Err(SchemaError::invalid_key(key, "key must not contain double quotes"));
    }
    if key.chars().any(char::is_control) {
        return Err(SchemaError::invalid_key(key, "key must not contain control characters"));
    }
    Ok(())
}
