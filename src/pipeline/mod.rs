//! Validation pipeline
//!
//! For each record and each property taking part in the requested
//! operation, stages run in a fixed order:
//!
//! 1. sanitize (custom sanitizer or bounded deep trim)
//! 2. normalize (when enabled and a normalizer is attached)
//! 3. require (null and absent count as missing; `0`, `false`, `""` do not)
//! 4. validate (custom validator or the type check)
//!
//! Earlier stages write back into the record, so a later stage sees the
//! repaired value. The first failing property aborts the whole batch.

mod errors;
pub mod normalizers;
mod sanitize;

pub use errors::{ErrorBody, ValidationError, ValidationResult};
pub use sanitize::{deep_trim, SanitizeLimits};

use serde_json::{Map, Value};

use crate::observability::Event;
use crate::schema::{Entity, Hook, Intent, Operation, Property, Verb};

/// One record: field name to value
pub type Record = Map<String, Value>;

/// Runs the stages for one entity
#[derive(Debug, Clone, Copy)]
pub struct ValidationPipeline<'e> {
    entity: &'e Entity,
}

impl<'e> ValidationPipeline<'e> {
    pub fn new(entity: &'e Entity) -> Self {
        Self { entity }
    }

    /// Sanitize and normalize every present field of every record.
    pub fn normalize(&self, records: &mut [Record]) {
        for record in records.iter_mut() {
            self.normalize_one(record);
        }
    }

    /// Sanitize and normalize every present field of one record.
    pub fn normalize_one(&self, record: &mut Record) {
        for property in self.entity.properties() {
            self.clean(record, property);
        }
    }

    /// Validates a batch, stopping at the first failure.
    pub fn validate(&self, records: &mut [Record], intent: Intent) -> ValidationResult<()> {
        let op = intent.resolve(self.entity.verbs());
        for record in records.iter_mut() {
            self.run(record, op)?;
        }
        Ok(())
    }

    pub fn validate_one(&self, record: &mut Record, intent: Intent) -> ValidationResult<()> {
        self.run(record, intent.resolve(self.entity.verbs()))
    }

    /// Request-body entry point.
    ///
    /// The body may be one object or a non-empty array of objects. The verb
    /// is the raw method string from the request.
    pub fn validate_body(&self, body: Option<&mut Value>, verb: Option<&str>) -> ValidationResult<()> {
        let intent = verb
            .and_then(|v| Verb::parse(v).map(Intent::Verb))
            .ok_or_else(|| ValidationError::InvalidVerb {
                received: verb.unwrap_or_default().to_string(),
                accepted: Verb::ALL.map(|v| v.as_str()).join(", "),
            })?;
        let op = intent.resolve(self.entity.verbs());

        match body {
            Some(Value::Object(record)) => self.run(record, op),
            Some(Value::Array(items)) if !items.is_empty() => {
                if !items.iter().all(Value::is_object) {
                    return Err(ValidationError::NoData);
                }
                for item in items.iter_mut() {
                    if let Value::Object(record) = item {
                        self.run(record, op)?;
                    }
                }
                Ok(())
            }
            _ => Err(ValidationError::NoData),
        }
    }

    fn run(&self, record: &mut Record, op: Operation) -> ValidationResult<()> {
        for property in self.entity.properties_for(op) {
            self.clean(record, property);

            let value = record.get(property.key()).filter(|v| !v.is_null());

            if property.is_required() {
                tracing::debug!(event = %Event::Require, key = property.key(), "require");
                if value.is_none() {
                    return Err(fail(ValidationError::Missing {
                        key: property.key().to_string(),
                        type_name: property.type_name().to_string(),
                    }));
                }
            }

            if let (Some(value), true) = (value, property.validates()) {
                tracing::debug!(event = %Event::Control, key = property.key(), "control");
                property.check(value).map_err(|cause| {
                    fail(match property.hooks().validator {
                        Hook::Custom(_) => ValidationError::CustomFailed {
                            key: property.key().to_string(),
                            cause,
                        },
                        Hook::Default => ValidationError::Invalid {
                            key: property.key().to_string(),
                            type_name: property.type_name().to_string(),
                            cause,
                        },
                    })
                })?;
            }
        }
        Ok(())
    }

    /// Sanitize then normalize one field in place. Absent and null values
    /// are left alone.
    fn clean(&self, record: &mut Record, property: &Property) {
        let Some(slot) = record.get_mut(property.key()) else {
            return;
        };
        if slot.is_null() {
            return;
        }

        if property.sanitizes() {
            tracing::debug!(event = %Event::Sanitize, key = property.key(), "sanitize");
            let value = slot.take();
            *slot = match property.hooks().sanitizer.custom() {
                Some(sanitizer) => sanitizer(value),
                None => deep_trim(value, self.entity.sanitize_limits()),
            };
        }

        if property.normalizes() {
            if let Some(normalizer) = property.hooks().normalizer.custom() {
                tracing::debug!(event = %Event::Normalize, key = property.key(), "normalize");
                let value = slot.take();
                *slot = normalizer(value);
            }
        }
    }
}

fn fail(err: ValidationError) -> ValidationError {
    tracing::debug!(
        event = %Event::ValidationFailed,
        code = err.code(),
        key = err.key().unwrap_or_default(),
        "{}",
        err
    );
    err
}
