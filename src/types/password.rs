//! Password policy
//!
//! Thresholds are read once at process start (see `config`) and handed to the
//! type registry. Nothing here touches the environment.

use serde::{Deserialize, Serialize};

use super::violation::TypeViolation;

/// Password policy thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordPolicy {
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default)]
    pub require_uppercase: bool,
    #[serde(default)]
    pub require_lowercase: bool,
    #[serde(default)]
    pub require_number: bool,
    #[serde(default)]
    pub require_special: bool,
}

fn default_min_length() -> usize {
    9
}

fn default_max_length() -> usize {
    20
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            max_length: default_max_length(),
            require_uppercase: false,
            require_lowercase: false,
            require_number: false,
            require_special: false,
        }
    }
}

impl PasswordPolicy {
    /// Same policy with different length limits.
    ///
    /// Property bounds override the policy lengths when present.
    pub fn with_lengths(&self, min_length: Option<usize>, max_length: Option<usize>) -> Self {
        Self {
            min_length: min_length.unwrap_or(self.min_length),
            max_length: max_length.unwrap_or(self.max_length),
            ..self.clone()
        }
    }

    /// Validate a password against this policy
    pub fn validate(&self, password: &str) -> Result<(), TypeViolation> {
        let length = password.chars().count();

        if length < self.min_length || length > self.max_length {
            return Err(TypeViolation::password(format!(
                "length must be between {} and {} characters",
                self.min_length, self.max_length
            )));
        }

        if self.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            return Err(TypeViolation::password(
                "must contain at least one uppercase letter",
            ));
        }

        if self.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
            return Err(TypeViolation::password(
                "must contain at least one lowercase letter",
            ));
        }

        if self.require_number && !password.chars().any(|c| c.is_numeric()) {
            return Err(TypeViolation::password("must contain at least one number"));
        }

        if self.require_special && !password.chars().any(|c| !c.is_alphanumeric()) {
            return Err(TypeViolation::password(
                "must contain at least one special character",
            ));
        }

        Ok(())
    }
}
