//! Operation and verb vocabulary
//!
//! Properties declare membership in persistence operations. Callers may
//! speak either in operations or in HTTP verbs; verbs are resolved through
//! the entity's `VerbMapping`, a total table with no implicit fallthrough.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical persistence operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Select,
    Insert,
    Update,
    Merge,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Select,
        Operation::Insert,
        Operation::Update,
        Operation::Merge,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Select => "select",
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Merge => "merge",
            Operation::Delete => "delete",
        }
    }

    /// Case-insensitive parse.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub const ALL: [Verb; 5] = [Verb::Get, Verb::Post, Verb::Put, Verb::Patch, Verb::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        }
    }

    /// Case-insensitive parse.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verb to operation table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct VerbMapping {
    #[serde(default = "default_get")]
    pub get: Operation,
    #[serde(default = "default_post")]
    pub post: Operation,
    #[serde(default = "default_put")]
    pub put: Operation,
    #[serde(default = "default_patch")]
    pub patch: Operation,
    #[serde(default = "default_delete")]
    pub delete: Operation,
}

fn default_get() -> Operation {
    Operation::Select
}

fn default_post() -> Operation {
    Operation::Insert
}

fn default_put() -> Operation {
    Operation::Update
}

fn default_patch() -> Operation {
    Operation::Update
}

fn default_delete() -> Operation {
    Operation::Delete
}

impl Default for VerbMapping {
    /// PUT and PATCH both map to update.
    fn default() -> Self {
        Self {
            get: default_get(),
            post: default_post(),
            put: default_put(),
            patch: default_patch(),
            delete: default_delete(),
        }
    }
}

impl VerbMapping {
    /// Default table with PATCH mapped to merge.
    pub fn patch_as_merge() -> Self {
        Self {
            patch: Operation::Merge,
            ..Self::default()
        }
    }

    pub fn resolve(&self, verb: Verb) -> Operation {
        match verb {
            Verb::Get => self.get,
            Verb::Post => self.post,
            Verb::Put => self.put,
            Verb::Patch => self.patch,
            Verb::Delete => self.delete,
        }
    }
}

/// What a caller asks for: an operation, or a verb still to be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Operation(Operation),
    Verb(Verb),
}

impl Intent {
    /// Accepts either vocabulary.
    pub fn parse(s: &str) -> Option<Self> {
        Verb::parse(s)
            .map(Intent::Verb)
            .or_else(|| Operation::parse(s).map(Intent::Operation))
    }

    pub fn resolve(&self, mapping: &VerbMapping) -> Operation {
        match self {
            Intent::Operation(op) => *op,
            Intent::Verb(verb) => mapping.resolve(*verb),
        }
    }

    /// Every accepted spelling, for error messages.
    pub fn accepted() -> Vec<&'static str> {
        Verb::ALL
            .iter()
            .map(Verb::as_str)
            .chain(Operation::ALL.iter().map(Operation::as_str))
            .collect()
    }
}

impl From<Operation> for Intent {
    fn from(op: Operation) -> Self {
        Intent::Operation(op)
    }
}

impl From<Verb> for Intent {
    fn from(verb: Verb) -> Self {
        Intent::Verb(verb)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Operation(op) => op.fmt(f),
            Intent::Verb(verb) => verb.fmt(f),
        }
    }
}
