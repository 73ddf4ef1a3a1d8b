//! Entity schema
//!
//! An ordered set of properties plus table identity. Everything derived
//! from the properties (column catalogs, unsafe list, key index) is built
//! once in `Entity::new`; the entity is read-only afterwards and can be
//! shared across threads.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::errors::{SchemaError, SchemaResult};
use super::operation::{Intent, Operation, VerbMapping};
use super::property::{Property, PropertyDescriptor};
use crate::observability::Event;
use crate::pipeline::{
    Record, SanitizeLimits, ValidationPipeline, ValidationResult,
};
use crate::types::TypeRegistry;

/// Projection appended to select columns when a page total is requested
pub const TOTAL_COLUMN: &str = "COUNT(*) OVER () AS total";

/// Plain-data entity definition, as stored in definition files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub name: String,

    /// Defaults to the entity name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    #[serde(default)]
    pub verbs: VerbMapping,

    pub properties: Vec<PropertyDescriptor>,
}

impl EntityDefinition {
    pub fn build(self, types: &TypeRegistry) -> SchemaResult<Entity> {
        let table = self.table.unwrap_or_else(|| self.name.clone());
        Ok(Entity::new(self.name, table, self.properties, types)?.with_verbs(self.verbs))
    }
}

/// Columns taking part in one operation
#[derive(Debug, Clone, Default)]
struct Catalog {
    keys: Vec<String>,
    /// `"key"`, or `"key" = $N` for update
    rendered: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Entity {
    name: String,
    table: String,
    properties: Vec<Property>,
    index: HashMap<String, usize>,
    catalogs: [Catalog; 5],
    unsafe_keys: Vec<String>,
    verbs: VerbMapping,
    sanitize_limits: SanitizeLimits,
}

impl Entity {
    /// Resolves every descriptor and derives the catalogs.
    pub fn new(
        name: impl Into<String>,
        table: impl Into<String>,
        descriptors: Vec<PropertyDescriptor>,
        types: &TypeRegistry,
    ) -> SchemaResult<Self> {
        let name = name.into();
        let table = table.into();
        check_table(&table)?;

        let mut properties = Vec::with_capacity(descriptors.len());
        let mut index = HashMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let property = Property::new(descriptor, types)?;
            if index.contains_key(property.key()) {
                return Err(SchemaError::DuplicateKey(property.key().to_string()));
            }
            index.insert(property.key().to_string(), properties.len());
            properties.push(property);
        }

        let catalogs = Operation::ALL.map(|op| catalog(&properties, op));
        let unsafe_keys = properties
            .iter()
            .filter(|p| !p.is_safe())
            .map(|p| p.key().to_string())
            .collect();

        tracing::debug!(
            event = %Event::EntityBuilt,
            entity = %name,
            table = %table,
            properties = properties.len(),
            "entity built"
        );

        Ok(Self {
            name,
            table,
            properties,
            index,
            catalogs,
            unsafe_keys,
            verbs: VerbMapping::default(),
            sanitize_limits: SanitizeLimits::default(),
        })
    }

    pub fn with_verbs(mut self, verbs: VerbMapping) -> Self {
        self.verbs = verbs;
        self
    }

    pub fn with_sanitize_limits(mut self, limits: SanitizeLimits) -> Self {
        self.sanitize_limits = limits;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Table as a quoted identifier; `schema.table` quotes each part.
    pub fn quoted_table(&self) -> String {
        self.table
            .split('.')
            .map(quote)
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn verbs(&self) -> &VerbMapping {
        &self.verbs
    }

    pub fn sanitize_limits(&self) -> &SanitizeLimits {
        &self.sanitize_limits
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&Property> {
        self.index.get(key).map(|&i| &self.properties[i])
    }

    /// Keys of properties marked unsafe for mutation.
    pub fn unsafe_properties(&self) -> &[String] {
        &self.unsafe_keys
    }

    /// Properties taking part in the intent's operation, in order.
    pub fn properties_for(&self, intent: impl Into<Intent>) -> impl Iterator<Item = &Property> {
        let op = intent.into().resolve(&self.verbs);
        self.properties.iter().filter(move |p| p.applies_to(op))
    }

    /// Column keys for an operation.
    pub fn columns(&self, op: Operation) -> &[String] {
        &self.catalogs[op.index()].keys
    }

    /// Quoted column fragments for an operation. Update fragments carry
    /// their placeholder: the Nth entry is `"key" = $N`.
    pub fn rendered_columns(&self, op: Operation) -> &[String] {
        &self.catalogs[op.index()].rendered
    }

    /// Comma-separated column list; `with_total` adds the window count to
    /// select lists.
    pub fn column_list(&self, op: Operation, with_total: bool) -> String {
        let mut list = self.rendered_columns(op).join(", ");
        if with_total && op == Operation::Select {
            if !list.is_empty() {
                list.push_str(", ");
            }
            list.push_str(TOTAL_COLUMN);
        }
        list
    }

    /// Whether `key` can be projected by a select.
    pub fn is_selectable(&self, key: &str) -> bool {
        self.property(key)
            .map_or(false, |p| p.applies_to(Operation::Select))
    }

    pub fn pipeline(&self) -> ValidationPipeline<'_> {
        ValidationPipeline::new(self)
    }

    pub fn validate(&self, records: &mut [Record], intent: impl Into<Intent>) -> ValidationResult<()> {
        self.pipeline().validate(records, intent.into())
    }

    pub fn validate_one(&self, record: &mut Record, intent: impl Into<Intent>) -> ValidationResult<()> {
        self.pipeline().validate_one(record, intent.into())
    }

    pub fn normalize(&self, records: &mut [Record]) {
        self.pipeline().normalize(records)
    }

    pub fn normalize_one(&self, record: &mut Record) {
        self.pipeline().normalize_one(record)
    }

    pub fn validate_body(
        &self,
        body: Option<&mut serde_json::Value>,
        verb: Option<&str>,
    ) -> ValidationResult<()> {
        self.pipeline().validate_body(body, verb)
    }
}

/// Quoted SQL identifier from a trusted schema name.
pub(crate) fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier)
}

fn catalog(properties: &[Property], op: Operation) -> Catalog {
    let keys: Vec<String> = properties
        .iter()
        .filter(|p| p.applies_to(op))
        .map(|p| p.key().to_string())
        .collect();

    let rendered = keys
        .iter()
        .enumerate()
        .map(|(i, key)| match op {
            Operation::Update => format!("{} = ${}", quote(key), i + 1),
            _ => quote(key),
        })
        .collect();

    Catalog { keys, rendered }
}

fn check_table(table: &str) -> SchemaResult<()> {
    if table.split('.').any(|part| part.trim().is_empty()) {
        return Err(SchemaError::malformed("table", "table name must be non-empty"));
    }
    if table.contains('"') || table.chars().any(char::is_control) {
        return Err(SchemaError::malformed(
            "table",
            format!("table name {:?} is not a valid identifier", table),
        ));
    }
    Ok(())
}
