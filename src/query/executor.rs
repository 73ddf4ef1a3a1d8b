//! Executor seam
//!
//! Statement building is synchronous and pure. The database call is the
//! only suspension point; it sits behind [`Executor`] so any driver (or a
//! test double) can run the statements. Connection pooling, retries and
//! timeouts belong to the executor.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use super::assembler::{QueryAssembler, SelectRequest, Statement};
use super::errors::ExecuteError;
use super::statements;
use crate::filter::MatchModeRegistry;
use crate::observability::Event;
use crate::pipeline::Record;
use crate::schema::{Entity, Operation};

/// Runs parameterized SQL and returns rows as JSON objects.
pub trait Executor: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn query(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<Vec<Value>, Self::Error>> + Send;
}

/// An entity bound to an executor
///
/// Writes validate their records first; nothing reaches the executor
/// unless the whole batch passes.
pub struct SqlEntity<X> {
    entity: Arc<Entity>,
    modes: Arc<MatchModeRegistry>,
    executor: X,
}

impl<X: Executor> SqlEntity<X> {
    pub fn new(entity: Arc<Entity>, executor: X) -> Self {
        Self {
            entity,
            modes: Arc::new(MatchModeRegistry::standard()),
            executor,
        }
    }

    pub fn with_modes(mut self, modes: Arc<MatchModeRegistry>) -> Self {
        self.modes = modes;
        self
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn executor(&self) -> &X {
        &self.executor
    }

    pub async fn select(&self, request: &SelectRequest) -> Result<Vec<Value>, ExecuteError<X::Error>> {
        let statement = QueryAssembler::new(&self.entity, &self.modes).select(request);
        self.execute(statement).await
    }

    pub async fn insert(
        &self,
        records: &mut [Record],
        returning: Option<&str>,
    ) -> Result<Vec<Value>, ExecuteError<X::Error>> {
        self.entity
            .validate(records, Operation::Insert)
            .map_err(|e| ExecuteError::Query(e.into()))?;
        let statement = statements::insert(&self.entity, records, returning)?;
        self.execute(statement).await
    }

    pub async fn update(
        &self,
        record: &mut Record,
        id: impl Into<Value>,
    ) -> Result<Vec<Value>, ExecuteError<X::Error>> {
        self.entity
            .validate_one(record, Operation::Update)
            .map_err(|e| ExecuteError::Query(e.into()))?;
        let statement = statements::update(&self.entity, record, id)?;
        self.execute(statement).await
    }

    pub async fn merge(
        &self,
        record: &mut Record,
        id: impl Into<Value>,
    ) -> Result<Vec<Value>, ExecuteError<X::Error>> {
        self.entity
            .validate_one(record, Operation::Merge)
            .map_err(|e| ExecuteError::Query(e.into()))?;
        let statement = statements::merge(&self.entity, record, id)?;
        self.execute(statement).await
    }

    pub async fn delete(&self, ids: &[Value]) -> Result<Vec<Value>, ExecuteError<X::Error>> {
        let statement = statements::delete_ids(&self.entity, ids)?;
        self.execute(statement).await
    }

    pub async fn delete_archived(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Vec<Value>, ExecuteError<X::Error>> {
        self.execute(statements::delete_archived(&self.entity, before))
            .await
    }

    async fn execute(&self, statement: Statement) -> Result<Vec<Value>, ExecuteError<X::Error>> {
        let start = Instant::now();
        let result = self
            .executor
            .query(&statement.sql, statement.args.values())
            .await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(rows) => {
                tracing::debug!(
                    event = %Event::QueryExecuted,
                    entity = %self.entity.name(),
                    sql = %statement.sql,
                    rows = rows.len(),
                    elapsed_ms,
                    "query executed"
                );
                Ok(rows)
            }
            Err(err) => {
                tracing::warn!(
                    event = %Event::QueryFailed,
                    entity = %self.entity.name(),
                    sql = %statement.sql,
                    error = %err,
                    elapsed_ms,
                    "query failed"
                );
                Err(ExecuteError::Database(err))
            }
        }
    }
}
