//! In-memory connection that records every statement and replays scripted rows.

#![allow(dead_code)]

use querykit::{
    Connection, ConnectionConfig, Processor, QbError, QbResult, QueryGrammar, Row, SchemaGrammar,
    Value,
};
use std::collections::VecDeque;
use std::future::{Future, ready};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub sql: String,
    pub bindings: Vec<Value>,
}

#[derive(Debug)]
pub struct RecordingConnection {
    grammar: Arc<QueryGrammar>,
    schema: SchemaGrammar,
    processor: Box<dyn Processor>,
    database: Option<String>,
    log: Mutex<Vec<Executed>>,
    results: Mutex<VecDeque<Vec<Row>>>,
    affected: u64,
    last_id: i64,
    fail_with: Option<String>,
}

impl RecordingConnection {
    pub fn new(config: &ConnectionConfig) -> Self {
        Self {
            grammar: config.query_grammar(),
            schema: config.schema_grammar(),
            processor: config.processor(),
            database: config.database.clone(),
            log: Mutex::new(Vec::new()),
            results: Mutex::new(VecDeque::new()),
            affected: 1,
            last_id: 0,
            fail_with: None,
        }
    }

    pub fn with_affected(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }

    pub fn with_last_id(mut self, id: i64) -> Self {
        self.last_id = id;
        self
    }

    /// Every call fails with a driver error.
    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    /// Queue the rows returned by the next `select`.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.results.lock().unwrap().push_back(rows);
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.log.lock().unwrap().clone()
    }

    pub fn statements(&self) -> Vec<String> {
        self.executed().into_iter().map(|e| e.sql).collect()
    }

    fn record(&self, sql: &str, bindings: &[Value]) -> QbResult<()> {
        self.log.lock().unwrap().push(Executed {
            sql: sql.to_string(),
            bindings: bindings.to_vec(),
        });
        match &self.fail_with {
            Some(message) => Err(QbError::driver(message.clone())),
            None => Ok(()),
        }
    }
}

impl Connection for RecordingConnection {
    fn query_grammar(&self) -> &Arc<QueryGrammar> {
        &self.grammar
    }

    fn schema_grammar(&self) -> &SchemaGrammar {
        &self.schema
    }

    fn processor(&self) -> &dyn Processor {
        self.processor.as_ref()
    }

    fn database_name(&self) -> Option<&str> {
        self.database.as_deref()
    }

    fn select(&self, sql: &str, bindings: &[Value]) -> impl Future<Output = QbResult<Vec<Row>>> + Send {
        let result = self
            .record(sql, bindings)
            .map(|()| self.results.lock().unwrap().pop_front().unwrap_or_default());
        ready(result)
    }

    fn statement(&self, sql: &str, bindings: &[Value]) -> impl Future<Output = QbResult<bool>> + Send {
        ready(self.record(sql, bindings).map(|()| true))
    }

    fn affecting_statement(
        &self,
        sql: &str,
        bindings: &[Value],
    ) -> impl Future<Output = QbResult<u64>> + Send {
        ready(self.record(sql, bindings).map(|()| self.affected))
    }

    fn last_insert_id(&self) -> impl Future<Output = QbResult<i64>> + Send {
        ready(Ok(self.last_id))
    }
}

pub fn row<const N: usize>(fields: [(&str, Value); N]) -> Row {
    fields.into_iter().collect()
}
