#![allow(dead_code)]

use repodb::{Client, Connection, OrmResult, ParamType, Row, Statement, Value};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// One executed statement with the values bound for that execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub sql: String,
    pub binds: Vec<(String, Value, ParamType)>,
}

#[derive(Debug, Default)]
pub struct MockState {
    pub prepared: Vec<String>,
    pub executions: Vec<Execution>,
    /// Result sets handed out to SELECT executions, in order.
    pub results: VecDeque<Vec<Row>>,
    pub last_insert_id: i64,
    pub transactions: Vec<&'static str>,
}

/// Scripted in-memory client.
#[derive(Clone, Default)]
pub struct MockClient(pub Rc<RefCell<MockState>>);

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection(&self) -> Connection {
        Connection::new(self.clone())
    }

    pub fn push_rows(&self, rows: Vec<Row>) -> &Self {
        self.0.borrow_mut().results.push_back(rows);
        self
    }

    pub fn set_last_insert_id(&self, id: i64) {
        self.0.borrow_mut().last_insert_id = id;
    }

    pub fn prepared(&self) -> Vec<String> {
        self.0.borrow().prepared.clone()
    }

    pub fn executions(&self) -> Vec<Execution> {
        self.0.borrow().executions.clone()
    }

    pub fn execution(&self, index: usize) -> Execution {
        self.0.borrow().executions[index].clone()
    }

    pub fn transactions(&self) -> Vec<&'static str> {
        self.0.borrow().transactions.clone()
    }
}

struct MockStatement {
    state: Rc<RefCell<MockState>>,
    sql: String,
    binds: Vec<(String, Value, ParamType)>,
    rows: Vec<Row>,
}

impl Statement for MockStatement {
    fn bind_value(&mut self, name: &str, value: &Value, param_type: ParamType) -> OrmResult<()> {
        self.binds.push((name.to_string(), value.clone(), param_type));
        Ok(())
    }

    fn execute(&mut self) -> OrmResult<()> {
        let mut state = self.state.borrow_mut();
        if self.sql.starts_with("SELECT") {
            self.rows = state.results.pop_front().unwrap_or_default();
        }
        state.executions.push(Execution {
            sql: self.sql.clone(),
            binds: std::mem::take(&mut self.binds),
        });
        Ok(())
    }

    fn fetch_all(&mut self) -> OrmResult<Vec<Row>> {
        Ok(std::mem::take(&mut self.rows))
    }
}

impl Client for MockClient {
    fn prepare(&self, sql: &str) -> OrmResult<Box<dyn Statement>> {
        self.0.borrow_mut().prepared.push(sql.to_string());
        Ok(Box::new(MockStatement {
            state: self.0.clone(),
            sql: sql.to_string(),
            binds: Vec::new(),
            rows: Vec::new(),
        }))
    }

    fn begin_transaction(&self) -> OrmResult<()> {
        self.0.borrow_mut().transactions.push("begin");
        Ok(())
    }

    fn commit(&self) -> OrmResult<()> {
        self.0.borrow_mut().transactions.push("commit");
        Ok(())
    }

    fn roll_back(&self) -> OrmResult<()> {
        self.0.borrow_mut().transactions.push("roll_back");
        Ok(())
    }

    fn last_insert_id(&self) -> OrmResult<i64> {
        Ok(self.0.borrow().last_insert_id)
    }
}

/// Build a row from `(column, value)` pairs.
pub fn row<const N: usize>(pairs: [(&str, Value); N]) -> Row {
    pairs
        .into_iter()
        .map(|(column, value)| (column.to_string(), value))
        .collect()
}

pub fn bind(name: &str, value: impl Into<Value>, param_type: ParamType) -> (String, Value, ParamType) {
    (name.to_string(), value.into(), param_type)
}

/// Route `repodb.*` events to the test output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("repodb=trace"))
        .with_test_writer()
        .try_init();
}
