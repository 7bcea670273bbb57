//! Driver traits and the shared connection handle.

use crate::clause::{CommandType, IntoFragments};
use crate::config::ConnectionConfig;
use crate::error::OrmResult;
use crate::query::{Query, RawQuery};
use crate::value::{ParamType, Row, Value};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// A prepared statement produced by a [`Client`].
///
/// Parameter names passed to [`Statement::bind_value`] always carry the
/// leading `:` of their placeholder.
pub trait Statement {
    /// Bind one value with its declared kind.
    fn bind_value(&mut self, name: &str, value: &Value, param_type: ParamType) -> OrmResult<()>;

    /// Execute with the currently bound values.
    fn execute(&mut self) -> OrmResult<()>;

    /// Fetch every row produced by the last execution.
    fn fetch_all(&mut self) -> OrmResult<Vec<Row>>;
}

/// A database driver.
///
/// Implementations wrap a physical connection (or a test double). Errors are
/// reported as [`OrmError::Database`](crate::OrmError::Database).
pub trait Client {
    /// Prepare a statement from SQL text using `:name` placeholders.
    fn prepare(&self, sql: &str) -> OrmResult<Box<dyn Statement>>;

    fn begin_transaction(&self) -> OrmResult<()>;

    fn commit(&self) -> OrmResult<()>;

    fn roll_back(&self) -> OrmResult<()>;

    /// Identifier generated by the last INSERT, `0` when there is none.
    fn last_insert_id(&self) -> OrmResult<i64>;

    /// Escape an identifier fragment. The default implementation returns the
    /// text unchanged.
    fn escape(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Cloneable handle over a [`Client`].
///
/// Clones share the client and the transaction flag.
#[derive(Clone)]
pub struct Connection {
    client: Rc<dyn Client>,
    config: Rc<ConnectionConfig>,
    in_transaction: Rc<Cell<bool>>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("config", &self.config)
            .field("in_transaction", &self.in_transaction.get())
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Wrap a client with the default configuration.
    pub fn new(client: impl Client + 'static) -> Self {
        Self::with_config(client, ConnectionConfig::default())
    }

    /// Wrap a client with an explicit configuration.
    pub fn with_config(client: impl Client + 'static, config: ConnectionConfig) -> Self {
        Self::from_shared(Rc::new(client), config)
    }

    /// Wrap an already shared client.
    pub fn from_shared(client: Rc<dyn Client>, config: ConnectionConfig) -> Self {
        Self {
            client,
            config: Rc::new(config),
            in_transaction: Rc::new(Cell::new(false)),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub(crate) fn client(&self) -> &dyn Client {
        self.client.as_ref()
    }

    /// Start a SELECT query.
    ///
    /// A single item containing `", "` is split into separate items, so
    /// `select("a, b", ..)` and `select(["a", "b"], ..)` are equivalent.
    pub fn select(&self, items: impl IntoFragments, table: &str, alias: Option<&str>) -> Query {
        let mut items = items.into_fragments();
        if let [single] = items.as_slice() {
            items = single
                .split(", ")
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect();
        }
        Query::new(self.clone(), CommandType::Select, table, alias, items)
    }

    /// Start an INSERT query.
    pub fn insert(&self, table: &str, alias: Option<&str>) -> Query {
        Query::new(self.clone(), CommandType::Insert, table, alias, Vec::new())
    }

    /// Start an UPDATE query.
    pub fn update(&self, table: &str, alias: Option<&str>) -> Query {
        Query::new(self.clone(), CommandType::Update, table, alias, Vec::new())
    }

    /// Start a DELETE query.
    pub fn delete(&self, table: &str, alias: Option<&str>) -> Query {
        Query::new(self.clone(), CommandType::Delete, table, alias, Vec::new())
    }

    /// Wrap hand-written SQL. Rows are returned from `execute` only when
    /// `fetch_all` is set.
    pub fn raw_query(&self, sql: impl Into<String>, fetch_all: bool) -> RawQuery {
        RawQuery::new(self.clone(), sql.into(), fetch_all)
    }

    pub fn begin_transaction(&self) -> OrmResult<()> {
        self.client.begin_transaction()?;
        self.in_transaction.set(true);
        tracing::debug!(target: "repodb.connection", "transaction started");
        Ok(())
    }

    pub fn commit(&self) -> OrmResult<()> {
        if self.skip_transaction_end("commit") {
            return Ok(());
        }
        self.client.commit()?;
        self.in_transaction.set(false);
        tracing::debug!(target: "repodb.connection", "transaction committed");
        Ok(())
    }

    pub fn roll_back(&self) -> OrmResult<()> {
        if self.skip_transaction_end("roll_back") {
            return Ok(());
        }
        self.client.roll_back()?;
        self.in_transaction.set(false);
        tracing::debug!(target: "repodb.connection", "transaction rolled back");
        Ok(())
    }

    /// Returns `true` between `begin_transaction` and `commit` / `roll_back`.
    pub fn in_transaction(&self) -> bool {
        self.in_transaction.get()
    }

    pub fn last_insert_id(&self) -> OrmResult<i64> {
        self.client.last_insert_id()
    }

    /// Escape an identifier fragment through the client.
    pub fn escape(&self, text: &str) -> String {
        self.client.escape(text)
    }

    /// Escape `_`, `%` and `\` for use inside a LIKE pattern.
    pub fn escape_like(&self, text: &str) -> String {
        let mut escaped = String::with_capacity(text.len());
        for c in text.chars() {
            if matches!(c, '_' | '%' | '\\') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }

    fn skip_transaction_end(&self, operation: &'static str) -> bool {
        if self.in_transaction.get() || !self.config.lenient_transactions {
            return false;
        }
        tracing::warn!(
            target: "repodb.connection",
            operation,
            "no active transaction; ignoring"
        );
        true
    }
}
