use super::prepared::StatementSlot;
use crate::client::Connection;
use crate::error::OrmResult;
use crate::value::{ParamType, Params, Row};
use indexmap::IndexMap;
use std::fmt;

/// Hand-written SQL with declared parameters.
///
/// Shares the parameter guard and statement caching of [`Query`](super::Query).
pub struct RawQuery {
    connection: Connection,
    sql: String,
    fetch_all: bool,
    params: IndexMap<String, ParamType>,
    statement: StatementSlot,
}

impl RawQuery {
    pub(crate) fn new(connection: Connection, sql: String, fetch_all: bool) -> Self {
        Self {
            connection,
            sql,
            fetch_all,
            params: IndexMap::new(),
            statement: StatementSlot::Unprepared,
        }
    }

    /// Declare a bound parameter and its kind.
    pub fn bind_param(&mut self, name: impl Into<String>, param_type: ParamType) -> &mut Self {
        self.statement.reset();
        self.params.insert(name.into(), param_type);
        self
    }

    /// Declare several parameters at once.
    pub fn bind_params<I, S>(&mut self, params: I) -> &mut Self
    where
        I: IntoIterator<Item = (S, ParamType)>,
        S: Into<String>,
    {
        self.statement.reset();
        for (name, param_type) in params {
            self.params.insert(name.into(), param_type);
        }
        self
    }

    pub fn params(&self) -> &IndexMap<String, ParamType> {
        &self.params
    }

    pub fn is_prepared(&self) -> bool {
        self.statement.is_prepared()
    }

    pub fn to_sql(&self) -> &str {
        &self.sql
    }

    /// Execute with `params`; rows are returned only for fetching queries.
    pub fn execute(&mut self, params: &Params) -> OrmResult<Option<Vec<Row>>> {
        let sql = &self.sql;
        self.statement.run(
            &self.connection,
            None,
            || sql.clone(),
            &self.params,
            params,
            self.fetch_all,
        )
    }
}

impl fmt::Display for RawQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

impl fmt::Debug for RawQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawQuery")
            .field("sql", &self.sql)
            .field("fetch_all", &self.fetch_all)
            .field("params", &self.params)
            .finish()
    }
}
