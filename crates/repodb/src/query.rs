//! Fluent SQL statement builder.
//!
//! A [`Query`] is created through a [`Connection`] and assembled in place:
//!
//! ```ignore
//! let mut query = conn.select("*", "products", Some("pd"));
//! query
//!     .left_join("producers", Some("pr"), "pr.id = pd.producer_id")
//!     .where_(["pd.active = :active"])
//!     .order_by([OrderTerm::desc("pd.created_at")])
//!     .limit(10, Some(20))
//!     .bind_param(":active", ParamType::Bool);
//!
//! let rows = query.execute(&params)?;
//! ```
//!
//! The driver statement is prepared lazily on the first `execute` and reused
//! until one of the builder methods changes the rendered SQL.

mod prepared;
mod raw;

#[cfg(test)]
mod tests;

pub use crate::clause::CommandType;
pub use raw::RawQuery;

use crate::clause::{
    Clause, Command, Group, IntoFragments, JoinType, Limit, Order, OrderTerm, Set, TableRef,
    Where,
};
use crate::client::Connection;
use crate::condition::{self, Condition, ConditionGroup};
use crate::error::OrmResult;
use crate::value::{ParamType, Params, Row};
use indexmap::IndexMap;
use prepared::StatementSlot;
use std::fmt;

/// Clause state of a query, rendered in a fixed order.
#[derive(Debug, Clone)]
struct Parts {
    command: Command,
    tables: Vec<TableRef>,
    set: Option<Set>,
    where_: Option<Where>,
    group: Option<Group>,
    order: Option<Order>,
    limit: Option<Limit>,
}

impl Parts {
    fn render(&self) -> String {
        let command_type = self.command.command_type();
        let is_select = command_type == CommandType::Select;
        let writes_set = matches!(command_type, CommandType::Insert | CommandType::Update);

        let mut sql = self.command.render();
        for table in &self.tables {
            if is_select || table.is_main() {
                sql.push_str(&table.render());
            }
        }
        if writes_set {
            push_clause(&mut sql, self.set.as_ref());
        }
        if command_type != CommandType::Insert {
            push_clause(&mut sql, self.where_.as_ref());
        }
        if is_select {
            push_clause(&mut sql, self.group.as_ref());
            push_clause(&mut sql, self.order.as_ref());
            push_clause(&mut sql, self.limit.as_ref());
        }
        sql
    }
}

fn push_clause(sql: &mut String, clause: Option<&impl Clause>) {
    if let Some(clause) = clause {
        sql.push_str(&clause.render());
    }
}

/// A SELECT, INSERT, UPDATE or DELETE statement under construction.
pub struct Query {
    connection: Connection,
    parts: Parts,
    params: IndexMap<String, ParamType>,
    statement: StatementSlot,
}

impl Query {
    pub(crate) fn new(
        connection: Connection,
        command_type: CommandType,
        table: &str,
        alias: Option<&str>,
        items: Vec<String>,
    ) -> Self {
        let command = match command_type {
            CommandType::Select => Command::select(items),
            other => Command::of(other),
        };
        Self {
            connection,
            parts: Parts {
                command,
                tables: vec![TableRef::main(table, alias)],
                set: None,
                where_: None,
                group: None,
                order: None,
                limit: None,
            },
            params: IndexMap::new(),
            statement: StatementSlot::Unprepared,
        }
    }

    /// Build an AND group.
    pub fn all_of<I, C>(conditions: I) -> ConditionGroup
    where
        I: IntoIterator<Item = C>,
        C: Into<Condition>,
    {
        condition::all_of(conditions)
    }

    /// Build an OR group.
    pub fn any_of<I, C>(conditions: I) -> ConditionGroup
    where
        I: IntoIterator<Item = C>,
        C: Into<Condition>,
    {
        condition::any_of(conditions)
    }

    fn add_table(
        &mut self,
        join_type: JoinType,
        table: &str,
        alias: Option<&str>,
        condition: impl IntoFragments,
    ) -> &mut Self {
        self.statement.reset();
        self.parts
            .tables
            .push(TableRef::new(join_type, table, alias, condition.into_fragments()));
        self
    }

    /// `INNER JOIN`
    pub fn join(&mut self, table: &str, alias: Option<&str>, condition: impl IntoFragments) -> &mut Self {
        self.add_table(JoinType::Join, table, alias, condition)
    }

    /// `LEFT OUTER JOIN`
    pub fn left_join(
        &mut self,
        table: &str,
        alias: Option<&str>,
        condition: impl IntoFragments,
    ) -> &mut Self {
        self.add_table(JoinType::LeftJoin, table, alias, condition)
    }

    /// `RIGHT OUTER JOIN`
    pub fn right_join(
        &mut self,
        table: &str,
        alias: Option<&str>,
        condition: impl IntoFragments,
    ) -> &mut Self {
        self.add_table(JoinType::RightJoin, table, alias, condition)
    }

    /// `FULL OUTER JOIN`
    pub fn outer_join(
        &mut self,
        table: &str,
        alias: Option<&str>,
        condition: impl IntoFragments,
    ) -> &mut Self {
        self.add_table(JoinType::OuterJoin, table, alias, condition)
    }

    /// Join of any type; used when the type is only known at runtime.
    pub fn join_as(
        &mut self,
        join_type: JoinType,
        table: &str,
        alias: Option<&str>,
        condition: impl IntoFragments,
    ) -> &mut Self {
        self.add_table(join_type, table, alias, condition)
    }

    /// Replace the SET assignments (INSERT / UPDATE only).
    pub fn set(&mut self, items: impl IntoFragments) -> &mut Self {
        self.statement.reset();
        self.parts.set = Some(Set::new(items.into_fragments()));
        self
    }

    /// Replace the WHERE condition. Fragment lists become an AND group.
    pub fn where_(&mut self, condition: impl Into<ConditionGroup>) -> &mut Self {
        self.statement.reset();
        self.parts.where_ = Some(Where::new(condition.into()));
        self
    }

    /// Replace the GROUP BY columns.
    pub fn group_by(&mut self, columns: impl IntoFragments) -> &mut Self {
        self.group_by_having(columns, Vec::<String>::new())
    }

    /// Replace the GROUP BY columns and HAVING fragments.
    pub fn group_by_having(
        &mut self,
        columns: impl IntoFragments,
        having: impl IntoFragments,
    ) -> &mut Self {
        self.statement.reset();
        self.parts.group = Some(Group::new(
            columns.into_fragments(),
            having.into_fragments(),
        ));
        self
    }

    /// Replace the ORDER BY terms.
    ///
    /// Bare strings are literal expressions; use [`OrderTerm::asc`] /
    /// [`OrderTerm::desc`] or `(column, Direction)` tuples for columns.
    pub fn order_by<I, T>(&mut self, terms: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OrderTerm>,
    {
        self.statement.reset();
        self.parts.order = Some(Order::new(terms.into_iter().map(Into::into).collect()));
        self
    }

    /// Replace the LIMIT.
    pub fn limit(&mut self, limit: u64, offset: Option<u64>) -> &mut Self {
        self.statement.reset();
        self.parts.limit = Some(Limit::new(limit, offset));
        self
    }

    /// Remove the LIMIT.
    pub fn clear_limit(&mut self) -> &mut Self {
        self.statement.reset();
        self.parts.limit = None;
        self
    }

    /// Declare a bound parameter and its kind.
    pub fn bind_param(&mut self, name: impl Into<String>, param_type: ParamType) -> &mut Self {
        self.statement.reset();
        self.params.insert(name.into(), param_type);
        self
    }

    /// Statement kind.
    pub fn command_type(&self) -> CommandType {
        self.parts.command.command_type()
    }

    /// Declared parameters in declaration order.
    pub fn params(&self) -> &IndexMap<String, ParamType> {
        &self.params
    }

    /// Returns `true` while a prepared statement is cached.
    pub fn is_prepared(&self) -> bool {
        self.statement.is_prepared()
    }

    /// Render the statement.
    pub fn to_sql(&self) -> String {
        self.parts.render()
    }

    /// Execute with `params`, whose names must equal the declared ones.
    ///
    /// Returns `Some(rows)` for SELECT and `None` for every other command.
    pub fn execute(&mut self, params: &Params) -> OrmResult<Option<Vec<Row>>> {
        let command = self.command_type();
        let parts = &self.parts;
        self.statement.run(
            &self.connection,
            Some(command),
            || parts.render(),
            &self.params,
            params,
            command == CommandType::Select,
        )
    }

    /// Execute and return the rows (empty for non-SELECT statements).
    pub fn fetch_all(&mut self, params: &Params) -> OrmResult<Vec<Row>> {
        Ok(self.execute(params)?.unwrap_or_default())
    }

    /// A SELECT with the same tables, clauses and declared parameters but a
    /// new item list. The copy owns its own clause state and has no prepared
    /// statement.
    pub fn clone_select(&self, items: impl IntoFragments) -> Query {
        let mut parts = self.parts.clone();
        parts.command = Command::select(items.into_fragments());
        Query {
            connection: self.connection.clone(),
            parts,
            params: self.params.clone(),
            statement: StatementSlot::Unprepared,
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("sql", &self.to_sql())
            .field("params", &self.params)
            .field("prepared", &self.is_prepared())
            .finish()
    }
}
