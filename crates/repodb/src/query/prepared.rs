//! Prepared-statement slot shared by [`Query`](super::Query) and
//! [`RawQuery`](super::RawQuery).

use crate::client::{Connection, Statement};
use crate::clause::CommandType;
use crate::error::{OrmError, OrmResult};
use crate::log::log_statement;
use crate::value::{ParamType, Params, Row};
use indexmap::IndexMap;

/// Placeholder form of a parameter name (`x` and `:x` both become `:x`).
pub(crate) fn placeholder(name: &str) -> String {
    if name.starts_with(':') {
        name.to_string()
    } else {
        format!(":{name}")
    }
}

/// Lifecycle of the cached driver statement.
#[derive(Default)]
pub(crate) enum StatementSlot {
    #[default]
    Unprepared,
    Prepared {
        statement: Box<dyn Statement>,
        sql: String,
    },
}

impl StatementSlot {
    pub(crate) fn reset(&mut self) {
        *self = StatementSlot::Unprepared;
    }

    pub(crate) fn is_prepared(&self) -> bool {
        matches!(self, StatementSlot::Prepared { .. })
    }

    /// Validate `params` against `declared`, prepare (or reuse) the statement,
    /// bind, execute and optionally fetch.
    pub(crate) fn run(
        &mut self,
        connection: &Connection,
        command: Option<CommandType>,
        render: impl FnOnce() -> String,
        declared: &IndexMap<String, ParamType>,
        params: &Params,
        fetch: bool,
    ) -> OrmResult<Option<Vec<Row>>> {
        check_params(declared, params)?;

        let reused = self.is_prepared();
        if !reused {
            let sql = render();
            let statement = connection.client().prepare(&sql)?;
            *self = StatementSlot::Prepared { statement, sql };
        }
        let StatementSlot::Prepared { statement, sql } = self else {
            return Err(OrmError::Other("statement was not prepared".to_string()));
        };

        log_statement(&connection.config().sql_log, command, sql, declared.len(), reused);

        for (name, param_type) in declared {
            let name = placeholder(name);
            if let Some(value) = params
                .iter()
                .find(|(key, _)| placeholder(key) == name)
                .map(|(_, value)| value)
            {
                statement.bind_value(&name, value, *param_type)?;
            }
        }

        statement.execute()?;

        if fetch {
            Ok(Some(statement.fetch_all()?))
        } else {
            Ok(None)
        }
    }
}

/// The supplied names must match the declared names exactly.
fn check_params(declared: &IndexMap<String, ParamType>, params: &Params) -> OrmResult<()> {
    let matches = declared.len() == params.len()
        && declared.keys().all(|name| {
            let name = placeholder(name);
            params.keys().any(|key| placeholder(key) == name)
        });
    if matches {
        Ok(())
    } else {
        Err(OrmError::data("Params should be equal to declared before."))
    }
}
