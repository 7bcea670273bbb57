//! # repodb
//!
//! A fluent SQL query builder and a relation-aware repository layer.
//!
//! ## Features
//!
//! - **Fluent queries**: SELECT / INSERT / UPDATE / DELETE with joins, nested
//!   AND/OR conditions, GROUP BY / HAVING, ORDER BY and LIMIT
//! - **Named parameters**: values always travel as `:name` placeholders with a
//!   declared kind; executing with undeclared names is rejected
//! - **Statement reuse**: a query is prepared once and re-executed with new values
//! - **Repositories**: field mapping, type conversion, filtering, pagination
//!   and persistence state for any model type
//! - **Relations**: multi-table SELECTs that decode every joined row once and
//!   bind related records together
//! - **Driver-agnostic**: plug any database through the [`Client`] trait
//!
//! ## Query builder
//!
//! ```ignore
//! use repodb::{Connection, ParamType, Params, Value};
//!
//! let conn = Connection::new(my_client);
//!
//! let mut query = conn.select(["u.id", "u.name"], "users", Some("u"));
//! query
//!     .left_join("roles", Some("r"), "r.id = u.role_id")
//!     .where_(Query::all_of(["u.active = :active"]).with(Query::any_of(["r.name = :r1", "r.name = :r2"])))
//!     .order_by([("u.name", Direction::Asc)])
//!     .limit(10, Some(0))
//!     .bind_param(":active", ParamType::Bool)
//!     .bind_param(":r1", ParamType::String)
//!     .bind_param(":r2", ParamType::String);
//!
//! let mut params = Params::new();
//! params.insert(":active".into(), Value::Bool(true));
//! params.insert(":r1".into(), "admin".into());
//! params.insert(":r2".into(), "editor".into());
//! let rows = query.fetch_all(&params)?;
//! ```
//!
//! ## Repositories
//!
//! ```ignore
//! use repodb::{Field, Filter, Repository, Table};
//!
//! #[derive(Default)]
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! let table = Table::new("users")
//!     .with_field(Field::int("id").id().auto_increment().accessor(|u: &User| u.id, |u, v| u.id = v))
//!     .with_field(Field::string("name").accessor(|u: &User| u.name.clone(), |u, v| u.name = v));
//! let users = Repository::new(conn.clone(), table);
//!
//! let alice = users.get_by_id_or_404([1_i64])?;
//! alice.borrow_mut().name = "Alice".into();
//! users.save(&alice)?;
//!
//! let active = users.get_by(&Filter::new().in_list("id", [1_i64, 2, 3]), &[("name", "ASC")], Some(10), 0)?;
//! ```

pub mod clause;
pub mod client;
pub mod condition;
pub mod config;
pub mod error;
mod log;
pub mod pagination;
pub mod query;
pub mod record;
pub mod repository;
pub mod structure;
pub mod value;

pub use clause::{CommandType, Direction, JoinType, OrderTerm};
pub use client::{Client, Connection, Statement};
pub use condition::{Combinator, Condition, ConditionGroup, all_of, any_of};
pub use config::{ConnectionConfig, SqlLogConfig};
pub use error::{OrmError, OrmResult};
pub use pagination::{Page, PageRequest};
pub use query::{Query, RawQuery};
pub use record::{AnyRecord, PersistState, Record, WeakRecord};
pub use repository::{Bindings, Filter, FilterValue, ModelsRelationsQuery, Repository};
pub use structure::{
    DATE_TIME_FORMAT, Field, FieldOptions, FieldType, FieldValue, FromFieldValue, IntoFieldValue,
    Table,
};
pub use value::{ParamType, Params, Row, Value};
