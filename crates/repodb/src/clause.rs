//! SQL clause renderers.
//!
//! Each clause owns one piece of a statement and renders itself to a string
//! fragment carrying its own leading space (or nothing at all when empty), so a
//! [`Query`](crate::Query) can simply concatenate them in a fixed order.

mod command;
mod group;
mod limit;
mod order;
mod set;
mod table;
mod where_clause;

pub use command::{Command, CommandType};
pub use group::Group;
pub use limit::Limit;
pub use order::{Direction, Order, OrderTerm};
pub use set::Set;
pub use table::{JoinType, TableRef};
pub use where_clause::Where;

/// A renderable SQL clause.
pub trait Clause {
    /// Render the clause fragment.
    fn render(&self) -> String;
}

/// Conversion into a list of non-empty SQL fragments.
///
/// Used by every builder method that takes "one fragment or a list of
/// fragments" (join conditions, SET items, GROUP BY columns, ...).
pub trait IntoFragments {
    fn into_fragments(self) -> Vec<String>;
}

fn non_empty<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values
        .into_iter()
        .map(Into::into)
        .filter(|s| !s.is_empty())
        .collect()
}

impl IntoFragments for &str {
    fn into_fragments(self) -> Vec<String> {
        non_empty([self])
    }
}

impl IntoFragments for String {
    fn into_fragments(self) -> Vec<String> {
        non_empty([self])
    }
}

impl IntoFragments for Vec<String> {
    fn into_fragments(self) -> Vec<String> {
        non_empty(self)
    }
}

impl IntoFragments for Vec<&str> {
    fn into_fragments(self) -> Vec<String> {
        non_empty(self)
    }
}

impl IntoFragments for &[&str] {
    fn into_fragments(self) -> Vec<String> {
        non_empty(self.iter().copied())
    }
}

impl IntoFragments for &[String] {
    fn into_fragments(self) -> Vec<String> {
        non_empty(self.iter().cloned())
    }
}

impl<const N: usize> IntoFragments for [&str; N] {
    fn into_fragments(self) -> Vec<String> {
        non_empty(self)
    }
}

impl<const N: usize> IntoFragments for [String; N] {
    fn into_fragments(self) -> Vec<String> {
        non_empty(self)
    }
}
