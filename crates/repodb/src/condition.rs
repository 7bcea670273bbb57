//! AND/OR condition trees for WHERE clauses.
//!
//! A [`ConditionGroup`] is a list of [`Condition`]s joined by one
//! [`Combinator`]. Each condition is either a literal SQL fragment (using
//! `:name` placeholders for values) or a nested group, so arbitrary trees like
//! `(a = :a && (b = :b || c = :c))` can be expressed.
//!
//! Fragments are rendered verbatim. Values must travel through bound
//! parameters, never through the fragment text.
//!
//! ```ignore
//! use repodb::{all_of, any_of};
//!
//! let group = all_of(["status = :status"]).with(any_of(["role = :role1", "role = :role2"]));
//! assert_eq!(group.render(), "(status = :status && (role = :role1 || role = :role2))");
//! ```

/// How the elements of a group are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    /// The operator placed between elements.
    pub fn operator(self) -> &'static str {
        match self {
            Combinator::And => " && ",
            Combinator::Or => " || ",
        }
    }
}

/// One element of a condition group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Literal SQL fragment, e.g. `t.id = :id`.
    Fragment(String),
    /// Nested group rendered in its own parentheses.
    Group(ConditionGroup),
}

impl Condition {
    fn render(&self) -> String {
        match self {
            Condition::Fragment(sql) => sql.clone(),
            Condition::Group(group) => group.render(),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Condition::Fragment(sql) => sql.is_empty(),
            Condition::Group(group) => group.count() == 0,
        }
    }
}

impl From<&str> for Condition {
    fn from(value: &str) -> Self {
        Condition::Fragment(value.to_string())
    }
}

impl From<String> for Condition {
    fn from(value: String) -> Self {
        Condition::Fragment(value)
    }
}

impl From<&String> for Condition {
    fn from(value: &String) -> Self {
        Condition::Fragment(value.clone())
    }
}

impl From<ConditionGroup> for Condition {
    fn from(value: ConditionGroup) -> Self {
        Condition::Group(value)
    }
}

/// A list of conditions joined by a single combinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionGroup {
    combinator: Combinator,
    elements: Vec<Condition>,
}

impl ConditionGroup {
    /// Create an empty group.
    pub fn new(combinator: Combinator) -> Self {
        Self {
            combinator,
            elements: Vec::new(),
        }
    }

    /// Create an empty AND group.
    pub fn and() -> Self {
        Self::new(Combinator::And)
    }

    /// Create an empty OR group.
    pub fn or() -> Self {
        Self::new(Combinator::Or)
    }

    /// The group's combinator.
    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    /// Append an element. Empty fragments and empty groups are skipped.
    pub fn add(&mut self, condition: impl Into<Condition>) -> &mut Self {
        let condition = condition.into();
        if !condition.is_empty() {
            self.elements.push(condition);
        }
        self
    }

    /// Chainable form of [`ConditionGroup::add`].
    pub fn with(mut self, condition: impl Into<Condition>) -> Self {
        self.add(condition);
        self
    }

    /// Append every element of an iterator.
    pub fn extend<I, C>(&mut self, conditions: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Condition>,
    {
        for condition in conditions {
            self.add(condition);
        }
        self
    }

    /// Number of top-level elements.
    pub fn count(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` when the group has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Top-level elements.
    pub fn elements(&self) -> &[Condition] {
        &self.elements
    }

    /// Render the group: `""` when empty, otherwise the parenthesized elements
    /// joined by the combinator.
    pub fn render(&self) -> String {
        if self.elements.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self.elements.iter().map(Condition::render).collect();
        format!("({})", parts.join(self.combinator.operator()))
    }
}

impl Default for ConditionGroup {
    fn default() -> Self {
        Self::and()
    }
}

/// Build an AND group from a list of conditions.
pub fn all_of<I, C>(conditions: I) -> ConditionGroup
where
    I: IntoIterator<Item = C>,
    C: Into<Condition>,
{
    let mut group = ConditionGroup::and();
    group.extend(conditions);
    group
}

/// Build an OR group from a list of conditions.
pub fn any_of<I, C>(conditions: I) -> ConditionGroup
where
    I: IntoIterator<Item = C>,
    C: Into<Condition>,
{
    let mut group = ConditionGroup::or();
    group.extend(conditions);
    group
}

// Bare fragment lists become an implicit AND group.

impl From<&str> for ConditionGroup {
    fn from(value: &str) -> Self {
        all_of([value])
    }
}

impl From<String> for ConditionGroup {
    fn from(value: String) -> Self {
        all_of([value])
    }
}

impl From<Vec<&str>> for ConditionGroup {
    fn from(value: Vec<&str>) -> Self {
        all_of(value)
    }
}

impl From<Vec<String>> for ConditionGroup {
    fn from(value: Vec<String>) -> Self {
        all_of(value)
    }
}

impl From<&[&str]> for ConditionGroup {
    fn from(value: &[&str]) -> Self {
        all_of(value.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for ConditionGroup {
    fn from(value: [&str; N]) -> Self {
        all_of(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_group_renders_nothing() {
        let group = ConditionGroup::and();
        assert_eq!(group.count(), 0);
        assert_eq!(group.render(), "");
        assert_eq!(any_of(Vec::<String>::new()).render(), "");
    }

    #[test]
    fn single_fragment_is_parenthesized() {
        assert_eq!(all_of(["x = :x"]).render(), "(x = :x)");
    }

    #[test]
    fn and_group_joins_with_double_ampersand() {
        let group = all_of(["aa = :aa", "bb = :bb"]);
        assert_eq!(group.count(), 2);
        assert_eq!(group.render(), "(aa = :aa && bb = :bb)");
    }

    #[test]
    fn or_group_joins_with_double_pipe() {
        assert_eq!(any_of(["a = :a", "b = :b"]).render(), "(a = :a || b = :b)");
    }

    #[test]
    fn nested_groups_render_recursively() {
        let group = all_of(["status = :status"])
            .with(any_of(["role = :role1", "role = :role2"]))
            .with(all_of(["x = 1"]).with(any_of(["y = 2", "z = 3"])));
        assert_eq!(
            group.render(),
            "(status = :status && (role = :role1 || role = :role2) && (x = 1 && (y = 2 || z = 3)))"
        );
        assert_eq!(group.count(), 3);
    }

    #[test]
    fn empty_fragments_and_groups_are_skipped() {
        let mut group = ConditionGroup::or();
        group.add("").add(ConditionGroup::and()).add("a = :a");
        assert_eq!(group.count(), 1);
        assert_eq!(group.render(), "(a = :a)");
    }

    #[test]
    fn non_empty_render_is_always_wrapped() {
        for group in [
            all_of(["a"]),
            any_of(["a", "b"]),
            all_of(["a"]).with(any_of(["b"])),
        ] {
            let sql = group.render();
            assert!(sql.starts_with('('), "{sql}");
            assert!(sql.ends_with(')'), "{sql}");
        }
    }

    #[test]
    fn fragment_lists_convert_to_and_groups() {
        let group: ConditionGroup = vec!["a = :a", "b = :b"].into();
        assert_eq!(group.combinator(), Combinator::And);
        assert_eq!(group.render(), "(a = :a && b = :b)");
        let group: ConditionGroup = "c = :c".into();
        assert_eq!(group.render(), "(c = :c)");
    }
}
