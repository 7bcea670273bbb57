use super::Clause;
use crate::condition::ConditionGroup;

/// `WHERE` clause over a condition tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Where {
    condition: ConditionGroup,
}

impl Where {
    pub fn new(condition: ConditionGroup) -> Self {
        Self { condition }
    }

    pub fn condition(&self) -> &ConditionGroup {
        &self.condition
    }
}

impl Clause for Where {
    fn render(&self) -> String {
        if self.condition.is_empty() {
            return String::new();
        }
        format!(" WHERE {}", self.condition.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{all_of, any_of};

    #[test]
    fn renders_condition_tree() {
        let clause = Where::new(all_of(["a = :a"]).with(any_of(["b = :b", "c = :c"])));
        assert_eq!(clause.render(), " WHERE (a = :a && (b = :b || c = :c))");
    }

    #[test]
    fn empty_condition_renders_nothing() {
        assert_eq!(Where::default().render(), "");
    }
}
