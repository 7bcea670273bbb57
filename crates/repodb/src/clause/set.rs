use super::Clause;

/// `SET` assignments for INSERT and UPDATE.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Set {
    items: Vec<String>,
}

impl Set {
    pub fn new(items: Vec<String>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }
}

impl Clause for Set {
    fn render(&self) -> String {
        if self.items.is_empty() {
            return String::new();
        }
        format!(" SET {}", self.items.join(", "))
    }
}
