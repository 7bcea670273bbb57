use super::Clause;

/// `GROUP BY` columns with an optional `HAVING` fragment list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    columns: Vec<String>,
    having: Vec<String>,
}

impl Group {
    pub fn new(columns: Vec<String>, having: Vec<String>) -> Self {
        Self { columns, having }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn having(&self) -> &[String] {
        &self.having
    }
}

impl Clause for Group {
    fn render(&self) -> String {
        if self.columns.is_empty() {
            return String::new();
        }
        let mut sql = format!(" GROUP BY {}", self.columns.join(", "));
        if !self.having.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&self.having.join(" && "));
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn renders_columns_and_having() {
        let group = Group::new(strings(&["a", "b"]), strings(&["count(*) > 1", "sum(x) < 10"]));
        assert_eq!(group.render(), " GROUP BY a, b HAVING count(*) > 1 && sum(x) < 10");
        assert_eq!(Group::new(strings(&["a"]), vec![]).render(), " GROUP BY a");
    }

    #[test]
    fn having_without_columns_renders_nothing() {
        assert_eq!(Group::new(vec![], strings(&["x > 1"])).render(), "");
    }
}
