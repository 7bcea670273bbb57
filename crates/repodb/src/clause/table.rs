use super::Clause;

/// Role of a table reference within a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    /// The statement's main table (`FROM t`, `UPDATE t`, ...).
    Main,
    /// `INNER JOIN`
    Join,
    /// `LEFT OUTER JOIN`
    LeftJoin,
    /// `RIGHT OUTER JOIN`
    RightJoin,
    /// `FULL OUTER JOIN`
    OuterJoin,
}

impl JoinType {
    fn keywords(self) -> Option<&'static str> {
        match self {
            JoinType::Main => None,
            JoinType::Join => Some("INNER JOIN"),
            JoinType::LeftJoin => Some("LEFT OUTER JOIN"),
            JoinType::RightJoin => Some("RIGHT OUTER JOIN"),
            JoinType::OuterJoin => Some("FULL OUTER JOIN"),
        }
    }
}

/// A table reference: the main table or one join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    join_type: JoinType,
    name: String,
    alias: Option<String>,
    condition: Vec<String>,
}

impl TableRef {
    /// The statement's main table.
    pub fn main(name: impl Into<String>, alias: Option<&str>) -> Self {
        Self::new(JoinType::Main, name, alias, Vec::new())
    }

    /// A table reference of any type. Join conditions are ignored for the main table.
    pub fn new(
        join_type: JoinType,
        name: impl Into<String>,
        alias: Option<&str>,
        condition: Vec<String>,
    ) -> Self {
        let name = name.into();
        // An alias identical to the table name adds nothing.
        let alias = alias
            .filter(|alias| !alias.is_empty() && *alias != name)
            .map(str::to_string);
        Self {
            join_type,
            name,
            alias,
            condition,
        }
    }

    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    pub fn is_main(&self) -> bool {
        self.join_type == JoinType::Main
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }
}

impl Clause for TableRef {
    fn render(&self) -> String {
        let mut statement = self.name.clone();
        if let Some(alias) = &self.alias {
            statement.push(' ');
            statement.push_str(alias);
        }

        let Some(keywords) = self.join_type.keywords() else {
            return format!(" {statement}");
        };

        match self.condition.as_slice() {
            [] => {}
            [column] if !column.contains('=') => {
                statement.push_str(" USING(");
                statement.push_str(column);
                statement.push(')');
            }
            conditions => {
                statement.push_str(" ON ");
                statement.push_str(&conditions.join(" && "));
            }
        }

        format!(" {keywords} {statement}")
    }
}
