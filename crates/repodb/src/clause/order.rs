use super::Clause;
use std::fmt;
use std::str::FromStr;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ();

    /// Case-insensitive `asc` / `desc`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(Direction::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Direction::Desc)
        } else {
            Err(())
        }
    }
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderTerm {
    /// `column DIR`
    Column { column: String, direction: Direction },
    /// A literal expression rendered verbatim, e.g. `RAND()`.
    Expression(String),
}

impl OrderTerm {
    pub fn column(column: impl Into<String>, direction: Direction) -> Self {
        OrderTerm::Column {
            column: column.into(),
            direction,
        }
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self::column(column, Direction::Asc)
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self::column(column, Direction::Desc)
    }

    pub fn expression(expression: impl Into<String>) -> Self {
        OrderTerm::Expression(expression.into())
    }

    /// Parse a `(column, direction)` pair. Returns `None` for an empty column
    /// or an unrecognized direction.
    pub fn parse(column: &str, direction: &str) -> Option<Self> {
        if column.is_empty() {
            return None;
        }
        direction
            .parse::<Direction>()
            .ok()
            .map(|direction| Self::column(column, direction))
    }

    fn is_empty(&self) -> bool {
        match self {
            OrderTerm::Column { column, .. } => column.is_empty(),
            OrderTerm::Expression(expression) => expression.is_empty(),
        }
    }

    fn render(&self) -> String {
        match self {
            OrderTerm::Column { column, direction } => format!("{column} {direction}"),
            OrderTerm::Expression(expression) => expression.clone(),
        }
    }
}

/// A bare string is a positional literal expression.
impl From<&str> for OrderTerm {
    fn from(value: &str) -> Self {
        OrderTerm::Expression(value.to_string())
    }
}

impl From<String> for OrderTerm {
    fn from(value: String) -> Self {
        OrderTerm::Expression(value)
    }
}

impl<S: Into<String>> From<(S, Direction)> for OrderTerm {
    fn from((column, direction): (S, Direction)) -> Self {
        OrderTerm::column(column, direction)
    }
}

/// `ORDER BY` terms in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Order {
    terms: Vec<OrderTerm>,
}

impl Order {
    /// Build the clause. Empty columns and expressions are dropped.
    pub fn new(terms: Vec<OrderTerm>) -> Self {
        Self {
            terms: terms.into_iter().filter(|term| !term.is_empty()).collect(),
        }
    }

    pub fn terms(&self) -> &[OrderTerm] {
        &self.terms
    }
}

impl Clause for Order {
    fn render(&self) -> String {
        if self.terms.is_empty() {
            return String::new();
        }
        let terms: Vec<String> = self.terms.iter().map(OrderTerm::render).collect();
        format!(" ORDER BY {}", terms.join(", "))
    }
}
