use super::Clause;

/// Statement kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandType {
    Select,
    Insert,
    Update,
    Delete,
}

impl CommandType {
    /// Upper-case keyword of the command.
    pub fn as_str(self) -> &'static str {
        match self {
            CommandType::Select => "SELECT",
            CommandType::Insert => "INSERT",
            CommandType::Update => "UPDATE",
            CommandType::Delete => "DELETE",
        }
    }
}

/// The leading keyword phrase of a statement.
///
/// Only SELECT carries an item list; it defaults to `*` when empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Select(Vec<String>),
    Insert,
    Update,
    Delete,
}

impl Command {
    /// Create a SELECT command. Empty items are dropped.
    pub fn select<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Command::Select(
            items
                .into_iter()
                .map(Into::into)
                .filter(|item: &String| !item.is_empty())
                .collect(),
        )
    }

    /// Create a command of the given type with no items.
    pub fn of(command_type: CommandType) -> Self {
        match command_type {
            CommandType::Select => Command::Select(Vec::new()),
            CommandType::Insert => Command::Insert,
            CommandType::Update => Command::Update,
            CommandType::Delete => Command::Delete,
        }
    }

    /// The statement kind.
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Select(_) => CommandType::Select,
            Command::Insert => CommandType::Insert,
            Command::Update => CommandType::Update,
            Command::Delete => CommandType::Delete,
        }
    }
}

impl Clause for Command {
    fn render(&self) -> String {
        match self {
            Command::Select(items) if items.is_empty() => "SELECT * FROM".to_string(),
            Command::Select(items) => format!("SELECT {} FROM", items.join(", ")),
            Command::Insert => "INSERT INTO".to_string(),
            Command::Update => "UPDATE".to_string(),
            Command::Delete => "DELETE FROM".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_keyword_phrases() {
        assert_eq!(Command::select(["a", "b"]).render(), "SELECT a, b FROM");
        assert_eq!(Command::select(Vec::<String>::new()).render(), "SELECT * FROM");
        assert_eq!(Command::select(["", ""]).render(), "SELECT * FROM");
        assert_eq!(Command::Insert.render(), "INSERT INTO");
        assert_eq!(Command::Update.render(), "UPDATE");
        assert_eq!(Command::Delete.render(), "DELETE FROM");
    }

    #[test]
    fn command_type_roundtrip() {
        for ty in [
            CommandType::Select,
            CommandType::Insert,
            CommandType::Update,
            CommandType::Delete,
        ] {
            assert_eq!(Command::of(ty).command_type(), ty);
        }
    }
}
