//! Error types for repodb

use thiserror::Error;

/// Result type alias for repodb operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for query building, execution and model mapping
#[derive(Debug, Error)]
pub enum OrmError {
    /// Repository or schema misconfiguration (missing structure, wrong ID arity).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Bad data: unparsable stored values, mismatched execution params, values
    /// that do not fit a model property.
    #[error("Data error: {0}")]
    Data(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Model in an invalid persistence state, or an accessor/binding that can
    /// not be resolved.
    #[error("Repository error: {0}")]
    Repository(String),

    /// A filter that can not be rendered into valid SQL (e.g. an empty `IN` list).
    #[error("Malformed filter: {0}")]
    MalformedFilter(String),

    /// Failure reported by the underlying database client.
    #[error("Database error: {0}")]
    Database(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a data error
    pub fn data(message: impl Into<String>) -> Self {
        Self::Data(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a repository error
    pub fn repository(message: impl Into<String>) -> Self {
        Self::Repository(message.into())
    }

    /// Create a malformed filter error
    pub fn malformed_filter(message: impl Into<String>) -> Self {
        Self::MalformedFilter(message.into())
    }

    /// Create a database (client) error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a data error
    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data(_))
    }

    /// Check if this is a repository error
    pub fn is_repository(&self) -> bool {
        matches!(self, Self::Repository(_))
    }

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this is a malformed filter error
    pub fn is_malformed_filter(&self) -> bool {
        matches!(self, Self::MalformedFilter(_))
    }
}

impl From<serde_json::Error> for OrmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Data(format!("JSON error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_match_kinds() {
        assert!(OrmError::not_found("x").is_not_found());
        assert!(OrmError::data("x").is_data());
        assert!(OrmError::repository("x").is_repository());
        assert!(OrmError::configuration("x").is_configuration());
        assert!(OrmError::malformed_filter("x").is_malformed_filter());
        assert!(!OrmError::database("x").is_data());
    }

    #[test]
    fn display_includes_kind() {
        let err = OrmError::not_found("Element not found.");
        assert_eq!(err.to_string(), "Not found: Element not found.");
    }
}
