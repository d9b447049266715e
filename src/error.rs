use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("validation failed for: {}", fields.join(", "))]
    Validation { fields: Vec<String> },

    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("database error: {message}")]
    Database { message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DirectoryError {
    /// Validation error for a single offending field.
    pub fn invalid_field(field: &str) -> Self {
        DirectoryError::Validation {
            fields: vec![field.to_string()],
        }
    }
}

pub type Result<T> = std::result::Result<T, DirectoryError>;
