use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Session store read/write failed
    #[error("session store: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Database operation failed
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// Image upload or deletion failed
    #[error(transparent)]
    Blob(#[from] store::BlobError),

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: &'static str, id: String },

    /// Invalid request data
    #[error("{0}")]
    BadRequest(String),

    /// Settings could not be loaded or are inconsistent
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    /// Generic internal failure
    #[error("Failed to {operation}")]
    Internal { operation: String },
}

impl Error {
    /// A message safe to show to end users.
    pub fn user_message(&self) -> String {
        match self {
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::BadRequest(message) => message.clone(),
            Error::Session(_) | Error::Database(_) | Error::Blob(_) | Error::Config(_) | Error::Internal { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}

/// Type alias for results in this crate
pub type Result<T> = std::result::Result<T, Error>;
