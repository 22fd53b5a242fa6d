use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum BackendError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Malformed document {path}: {reason}")]
    Malformed { path: String, reason: String },

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Invalid document path: {0}")]
    InvalidPath(String),
}

impl BackendError {
    pub(crate) fn malformed(collection: &str, id: &str, reason: impl ToString) -> Self {
        Self::Malformed {
            path: format!("{collection}/{id}"),
            reason: reason.to_string(),
        }
    }
}
