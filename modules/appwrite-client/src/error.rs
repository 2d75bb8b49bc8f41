use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppwriteError>;

#[derive(Debug, Error)]
pub enum AppwriteError {
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response. `kind` is Appwrite's machine-readable error `type`
    /// (e.g. `document_not_found`, `user_already_exists`) when the body had one.
    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        kind: Option<String>,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl AppwriteError {
    pub fn status(&self) -> Option<u16> {
        match self {
            AppwriteError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<reqwest::Error> for AppwriteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppwriteError::Parse(err.to_string())
        } else {
            AppwriteError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppwriteError {
    fn from(err: serde_json::Error) -> Self {
        AppwriteError::Parse(err.to_string())
    }
}

impl From<url::ParseError> for AppwriteError {
    fn from(err: url::ParseError) -> Self {
        AppwriteError::InvalidRequest(err.to_string())
    }
}
