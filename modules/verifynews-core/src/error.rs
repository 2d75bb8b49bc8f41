//! Error taxonomy for the verification services and its user-facing messages.

use appwrite_client::AppwriteError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, VerifyNewsError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failure category, used to pick the message a reader sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotConfigured,
    Validation,
    Network,
    Unauthorized,
    InvalidCredentials,
    NotFound,
    Conflict,
    AccountExists,
    RateLimited,
    Oracle,
    Unknown,
}

impl ErrorKind {
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::NotConfigured => "Service not available. Please try again later.",
            ErrorKind::Validation => "Please check your input and try again.",
            ErrorKind::Network => "Network error. Please check your connection and try again.",
            ErrorKind::Unauthorized => "You are not authorized to perform this action.",
            ErrorKind::InvalidCredentials => "Invalid email or password.",
            ErrorKind::NotFound => "The requested verification could not be found.",
            ErrorKind::Conflict => "A record with this identifier already exists.",
            ErrorKind::AccountExists => "An account with this email already exists.",
            ErrorKind::RateLimited => "Too many requests. Please wait a moment and try again.",
            ErrorKind::Oracle => "Verification failed. Please try again.",
            ErrorKind::Unknown => "Something went wrong. Please try again.",
        }
    }
}

/// Errors from the document store or account backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("document store is not configured")]
    NotConfigured,

    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status. `kind` is its error type tag.
    #[error("rejected (status {status}): {message}")]
    Rejected {
        status: u16,
        kind: Option<String>,
        message: String,
    },

    #[error("malformed document: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn not_found(message: impl Into<String>) -> Self {
        StoreError::Rejected {
            status: 404,
            kind: Some("document_not_found".to_string()),
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Worth retrying: the request may succeed unchanged a moment later.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Network(_) => true,
            StoreError::Rejected { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotConfigured => ErrorKind::NotConfigured,
            StoreError::Network(_) => ErrorKind::Network,
            StoreError::Decode(_) => ErrorKind::Unknown,
            StoreError::Rejected { status, kind, .. } => kind
                .as_deref()
                .and_then(kind_from_type)
                .unwrap_or_else(|| kind_from_status(*status)),
        }
    }
}

/// Appwrite error `type` tags that carry more meaning than their status.
fn kind_from_type(tag: &str) -> Option<ErrorKind> {
    let kind = match tag {
        "user_already_exists" => ErrorKind::AccountExists,
        "user_invalid_credentials" => ErrorKind::InvalidCredentials,
        "general_rate_limit_exceeded" => ErrorKind::RateLimited,
        "project_unknown" | "database_not_found" | "collection_not_found" => {
            ErrorKind::NotConfigured
        }
        "document_not_found" => ErrorKind::NotFound,
        "document_already_exists" => ErrorKind::Conflict,
        "general_unauthorized_scope" | "user_unauthorized" => ErrorKind::Unauthorized,
        _ => return None,
    };
    Some(kind)
}

fn kind_from_status(status: u16) -> ErrorKind {
    match status {
        401 | 403 => ErrorKind::Unauthorized,
        404 => ErrorKind::NotFound,
        409 => ErrorKind::Conflict,
        429 => ErrorKind::RateLimited,
        _ => ErrorKind::Unknown,
    }
}

impl From<AppwriteError> for StoreError {
    fn from(err: AppwriteError) -> Self {
        match err {
            AppwriteError::Network(message) => StoreError::Network(message),
            AppwriteError::Api {
                status,
                kind,
                message,
            } => StoreError::Rejected {
                status,
                kind,
                message,
            },
            AppwriteError::Parse(message) => StoreError::Decode(message),
            AppwriteError::InvalidRequest(message) => StoreError::Rejected {
                status: 400,
                kind: None,
                message,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum VerifyNewsError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("document store error: {0}")]
    Store(#[from] StoreError),

    #[error("auth error: {0}")]
    Auth(StoreError),

    #[error("verification oracle error: {0:#}")]
    Oracle(anyhow::Error),
}

impl VerifyNewsError {
    pub fn validation(message: impl Into<String>) -> Self {
        VerifyNewsError::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            VerifyNewsError::NotConfigured(_) => ErrorKind::NotConfigured,
            VerifyNewsError::Validation(_) => ErrorKind::Validation,
            VerifyNewsError::Store(e) => e.kind(),
            VerifyNewsError::Auth(e) => match e.kind() {
                ErrorKind::Conflict => ErrorKind::AccountExists,
                ErrorKind::Unauthorized => ErrorKind::InvalidCredentials,
                other => other,
            },
            VerifyNewsError::Oracle(_) => ErrorKind::Oracle,
        }
    }

    /// Text to show a reader. Validation failures are already phrased for them.
    pub fn user_message(&self) -> String {
        match self {
            VerifyNewsError::Validation(message) => message.clone(),
            other => other.kind().user_message().to_string(),
        }
    }
}
