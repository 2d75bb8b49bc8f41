pub mod alerts;
pub mod auth;
pub mod error;
pub mod oracle;
pub mod retry;
pub mod service;
pub mod stats;
pub mod store;
pub mod testing;
pub mod verifier;

pub use alerts::{Severity, TrendingAlert, TrendingFeed};
pub use auth::{signup_with_form, AppwriteAuth, AuthProvider, OAuthProvider, SignupForm, UserAccount};
pub use error::{ErrorKind, Result, StoreError, VerifyNewsError};
pub use oracle::{ClaimInput, GeminiOracle, VeracityOracle};
pub use retry::{retry_operation, RetryPolicy};
pub use service::VerificationService;
pub use stats::DashboardStats;
pub use store::DocumentStore;
pub use verifier::{Submission, SubmittedVerification, Verifier};
