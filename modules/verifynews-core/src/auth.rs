//! Account signup and social login, delegated to an auth provider.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::Serialize;

use appwrite_client::{AppwriteClient, DocumentId};
use verifynews_common::AppConfig;

use crate::error::{Result, StoreError, VerifyNewsError};

/// Social login providers offered on the login page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Github,
    Facebook,
    Apple,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Github => "github",
            OAuthProvider::Facebook => "facebook",
            OAuthProvider::Apple => "apple",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" => Ok(OAuthProvider::Google),
            "github" => Ok(OAuthProvider::Github),
            "facebook" => Ok(OAuthProvider::Facebook),
            "apple" => Ok(OAuthProvider::Apple),
            other => Err(format!("unsupported login provider: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAccount {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Fields of the signup form, checked before anything is sent.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    pub const MIN_PASSWORD_LEN: usize = 6;

    pub fn validate(&self) -> Result<()> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(VerifyNewsError::validation("Email is required"));
        }
        if !looks_like_email(email) {
            return Err(VerifyNewsError::validation("Please enter a valid email address"));
        }
        if self.password.is_empty() {
            return Err(VerifyNewsError::validation("Password is required"));
        }
        if self.password.chars().count() < Self::MIN_PASSWORD_LEN {
            return Err(VerifyNewsError::validation(format!(
                "Password must be at least {} characters",
                Self::MIN_PASSWORD_LEN
            )));
        }
        if self.password != self.confirm_password {
            return Err(VerifyNewsError::validation("Passwords do not match"));
        }
        Ok(())
    }
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn signup(&self, email: &str, password: &str, name: Option<&str>) -> Result<UserAccount>;

    /// URL to send the browser to for `provider`'s login flow.
    fn social_login(&self, provider: OAuthProvider) -> Result<String>;
}

/// Validate `form`, then create the account with `auth`.
pub async fn signup_with_form(auth: &dyn AuthProvider, form: &SignupForm) -> Result<UserAccount> {
    form.validate()?;
    if !auth.is_configured() {
        return Err(VerifyNewsError::NotConfigured("authentication"));
    }

    let name = Some(form.name.trim()).filter(|n| !n.is_empty());
    auth.signup(form.email.trim(), &form.password, name).await
}

/// [`AuthProvider`] over the Appwrite account API.
pub struct AppwriteAuth {
    client: AppwriteClient,
    success_url: String,
    failure_url: String,
}

impl AppwriteAuth {
    pub fn new(client: AppwriteClient, success_url: impl Into<String>, failure_url: impl Into<String>) -> Self {
        Self {
            client,
            success_url: success_url.into(),
            failure_url: failure_url.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let client = AppwriteClient::new(
            config.appwrite_endpoint.clone(),
            config.appwrite_project_id.clone().unwrap_or_default(),
        );
        Self::new(client, config.oauth_success_url.clone(), config.oauth_failure_url.clone())
    }
}

#[async_trait]
impl AuthProvider for AppwriteAuth {
    fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    async fn signup(&self, email: &str, password: &str, name: Option<&str>) -> Result<UserAccount> {
        let account = self
            .client
            .create_account(&DocumentId::Unique, email, password, name)
            .await
            .map_err(|e| VerifyNewsError::Auth(StoreError::from(e)))?;

        tracing::info!(user_id = %account.id, "Account created");
        Ok(UserAccount {
            id: account.id,
            name: account.name,
            email: account.email,
        })
    }

    fn social_login(&self, provider: OAuthProvider) -> Result<String> {
        if !self.is_configured() {
            return Err(VerifyNewsError::NotConfigured("authentication"));
        }
        self.client
            .oauth2_session_url(provider.as_str(), &self.success_url, &self.failure_url)
            .map_err(|e| VerifyNewsError::Auth(StoreError::from(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::MockAuth;

    fn form(email: &str, password: &str, confirm: &str) -> SignupForm {
        SignupForm {
            name: "Ada".into(),
            email: email.into(),
            password: password.into(),
            confirm_password: confirm.into(),
        }
    }

    fn message(form: &SignupForm) -> String {
        form.validate().unwrap_err().user_message()
    }

    #[test]
    fn rejects_missing_or_malformed_email() {
        assert_eq!(message(&form("", "secret1", "secret1")), "Email is required");
        assert_eq!(
            message(&form("ada.example.com", "secret1", "secret1")),
            "Please enter a valid email address"
        );
        assert_eq!(
            message(&form("ada@localhost", "secret1", "secret1")),
            "Please enter a valid email address"
        );
    }

    #[test]
    fn password_must_be_six_chars() {
        assert_eq!(
            message(&form("ada@example.com", "12345", "12345")),
            "Password must be at least 6 characters"
        );
        assert!(form("ada@example.com", "123456", "123456").validate().is_ok());
    }

    #[test]
    fn confirmation_must_match() {
        assert_eq!(
            message(&form("ada@example.com", "secret1", "secret2")),
            "Passwords do not match"
        );
    }

    #[test]
    fn provider_names_round_trip() {
        for p in [
            OAuthProvider::Google,
            OAuthProvider::Github,
            OAuthProvider::Facebook,
            OAuthProvider::Apple,
        ] {
            assert_eq!(p.as_str().parse::<OAuthProvider>().unwrap(), p);
        }
        assert!("myspace".parse::<OAuthProvider>().is_err());
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_provider() {
        let auth = MockAuth::new();
        let err = signup_with_form(&auth, &form("ada@example.com", "123", "123"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(auth.signups().is_empty());
    }

    #[tokio::test]
    async fn taken_email_maps_to_friendly_message() {
        let auth = MockAuth::new().with_taken_email("ada@example.com");
        let err = signup_with_form(&auth, &form(" ada@example.com ", "secret1", "secret1"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "An account with this email already exists.");
        assert_eq!(
            auth.signups(),
            vec![("ada@example.com".to_string(), Some("Ada".to_string()))]
        );
    }

    #[test]
    fn unconfigured_appwrite_refuses_social_login() {
        let auth = AppwriteAuth::new(AppwriteClient::new("https://cloud.appwrite.io/v1", ""), "ok", "fail");
        let err = auth.social_login(OAuthProvider::Google).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotConfigured);
    }

    #[test]
    fn appwrite_social_login_builds_redirect() {
        let auth = AppwriteAuth::new(
            AppwriteClient::new("https://cloud.appwrite.io/v1", "proj"),
            "https://app.test/dashboard",
            "https://app.test/login",
        );
        let url = auth.social_login(OAuthProvider::Github).unwrap();
        assert!(url.contains("/account/sessions/oauth2/github?"));
        assert!(url.contains("project=proj"));
    }
}
