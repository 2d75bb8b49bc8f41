use anyhow::Result;

pub const DEFAULT_APPWRITE_ENDPOINT: &str = "https://cloud.appwrite.io/v1";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Application configuration loaded from environment variables.
///
/// Missing backend settings do not fail loading: the affected service
/// reports itself as not configured and refuses work instead.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    // Appwrite
    pub appwrite_endpoint: String,
    pub appwrite_project_id: Option<String>,
    pub appwrite_api_key: Option<String>,
    pub database_id: Option<String>,
    pub collection_id: Option<String>,

    // AI
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,

    // OAuth redirects
    pub oauth_success_url: String,
    pub oauth_failure_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok());
        config.log_keys();
        Ok(config)
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            appwrite_endpoint: get("APPWRITE_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_APPWRITE_ENDPOINT.to_string()),
            appwrite_project_id: get("APPWRITE_PROJECT_ID"),
            appwrite_api_key: get("APPWRITE_API_KEY"),
            database_id: get("APPWRITE_DATABASE_ID"),
            collection_id: get("APPWRITE_COLLECTION_ID"),
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            oauth_success_url: get("VERIFYNEWS_OAUTH_SUCCESS_URL")
                .unwrap_or_else(|| "http://localhost:3000/dashboard".to_string()),
            oauth_failure_url: get("VERIFYNEWS_OAUTH_FAILURE_URL")
                .unwrap_or_else(|| "http://localhost:3000/login".to_string()),
        }
    }

    /// Endpoint, project, database and collection are all present.
    pub fn is_store_configured(&self) -> bool {
        !self.appwrite_endpoint.is_empty()
            && self.appwrite_project_id.is_some()
            && self.database_id.is_some()
            && self.collection_id.is_some()
    }

    pub fn is_oracle_configured(&self) -> bool {
        self.gemini_api_key.is_some()
    }

    fn log_keys(&self) {
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) => preview(v),
                None => "<not set>".to_string(),
            }
        }
        fn plain_opt(val: &Option<String>) -> &str {
            val.as_deref().unwrap_or("<not set>")
        }

        tracing::info!("Config loaded:");
        tracing::info!("  APPWRITE_ENDPOINT: {}", self.appwrite_endpoint);
        tracing::info!("  APPWRITE_PROJECT_ID: {}", plain_opt(&self.appwrite_project_id));
        tracing::info!("  APPWRITE_API_KEY: {}", preview_opt(&self.appwrite_api_key));
        tracing::info!("  APPWRITE_DATABASE_ID: {}", plain_opt(&self.database_id));
        tracing::info!("  APPWRITE_COLLECTION_ID: {}", plain_opt(&self.collection_id));
        tracing::info!("  GEMINI_API_KEY: {}", preview_opt(&self.gemini_api_key));
        tracing::info!("  GEMINI_MODEL: {}", self.gemini_model);
    }
}

/// First five characters of a secret plus its length, safe for logs.
fn preview(val: &str) -> String {
    let head: String = val.chars().take(5).collect();
    format!("{}...({} chars)", head, val.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config.appwrite_endpoint, DEFAULT_APPWRITE_ENDPOINT);
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
        assert!(!config.is_store_configured());
        assert!(!config.is_oracle_configured());
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = AppConfig::from_lookup(lookup(&[
            ("APPWRITE_PROJECT_ID", "proj"),
            ("APPWRITE_DATABASE_ID", "  "),
            ("APPWRITE_COLLECTION_ID", "verifications"),
        ]));
        assert_eq!(config.database_id, None);
        assert!(!config.is_store_configured());
    }

    #[test]
    fn complete_store_settings_are_configured() {
        let config = AppConfig::from_lookup(lookup(&[
            ("APPWRITE_ENDPOINT", "https://appwrite.example.com/v1"),
            ("APPWRITE_PROJECT_ID", "proj"),
            ("APPWRITE_DATABASE_ID", "main"),
            ("APPWRITE_COLLECTION_ID", "verifications"),
            ("GEMINI_API_KEY", "key"),
        ]));
        assert!(config.is_store_configured());
        assert!(config.is_oracle_configured());
        assert_eq!(config.appwrite_endpoint, "https://appwrite.example.com/v1");
    }

    #[test]
    fn preview_shows_five_chars_and_length() {
        assert_eq!(preview("AIzaSyExample"), "AIzaS...(13 chars)");
        assert_eq!(preview("ab"), "ab...(2 chars)");
    }

    #[test]
    fn preview_handles_multibyte_secrets() {
        assert_eq!(preview("ключ-секрет"), "ключ-...(11 chars)");
        assert_eq!(preview("é"), "é...(1 chars)");
    }
}
