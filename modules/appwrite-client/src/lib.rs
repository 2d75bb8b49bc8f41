pub mod error;
pub mod types;

pub use error::{AppwriteError, Result};
pub use types::{Account, Document, DocumentId, DocumentList, Query};

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use types::{CreateAccountBody, CreateDocumentBody, ErrorBody, UpdateDocumentBody};

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const KEY_HEADER: &str = "X-Appwrite-Key";
const RESPONSE_FORMAT_HEADER: &str = "X-Appwrite-Response-Format";

/// Response format the request/response types in this crate are written against.
const RESPONSE_FORMAT: &str = "1.5.0";

#[derive(Clone)]
pub struct AppwriteClient {
    client: reqwest::Client,
    endpoint: String,
    project_id: String,
    api_key: Option<String>,
}

impl AppwriteClient {
    /// `endpoint` is the API root, e.g. `https://cloud.appwrite.io/v1`.
    pub fn new(endpoint: impl Into<String>, project_id: impl Into<String>) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            api_key: None,
        }
    }

    /// Authenticate as a server-side API key instead of an anonymous client.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.endpoint.is_empty() && !self.project_id.is_empty()
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let req = req
            .header(PROJECT_HEADER, &self.project_id)
            .header(RESPONSE_FORMAT_HEADER, RESPONSE_FORMAT);
        match &self.api_key {
            Some(key) => req.header(KEY_HEADER, key),
            None => req,
        }
    }

    fn documents_url(&self, database_id: &str, collection_id: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint, database_id, collection_id
        )
    }

    async fn parse<T: DeserializeOwned>(resp: Response) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let (kind, message) = match serde_json::from_str::<ErrorBody>(&body) {
                Ok(parsed) => (parsed.kind, parsed.message),
                Err(_) => (None, body),
            };
            return Err(AppwriteError::Api {
                status: status.as_u16(),
                kind,
                message,
            });
        }

        Ok(resp.json().await?)
    }

    // --- Databases ---

    /// List documents matching `queries`.
    pub async fn list_documents(
        &self,
        database_id: &str,
        collection_id: &str,
        queries: &[Query],
    ) -> Result<DocumentList> {
        let url = self.documents_url(database_id, collection_id);
        let params: Vec<(&str, String)> = queries
            .iter()
            .map(|q| ("queries[]", q.to_param()))
            .collect();

        tracing::debug!(collection_id, queries = queries.len(), "Listing documents");

        let resp = self
            .authorize(self.client.get(&url))
            .query(&params)
            .send()
            .await?;

        Self::parse(resp).await
    }

    /// Create one document. `data` must be a JSON object of attribute values.
    pub async fn create_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &DocumentId,
        data: &Value,
    ) -> Result<Document> {
        if !data.is_object() {
            return Err(AppwriteError::InvalidRequest(
                "document data must be a JSON object".to_string(),
            ));
        }

        let url = self.documents_url(database_id, collection_id);
        let body = CreateDocumentBody {
            document_id: document_id.as_str(),
            data,
            permissions: None,
        };

        tracing::debug!(collection_id, document_id = document_id.as_str(), "Creating document");

        let resp = self
            .authorize(self.client.post(&url))
            .json(&body)
            .send()
            .await?;

        Self::parse(resp).await
    }

    /// Partially update a document. Attributes absent from `data` are left as is.
    pub async fn update_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: &Value,
    ) -> Result<Document> {
        let url = format!("{}/{}", self.documents_url(database_id, collection_id), document_id);

        tracing::debug!(collection_id, document_id, "Updating document");

        let resp = self
            .authorize(self.client.patch(&url))
            .json(&UpdateDocumentBody { data })
            .send()
            .await?;

        Self::parse(resp).await
    }

    pub async fn get_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
    ) -> Result<Document> {
        let url = format!("{}/{}", self.documents_url(database_id, collection_id), document_id);

        let resp = self.authorize(self.client.get(&url)).send().await?;

        Self::parse(resp).await
    }

    // --- Account ---

    /// Register a new email/password account.
    pub async fn create_account(
        &self,
        user_id: &DocumentId,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<Account> {
        let url = format!("{}/account", self.endpoint);
        let body = CreateAccountBody {
            user_id: user_id.as_str(),
            email,
            password,
            name,
        };

        tracing::info!(email, "Creating account");

        let resp = self
            .authorize(self.client.post(&url))
            .json(&body)
            .send()
            .await?;

        Self::parse(resp).await
    }

    /// URL the browser must visit to start an OAuth2 session with `provider`.
    /// Appwrite redirects to `success` or `failure` when the flow finishes.
    pub fn oauth2_session_url(&self, provider: &str, success: &str, failure: &str) -> Result<String> {
        let base = format!("{}/account/sessions/oauth2/{}", self.endpoint, provider);
        let url = url::Url::parse_with_params(
            &base,
            &[
                ("project", self.project_id.as_str()),
                ("success", success),
                ("failure", failure),
            ],
        )?;
        Ok(url.into())
    }
}
