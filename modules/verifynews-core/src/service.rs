//! Verification Record Service: maps verification operations onto document
//! store calls.
//!
//! View and vote counters are updated with a plain read-modify-write. Two
//! callers incrementing the same record at once can both start from the same
//! baseline, and one increment is then lost.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use appwrite_client::{AppwriteClient, Document, DocumentId, DocumentList, Query};
use verifynews_common::{AppConfig, NewVerification, Veracity, VerificationRecord, VoteDirection};

use crate::error::{Result, StoreError, VerifyNewsError};
use crate::retry::{retry_operation, RetryPolicy};
use crate::stats::DashboardStats;
use crate::store::DocumentStore;

/// Store-assigned creation timestamp attribute.
pub const CREATED_AT: &str = "$createdAt";

pub struct VerificationService {
    store: Arc<dyn DocumentStore>,
    database_id: String,
    collection_id: String,
    retry: RetryPolicy,
}

impl VerificationService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        database_id: impl Into<String>,
        collection_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            database_id: database_id.into(),
            collection_id: collection_id.into(),
            retry: RetryPolicy::default(),
        }
    }

    /// Service backed by the Appwrite project named in `config`. An incomplete
    /// config yields a service that reports itself as not configured.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut client = AppwriteClient::new(
            config.appwrite_endpoint.clone(),
            config.appwrite_project_id.clone().unwrap_or_default(),
        );
        if let Some(key) = &config.appwrite_api_key {
            client = client.with_api_key(key.clone());
        }

        Self::new(
            Arc::new(client),
            config.database_id.clone().unwrap_or_default(),
            config.collection_id.clone().unwrap_or_default(),
        )
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_configured() && !self.database_id.is_empty() && !self.collection_id.is_empty()
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(VerifyNewsError::NotConfigured("document store"))
        }
    }

    // --- Writes ---

    /// Persist a new verification with zeroed counters. Returns its id.
    pub async fn save(&self, new: &NewVerification) -> Result<String> {
        if !new.result.has_valid_confidence() {
            return Err(VerifyNewsError::validation(format!(
                "Confidence must be between 0 and 100, got {}",
                new.result.confidence
            )));
        }
        self.ensure_configured()?;

        let data = json!({
            "query": new.query,
            "content": new.content,
            "veracity": new.result.veracity.as_str(),
            "confidence": new.result.confidence,
            "explanation": new.result.explanation,
            "sources": encode(&new.result.sources)?,
            "userId": new.user_id,
            "article": new.article.as_ref().map(encode).transpose()?,
            "slug": new.slug,
            "title": new.title,
            "viewCount": 0,
            "upvotes": 0,
            "downvotes": 0,
        });

        // Client-chosen id so a retried create cannot produce a second record.
        let document_id = DocumentId::Custom(Uuid::new_v4().simple().to_string());

        let mut attempts = 0u32;
        let created = retry_operation(&self.retry, "create_document", || {
            attempts += 1;
            self.store
                .create_document(&self.database_id, &self.collection_id, &document_id, &data)
        })
        .await;

        let doc = match created {
            Ok(doc) => doc,
            // An earlier attempt was stored but its response never arrived.
            Err(err) if attempts > 1 && err.status() == Some(409) => {
                tracing::warn!(
                    id = document_id.as_str(),
                    attempts,
                    "Create conflicted on retry, using the stored document"
                );
                self.get_document(document_id.as_str()).await?
            }
            Err(err) => return Err(err.into()),
        };

        tracing::info!(id = %doc.id, slug = %new.slug, veracity = %new.result.veracity, "Saved verification");
        Ok(doc.id)
    }

    /// Set `viewCount` to `current_count + 1`. The caller supplies the count it read.
    pub async fn increment_view_count(&self, id: &str, current_count: u64) -> Result<()> {
        self.ensure_configured()?;

        let next = current_count.saturating_add(1);
        self.update(id, &json!({ "viewCount": next })).await?;

        tracing::debug!(id, view_count = next, "Incremented view count");
        Ok(())
    }

    /// Read the record, then write back the chosen counter plus one.
    pub async fn vote_on_verification(&self, id: &str, direction: VoteDirection) -> Result<()> {
        self.ensure_configured()?;

        let doc = self.get_document(id).await?;
        let field = direction.field();
        let next = doc.counter(field).saturating_add(1);

        let mut data = serde_json::Map::new();
        data.insert(field.to_string(), Value::from(next));
        self.update(id, &Value::Object(data)).await?;

        tracing::info!(id, field, count = next, "Recorded vote");
        Ok(())
    }

    // --- Reads ---

    /// Exact-match lookup by shareable slug. Blank slugs are never queried.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<VerificationRecord>> {
        if slug.trim().is_empty() {
            return Ok(None);
        }
        self.ensure_configured()?;

        let list = self
            .list(vec![Query::equal("slug", slug), Query::limit(1)])
            .await?;

        match list.documents.first() {
            Some(doc) => Ok(Some(decode(doc)?)),
            None => {
                tracing::debug!(slug, "No verification for slug");
                Ok(None)
            }
        }
    }

    /// Opening a shared verification: look it up by slug and count the view.
    /// The returned record already carries the new count.
    pub async fn view_by_slug(&self, slug: &str) -> Result<Option<VerificationRecord>> {
        let Some(mut record) = self.get_by_slug(slug).await? else {
            return Ok(None);
        };
        self.increment_view_count(&record.id, record.view_count).await?;
        record.view_count = record.view_count.saturating_add(1);
        Ok(Some(record))
    }

    pub async fn get_by_id(&self, id: &str) -> Result<VerificationRecord> {
        self.ensure_configured()?;
        let doc = self.get_document(id).await?;
        decode(&doc)
    }

    /// Most recent verifications first, at most `limit` of them.
    pub async fn get_recent(&self, limit: u32) -> Result<Vec<VerificationRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.ensure_configured()?;

        let list = self
            .list(vec![Query::order_desc(CREATED_AT), Query::limit(limit)])
            .await?;
        decode_all(list, limit)
    }

    /// A user's own verifications, most recent first.
    pub async fn get_history(&self, user_id: &str, limit: u32) -> Result<Vec<VerificationRecord>> {
        let user_id = user_id.trim();
        if user_id.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        self.ensure_configured()?;

        let list = self
            .list(vec![
                Query::equal("userId", user_id),
                Query::order_desc(CREATED_AT),
                Query::limit(limit),
            ])
            .await?;
        decode_all(list, limit)
    }

    /// Totals across the whole collection, one count query per judgement.
    pub async fn stats(&self) -> Result<DashboardStats> {
        self.ensure_configured()?;

        let (total, true_count, false_count, uncertain_count) = futures::try_join!(
            self.count(None),
            self.count(Some(Veracity::True)),
            self.count(Some(Veracity::False)),
            self.count(Some(Veracity::Uncertain)),
        )?;

        Ok(DashboardStats {
            total,
            true_count,
            false_count,
            uncertain_count,
        })
    }

    // --- Store plumbing ---

    async fn count(&self, veracity: Option<Veracity>) -> Result<u64> {
        let mut queries = vec![Query::limit(1)];
        if let Some(v) = veracity {
            queries.push(Query::equal("veracity", v.as_str()));
        }
        Ok(self.list(queries).await?.total)
    }

    async fn list(&self, queries: Vec<Query>) -> Result<DocumentList> {
        let list = retry_operation(&self.retry, "list_documents", || {
            self.store
                .list_documents(&self.database_id, &self.collection_id, &queries)
        })
        .await?;
        Ok(list)
    }

    async fn get_document(&self, id: &str) -> Result<Document> {
        let doc = retry_operation(&self.retry, "get_document", || {
            self.store
                .get_document(&self.database_id, &self.collection_id, id)
        })
        .await?;
        Ok(doc)
    }

    async fn update(&self, id: &str, data: &Value) -> Result<Document> {
        let doc = retry_operation(&self.retry, "update_document", || {
            self.store
                .update_document(&self.database_id, &self.collection_id, id, data)
        })
        .await?;
        Ok(doc)
    }
}

/// Structured attributes are stored as JSON text.
fn encode<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| StoreError::Decode(e.to_string()).into())
}

fn decode(doc: &Document) -> Result<VerificationRecord> {
    doc.decode()
        .map_err(|e| StoreError::Decode(format!("document {}: {}", doc.id, e)).into())
}

fn decode_all(list: DocumentList, limit: u32) -> Result<Vec<VerificationRecord>> {
    list.documents
        .iter()
        .take(limit as usize)
        .map(decode)
        .collect()
}
