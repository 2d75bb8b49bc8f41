// Document store seam.
//
// VerificationService talks to the store only through DocumentStore, so the
// Appwrite client can be swapped for MockDocumentStore in tests.

use async_trait::async_trait;
use serde_json::Value;

use appwrite_client::{AppwriteClient, Document, DocumentId, DocumentList, Query};

use crate::error::StoreResult;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Whether the backend has enough configuration to accept calls.
    fn is_configured(&self) -> bool;

    async fn list_documents(
        &self,
        database_id: &str,
        collection_id: &str,
        queries: &[Query],
    ) -> StoreResult<DocumentList>;

    async fn create_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &DocumentId,
        data: &Value,
    ) -> StoreResult<Document>;

    /// Partial update: only the attributes present in `data` change.
    async fn update_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: &Value,
    ) -> StoreResult<Document>;

    async fn get_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
    ) -> StoreResult<Document>;
}

#[async_trait]
impl DocumentStore for AppwriteClient {
    fn is_configured(&self) -> bool {
        AppwriteClient::is_configured(self)
    }

    async fn list_documents(
        &self,
        database_id: &str,
        collection_id: &str,
        queries: &[Query],
    ) -> StoreResult<DocumentList> {
        Ok(AppwriteClient::list_documents(self, database_id, collection_id, queries).await?)
    }

    async fn create_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &DocumentId,
        data: &Value,
    ) -> StoreResult<Document> {
        Ok(AppwriteClient::create_document(self, database_id, collection_id, document_id, data).await?)
    }

    async fn update_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: &Value,
    ) -> StoreResult<Document> {
        Ok(AppwriteClient::update_document(self, database_id, collection_id, document_id, data).await?)
    }

    async fn get_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
    ) -> StoreResult<Document> {
        Ok(AppwriteClient::get_document(self, database_id, collection_id, document_id).await?)
    }
}
