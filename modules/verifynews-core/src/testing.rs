// Test doubles for the verification services.
//
// Three mocks matching the three trait boundaries:
// - MockDocumentStore (DocumentStore): stateful in-memory collection with a call log
// - FixedOracle (VeracityOracle): canned VerificationResult
// - MockAuth (AuthProvider): records signups, canned failures

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{Map, Value};

use appwrite_client::{Document, DocumentId, DocumentList, Query};
use verifynews_common::{Veracity, VerificationResult};

use crate::auth::{AuthProvider, OAuthProvider, UserAccount};
use crate::error::{Result, StoreError, StoreResult, VerifyNewsError};
use crate::oracle::{ClaimInput, VeracityOracle};
use crate::store::DocumentStore;

// ---------------------------------------------------------------------------
// MockDocumentStore
// ---------------------------------------------------------------------------

/// One call as seen by [`MockDocumentStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    List { queries: Vec<Query> },
    Create { document_id: String, data: Value },
    Update { document_id: String, data: Value },
    Get { document_id: String },
}

struct MockState {
    documents: Vec<Document>,
    calls: Vec<StoreCall>,
    failures: VecDeque<StoreError>,
    lost_responses: VecDeque<StoreError>,
    clock: DateTime<Utc>,
    next_id: u64,
}

impl MockState {
    /// Each write advances the clock one second so creation order is total.
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += Duration::seconds(1);
        self.clock
    }
}

/// In-memory document collection. Ignores database/collection ids.
///
/// `with_read_yield()` makes `get_document` yield to the scheduler after it
/// takes its snapshot, so two read-modify-write callers joined on one task
/// interleave between their read and their write.
pub struct MockDocumentStore {
    configured: bool,
    yield_after_read: bool,
    state: Mutex<MockState>,
}

impl Default for MockDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDocumentStore {
    pub fn new() -> Self {
        Self {
            configured: true,
            yield_after_read: false,
            state: Mutex::new(MockState {
                documents: Vec::new(),
                calls: Vec::new(),
                failures: VecDeque::new(),
                lost_responses: VecDeque::new(),
                clock: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                next_id: 1,
            }),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    pub fn with_read_yield(mut self) -> Self {
        self.yield_after_read = true;
        self
    }

    /// Seed a document. Seeds are created in call order, one second apart.
    pub fn with_document(self, id: &str, data: Value) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let now = state.tick();
            state.documents.push(make_document(id, now, data));
        }
        self
    }

    /// Fail the next store call with `err` (queued, one per call).
    pub fn fail_next(&self, err: StoreError) {
        self.state.lock().unwrap().failures.push_back(err);
    }

    /// Apply the next write, then fail its response with `err`, as when the
    /// connection drops after the server has committed.
    pub fn lose_next_response(&self, err: StoreError) {
        self.state.lock().unwrap().lost_responses.push_back(err);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn document(&self, id: &str) -> Option<Document> {
        self.state
            .lock()
            .unwrap()
            .documents
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&self, call: StoreCall) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn make_document(id: &str, at: DateTime<Utc>, data: Value) -> Document {
    let data = match data {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    Document {
        id: id.to_string(),
        created_at: at,
        updated_at: at,
        collection_id: None,
        database_id: None,
        permissions: Vec::new(),
        data,
    }
}

fn attribute_value(doc: &Document, attribute: &str) -> Value {
    match attribute {
        "$id" => Value::String(doc.id.clone()),
        "$createdAt" => Value::String(doc.created_at.to_rfc3339()),
        "$updatedAt" => Value::String(doc.updated_at.to_rfc3339()),
        other => doc.data.get(other).cloned().unwrap_or(Value::Null),
    }
}

fn compare_attribute(a: &Document, b: &Document, attribute: &str) -> std::cmp::Ordering {
    match attribute {
        "$createdAt" => a.created_at.cmp(&b.created_at),
        "$updatedAt" => a.updated_at.cmp(&b.updated_at),
        other => {
            let (x, y) = (attribute_value(a, other), attribute_value(b, other));
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
                _ => x.to_string().cmp(&y.to_string()),
            }
        }
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn list_documents(
        &self,
        _database_id: &str,
        _collection_id: &str,
        queries: &[Query],
    ) -> StoreResult<DocumentList> {
        self.record(StoreCall::List {
            queries: queries.to_vec(),
        })?;

        let state = self.state.lock().unwrap();
        let mut matched: Vec<Document> = state
            .documents
            .iter()
            .filter(|doc| {
                queries.iter().all(|q| match (q.method(), q.attribute()) {
                    ("equal", Some(attr)) => q.values().contains(&attribute_value(doc, attr)),
                    _ => true,
                })
            })
            .cloned()
            .collect();

        for q in queries {
            if let ("orderDesc", Some(attr)) = (q.method(), q.attribute()) {
                matched.sort_by(|a, b| compare_attribute(b, a, attr));
            }
        }

        let total = matched.len() as u64;
        let limit = queries
            .iter()
            .find(|q| q.method() == "limit")
            .and_then(|q| q.values().first())
            .and_then(Value::as_u64)
            .unwrap_or(25) as usize;

        let documents = matched.into_iter().take(limit).collect();
        Ok(DocumentList { total, documents })
    }

    async fn create_document(
        &self,
        _database_id: &str,
        _collection_id: &str,
        document_id: &DocumentId,
        data: &Value,
    ) -> StoreResult<Document> {
        self.record(StoreCall::Create {
            document_id: document_id.as_str().to_string(),
            data: data.clone(),
        })?;

        if !data.is_object() {
            return Err(StoreError::Rejected {
                status: 400,
                kind: Some("document_invalid_structure".to_string()),
                message: "data must be an object".to_string(),
            });
        }

        let mut state = self.state.lock().unwrap();
        let id = match document_id {
            DocumentId::Unique => {
                let id = format!("doc-{}", state.next_id);
                state.next_id += 1;
                id
            }
            DocumentId::Custom(id) => id.clone(),
        };
        if state.documents.iter().any(|d| d.id == id) {
            return Err(StoreError::Rejected {
                status: 409,
                kind: Some("document_already_exists".to_string()),
                message: format!("Document {id} already exists"),
            });
        }

        let now = state.tick();
        let doc = make_document(&id, now, data.clone());
        state.documents.push(doc.clone());
        match state.lost_responses.pop_front() {
            Some(err) => Err(err),
            None => Ok(doc),
        }
    }

    async fn update_document(
        &self,
        _database_id: &str,
        _collection_id: &str,
        document_id: &str,
        data: &Value,
    ) -> StoreResult<Document> {
        self.record(StoreCall::Update {
            document_id: document_id.to_string(),
            data: data.clone(),
        })?;

        let mut state = self.state.lock().unwrap();
        let now = state.tick();
        let doc = state
            .documents
            .iter_mut()
            .find(|d| d.id == document_id)
            .ok_or_else(|| StoreError::not_found(format!("Document {document_id} not found")))?;

        if let Value::Object(fields) = data {
            for (k, v) in fields {
                doc.data.insert(k.clone(), v.clone());
            }
        }
        doc.updated_at = now;
        let doc = doc.clone();
        match state.lost_responses.pop_front() {
            Some(err) => Err(err),
            None => Ok(doc),
        }
    }

    async fn get_document(
        &self,
        _database_id: &str,
        _collection_id: &str,
        document_id: &str,
    ) -> StoreResult<Document> {
        self.record(StoreCall::Get {
            document_id: document_id.to_string(),
        })?;

        let snapshot = self
            .document(document_id)
            .ok_or_else(|| StoreError::not_found(format!("Document {document_id} not found")))?;

        if self.yield_after_read {
            tokio::task::yield_now().await;
        }
        Ok(snapshot)
    }
}

// ---------------------------------------------------------------------------
// FixedOracle
// ---------------------------------------------------------------------------

/// Returns the same result for every claim and remembers what it was asked.
pub struct FixedOracle {
    result: Option<VerificationResult>,
    claims: Mutex<Vec<ClaimInput>>,
}

impl FixedOracle {
    pub fn new(result: VerificationResult) -> Self {
        Self {
            result: Some(result),
            claims: Mutex::new(Vec::new()),
        }
    }

    /// An oracle whose backend always fails.
    pub fn failing() -> Self {
        Self {
            result: None,
            claims: Mutex::new(Vec::new()),
        }
    }

    pub fn claims(&self) -> Vec<ClaimInput> {
        self.claims.lock().unwrap().clone()
    }
}

#[async_trait]
impl VeracityOracle for FixedOracle {
    async fn assess(&self, claim: &ClaimInput) -> anyhow::Result<VerificationResult> {
        self.claims.lock().unwrap().push(claim.clone());
        self.result
            .clone()
            .ok_or_else(|| anyhow!("oracle backend unavailable"))
    }
}

/// A plausible `false` verdict for tests that do not care about the content.
pub fn false_verdict(confidence: u8) -> VerificationResult {
    VerificationResult {
        veracity: Veracity::False,
        confidence,
        explanation: "Contradicted by primary sources.".to_string(),
        sources: vec![verifynews_common::Source {
            name: "Reuters".to_string(),
            url: "https://www.reuters.com/fact-check".to_string(),
        }],
    }
}

// ---------------------------------------------------------------------------
// MockAuth
// ---------------------------------------------------------------------------

/// Records signups. Emails listed as taken fail with a 409.
pub struct MockAuth {
    taken: Vec<String>,
    signups: Mutex<Vec<(String, Option<String>)>>,
}

impl MockAuth {
    pub fn new() -> Self {
        Self {
            taken: Vec::new(),
            signups: Mutex::new(Vec::new()),
        }
    }

    pub fn with_taken_email(mut self, email: &str) -> Self {
        self.taken.push(email.to_string());
        self
    }

    /// `(email, name)` of every signup that reached the provider.
    pub fn signups(&self) -> Vec<(String, Option<String>)> {
        self.signups.lock().unwrap().clone()
    }
}

impl Default for MockAuth {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for MockAuth {
    fn is_configured(&self) -> bool {
        true
    }

    async fn signup(&self, email: &str, _password: &str, name: Option<&str>) -> Result<UserAccount> {
        self.signups
            .lock()
            .unwrap()
            .push((email.to_string(), name.map(str::to_string)));

        if self.taken.iter().any(|t| t == email) {
            return Err(VerifyNewsError::Auth(StoreError::Rejected {
                status: 409,
                kind: Some("user_already_exists".to_string()),
                message: "A user with the same id, email, or phone already exists".to_string(),
            }));
        }

        Ok(UserAccount {
            id: format!("user-{}", self.signups.lock().unwrap().len()),
            name: name.unwrap_or_default().to_string(),
            email: email.to_string(),
        })
    }

    fn social_login(&self, provider: OAuthProvider) -> Result<String> {
        Ok(format!("https://auth.test/oauth2/{}", provider.as_str()))
    }
}
