use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// --- Documents ---

/// A document as returned by the databases API. Attribute values live in
/// `data`; the `$`-prefixed system fields are lifted out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "$updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "$collectionId", default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
    #[serde(rename = "$databaseId", default, skip_serializing_if = "Option::is_none")]
    pub database_id: Option<String>,
    #[serde(rename = "$permissions", default)]
    pub permissions: Vec<String>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Document {
    /// Read a non-negative integer attribute. Absent, null or non-numeric
    /// values read as zero.
    pub fn counter(&self, attribute: &str) -> u64 {
        self.data
            .get(attribute)
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    pub fn str_attr(&self, attribute: &str) -> Option<&str> {
        self.data.get(attribute).and_then(Value::as_str)
    }

    /// Deserialize the whole document (system fields included) into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(serde_json::to_value(self)?)
    }
}

/// Response of `GET .../documents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentList {
    pub total: u64,
    pub documents: Vec<Document>,
}

/// Identifier to use when creating a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentId {
    /// Let the server assign one.
    Unique,
    Custom(String),
}

impl DocumentId {
    pub fn as_str(&self) -> &str {
        match self {
            DocumentId::Unique => "unique()",
            DocumentId::Custom(id) => id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateDocumentBody<'a> {
    pub document_id: &'a str,
    pub data: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<&'a [String]>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct UpdateDocumentBody<'a> {
    pub data: &'a Value,
}

// --- Queries ---

/// One entry of the `queries[]` parameter, in Appwrite's JSON query syntax.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    attribute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    values: Option<Vec<Value>>,
}

impl Query {
    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            method: "equal",
            attribute: Some(attribute.into()),
            values: Some(vec![value.into()]),
        }
    }

    pub fn order_desc(attribute: impl Into<String>) -> Self {
        Self {
            method: "orderDesc",
            attribute: Some(attribute.into()),
            values: None,
        }
    }

    pub fn limit(limit: u32) -> Self {
        Self {
            method: "limit",
            attribute: None,
            values: Some(vec![Value::from(limit)]),
        }
    }

    pub fn method(&self) -> &str {
        self.method
    }

    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    pub fn values(&self) -> &[Value] {
        self.values.as_deref().unwrap_or(&[])
    }

    /// Encoded form sent as a `queries[]` value.
    pub fn to_param(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

// --- Account ---

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateAccountBody<'a> {
    pub user_id: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
}

/// A user as returned by `POST /account`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Account {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(rename = "emailVerification", default)]
    pub email_verification: bool,
    #[serde(default = "default_status")]
    pub status: bool,
}

fn default_status() -> bool {
    true
}

/// Error envelope Appwrite returns alongside non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}
