use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// --- Judgement ---

/// The oracle's call on a claim. Stored as the strings `true`, `false`, `uncertain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Veracity {
    True,
    False,
    Uncertain,
}

impl Veracity {
    pub const ALL: [Veracity; 3] = [Veracity::True, Veracity::False, Veracity::Uncertain];

    pub fn as_str(&self) -> &'static str {
        match self {
            Veracity::True => "true",
            Veracity::False => "false",
            Veracity::Uncertain => "uncertain",
        }
    }
}

impl fmt::Display for Veracity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Veracity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "true" => Ok(Veracity::True),
            "false" => Ok(Veracity::False),
            "uncertain" => Ok(Veracity::Uncertain),
            other => Err(format!("unknown veracity: {other}")),
        }
    }
}

/// A citation backing the judgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Source {
    /// Publisher or outlet name.
    pub name: String,
    /// Link to the cited page.
    pub url: String,
}

/// The article a claim was taken from, when the user submitted one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
}

/// What the veracity oracle returns for one claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VerificationResult {
    /// Whether the claim is true, false, or cannot be determined.
    pub veracity: Veracity,
    /// Confidence in the judgement, from 0 to 100.
    pub confidence: u8,
    /// Short rationale for the judgement, written for a general reader.
    pub explanation: String,
    /// Sources supporting the judgement, most authoritative first.
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl VerificationResult {
    pub const MAX_CONFIDENCE: u8 = 100;

    pub fn has_valid_confidence(&self) -> bool {
        self.confidence <= Self::MAX_CONFIDENCE
    }
}

/// Direction of a reader's vote on a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// Counter attribute the vote increments.
    pub fn field(&self) -> &'static str {
        match self {
            VoteDirection::Up => "upvotes",
            VoteDirection::Down => "downvotes",
        }
    }
}

impl FromStr for VoteDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" => Ok(VoteDirection::Up),
            "down" => Ok(VoteDirection::Down),
            other => Err(format!("vote direction must be 'up' or 'down', got '{other}'")),
        }
    }
}

// --- Records ---

/// Everything `save` needs to create a record. Counters are not caller-supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVerification {
    pub query: String,
    pub content: String,
    pub result: VerificationResult,
    pub user_id: Option<String>,
    pub article: Option<Article>,
    pub slug: String,
    pub title: Option<String>,
}

/// One persisted verification, as read back from the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRecord {
    #[serde(rename = "$id")]
    pub id: String,
    pub query: String,
    #[serde(default)]
    pub content: String,
    pub veracity: Veracity,
    #[serde(deserialize_with = "stored_confidence")]
    pub confidence: u8,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, deserialize_with = "json_or_text")]
    pub sources: Vec<Source>,
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "json_or_text")]
    pub article: Option<Article>,
    pub slug: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "viewCount", default, deserialize_with = "counter")]
    pub view_count: u64,
    #[serde(default, deserialize_with = "counter")]
    pub upvotes: u64,
    #[serde(default, deserialize_with = "counter")]
    pub downvotes: u64,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "$updatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl VerificationRecord {
    /// Title for display: explicit title, else the article's, else the claim itself.
    pub fn headline(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.article.as_ref().map(|a| a.title.as_str()))
            .unwrap_or(&self.query)
    }

    pub fn score(&self) -> i64 {
        self.upvotes as i64 - self.downvotes as i64
    }
}

// --- Store encodings ---

/// Structured attributes are stored as JSON text. Accept that text, the
/// native JSON shape, or an array whose items are JSON text.
fn json_or_text<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    let value = match value {
        Value::Null => return Ok(T::default()),
        Value::String(s) if s.trim().is_empty() => return Ok(T::default()),
        Value::String(s) => serde_json::from_str(&s).map_err(serde::de::Error::custom)?,
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => serde_json::from_str(&s).unwrap_or(Value::String(s)),
                    other => other,
                })
                .collect(),
        ),
        other => other,
    };
    serde_json::from_value(value).map_err(serde::de::Error::custom)
}

/// Confidence may come back as a float attribute; round into 0..=100.
fn stored_confidence<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let n = f64::deserialize(deserializer)?;
    Ok(n.round().clamp(0.0, 100.0) as u8)
}

/// Counters are never negative; a null attribute reads as zero.
fn counter<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let n = Option::<i64>::deserialize(deserializer)?;
    Ok(n.unwrap_or(0).max(0) as u64)
}
