use std::sync::Arc;

use serde::Serialize;

use verifynews_common::{unique_slug, Article, NewVerification, VerificationResult};

use crate::error::{Result, VerifyNewsError};
use crate::oracle::{ClaimInput, VeracityOracle};
use crate::service::VerificationService;

/// Derived titles are cut to this many characters.
pub const MAX_DERIVED_TITLE_CHARS: usize = 80;

/// A claim as submitted by a reader.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub query: String,
    pub content: String,
    pub user_id: Option<String>,
    pub article: Option<Article>,
    pub title: Option<String>,
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmittedVerification {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub result: VerificationResult,
}

/// Runs a submission through the oracle and persists the verdict.
pub struct Verifier {
    oracle: Arc<dyn VeracityOracle>,
    service: Arc<VerificationService>,
}

impl Verifier {
    pub fn new(oracle: Arc<dyn VeracityOracle>, service: Arc<VerificationService>) -> Self {
        Self { oracle, service }
    }

    pub async fn submit(&self, submission: Submission) -> Result<SubmittedVerification> {
        let query = submission.query.trim();
        if query.is_empty() {
            return Err(VerifyNewsError::validation("Please enter a claim to verify"));
        }
        if !self.service.is_configured() {
            return Err(VerifyNewsError::NotConfigured("document store"));
        }

        let claim = ClaimInput {
            query: query.to_string(),
            content: submission.content.clone(),
            article: submission.article.clone(),
        };
        let result = self
            .oracle
            .assess(&claim)
            .await
            .map_err(VerifyNewsError::Oracle)?;

        let title = derive_title(&submission);
        let slug = unique_slug(&title);

        let new = NewVerification {
            query: claim.query,
            content: submission.content,
            result: result.clone(),
            user_id: submission.user_id.filter(|u| !u.trim().is_empty()),
            article: submission.article,
            slug: slug.clone(),
            title: Some(title.clone()),
        };
        let id = self.service.save(&new).await?;

        Ok(SubmittedVerification {
            id,
            slug,
            title,
            result,
        })
    }
}

/// Explicit title, else the article's title, else the start of the claim.
pub fn derive_title(submission: &Submission) -> String {
    let explicit = submission
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let from_article = submission
        .article
        .as_ref()
        .map(|a| a.title.trim())
        .filter(|t| !t.is_empty());

    match explicit.or(from_article) {
        Some(title) => title.to_string(),
        None => {
            let query = submission.query.trim();
            let mut title: String = query.chars().take(MAX_DERIVED_TITLE_CHARS).collect();
            if query.chars().count() > MAX_DERIVED_TITLE_CHARS {
                title = title.trim_end().to_string();
                title.push('…');
            }
            title
        }
    }
}
