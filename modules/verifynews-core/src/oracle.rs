//! The veracity oracle: an external generative model that judges a claim.

use anyhow::Result;
use async_trait::async_trait;

use ai_client::{truncate_to_char_boundary, Gemini};
use verifynews_common::{AppConfig, Article, VerificationResult};

/// Upper bound on article text sent to the model.
pub const MAX_CONTENT_BYTES: usize = 12_000;

const SYSTEM_PROMPT: &str = "\
You are a careful, neutral fact-checker. Judge whether the user's claim is true, \
false, or uncertain given well-established public knowledge and the supplied \
article text, if any.

Rules:
- Answer \"uncertain\" when the evidence is thin, disputed, or too recent to judge.
- confidence is an integer from 0 to 100 describing how sure you are of the verdict.
- explanation is two to four plain sentences a general reader can follow.
- sources lists reputable outlets or primary documents a reader can check, with full URLs.
  Never invent URLs; leave sources empty rather than guess.";

/// What the oracle is asked to judge.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimInput {
    pub query: String,
    pub content: String,
    pub article: Option<Article>,
}

#[async_trait]
pub trait VeracityOracle: Send + Sync {
    async fn assess(&self, claim: &ClaimInput) -> Result<VerificationResult>;
}

/// [`VeracityOracle`] backed by Gemini structured output.
pub struct GeminiOracle {
    ai: Gemini,
}

impl GeminiOracle {
    pub fn new(ai: Gemini) -> Self {
        Self { ai }
    }

    /// `None` when no Gemini API key is configured.
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        let key = config.gemini_api_key.as_ref()?;
        Some(Self::new(Gemini::new(key.clone(), config.gemini_model.clone())))
    }

    pub fn model(&self) -> &str {
        self.ai.model()
    }
}

/// User turn for one claim: the claim, then whatever article context exists.
pub fn build_prompt(claim: &ClaimInput) -> String {
    let mut prompt = format!("Claim:\n{}\n", claim.query.trim());

    if let Some(article) = &claim.article {
        prompt.push_str(&format!("\nArticle title: {}\nArticle URL: {}\n", article.title, article.url));
        if !article.snippet.trim().is_empty() {
            prompt.push_str(&format!("Article snippet: {}\n", article.snippet.trim()));
        }
    }

    let content = claim.content.trim();
    if !content.is_empty() {
        prompt.push_str("\nArticle text:\n");
        prompt.push_str(truncate_to_char_boundary(content, MAX_CONTENT_BYTES));
        prompt.push('\n');
    }

    prompt
}

#[async_trait]
impl VeracityOracle for GeminiOracle {
    async fn assess(&self, claim: &ClaimInput) -> Result<VerificationResult> {
        tracing::info!(model = self.ai.model(), query_len = claim.query.len(), "Assessing claim");

        let result: VerificationResult = self.ai.extract(SYSTEM_PROMPT, build_prompt(claim)).await?;

        tracing::info!(
            veracity = %result.veracity,
            confidence = result.confidence,
            sources = result.sources.len(),
            "Claim assessed"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(content: &str, article: Option<Article>) -> ClaimInput {
        ClaimInput {
            query: "  Drinking seawater cures dehydration  ".into(),
            content: content.into(),
            article,
        }
    }

    #[test]
    fn bare_claim_prompt() {
        let prompt = build_prompt(&claim("", None));
        assert_eq!(prompt, "Claim:\nDrinking seawater cures dehydration\n");
    }

    #[test]
    fn article_context_is_included() {
        let prompt = build_prompt(&claim(
            "Body text.",
            Some(Article {
                title: "Miracle cure".into(),
                url: "https://example.com/cure".into(),
                snippet: "".into(),
            }),
        ));
        assert!(prompt.contains("Article title: Miracle cure"));
        assert!(prompt.contains("Article URL: https://example.com/cure"));
        assert!(!prompt.contains("Article snippet"));
        assert!(prompt.ends_with("Article text:\nBody text.\n"));
    }

    #[test]
    fn long_content_is_truncated() {
        let body = "é".repeat(MAX_CONTENT_BYTES);
        let prompt = build_prompt(&claim(&body, None));
        assert!(prompt.len() < MAX_CONTENT_BYTES + 200);
    }

    #[test]
    fn oracle_needs_an_api_key() {
        let config = AppConfig::from_lookup(|_| None);
        assert!(GeminiOracle::from_config(&config).is_none());

        let config = AppConfig::from_lookup(|k| (k == "GEMINI_API_KEY").then(|| "key".to_string()));
        let oracle = GeminiOracle::from_config(&config).unwrap();
        assert_eq!(oracle.model(), verifynews_common::config::DEFAULT_GEMINI_MODEL);
    }
}
