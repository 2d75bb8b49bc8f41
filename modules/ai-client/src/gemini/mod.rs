mod client;
pub(crate) mod types;

use crate::schema::StructuredOutput;
use crate::util::strip_code_blocks;
use anyhow::{anyhow, Result};

use client::GeminiClient;
use types::*;

/// Output cap for structured responses.
const MAX_OUTPUT_TOKENS: u32 = 4096;

// =============================================================================
// Gemini Agent
// =============================================================================

#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
    temperature: f32,
}

impl Gemini {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            temperature: 0.0,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn client(&self) -> GeminiClient {
        let client = GeminiClient::new(&self.api_key);
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }

    async fn generate_text(&self, request: GenerateRequest) -> Result<String> {
        let response = self.client().generate(&self.model, &request).await?;

        if let Some(reason) = response.block_reason() {
            return Err(anyhow!("Gemini blocked the prompt: {}", reason));
        }

        response.text().ok_or_else(|| {
            let finish = response
                .candidates
                .first()
                .and_then(|c| c.finish_reason.clone())
                .unwrap_or_else(|| "unknown".to_string());
            anyhow!("No text in Gemini response (finish reason: {})", finish)
        })
    }

    // =========================================================================
    // Convenience methods
    // =========================================================================

    /// Type-safe structured output: the response schema is derived from `T`.
    pub async fn extract<T: StructuredOutput>(
        &self,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Result<T> {
        let request = GenerateRequest::new()
            .system(system_prompt)
            .user(user_prompt)
            .temperature(self.temperature)
            .max_output_tokens(MAX_OUTPUT_TOKENS)
            .json_schema(T::gemini_schema());

        let text = self.generate_text(request).await?;

        serde_json::from_str(strip_code_blocks(&text)).map_err(|e| {
            anyhow!(
                "Failed to deserialize {} from Gemini response: {}",
                T::type_name(),
                e
            )
        })
    }
}
