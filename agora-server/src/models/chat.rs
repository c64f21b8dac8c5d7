//! Chat completion request body

use serde::Deserialize;

use super::validation::{check_length, ValidationError};

const PROMPT_MAX: usize = 255;
const MAX_TOKENS_LIMIT: u32 = 4096;

/// POST /v1/ai/chat-completion body
#[derive(Debug, Deserialize)]
pub struct ChatCompletionRequest {
    pub prompt: String,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl ChatCompletionRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_length("prompt", self.prompt.trim(), 1, PROMPT_MAX)?;
        if let Some(max_tokens) = self.max_tokens {
            if max_tokens == 0 || max_tokens > MAX_TOKENS_LIMIT {
                return Err(ValidationError::OutOfRange {
                    field: "max_tokens",
                    min: 1,
                    max: MAX_TOKENS_LIMIT as i64,
                });
            }
        }
        Ok(())
    }
}
