//! Translator feature
//!
//! English to Thai translation through a hosted text-generation model.

pub mod gemini;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::shared::error::{AppError, AppResult};

pub use gemini::GeminiClient;

/// Text-generation capability: one prompt in, generated text out
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns `Ok(None)` when the model produced no text.
    async fn generate(&self, model: &str, prompt: &str) -> AppResult<Option<String>>;
}

/// Build the fixed translation prompt around the user's literal text
pub fn build_prompt(text: &str) -> String {
    format!(
        "You are a professional translator. Translate the following English text into natural-sounding Thai.\n\
         - Ensure the tone is polite (using polite particles like 'krub'/'ka' where appropriate) but natural.\n\
         - Do not add any conversational filler before or after the translation.\n\
         - Return ONLY the Thai translation.\n\
         \n\
         Text to translate:\n\
         \"{}\"",
        text
    )
}

/// Translation client. Holds no per-request state, so one instance can
/// serve any number of independent calls.
#[derive(Clone)]
pub struct TranslatorService {
    generator: Arc<dyn TextGenerator>,
    model: String,
}

impl TranslatorService {
    pub fn new(generator: Arc<dyn TextGenerator>, model: impl Into<String>) -> Self {
        Self {
            generator,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Translate `text` to Thai.
    ///
    /// Blank input returns an empty string without touching the network.
    /// Every remote failure is logged and reported as
    /// [`AppError::TranslationFailure`].
    pub async fn translate(&self, text: &str) -> AppResult<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let prompt = build_prompt(text);
        match self.generator.generate(&self.model, &prompt).await {
            Ok(output) => {
                let translated = output.map(|t| t.trim().to_string()).unwrap_or_default();
                debug!(model = %self.model, chars = translated.chars().count(), "Translation received");
                Ok(translated)
            }
            Err(e) => {
                error!(model = %self.model, error = %e, "Translation error");
                Err(AppError::TranslationFailure)
            }
        }
    }
}
