//! Scripted provider for tests.

use super::{FinishReason, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use std::sync::Mutex;

enum Script {
    Answer(String),
    Fail(ProviderError),
}

/// Mock text provider that answers or fails the same way on every call and
/// records the prompts it was given.
pub struct MockTextProvider {
    script: Script,
    prompts: Mutex<Vec<String>>,
}

impl MockTextProvider {
    pub fn answering(text: impl Into<String>) -> Self {
        Self::with_script(Script::Answer(text.into()))
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::with_script(Script::Fail(error))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(&self, prompt: &str) -> Result<ProviderResponse, ProviderError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        match &self.script {
            Script::Answer(text) => Ok(ProviderResponse {
                text: Some(text.clone()),
                input_tokens: prompt.len() as i32 / 4,
                output_tokens: text.len() as i32 / 4,
                finish_reason: FinishReason::Complete,
            }),
            Script::Fail(err) => Err(err.clone()),
        }
    }

    fn model(&self) -> &str {
        "mock"
    }
}
