use crate::services::providers::{FinishReason, ProviderError, TextProvider};

/// Forward `question` verbatim to the provider and return the answer text.
pub async fn answer_question(
    provider: &dyn TextProvider,
    question: &str,
) -> Result<String, ProviderError> {
    let response = provider.generate(question).await?;

    tracing::info!(
        model = %provider.model(),
        input_tokens = response.input_tokens,
        output_tokens = response.output_tokens,
        truncated = response.finish_reason == FinishReason::Length,
        "Provider answered"
    );

    response.text.ok_or(ProviderError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::mock::MockTextProvider;
    use crate::services::providers::ProviderResponse;
    use async_trait::async_trait;

    struct SilentProvider;

    #[async_trait]
    impl TextProvider for SilentProvider {
        async fn generate(&self, _prompt: &str) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                text: None,
                input_tokens: 1,
                output_tokens: 0,
                finish_reason: FinishReason::Complete,
            })
        }

        fn model(&self) -> &str {
            "silent"
        }
    }

    #[tokio::test]
    async fn returns_provider_text() {
        let provider = MockTextProvider::answering("4");
        assert_eq!(answer_question(&provider, "2+2?").await.unwrap(), "4");
        assert_eq!(provider.prompts(), vec!["2+2?".to_string()]);
    }

    #[tokio::test]
    async fn forwards_empty_question_unchanged() {
        let provider = MockTextProvider::answering("?");
        answer_question(&provider, "").await.unwrap();
        assert_eq!(provider.prompts(), vec![String::new()]);
    }

    #[tokio::test]
    async fn propagates_provider_error() {
        let provider = MockTextProvider::failing(ProviderError::NetworkError("timeout".into()));
        let err = answer_question(&provider, "x").await.unwrap_err();
        assert_eq!(err.to_string(), "timeout");
    }

    #[tokio::test]
    async fn missing_text_is_empty_response() {
        let err = answer_question(&SilentProvider, "x").await.unwrap_err();
        assert_eq!(err, ProviderError::EmptyResponse);
    }
}
