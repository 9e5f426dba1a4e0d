//! HTTP handlers for the relay.

use crate::config::ProviderErrorPolicy;
use crate::models::{AskReply, AskRequest, Greeting, HealthStatus};
use crate::services::answer_question;
use crate::services::providers::ProviderError;
use crate::startup::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::AppError;

/// `GET /`: fixed greeting.
pub async fn root() -> Json<Greeting> {
    Json(Greeting { message: "hello" })
}

/// `POST /ask`: relay the question and report the answer or the failure.
pub async fn ask(State(state): State<AppState>, Json(request): Json<AskRequest>) -> Response {
    match answer_question(state.text_provider.as_ref(), &request.question).await {
        Ok(answer) => (StatusCode::OK, Json(AskReply::Answer { answer })).into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "Provider call failed");
            let status = error_status(state.config.provider_error_policy, &err);
            (
                status,
                Json(AskReply::Error {
                    error: err.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Status code for a failed provider call under `policy`.
pub fn error_status(policy: ProviderErrorPolicy, err: &ProviderError) -> StatusCode {
    match policy {
        ProviderErrorPolicy::AlwaysOk => StatusCode::OK,
        ProviderErrorPolicy::UpstreamStatus => match err {
            ProviderError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProviderError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ProviderError::ContentFiltered => StatusCode::UNPROCESSABLE_ENTITY,
            ProviderError::NetworkError(_)
            | ProviderError::ApiError(_)
            | ProviderError::EmptyResponse
            | ProviderError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
        },
    }
}

/// `GET /health`: liveness probe. Does not call the provider.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        service: state.config.service_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_ok_masks_every_failure() {
        for err in [
            ProviderError::RateLimited,
            ProviderError::NetworkError("timeout".into()),
            ProviderError::NotConfigured("no key".into()),
        ] {
            assert_eq!(error_status(ProviderErrorPolicy::AlwaysOk, &err), StatusCode::OK);
        }
    }

    #[test]
    fn upstream_status_distinguishes_failures() {
        let policy = ProviderErrorPolicy::UpstreamStatus;
        assert_eq!(
            error_status(policy, &ProviderError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            error_status(policy, &ProviderError::NotConfigured("no key".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            error_status(policy, &ProviderError::ContentFiltered),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            error_status(policy, &ProviderError::ApiError("boom".into())),
            StatusCode::BAD_GATEWAY
        );
    }
}
