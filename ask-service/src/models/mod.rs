//! Request and response bodies for the HTTP surface.

use serde::{Deserialize, Serialize};

/// Inbound `/ask` payload. The question is forwarded as-is.
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// Outbound `/ask` payload: exactly one of `answer` or `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AskReply {
    Answer { answer: String },
    Error { error: String },
}

#[derive(Debug, Serialize)]
pub struct Greeting {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: String,
    pub version: &'static str,
}
