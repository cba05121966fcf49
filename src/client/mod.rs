use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::snapshot::Snapshot;

mod http;

pub use http::HttpApi;

/// Reply from the voice-alert endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceAlertReply {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryReply {
    #[serde(default)]
    pub summary: Option<String>,
}

/// Backend the dashboard polls.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<Snapshot>;
    async fn fetch_summary(&self) -> Result<Option<String>>;
    async fn request_voice_alert(&self) -> Result<VoiceAlertReply>;
    /// Fetch a server-relative artifact such as generated alert audio.
    async fn fetch_artifact(&self, path: &str) -> Result<Vec<u8>>;
}

// =============================================================================
// Failure classification
// =============================================================================

/// Non-2xx response where the body is not trusted.
#[derive(Debug)]
pub struct StatusError {
    pub status: u16,
    pub body: String,
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}: {}", self.status, self.body)
    }
}

impl std::error::Error for StatusError {}

/// Snapshot that decoded but carried a server-side `error`.
#[derive(Debug)]
pub struct BackendError(pub String);

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "backend error: {}", self.0)
    }
}

impl std::error::Error for BackendError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Status,
    Decode,
    Backend,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Transport => "transport",
            FailureKind::Status => "status",
            FailureKind::Decode => "decode",
            FailureKind::Backend => "backend",
        }
    }
}

/// Cloneable record of a failed request, carried in events.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchFailure {
    pub fn from_error(err: &anyhow::Error) -> Self {
        let kind = if err.downcast_ref::<BackendError>().is_some() {
            FailureKind::Backend
        } else if err.downcast_ref::<StatusError>().is_some() {
            FailureKind::Status
        } else if err.downcast_ref::<serde_json::Error>().is_some() {
            FailureKind::Decode
        } else if let Some(re) = err.downcast_ref::<reqwest::Error>() {
            if re.is_decode() {
                FailureKind::Decode
            } else if re.is_status() {
                FailureKind::Status
            } else {
                FailureKind::Transport
            }
        } else {
            FailureKind::Transport
        };
        Self {
            kind,
            message: format!("{:#}", err),
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failure: {}", self.kind.as_str(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn classifies_typed_errors() {
        let status = anyhow::Error::new(StatusError {
            status: 500,
            body: "boom".into(),
        });
        assert_eq!(FetchFailure::from_error(&status).kind, FailureKind::Status);

        let backend = anyhow::Error::new(BackendError("no model".into()));
        let f = FetchFailure::from_error(&backend);
        assert_eq!(f.kind, FailureKind::Backend);
        assert!(f.message.contains("no model"));

        let decode = anyhow::Error::new(serde_json::from_str::<Snapshot>("[").unwrap_err());
        assert_eq!(FetchFailure::from_error(&decode).kind, FailureKind::Decode);

        let other = anyhow!("connection reset");
        assert_eq!(FetchFailure::from_error(&other).kind, FailureKind::Transport);
    }

    #[test]
    fn context_keeps_classification() {
        let err = anyhow::Error::new(StatusError {
            status: 503,
            body: String::new(),
        })
        .context("GET /predict-stream");
        let f = FetchFailure::from_error(&err);
        assert_eq!(f.kind, FailureKind::Status);
        assert!(f.message.starts_with("GET /predict-stream"));
    }

    #[test]
    fn voice_reply_defaults() {
        let reply: VoiceAlertReply = serde_json::from_str(r#"{"error": "tts offline"}"#).unwrap();
        assert!(!reply.ok);
        assert_eq!(reply.error.as_deref(), Some("tts offline"));
    }
}
