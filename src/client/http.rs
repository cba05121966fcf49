use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::{BackendError, DashboardApi, StatusError, SummaryReply, VoiceAlertReply};
use crate::config::DashConfig;
use crate::snapshot::Snapshot;

const BODY_SNIPPET: usize = 200;

pub struct HttpApi {
    client: Client,
    base: Url,
    snapshot_url: Url,
    summary_url: Url,
    alert_url: Url,
}

impl HttpApi {
    pub fn new(cfg: &DashConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(cfg.http_timeout())
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            base: cfg.base()?,
            snapshot_url: cfg.endpoint(&cfg.snapshot_path)?,
            summary_url: cfg.endpoint(&cfg.summary_path)?,
            alert_url: cfg.endpoint(&cfg.alert_path)?,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn snippet(body: &str) -> String {
        body.chars().take(BODY_SNIPPET).collect()
    }
}

#[async_trait]
impl DashboardApi for HttpApi {
    async fn fetch_snapshot(&self) -> Result<Snapshot> {
        let resp = self
            .client
            .get(self.snapshot_url.clone())
            .send()
            .await
            .with_context(|| format!("GET {}", self.snapshot_url))?;
        let status = resp.status();
        let body = resp.text().await.context("reading snapshot body")?;

        if !status.is_success() {
            // the backend's 500 body is {"error": ...}; prefer that message
            let message = Snapshot::from_json(&body)
                .ok()
                .and_then(|s| s.error)
                .unwrap_or_else(|| Self::snippet(&body));
            return Err(StatusError {
                status: status.as_u16(),
                body: message,
            }
            .into());
        }

        let snapshot = Snapshot::from_json(&body).context("decoding snapshot")?;
        if let Some(err) = snapshot.error {
            return Err(BackendError(err).into());
        }
        Ok(snapshot)
    }

    async fn fetch_summary(&self) -> Result<Option<String>> {
        // Parsed regardless of status: the backend reports its own failure text.
        let resp = self
            .client
            .get(self.summary_url.clone())
            .send()
            .await
            .with_context(|| format!("GET {}", self.summary_url))?;
        let reply: SummaryReply = resp.json().await.context("decoding summary")?;
        Ok(reply.summary)
    }

    async fn request_voice_alert(&self) -> Result<VoiceAlertReply> {
        let resp = self
            .client
            .post(self.alert_url.clone())
            .send()
            .await
            .with_context(|| format!("POST {}", self.alert_url))?;
        let reply: VoiceAlertReply = resp.json().await.context("decoding voice alert reply")?;
        Ok(reply)
    }

    async fn fetch_artifact(&self, path: &str) -> Result<Vec<u8>> {
        let url = self
            .base
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("invalid artifact path {:?}", path))?;
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {}", url))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(StatusError {
                status: status.as_u16(),
                body: format!("artifact {}", path),
            }
            .into());
        }
        let bytes = resp.bytes().await.context("reading artifact")?;
        Ok(bytes.to_vec())
    }
}
