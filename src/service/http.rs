//! reqwest-backed [`MoodService`].

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};

use crate::config::ServiceConfig;
use crate::error::{MoodError, Result};
use crate::service::types::{AmbientState, AnalysisMode, AnalysisResult, WireState};
use crate::service::MoodService;

/// Multipart field the analysis endpoints read the recording from.
pub const AUDIO_FIELD: &str = "audio";
pub const AUDIO_FILE_NAME: &str = "recording.wav";
pub const AUDIO_MIME: &str = "audio/wav";

/// Longest error body echoed back into a failure reason.
const MAX_ERROR_BODY_CHARS: usize = 300;

pub struct HttpMoodService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpMoodService {
    /// Builds a client whose every request is bounded by the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`MoodError::Config`] if the HTTP client cannot be constructed.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| MoodError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl MoodService for HttpMoodService {
    async fn analyze(&self, mode: AnalysisMode, wav: Vec<u8>) -> Result<AnalysisResult> {
        let url = self.url(mode.endpoint());
        let part = Part::bytes(wav)
            .file_name(AUDIO_FILE_NAME)
            .mime_str(AUDIO_MIME)
            .map_err(|e| MoodError::Audio(format!("invalid upload MIME type: {e}")))?;
        let form = Form::new().part(AUDIO_FIELD, part);

        debug!(%url, "submitting recording");
        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let body: String = body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect();
            warn!(status = status.as_u16(), "analysis request rejected");
            let reason = if body.is_empty() {
                format!("HTTP {}", status.as_u16())
            } else {
                format!("HTTP {}: {body}", status.as_u16())
            };
            return Err(MoodError::AnalysisFailed(Some(reason)));
        }

        resp.json::<AnalysisResult>().await.map_err(|e| {
            if e.is_timeout() {
                classify_reqwest_error(&e)
            } else {
                MoodError::AnalysisFailed(Some(format!("invalid analysis response: {e}")))
            }
        })
    }

    async fn fetch_state(&self) -> Result<AmbientState> {
        let url = self.url("/state");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(MoodError::NetworkUnavailable(format!(
                "state endpoint returned HTTP {}",
                status.as_u16()
            )));
        }

        let wire = resp
            .json::<WireState>()
            .await
            .map_err(|e| MoodError::NetworkUnavailable(format!("invalid state response: {e}")))?;
        Ok(AmbientState::from(wire))
    }
}

fn classify_reqwest_error(err: &reqwest::Error) -> MoodError {
    if err.is_timeout() {
        MoodError::NetworkUnavailable("request timed out".into())
    } else if err.is_connect() {
        MoodError::NetworkUnavailable(format!("service not reachable: {err}"))
    } else {
        MoodError::NetworkUnavailable(format!("transport error: {err}"))
    }
}
