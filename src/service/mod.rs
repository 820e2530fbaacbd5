//! Client for the remote mood analysis service.

pub mod http;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;

pub use http::HttpMoodService;
pub use types::{AmbientState, AnalysisMode, AnalysisResult, TrackRef};

/// Remote analysis and ambient-state endpoints.
#[async_trait]
pub trait MoodService: Send + Sync {
    /// Uploads a WAV recording to the endpoint for `mode`.
    ///
    /// A `success: false` body is returned as `Ok`; transport failures and
    /// non-2xx responses are errors.
    async fn analyze(&self, mode: AnalysisMode, wav: Vec<u8>) -> Result<AnalysisResult>;

    /// Fetches the shared ambient state.
    async fn fetch_state(&self) -> Result<AmbientState>;
}
