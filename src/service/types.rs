//! Wire types for the mood analysis service.

use serde::{Deserialize, Serialize};

use moodnest_scene::{Mood, Rgb};

/// Endpoint family a voice session submits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Single-shot classification.
    #[default]
    Quick,
    /// Dialogue-style analysis with a spoken reply and confirmation gating.
    Conversation,
}

impl AnalysisMode {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Quick => "/analyze-voice",
            Self::Conversation => "/analyze-voice-conversation",
        }
    }
}

impl std::str::FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" => Ok(Self::Quick),
            "conversation" => Ok(Self::Conversation),
            other => Err(format!("unknown analysis mode `{other}`")),
        }
    }
}

/// Response of either analysis endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AnalysisResult {
    pub success: bool,
    #[serde(default)]
    pub detected_mood: Option<String>,
    /// Classifier confidence in `0.0..=1.0`.
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub ai_response: Option<String>,
    /// Base64 synthesised reply.
    #[serde(default)]
    pub audio: Option<String>,
    #[serde(default)]
    pub awaiting_confirmation: Option<bool>,
    #[serde(default)]
    pub pending_mood: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AnalysisResult {
    pub fn is_awaiting_confirmation(&self) -> bool {
        self.awaiting_confirmation.unwrap_or(false)
    }

    /// Confidence rounded to a whole percentage.
    pub fn confidence_percent(&self) -> Option<u8> {
        self.confidence
            .filter(|c| c.is_finite())
            .map(|c| (c.clamp(0.0, 1.0) * 100.0).round() as u8)
    }

    /// Non-empty synthesised reply payload, if any.
    pub fn reply_audio(&self) -> Option<&str> {
        self.audio.as_deref().filter(|a| !a.trim().is_empty())
    }
}

/// Playable track attached to the ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TrackRef {
    AudioUrl(String),
    YouTube(String),
    Named(String),
}

/// `/state` response as sent by the service. Every field is optional
/// because the shape has drifted between backend versions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireState {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub intensity: Option<f32>,
    #[serde(default)]
    pub youtube_id: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub vibe_details: Option<VibeDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VibeDetails {
    #[serde(default)]
    pub track: Option<String>,
}

/// Passively polled, session-independent mood descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct AmbientState {
    pub color: Rgb,
    pub label: String,
    pub intensity: Option<f32>,
    pub track: Option<TrackRef>,
}

impl Default for AmbientState {
    fn default() -> Self {
        let neutral = Mood::Neutral.preset();
        Self {
            color: neutral.color,
            label: Mood::Neutral.as_str().to_owned(),
            intensity: None,
            track: None,
        }
    }
}

impl From<WireState> for AmbientState {
    fn from(wire: WireState) -> Self {
        let neutral = Mood::Neutral.preset();
        let color = wire
            .color
            .as_deref()
            .and_then(Rgb::parse_hex)
            .unwrap_or(neutral.color);

        let non_empty = |s: Option<String>| s.filter(|v| !v.trim().is_empty());
        let track = non_empty(wire.audio_url)
            .map(TrackRef::AudioUrl)
            .or_else(|| non_empty(wire.youtube_id).map(TrackRef::YouTube))
            .or_else(|| non_empty(wire.vibe_details.and_then(|d| d.track)).map(TrackRef::Named));

        Self {
            color,
            label: wire.label.unwrap_or_default(),
            intensity: wire.intensity.filter(|i| i.is_finite() && *i >= 0.0),
            track,
        }
    }
}

impl AmbientState {
    /// The mood this state names, if its label is a known mood.
    pub fn mood(&self) -> Option<Mood> {
        Mood::parse(&self.label)
    }
}
