//! Mood labels and their lighting presets.
//!
//! The preset table is an exhaustive `match` over [`Mood`]; any label that
//! does not name a known mood resolves to [`Mood::Neutral`], so preset lookup
//! is total.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::color::Rgb;

/// Emotional state detected from the user's voice.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Angry,
    #[default]
    Neutral,
}

/// Colour and light intensity applied to every fixture for a mood.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MoodPreset {
    pub color: Rgb,
    pub intensity: f32,
}

impl MoodPreset {
    pub fn new(color: Rgb, intensity: f32) -> Self {
        Self { color, intensity }
    }
}

impl Mood {
    pub const ALL: [Mood; 4] = [Mood::Happy, Mood::Sad, Mood::Angry, Mood::Neutral];

    /// Strict parse: `None` for labels that are not a known mood.
    ///
    /// Matching ignores surrounding whitespace and ASCII case.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "happy" => Some(Self::Happy),
            "sad" => Some(Self::Sad),
            "angry" => Some(Self::Angry),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }

    /// Total lookup: unknown labels fall back to [`Mood::Neutral`].
    pub fn from_label(label: &str) -> Self {
        Self::parse(label).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Neutral => "neutral",
        }
    }

    pub fn preset(&self) -> MoodPreset {
        match self {
            Self::Happy => MoodPreset::new(Rgb::from_hex(0xffcc80), 1.8),
            Self::Sad => MoodPreset::new(Rgb::from_hex(0x1a237e), 0.6),
            Self::Angry => MoodPreset::new(Rgb::from_hex(0xff0055), 2.5),
            Self::Neutral => MoodPreset::new(Rgb::from_hex(0xffffff), 1.0),
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
