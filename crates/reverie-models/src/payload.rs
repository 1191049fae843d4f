//! Export job payload.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Default output duration in seconds when the client does not ask for one.
pub const DEFAULT_DURATION_SEC: u32 = 10;

/// Logical role of an input asset in the composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssetRole {
    /// Upper base layer.
    Sky,
    /// Lower base layer, blended with the sky.
    Ground,
    /// Optional layer composited on top of the blended background.
    Overlay,
    /// Optional audio track attached to the output.
    Audio,
}

impl AssetRole {
    /// Conventional file name for this role inside a job workspace.
    pub fn file_name(&self) -> &'static str {
        match self {
            AssetRole::Sky => "sky.mp4",
            AssetRole::Ground => "ground.mp4",
            AssetRole::Overlay => "overlay.webm",
            AssetRole::Audio => "audio.mp3",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetRole::Sky => "sky",
            AssetRole::Ground => "ground",
            AssetRole::Overlay => "overlay",
            AssetRole::Audio => "audio",
        }
    }
}

impl fmt::Display for AssetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input description for one export job. Immutable once the job is created.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct ExportPayload {
    /// URL of the sky layer (required).
    #[validate(url)]
    pub sky_url: String,

    /// URL of the ground layer (required).
    #[validate(url)]
    pub ground_url: String,

    /// URL of the overlay layer (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub overlay_url: Option<String>,

    /// URL of the audio track (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub audio_url: Option<String>,

    /// Target output duration in seconds.
    #[serde(default = "default_duration")]
    pub duration_sec: u32,
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_SEC
}

impl ExportPayload {
    /// Create a payload with only the two required base layers.
    pub fn new(sky_url: impl Into<String>, ground_url: impl Into<String>) -> Self {
        Self {
            sky_url: sky_url.into(),
            ground_url: ground_url.into(),
            overlay_url: None,
            audio_url: None,
            duration_sec: DEFAULT_DURATION_SEC,
        }
    }

    /// Attach an overlay layer.
    pub fn with_overlay(mut self, url: impl Into<String>) -> Self {
        self.overlay_url = Some(url.into());
        self
    }

    /// Attach an audio track.
    pub fn with_audio(mut self, url: impl Into<String>) -> Self {
        self.audio_url = Some(url.into());
        self
    }

    /// Set the target duration.
    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration_sec = seconds;
        self
    }

    /// Enumerate the assets present in this payload with their roles.
    pub fn assets(&self) -> Vec<(AssetRole, &str)> {
        let mut assets = vec![
            (AssetRole::Sky, self.sky_url.as_str()),
            (AssetRole::Ground, self.ground_url.as_str()),
        ];
        if let Some(url) = &self.overlay_url {
            assets.push((AssetRole::Overlay, url.as_str()));
        }
        if let Some(url) = &self.audio_url {
            assets.push((AssetRole::Audio, url.as_str()));
        }
        assets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_defaults() {
        let json = r#"{"sky_url":"https://cdn.example.com/sky.mp4","ground_url":"https://cdn.example.com/ground.mp4"}"#;
        let payload: ExportPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.duration_sec, DEFAULT_DURATION_SEC);
        assert!(payload.overlay_url.is_none());
        assert!(payload.audio_url.is_none());
    }

    #[test]
    fn test_payload_assets_enumeration() {
        let base = ExportPayload::new("https://a/sky.mp4", "https://a/ground.mp4");
        assert_eq!(base.assets().len(), 2);

        let full = base
            .clone()
            .with_overlay("https://a/overlay.webm")
            .with_audio("https://a/audio.mp3");
        let assets = full.assets();
        assert_eq!(assets.len(), 4);
        assert_eq!(assets[2].0, AssetRole::Overlay);
        assert_eq!(assets[3].0, AssetRole::Audio);
    }

    #[test]
    fn test_payload_validation() {
        use validator::Validate;

        let ok = ExportPayload::new("https://a/sky.mp4", "https://a/ground.mp4");
        assert!(ok.validate().is_ok());

        let bad = ExportPayload::new("not a url", "https://a/ground.mp4");
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_role_file_names() {
        assert_eq!(AssetRole::Sky.file_name(), "sky.mp4");
        assert_eq!(AssetRole::Overlay.file_name(), "overlay.webm");
        assert_eq!(AssetRole::Audio.file_name(), "audio.mp3");
    }
}
