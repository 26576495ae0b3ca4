//! Game settings and preferences
//!
//! Held in memory only. The page (or the native binary) may hand in a JSON
//! document; any field it leaves out keeps its default.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Delays driving the session choreography (milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Reel snap to value selection
    pub settle_ms: f64,
    /// Both values set to sum check
    pub evaluation_ms: f64,
    /// Match to win clip request
    pub render_settle_ms: f64,
    /// Sync message hold after the clip
    pub sync_hold_ms: f64,
    /// Transition out to the next level
    pub transition_out_ms: f64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            settle_ms: SETTLE_DELAY_MS,
            evaluation_ms: EVALUATION_DELAY_MS,
            render_settle_ms: RENDER_SETTLE_MS,
            sync_hold_ms: SYNC_HOLD_MS,
            transition_out_ms: TRANSITION_OUT_MS,
        }
    }
}

impl Timings {
    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("timings.settle_ms", self.settle_ms),
            ("timings.evaluation_ms", self.evaluation_ms),
            ("timings.render_settle_ms", self.render_settle_ms),
            ("timings.sync_hold_ms", self.sync_hold_ms),
            ("timings.transition_out_ms", self.transition_out_ms),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("{value} is not a non-negative duration"),
                });
            }
        }
        Ok(())
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Mute all sound
    pub muted: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Random background beeps and swooshes while playing
    pub ambient_sounds: bool,

    // === Input ===
    /// Degrees of reel rotation per pixel of drag
    pub reel_sensitivity: f64,

    // === Session ===
    /// Fixed RNG seed (random per page load when unset)
    pub seed: Option<u64>,
    /// Choreography delays
    pub timings: Timings,

    // === Media ===
    /// Element id of the win clip `<video>`
    pub win_clip_element: String,
    /// Looping background music URL
    pub music_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Audio
            muted: false,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.5,
            ambient_sounds: true,

            // Input
            reel_sensitivity: REEL_SENSITIVITY,

            // Session
            seed: None,
            timings: Timings::default(),

            // Media
            win_clip_element: "win-clip".to_string(),
            music_url: None,
        }
    }
}

impl Settings {
    /// Parse settings from a (possibly partial) JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut settings: Settings = serde_json::from_str(json)?;
        settings.master_volume = settings.master_volume.clamp(0.0, 1.0);
        settings.sfx_volume = settings.sfx_volume.clamp(0.0, 1.0);
        settings.music_volume = settings.music_volume.clamp(0.0, 1.0);
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.reel_sensitivity.is_finite() || self.reel_sensitivity <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "reel_sensitivity",
                reason: format!("{} must be a positive number", self.reel_sensitivity),
            });
        }
        if self.win_clip_element.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "win_clip_element",
                reason: "element id is empty".to_string(),
            });
        }
        self.timings.validate()
    }

    /// Element id holding the page-supplied config block
    #[cfg(target_arch = "wasm32")]
    const CONFIG_ELEMENT: &'static str = "reel-sync-config";

    /// Read settings from the page's config block (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let json = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(Self::CONFIG_ELEMENT))
            .and_then(|el| el.text_content());

        let Some(json) = json else {
            log::info!("Using default settings");
            return Self::default();
        };

        match Self::from_json(&json) {
            Ok(settings) => {
                log::info!("Loaded settings from page config");
                settings
            }
            Err(e) => {
                log::warn!("Ignoring page config: {}", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{ "muted": true, "seed": 7 }"#).unwrap();
        assert!(settings.muted);
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.reel_sensitivity, REEL_SENSITIVITY);
        assert_eq!(settings.timings, Timings::default());
    }

    #[test]
    fn test_partial_timings() {
        let settings = Settings::from_json(r#"{ "timings": { "sync_hold_ms": 10 } }"#).unwrap();
        assert_eq!(settings.timings.sync_hold_ms, 10.0);
        assert_eq!(settings.timings.settle_ms, SETTLE_DELAY_MS);
    }

    #[test]
    fn test_volumes_are_clamped() {
        let settings = Settings::from_json(r#"{ "master_volume": 3.0, "sfx_volume": -1 }"#).unwrap();
        assert_eq!(settings.master_volume, 1.0);
        assert_eq!(settings.sfx_volume, 0.0);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = Settings::from_json(r#"{ "reel_sensitivity": 0 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { field: "reel_sensitivity", .. }
        ));

        let err = Settings::from_json(r#"{ "timings": { "settle_ms": -5 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_malformed_json() {
        let err = Settings::from_json("{ muted: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
