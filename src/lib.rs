//! Reel Sync - a two-reel number puzzle
//!
//! Core modules:
//! - `sim`: Deterministic game core (challenges, reels, session state machine)
//! - `audio`: Mixer, ambience scheduling and Web Audio synthesis
//! - `media`: Win clip playback on the web
//! - `settings`: Runtime configuration
//! - `error`: Error types for media and configuration

pub mod audio;
pub mod error;
#[cfg(target_arch = "wasm32")]
pub mod media;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, MediaError};
pub use settings::{Settings, Timings};

/// Game configuration constants
pub mod consts {
    /// Number of segments (and values) on each reel
    pub const SEGMENT_COUNT: usize = 12;
    /// Angle between two neighbouring reel segments (degrees)
    pub const ANGLE_STEP: f64 = 30.0;
    /// Degrees of reel rotation per pixel of vertical drag
    pub const REEL_SENSITIVITY: f64 = 0.42;

    /// Segments closer than this to the center are drawn as active
    pub const ACTIVE_SEGMENT_DEGREES: f64 = 15.0;
    /// Segments farther than this from the center are hidden
    pub const VISIBLE_SEGMENT_DEGREES: f64 = 95.0;
    /// Fade divisor for segments between active and hidden
    pub const SEGMENT_FADE_DEGREES: f64 = 110.0;
    /// Velocity (px/ms) above which the reel is motion blurred
    pub const BLUR_VELOCITY_THRESHOLD: f64 = 0.08;
    /// Maximum motion blur radius (px)
    pub const MAX_BLUR_PX: f64 = 1.4;

    /// Pause between a reel snapping and its value being selected (ms)
    pub const SETTLE_DELAY_MS: f64 = 150.0;
    /// Pause between both reels being set and the sum being checked (ms)
    pub const EVALUATION_DELAY_MS: f64 = 800.0;
    /// Pause before the win clip is requested, lets the win frame render (ms)
    pub const RENDER_SETTLE_MS: f64 = 50.0;
    /// How long the sync message stays up after the win clip (ms)
    pub const SYNC_HOLD_MS: f64 = 4000.0;
    /// Length of the transition out to the next level (ms)
    pub const TRANSITION_OUT_MS: f64 = 1000.0;

    /// Ambient cue interval bounds (ms)
    pub const AMBIENT_MIN_INTERVAL_MS: f64 = 8000.0;
    pub const AMBIENT_MAX_INTERVAL_MS: f64 = 15000.0;
}

/// Wrap an angle in degrees to [0, 360)
#[inline]
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Signed angle in degrees wrapped to (-180, 180]
#[inline]
pub fn signed_degrees(angle: f64) -> f64 {
    let wrapped = wrap_degrees(angle);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(0.0), 0.0);
        assert_eq!(wrap_degrees(390.0), 30.0);
        assert_eq!(wrap_degrees(-30.0), 330.0);
        assert_eq!(wrap_degrees(-720.0), 0.0);
    }

    #[test]
    fn test_signed_degrees() {
        assert_eq!(signed_degrees(190.0), -170.0);
        assert_eq!(signed_degrees(-190.0), 170.0);
        assert_eq!(signed_degrees(180.0), 180.0);
        assert_eq!(signed_degrees(45.0), 45.0);
    }
}
