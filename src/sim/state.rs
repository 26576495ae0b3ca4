//! Session state and collaborator commands
//!
//! `GameSession` is the view-model the page renders from. `Command`s are the
//! only way the core talks to the audio and video collaborators.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::reel::{Reel, is_active, segment_opacity};

/// Which screen is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum View {
    #[default]
    Menu,
    Playing,
}

/// Current phase of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for both reels to be set
    #[default]
    Idle,
    /// Both reels set, sum check pending
    Evaluating,
    /// Sum did not match
    Result,
    /// Correct pair found, win sequence running
    Winning,
}

/// Steps of the win sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinStage {
    /// Match detected, clip request pending
    Starting,
    /// Clip requested or playing
    ClipPlaying,
    /// Clip could not start; waiting for the player to press force-play
    AwaitingForcePlay,
    /// Sync message on screen
    SyncHold,
    /// Fading out to the next level
    TransitionOut,
}

/// Status line shown under the target display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusMessage {
    #[default]
    AwaitingInput,
    Scanning,
    SessionRebooted,
    Verifying,
    Mismatch,
    SyncEstablished,
    /// Carries the level being entered
    AccessingSector(u32),
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusMessage::AwaitingInput => write!(f, "AWAITING_INPUT..."),
            StatusMessage::Scanning => write!(f, "SCANNING_FOR_FRAGMENTS..."),
            StatusMessage::SessionRebooted => write!(f, "SESSION_REBOOTED_LEVEL_01"),
            StatusMessage::Verifying => write!(f, "VERIFYING_SUM..."),
            StatusMessage::Mismatch => write!(f, "SYNC_FAILED_RETRY"),
            StatusMessage::SyncEstablished => write!(f, "Sync successfully established"),
            StatusMessage::AccessingSector(level) => {
                write!(f, "ACCESSING SECTOR: DATA_CORE_{:02}", level)
            }
        }
    }
}

/// Fire-and-forget requests for the audio collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioCommand {
    PlaySelectionCue,
    PlaySuccessCue,
    PlayTransitionCue,
    SetAmbientLoop(bool),
    SetMusicLoop(bool),
}

/// Everything the session asks its collaborators to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Audio(AudioCommand),
    /// Start the win clip; report back with the same token (fresh per attempt)
    PlayWinClip { token: u64, muted: bool },
}

/// Session view-model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    /// Current level (1-based)
    pub level: u32,
    pub view: View,
    pub phase: GamePhase,
    pub reel1_value: Option<u32>,
    pub reel2_value: Option<u32>,
    /// Correct pair found; reels are locked
    pub is_winner: bool,
    /// Progress through the win sequence
    pub win_stage: Option<WinStage>,
    /// Show the force-play button (win clip failed to start)
    pub force_play_available: bool,
    pub message: StatusMessage,
    /// Bumped on every new challenge and on leaving to the menu
    pub generation: u64,
}

impl Default for GameSession {
    fn default() -> Self {
        Self {
            level: 1,
            view: View::Menu,
            phase: GamePhase::Idle,
            reel1_value: None,
            reel2_value: None,
            is_winner: false,
            win_stage: None,
            force_play_available: false,
            message: StatusMessage::AwaitingInput,
            generation: 0,
        }
    }
}

impl GameSession {
    /// Both reel values, once both are set
    pub fn selected_pair(&self) -> Option<(u32, u32)> {
        Some((self.reel1_value?, self.reel2_value?))
    }
}

/// One painted reel segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentView {
    pub value: u32,
    /// Angle of this segment on the drum (degrees)
    pub angle: f64,
    /// Angular distance from the center line (degrees)
    pub distance: f64,
    pub opacity: f64,
    pub active: bool,
}

/// Render data for one reel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelView {
    pub rotation_degrees: f64,
    pub velocity: f64,
    pub dragging: bool,
    pub locked: bool,
    /// Motion blur radius (px)
    pub blur: f64,
    pub segments: Vec<SegmentView>,
}

impl ReelView {
    pub fn from_reel(reel: &Reel) -> Self {
        let segments = reel
            .display_values()
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                let distance = reel.segment_distance(i);
                SegmentView {
                    value,
                    angle: i as f64 * crate::consts::ANGLE_STEP,
                    distance,
                    opacity: segment_opacity(distance),
                    active: is_active(distance),
                }
            })
            .collect();

        Self {
            rotation_degrees: reel.rotation_degrees,
            velocity: reel.velocity,
            dragging: reel.dragging,
            locked: reel.is_locked(),
            blur: reel.motion_blur(),
            segments,
        }
    }
}

/// Everything the page needs to draw a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub session: GameSession,
    pub target_sum: u32,
    /// Rendered status line
    pub message: String,
    pub reels: [ReelView; 2],
    /// Increments whenever anything above changed
    pub revision: u64,
}

impl SessionView {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text() {
        assert_eq!(
            StatusMessage::AccessingSector(2).to_string(),
            "ACCESSING SECTOR: DATA_CORE_02"
        );
        assert_eq!(
            StatusMessage::AccessingSector(12).to_string(),
            "ACCESSING SECTOR: DATA_CORE_12"
        );
        assert_eq!(StatusMessage::Scanning.to_string(), "SCANNING_FOR_FRAGMENTS...");
    }

    #[test]
    fn test_selected_pair() {
        let mut session = GameSession::default();
        assert_eq!(session.selected_pair(), None);
        session.reel2_value = Some(4);
        assert_eq!(session.selected_pair(), None);
        session.reel1_value = Some(3);
        assert_eq!(session.selected_pair(), Some((3, 4)));
    }

    #[test]
    fn test_reel_view_segments() {
        let mut reel = Reel::default();
        reel.bind(&[5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16]);
        let view = ReelView::from_reel(&reel);
        assert_eq!(view.segments.len(), 12);
        assert_eq!(view.segments[0].value, 5);
        assert!(view.segments[0].active);
        assert_eq!(view.segments[6].opacity, 0.0);
        assert_eq!(view.blur, 0.0);
    }
}
