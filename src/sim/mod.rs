//! Deterministic game core
//!
//! All gameplay logic lives here. This module must stay pure:
//! - Caller-supplied timestamps only (no clock reads)
//! - Seeded RNG only
//! - No DOM, audio or video dependencies; collaborators receive `Command`s

pub mod capture;
pub mod challenge;
pub mod reel;
pub mod scheduler;
pub mod session;
pub mod state;

pub use capture::PointerCapture;
pub use challenge::{Challenge, generate};
pub use reel::{Reel, ReelId};
pub use scheduler::Scheduler;
pub use session::Session;
pub use state::{
    AudioCommand, Command, GamePhase, GameSession, ReelView, SegmentView, SessionView,
    StatusMessage, View, WinStage,
};
