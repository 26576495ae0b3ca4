//! Game session state machine
//!
//! Owns the current challenge, both reels and the choreography timers. The
//! page feeds it pointer samples, media callbacks and `update(now)` once per
//! frame; it answers with view state and a queue of collaborator commands.
//!
//! Phase flow per level:
//! `Idle → Evaluating → Result` on a wrong pair, or
//! `Idle → Evaluating → Winning → Idle` (next level) on the right one.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::capture::PointerCapture;
use super::challenge::{self, Challenge};
use super::reel::{Reel, ReelId};
use super::scheduler::{Scheduler, Timer};
use super::state::{
    AudioCommand, Command, GamePhase, GameSession, ReelView, SessionView, StatusMessage, View,
    WinStage,
};
use crate::error::MediaError;
use crate::settings::{Settings, Timings};

/// Deferred session steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    /// Compare the sum; only the latest evaluation counts
    Evaluate { seq: u64 },
    /// Ask the video collaborator for the win clip
    StartClip,
    /// Sync message done, start fading out
    BeginTransitionOut,
    /// Advance to the next level
    FinishWin,
}

/// The game session
#[derive(Debug, Clone)]
pub struct Session {
    state: GameSession,
    challenge: Challenge,
    reels: [Reel; 2],
    capture: PointerCapture,
    scheduler: Scheduler<Task>,
    rng: Pcg32,
    timings: Timings,
    muted: bool,
    ambient_sounds: bool,
    /// Current clip attempt was started by the force-play button
    forced_clip: bool,
    /// Last clip token handed out; every attempt gets a fresh one
    clip_seq: u64,
    /// Token of the clip attempt the session is waiting on
    active_clip: Option<u64>,
    /// Sequence number of the latest scheduled evaluation
    eval_seq: u64,
    commands: Vec<Command>,
    revision: u64,
}

impl Session {
    /// Create a session on the menu screen with a level 1 challenge ready
    pub fn new(settings: &Settings, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let challenge = challenge::generate(1, &mut rng);
        let reel = Reel::new(settings.reel_sensitivity, settings.timings.settle_ms);

        let mut session = Self {
            state: GameSession::default(),
            challenge,
            reels: [reel.clone(), reel],
            capture: PointerCapture::default(),
            scheduler: Scheduler::new(),
            rng,
            timings: settings.timings,
            muted: settings.muted,
            ambient_sounds: settings.ambient_sounds,
            forced_clip: false,
            clip_seq: 0,
            active_clip: None,
            eval_seq: 0,
            commands: Vec::new(),
            revision: 0,
        };
        session.bind_reels();
        session
    }

    // === Accessors ===

    pub fn state(&self) -> &GameSession {
        &self.state
    }

    pub fn challenge(&self) -> &Challenge {
        &self.challenge
    }

    pub fn reel(&self, id: ReelId) -> &Reel {
        &self.reels[id.index()]
    }

    pub fn capture(&self) -> PointerCapture {
        self.capture
    }

    /// Increments on every observable change
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Take the commands queued since the last call
    pub fn drain_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Snapshot for the presentation layer
    pub fn view(&self) -> SessionView {
        SessionView {
            session: self.state.clone(),
            target_sum: self.challenge.target_sum,
            message: self.state.message.to_string(),
            reels: [
                ReelView::from_reel(&self.reels[0]),
                ReelView::from_reel(&self.reels[1]),
            ],
            revision: self.revision,
        }
    }

    // === Session lifecycle ===

    /// Enter play at the current level with a fresh challenge
    pub fn start_game(&mut self) {
        log::info!("Game started at level {}", self.state.level);
        self.state.view = View::Playing;
        self.new_challenge();
        self.audio(AudioCommand::SetMusicLoop(true));
        if self.ambient_sounds {
            self.audio(AudioCommand::SetAmbientLoop(true));
        }
    }

    /// Back to level 1 with a fresh challenge
    pub fn reset_game(&mut self) {
        log::info!("Session reset from level {}", self.state.level);
        self.state.level = 1;
        self.new_challenge();
        self.state.message = StatusMessage::SessionRebooted;
    }

    /// Leave to the menu; anything still scheduled is abandoned
    pub fn return_to_menu(&mut self) {
        log::info!("Returning to menu");
        self.state.view = View::Menu;
        self.state.generation += 1;
        self.active_clip = None;
        self.audio(AudioCommand::SetAmbientLoop(false));
        self.audio(AudioCommand::SetMusicLoop(false));
        self.touch();
    }

    fn new_challenge(&mut self) {
        self.state.generation += 1;
        self.challenge = challenge::generate(self.state.level, &mut self.rng);
        self.bind_reels();

        self.state.reel1_value = None;
        self.state.reel2_value = None;
        self.state.is_winner = false;
        self.state.win_stage = None;
        self.state.force_play_available = false;
        self.state.phase = GamePhase::Idle;
        self.state.message = StatusMessage::Scanning;
        self.forced_clip = false;
        self.active_clip = None;
        self.touch();
    }

    fn bind_reels(&mut self) {
        self.reels[0].bind(&self.challenge.numbers1);
        self.reels[1].bind(&self.challenge.numbers2);
        for reel in &mut self.reels {
            reel.set_locked(false);
        }
    }

    // === Pointer input ===

    /// Pointer pressed on `reel`
    pub fn pointer_down(&mut self, reel: ReelId, y: f64, now: f64) {
        if self.state.view != View::Playing || self.capture.is_capturing() {
            return;
        }
        if self.reels[reel.index()].drag_start(y, now) {
            self.capture.begin(reel);
            self.touch();
        } else {
            log::debug!("{:?} reel is locked, drag ignored", reel);
        }
    }

    /// Pointer moved anywhere on the page
    pub fn pointer_move(&mut self, y: f64, now: f64) {
        if let Some(reel) = self.capture.target() {
            self.reels[reel.index()].drag_move(y, now);
            self.touch();
        }
    }

    /// Pointer released anywhere on the page
    pub fn pointer_up(&mut self, now: f64) {
        if let Some(reel) = self.capture.release() {
            self.reels[reel.index()].drag_end(now);
            self.touch();
        }
    }

    // === Events ===

    /// A reel settled on `value` at time `at`
    pub fn on_reel_selection(&mut self, reel: ReelId, value: u32, at: f64) {
        if self.state.view != View::Playing {
            log::debug!("Selection {} ignored outside play", value);
            return;
        }
        if self.state.is_winner {
            log::debug!("Selection {} ignored, reels are locked", value);
            return;
        }

        match reel {
            ReelId::First => self.state.reel1_value = Some(value),
            ReelId::Second => self.state.reel2_value = Some(value),
        }
        self.audio(AudioCommand::PlaySelectionCue);

        if self.state.selected_pair().is_some() {
            self.state.phase = GamePhase::Evaluating;
            self.state.message = StatusMessage::Verifying;
            self.eval_seq += 1;
            let seq = self.eval_seq;
            self.schedule(at + self.timings.evaluation_ms, Task::Evaluate { seq });
        } else {
            log::debug!("{:?} reel set to {}, waiting on {:?}", reel, value, reel.other());
            self.state.phase = GamePhase::Idle;
        }
        self.touch();
    }

    /// The video collaborator answered a `PlayWinClip` request
    pub fn on_clip_started(&mut self, token: u64, result: Result<(), MediaError>, at: f64) {
        if !self.clip_in_flight(token) {
            log::debug!("Ignoring stale clip start (token {})", token);
            return;
        }

        match result {
            Ok(()) => self.audio(AudioCommand::PlaySuccessCue),
            Err(e) if self.forced_clip => {
                log::warn!("Win clip failed again ({}), continuing without it", e);
                self.finish_clip(at);
            }
            Err(e) => {
                log::warn!("Win clip could not start ({}), waiting for force play", e);
                self.state.win_stage = Some(WinStage::AwaitingForcePlay);
                self.state.force_play_available = true;
                self.touch();
            }
        }
    }

    /// The win clip finished or errored while playing
    pub fn on_clip_ended(&mut self, token: u64, at: f64) {
        if !self.clip_in_flight(token) {
            log::debug!("Ignoring clip end (token {})", token);
            return;
        }
        self.finish_clip(at);
    }

    /// Player pressed the force-play button; returns false if it was not offered
    pub fn force_play(&mut self) -> bool {
        if self.state.win_stage != Some(WinStage::AwaitingForcePlay) {
            return false;
        }
        log::info!("Force playing win clip");
        self.forced_clip = true;
        self.state.force_play_available = false;
        self.state.win_stage = Some(WinStage::ClipPlaying);
        self.request_clip(self.muted);
        self.touch();
        true
    }

    /// Advance timers and settle reels up to `now`.
    ///
    /// Due events are handled in deadline order, each at its own due time, so
    /// a late frame produces the same result as many punctual ones.
    pub fn update(&mut self, now: f64) {
        loop {
            let reel_due = ReelId::ALL
                .into_iter()
                .filter_map(|id| self.reels[id.index()].pending_due().map(|due| (due, id)))
                .min_by(|a, b| a.0.total_cmp(&b.0));
            let task_due = self.scheduler.next_due();

            match (reel_due, task_due) {
                (Some((due, id)), task) if due <= now && task.is_none_or(|t| due <= t) => {
                    if let Some(selection) = self.reels[id.index()].poll_selection(due) {
                        self.on_reel_selection(id, selection.value, due);
                    }
                }
                (_, Some(due)) if due <= now => {
                    if let Some(timer) = self.scheduler.pop_due(due) {
                        self.fire(timer);
                    }
                }
                _ => break,
            }
        }
    }

    // === Internals ===

    fn fire(&mut self, timer: Timer<Task>) {
        if timer.token != self.state.generation {
            log::debug!(
                "Dropping stale {:?} (token {}, now {})",
                timer.task,
                timer.token,
                self.state.generation
            );
            return;
        }

        let at = timer.due;
        match timer.task {
            Task::Evaluate { seq } => self.evaluate(seq, at),
            Task::StartClip => {
                if self.state.win_stage == Some(WinStage::Starting) {
                    self.state.win_stage = Some(WinStage::ClipPlaying);
                    // Autoplay without a user gesture is only allowed muted
                    self.request_clip(true);
                    self.touch();
                }
            }
            Task::BeginTransitionOut => {
                self.state.win_stage = Some(WinStage::TransitionOut);
                self.state.message = StatusMessage::AccessingSector(self.state.level + 1);
                self.schedule(at + self.timings.transition_out_ms, Task::FinishWin);
                self.touch();
            }
            Task::FinishWin => {
                self.state.level += 1;
                log::info!("Advancing to level {}", self.state.level);
                self.new_challenge();
            }
        }
    }

    fn evaluate(&mut self, seq: u64, at: f64) {
        if seq != self.eval_seq || self.state.phase != GamePhase::Evaluating {
            return;
        }
        let Some((a, b)) = self.state.selected_pair() else {
            return;
        };

        if self.challenge.is_solution(a, b) {
            log::info!("Sync found: {} + {} = {}", a, b, self.challenge.target_sum);
            self.begin_win(at);
        } else {
            log::info!("{} + {} != {}", a, b, self.challenge.target_sum);
            self.state.phase = GamePhase::Result;
            self.state.message = StatusMessage::Mismatch;
            self.touch();
        }
    }

    fn begin_win(&mut self, at: f64) {
        self.state.is_winner = true;
        self.state.phase = GamePhase::Winning;
        self.state.win_stage = Some(WinStage::Starting);
        for reel in &mut self.reels {
            reel.set_locked(true);
        }
        if self.ambient_sounds {
            self.audio(AudioCommand::SetAmbientLoop(false));
        }
        self.schedule(at + self.timings.render_settle_ms, Task::StartClip);
        self.touch();
    }

    fn finish_clip(&mut self, at: f64) {
        self.state.force_play_available = false;
        if self.ambient_sounds {
            self.audio(AudioCommand::SetAmbientLoop(true));
        }
        self.state.message = StatusMessage::SyncEstablished;
        self.audio(AudioCommand::PlayTransitionCue);
        self.state.win_stage = Some(WinStage::SyncHold);
        self.schedule(at + self.timings.sync_hold_ms, Task::BeginTransitionOut);
        self.touch();
    }

    fn request_clip(&mut self, muted: bool) {
        self.clip_seq += 1;
        self.active_clip = Some(self.clip_seq);
        self.commands.push(Command::PlayWinClip {
            token: self.clip_seq,
            muted,
        });
    }

    /// A clip callback for `token` belongs to the clip currently playing
    fn clip_in_flight(&self, token: u64) -> bool {
        self.active_clip == Some(token)
            && self.state.view == View::Playing
            && self.state.win_stage == Some(WinStage::ClipPlaying)
    }

    fn schedule(&mut self, due: f64, task: Task) {
        self.scheduler.schedule(due, self.state.generation, task);
    }

    /// Queue an audio command; one-shot cues are skipped while muted
    fn audio(&mut self, command: AudioCommand) {
        let is_cue = matches!(
            command,
            AudioCommand::PlaySelectionCue
                | AudioCommand::PlaySuccessCue
                | AudioCommand::PlayTransitionCue
        );
        if is_cue && self.muted {
            return;
        }
        self.commands.push(Command::Audio(command));
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}
