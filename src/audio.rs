//! Audio collaborator
//!
//! Procedurally generated cues via the Web Audio API, plus an optional looped
//! music track. The mixer and the ambience scheduler are plain Rust so they
//! work (and are tested) off the web as well.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::{AMBIENT_MAX_INTERVAL_MS, AMBIENT_MIN_INTERVAL_MS};
use crate::settings::Settings;

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// Reel settled on a value - mechanical lock thump
    Selection,
    /// Correct pair - rising major chord
    Success,
    /// Sync established - link sweep
    Transition,
    /// Ambience - faint far-away beep
    DistantBeep,
    /// Ambience - low door swoosh
    DoorSwoosh,
}

/// Volume and mute state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioMixer {
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
}

impl Default for AudioMixer {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl AudioMixer {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            master_volume: settings.master_volume.clamp(0.0, 1.0),
            sfx_volume: settings.sfx_volume.clamp(0.0, 1.0),
            music_volume: settings.music_volume.clamp(0.0, 1.0),
            muted: settings.muted,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Effective cue volume
    pub fn sfx(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Effective music volume
    pub fn music(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.music_volume
        }
    }
}

/// Random ambience while playing.
///
/// Ticks on a fixed interval (drawn once per start, 8-15 s). Each tick plays
/// a distant beep (30%), a door swoosh (20%) or nothing.
#[derive(Debug, Clone)]
pub struct AmbientLoop {
    rng: Pcg32,
    interval: f64,
    next_due: Option<f64>,
}

impl AmbientLoop {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            interval: AMBIENT_MIN_INTERVAL_MS,
            next_due: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Start or stop the loop; starting twice keeps the running schedule
    pub fn set_running(&mut self, running: bool, now: f64) {
        match (running, self.next_due) {
            (true, None) => {
                self.interval = self
                    .rng
                    .random_range(AMBIENT_MIN_INTERVAL_MS..AMBIENT_MAX_INTERVAL_MS);
                self.next_due = Some(now + self.interval);
            }
            (false, _) => self.next_due = None,
            _ => {}
        }
    }

    /// Cue to play at `now`, if a tick is due and its roll wants one
    pub fn poll(&mut self, now: f64) -> Option<SoundCue> {
        let due = self.next_due?;
        if now < due {
            return None;
        }
        // Skip ticks missed while the page was in the background
        let missed = ((now - due) / self.interval).floor();
        self.next_due = Some(due + (missed + 1.0) * self.interval);

        let roll: f64 = self.rng.random();
        if roll < 0.3 {
            Some(SoundCue::DistantBeep)
        } else if roll < 0.5 {
            Some(SoundCue::DoorSwoosh)
        } else {
            None
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod web {
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{AudioContext, GainNode, HtmlAudioElement, OscillatorNode, OscillatorType};

    use super::{AmbientLoop, AudioMixer, SoundCue};
    use crate::error::MediaError;
    use crate::settings::Settings;
    use crate::sim::AudioCommand;

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        mixer: AudioMixer,
        ambient: AmbientLoop,
        music: Option<HtmlAudioElement>,
        rng: Pcg32,
    }

    impl AudioManager {
        pub fn new(settings: &Settings, seed: u64) -> Self {
            // May fail outside a secure context
            let ctx = match AudioContext::new() {
                Ok(ctx) => Some(ctx),
                Err(e) => {
                    let err = MediaError::AudioUnavailable(format!("{:?}", e));
                    log::warn!("{} - audio disabled", err);
                    None
                }
            };

            let mixer = AudioMixer::from_settings(settings);
            let music = settings.music_url.as_deref().and_then(|url| {
                let el = HtmlAudioElement::new_with_src(url).ok()?;
                el.set_loop(true);
                el.set_volume(mixer.music() as f64);
                Some(el)
            });

            Self {
                ctx,
                mixer,
                ambient: AmbientLoop::new(seed.wrapping_add(1)),
                music,
                rng: Pcg32::seed_from_u64(seed),
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        /// Mute/unmute all audio
        pub fn set_muted(&mut self, muted: bool) {
            self.mixer.set_muted(muted);
            if let Some(music) = &self.music {
                music.set_volume(self.mixer.music() as f64);
            }
        }

        pub fn is_muted(&self) -> bool {
            self.mixer.is_muted()
        }

        /// Carry out a session command
        pub fn apply(&mut self, command: AudioCommand, now: f64) {
            match command {
                AudioCommand::PlaySelectionCue => self.play(SoundCue::Selection),
                AudioCommand::PlaySuccessCue => self.play(SoundCue::Success),
                AudioCommand::PlayTransitionCue => self.play(SoundCue::Transition),
                AudioCommand::SetAmbientLoop(on) => self.ambient.set_running(on, now),
                AudioCommand::SetMusicLoop(on) => self.set_music(on),
            }
        }

        /// Drive the ambience loop (call once per frame)
        pub fn update(&mut self, now: f64) {
            if let Some(cue) = self.ambient.poll(now) {
                self.play(cue);
            }
        }

        fn set_music(&self, on: bool) {
            let Some(music) = &self.music else { return };
            if !on {
                let _ = music.pause();
                return;
            }
            match music.play() {
                Ok(promise) => wasm_bindgen_futures::spawn_local(async move {
                    if let Err(e) = JsFuture::from(promise).await {
                        log::warn!("{}", MediaError::PlaybackRejected(format!("{:?}", e)));
                    }
                }),
                Err(e) => log::warn!("{}", MediaError::PlaybackRejected(format!("{:?}", e))),
            }
        }

        /// Play a sound cue
        pub fn play(&mut self, cue: SoundCue) {
            let vol = self.mixer.sfx();
            if vol <= 0.0 {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match cue {
                SoundCue::Selection => {
                    let variation = self.rng.random_range(0.85..1.15);
                    play_lock_thump(ctx, vol, variation);
                }
                SoundCue::Success => play_success_chord(ctx, vol),
                SoundCue::Transition => play_link_sweep(ctx, vol),
                SoundCue::DistantBeep => {
                    let freq = self.rng.random_range(800.0..1200.0);
                    play_distant_beep(ctx, vol, freq);
                }
                SoundCue::DoorSwoosh => play_door_swoosh(ctx, vol),
            }
        }
    }

    // === Sound generators ===

    /// Create an oscillator with gain envelope
    fn create_osc(
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Mechanical lock - low thump then a metallic click
    fn play_lock_thump(ctx: &AudioContext, vol: f32, variation: f32) {
        let t = ctx.current_time();

        if let Some((osc, gain)) = create_osc(ctx, 80.0 * variation, OscillatorType::Sine) {
            gain.gain().set_value_at_time(vol * 0.4, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.08)
                .ok();
            osc.frequency().set_value_at_time(80.0 * variation, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(40.0 * variation, t + 0.08)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.08).ok();
        }

        if let Some((osc, gain)) = create_osc(ctx, 120.0 * variation, OscillatorType::Square) {
            let t = t + 0.04;
            gain.gain().set_value_at_time(vol * 0.3, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.06)
                .ok();
            osc.frequency().set_value_at_time(120.0 * variation, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(60.0 * variation, t + 0.06)
                .ok();
            osc.start_with_when(t).ok();
            osc.stop_with_when(t + 0.06).ok();
        }
    }

    /// Success - C major arpeggio
    fn play_success_chord(ctx: &AudioContext, vol: f32) {
        for (i, freq) in [523.25, 659.25, 783.99].iter().enumerate() {
            let delay = i as f64 * 0.08;
            if let Some((osc, gain)) = create_osc(ctx, *freq, OscillatorType::Sine) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(0.0, t).ok();
                gain.gain()
                    .linear_ramp_to_value_at_time(vol * 0.25, t + 0.05)
                    .ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.4)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.5).ok();
            }
        }
    }

    /// Link established - upward sweep with a soft fifth on top
    fn play_link_sweep(ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();

        if let Some((osc, gain)) = create_osc(ctx, 220.0, OscillatorType::Triangle) {
            gain.gain().set_value_at_time(0.01, t).ok();
            gain.gain()
                .linear_ramp_to_value_at_time(vol * 0.25, t + 0.15)
                .ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.7)
                .ok();
            osc.frequency().set_value_at_time(220.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(880.0, t + 0.6)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.75).ok();
        }

        if let Some((osc, gain)) = create_osc(ctx, 1318.5, OscillatorType::Sine) {
            let t = t + 0.45;
            gain.gain().set_value_at_time(vol * 0.12, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.5)
                .ok();
            osc.start_with_when(t).ok();
            osc.stop_with_when(t + 0.55).ok();
        }
    }

    /// Distant beep - short quiet sine
    fn play_distant_beep(ctx: &AudioContext, vol: f32, freq: f32) {
        let Some((osc, gain)) = create_osc(ctx, freq, OscillatorType::Sine) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.04, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.001, t + 0.15)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.15).ok();
    }

    /// Door swoosh - falling sawtooth
    fn play_door_swoosh(ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = create_osc(ctx, 200.0, OscillatorType::Sawtooth) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.06, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.001, t + 0.4)
            .ok();
        osc.frequency().set_value_at_time(200.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(80.0, t + 0.4)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.4).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixer_mute() {
        let mut mixer = AudioMixer::default();
        assert!(mixer.sfx() > 0.0);
        mixer.set_muted(true);
        assert_eq!(mixer.sfx(), 0.0);
        assert_eq!(mixer.music(), 0.0);
        mixer.set_muted(false);
        mixer.set_master_volume(2.0);
        mixer.set_sfx_volume(0.5);
        assert_eq!(mixer.sfx(), 0.5);
    }

    #[test]
    fn test_ambient_interval_bounds() {
        let mut ambient = AmbientLoop::new(3);
        assert_eq!(ambient.poll(1e9), None);

        ambient.set_running(true, 0.0);
        assert!(ambient.is_running());
        assert_eq!(ambient.poll(AMBIENT_MIN_INTERVAL_MS - 1.0), None);

        // Exactly one roll per tick
        let due = ambient.next_due.unwrap();
        assert!((AMBIENT_MIN_INTERVAL_MS..AMBIENT_MAX_INTERVAL_MS).contains(&due));
        ambient.poll(due);
        assert_eq!(ambient.next_due, Some(due * 2.0));

        ambient.set_running(false, due);
        assert!(!ambient.is_running());
        assert_eq!(ambient.poll(1e9), None);
    }

    #[test]
    fn test_ambient_restart_keeps_schedule() {
        let mut ambient = AmbientLoop::new(9);
        ambient.set_running(true, 0.0);
        let due = ambient.next_due;
        ambient.set_running(true, 5_000.0);
        assert_eq!(ambient.next_due, due);
    }

    #[test]
    fn test_ambient_cue_mix() {
        let mut ambient = AmbientLoop::new(11);
        ambient.set_running(true, 0.0);
        let interval = ambient.interval;
        let mut beeps = 0;
        let mut swooshes = 0;
        let ticks = 2_000;
        for i in 1..=ticks {
            match ambient.poll(i as f64 * interval + 1.0) {
                Some(SoundCue::DistantBeep) => beeps += 1,
                Some(SoundCue::DoorSwoosh) => swooshes += 1,
                _ => {}
            }
        }
        // Roughly 30% and 20%
        assert!((450..750).contains(&beeps), "beeps: {}", beeps);
        assert!((250..550).contains(&swooshes), "swooshes: {}", swooshes);
    }
}
