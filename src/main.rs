//! Reel Sync entry point
//!
//! On the web this wires the DOM, audio and video to the session and runs the
//! frame loop. Natively it plays a scripted session and logs each frame.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlElement, MouseEvent, TouchEvent};

    use reel_sync::Settings;
    use reel_sync::audio::AudioManager;
    use reel_sync::media::{WinClipPlayer, now};
    use reel_sync::sim::{Command, ReelId, ReelView, Session, SessionView, View, WinStage};

    /// Game instance holding the session and its collaborators
    struct Game {
        session: Rc<RefCell<Session>>,
        audio: AudioManager,
        clip: Option<WinClipPlayer>,
        muted: bool,
        last_revision: Option<u64>,
    }

    impl Game {
        fn new(settings: &Settings, seed: u64) -> Self {
            let session = Rc::new(RefCell::new(Session::new(settings, seed)));
            let clip = match WinClipPlayer::attach(&settings.win_clip_element, session.clone()) {
                Ok(clip) => Some(clip),
                Err(e) => {
                    log::warn!("Win clip unavailable: {}", e);
                    None
                }
            };

            Self {
                session,
                audio: AudioManager::new(settings, seed),
                clip,
                muted: settings.muted,
                last_revision: None,
            }
        }

        /// Advance the session and redraw if anything changed
        fn frame(&mut self, time: f64) {
            self.session.borrow_mut().update(time);
            self.flush(time);
            self.audio.update(time);

            let view = {
                let session = self.session.borrow();
                (Some(session.revision()) != self.last_revision).then(|| session.view())
            };
            if let Some(view) = view {
                self.last_revision = Some(view.revision);
                render(&view);
            }
        }

        /// Hand queued session commands to the collaborators
        fn flush(&mut self, time: f64) {
            // The session borrow must end before the clip player runs
            let commands = self.session.borrow_mut().drain_commands();
            for command in commands {
                match command {
                    Command::Audio(audio) => self.audio.apply(audio, time),
                    Command::PlayWinClip { token, muted } => match &self.clip {
                        Some(clip) => clip.play(token, muted),
                        None => {
                            // No video on the page: report it so the session can move on
                            let session = self.session.clone();
                            wasm_bindgen_futures::spawn_local(async move {
                                session.borrow_mut().on_clip_started(
                                    token,
                                    Err(reel_sync::MediaError::ElementMissing(
                                        "win clip".to_string(),
                                    )),
                                    now(),
                                );
                            });
                        }
                    },
                }
            }
        }

        fn toggle_mute(&mut self) {
            self.muted = !self.muted;
            self.audio.set_muted(self.muted);
            self.session.borrow_mut().set_muted(self.muted);
            log::info!("Muted: {}", self.muted);
        }
    }

    // === Rendering ===

    fn set_hidden(document: &Document, id: &str, hidden: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", hidden);
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn render(view: &SessionView) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let session = &view.session;

        set_hidden(&document, "menu-screen", session.view != View::Menu);
        set_hidden(&document, "game-screen", session.view != View::Playing);
        set_hidden(&document, "force-play-btn", !session.force_play_available);

        set_text(&document, "level", &format!("{:02}", session.level));
        set_text(&document, "target-sum", &view.target_sum.to_string());
        set_text(&document, "status-message", &view.message);

        // Stage drives the CSS choreography (clip overlay, sync banner, fade out)
        let stage = match session.win_stage {
            None => "",
            Some(WinStage::Starting) => "starting",
            Some(WinStage::ClipPlaying) => "clip",
            Some(WinStage::AwaitingForcePlay) => "blocked",
            Some(WinStage::SyncHold) => "sync",
            Some(WinStage::TransitionOut) => "transition",
        };
        if let Some(el) = document.get_element_by_id("game-screen") {
            let _ = el.set_attribute("data-win-stage", stage);
            let _ = el.class_list().toggle_with_force("winner", session.is_winner);
        }

        for (id, reel) in ReelId::ALL.into_iter().zip(&view.reels) {
            render_reel(&document, id, reel);
        }
    }

    fn render_reel(document: &Document, id: ReelId, reel: &ReelView) {
        let Some(drum) = document
            .query_selector(&format!("#{} .reel-drum", reel_element_id(id)))
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        else {
            return;
        };

        let style = drum.style();
        let _ = style.set_property("transform", &format!("rotateX({}deg)", reel.rotation_degrees));
        let _ = style.set_property("filter", &format!("blur({:.2}px)", reel.blur));
        let _ = drum.class_list().toggle_with_force("dragging", reel.dragging);
        let _ = drum.class_list().toggle_with_force("locked", reel.locked);

        let html: String = reel
            .segments
            .iter()
            .map(|s| {
                format!(
                    "<div class=\"segment{}\" style=\"transform: rotateX({}deg) translateZ(var(--reel-radius)); opacity: {:.3}\">{}</div>",
                    if s.active { " active" } else { "" },
                    -s.angle,
                    s.opacity,
                    s.value
                )
            })
            .collect();
        drum.set_inner_html(&html);
    }

    fn reel_element_id(id: ReelId) -> &'static str {
        match id {
            ReelId::First => "reel-1",
            ReelId::Second => "reel-2",
        }
    }

    // === Setup ===

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Reel Sync starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        set_hidden(&document, "loading", true);

        let settings = Settings::load();
        let seed = settings.seed.unwrap_or_else(|| js_sys::Date::now() as u64);
        let game = Rc::new(RefCell::new(Game::new(&settings, seed)));

        log::info!("Game initialized with seed: {}", seed);

        setup_reel_input(&document, game.clone());
        setup_pointer_tracking(game.clone());
        setup_buttons(&document, game.clone());

        // Start game loop
        request_animation_frame(game);

        log::info!("Reel Sync running!");
    }

    fn setup_reel_input(document: &Document, game: Rc<RefCell<Game>>) {
        for id in ReelId::ALL {
            let Some(el) = document.get_element_by_id(reel_element_id(id)) else {
                log::warn!("Missing reel element #{}", reel_element_id(id));
                continue;
            };
            let session = game.borrow().session.clone();

            // Mouse down
            {
                let session = session.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                    event.prevent_default();
                    session
                        .borrow_mut()
                        .pointer_down(id, event.client_y() as f64, now());
                });
                let _ = el.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
                closure.forget();
            }

            // Touch start
            {
                let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                    event.prevent_default();
                    if let Some(touch) = event.touches().get(0) {
                        session
                            .borrow_mut()
                            .pointer_down(id, touch.client_y() as f64, now());
                    }
                });
                let _ = el.add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }
    }

    /// Moves and releases are tracked on the window so drags survive leaving the reel
    fn setup_pointer_tracking(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let session = game.borrow().session.clone();

        // Mouse move
        {
            let session = session.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                session
                    .borrow_mut()
                    .pointer_move(event.client_y() as f64, now());
            });
            let _ = window.add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch move
        {
            let session = session.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                if let Some(touch) = event.touches().get(0) {
                    session
                        .borrow_mut()
                        .pointer_move(touch.client_y() as f64, now());
                }
            });
            let _ = window.add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse up / touch end
        for event_name in ["mouseup", "touchend", "touchcancel"] {
            let session = session.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                session.borrow_mut().pointer_up(now());
            });
            let _ = window.add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn on_click(document: &Document, id: &str, handler: impl FnMut(MouseEvent) + 'static) {
        let Some(btn) = document.get_element_by_id(id) else {
            log::warn!("Missing button #{}", id);
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(handler);
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        // Start
        {
            let game = game.clone();
            on_click(document, "start-btn", move |_| {
                let mut g = game.borrow_mut();
                g.audio.resume();
                g.session.borrow_mut().start_game();
                // Flush inside the click so music starts with the user gesture
                g.flush(now());
            });
        }

        // Reset
        {
            let game = game.clone();
            on_click(document, "reset-btn", move |_| {
                let mut g = game.borrow_mut();
                g.session.borrow_mut().reset_game();
                g.flush(now());
            });
        }

        // Back to menu
        {
            let game = game.clone();
            on_click(document, "menu-btn", move |_| {
                let mut g = game.borrow_mut();
                g.session.borrow_mut().return_to_menu();
                if let Some(clip) = &g.clip {
                    clip.stop();
                }
                g.flush(now());
            });
        }

        // Force play (win clip blocked by autoplay policy)
        {
            let game = game.clone();
            on_click(document, "force-play-btn", move |_| {
                let mut g = game.borrow_mut();
                g.audio.resume();
                let forced = g.session.borrow_mut().force_play();
                if forced {
                    g.flush(now());
                }
            });
        }

        // Mute
        {
            let document_clone = document.clone();
            on_click(document, "mute-btn", move |_| {
                let mut g = game.borrow_mut();
                g.toggle_mute();
                set_text(&document_clone, "mute-btn", if g.muted { "UNMUTE" } else { "MUTE" });
            });
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        game.borrow_mut().frame(time);
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use reel_sync::Settings;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Reel Sync (native) starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => match Settings::from_file(std::path::Path::new(&path)) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring {}: {}", path, e);
                Settings::default()
            }
        },
        None => Settings::default(),
    };

    demo::run(&settings, 3);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Scripted play-through: solves a few levels with simulated drags and clip
/// callbacks, logging every state change.
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use reel_sync::Settings;
    use reel_sync::consts::ANGLE_STEP;
    use reel_sync::sim::{Command, ReelId, Session};

    /// Simulated frame length (ms)
    const FRAME_MS: f64 = 16.0;

    struct Demo {
        session: Session,
        now: f64,
        sensitivity: f64,
        last_revision: u64,
    }

    pub fn run(settings: &Settings, levels: u32) {
        let seed = settings.seed.unwrap_or(7);
        let mut demo = Demo {
            session: Session::new(settings, seed),
            now: 0.0,
            sensitivity: settings.reel_sensitivity,
            last_revision: 0,
        };
        log::info!("Seed {}, solving {} levels", seed, levels);

        demo.session.start_game();
        demo.settle(100.0);

        for _ in 0..levels {
            let level = demo.session.state().level;
            let challenge = demo.session.challenge().clone();
            log::info!(
                "Level {}: target {} (reel 1 {:?}, reel 2 {:?})",
                level,
                challenge.target_sum,
                challenge.numbers1,
                challenge.numbers2
            );

            let Some(&(i, j)) = challenge.solving_pairs().first() else {
                log::error!("Level {} has no solution", level);
                return;
            };
            demo.drag_to(ReelId::First, i);
            demo.drag_to(ReelId::Second, j);

            // Run until the next level is on screen
            while demo.session.state().level == level && demo.now < 60_000.0 * levels as f64 {
                demo.settle(FRAME_MS);
            }
        }

        log::info!(
            "Finished at level {} after {:.1}s",
            demo.session.state().level,
            demo.now / 1000.0
        );
    }

    impl Demo {
        /// Drag `reel` so segment `index` ends up at the center
        fn drag_to(&mut self, reel: ReelId, index: usize) {
            let current = self.session.reel(reel).rotation_degrees;
            let target = -(index as f64) * ANGLE_STEP;
            let distance = (current - target) / self.sensitivity;

            self.session.pointer_down(reel, 0.0, self.now);
            let steps = 10;
            for step in 1..=steps {
                self.now += FRAME_MS;
                self.session
                    .pointer_move(distance * step as f64 / steps as f64, self.now);
            }
            self.session.pointer_up(self.now);
            self.settle(300.0);
        }

        /// Advance time frame by frame, answering clip requests like a browser would
        fn settle(&mut self, ms: f64) {
            let end = self.now + ms;
            while self.now < end {
                self.now = (self.now + FRAME_MS).min(end);
                self.session.update(self.now);

                for command in self.session.drain_commands() {
                    log::debug!("{:?}", command);
                    if let Command::PlayWinClip { token, .. } = command {
                        // Clip starts at once and runs for two seconds
                        self.session.on_clip_started(token, Ok(()), self.now);
                        self.session.on_clip_ended(token, self.now + 2_000.0);
                        self.now += 2_000.0;
                    }
                }

                if self.session.revision() != self.last_revision {
                    self.last_revision = self.session.revision();
                    self.log_view();
                }
            }
        }

        fn log_view(&self) {
            let view = self.session.view();
            log::info!(
                "[{:>8.0}ms] level {} {:?} {:?} - {}",
                self.now,
                view.session.level,
                view.session.phase,
                view.session.win_stage,
                view.message
            );
            match view.to_json() {
                Ok(json) => log::debug!("{}", json),
                Err(e) => log::warn!("View serialization failed: {}", e),
            }
        }
    }
}
