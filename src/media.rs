//! Win clip playback (WASM only)
//!
//! Wraps the page's `<video>` element. Every request carries a token unique
//! to that attempt; results and end events are reported back to the
//! session with that token, which drops anything that arrives late.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlVideoElement;

use crate::error::MediaError;
use crate::sim::Session;

/// Page clock in milliseconds
pub fn now() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

/// Plays the win clip and reports to the session
pub struct WinClipPlayer {
    video: HtmlVideoElement,
    session: Rc<RefCell<Session>>,
    /// Attempt that actually started playing; end/error events report it
    playing: Rc<Cell<Option<u64>>>,
}

impl WinClipPlayer {
    /// Find the video element and hook up its end and error events
    pub fn attach(element_id: &str, session: Rc<RefCell<Session>>) -> Result<Self, MediaError> {
        let video = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(element_id))
            .ok_or_else(|| MediaError::ElementMissing(element_id.to_string()))?
            .dyn_into::<HtmlVideoElement>()
            .map_err(|_| MediaError::ElementMissing(format!("{} is not a <video>", element_id)))?;

        let playing: Rc<Cell<Option<u64>>> = Rc::new(Cell::new(None));

        {
            let session = session.clone();
            let playing = playing.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if let Some(token) = playing.take() {
                    session.borrow_mut().on_clip_ended(token, now());
                }
            });
            let _ = video.add_event_listener_with_callback("ended", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // A clip that breaks mid-play counts as finished
        {
            let session = session.clone();
            let playing = playing.clone();
            let video_clone = video.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let detail = video_clone
                    .error()
                    .map(|e| format!("code {}", e.code()))
                    .unwrap_or_else(|| "unknown".to_string());
                log::warn!("{}", MediaError::Decode(detail));
                if let Some(token) = playing.take() {
                    session.borrow_mut().on_clip_ended(token, now());
                }
            });
            let _ = video.add_event_listener_with_callback("error", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        Ok(Self {
            video,
            session,
            playing,
        })
    }

    /// Start the clip from the top.
    ///
    /// The outcome is reported through `Session::on_clip_started` once the
    /// browser resolves the play request. Must be called without the session
    /// borrowed.
    pub fn play(&self, token: u64, muted: bool) {
        // Events from an earlier attempt must not end this one
        self.playing.set(None);
        self.video.set_muted(muted);
        self.video.set_current_time(0.0);

        let started = self.video.play();
        let session = self.session.clone();
        let playing = self.playing.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let result = match started {
                Ok(promise) => JsFuture::from(promise).await.map(|_| ()),
                Err(e) => Err(e),
            }
            .map_err(|e| MediaError::PlaybackRejected(format!("{:?}", e)));

            if result.is_ok() {
                playing.set(Some(token));
            }
            session.borrow_mut().on_clip_started(token, result, now());
        });
    }

    /// Stop and rewind, e.g. when leaving to the menu mid-clip
    pub fn stop(&self) {
        self.playing.set(None);
        let _ = self.video.pause();
        self.video.set_current_time(0.0);
    }
}
