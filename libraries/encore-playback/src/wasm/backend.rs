//! Media backend backed by a JavaScript player object
//!
//! Expected shape:
//! ```text
//! {
//!   load(id, autoplay, generation), play(), pause(), seekTo(secs),
//!   getCurrentTime(), getDuration(), setVolume(level), destroy()
//! }
//! ```
//! Missing methods are treated as no-ops.

use crate::backend::MediaBackend;
use crate::error::{PlaybackError, Result};
use crate::types::LoadGeneration;
use encore_core::TrackId;
use js_sys::{Function, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// [`MediaBackend`] that forwards to a JS object
#[derive(Debug, Clone)]
pub struct JsMediaBackend {
    target: JsValue,
}

impl JsMediaBackend {
    /// Wrap a JS player object
    pub fn new(target: JsValue) -> Self {
        Self { target }
    }

    fn method(&self, name: &str) -> Option<Function> {
        Reflect::get(&self.target, &JsValue::from_str(name))
            .ok()
            .and_then(|value| value.dyn_into::<Function>().ok())
    }

    fn call0(&self, name: &str) -> Option<JsValue> {
        self.method(name)?.call0(&self.target).ok()
    }

    fn call1(&self, name: &str, arg: &JsValue) -> Option<JsValue> {
        self.method(name)?.call1(&self.target, arg).ok()
    }
}

impl MediaBackend for JsMediaBackend {
    fn load(
        &mut self,
        track_id: &TrackId,
        autoplay: bool,
        generation: LoadGeneration,
    ) -> Result<()> {
        let Some(load) = self.method("load") else {
            return Err(PlaybackError::load_failure(track_id, "player has no load()"));
        };

        load.call3(
            &self.target,
            &JsValue::from_str(track_id.as_str()),
            &JsValue::from_bool(autoplay),
            &JsValue::from_f64(generation.value() as f64),
        )
        .map(|_| ())
        .map_err(|err| {
            let reason = err
                .as_string()
                .unwrap_or_else(|| "player threw during load".to_string());
            PlaybackError::load_failure(track_id, reason)
        })
    }

    fn play(&mut self) {
        self.call0("play");
    }

    fn pause(&mut self) {
        self.call0("pause");
    }

    fn seek_to(&mut self, secs: f64) {
        self.call1("seekTo", &JsValue::from_f64(secs));
    }

    fn current_time(&self) -> f64 {
        self.call0("getCurrentTime")
            .and_then(|value| value.as_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> f64 {
        self.call0("getDuration")
            .and_then(|value| value.as_f64())
            .unwrap_or(0.0)
    }

    fn set_volume(&mut self, level: u8) {
        self.call1("setVolume", &JsValue::from_f64(f64::from(level)));
    }

    fn teardown(&mut self) {
        self.call0("destroy");
    }
}
