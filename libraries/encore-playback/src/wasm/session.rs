//! WASM-compatible PlaybackSession wrapper

use super::backend::JsMediaBackend;
use crate::backend::BackendNotification;
use crate::progress::format_time;
use crate::{PlaybackConfig, PlaybackError, PlaybackSession, RepeatMode, SeekTarget};
use crate::types::LoadGeneration;
use crate::volume::Volume;
use encore_core::{Track, TrackId};
use js_sys::Function;
use wasm_bindgen::prelude::*;

/// WASM-compatible playback session
///
/// Wraps the core PlaybackSession with a JavaScript-friendly API. Session
/// events are passed to the `onEvent` callback after every call.
#[wasm_bindgen]
pub struct WasmPlaybackSession {
    inner: PlaybackSession<JsMediaBackend>,
    on_event: Option<Function>,
}

#[wasm_bindgen]
impl WasmPlaybackSession {
    /// Create a session around a JS player object
    ///
    /// `config` may be `undefined` for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(player: JsValue, config: JsValue) -> Result<WasmPlaybackSession, JsValue> {
        // Enable panic hooks for better error messages in console
        console_error_panic_hook::set_once();

        let config: PlaybackConfig = if config.is_undefined() || config.is_null() {
            PlaybackConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
        };
        config
            .validate()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        Ok(Self {
            inner: PlaybackSession::new(JsMediaBackend::new(player), &config),
            on_event: None,
        })
    }

    // ===== Playback Control =====

    /// Play a track, optionally within the list it was picked from
    #[wasm_bindgen(js_name = playTrack)]
    pub fn play_track(&mut self, track: JsValue, context: JsValue) -> Result<(), JsValue> {
        let track: Track = serde_wasm_bindgen::from_value(track)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse track: {}", e)))?;

        let context: Option<Vec<Track>> = if context.is_undefined() || context.is_null() {
            None
        } else {
            Some(
                serde_wasm_bindgen::from_value(context)
                    .map_err(|e| JsValue::from_str(&format!("Failed to parse tracks: {}", e)))?,
            )
        };

        let result = self.inner.play_track(track, context);
        self.finish(result)
    }

    /// Toggle play/pause
    #[wasm_bindgen(js_name = togglePlayPause)]
    pub fn toggle_play_pause(&mut self) -> Result<(), JsValue> {
        let result = self.inner.toggle_play_pause();
        self.finish(result)
    }

    /// Start or resume playback
    pub fn play(&mut self) -> Result<(), JsValue> {
        let result = self.inner.play();
        self.finish(result)
    }

    /// Pause playback
    pub fn pause(&mut self) -> Result<(), JsValue> {
        let result = self.inner.pause();
        self.finish(result)
    }

    /// Skip to next track
    #[wasm_bindgen(js_name = skipNext)]
    pub fn skip_next(&mut self) -> Result<(), JsValue> {
        let result = self.inner.skip_next();
        self.finish(result)
    }

    /// Go to previous track
    #[wasm_bindgen(js_name = skipPrevious)]
    pub fn skip_previous(&mut self) -> Result<(), JsValue> {
        let result = self.inner.skip_previous();
        self.finish(result)
    }

    /// Play the track at a queue index
    #[wasm_bindgen(js_name = jumpTo)]
    pub fn jump_to(&mut self, index: usize) -> Result<(), JsValue> {
        let result = self.inner.jump_to(index);
        self.finish(result)
    }

    /// Close the player
    pub fn dismiss(&mut self) {
        self.inner.dismiss();
        self.flush_events();
    }

    // ===== Seeking =====

    /// Seek to position in seconds
    #[wasm_bindgen(js_name = seekTo)]
    pub fn seek_to(&mut self, position_secs: f64) -> Result<(), JsValue> {
        let result = self.inner.seek(SeekTarget::Seconds(position_secs));
        self.finish(result)
    }

    /// Seek from the progress slider (0-100)
    #[wasm_bindgen(js_name = seekToPercent)]
    pub fn seek_to_percent(&mut self, percent: f64) -> Result<(), JsValue> {
        let result = self.inner.seek(SeekTarget::from_percent(percent));
        self.finish(result)
    }

    // ===== Volume Control =====

    /// Set volume (0-100)
    ///
    /// Out-of-range and non-numeric values clamp instead of wrapping.
    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&mut self, level: f64) {
        self.inner.set_volume(Volume::clamp_level(level));
        self.flush_events();
    }

    /// Mute or unmute
    #[wasm_bindgen(js_name = setMuted)]
    pub fn set_muted(&mut self, muted: bool) {
        self.inner.set_muted(muted);
        self.flush_events();
    }

    /// Toggle mute
    #[wasm_bindgen(js_name = toggleMute)]
    pub fn toggle_mute(&mut self) {
        self.inner.toggle_mute();
        self.flush_events();
    }

    // ===== Shuffle & Repeat =====

    /// Toggle shuffle, returning the new state
    #[wasm_bindgen(js_name = toggleShuffle)]
    pub fn toggle_shuffle(&mut self) -> bool {
        let enabled = self.inner.toggle_shuffle();
        self.flush_events();
        enabled
    }

    /// Advance repeat mode, returning "off" | "all" | "one"
    #[wasm_bindgen(js_name = cycleRepeatMode)]
    pub fn cycle_repeat_mode(&mut self) -> String {
        let mode = self.inner.cycle_repeat_mode();
        self.flush_events();
        mode.to_string()
    }

    /// Set repeat mode ("off" | "all" | "one")
    #[wasm_bindgen(js_name = setRepeat)]
    pub fn set_repeat(&mut self, mode: &str) -> Result<(), JsValue> {
        let mode: RepeatMode = mode.parse().map_err(|e: String| JsValue::from_str(&e))?;
        self.inner.set_repeat_mode(mode);
        self.flush_events();
        Ok(())
    }

    // ===== Likes =====

    /// Flip a track's like state
    #[wasm_bindgen(js_name = toggleLike)]
    pub fn toggle_like(&mut self, track_id: String) -> bool {
        let liked = self.inner.toggle_liked(TrackId::new(track_id));
        self.flush_events();
        liked
    }

    /// Whether a track is liked
    #[wasm_bindgen(js_name = isLiked)]
    pub fn is_liked(&self, track_id: String) -> bool {
        self.inner.is_liked(&TrackId::new(track_id))
    }

    // ===== Player Callbacks =====

    /// Player finished loading the track for `generation`
    #[wasm_bindgen(js_name = notifyReady)]
    pub fn notify_ready(&mut self, generation: f64, duration_secs: f64) -> Result<(), JsValue> {
        let result = self
            .inner
            .handle_notification(BackendNotification::ready(to_generation(generation), duration_secs));
        self.finish(result)
    }

    /// Player reached the end of the track for `generation`
    #[wasm_bindgen(js_name = notifyEnded)]
    pub fn notify_ended(&mut self, generation: f64) -> Result<(), JsValue> {
        let result = self
            .inner
            .handle_notification(BackendNotification::ended(to_generation(generation)));
        self.finish(result)
    }

    /// Player could not load the track for `generation`
    #[wasm_bindgen(js_name = notifyLoadFailed)]
    pub fn notify_load_failed(&mut self, generation: f64, reason: String) {
        // The error event is the notice; no need to throw as well
        let _ = self.inner.handle_notification(BackendNotification::load_failed(
            to_generation(generation),
            reason,
        ));
        self.flush_events();
    }

    /// Progress timer tick for `generation`
    pub fn poll(&mut self, generation: f64) -> bool {
        let applied = self.inner.poll_progress(to_generation(generation));
        self.flush_events();
        applied
    }

    // ===== State Queries =====

    /// Current state snapshot as a JS object
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.inner.snapshot()).unwrap_or(JsValue::NULL)
    }

    /// Generation of the current load (for the page's timer and callbacks)
    #[wasm_bindgen(js_name = currentGeneration)]
    pub fn current_generation(&self) -> f64 {
        self.inner.generation().value() as f64
    }

    // ===== Event Listeners =====

    /// Register the session event callback
    #[wasm_bindgen(js_name = onEvent)]
    pub fn on_event(&mut self, callback: Function) {
        self.on_event = Some(callback);
    }

    // ===== Internal =====

    fn finish(&mut self, result: crate::Result<()>) -> Result<(), JsValue> {
        self.flush_events();
        result.map_err(|e| self.handle_error(e))
    }

    fn flush_events(&mut self) {
        let events = self.inner.drain_events();
        if let Some(ref cb) = self.on_event {
            for event in events {
                if let Ok(js_event) = serde_wasm_bindgen::to_value(&event) {
                    cb.call1(&JsValue::NULL, &js_event).ok();
                }
            }
        }
    }

    fn handle_error(&self, error: PlaybackError) -> JsValue {
        JsValue::from_str(&error.to_string())
    }
}

/// Format seconds as `m:ss` for the time labels
#[wasm_bindgen(js_name = formatTime)]
pub fn format_time_label(secs: f64) -> String {
    format_time(secs)
}

fn to_generation(raw: f64) -> LoadGeneration {
    if raw.is_finite() && raw >= 0.0 {
        LoadGeneration::new(raw as u64)
    } else {
        LoadGeneration::default()
    }
}
