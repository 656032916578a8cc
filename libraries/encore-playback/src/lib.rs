//! Encore - Playback Session Control
//!
//! Platform-agnostic playback session controller for the Encore web player.
//!
//! This crate provides:
//! - Play queue with first-occurrence positioning and non-wrapping skip back
//! - Repeat modes (Off, All, One) and pass-based shuffle traversal
//! - Playback status machine (idle, loading, playing, paused, ended)
//! - Media backend adapter with load generations and buffered controls
//! - Volume control (0-100, mute preserves level)
//! - Events for UI synchronization and a read-only state snapshot
//! - A tokio runner with a per-load progress poll
//!
//! # Architecture
//!
//! `encore-playback` never talks to a player directly. The platform supplies
//! a [`MediaBackend`] (the embedded web player in the browser, a simulated
//! clock in the CLI) and forwards its asynchronous callbacks as
//! [`BackendNotification`]s. Each load is tagged with a [`LoadGeneration`];
//! callbacks from superseded loads are dropped.
//!
//! # Example: Basic Playback
//!
//! ```rust
//! use encore_playback::{
//!     BackendNotification, LoadGeneration, MediaBackend, PlaybackConfig, PlaybackSession,
//!     PlaybackStatus, Result,
//! };
//! use encore_core::{Track, TrackId};
//!
//! #[derive(Default)]
//! struct SilentBackend;
//!
//! impl MediaBackend for SilentBackend {
//!     fn load(&mut self, _: &TrackId, _: bool, _: LoadGeneration) -> Result<()> {
//!         Ok(())
//!     }
//!     fn play(&mut self) {}
//!     fn pause(&mut self) {}
//!     fn seek_to(&mut self, _: f64) {}
//!     fn current_time(&self) -> f64 {
//!         0.0
//!     }
//!     fn duration(&self) -> f64 {
//!         0.0
//!     }
//!     fn set_volume(&mut self, _: u8) {}
//!     fn teardown(&mut self) {}
//! }
//!
//! let mut session = PlaybackSession::new(SilentBackend, &PlaybackConfig::default());
//!
//! let results = vec![
//!     Track::new("a", "First", "Artist"),
//!     Track::new("b", "Second", "Artist"),
//! ];
//! session.play_track(results[0].clone(), Some(results)).unwrap();
//! assert_eq!(session.status(), PlaybackStatus::Loading);
//!
//! // The platform reports readiness for the generation it was given
//! let generation = session.generation();
//! session
//!     .handle_notification(BackendNotification::ready(generation, 212.0))
//!     .unwrap();
//! assert_eq!(session.status(), PlaybackStatus::Playing);
//!
//! session.skip_next().unwrap();
//! assert_eq!(session.current_index(), Some(1));
//! ```

mod adapter;
mod backend;
mod config;
mod error;
mod events;
mod progress;
mod queue;
mod runtime;
mod session;
mod shuffle;
mod state_machine;
pub mod types;
mod volume;

#[cfg(feature = "wasm")]
pub mod wasm;

// Public exports
pub use adapter::{Dispatch, MediaBackendAdapter};
pub use backend::{
    notification_channel, BackendNotification, MediaBackend, NotificationKind,
    NotificationReceiver, NotificationSender,
};
pub use config::PlaybackConfig;
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use progress::{format_time, progress_percent};
pub use queue::{EndOfTrack, QueueManager};
pub use runtime::{SessionCommand, SessionHandle, SessionRunner};
pub use session::PlaybackSession;
pub use shuffle::ShufflePass;
pub use state_machine::PlaybackStateMachine;
pub use types::{LoadGeneration, PlaybackState, PlaybackStatus, RepeatMode, SeekTarget};
pub use volume::Volume;
