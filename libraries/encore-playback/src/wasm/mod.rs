//! WASM bindings for encore-playback
//!
//! Exposes [`PlaybackSession`](crate::PlaybackSession) to the browser. The
//! page supplies the embedded player as a plain JS object and forwards its
//! callbacks back in.

#[cfg(feature = "wasm")]
pub mod backend;

#[cfg(feature = "wasm")]
pub mod session;

#[cfg(feature = "wasm")]
pub use backend::JsMediaBackend;

#[cfg(feature = "wasm")]
pub use session::WasmPlaybackSession;
