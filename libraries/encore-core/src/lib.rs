//! Encore Core
//!
//! Domain types shared by every Encore playback surface.
//!
//! This crate provides:
//! - **Domain Types**: `TrackId`, `Track`, and track-list parsing for the
//!   search API payload
//! - **Like Store**: the advisory `LikeStore` contract and the in-memory
//!   `LikedTracks` set
//! - **Error Handling**: `CoreError` and `Result`
//!
//! # Example
//!
//! ```rust
//! use encore_core::{parse_track_list, LikeStore, LikedTracks, TrackId};
//!
//! let tracks = parse_track_list(
//!     r#"{"songs": [{"id": "dQw4w9WgXcQ", "title": "Song", "artist": "Channel",
//!                    "thumbnail": "https://img/1.jpg", "duration": "Unknown"}]}"#,
//! )
//! .unwrap();
//! assert_eq!(tracks[0].duration_secs, None);
//!
//! let mut likes = LikedTracks::new();
//! likes.set_liked(TrackId::new("dQw4w9WgXcQ"), true);
//! assert!(likes.is_liked(&tracks[0].id));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod likes;
pub mod types;

pub use error::{CoreError, Result};
pub use likes::{LikeStore, LikedTracks};
pub use types::{parse_track_list, Track, TrackId};
