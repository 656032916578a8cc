//! Domain types

mod ids;
mod track;

pub use ids::TrackId;
pub use track::{parse_track_list, Track};
