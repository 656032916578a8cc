/// Track domain type
use crate::error::{CoreError, Result};
use crate::types::TrackId;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Playable track
///
/// Shape matches what the search/library views hand to the player:
/// `{ id, title, artist, thumbnail, duration }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier (opaque to the player)
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist (or channel) name
    pub artist: String,

    /// Thumbnail reference
    #[serde(default, alias = "thumbnailUrl", alias = "thumbnail_url")]
    pub thumbnail: String,

    /// Known duration in seconds, if the source reported one
    #[serde(
        rename = "duration",
        alias = "durationSeconds",
        alias = "duration_seconds",
        default,
        deserialize_with = "deserialize_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_secs: Option<f64>,
}

impl Track {
    /// Create a new track with minimal metadata
    pub fn new(id: impl Into<TrackId>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            thumbnail: String::new(),
            duration_secs: None,
        }
    }

    /// Set the thumbnail reference
    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = thumbnail.into();
        self
    }

    /// Set the known duration in seconds
    pub fn with_duration_secs(mut self, secs: f64) -> Self {
        self.duration_secs = representable_secs(secs);
        self
    }

    /// Get the known duration as a Duration
    pub fn duration(&self) -> Option<Duration> {
        self.duration_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Check the track can be handed to a media backend
    pub fn validate(&self) -> Result<()> {
        if self.id.is_blank() {
            return Err(CoreError::invalid_track(format!(
                "track '{}' has an empty id",
                self.title
            )));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TrackListPayload {
    Envelope { songs: Vec<Track> },
    List(Vec<Track>),
}

/// Parse a track list from JSON
///
/// Accepts either a bare array of tracks or the search endpoint's
/// `{ "songs": [...] }` envelope. Every track is validated.
pub fn parse_track_list(json: &str) -> Result<Vec<Track>> {
    let tracks = match serde_json::from_str::<TrackListPayload>(json)? {
        TrackListPayload::Envelope { songs } => songs,
        TrackListPayload::List(tracks) => tracks,
    };

    for track in &tracks {
        track.validate()?;
    }

    Ok(tracks)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(f64),
    Text(String),
}

/// Sources report duration as a number, a numeric string, a clock string,
/// or a placeholder such as "Unknown"
fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawDuration>::deserialize(deserializer)? {
        Some(RawDuration::Seconds(secs)) => representable_secs(secs),
        Some(RawDuration::Text(text)) => parse_duration_text(&text),
        None => None,
    })
}

fn parse_duration_text(text: &str) -> Option<f64> {
    let text = text.trim();

    if let Ok(secs) = text.parse::<f64>() {
        return representable_secs(secs);
    }

    let parts: Vec<&str> = text.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }

    let mut total: u64 = 0;
    for (i, part) in parts.iter().enumerate() {
        let value: u64 = part.parse().ok()?;
        // Every field after the leading one is a base-60 digit
        if i > 0 && value >= 60 {
            return None;
        }
        total = total.checked_mul(60)?.checked_add(value)?;
    }

    representable_secs(total as f64)
}

/// Only non-negative durations a `Duration` can hold count as known
fn representable_secs(secs: f64) -> Option<f64> {
    Duration::try_from_secs_f64(secs).ok().map(|_| secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(json: &str) -> Track {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn search_result_with_unknown_duration() {
        let track = parse_one(
            r#"{"id": "abc", "title": "Song", "artist": "Channel",
                "thumbnail": "https://img/abc.jpg", "duration": "Unknown",
                "published_at": "2024-01-01T00:00:00Z"}"#,
        );

        assert_eq!(track.id.as_str(), "abc");
        assert_eq!(track.thumbnail, "https://img/abc.jpg");
        assert_eq!(track.duration_secs, None);
    }

    #[test]
    fn numeric_and_clock_durations() {
        let track = parse_one(r#"{"id": "a", "title": "t", "artist": "x", "duration": 215}"#);
        assert_eq!(track.duration_secs, Some(215.0));

        let track = parse_one(r#"{"id": "a", "title": "t", "artist": "x", "duration": "3:35"}"#);
        assert_eq!(track.duration_secs, Some(215.0));

        let track = parse_one(
            r#"{"id": "a", "title": "t", "artist": "x", "durationSeconds": "1:02:03"}"#,
        );
        assert_eq!(track.duration_secs, Some(3723.0));

        let track = parse_one(r#"{"id": "a", "title": "t", "artist": "x", "duration": "12.5"}"#);
        assert_eq!(track.duration_secs, Some(12.5));
    }

    #[test]
    fn malformed_durations_are_unknown() {
        for raw in [
            r#""1:75""#,
            r#""-4""#,
            r#""::""#,
            "-3",
            "null",
            r#""307445734561825861:00""#,
            r#""99999999999999999999""#,
            "1e30",
        ] {
            let json = format!(r#"{{"id": "a", "title": "t", "artist": "x", "duration": {raw}}}"#);
            assert_eq!(parse_one(&json).duration_secs, None, "input {raw}");
        }
    }

    #[test]
    fn thumbnail_aliases() {
        let track = parse_one(
            r#"{"id": "a", "title": "t", "artist": "x", "thumbnailUrl": "https://img/a.jpg"}"#,
        );
        assert_eq!(track.thumbnail, "https://img/a.jpg");

        let track = parse_one(r#"{"id": "a", "title": "t", "artist": "x"}"#);
        assert!(track.thumbnail.is_empty());
    }

    #[test]
    fn serialization_round_trips_known_duration() {
        let track = Track::new("a", "Title", "Artist")
            .with_thumbnail("thumb")
            .with_duration_secs(90.0);
        let json = serde_json::to_string(&track).unwrap();
        assert!(json.contains("\"duration\":90.0"));
        assert_eq!(serde_json::from_str::<Track>(&json).unwrap(), track);
    }

    #[test]
    fn unknown_duration_is_omitted() {
        let json = serde_json::to_string(&Track::new("a", "Title", "Artist")).unwrap();
        assert!(!json.contains("duration"));
    }

    #[test]
    fn with_duration_rejects_non_finite() {
        let track = Track::new("a", "t", "x").with_duration_secs(f64::NAN);
        assert_eq!(track.duration(), None);
    }

    #[test]
    fn oversized_durations_are_unknown() {
        let track = Track::new("a", "t", "x").with_duration_secs(1e30);
        assert_eq!(track.duration_secs, None);
        assert_eq!(track.duration(), None);

        let tracks =
            parse_track_list(r#"[{"id": "a", "title": "t", "artist": "x", "duration": 1e30}]"#)
                .unwrap();
        assert_eq!(tracks[0].duration(), None);

        let track = Track::new("a", "t", "x").with_duration_secs(215.5);
        assert_eq!(track.duration(), Some(Duration::from_secs_f64(215.5)));
    }

    #[test]
    fn clock_overflow_is_unknown() {
        assert_eq!(parse_duration_text("307445734561825861:00"), None);
        assert_eq!(parse_duration_text("1:00:00"), Some(3600.0));
    }

    #[test]
    fn parse_envelope_and_bare_list() {
        let envelope = r#"{"songs": [{"id": "1", "title": "A", "artist": "X"},
                                     {"id": "2", "title": "B", "artist": "Y"}]}"#;
        let tracks = parse_track_list(envelope).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[1].id.as_str(), "2");

        let bare = r#"[{"id": "1", "title": "A", "artist": "X"}]"#;
        assert_eq!(parse_track_list(bare).unwrap().len(), 1);
    }

    #[test]
    fn parse_rejects_blank_ids() {
        let err = parse_track_list(r#"[{"id": " ", "title": "A", "artist": "X"}]"#).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTrack(_)));
    }

    #[test]
    fn parse_rejects_malformed_json() {
        let err = parse_track_list("{not json").unwrap_err();
        assert!(matches!(err, CoreError::Serialization(_)));
    }
}
