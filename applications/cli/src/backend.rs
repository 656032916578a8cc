//! Simulated media backend
//!
//! Stands in for the embedded web player: a load becomes ready after a short
//! latency, the playhead advances with the (scaled) wall clock, and the end of
//! the track is reported by a timer. Every report carries the generation it
//! was loaded with.

use encore_core::{Track, TrackId};
use encore_playback::{LoadGeneration, MediaBackend, NotificationSender, Result};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::debug;

/// Duration assumed for tracks whose source reported none
pub const DEFAULT_TRACK_SECS: f64 = 180.0;

#[derive(Debug)]
struct LoadedTrack {
    generation: LoadGeneration,
    duration: f64,
    /// Playhead at `started` (or the frozen position while paused)
    offset: f64,
    /// Set while playing; may lie in the future until the load is ready
    started: Option<Instant>,
    ready_timer: Option<JoinHandle<()>>,
    end_timer: Option<JoinHandle<()>>,
}

impl LoadedTrack {
    fn new(generation: LoadGeneration, duration: f64, ready_timer: JoinHandle<()>) -> Self {
        Self {
            generation,
            duration,
            offset: 0.0,
            started: None,
            ready_timer: Some(ready_timer),
            end_timer: None,
        }
    }

    fn cancel_end(&mut self) {
        if let Some(timer) = self.end_timer.take() {
            timer.abort();
        }
    }

    fn cancel_all(&mut self) {
        self.cancel_end();
        if let Some(timer) = self.ready_timer.take() {
            timer.abort();
        }
    }
}

/// Clock-driven backend for the terminal player
#[derive(Debug)]
pub struct SimulatedBackend {
    notifier: NotificationSender,
    durations: HashMap<TrackId, f64>,
    unavailable: HashSet<TrackId>,
    speed: f64,
    load_latency: Duration,
    volume: u8,
    loaded: Option<LoadedTrack>,
}

impl SimulatedBackend {
    /// Create a backend that knows the durations of `tracks`
    ///
    /// `speed` scales playback (2.0 plays a track in half its length).
    pub fn new(notifier: NotificationSender, tracks: &[Track], speed: f64) -> Self {
        let durations = tracks
            .iter()
            .map(|track| {
                (
                    track.id.clone(),
                    track.duration_secs.unwrap_or(DEFAULT_TRACK_SECS),
                )
            })
            .collect();

        Self {
            notifier,
            durations,
            unavailable: HashSet::new(),
            speed,
            load_latency: Duration::from_millis(300),
            volume: 0,
            loaded: None,
        }
    }

    /// Treat these tracks as unplayable (load reports failure)
    pub fn with_unavailable(mut self, ids: impl IntoIterator<Item = TrackId>) -> Self {
        self.unavailable.extend(ids);
        self
    }

    /// Time between a load and its ready report
    pub fn with_load_latency(mut self, latency: Duration) -> Self {
        self.load_latency = latency;
        self
    }

    /// Last volume applied by the session
    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Whether the playhead is moving
    ///
    /// A track that ran to its end stops, like the embedded player does.
    pub fn is_playing(&self) -> bool {
        self.loaded.as_ref().is_some_and(|loaded| {
            loaded.started.is_some() && Self::position(loaded, self.speed) < loaded.duration
        })
    }

    fn position(loaded: &LoadedTrack, speed: f64) -> f64 {
        let elapsed = loaded.started.map_or(0.0, |started| {
            Instant::now().saturating_duration_since(started).as_secs_f64() * speed
        });
        (loaded.offset + elapsed).min(loaded.duration)
    }

    /// Start the playhead at `start` and arm the end-of-track timer
    fn start_clock(&mut self, start: Instant) {
        let notifier = self.notifier.clone();
        let speed = self.speed;
        let Some(loaded) = self.loaded.as_mut() else {
            return;
        };

        loaded.cancel_end();
        loaded.started = Some(start);

        let Some(deadline) = end_deadline(start, loaded.duration - loaded.offset, speed) else {
            debug!(generation = %loaded.generation, "Track end out of clock range, no end timer");
            return;
        };
        let generation = loaded.generation;
        loaded.end_timer = Some(tokio::spawn(async move {
            time::sleep_until(deadline).await;
            notifier.ended(generation);
        }));
    }

    fn stop_clock(&mut self) {
        let speed = self.speed;
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.offset = Self::position(loaded, speed);
            loaded.started = None;
            loaded.cancel_end();
        }
    }
}

/// When `remaining_secs` of track run out at `speed`, if the clock can express it
fn end_deadline(start: Instant, remaining_secs: f64, speed: f64) -> Option<Instant> {
    let remaining = Duration::try_from_secs_f64((remaining_secs / speed).max(0.0)).ok()?;
    start.checked_add(remaining)
}

impl MediaBackend for SimulatedBackend {
    fn load(
        &mut self,
        track_id: &TrackId,
        autoplay: bool,
        generation: LoadGeneration,
    ) -> Result<()> {
        self.teardown();

        let ready_at = Instant::now() + self.load_latency;
        let notifier = self.notifier.clone();

        if self.unavailable.contains(track_id) {
            debug!(%track_id, %generation, "Simulating unavailable track");
            let timer = tokio::spawn(async move {
                time::sleep_until(ready_at).await;
                notifier.load_failed(generation, "This video is unavailable");
            });
            self.loaded = Some(LoadedTrack::new(generation, 0.0, timer));
            return Ok(());
        }

        let duration = self
            .durations
            .get(track_id)
            .copied()
            .unwrap_or(DEFAULT_TRACK_SECS);

        let timer = tokio::spawn(async move {
            time::sleep_until(ready_at).await;
            notifier.ready(generation, duration);
        });
        self.loaded = Some(LoadedTrack::new(generation, duration, timer));

        // Autoplay starts the playhead the moment the load becomes ready
        if autoplay {
            self.start_clock(ready_at);
        }

        debug!(%track_id, %generation, duration, autoplay, "Simulated load started");
        Ok(())
    }

    fn play(&mut self) {
        if self.is_playing() {
            return;
        }
        self.stop_clock();
        self.start_clock(Instant::now());
    }

    fn pause(&mut self) {
        self.stop_clock();
    }

    fn seek_to(&mut self, secs: f64) {
        let playing = self.is_playing();
        self.stop_clock();
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.offset = secs.clamp(0.0, loaded.duration);
        }
        if playing {
            self.start_clock(Instant::now());
        }
    }

    fn current_time(&self) -> f64 {
        self.loaded
            .as_ref()
            .map_or(0.0, |loaded| Self::position(loaded, self.speed))
    }

    fn duration(&self) -> f64 {
        self.loaded.as_ref().map_or(0.0, |loaded| loaded.duration)
    }

    fn set_volume(&mut self, level: u8) {
        self.volume = level;
    }

    fn teardown(&mut self) {
        if let Some(mut loaded) = self.loaded.take() {
            loaded.cancel_all();
        }
    }
}

impl Drop for SimulatedBackend {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_playback::{notification_channel, BackendNotification, NotificationKind};

    fn backend(speed: f64) -> (SimulatedBackend, encore_playback::NotificationReceiver) {
        let (notifier, notifications) = notification_channel();
        let tracks = vec![
            Track::new("a", "A", "X").with_duration_secs(10.0),
            Track::new("b", "B", "Y"),
        ];
        let backend = SimulatedBackend::new(notifier, &tracks, speed)
            .with_load_latency(Duration::from_millis(100))
            .with_unavailable([TrackId::new("broken")]);
        (backend, notifications)
    }

    #[tokio::test(start_paused = true)]
    async fn load_reports_ready_then_ended() {
        let (mut backend, mut notifications) = backend(1.0);
        let generation = LoadGeneration::new(1);
        backend.load(&TrackId::new("a"), true, generation).unwrap();

        let ready = notifications.recv().await.unwrap();
        assert_eq!(ready, BackendNotification::ready(generation, 10.0));

        time::sleep(Duration::from_secs(4)).await;
        let position = backend.current_time();
        assert!((3.8..=4.0).contains(&position), "position {position}");

        let ended = notifications.recv().await.unwrap();
        assert_eq!(ended.kind, NotificationKind::Ended);
        assert_eq!(backend.current_time(), 10.0);
        assert!(!backend.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_duration_uses_default() {
        let (mut backend, mut notifications) = backend(1.0);
        backend
            .load(&TrackId::new("b"), false, LoadGeneration::new(1))
            .unwrap();

        let ready = notifications.recv().await.unwrap();
        assert_eq!(
            ready.kind,
            NotificationKind::Ready {
                duration_secs: DEFAULT_TRACK_SECS
            }
        );
        assert!(!backend.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_playhead_and_cancels_end() {
        let (mut backend, mut notifications) = backend(1.0);
        backend
            .load(&TrackId::new("a"), true, LoadGeneration::new(1))
            .unwrap();
        notifications.recv().await.unwrap();

        time::sleep(Duration::from_secs(2)).await;
        backend.pause();
        let frozen = backend.current_time();

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.current_time(), frozen);
        assert!(notifications.try_recv().is_err());

        backend.seek_to(9.0);
        backend.play();
        let ended = notifications.recv().await.unwrap();
        assert_eq!(ended.kind, NotificationKind::Ended);
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_track_fails_to_load() {
        let (mut backend, mut notifications) = backend(1.0);
        let generation = LoadGeneration::new(5);
        backend
            .load(&TrackId::new("broken"), true, generation)
            .unwrap();

        let failed = notifications.recv().await.unwrap();
        assert_eq!(failed.generation, generation);
        assert!(matches!(failed.kind, NotificationKind::LoadFailed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn speed_scales_track_length() {
        let (mut backend, mut notifications) = backend(5.0);
        backend
            .load(&TrackId::new("a"), true, LoadGeneration::new(1))
            .unwrap();
        notifications.recv().await.unwrap();

        // 10 s track at 5x ends about 2 s after ready
        let ended = time::timeout(Duration::from_millis(2100), notifications.recv())
            .await
            .expect("track should end within its scaled length")
            .unwrap();
        assert_eq!(ended.kind, NotificationKind::Ended);
    }

    #[test]
    fn end_deadline_rejects_unrepresentable_spans() {
        let start = Instant::now();
        assert_eq!(
            end_deadline(start, 10.0, 2.0),
            Some(start + Duration::from_secs(5))
        );
        assert_eq!(end_deadline(start, -3.0, 1.0), Some(start));
        assert_eq!(end_deadline(start, 1e30, 1.0), None);
        assert_eq!(end_deadline(start, 10.0, 1e-300), None);
    }

    #[tokio::test(start_paused = true)]
    async fn crawling_speed_never_ends_and_never_panics() {
        let (mut backend, mut notifications) = backend(1e-300);
        let generation = LoadGeneration::new(1);
        backend.load(&TrackId::new("a"), true, generation).unwrap();

        let ready = notifications.recv().await.unwrap();
        assert_eq!(ready, BackendNotification::ready(generation, 10.0));

        time::sleep(Duration::from_secs(3600)).await;
        assert!(notifications.try_recv().is_err());
        backend.seek_to(5.0);
        assert_eq!(backend.current_time(), 5.0);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_silences_pending_reports() {
        let (mut backend, mut notifications) = backend(1.0);
        backend
            .load(&TrackId::new("a"), true, LoadGeneration::new(1))
            .unwrap();
        backend.teardown();

        time::sleep(Duration::from_secs(60)).await;
        assert!(notifications.try_recv().is_err());
    }
}
