//! Frame-rate sampling.
//!
//! The host drives [`FpsAggregator::on_frame`] once per rendered frame (or
//! [`FpsAggregator::tick`] with batched counts). Frames are accumulated over
//! a refresh window; the finished window yields the average, and averages are
//! forwarded to the tracker on a coarser send interval. The tracker applies
//! its own rate limit on top, so duplicate wiring cannot flood the collector.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::tracker::Tracker;

/// Accepted refresh window bounds, in seconds.
const REFRESH_MIN: f32 = 0.1;
const REFRESH_MAX: f32 = 10.0;

/// Default spacing between forwarded fps events.
const DEFAULT_SEND_INTERVAL: Duration = Duration::from_secs(180);

/// Accumulates frame counts into a rolling average and forwards it to the
/// tracker at a bounded cadence.
pub struct FpsAggregator {
    tracker: Arc<Tracker>,
    refresh_window: f32,
    send_interval: Duration,
    send_events: bool,
    frame_count: u32,
    elapsed: f32,
    last_average: f32,
    last_sent: Instant,
}

impl FpsAggregator {
    /// Aggregator with a refresh window in seconds, clamped to 0.1–10.0.
    pub fn new(tracker: Arc<Tracker>, refresh_window_seconds: f32) -> Self {
        Self {
            tracker,
            refresh_window: refresh_window_seconds.clamp(REFRESH_MIN, REFRESH_MAX),
            send_interval: DEFAULT_SEND_INTERVAL,
            send_events: true,
            frame_count: 0,
            elapsed: 0.0,
            last_average: 0.0,
            last_sent: Instant::now(),
        }
    }

    /// Override the forwarding cadence.
    pub fn send_interval(mut self, interval: Duration) -> Self {
        self.send_interval = interval;
        self
    }

    /// Keep measuring but never forward events.
    pub fn silent(mut self) -> Self {
        self.send_events = false;
        self
    }

    /// One rendered frame took `delta_seconds`.
    pub fn on_frame(&mut self, delta_seconds: f32) {
        self.tick(1, delta_seconds);
    }

    /// Account `frames` frames over `delta_seconds` of game time.
    ///
    /// Closing out a refresh window recomputes the average; afterwards, if the
    /// send interval has elapsed and a measurement exists, it is forwarded
    /// through the tracker's normal funnel.
    pub fn tick(&mut self, frames: u32, delta_seconds: f32) {
        if self.elapsed < self.refresh_window {
            self.elapsed += delta_seconds;
            self.frame_count += frames;
        } else if self.elapsed > 0.0 && self.frame_count > 0 {
            self.last_average = self.frame_count as f32 / self.elapsed;
            self.frame_count = 0;
            self.elapsed = 0.0;
            debug!(fps = self.last_average, "frame-rate window closed");
        }

        if !self.send_events {
            return;
        }
        let now = Instant::now();
        if now.saturating_duration_since(self.last_sent) >= self.send_interval
            && self.last_average > 0.0
        {
            self.last_sent = now;
            self.tracker.track_fps(self.last_average as u32);
        }
    }

    /// Latest completed window's average, 0.0 before the first window closes.
    pub fn current_fps(&self) -> f32 {
        self.last_average
    }
}
