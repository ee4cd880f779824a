//! Rate-limited progress reporting with throughput and ETA.
//!
//! A [`Progress`] is driven by the index of the item currently being
//! dispatched. It keeps a sliding window of `(index, instant)` samples and
//! derives throughput from the oldest and newest sample in that window.
//! Output is advisory only and goes to a [`ProgressSink`].

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;

/// Minimum wall-clock interval between two updates.
pub const UPDATE_INTERVAL: Duration = Duration::from_millis(200);

/// Amount of history kept in the sliding window.
pub const HISTORY: Duration = Duration::from_secs(60);

/// Maximum number of samples in the window (60 s at one sample per 200 ms).
pub const MAX_SAMPLES: usize = (HISTORY.as_millis() / UPDATE_INTERVAL.as_millis()) as usize;

/// One progress update.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    /// Current index, clamped to `total`
    pub index: usize,
    /// Total number of items
    pub total: usize,
    /// Items per second over the sample window
    pub rate: f64,
    /// Estimated remaining time, `None` when unknown
    pub eta: Option<Duration>,
}

impl ProgressSnapshot {
    /// Completion in percent.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            100.0 * self.index as f64 / self.total as f64
        }
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let eta = self
            .eta
            .map(format_eta)
            .unwrap_or_else(|| "?".to_string());
        write!(
            f,
            "{:<12}{:<12}{:<12}",
            format!("{:.2}%", self.percent()),
            format!("{:.1}/s", self.rate),
            eta
        )
    }
}

/// Formats a duration as `H:MM:SS`.
pub fn format_eta(eta: Duration) -> String {
    let secs = eta.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// Destination for progress updates.
pub trait ProgressSink: Send {
    /// Renders one update.
    fn render(&mut self, snapshot: &ProgressSnapshot);

    /// Called once when the tracked work is done.
    fn finish(&mut self) {}
}

/// Sink that discards all updates.
#[derive(Debug, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn render(&mut self, _snapshot: &ProgressSnapshot) {}
}

/// Sink that emits updates as debug-level tracing events.
#[derive(Debug, Default)]
pub struct LogSink {
    label: String,
}

impl LogSink {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl ProgressSink for LogSink {
    fn render(&mut self, snapshot: &ProgressSnapshot) {
        debug!(stage = %self.label, "{}", snapshot);
    }
}

/// Stateful progress tracker for `total` items.
pub struct Progress {
    total: usize,
    last_update: Option<Instant>,
    samples: VecDeque<(usize, Instant)>,
    sink: Box<dyn ProgressSink>,
}

impl Progress {
    /// Creates a tracker that renders to `sink`.
    pub fn new(total: usize, sink: Box<dyn ProgressSink>) -> Self {
        Self {
            total,
            last_update: None,
            samples: VecDeque::with_capacity(MAX_SAMPLES + 1),
            sink,
        }
    }

    /// Creates a tracker that discards its output.
    pub fn silent(total: usize) -> Self {
        Self::new(total, Box::new(NullSink))
    }

    /// Records progress at `index` using the current time.
    pub fn tick(&mut self, index: usize) -> Option<ProgressSnapshot> {
        self.tick_at(index, Instant::now())
    }

    /// Records progress at `index` observed at `now`.
    ///
    /// Returns the rendered snapshot, or `None` when the update was
    /// suppressed by the rate limit.
    pub fn tick_at(&mut self, index: usize, now: Instant) -> Option<ProgressSnapshot> {
        if let Some(last) = self.last_update {
            if now.saturating_duration_since(last) < UPDATE_INTERVAL {
                return None;
            }
        }
        self.last_update = Some(now);

        let index = index.min(self.total);
        self.samples.push_back((index, now));
        while self.samples.len() > MAX_SAMPLES {
            self.samples.pop_front();
        }

        let snapshot = self.snapshot(index, now);
        self.sink.render(&snapshot);
        Some(snapshot)
    }

    /// Signals the sink that no more updates will follow.
    pub fn finish(&mut self) {
        self.sink.finish();
    }

    fn snapshot(&self, index: usize, now: Instant) -> ProgressSnapshot {
        let mut rate = 0.0;
        let mut eta = None;

        if self.samples.len() > 1 {
            if let Some(&(first_index, first_time)) = self.samples.front() {
                let elapsed = now.saturating_duration_since(first_time).as_secs_f64();
                if elapsed > 0.0 {
                    rate = index.saturating_sub(first_index) as f64 / elapsed;
                }
                if rate > 0.0 {
                    let remaining = (self.total - index) as f64 / rate;
                    eta = Some(Duration::from_secs_f64(remaining));
                }
            }
        }

        ProgressSnapshot {
            index,
            total: self.total,
            rate,
            eta,
        }
    }
}
