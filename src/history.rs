//! Windowed frequency history
//!
//! Samples are kept in a time-ordered sequence, aged out of a sliding window
//! on every update and merged so that each segment of the window holds at
//! most one aggregate sample. The window "breathes": it starts at the minimum
//! span and grows with the age of the oldest sample until it reaches the
//! maximum span.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{ConfigError, GraphConfig};
use crate::render::{self, CurvePoint};

use bucketing::Window;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddError {
    #[error("sample is {ahead:?} in the future")]
    FutureTimestamp { ahead: Duration },
    #[error("sample frequency must be non-zero")]
    ZeroFrequency,
}

/// A timestamped frequency observation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    pub time: Instant,
    pub frequency: u64,
}

impl Sample {
    pub fn new(time: Instant, frequency: u64) -> Self {
        Self { time, frequency }
    }

    /// Merge `other` into this sample.
    ///
    /// Frequencies are summed and the time moves toward `other` in proportion
    /// to its share of the combined frequency, which keeps the merged time at
    /// the frequency-weighted mean of every sample swallowed so far.
    pub fn swallow(&mut self, other: Sample) {
        let total = self.frequency.saturating_add(other.frequency);
        if total == 0 {
            return;
        }

        let weight = other.frequency as f64 / total as f64;
        if other.time >= self.time {
            self.time += (other.time - self.time).mul_f64(weight);
        } else {
            self.time -= (self.time - other.time).mul_f64(weight);
        }
        self.frequency = total;
    }
}

/// Point-in-time summary of the history
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub retained: usize,
    pub total_frequency: u64,
    pub max_frequency: u64,
    pub rejected: usize,
    pub span: Duration,
}

/// Time-ordered samples bounded by a breathing window
#[derive(Clone, Debug)]
pub struct FrequencyHistory {
    points: VecDeque<Sample>,
    config: GraphConfig,
    window: Option<Window>,
    rejected: usize,
}

impl FrequencyHistory {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            points: VecDeque::new(),
            config,
            window: None,
            rejected: 0,
        }
    }

    /// Replace the window configuration. Takes effect on the next update.
    pub fn configure(&mut self, config: GraphConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Add a sample, rejecting timestamps later than the current time
    pub fn add(&mut self, time: Instant, frequency: u64) -> Result<(), AddError> {
        self.add_at(time, frequency, Instant::now())
    }

    /// Add a sample, treating `now` as the current time
    ///
    /// Samples usually arrive close to chronological order, so the insertion
    /// point is searched backward from the tail.
    pub fn add_at(&mut self, time: Instant, frequency: u64, now: Instant) -> Result<(), AddError> {
        if time > now {
            self.rejected += 1;
            let ahead = time - now;
            warn!(?ahead, frequency, "rejecting future-dated sample");
            return Err(AddError::FutureTimestamp { ahead });
        }
        if frequency == 0 {
            self.rejected += 1;
            warn!("rejecting zero-frequency sample");
            return Err(AddError::ZeroFrequency);
        }

        let sample = Sample::new(time, frequency);
        match self.points.back() {
            Some(last) if last.time > time => {
                let index = self
                    .points
                    .iter()
                    .rposition(|p| p.time <= time)
                    .map_or(0, |i| i + 1);
                self.points.insert(index, sample);
            }
            _ => self.points.push_back(sample),
        }

        Ok(())
    }

    /// Expire and merge against the current time
    pub fn update(&mut self) {
        self.update_at(Instant::now());
    }

    /// Expire samples older than the window and merge each segment down to a
    /// single sample.
    ///
    /// Expiry uses the window as it stands before the update. The window is
    /// then derived again from the surviving samples and held until the next
    /// update so that segment queries line up with the merged samples.
    pub fn update_at(&mut self, now: Instant) {
        let cutoff = self.window_at(now).start;

        let before = self.points.len();
        while let Some(front) = self.points.front() {
            if front.time >= cutoff {
                break;
            }
            self.points.pop_front();
        }
        let expired = before - self.points.len();

        let window = self.window_at(now);
        self.window = Some(window);

        if self.points.is_empty() {
            debug!(expired, "graph updated with no samples");
            return;
        }

        let points = std::mem::take(&mut self.points);
        self.points = bucketing::merge_segments(points, &window);

        debug!(
            expired,
            merged = before - expired - self.points.len(),
            retained = self.points.len(),
            span_ms = window.span().as_millis() as u64,
            "graph updated"
        );
    }

    /// Update, then export the curve for the new window
    pub fn tick(&mut self) -> Vec<CurvePoint> {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> Vec<CurvePoint> {
        self.update_at(now);
        render::export(self)
    }

    /// Time of the last update
    pub fn end_time(&self) -> Option<Instant> {
        self.window.map(|w| w.end)
    }

    pub fn start_time(&self) -> Option<Instant> {
        self.window.map(|w| w.start)
    }

    /// Span of the visible window as of the last update
    pub fn time_span(&self) -> Duration {
        self.window.map_or(self.config.min_span, |w| w.span())
    }

    /// The window as of the last update, `None` before the first update
    pub fn window(&self) -> Option<Window> {
        self.window
    }

    fn window_at(&self, end: Instant) -> Window {
        Window::new(end, self.effective_span(end), self.config.segment_count)
    }

    fn effective_span(&self, end: Instant) -> Duration {
        let Some(oldest) = self.points.front() else {
            return self.config.min_span;
        };

        let full = end
            .checked_sub(self.config.max_span)
            .map(|t| t + self.config.max_segment_span());
        match full {
            Some(threshold) if oldest.time < threshold => self.config.max_span,
            _ => end
                .saturating_duration_since(oldest.time)
                .max(self.config.min_span)
                .min(self.config.max_span),
        }
    }

    /// Frequency of the sample in the given segment, or zero when the segment
    /// is empty
    pub fn segment_frequency(&self, segment: usize) -> u64 {
        let Some(window) = self.window() else {
            return 0;
        };
        if segment >= window.segment_count {
            return 0;
        }

        for point in &self.points {
            match window.segment_of(point.time) {
                Some(s) if s == segment => return point.frequency,
                Some(s) if s > segment => return 0,
                None if point.time > window.end => return 0,
                _ => {}
            }
        }
        0
    }

    pub fn max_frequency(&self) -> u64 {
        self.points.iter().map(|p| p.frequency).max().unwrap_or(0)
    }

    pub fn samples(&self) -> &VecDeque<Sample> {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            retained: self.points.len(),
            total_frequency: self.points.iter().map(|p| p.frequency).sum(),
            max_frequency: self.max_frequency(),
            rejected: self.rejected,
            span: self.time_span(),
        }
    }
}

/// Segment arithmetic for a single window
pub mod bucketing {
    use std::collections::VecDeque;
    use std::time::{Duration, Instant};

    use super::Sample;

    /// The visible range `[start, end]` split into equal segments.
    ///
    /// Segments are half-open except the last, which also holds samples
    /// taken exactly at `end`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Window {
        pub start: Instant,
        pub end: Instant,
        pub segment_span: Duration,
        pub segment_count: usize,
    }

    impl Window {
        pub fn new(end: Instant, span: Duration, segment_count: usize) -> Self {
            let start = end.checked_sub(span).unwrap_or(end);
            let segment_span = match u32::try_from(segment_count) {
                Ok(0) => Duration::ZERO,
                Ok(n) => (end - start) / n,
                Err(_) => (end - start) / u32::MAX,
            };

            Self {
                start,
                end,
                segment_span,
                segment_count,
            }
        }

        pub fn span(&self) -> Duration {
            self.end - self.start
        }

        pub fn segment_start(&self, segment: usize) -> Instant {
            if segment >= self.segment_count {
                return self.end;
            }
            match u32::try_from(segment) {
                Ok(n) => self.start + self.segment_span * n,
                Err(_) => self.start + self.segment_span.mul_f64(segment as f64),
            }
        }

        pub fn segment_end(&self, segment: usize) -> Instant {
            if segment + 1 >= self.segment_count {
                self.end
            } else {
                self.segment_start(segment + 1)
            }
        }

        /// Index of the segment holding `time`, if it lies inside the window
        pub fn segment_of(&self, time: Instant) -> Option<usize> {
            if self.segment_count == 0 || time < self.start || time > self.end {
                return None;
            }

            let last = self.segment_count - 1;
            if self.segment_span.is_zero() {
                return Some(last);
            }

            let index = (time - self.start).as_nanos() / self.segment_span.as_nanos();
            Some(usize::try_from(index).unwrap_or(last).min(last))
        }

        pub fn segment_contains(&self, segment: usize, time: Instant) -> bool {
            self.segment_of(time) == Some(segment)
        }
    }

    /// Collapse every run of samples sharing a segment into one sample.
    ///
    /// `points` must be ordered by time. Samples outside the window are
    /// passed through untouched.
    pub fn merge_segments(points: VecDeque<Sample>, window: &Window) -> VecDeque<Sample> {
        let mut merged = VecDeque::with_capacity(points.len().min(window.segment_count + 1));
        let mut points = points.into_iter().peekable();

        for segment in 0..window.segment_count {
            let Some(mut head) = points.next_if(|p| window.segment_contains(segment, p.time))
            else {
                if points.peek().is_none() {
                    break;
                }
                continue;
            };

            while let Some(next) = points.next_if(|p| window.segment_contains(segment, p.time)) {
                head.swallow(next);
            }
            merged.push_back(head);
        }

        merged.extend(points);
        merged
    }
}
