use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::TimelineError;

use super::listener::TimelineListener;
use super::segment::Segment;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);

// Float accumulation of `tick / duration` can land just short of 1.0.
const FILL_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TimelineStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Finished,
}

impl TimelineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimelineStatus::Idle => "idle",
            TimelineStatus::Running => "running",
            TimelineStatus::Paused => "paused",
            TimelineStatus::Finished => "finished",
        }
    }

    /// Idle and Finished are both "stopped".
    pub fn is_stopped(&self) -> bool {
        matches!(self, TimelineStatus::Idle | TimelineStatus::Finished)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSnapshot {
    pub status: TimelineStatus,
    pub active_index: usize,
    pub segment_count: usize,
    pub fills: Vec<f64>,
    pub duration_ms: u64,
    pub run_started_at: Option<DateTime<Utc>>,
}

/// Ordered set of segments plus the state machine that fills them one at a
/// time. Purely synchronous: something else calls [`SegmentedTimeline::tick`]
/// every `tick_interval`.
pub struct SegmentedTimeline {
    segments: Vec<Segment>,
    active_index: usize,
    duration: Duration,
    tick_interval: Duration,
    status: TimelineStatus,
    /// Bumped whenever ticking is rescheduled or cancelled from outside the
    /// tick path. A ticker bound to an older epoch is stale.
    epoch: u64,
    run_started_at: Option<DateTime<Utc>>,
    listener: Option<Box<dyn TimelineListener>>,
}

impl fmt::Debug for SegmentedTimeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentedTimeline")
            .field("segments", &self.segments)
            .field("active_index", &self.active_index)
            .field("duration", &self.duration)
            .field("tick_interval", &self.tick_interval)
            .field("status", &self.status)
            .field("epoch", &self.epoch)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

impl SegmentedTimeline {
    pub fn new(segment_count: usize, duration: Duration) -> Result<Self, TimelineError> {
        if segment_count < 1 {
            return Err(TimelineError::invalid("segment count must be at least 1"));
        }
        if duration.is_zero() {
            return Err(TimelineError::invalid("segment duration must be positive"));
        }

        Ok(Self {
            segments: vec![Segment::new(); segment_count],
            active_index: 0,
            duration,
            tick_interval: DEFAULT_TICK_INTERVAL,
            status: TimelineStatus::Idle,
            epoch: 0,
            run_started_at: None,
            listener: None,
        })
    }

    /// Same as [`SegmentedTimeline::new`] but takes the duration in seconds,
    /// rejecting zero, negative, non-finite and unrepresentably large values.
    pub fn with_duration_secs(segment_count: usize, secs: f64) -> Result<Self, TimelineError> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(TimelineError::invalid(format!(
                "segment duration must be positive, got {secs}"
            )));
        }
        let duration = Duration::try_from_secs_f64(secs).map_err(|err| {
            TimelineError::invalid(format!("segment duration {secs}s is out of range: {err}"))
        })?;
        Self::new(segment_count, duration)
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Result<Self, TimelineError> {
        if tick_interval.is_zero() {
            return Err(TimelineError::invalid("tick interval must be positive"));
        }
        self.tick_interval = tick_interval;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn fill_at(&self, index: usize) -> Result<f64, TimelineError> {
        self.segments
            .get(index)
            .map(Segment::fill)
            .ok_or(TimelineError::OutOfRange {
                index,
                len: self.segments.len(),
            })
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn status(&self) -> TimelineStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == TimelineStatus::Running
    }

    pub fn is_paused(&self) -> bool {
        self.status == TimelineStatus::Paused
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn run_started_at(&self) -> Option<DateTime<Utc>> {
        self.run_started_at
    }

    /// Fill added to the active segment per tick.
    pub fn fill_step(&self) -> f64 {
        self.tick_interval.as_secs_f64() / self.duration.as_secs_f64()
    }

    pub fn snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot {
            status: self.status,
            active_index: self.active_index,
            segment_count: self.segments.len(),
            fills: self.segments.iter().map(Segment::fill).collect(),
            duration_ms: u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX),
            run_started_at: self.run_started_at,
        }
    }

    /// Registers `listener`, returning the one it replaces.
    pub fn set_listener(
        &mut self,
        listener: Box<dyn TimelineListener>,
    ) -> Option<Box<dyn TimelineListener>> {
        self.listener.replace(listener)
    }

    pub fn take_listener(&mut self) -> Option<Box<dyn TimelineListener>> {
        self.listener.take()
    }

    /// (Re)starts ticking at the current active index with its fill reset.
    /// From `Finished` this begins a new run.
    pub fn start_animation(&mut self) {
        self.begin_run_if_finished();
        self.segments[self.active_index].set_fill(0.0);
        self.schedule();
        debug!(
            "timeline started at segment {}/{}",
            self.active_index,
            self.segments.len()
        );
    }

    /// Applies one tick to the active segment. Returns `false` when the
    /// timeline is not running and the tick was ignored.
    pub fn tick(&mut self) -> bool {
        if self.status != TimelineStatus::Running {
            return false;
        }

        let step = self.fill_step();
        let segment = &mut self.segments[self.active_index];
        let next = segment.fill() + step;
        if next >= 1.0 - FILL_EPSILON {
            segment.set_fill(1.0);
            self.advance();
        } else {
            segment.set_fill(next);
        }
        true
    }

    /// Forces the active segment full and moves on. At the last segment this
    /// finishes the run. A finished run ignores it.
    pub fn skip(&mut self) {
        if self.status == TimelineStatus::Finished {
            debug!("skip ignored, timeline already finished");
            return;
        }
        self.cancel_tick();
        self.segments[self.active_index].set_fill(1.0);
        self.advance();
    }

    /// Restarts the previous segment, or the first one when already there.
    pub fn rewind(&mut self) {
        self.cancel_tick();
        self.segments[self.active_index].set_fill(0.0);

        let new_index = self.active_index.saturating_sub(1);
        self.segments[new_index].set_fill(0.0);
        self.active_index = new_index;
        self.begin_run_if_finished();
        self.schedule();
        self.notify_index_changed(new_index);
    }

    pub fn jump_to(&mut self, index: usize) -> Result<(), TimelineError> {
        if index >= self.segments.len() {
            return Err(TimelineError::OutOfRange {
                index,
                len: self.segments.len(),
            });
        }

        self.cancel_tick();
        for (position, segment) in self.segments.iter_mut().enumerate() {
            segment.set_fill(if position < index { 1.0 } else { 0.0 });
        }
        self.active_index = index;
        self.begin_run_if_finished();
        self.schedule();
        self.notify_index_changed(index);
        Ok(())
    }

    pub fn finish(&mut self) {
        self.cancel_tick();
        for segment in &mut self.segments {
            segment.set_fill(1.0);
        }
        self.status = TimelineStatus::Finished;
        debug!("timeline finished after {} segments", self.segments.len());
        if let Some(listener) = self.listener.as_mut() {
            listener.on_finished();
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.status != TimelineStatus::Running {
            return false;
        }
        self.epoch = self.epoch.wrapping_add(1);
        self.status = TimelineStatus::Paused;
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.status != TimelineStatus::Paused {
            return false;
        }
        self.schedule();
        true
    }

    /// Stops ticking and leaves fills and index untouched.
    pub fn cancel(&mut self) {
        self.cancel_tick();
        self.status = TimelineStatus::Idle;
    }

    pub fn reset(&mut self) {
        self.cancel();
        for segment in &mut self.segments {
            segment.set_fill(0.0);
        }
        self.active_index = 0;
        self.run_started_at = None;
    }

    fn advance(&mut self) {
        let new_index = self.active_index + 1;
        if new_index < self.segments.len() {
            self.active_index = new_index;
            self.segments[new_index].set_fill(0.0);
            if self.status != TimelineStatus::Running {
                self.schedule();
            }
            self.notify_index_changed(new_index);
        } else {
            self.finish();
        }
    }

    fn begin_run_if_finished(&mut self) {
        if self.status == TimelineStatus::Finished {
            self.run_started_at = Some(Utc::now());
        }
    }

    fn schedule(&mut self) {
        if self.run_started_at.is_none() {
            self.run_started_at = Some(Utc::now());
        }
        self.epoch = self.epoch.wrapping_add(1);
        self.status = TimelineStatus::Running;
    }

    fn cancel_tick(&mut self) {
        if self.status == TimelineStatus::Running {
            self.epoch = self.epoch.wrapping_add(1);
        }
    }

    fn notify_index_changed(&mut self, index: usize) {
        if let Some(listener) = self.listener.as_mut() {
            listener.on_active_index_changed(index);
        }
    }
}
