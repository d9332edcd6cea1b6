use std::{sync::Arc, time::Duration};

use log::{debug, info};
use tokio::{sync::Mutex, task::JoinHandle, time};

use crate::error::TimelineError;

use super::{SegmentedTimeline, TimelineListener, TimelineSnapshot, TimelineStatus};

// Set to true to enable per-run logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Drives a [`SegmentedTimeline`] from a tokio interval. Cheap to clone; all
/// clones share the same timeline and the same single ticker task.
#[derive(Clone)]
pub struct TimelineController {
    state: Arc<Mutex<SegmentedTimeline>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl TimelineController {
    pub fn new(timeline: SegmentedTimeline) -> Self {
        Self {
            state: Arc::new(Mutex::new(timeline)),
            ticker: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn snapshot(&self) -> TimelineSnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn status(&self) -> TimelineStatus {
        self.state.lock().await.status()
    }

    pub async fn active_index(&self) -> usize {
        self.state.lock().await.active_index()
    }

    pub async fn set_listener(
        &self,
        listener: Box<dyn TimelineListener>,
    ) -> Option<Box<dyn TimelineListener>> {
        self.state.lock().await.set_listener(listener)
    }

    pub async fn take_listener(&self) -> Option<Box<dyn TimelineListener>> {
        self.state.lock().await.take_listener()
    }

    /// Fails with [`TimelineError::SchedulerUnavailable`] outside a tokio
    /// runtime, before any state is touched.
    pub async fn start_animation(&self) -> Result<(), TimelineError> {
        tokio::runtime::Handle::try_current()
            .map_err(|err| TimelineError::SchedulerUnavailable(err.to_string()))?;

        let mut ticker_guard = self.ticker.lock().await;
        abort_ticker(&mut ticker_guard);

        let (epoch, tick_interval) = {
            let mut state = self.state.lock().await;
            state.start_animation();
            log_info!(
                "timeline started: {} segments, {}ms each",
                state.len(),
                state.duration().as_millis()
            );
            (state.epoch(), state.tick_interval())
        };

        *ticker_guard = Some(self.spawn_ticker(epoch, tick_interval));
        Ok(())
    }

    pub async fn skip(&self) {
        self.reschedule(SegmentedTimeline::skip).await;
    }

    pub async fn rewind(&self) {
        self.reschedule(SegmentedTimeline::rewind).await;
    }

    pub async fn jump_to(&self, index: usize) -> Result<(), TimelineError> {
        self.reschedule(|state| state.jump_to(index)).await
    }

    /// No-op unless paused; a running ticker is left alone.
    pub async fn resume(&self) -> bool {
        let mut ticker_guard = self.ticker.lock().await;
        let (resumed, epoch, tick_interval) = {
            let mut state = self.state.lock().await;
            (state.resume(), state.epoch(), state.tick_interval())
        };
        if resumed {
            abort_ticker(&mut ticker_guard);
            *ticker_guard = Some(self.spawn_ticker(epoch, tick_interval));
            debug!("timeline resumed");
        }
        resumed
    }

    pub async fn pause(&self) -> bool {
        let mut ticker_guard = self.ticker.lock().await;
        let paused = self.state.lock().await.pause();
        if paused {
            abort_ticker(&mut ticker_guard);
            debug!("timeline paused");
        }
        paused
    }

    pub async fn finish(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        abort_ticker(&mut ticker_guard);
        self.state.lock().await.finish();
    }

    /// Stops ticking without notifying; fills and index stay as they are.
    pub async fn cancel(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        abort_ticker(&mut ticker_guard);
        let mut state = self.state.lock().await;
        let previous = state.status();
        state.cancel();
        info!("timeline cancelled while {}", previous.as_str());
    }

    pub async fn reset(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        abort_ticker(&mut ticker_guard);
        self.state.lock().await.reset();
    }

    /// Whether a ticker task is currently alive.
    pub async fn has_live_ticker(&self) -> bool {
        self.ticker
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Applies `op` and hands back its result. If `op` moved the epoch, the
    /// old ticker is aborted and a fresh one spawned when the timeline came
    /// out running; otherwise (a rejected jump, a skip after finishing) the
    /// ticker is left alone. The ticker guard is held throughout so two
    /// operations can't each leave a ticker behind.
    async fn reschedule<T, F>(&self, op: F) -> T
    where
        F: FnOnce(&mut SegmentedTimeline) -> T,
    {
        let mut ticker_guard = self.ticker.lock().await;

        let (output, rescheduled, running, epoch, tick_interval) = {
            let mut state = self.state.lock().await;
            let before = state.epoch();
            let output = op(&mut state);
            (
                output,
                state.epoch() != before,
                state.is_running(),
                state.epoch(),
                state.tick_interval(),
            )
        };

        if rescheduled {
            abort_ticker(&mut ticker_guard);
            if running {
                *ticker_guard = Some(self.spawn_ticker(epoch, tick_interval));
            }
        }
        output
    }

    fn spawn_ticker(&self, epoch: u64, tick_interval: Duration) -> JoinHandle<()> {
        let state = self.state.clone();

        tokio::spawn(async move {
            let mut interval =
                time::interval_at(time::Instant::now() + tick_interval, tick_interval);
            loop {
                interval.tick().await;

                let mut guard = state.lock().await;
                if guard.epoch() != epoch || !guard.is_running() {
                    break;
                }
                guard.tick();
                if guard.status() == TimelineStatus::Finished {
                    break;
                }
            }
        })
    }
}

fn abort_ticker(slot: &mut Option<JoinHandle<()>>) {
    if let Some(handle) = slot.take() {
        handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::TimelineEvent;
    use tokio::sync::mpsc;

    fn controller(
        count: usize,
        secs: u64,
    ) -> (TimelineController, mpsc::UnboundedReceiver<TimelineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut timeline = SegmentedTimeline::new(count, Duration::from_secs(secs)).unwrap();
        timeline.set_listener(Box::new(tx));
        (TimelineController::new(timeline), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<TimelineEvent>) -> Vec<TimelineEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn auto_advances_then_skips_to_finish() {
        let (timeline, mut rx) = controller(3, 5);
        timeline.start_animation().await.unwrap();

        time::sleep(Duration::from_millis(4_900)).await;
        assert!(drain(&mut rx).is_empty());

        time::sleep(Duration::from_millis(150)).await;
        assert_eq!(drain(&mut rx), vec![TimelineEvent::IndexChanged { index: 1 }]);

        timeline.skip().await;
        assert_eq!(drain(&mut rx), vec![TimelineEvent::IndexChanged { index: 2 }]);

        timeline.skip().await;
        assert_eq!(drain(&mut rx), vec![TimelineEvent::Finished]);

        let snapshot = timeline.snapshot().await;
        assert_eq!(snapshot.status, TimelineStatus::Finished);
        assert_eq!(snapshot.fills, vec![1.0, 1.0, 1.0]);
        assert!(!timeline.has_live_ticker().await);
    }

    #[tokio::test(start_paused = true)]
    async fn single_segment_finishes_without_index_change() {
        let (timeline, mut rx) = controller(1, 2);
        timeline.start_animation().await.unwrap();

        time::sleep(Duration::from_millis(2_050)).await;
        assert_eq!(drain(&mut rx), vec![TimelineEvent::Finished]);
        assert_eq!(timeline.status().await, TimelineStatus::Finished);
    }

    #[tokio::test(start_paused = true)]
    async fn start_pause_resume_keeps_a_single_ticker() {
        let (timeline, _rx) = controller(2, 1);
        timeline.start_animation().await.unwrap();
        timeline.start_animation().await.unwrap();
        assert!(timeline.pause().await);
        assert!(!timeline.pause().await);
        assert!(timeline.resume().await);
        assert!(!timeline.resume().await);

        time::sleep(Duration::from_millis(505)).await;
        let fill = timeline.snapshot().await.fills[0];
        // One ticker: 50 ticks of 1%. Two would be roughly double.
        assert!((0.49..=0.51).contains(&fill), "fill was {fill}");
        assert!(timeline.has_live_ticker().await);
    }

    #[tokio::test(start_paused = true)]
    async fn paused_timeline_does_not_advance() {
        let (timeline, mut rx) = controller(2, 1);
        timeline.start_animation().await.unwrap();
        time::sleep(Duration::from_millis(305)).await;
        timeline.pause().await;

        let before = timeline.snapshot().await.fills[0];
        time::sleep(Duration::from_secs(3)).await;
        let after = timeline.snapshot().await;
        assert_eq!(after.fills[0], before);
        assert_eq!(after.status, TimelineStatus::Paused);
        assert!(drain(&mut rx).is_empty());

        timeline.resume().await;
        time::sleep(Duration::from_millis(750)).await;
        assert_eq!(drain(&mut rx), vec![TimelineEvent::IndexChanged { index: 1 }]);
    }

    #[tokio::test(start_paused = true)]
    async fn jump_out_of_range_leaves_ticker_running() {
        let (timeline, _rx) = controller(3, 5);
        timeline.start_animation().await.unwrap();

        let err = timeline.jump_to(3).await.unwrap_err();
        assert_eq!(err, TimelineError::OutOfRange { index: 3, len: 3 });
        assert!(timeline.has_live_ticker().await);
        assert_eq!(timeline.status().await, TimelineStatus::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_without_notifying() {
        let (timeline, mut rx) = controller(2, 1);
        timeline.start_animation().await.unwrap();
        time::sleep(Duration::from_millis(205)).await;
        timeline.cancel().await;

        time::sleep(Duration::from_secs(5)).await;
        assert!(drain(&mut rx).is_empty());
        assert_eq!(timeline.status().await, TimelineStatus::Idle);
        assert!(!timeline.has_live_ticker().await);
    }

    #[tokio::test(start_paused = true)]
    async fn skip_after_finish_spawns_nothing_and_rewind_restarts() {
        let (timeline, mut rx) = controller(2, 1);
        timeline.start_animation().await.unwrap();
        timeline.skip().await;
        timeline.skip().await;
        assert_eq!(
            drain(&mut rx),
            vec![TimelineEvent::IndexChanged { index: 1 }, TimelineEvent::Finished]
        );
        assert!(!timeline.has_live_ticker().await);

        timeline.skip().await;
        assert!(drain(&mut rx).is_empty());
        assert!(!timeline.has_live_ticker().await);
        assert_eq!(timeline.status().await, TimelineStatus::Finished);

        timeline.rewind().await;
        assert_eq!(drain(&mut rx), vec![TimelineEvent::IndexChanged { index: 0 }]);
        assert!(timeline.has_live_ticker().await);
        time::sleep(Duration::from_millis(1_050)).await;
        assert_eq!(drain(&mut rx), vec![TimelineEvent::IndexChanged { index: 1 }]);
    }

    #[test]
    fn start_outside_runtime_is_a_scheduler_error() {
        let (timeline, _rx) = controller(2, 1);
        let result = poll_once(timeline.start_animation());
        assert!(matches!(result, Err(TimelineError::SchedulerUnavailable(_))));
        assert_eq!(poll_once(timeline.status()), TimelineStatus::Idle);
    }

    // Polls without entering a runtime, the way a plain host thread would.
    fn poll_once<F: std::future::Future>(fut: F) -> F::Output {
        use std::task::{Context, Poll, Waker};

        let mut cx = Context::from_waker(Waker::noop());
        match std::pin::pin!(fut).poll(&mut cx) {
            Poll::Ready(out) => out,
            Poll::Pending => panic!("future was not ready on first poll"),
        }
    }
}
