use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

/// Receives timeline notifications. Callbacks run synchronously inside the
/// operation or tick that caused them, while the timeline is borrowed, so an
/// implementation must not call back into the same timeline.
pub trait TimelineListener: Send {
    fn on_active_index_changed(&mut self, index: usize);
    fn on_finished(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum TimelineEvent {
    IndexChanged { index: usize },
    Finished,
}

/// Forwards notifications into a channel so the consumer can react outside
/// the timeline's borrow.
impl TimelineListener for UnboundedSender<TimelineEvent> {
    fn on_active_index_changed(&mut self, index: usize) {
        // A closed receiver means the consumer is gone; nothing left to notify.
        let _ = self.send(TimelineEvent::IndexChanged { index });
    }

    fn on_finished(&mut self) {
        let _ = self.send(TimelineEvent::Finished);
    }
}
