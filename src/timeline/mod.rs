pub mod controller;
pub mod listener;
pub mod segment;
pub mod state;


pub use controller::TimelineController;
pub use listener::{TimelineEvent, TimelineListener};
pub use segment::Segment;
pub use state::{SegmentedTimeline, TimelineSnapshot, TimelineStatus, DEFAULT_TICK_INTERVAL};
