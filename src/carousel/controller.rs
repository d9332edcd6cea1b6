use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    error::TimelineError,
    settings::CarouselSettings,
    timeline::{SegmentedTimeline, TimelineController, TimelineEvent},
};

use super::{
    display::{NavigationDirection, PageDisplay},
    input::UserInput,
    items::CarouselItem,
};

// Set to true to trace every input and page change
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Full-screen story carousel: one item on screen, a segmented timeline
/// advancing through them, taps to navigate, swipe down to close.
pub struct CarouselController<D: PageDisplay> {
    items: Vec<CarouselItem>,
    display: D,
    timeline: TimelineController,
    events: mpsc::UnboundedReceiver<TimelineEvent>,
    current_index: usize,
    dismiss_on_finish: bool,
    dismissed: CancellationToken,
}

impl<D: PageDisplay> CarouselController<D> {
    pub fn new(items: Vec<CarouselItem>, display: D, settings: &CarouselSettings) -> Result<Self> {
        if items.is_empty() {
            return Err(TimelineError::invalid("carousel needs at least one item"))
                .context("cannot build carousel");
        }

        let (tx, events) = mpsc::unbounded_channel();
        let mut timeline = SegmentedTimeline::new(items.len(), settings.segment_duration())
            .and_then(|timeline| timeline.with_tick_interval(settings.tick_interval()))
            .context("invalid carousel timing")?;
        timeline.set_listener(Box::new(tx));

        Ok(Self {
            items,
            display,
            timeline: TimelineController::new(timeline),
            events,
            current_index: 0,
            dismiss_on_finish: settings.dismiss_on_finish,
            dismissed: CancellationToken::new(),
        })
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn timeline(&self) -> &TimelineController {
        &self.timeline
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed.is_cancelled()
    }

    /// Token cancelled once the carousel is dismissed.
    pub fn dismissed_token(&self) -> CancellationToken {
        self.dismissed.clone()
    }

    /// Shows the first item and starts the timeline.
    pub async fn start(&mut self) -> Result<()> {
        self.current_index = 0;
        self.show(0, NavigationDirection::Forward);
        self.timeline
            .start_animation()
            .await
            .context("failed to start carousel timeline")?;
        log_info!("carousel started with {} items", self.items.len());
        Ok(())
    }

    pub async fn handle_input(&mut self, input: UserInput) -> Result<()> {
        if self.is_dismissed() {
            log_debug!("ignoring {input:?}, carousel already dismissed");
            return Ok(());
        }
        log_debug!("input {input:?} at item {}", self.current_index);

        match input {
            UserInput::TapRight => self.timeline.skip().await,
            UserInput::TapLeft => self.timeline.rewind().await,
            UserInput::Select(index) => {
                if let Err(err) = self.timeline.jump_to(index).await {
                    log_warn!("cannot select item: {err}");
                }
            }
            UserInput::SwipeDown => {
                self.dismiss().await;
                return Ok(());
            }
            UserInput::Pause => {
                self.timeline.pause().await;
            }
            UserInput::Resume => {
                self.timeline.resume().await;
            }
        }

        self.apply_pending().await;
        Ok(())
    }

    /// Applies every timeline notification already queued.
    pub async fn apply_pending(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.apply_event(event).await;
        }
    }

    async fn apply_event(&mut self, event: TimelineEvent) {
        match event {
            TimelineEvent::IndexChanged { index } => {
                if index >= self.items.len() {
                    log_warn!(
                        "index {index} out of range for {} items, ignoring",
                        self.items.len()
                    );
                    return;
                }
                let direction = NavigationDirection::between(self.current_index, index);
                self.show(index, direction);
                self.current_index = index;
            }
            TimelineEvent::Finished => {
                if self.dismiss_on_finish {
                    log_info!("all {} items shown", self.items.len());
                    self.dismiss().await;
                } else {
                    log_debug!("timeline finished, staying on item {}", self.current_index);
                }
            }
        }
    }

    fn show(&mut self, index: usize, direction: NavigationDirection) {
        let handle = self.items[index].resolve_display();
        if let Err(err) = self.display.show(&handle, direction, true) {
            log_error!("failed to show item {index} ({}): {err:?}", handle.key);
        }
    }

    /// Stops the timeline and closes the presentation. Idempotent.
    pub async fn dismiss(&mut self) {
        if self.is_dismissed() {
            return;
        }
        self.timeline.cancel().await;
        if let Err(err) = self.display.dismiss(true) {
            log_error!("failed to dismiss carousel: {err:?}");
        }
        self.dismissed.cancel();
    }

    /// Starts the carousel and reacts to timeline notifications and user input
    /// until it is dismissed or the input stream closes.
    pub async fn run(&mut self, mut inputs: mpsc::Receiver<UserInput>) -> Result<()> {
        self.start().await?;

        let dismissed = self.dismissed.clone();
        loop {
            tokio::select! {
                _ = dismissed.cancelled() => break,
                event = self.events.recv() => match event {
                    Some(event) => self.apply_event(event).await,
                    None => break,
                },
                input = inputs.recv() => match input {
                    Some(input) => self.handle_input(input).await?,
                    None => {
                        log_info!("input closed, dismissing carousel");
                        self.dismiss().await;
                    }
                },
            }
        }

        self.timeline.take_listener().await;
        Ok(())
    }
}
