use anyhow::Result;
use log::info;
use serde::Serialize;

use super::items::DisplayHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NavigationDirection {
    Forward,
    Reverse,
}

impl NavigationDirection {
    /// Forward only when moving to a later position.
    pub fn between(from: usize, to: usize) -> Self {
        if to > from {
            NavigationDirection::Forward
        } else {
            NavigationDirection::Reverse
        }
    }
}

/// Surface that shows one item at a time.
pub trait PageDisplay: Send {
    fn show(
        &mut self,
        display: &DisplayHandle,
        direction: NavigationDirection,
        animated: bool,
    ) -> Result<()>;

    /// Tears down the whole carousel presentation.
    fn dismiss(&mut self, animated: bool) -> Result<()>;
}

/// Headless surface that reports what it would render through the log.
#[derive(Debug, Default)]
pub struct LogDisplay {
    current: Option<DisplayHandle>,
    dismissed: bool,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&DisplayHandle> {
        self.current.as_ref()
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed
    }
}

impl PageDisplay for LogDisplay {
    fn show(
        &mut self,
        display: &DisplayHandle,
        direction: NavigationDirection,
        animated: bool,
    ) -> Result<()> {
        info!(
            "showing {} ({}.png) {:?}{}",
            display.title,
            display.image_name,
            direction,
            if animated { ", animated" } else { "" }
        );
        self.current = Some(display.clone());
        Ok(())
    }

    fn dismiss(&mut self, animated: bool) -> Result<()> {
        info!("carousel dismissed (animated: {animated})");
        self.dismissed = true;
        Ok(())
    }
}
