use serde::Serialize;
use std::sync::{Arc, OnceLock};

/// What the page surface shows for one item: a full-bleed image page with a
/// black backdrop, aspect-fit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryPage {
    pub key: String,
    pub title: String,
    pub image_name: String,
}

/// Shared handle to a materialized page. Identity (`Arc::ptr_eq`) is stable
/// for the lifetime of the item that produced it.
pub type DisplayHandle = Arc<StoryPage>;

#[derive(Debug)]
pub struct CarouselItem {
    key: String,
    title: String,
    image_name: String,
    display: OnceLock<DisplayHandle>,
}

impl CarouselItem {
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        image_name: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            image_name: image_name.into(),
            display: OnceLock::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_resolved(&self) -> bool {
        self.display.get().is_some()
    }

    /// Builds the page on first use and hands out the same handle afterwards.
    pub fn resolve_display(&self) -> DisplayHandle {
        self.display
            .get_or_init(|| {
                Arc::new(StoryPage {
                    key: self.key.clone(),
                    title: self.title.clone(),
                    image_name: self.image_name.clone(),
                })
            })
            .clone()
    }
}

pub trait ItemProvider {
    fn items(&self) -> Vec<CarouselItem>;
}

/// The four character stories shipped with the demo.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShowcaseItems;

impl ItemProvider for ShowcaseItems {
    fn items(&self) -> Vec<CarouselItem> {
        vec![
            CarouselItem::new("butcher", "Billy Butcher", "butcher"),
            CarouselItem::new("frenchie", "Frenchie", "frenchie"),
            CarouselItem::new("hughie", "Hughie Campbell", "hughie"),
            CarouselItem::new("mothers-milk", "Mother's Milk", "mm"),
        ]
    }
}
