pub mod controller;
pub mod display;
pub mod input;
pub mod items;


pub use controller::CarouselController;
pub use display::{LogDisplay, NavigationDirection, PageDisplay};
pub use input::UserInput;
pub use items::{CarouselItem, DisplayHandle, ItemProvider, ShowcaseItems, StoryPage};
