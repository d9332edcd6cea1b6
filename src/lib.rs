pub mod carousel;
pub mod error;
pub mod settings;
pub mod timeline;
mod utils;

use std::{
    io::{self, BufRead},
    thread,
};

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::sync::mpsc;

use carousel::{CarouselController, ItemProvider, LogDisplay, ShowcaseItems, UserInput};
use settings::{settings_path, SettingsStore};

pub use error::TimelineError;
pub use timeline::{SegmentedTimeline, TimelineController, TimelineEvent, TimelineListener};

const HELP: &str = "commands: l (previous), r (next), d (dismiss), p (pause), c (continue), \
<n> (select item), tap <x> <width>, q (quit)";

pub async fn run() -> Result<()> {
    let store = SettingsStore::new(settings_path())?;
    let mut settings = store.carousel();
    settings.apply_env_overrides()?;
    settings.validate()?;

    // RUST_LOG wins over the defaults below.
    let default_level = if settings.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    info!(
        "Showcase starting up ({}ms per item, settings from {})",
        settings.segment_duration_ms,
        store.path().display()
    );
    info!("{HELP}");

    let mut carousel = CarouselController::new(ShowcaseItems.items(), LogDisplay::new(), &settings)?;

    let (tx, rx) = mpsc::channel(16);
    spawn_stdin_reader(tx)?;

    carousel.run(rx).await?;
    info!("Showcase closed");
    Ok(())
}

// A plain thread rather than tokio's stdin: a blocked read must not hold up
// runtime shutdown once the carousel is dismissed.
fn spawn_stdin_reader(tx: mpsc::Sender<UserInput>) -> Result<()> {
    thread::Builder::new()
        .name("stdin-input".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let command = line.trim();
                if command.is_empty() {
                    continue;
                }
                if command.eq_ignore_ascii_case("q") || command.eq_ignore_ascii_case("quit") {
                    break;
                }
                match UserInput::parse(command) {
                    Ok(input) => {
                        if tx.blocking_send(input).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!("{err}; {HELP}"),
                }
            }
        })
        .context("failed to spawn stdin reader")?;
    Ok(())
}
