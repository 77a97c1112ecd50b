use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config;
use crate::library::{DirectoryIndex, MediaIndex};
use crate::playback::{PlaybackSession, RodioSession};
use crate::store::StateStore;

mod controller;
mod event_loop;
mod host;
mod settings;
mod startup;

pub use controller::{Control, Controller};
pub use host::{ACCESS_FILE, Grant, TerminalHost};

pub fn run() -> anyhow::Result<()> {
    let (mut settings, config_warning) = settings::load_settings();

    // An explicit directory on the command line wins over `library.root`.
    if let Some(dir) = env::args_os().nth(1) {
        settings.library.root = PathBuf::from(dir);
    }

    let state_dir = settings.state_dir();
    let log_path = crate::logging::init(&state_dir)?;
    if let Some(msg) = config_warning {
        tracing::warn!("{msg}");
    }
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        root = %settings.library.root.display(),
        state_dir = %state_dir.display(),
        log = %log_path.display(),
        "encore starting"
    );

    let store = StateStore::open(&state_dir);
    let index: Arc<dyn MediaIndex> = Arc::new(DirectoryIndex::new(settings.library.clone()));
    let session = Arc::new(RodioSession::new(Arc::clone(&index)));
    let host = TerminalHost::new(config::config_dir().unwrap_or_else(|| state_dir.clone()).join(ACCESS_FILE));

    let playback: Arc<dyn PlaybackSession> = session.clone();
    let controller = Controller::new(&settings, &store, index, playback, host);

    let mut terminal = startup::enter()?;
    let run_result = event_loop::run(controller, &mut terminal);

    session.quit_softly(Duration::from_millis(settings.playback.quit_fade_out_ms));
    startup::restore(&mut terminal)?;

    if let Err(e) = &run_result {
        tracing::error!(error = %e, "event loop failed");
    }
    tracing::info!("encore stopped");
    run_result
}

#[cfg(test)]
mod tests;
