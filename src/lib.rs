//! encore: a terminal music browser.
//!
//! The library is only read once the user grants access, and the catalog is
//! cached between runs. The now-playing title scrolls in lockstep on the
//! full player and the mini player.

pub mod app;
pub mod config;
pub mod library;
pub mod logging;
pub mod marquee;
pub mod permission;
pub mod playback;
pub mod runtime;
pub mod store;
pub mod task;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;
