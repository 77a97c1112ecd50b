//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the current catalog,
//! selection, screen and dialog state.

mod model;

pub use model::*;
