//! Looping scroll-and-fade animation for track titles.
//!
//! A `MarqueeSession` is a pure function of the title, the view and text
//! widths and `MarqueeParams`; two engines fed the same inputs at the same
//! instant produce the same frames.

mod engine;
mod session;

pub use engine::MarqueeEngine;
pub use session::{MarqueeFrame, MarqueeParams, MarqueeSession, derive_session};
