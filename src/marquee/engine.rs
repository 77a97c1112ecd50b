use std::time::Instant;

use super::session::{MarqueeFrame, MarqueeParams, MarqueeSession, derive_session};

/// Drives one title view's marquee from the UI loop's frame ticks.
///
/// No thread and no timer: the owner calls `tick` with the frame time and
/// draws whatever frame comes back.
#[derive(Debug, Clone)]
pub struct MarqueeEngine {
    session: Option<MarqueeSession>,
    started_at: Option<Instant>,
    frame: MarqueeFrame,
}

impl Default for MarqueeEngine {
    fn default() -> Self {
        Self {
            session: None,
            started_at: None,
            frame: MarqueeFrame::REST,
        }
    }
}

impl MarqueeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start looping `session` from its first frame at `now`.
    pub fn run(&mut self, session: MarqueeSession, now: Instant) {
        self.frame = session.sample(0);
        self.session = Some(session);
        self.started_at = Some(now);
    }

    /// Cancel whatever is running, derive a fresh session from the current
    /// title and sizes, and run it.
    pub fn restart(
        &mut self,
        title: &str,
        viewport_width: f32,
        text_width: f32,
        params: &MarqueeParams,
        now: Instant,
    ) {
        self.cancel();
        let session = derive_session(title, viewport_width, text_width, params);
        tracing::trace!(
            title,
            cycle_ms = session.cycle_duration_ms,
            start_x = session.start_x,
            "marquee restart"
        );
        self.run(session, now);
    }

    /// Stop and put the view back at rest.
    pub fn cancel(&mut self) {
        self.session = None;
        self.started_at = None;
        self.frame = MarqueeFrame::REST;
    }

    /// Advance to `now` and return the frame to draw.
    pub fn tick(&mut self, now: Instant) -> MarqueeFrame {
        if let (Some(session), Some(started_at)) = (&self.session, self.started_at) {
            let elapsed = now.saturating_duration_since(started_at).as_millis() as u64;
            self.frame = session.sample(elapsed);
        }
        self.frame
    }

    pub fn frame(&self) -> MarqueeFrame {
        self.frame
    }

    pub fn session(&self) -> Option<&MarqueeSession> {
        self.session.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }
}
