use std::sync::Arc;
use std::time::Instant;

use unicode_width::UnicodeWidthStr;

use crate::library::TrackId;
use crate::marquee::{MarqueeEngine, MarqueeFrame, MarqueeParams, derive_session};

use super::session::{PlaybackError, PlaybackSession};

/// What one title view shows: text, play/pause affordance and its marquee.
#[derive(Debug, Clone, Default)]
pub struct TitleView {
    pub title: String,
    pub playing: bool,
    pub marquee: MarqueeEngine,
}

impl TitleView {
    pub fn frame(&self) -> MarqueeFrame {
        self.marquee.frame()
    }
}

/// Keeps the full player title and the mini player title in step with the
/// playback session.
///
/// Both views are laid out at the same width, so one derived session is run
/// on both engines with the same start instant.
pub struct PlaybackViewSync {
    session: Arc<dyn PlaybackSession>,
    params: MarqueeParams,
    cell_width_px: u16,
    viewport_cols: u16,
    player: TitleView,
    mini: TitleView,
    last_track: Option<TrackId>,
}

impl PlaybackViewSync {
    pub fn new(session: Arc<dyn PlaybackSession>, params: MarqueeParams, cell_width_px: u16) -> Self {
        Self {
            session,
            params,
            cell_width_px: cell_width_px.max(1),
            viewport_cols: 0,
            player: TitleView::default(),
            mini: TitleView::default(),
            last_track: None,
        }
    }

    pub fn player(&self) -> &TitleView {
        &self.player
    }

    pub fn mini(&self) -> &TitleView {
        &self.mini
    }

    pub fn current_track(&self) -> Option<TrackId> {
        self.last_track
    }

    /// The title area changed size: rederive both marquees from the new width.
    pub fn set_viewport(&mut self, cols: u16, now: Instant) {
        if cols == self.viewport_cols {
            return;
        }
        self.viewport_cols = cols;
        if self.last_track.is_some() {
            self.restart_marquees(now);
        }
    }

    /// Pick up changes made behind our back (auto-advance, external pause).
    /// Returns the track whose art should be reloaded when the track changed.
    pub fn poll(&mut self, now: Instant) -> Option<TrackId> {
        if self.session.current_track() != self.last_track {
            return self.track_changed(now);
        }
        let playing = self.session.is_playing();
        self.player.playing = playing;
        self.mini.playing = playing;
        None
    }

    /// Step back in the queue. On failure the session did not move and the
    /// views are left as they were.
    pub fn previous(&mut self, now: Instant) -> Result<Option<TrackId>, PlaybackError> {
        self.session.play_previous()?;
        Ok(self.track_changed(now))
    }

    pub fn next(&mut self, now: Instant) -> Result<Option<TrackId>, PlaybackError> {
        self.session.play_next()?;
        Ok(self.track_changed(now))
    }

    /// Refresh both views from the session: titles, affordances, marquees.
    /// Returns the id to reload art for.
    pub fn track_changed(&mut self, now: Instant) -> Option<TrackId> {
        let title = self.session.current_title().unwrap_or_default();
        let playing = self.session.is_playing();
        self.last_track = self.session.current_track();

        for view in [&mut self.player, &mut self.mini] {
            view.title = title.clone();
            view.playing = playing;
        }

        if self.last_track.is_some() {
            self.restart_marquees(now);
        } else {
            self.cancel();
        }
        tracing::debug!(track = ?self.last_track, playing, "views synced to session");
        self.last_track
    }

    /// Flip play/pause and show the new state without waiting for the session.
    pub fn toggle_play_pause(&mut self) {
        if self.last_track.is_none() {
            return;
        }
        let playing = !self.session.is_playing();
        if playing {
            self.session.play();
        } else {
            self.session.pause();
        }
        self.player.playing = playing;
        self.mini.playing = playing;
    }

    /// Advance both marquees to `now`.
    pub fn tick(&mut self, now: Instant) {
        self.player.marquee.tick(now);
        self.mini.marquee.tick(now);
    }

    pub fn is_animating(&self) -> bool {
        self.player.marquee.is_running() || self.mini.marquee.is_running()
    }

    /// The player screen opened: resync both views so the titles start
    /// together.
    pub fn open_player(&mut self, now: Instant) -> Option<TrackId> {
        self.track_changed(now)
    }

    /// The player screen went away; only the mini title keeps running.
    pub fn close_player(&mut self) {
        self.player.marquee.cancel();
    }

    /// Stop both animations and put the views at rest.
    pub fn cancel(&mut self) {
        self.player.marquee.cancel();
        self.mini.marquee.cancel();
    }

    /// Title width in marquee pixels.
    pub fn text_width(&self, title: &str) -> f32 {
        (title.width() as f32) * f32::from(self.cell_width_px)
    }

    fn restart_marquees(&mut self, now: Instant) {
        let title = self.player.title.clone();
        let viewport = f32::from(self.viewport_cols) * f32::from(self.cell_width_px);
        let session = derive_session(&title, viewport, self.text_width(&title), &self.params);

        self.player.marquee.cancel();
        self.mini.marquee.cancel();
        self.player.marquee.run(session.clone(), now);
        self.mini.marquee.run(session, now);
    }
}
