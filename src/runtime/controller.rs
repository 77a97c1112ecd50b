use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{App, DialogKind, PlayerRoute};
use crate::config::Settings;
use crate::library::{Acquired, Acquisition, CatalogCache, MediaIndex, TrackId, acquire};
use crate::marquee::MarqueeParams;
use crate::permission::{FlowStep, GatePolicy, PermissionFlow, PermissionStatus};
use crate::playback::{AlbumArt, ArtLoader, PlaybackError, PlaybackSession, PlaybackViewSync};
use crate::store::{StateStore, StoreError};
use crate::task::TaskSlot;
use crate::ui::{self, View};

use super::host::{Grant, TerminalHost};

const IDLE_INTERVAL: Duration = Duration::from_millis(200);

/// What the terminal side has to do after an input was handled.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Control {
    Continue,
    /// Hand the terminal to the settings editor, then call
    /// `Controller::settings_returned`.
    OpenSettings,
    Quit,
}

/// Everything the UI loop owns apart from the terminal: the model, the
/// permission flow and the handles to off-loop work.
pub struct Controller<'a> {
    settings: &'a Settings,
    app: App,
    flow: PermissionFlow,
    host: TerminalHost,
    index: Arc<dyn MediaIndex>,
    cache: CatalogCache,
    session: Arc<dyn PlaybackSession>,
    sync: PlaybackViewSync,
    art_loader: ArtLoader,
    art: Option<AlbumArt>,
    acquisition: TaskSlot<Result<Acquired, StoreError>>,
    /// Internal two-key prefix state used for `gg` handling.
    pending_gg: bool,
}

impl<'a> Controller<'a> {
    pub fn new(
        settings: &'a Settings,
        store: &StateStore,
        index: Arc<dyn MediaIndex>,
        session: Arc<dyn PlaybackSession>,
        host: TerminalHost,
    ) -> Self {
        Self {
            settings,
            app: App::new(),
            flow: PermissionFlow::new(GatePolicy::new(settings.permission.max_asks), store),
            host,
            cache: CatalogCache::new(store),
            sync: PlaybackViewSync::new(
                Arc::clone(&session),
                MarqueeParams::from(&settings.marquee),
                settings.ui.cell_width_px,
            ),
            art_loader: ArtLoader::new(Arc::clone(&index)),
            art: None,
            acquisition: TaskSlot::new("acquire"),
            index,
            session,
            pending_gg: false,
        }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn host(&self) -> &TerminalHost {
        &self.host
    }

    /// An acquisition is running or waiting to run.
    pub fn is_busy(&self) -> bool {
        self.flow.is_acquiring() || self.flow.rescan_pending()
    }

    /// First gate evaluation at launch.
    pub fn start(&mut self) -> anyhow::Result<Control> {
        let step = self.flow.evaluate(self.host.status())?;
        self.apply(step)
    }

    /// The settings editor closed; whatever happened there, rerun the gate.
    pub fn settings_returned(&mut self) -> anyhow::Result<Control> {
        let step = self.flow.settings_returned(self.host.status())?;
        self.apply(step)
    }

    /// Back in front of the user: rerun the gate unless something is pending.
    pub fn foregrounded(&mut self) -> anyhow::Result<Control> {
        if self.app.dialog.is_some() || self.is_busy() {
            return Ok(Control::Continue);
        }
        let step = self.flow.evaluate(self.host.status())?;
        self.apply(step)
    }

    /// Per-frame work: pick up finished jobs, follow the session, advance
    /// the marquees. `width` is the terminal width in columns.
    pub fn update(&mut self, now: Instant, width: u16) -> anyhow::Result<Control> {
        let control = self.collect_acquisition()?;
        self.collect_art();

        self.sync.set_viewport(ui::title_viewport_cols(width), now);
        if let Some(id) = self.sync.poll(now) {
            self.follow_track(id);
        }
        self.sync.tick(now);
        Ok(control)
    }

    pub fn view(&self) -> View<'_> {
        View {
            app: &self.app,
            sync: &self.sync,
            art: self.art.as_ref(),
            elapsed: self.session.elapsed(),
            settings: &self.settings.ui,
        }
    }

    /// How long to wait for input before the next frame.
    pub fn poll_timeout(&self) -> Duration {
        if self.sync.is_animating() {
            Duration::from_millis(self.settings.ui.frame_interval_ms.max(1))
        } else {
            IDLE_INTERVAL
        }
    }

    fn apply(&mut self, step: FlowStep) -> anyhow::Result<Control> {
        match step {
            FlowStep::Acquire(kind) => return self.start_acquisition(kind),
            FlowStep::ShowRationale => self.app.show_dialog(DialogKind::Rationale),
            FlowStep::LaunchPrompt => self.app.show_dialog(DialogKind::NativePrompt),
            FlowStep::ShowSettingsDialog => self.app.show_dialog(DialogKind::SettingsEscalation),
            FlowStep::LaunchSettings => return Ok(Control::OpenSettings),
            FlowStep::Terminate => {
                tracing::info!("library access refused, closing");
                return Ok(Control::Quit);
            }
            FlowStep::Idle => {}
        }
        Ok(Control::Continue)
    }

    fn start_acquisition(&mut self, kind: Acquisition) -> anyhow::Result<Control> {
        let index = Arc::clone(&self.index);
        let cache = self.cache.clone();
        match self.acquisition.spawn(move || acquire(kind, &index, &cache)) {
            Ok(_) => {
                self.app.loading = true;
                tracing::info!(?kind, "acquisition started");
                Ok(Control::Continue)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to spawn acquisition");
                self.app.loading = false;
                let step = self.flow.acquisition_finished(self.host.status())?;
                self.apply(step)
            }
        }
    }

    fn collect_acquisition(&mut self) -> anyhow::Result<Control> {
        let Some(result) = self.acquisition.try_take() else {
            return Ok(Control::Continue);
        };
        self.app.loading = false;

        match result {
            Ok(acquired) => {
                tracing::info!(
                    ran = ?acquired.ran,
                    tracks = acquired.catalog.len(),
                    persisted = acquired.persisted,
                    "catalog ready"
                );
                self.session.set_queue(acquired.catalog.tracks().to_vec());
                self.app.set_catalog(acquired.catalog);
            }
            Err(e) => tracing::error!(error = %e, "catalog acquisition failed"),
        }

        let step = self.flow.acquisition_finished(self.host.status())?;
        self.apply(step)
    }

    fn collect_art(&mut self) {
        if let Some((id, art)) = self.art_loader.poll() {
            if self.app.player_route().map(|r| r.id) == Some(id) {
                self.art = Some(art);
            }
        }
    }

    fn route_for(&self, id: TrackId) -> PlayerRoute {
        self.app
            .catalog
            .iter()
            .find(|t| t.id == id)
            .map(PlayerRoute::from_track)
            .unwrap_or_else(|| PlayerRoute {
                id,
                title: self.sync.player().title.clone(),
                duration_ms: 0,
            })
    }

    fn request_art(&mut self, id: TrackId) {
        self.art = None;
        self.art_loader.request(id);
    }

    fn show_player(&mut self, route: PlayerRoute, now: Instant) {
        let id = route.id;
        self.app.open_player(route);
        self.sync.open_player(now);
        self.request_art(id);
    }

    fn close_player(&mut self) {
        self.art_loader.cancel();
        self.art = None;
        self.sync.close_player();
        self.app.close_player();
    }

    /// The session moved to `id`: follow it in the list and on the player.
    fn follow_track(&mut self, id: TrackId) {
        self.app.set_selected_id(id);
        if self.app.player_route().is_some_and(|r| r.id != id) {
            let route = self.route_for(id);
            self.app.open_player(route);
            self.request_art(id);
        }
    }

    /// A track could not be played. Anything that means the index no longer
    /// vouches for it offers a rescan.
    fn playback_failed(&mut self, err: PlaybackError) {
        match err {
            PlaybackError::Missing(_) | PlaybackError::Index(_) => {
                tracing::warn!(error = %err, "track is gone from the library");
                self.app.show_dialog(DialogKind::MissingTrack);
            }
            err => tracing::warn!(error = %err, "cannot play track"),
        }
    }

    fn play_selected(&mut self, now: Instant) {
        let Some(track) = self.app.selected_track().cloned() else {
            return;
        };
        match self.session.start(&track) {
            Ok(()) => self.show_player(PlayerRoute::from_track(&track), now),
            Err(e) => self.playback_failed(e),
        }
    }

    /// Open the player for whatever is loaded, as the mini player does.
    fn open_current(&mut self, now: Instant) {
        if let Some(id) = self.sync.current_track() {
            let route = PlayerRoute {
                id,
                title: self.sync.mini().title.clone(),
                duration_ms: 0,
            };
            self.show_player(route, now);
        }
    }

    fn navigate(&mut self, forward: bool, now: Instant) {
        let stepped = if forward {
            self.sync.next(now)
        } else {
            self.sync.previous(now)
        };
        match stepped {
            Ok(Some(id)) => self.follow_track(id),
            Ok(None) => {}
            Err(e) => self.playback_failed(e),
        }
    }

    fn rescan(&mut self) -> anyhow::Result<Control> {
        let step = self.flow.request_rescan(self.host.status())?;
        if self.flow.rescan_pending() {
            self.app.loading = true;
        }
        self.apply(step)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<Control> {
        if self.app.dialog.is_some() {
            self.pending_gg = false;
            return self.handle_dialog_key(key);
        }

        let now = Instant::now();
        let pending_gg = std::mem::take(&mut self.pending_gg);
        match key.code {
            KeyCode::Char('q') => return Ok(Control::Quit),
            KeyCode::Char(' ') | KeyCode::Char('p') => self.sync.toggle_play_pause(),
            _ if self.app.player_route().is_some() => match key.code {
                KeyCode::Char('h') | KeyCode::Left => self.navigate(false, now),
                KeyCode::Char('l') | KeyCode::Right => self.navigate(true, now),
                KeyCode::Esc | KeyCode::Backspace => self.close_player(),
                _ => {}
            },
            KeyCode::Char('j') | KeyCode::Down => self.app.next(),
            KeyCode::Char('k') | KeyCode::Up => self.app.prev(),
            KeyCode::Char('g') => {
                if pending_gg {
                    self.app.select_first();
                } else {
                    self.pending_gg = true;
                }
            }
            KeyCode::Char('G') => self.app.select_last(),
            KeyCode::Enter => self.play_selected(now),
            KeyCode::Char('o') => self.open_current(now),
            KeyCode::Char('R') => return self.rescan(),
            _ => {}
        }
        Ok(Control::Continue)
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) -> anyhow::Result<Control> {
        let Some(dialog) = self.app.dialog.as_mut() else {
            return Ok(Control::Continue);
        };
        let accepted = match key.code {
            KeyCode::Enter => dialog.accept_focused,
            KeyCode::Char('y') => true,
            KeyCode::Char('n') | KeyCode::Esc => false,
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h') | KeyCode::Char('l') => {
                dialog.toggle_focus();
                return Ok(Control::Continue);
            }
            _ => return Ok(Control::Continue),
        };
        match self.app.close_dialog() {
            Some(kind) => self.answer(kind, accepted),
            None => Ok(Control::Continue),
        }
    }

    fn answer(&mut self, kind: DialogKind, accepted: bool) -> anyhow::Result<Control> {
        let step = match kind {
            DialogKind::Rationale => self.flow.rationale_answered(accepted)?,
            DialogKind::NativePrompt => {
                let (grant, status) = if accepted {
                    (Grant::Granted, PermissionStatus::Granted)
                } else {
                    (Grant::Denied, PermissionStatus::Denied)
                };
                if let Err(e) = self.host.record(grant) {
                    tracing::error!(path = %self.host.path().display(), error = %e, "cannot store access grant");
                }
                self.flow.prompt_answered(status)?
            }
            DialogKind::SettingsEscalation => self.flow.settings_dialog_answered(accepted),
            DialogKind::MissingTrack if accepted => return self.rescan(),
            DialogKind::MissingTrack => FlowStep::Idle,
        };
        self.apply(step)
    }
}
