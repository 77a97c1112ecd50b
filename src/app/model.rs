//! Application model types: `App`, screens, routes and dialogs.
//!
//! The `App` struct holds the current catalog, the list selection, which
//! screen is showing and the open dialog, if any.

use crate::library::{Catalog, Track, TrackId, format_duration_ms};

/// Data handed to the player screen when it opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRoute {
    pub id: TrackId,
    pub title: String,
    /// 0 means unknown (opened from the mini player).
    pub duration_ms: u64,
}

impl PlayerRoute {
    pub fn from_track(track: &Track) -> Self {
        Self {
            id: track.id,
            title: track.display_name.clone(),
            duration_ms: track.duration_ms,
        }
    }

    pub fn duration_label(&self) -> String {
        if self.duration_ms == 0 {
            "--:--".to_string()
        } else {
            format_duration_ms(self.duration_ms)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Library,
    Player(PlayerRoute),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DialogKind {
    /// Why library access is needed; continue or quit.
    Rationale,
    /// Prompts used up; open settings or quit.
    SettingsEscalation,
    /// The host's own Allow / Don't allow prompt.
    NativePrompt,
    /// The selected track vanished; offer a rescan.
    MissingTrack,
}

/// An open modal and which of its two buttons has focus.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub kind: DialogKind,
    pub accept_focused: bool,
}

impl Dialog {
    pub fn new(kind: DialogKind) -> Self {
        Self {
            kind,
            accept_focused: true,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.accept_focused = !self.accept_focused;
    }
}

/// The main application model.
pub struct App {
    pub catalog: Catalog,
    pub selected: usize,
    pub screen: Screen,
    /// An acquisition is running; the list shows a loading indicator.
    pub loading: bool,
    pub dialog: Option<Dialog>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            catalog: Catalog::default(),
            selected: 0,
            screen: Screen::Library,
            loading: false,
            dialog: None,
        }
    }

    /// Replace the catalog, keeping the cursor on the same track if it survived.
    pub fn set_catalog(&mut self, catalog: Catalog) {
        let keep = self.selected_track().map(|t| t.id);
        self.catalog = catalog;
        self.selected = keep
            .and_then(|id| self.catalog.position(id))
            .unwrap_or(0);
        self.clamp_selected();
    }

    pub fn has_tracks(&self) -> bool {
        !self.catalog.is_empty()
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.catalog.get(self.selected)
    }

    /// Move selection to the next track, wrapping to the first.
    pub fn next(&mut self) {
        if self.has_tracks() {
            self.selected = (self.selected + 1) % self.catalog.len();
        }
    }

    /// Move selection to the previous track, wrapping to the last.
    pub fn prev(&mut self) {
        if self.has_tracks() {
            self.selected = self
                .selected
                .checked_sub(1)
                .unwrap_or(self.catalog.len() - 1);
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.catalog.len().saturating_sub(1);
    }

    pub fn set_selected_id(&mut self, id: TrackId) {
        if let Some(pos) = self.catalog.position(id) {
            self.selected = pos;
        }
    }

    pub fn open_player(&mut self, route: PlayerRoute) {
        self.screen = Screen::Player(route);
    }

    pub fn close_player(&mut self) {
        self.screen = Screen::Library;
    }

    pub fn player_route(&self) -> Option<&PlayerRoute> {
        match &self.screen {
            Screen::Player(route) => Some(route),
            Screen::Library => None,
        }
    }

    pub fn show_dialog(&mut self, kind: DialogKind) {
        self.dialog = Some(Dialog::new(kind));
    }

    pub fn close_dialog(&mut self) -> Option<DialogKind> {
        self.dialog.take().map(|d| d.kind)
    }

    fn clamp_selected(&mut self) {
        if self.selected >= self.catalog.len() {
            self.selected = self.catalog.len().saturating_sub(1);
        }
    }
}
