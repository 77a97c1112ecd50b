//! UI rendering for the terminal user interface.
//!
//! `draw` renders one frame from a borrowed `View` of the app state. Nothing
//! here mutates state; marquee frames are advanced by the runtime before
//! drawing.

use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, Dialog, DialogKind, Screen};
use crate::config::UiSettings;
use crate::library::{Track, format_duration_ms};
use crate::playback::{AlbumArt, PlaybackViewSync, TitleView};

mod marquee_line;
mod player;

pub use marquee_line::{fade_color, marquee_visible};

/// Everything a frame is drawn from.
pub struct View<'a> {
    pub app: &'a App,
    pub sync: &'a PlaybackViewSync,
    pub art: Option<&'a AlbumArt>,
    pub elapsed: Duration,
    pub settings: &'a UiSettings,
}

const LIBRARY_CONTROLS: &[(&str, &str)] = &[
    ("j/k", "up/down"),
    ("gg/G", "top/bottom"),
    ("enter", "play selected song"),
    ("space/p", "play/pause"),
    ("o", "open player"),
    ("R", "rescan"),
    ("q", "quit"),
];

const PLAYER_CONTROLS: &[(&str, &str)] = &[
    ("h/l", "prev/next song"),
    ("space/p", "play/pause"),
    ("esc", "back"),
    ("q", "quit"),
];

fn controls_text(controls: &[(&str, &str)]) -> String {
    controls
        .iter()
        .map(|(k, v)| format!("[{k}] {v}"))
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Columns available to a title inside a full-width bordered block.
///
/// The player title and the mini player title share this width so their
/// marquees stay in step.
pub fn title_viewport_cols(area_width: u16) -> u16 {
    area_width.saturating_sub(2)
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width: width.min(r.width),
        height: height.min(r.height),
    }
}

fn padded_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding {
            left: 1,
            right: 0,
            top: 0,
            bottom: 0,
        })
}

/// Render the entire UI into `frame`.
pub fn draw(frame: &mut Frame, view: &View) {
    let show_mini = view.sync.current_track().is_some();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(if show_mini { 4 } else { 0 }),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(view.settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" encore ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let controls = match &view.app.screen {
        Screen::Library => {
            draw_library(frame, view.app, chunks[1]);
            LIBRARY_CONTROLS
        }
        Screen::Player(route) => {
            player::draw_player(frame, view, route, chunks[1]);
            PLAYER_CONTROLS
        }
    };

    if show_mini {
        draw_mini_player(frame, view, chunks[2]);
    }

    let footer = Paragraph::new(controls_text(controls))
        .block(padded_block(" controls "))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);

    if let Some(dialog) = view.app.dialog {
        let area = frame.area();
        draw_dialog(frame, dialog, area);
    }
}

fn track_row(track: &Track, width: usize) -> String {
    let duration = format_duration_ms(track.duration_ms);
    let used = track.display_name.width() + duration.width();
    let gap = width.saturating_sub(used).max(2);
    format!("{}{}{}", track.display_name, " ".repeat(gap), duration)
}

fn draw_library(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.loading {
        " tracks (scanning…) "
    } else {
        " tracks "
    };

    if app.catalog.is_empty() {
        let msg = if app.loading {
            "Scanning your music library…"
        } else {
            "No tracks found. Press R to rescan."
        };
        let p = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(p, area);
        return;
    }

    // Only build ListItems for the visible window, centered on the selection
    // when possible.
    let total = app.catalog.len();
    let list_height = area.height.saturating_sub(2) as usize;
    let (start, end, selected_in_window) = if total <= list_height || list_height == 0 {
        (0, total, app.selected)
    } else {
        let half = list_height / 2;
        let mut start = app.selected.saturating_sub(half);
        if start + list_height > total {
            start = total - list_height;
        }
        (start, start + list_height, app.selected - start)
    };

    // Border plus the "> " highlight symbol.
    let row_width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = app.catalog.tracks()[start..end]
        .iter()
        .map(|t| ListItem::new(track_row(t, row_width)))
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(selected_in_window));
    frame.render_stateful_widget(list, area, &mut state);
}

/// One marquee title line, `width` columns wide.
fn marquee_line(view: &TitleView, cell_width_px: u16, width: u16) -> Line<'static> {
    let frame = view.frame();
    let offset = (frame.x / f32::from(cell_width_px.max(1))).round() as i32;
    let text = marquee_visible(&view.title, offset, width);
    Line::from(Span::styled(
        text,
        Style::default().fg(fade_color(frame.opacity)),
    ))
}

fn play_glyph(playing: bool) -> &'static str {
    if playing { "⏸  playing" } else { "▶  paused" }
}

fn draw_mini_player(frame: &mut Frame, view: &View, area: Rect) {
    let mini = view.sync.mini();
    let width = title_viewport_cols(area.width);
    let hint = match view.app.screen {
        Screen::Library => "   [o] open player",
        Screen::Player(_) => "",
    };
    let lines = vec![
        marquee_line(mini, view.settings.cell_width_px, width),
        Line::from(format!("{}{}", play_glyph(mini.playing), hint)),
    ];
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" now playing "));
    frame.render_widget(p, area);
}

/// Title, body, accept label and decline label for a dialog.
pub fn dialog_text(kind: DialogKind) -> (&'static str, &'static str, &'static str, &'static str) {
    match kind {
        DialogKind::Rationale => (
            " library access ",
            "encore lists and plays the music stored on this device, so it needs \
             access to your music library.",
            "Continue",
            "Quit",
        ),
        DialogKind::SettingsEscalation => (
            " permission required ",
            "Library access was denied. You can grant it in settings.",
            "Open settings",
            "Quit",
        ),
        DialogKind::NativePrompt => (
            " System ",
            "Allow encore to access music and audio on this device?",
            "Allow",
            "Don't allow",
        ),
        DialogKind::MissingTrack => (
            " track unavailable ",
            "This file no longer exists. Rescan the library?",
            "Rescan",
            "Dismiss",
        ),
    }
}

fn button(label: &str, focused: bool) -> Span<'static> {
    let style = if focused {
        Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
    } else {
        Style::default()
    };
    Span::styled(format!("[ {label} ]"), style)
}

fn draw_dialog(frame: &mut Frame, dialog: Dialog, area: Rect) {
    let (title, body, accept, decline) = dialog_text(dialog.kind);
    let popup = centered_rect_sized(60, 8, area);
    frame.render_widget(Clear, popup);

    let mut block = Block::default().borders(Borders::ALL).title(title);
    if dialog.kind == DialogKind::NativePrompt {
        block = block.border_type(BorderType::Double).title_alignment(Alignment::Center);
    }

    let lines = vec![
        Line::from(body),
        Line::from(""),
        Line::from(vec![
            button(accept, dialog.accept_focused),
            Span::raw("  "),
            button(decline, !dialog.accept_focused),
        ])
        .alignment(Alignment::Center),
    ];
    let p = Paragraph::new(lines)
        .block(block.padding(Padding::horizontal(1)))
        .wrap(Wrap { trim: true });
    frame.render_widget(p, popup);
}
