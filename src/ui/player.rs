use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use xxhash_rust::xxh64::xxh64;

use crate::app::PlayerRoute;
use crate::library::format_duration_ms;
use crate::playback::{AlbumArt, FALLBACK_COVER};

use super::{View, marquee_line, play_glyph, title_viewport_cols};

pub(super) fn draw_player(frame: &mut Frame, view: &View, route: &PlayerRoute, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(area);

    draw_cover(frame, view.art, chunks[0]);

    let title = marquee_line(
        view.sync.player(),
        view.settings.cell_width_px,
        title_viewport_cols(chunks[1].width),
    );
    frame.render_widget(
        Paragraph::new(title).block(Block::default().borders(Borders::ALL).title(" title ")),
        chunks[1],
    );

    let info = format!(
        "{}   {} / {}",
        play_glyph(view.sync.player().playing),
        format_duration_ms(view.elapsed.as_millis() as u64),
        route.duration_label(),
    );
    frame.render_widget(
        Paragraph::new(info).block(Block::default().borders(Borders::ALL)),
        chunks[2],
    );
}

fn draw_cover(frame: &mut Frame, art: Option<&AlbumArt>, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" cover ");
    let lines: Vec<Line> = match art {
        None => vec![Line::from("loading…")],
        Some(AlbumArt::Fallback) => FALLBACK_COVER.lines().map(Line::from).collect(),
        Some(AlbumArt::Embedded { mime, bytes }) => {
            let mut lines = mosaic(bytes);
            lines.push(Line::from(""));
            lines.push(Line::from(format!(
                "{} · {} KiB",
                mime.as_deref().unwrap_or("image"),
                bytes.len().div_ceil(1024)
            )));
            lines
        }
    };
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(block),
        area,
    );
}

/// A small colored tile derived from the picture bytes, stable per cover.
fn mosaic(bytes: &[u8]) -> Vec<Line<'static>> {
    const COLS: u64 = 8;
    const ROWS: u64 = 4;
    (0..ROWS)
        .map(|row| {
            let spans: Vec<Span> = (0..COLS)
                .map(|col| {
                    let h = xxh64(bytes, row * COLS + col);
                    let color = Color::Rgb(h as u8, (h >> 8) as u8, (h >> 16) as u8);
                    Span::styled("██", Style::default().fg(color))
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}
