use ratatui::style::Color;
use unicode_width::UnicodeWidthChar;

/// The part of `title` visible in a `width`-column viewport when the text's
/// left edge sits `offset_cols` columns from the viewport's left edge.
///
/// A wide character cut by the left edge shows as blanks.
pub fn marquee_visible(title: &str, offset_cols: i32, width: u16) -> String {
    let width = usize::from(width);
    let mut out = String::new();
    let mut used = 0usize;

    if offset_cols > 0 {
        let pad = (offset_cols as usize).min(width);
        out.push_str(&" ".repeat(pad));
        used = pad;
    }

    let mut skip = offset_cols.min(0).unsigned_abs() as usize;
    for ch in title.chars() {
        let w = ch.width().unwrap_or(0);
        if skip > 0 {
            if w > skip {
                let rest = w - skip;
                skip = 0;
                if used + rest > width {
                    break;
                }
                out.push_str(&" ".repeat(rest));
                used += rest;
            } else {
                skip -= w;
            }
            continue;
        }
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out
}

/// Foreground for a title at `opacity`: a grey ramp towards white.
pub fn fade_color(opacity: f32) -> Color {
    let level = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::Rgb(level, level, level)
}
