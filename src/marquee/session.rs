use crate::config::MarqueeSettings;

/// Constants every marquee derivation uses.
///
/// Both title views must be derived from the same params, otherwise they
/// drift apart.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarqueeParams {
    pub speed_px_per_sec: f32,
    pub bias: f32,
    pub fade_in_ms: u64,
    pub fade_out_ms: u64,
}

impl Default for MarqueeParams {
    fn default() -> Self {
        Self::from(&MarqueeSettings::default())
    }
}

impl From<&MarqueeSettings> for MarqueeParams {
    fn from(s: &MarqueeSettings) -> Self {
        Self {
            speed_px_per_sec: s.speed_px_per_sec,
            bias: s.bias,
            fade_in_ms: s.fade_in_ms,
            fade_out_ms: s.fade_out_ms,
        }
    }
}

/// Timing of one marquee cycle for a given title and view size.
///
/// Recomputed on every restart, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct MarqueeSession {
    pub title: String,
    pub viewport_width: f32,
    pub text_width: f32,
    pub start_x: f32,
    pub end_x: f32,
    pub cycle_duration_ms: u64,
    pub fade_in_fraction: f32,
    pub fade_out_fraction: f32,
}

/// Position and opacity of the title at one instant.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarqueeFrame {
    /// Horizontal offset of the text's left edge inside the viewport (pixels).
    pub x: f32,
    pub opacity: f32,
}

impl MarqueeFrame {
    /// Where an idle view sits: unscrolled and fully visible.
    pub const REST: Self = Self { x: 0.0, opacity: 1.0 };
}

pub fn derive_session(
    title: &str,
    viewport_width: f32,
    text_width: f32,
    params: &MarqueeParams,
) -> MarqueeSession {
    let start_x = if text_width > viewport_width {
        0.0
    } else {
        (params.bias * (viewport_width - text_width)).max(0.0)
    };
    // One extra pixel so the text has fully left before the loop restarts.
    let end_x = -text_width - start_x - 1.0;

    let cycle = ((start_x - end_x) / params.speed_px_per_sec * 1000.0).trunc();
    let cycle_duration_ms = (cycle as u64).max(1);
    let cycle_ms = cycle_duration_ms as f32;

    MarqueeSession {
        title: title.to_string(),
        viewport_width,
        text_width,
        start_x,
        end_x,
        cycle_duration_ms,
        fade_in_fraction: (params.fade_in_ms as f32 / cycle_ms).clamp(0.0, 1.0),
        fade_out_fraction: (1.0 - params.fade_out_ms as f32 / cycle_ms).clamp(0.0, 1.0),
    }
}

impl MarqueeSession {
    /// The frame `elapsed_ms` after the animation started. Cycles restart
    /// from the beginning, they never reverse.
    pub fn sample(&self, elapsed_ms: u64) -> MarqueeFrame {
        let t = (elapsed_ms % self.cycle_duration_ms) as f32 / self.cycle_duration_ms as f32;
        MarqueeFrame {
            x: self.start_x + (self.end_x - self.start_x) * t,
            opacity: self.opacity_at(t),
        }
    }

    /// Opacity envelope as keyframes (0, 0) (fade_in, 1) (fade_out, 1) (1, 0),
    /// interpolated linearly inside the first segment whose end lies past `t`.
    /// Inverted fractions are not reordered.
    fn opacity_at(&self, t: f32) -> f32 {
        let keys = [
            (0.0, 0.0),
            (self.fade_in_fraction, 1.0),
            (self.fade_out_fraction, 1.0),
            (1.0, 0.0),
        ];

        let mut prev = keys[0];
        for &(frac, value) in &keys[1..] {
            if t < frac {
                let span = frac - prev.0;
                if span <= 0.0 {
                    return value;
                }
                let local = (t - prev.0) / span;
                return prev.1 + (value - prev.1) * local;
            }
            prev = (frac, value);
        }
        0.0
    }
}
