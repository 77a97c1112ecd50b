use std::path::Path;

use crate::config::TrackDisplayField;

/// What a file told us about itself, before it becomes a catalog title.
#[derive(Debug, Clone, Copy)]
pub struct TagView<'a> {
    pub path: &'a Path,
    pub title: &'a str,
    pub artist: Option<&'a str>,
    pub album: Option<&'a str>,
}

impl TagView<'_> {
    fn part(&self, field: TrackDisplayField) -> Option<String> {
        let text = match field {
            TrackDisplayField::Title => Some(self.title),
            TrackDisplayField::Artist => self.artist,
            TrackDisplayField::Album => self.album,
            TrackDisplayField::Filename => self.path.file_stem().and_then(|s| s.to_str()),
            TrackDisplayField::Path => return Some(self.path.display().to_string()),
        };
        text.map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned)
    }

    /// Join the configured fields that have a value; the bare title if none do.
    pub fn display_name(&self, fields: &[TrackDisplayField], sep: &str) -> String {
        let parts: Vec<String> = fields.iter().filter_map(|f| self.part(*f)).collect();
        if parts.is_empty() {
            self.title.to_string()
        } else {
            parts.join(sep)
        }
    }
}

/// Format milliseconds as `MM:SS`. Minutes are not wrapped into hours.
pub fn format_duration_ms(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
