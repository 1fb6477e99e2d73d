//! Output formats offered to the user and the ffmpeg arguments for each.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

use crate::error::{CoreError, CoreResult};

/// One entry of the format catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    /// User-facing identifier, e.g. "MP4"
    pub name: &'static str,
    /// File extension written to disk
    pub extension: &'static str,
    /// Codec arguments handed to the transcoder
    pub ffmpeg_args: &'static str,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension)
    }
}

/// Catalog in display order.
pub static FORMATS: [Format; 6] = [
    Format { name: "MP4", extension: "mp4", ffmpeg_args: "-c:v libx264 -c:a aac" },
    Format { name: "AVI", extension: "avi", ffmpeg_args: "-c:v libxvid -c:a mp3" },
    Format { name: "MOV", extension: "mov", ffmpeg_args: "-c:v libx264 -c:a aac" },
    Format { name: "MP3", extension: "mp3", ffmpeg_args: "-c:a libmp3lame" },
    Format { name: "OGG", extension: "ogg", ffmpeg_args: "-c:a libvorbis" },
    Format { name: "OPUS", extension: "opus", ffmpeg_args: "-c:a libopus" },
];

static BY_NAME: Lazy<HashMap<&'static str, &'static Format>> =
    Lazy::new(|| FORMATS.iter().map(|f| (f.name, f)).collect());

/// Looks up a format by its identifier. Matching is exact.
pub fn resolve(identifier: &str) -> CoreResult<&'static Format> {
    BY_NAME
        .get(identifier)
        .copied()
        .ok_or_else(|| CoreError::UnknownFormat(identifier.to_string()))
}

/// Identifiers for populating a selection control.
pub fn identifiers() -> impl Iterator<Item = &'static str> {
    FORMATS.iter().map(|f| f.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_every_entry() {
        let expected = [
            ("MP4", "mp4", "-c:v libx264 -c:a aac"),
            ("AVI", "avi", "-c:v libxvid -c:a mp3"),
            ("MOV", "mov", "-c:v libx264 -c:a aac"),
            ("MP3", "mp3", "-c:a libmp3lame"),
            ("OGG", "ogg", "-c:a libvorbis"),
            ("OPUS", "opus", "-c:a libopus"),
        ];
        for (name, ext, args) in expected {
            let format = resolve(name).unwrap();
            assert_eq!((format.extension, format.ffmpeg_args), (ext, args));
        }
    }

    #[test]
    fn test_resolve_unknown() {
        assert_eq!(resolve("WEBM"), Err(CoreError::UnknownFormat("WEBM".into())));
        assert_eq!(resolve("mp4"), Err(CoreError::UnknownFormat("mp4".into())));
        assert_eq!(resolve(""), Err(CoreError::UnknownFormat(String::new())));
    }

    #[test]
    fn test_identifiers_in_display_order() {
        let ids: Vec<_> = identifiers().collect();
        assert_eq!(ids, vec!["MP4", "AVI", "MOV", "MP3", "OGG", "OPUS"]);
    }

    #[test]
    fn test_display_is_extension() {
        assert_eq!(resolve("OPUS").unwrap().to_string(), "opus");
    }
}
