pub mod attributes;
pub mod classifier;
pub mod playlist;

pub use classifier::{LineClassifier, LineType};
pub use playlist::{Channel, Group, ManifestEntry, Playlist};

/// Errors produced while parsing an M3U/M3U8 document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManifestError {
    #[error("playlist does not start with #EXTM3U")]
    MissingHeader,

    #[error("playlist contains no channel entry")]
    NoEntries,
}

/// Parse playlist text and return its first channel entry.
pub fn first_entry(text: &str) -> Result<ManifestEntry, ManifestError> {
    Playlist::parse(text)?
        .first_entry()
        .ok_or(ManifestError::NoEntries)
}
