/// Represents the type of a line in an M3U/M3U8 playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    Empty,
    ExtM3U,
    ExtInf,
    ExtGrp,
    ExtXStreamInf,
    UnknownExtTag,
    Comment,
    Uri,
}

/// Classifier for playlist lines.
pub struct LineClassifier;

impl LineClassifier {
    /// Classify a line from a playlist.
    pub fn classify(line: &str) -> LineType {
        let line = line.trim();

        if line.is_empty() {
            return LineType::Empty;
        }

        if !line.starts_with('#') {
            return LineType::Uri;
        }

        if line.starts_with("#EXTM3U") {
            LineType::ExtM3U
        } else if line.starts_with("#EXTINF:") {
            LineType::ExtInf
        } else if line.starts_with("#EXTGRP:") {
            LineType::ExtGrp
        } else if line.starts_with("#EXT-X-STREAM-INF:") {
            LineType::ExtXStreamInf
        } else if line.starts_with("#EXT") {
            LineType::UnknownExtTag
        } else {
            LineType::Comment
        }
    }
}
