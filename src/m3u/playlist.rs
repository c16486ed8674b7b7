use std::collections::HashMap;

use super::{
    ManifestError,
    attributes::ExtInf,
    classifier::{LineClassifier, LineType},
};

/// One channel entry: the URI line plus whatever described it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Channel {
    pub name: Option<String>,
    pub duration: Option<f64>,
    pub attributes: HashMap<String, String>,
    pub stream_url: String,
    /// Entry followed `#EXT-X-STREAM-INF`.
    pub variant: bool,
}

impl Channel {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    /// Empty for channels without any group information.
    pub name: String,
    pub channels: Vec<Channel>,
}

/// A parsed playlist. Groups keep the order in which they first appear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Playlist {
    pub groups: Vec<Group>,
}

/// The fields of a playlist entry the resolver hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub stream_url: String,
    pub name: Option<String>,
    pub tvg_id: Option<String>,
    pub tvg_name: Option<String>,
    pub logo: Option<String>,
    pub group: Option<String>,
}

#[derive(Default)]
struct PendingChannel {
    info: ExtInf,
    group: Option<String>,
    variant: bool,
}

impl Playlist {
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());

        match lines.next() {
            Some(first) if LineClassifier::classify(first) == LineType::ExtM3U => {}
            _ => return Err(ManifestError::MissingHeader),
        }

        let mut playlist = Playlist::default();
        let mut pending = PendingChannel::default();

        for line in lines {
            let line = line.trim();
            match LineClassifier::classify(line) {
                LineType::ExtInf => pending.info = ExtInf::parse(line),
                LineType::ExtGrp => {
                    pending.group = line
                        .strip_prefix("#EXTGRP:")
                        .map(|g| g.trim().to_string())
                        .filter(|g| !g.is_empty());
                }
                LineType::ExtXStreamInf => pending.variant = true,
                LineType::Uri => {
                    let PendingChannel {
                        info,
                        group,
                        variant,
                    } = std::mem::take(&mut pending);
                    let group = info
                        .attributes
                        .get("group-title")
                        .filter(|g| !g.is_empty())
                        .cloned()
                        .or(group)
                        .unwrap_or_default();
                    playlist.push(
                        group,
                        Channel {
                            name: info.title,
                            duration: info.duration,
                            attributes: info.attributes,
                            stream_url: line.to_string(),
                            variant,
                        },
                    );
                }
                _ => {}
            }
        }

        if playlist.groups.is_empty() {
            return Err(ManifestError::NoEntries);
        }

        Ok(playlist)
    }

    fn push(&mut self, group: String, channel: Channel) {
        match self.groups.iter_mut().find(|g| g.name == group) {
            Some(existing) => existing.channels.push(channel),
            None => self.groups.push(Group {
                name: group,
                channels: vec![channel],
            }),
        }
    }

    /// First channel of the first group.
    pub fn first_entry(&self) -> Option<ManifestEntry> {
        let group = self.groups.first()?;
        let channel = group.channels.first()?;

        Some(ManifestEntry {
            stream_url: channel.stream_url.clone(),
            name: channel.name.clone(),
            tvg_id: channel.attribute("tvg-id").map(String::from),
            tvg_name: channel.attribute("tvg-name").map(String::from),
            logo: channel.attribute("tvg-logo").map(String::from),
            group: Some(group.name.clone()).filter(|g| !g.is_empty()),
        })
    }
}
