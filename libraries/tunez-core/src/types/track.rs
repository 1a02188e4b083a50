/// Track and its references
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

use super::quality::{ImageQuality, StreamQuality};

/// Kind of playable media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Music track
    #[default]
    Song,
    /// Podcast episode
    Episode,
}

impl MediaType {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Song => "song",
            Self::Episode => "episode",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Artist credited on a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    /// Artist identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Credit role (e.g. "singer", "music")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Album a track belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRef {
    /// Album identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Canonical album URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A playable queue entry
///
/// Carries everything the player needs to display and stream the item;
/// the queue is persisted as a JSON array of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique identifier from the catalogue
    pub id: String,

    /// Display name
    pub name: String,

    /// Secondary display line (usually artists or album)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    /// Credited artists, in display order
    #[serde(default)]
    pub artists: Vec<ArtistRef>,

    /// Album reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<AlbumRef>,

    /// Artwork URL per resolution tier
    #[serde(default)]
    pub image: BTreeMap<ImageQuality, String>,

    /// Source locator per audio quality tier
    #[serde(default)]
    pub download_url: BTreeMap<StreamQuality, String>,

    /// Song or episode
    #[serde(default, rename = "type")]
    pub media_type: MediaType,

    /// Canonical catalogue URL
    #[serde(default)]
    pub url: String,

    /// Duration in seconds, when the catalogue reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl Track {
    /// Create a song with no sources or artwork
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            subtitle: None,
            artists: Vec::new(),
            album: None,
            image: BTreeMap::new(),
            download_url: BTreeMap::new(),
            media_type: MediaType::Song,
            url: String::new(),
            duration: None,
        }
    }

    /// Artist names joined for display ("A, B")
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// In-app navigable path for this track
    ///
    /// Keeps the path of the canonical URL under a `/song` or `/episode`
    /// prefix. Falls back to `/{type}/{id}` when the canonical URL is
    /// missing or has no path.
    pub fn href(&self) -> String {
        let kind = self.media_type.as_str();

        let segments: Vec<String> = Url::parse(&self.url)
            .ok()
            .and_then(|u| {
                u.path_segments()
                    .map(|s| s.filter(|seg| !seg.is_empty()).map(str::to_string).collect())
            })
            .unwrap_or_default();

        match segments.split_first() {
            None => format!("/{}/{}", kind, self.id),
            Some((first, rest)) if first == kind => {
                if rest.is_empty() {
                    format!("/{}/{}", kind, self.id)
                } else {
                    format!("/{}/{}", kind, rest.join("/"))
                }
            }
            Some(_) => format!("/{}/{}", kind, segments.join("/")),
        }
    }
}
