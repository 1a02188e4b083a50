//! Source and artwork resolution
//!
//! A track carries one URL per quality tier, but not every tier is present
//! for every track. Resolvers turn a requested tier into a concrete URL.

use std::collections::BTreeMap;

use crate::types::{ImageQuality, StreamQuality, Track};

/// Artwork shown when a track has no image at all
pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder/song.jpg";

/// Resolves a playable URL for a track at a requested quality
///
/// Treated as a pure function by the playback controller.
pub trait SourceResolver: Send + Sync {
    /// Concrete playable URL, or `None` when the track has no sources
    fn resolve(&self, track: &Track, quality: StreamQuality) -> Option<String>;
}

/// Resolves a displayable artwork URL for a track at a requested resolution
pub trait ImageResolver: Send + Sync {
    /// Concrete image URL; never empty
    fn resolve_image(&self, track: &Track, quality: ImageQuality) -> String;
}

/// Default resolver: exact tier, else closest lower tier, else closest higher tier
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityLadder;

impl SourceResolver for QualityLadder {
    fn resolve(&self, track: &Track, quality: StreamQuality) -> Option<String> {
        pick_tier(&track.download_url, quality).cloned()
    }
}

impl ImageResolver for QualityLadder {
    fn resolve_image(&self, track: &Track, quality: ImageQuality) -> String {
        pick_tier(&track.image, quality)
            .cloned()
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string())
    }
}

fn pick_tier<K: Ord + Copy>(tiers: &BTreeMap<K, String>, wanted: K) -> Option<&String> {
    if let Some(exact) = tiers.get(&wanted).filter(|url| !url.is_empty()) {
        return Some(exact);
    }

    // Closest lower tier first (never stream more than asked for),
    // then the closest higher one
    tiers
        .range(..wanted)
        .rev()
        .chain(tiers.range(wanted..))
        .map(|(_, url)| url)
        .find(|url| !url.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track_with(tiers: &[(StreamQuality, &str)]) -> Track {
        let mut track = Track::new("t", "T");
        for (q, url) in tiers {
            track.download_url.insert(*q, (*url).to_string());
        }
        track
    }

    #[test]
    fn exact_tier_wins() {
        let track = track_with(&[
            (StreamQuality::Low, "low"),
            (StreamQuality::High, "high"),
            (StreamQuality::Excellent, "excellent"),
        ]);
        assert_eq!(
            QualityLadder.resolve(&track, StreamQuality::High).as_deref(),
            Some("high")
        );
    }

    #[test]
    fn steps_down_before_stepping_up() {
        let track = track_with(&[(StreamQuality::Low, "low"), (StreamQuality::Excellent, "top")]);
        assert_eq!(
            QualityLadder.resolve(&track, StreamQuality::High).as_deref(),
            Some("low")
        );
    }

    #[test]
    fn steps_up_when_nothing_lower() {
        let track = track_with(&[(StreamQuality::High, "high")]);
        assert_eq!(
            QualityLadder.resolve(&track, StreamQuality::Poor).as_deref(),
            Some("high")
        );
    }

    #[test]
    fn no_sources_resolves_to_none() {
        let track = Track::new("t", "T");
        assert!(QualityLadder.resolve(&track, StreamQuality::Excellent).is_none());
    }

    #[test]
    fn image_falls_back_to_placeholder() {
        let mut track = Track::new("t", "T");
        assert_eq!(
            QualityLadder.resolve_image(&track, ImageQuality::High),
            PLACEHOLDER_IMAGE
        );

        track
            .image
            .insert(ImageQuality::Low, "https://img/50x50.jpg".to_string());
        assert_eq!(
            QualityLadder.resolve_image(&track, ImageQuality::High),
            "https://img/50x50.jpg"
        );
    }
}
