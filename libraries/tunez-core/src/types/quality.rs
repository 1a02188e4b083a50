/// Quality tiers for audio sources and artwork
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CoreError;

/// Audio quality tier, used for both streaming and downloads
///
/// Ordered from lowest to highest bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamQuality {
    /// 12 kbps
    Poor,
    /// 48 kbps
    Low,
    /// 96 kbps
    Medium,
    /// 160 kbps
    High,
    /// 320 kbps
    #[default]
    Excellent,
}

impl StreamQuality {
    /// All tiers, lowest first
    pub const ALL: [Self; 5] = [
        Self::Poor,
        Self::Low,
        Self::Medium,
        Self::High,
        Self::Excellent,
    ];

    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Poor => "poor",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Excellent => "excellent",
        }
    }

    /// Nominal bitrate in kbps
    #[must_use]
    pub fn bitrate_kbps(&self) -> u32 {
        match self {
            Self::Poor => 12,
            Self::Low => 48,
            Self::Medium => 96,
            Self::High => 160,
            Self::Excellent => 320,
        }
    }
}

impl FromStr for StreamQuality {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|q| q.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::invalid_input(format!("unknown stream quality: {s}")))
    }
}

impl std::fmt::Display for StreamQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Artwork resolution tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageQuality {
    /// 50x50
    Low,
    /// 150x150
    Medium,
    /// 500x500
    #[default]
    High,
}

impl ImageQuality {
    /// All tiers, lowest first
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for ImageQuality {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|q| q.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::invalid_input(format!("unknown image quality: {s}")))
    }
}

impl std::fmt::Display for ImageQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_first_run_preferences() {
        assert_eq!(StreamQuality::default(), StreamQuality::Excellent);
        assert_eq!(ImageQuality::default(), ImageQuality::High);
    }

    #[test]
    fn tiers_are_ordered_by_bitrate() {
        let bitrates: Vec<u32> = StreamQuality::ALL.iter().map(|q| q.bitrate_kbps()).collect();
        let mut sorted = bitrates.clone();
        sorted.sort_unstable();
        assert_eq!(bitrates, sorted);
        assert!(StreamQuality::Poor < StreamQuality::Excellent);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("HIGH".parse::<StreamQuality>().unwrap(), StreamQuality::High);
        assert_eq!(" low ".parse::<ImageQuality>().unwrap(), ImageQuality::Low);
        assert!("ultra".parse::<StreamQuality>().is_err());
    }

    #[test]
    fn serializes_as_lowercase_json_string() {
        let json = serde_json::to_string(&StreamQuality::Excellent).unwrap();
        assert_eq!(json, "\"excellent\"");

        let parsed: ImageQuality = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(parsed, ImageQuality::Medium);
    }
}
