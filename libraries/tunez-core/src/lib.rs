//! Tunez Core
//!
//! Platform-agnostic domain types and helpers shared by the Tunez crates.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `ArtistRef`, `AlbumRef`, `MediaType`
//! - **Quality Tiers**: `StreamQuality` (stream + download) and `ImageQuality`
//! - **Resolution**: `SourceResolver` / `ImageResolver` pick a concrete URL per tier
//! - **Error Handling**: Unified `CoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use tunez_core::{format_duration, QualityLadder, SourceResolver, StreamQuality, Track};
//!
//! let mut track = Track::new("abc123", "Night Drive");
//! track
//!     .download_url
//!     .insert(StreamQuality::Medium, "https://cdn.example/abc123_96.mp4".to_string());
//!
//! // No "excellent" rendition: the ladder steps down to the closest tier we have
//! let url = QualityLadder.resolve(&track, StreamQuality::Excellent);
//! assert_eq!(url.as_deref(), Some("https://cdn.example/abc123_96.mp4"));
//!
//! assert_eq!(format_duration(185.0), "3:05");
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod format;
pub mod resolve;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use format::format_duration;
pub use resolve::{ImageResolver, QualityLadder, SourceResolver, PLACEHOLDER_IMAGE};
pub use types::{AlbumRef, ArtistRef, ImageQuality, MediaType, StreamQuality, Track};
