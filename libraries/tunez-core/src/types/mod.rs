mod quality;
mod track;

pub use quality::{ImageQuality, StreamQuality};
pub use track::{AlbumRef, ArtistRef, MediaType, Track};
