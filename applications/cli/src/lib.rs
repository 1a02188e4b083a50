//! Tunez terminal player
//!
//! Drives the playback controller from a line-oriented shell, with a
//! simulated audio engine standing in for a real output device.

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod shell;

pub use config::CliConfig;
pub use engine::SimulatedEngine;
pub use error::{CliError, Result};
