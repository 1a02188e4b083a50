//! Tunez Storage
//!
//! Durable preferences and in-memory session state for the Tunez player.
//!
//! # Architecture
//!
//! - **Key/Value Boundary**: `KeyValueStore` with an in-memory and a `redb` backend
//! - **Observable Cells**: `StateCell` (ephemeral) and `PersistentCell` (write-through JSON)
//! - **Preferences**: queue, current index, quality tiers and volume, restored on startup
//! - **Session State**: shuffle, loop flags, typing, overlay, playback position
//!
//! Every cell is backed by a `tokio::sync::watch` channel, so any number of
//! observers can follow a value without polling.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tunez_storage::{MemoryStore, PreferenceStore};
//!
//! let store = Arc::new(MemoryStore::new());
//! let prefs = PreferenceStore::load(store.clone());
//! assert_eq!(prefs.volume.get(), 0.75);
//!
//! prefs.volume.set(0.4);
//!
//! // A fresh load from the same backing store sees the persisted value
//! let restored = PreferenceStore::load(store);
//! assert_eq!(restored.volume.get(), 0.4);
//! ```

#![forbid(unsafe_code)]

mod cell;
mod database;
mod error;
mod kv;

pub mod preferences;
pub mod session;

pub use cell::{PersistentCell, StateCell};
pub use database::RedbStore;
pub use error::{Result, StorageError};
pub use kv::{KeyValueStore, MemoryStore};
pub use preferences::PreferenceStore;
pub use session::SessionState;
