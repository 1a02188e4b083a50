//! Observable state cells
//!
//! `StateCell` holds an ephemeral value; `PersistentCell` additionally writes
//! every change through to a `KeyValueStore` as JSON. Both notify
//! subscribers only when the value actually changes.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;

use crate::kv::KeyValueStore;

/// Shared value with change notification
pub struct StateCell<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone + PartialEq> StateCell<T> {
    pub fn new(value: T) -> Self {
        let (tx, _rx) = watch::channel(value);
        Self { tx }
    }

    /// Current value (cloned)
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Inspect the current value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Replace the value; returns whether it changed
    pub fn set(&self, value: T) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }

    /// Mutate in place; subscribers are woken only if the result differs
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        self.tx.send_if_modified(|current| {
            let before = current.clone();
            f(current);
            *current != before
        })
    }

    /// Receiver that observes every subsequent change
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone + PartialEq + Default> Default for StateCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for StateCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StateCell").field(&*self.tx.borrow()).finish()
    }
}

/// `StateCell` with write-through persistence
///
/// Persistence is best effort: a failed write is logged and the in-memory
/// value still changes.
pub struct PersistentCell<T> {
    key: &'static str,
    cell: StateCell<T>,
    store: Arc<dyn KeyValueStore>,
}

impl<T> PersistentCell<T>
where
    T: Serialize + DeserializeOwned + Clone + PartialEq,
{
    /// Restore from `store`, falling back to `default` when the key is
    /// missing or unreadable
    pub fn load(store: Arc<dyn KeyValueStore>, key: &'static str, default: T) -> Self {
        Self::load_validated(store, key, default, |_| true)
    }

    /// Like [`load`](Self::load), also rejecting stored values that fail `valid`
    pub fn load_validated(
        store: Arc<dyn KeyValueStore>,
        key: &'static str,
        default: T,
        valid: impl Fn(&T) -> bool,
    ) -> Self {
        let value = match store.get(key) {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) if valid(&value) => value,
                Ok(_) => {
                    tracing::warn!(key, raw = %raw, "Stored value out of range, using default");
                    default
                }
                Err(e) => {
                    tracing::warn!(key, error = %e, "Failed to decode stored value, using default");
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read stored value, using default");
                default
            }
        };

        Self {
            key,
            cell: StateCell::new(value),
            store,
        }
    }

    /// Storage key this cell persists under
    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn get(&self) -> T {
        self.cell.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.cell.with(f)
    }

    /// Replace the value and persist it if it changed
    pub fn set(&self, value: T) -> bool {
        let changed = self.cell.set(value);
        if changed {
            self.persist();
        }
        changed
    }

    /// Mutate in place and persist if the value changed
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let changed = self.cell.update(f);
        if changed {
            self.persist();
        }
        changed
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.cell.subscribe()
    }

    fn persist(&self) {
        let encoded = self.cell.with(serde_json::to_string);
        let result = match encoded {
            Ok(json) => self.store.set(self.key, &json),
            Err(e) => Err(e.into()),
        };

        if let Err(e) = result {
            tracing::warn!(key = self.key, error = %e, "Failed to persist value");
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PersistentCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistentCell")
            .field("key", &self.key)
            .field("value", &*self.cell.tx.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, StorageError};
    use crate::kv::MemoryStore;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(StorageError::backend("unavailable"))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(StorageError::backend("read-only"))
        }

        fn remove(&self, _key: &str) -> Result<()> {
            Err(StorageError::backend("read-only"))
        }
    }

    #[test]
    fn set_reports_change_only_when_different() {
        let cell = StateCell::new(1);
        assert!(!cell.set(1));
        assert!(cell.set(2));
        assert_eq!(cell.get(), 2);
        assert!(!cell.update(|v| *v = 2));
        assert!(cell.update(|v| *v += 1));
        assert_eq!(cell.with(|v| *v * 10), 30);
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let cell = StateCell::new(false);
        let mut rx = cell.subscribe();

        cell.set(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());

        cell.set(true);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn persistent_cell_writes_through() {
        let store = Arc::new(MemoryStore::new());
        let cell = PersistentCell::load(store.clone(), "stream_quality", "excellent".to_string());
        assert_eq!(store.get("stream_quality").unwrap(), None);

        cell.set("low".to_string());
        assert_eq!(
            store.get("stream_quality").unwrap().as_deref(),
            Some("\"low\"")
        );
        assert_eq!(cell.key(), "stream_quality");
    }

    #[test]
    fn undecodable_or_invalid_values_fall_back() {
        let store = Arc::new(MemoryStore::new());
        store.set("tunez_volume", "not json").unwrap();
        let cell = PersistentCell::load(store.clone(), "tunez_volume", 0.75_f32);
        assert_eq!(cell.get(), 0.75);

        store.set("tunez_volume", "4.0").unwrap();
        let cell = PersistentCell::load_validated(store, "tunez_volume", 0.75_f32, |v| {
            (0.0..=1.0).contains(v)
        });
        assert_eq!(cell.get(), 0.75);
    }

    #[test]
    fn failing_store_keeps_in_memory_value() {
        let cell = PersistentCell::load(Arc::new(BrokenStore), "queue", Vec::<u32>::new());
        assert!(cell.get().is_empty());

        assert!(cell.set(vec![1, 2]));
        assert_eq!(cell.get(), vec![1, 2]);
    }
}
