// src/cache/store.rs
//! Single-slot cache guarded by a mutex.

use std::sync::{Arc, Mutex, PoisonError};

/// Holds at most one reading. Writers swap in a whole new `Arc`, so readers
/// observe either nothing or a complete snapshot.
#[derive(Debug)]
pub struct CachedValue<T> {
    inner: Mutex<Option<Arc<T>>>,
}

impl<T> CachedValue<T> {
    pub fn empty() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    pub fn read(&self) -> Option<Arc<T>> {
        // A poisoned slot still holds a complete snapshot.
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn write(&self, value: T) {
        let fresh = Arc::new(value);
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(fresh);
    }
}

impl<T> Default for CachedValue<T> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty_then_holds_latest_write() {
        let store = CachedValue::empty();
        assert!(store.read().is_none());

        store.write(1u32);
        store.write(2u32);
        assert_eq!(store.read().as_deref(), Some(&2));
    }

    #[test]
    fn old_snapshot_survives_replacement() {
        let store = CachedValue::empty();
        store.write(String::from("first"));
        let held = store.read().unwrap();

        store.write(String::from("second"));
        assert_eq!(held.as_str(), "first");
        assert_eq!(store.read().unwrap().as_str(), "second");
    }

    #[test]
    fn concurrent_readers_see_whole_values() {
        let store = Arc::new(CachedValue::empty());
        store.write((0u64, 0u64));

        let writer = {
            let s = store.clone();
            std::thread::spawn(move || {
                for i in 1..=1000u64 {
                    s.write((i, i * 2));
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let s = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let v = s.read().unwrap();
                        assert_eq!(v.1, v.0 * 2);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(*store.read().unwrap(), (1000, 2000));
    }
}
