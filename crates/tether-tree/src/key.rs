//! Storage keys for per-node extension slots.

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Value stored in a node slot.
///
/// Slots are type-erased; the owner of the [`StorageKey`] knows the concrete
/// type and downcasts on read.
pub type Slot = Rc<dyn Any>;

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// Opaque token addressing one extension slot on every node of a host tree.
///
/// Each call to [`StorageKey::mint`] returns a key no other call has returned
/// in this process, so independent owners can store data on the same node
/// without interfering with each other.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageKey(u64);

impl StorageKey {
    /// Mint a fresh, process-unique key.
    #[must_use]
    pub fn mint() -> Self {
        Self(NEXT_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageKey(#{})", self.0)
    }
}

#[cfg(test)]
mod tests {
    static_assertions::assert_impl_all!(super::StorageKey: Send, Sync, Copy);
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_minted_keys_are_unique() {
        let keys: HashSet<StorageKey> = (0..1000).map(|_| StorageKey::mint()).collect();
        assert_eq!(keys.len(), 1000);
    }

    #[test]
    fn test_minted_keys_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| (0..250).map(|_| StorageKey::mint()).collect::<Vec<_>>())
            })
            .collect();

        let mut keys = HashSet::new();
        for handle in handles {
            for key in handle.join().unwrap() {
                assert!(keys.insert(key), "duplicate key {key:?}");
            }
        }
        assert_eq!(keys.len(), 1000);
    }

    #[test]
    fn test_key_is_copy_and_comparable() {
        let key = StorageKey::mint();
        let copy = key;
        assert_eq!(key, copy);
        assert_ne!(key, StorageKey::mint());
    }
}
