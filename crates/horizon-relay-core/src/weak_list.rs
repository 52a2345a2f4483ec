//! Weak observer registry.
//!
//! [`WeakList`] is an ordered list of [`Weak`] references. It never keeps its
//! referents alive: once the last strong reference to an element is dropped,
//! the entry becomes dead and is pruned lazily the next time the list is
//! measured.
//!
//! # Index stability
//!
//! [`WeakList::len`] compacts the list before counting, so an index obtained
//! before a call to `len` (or to [`WeakList::iter`], which calls it) may refer
//! to a different element afterwards. Indices are positions, not identities.
//!
//! # Thread Safety
//!
//! Every operation takes a single internal lock, so concurrent readers never
//! observe a torn list. The lock is never held while caller code runs.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_relay_core::weak_list::WeakList;
//!
//! let list = WeakList::new();
//! let a = Arc::new("a");
//! let b = Arc::new("b");
//! list.push(&a);
//! list.push(&b);
//!
//! drop(a);
//! assert_eq!(list.len(), 1);
//! assert_eq!(list.get(0).unwrap().as_deref(), Some(&"b"));
//! assert!(list.get(1).is_err());
//! ```

use std::fmt;
use std::iter::FusedIterator;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::{RegistryError, RegistryResult};

/// An insertion-ordered list of weak references.
pub struct WeakList<T: ?Sized> {
    items: Mutex<Vec<Weak<T>>>,
}

impl<T: ?Sized> WeakList<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    /// Insert a weak reference to `value` at `index`.
    ///
    /// No liveness check is performed. Fails if `index` is greater than the
    /// number of stored entries, dead ones included.
    pub fn insert(&self, index: usize, value: &Arc<T>) -> RegistryResult<()> {
        let mut items = self.items.lock();
        if index > items.len() {
            return Err(RegistryError::IndexOutOfRange {
                index,
                len: items.len(),
            });
        }
        items.insert(index, Arc::downgrade(value));
        Ok(())
    }

    /// Append a weak reference to `value`.
    pub fn push(&self, value: &Arc<T>) {
        self.items.lock().push(Arc::downgrade(value));
    }

    /// Get the element at `index`.
    ///
    /// Returns `Ok(None)` when the entry exists but its referent has already
    /// been dropped.
    pub fn get(&self, index: usize) -> RegistryResult<Option<Arc<T>>> {
        let items = self.items.lock();
        items
            .get(index)
            .map(Weak::upgrade)
            .ok_or(RegistryError::IndexOutOfRange {
                index,
                len: items.len(),
            })
    }

    /// Prune dead entries, then return the number of remaining entries.
    ///
    /// This is not a pure observer: positions of live entries shift down past
    /// any pruned ones.
    pub fn len(&self) -> usize {
        let mut items = self.items.lock();
        compact(&mut items);
        items.len()
    }

    /// Number of stored entries without pruning, dead ones included.
    pub fn raw_len(&self) -> usize {
        self.items.lock().len()
    }

    /// Prune dead entries and check whether any live ones remain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Prune dead entries, returning how many were removed.
    pub fn prune(&self) -> usize {
        compact(&mut self.items.lock())
    }

    /// Remove the first live entry that refers to `value`.
    ///
    /// Returns `false` if no live entry matches. Dead entries are left for the
    /// next compaction.
    pub fn remove(&self, value: &Arc<T>) -> bool {
        let mut items = self.items.lock();
        match position_of(&items, value) {
            Some(index) => {
                items.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove the entry at `index`, returning its referent if still alive.
    pub fn remove_at(&self, index: usize) -> RegistryResult<Option<Arc<T>>> {
        let mut items = self.items.lock();
        if index >= items.len() {
            return Err(RegistryError::IndexOutOfRange {
                index,
                len: items.len(),
            });
        }
        Ok(items.remove(index).upgrade())
    }

    /// Check whether a live entry refers to `value`.
    pub fn contains(&self, value: &Arc<T>) -> bool {
        position_of(&self.items.lock(), value).is_some()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.items.lock().clear();
    }

    /// Collect strong handles to every live element, in order.
    ///
    /// Dead entries are dropped in the same pass without a trace record.
    /// The returned handles keep their referents alive until released, so
    /// callers may mutate the list while walking the snapshot.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        let mut items = self.items.lock();
        let mut live = Vec::with_capacity(items.len());
        items.retain(|item| match item.upgrade() {
            Some(value) => {
                live.push(value);
                true
            }
            None => false,
        });
        live
    }

    /// Iterate over the elements present when iteration starts.
    ///
    /// The iterator prunes the list once, records its length, then fetches
    /// elements by position. Items are `None` for referents dropped after the
    /// snapshot. If the list shrinks concurrently, iteration stops early.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            next: 0,
            end: self.len(),
        }
    }
}

fn compact<T: ?Sized>(items: &mut Vec<Weak<T>>) -> usize {
    let before = items.len();
    items.retain(|item| item.strong_count() > 0);
    let removed = before - items.len();
    if removed > 0 {
        tracing::trace!(
            target: "horizon_relay_core::weak_list",
            removed,
            remaining = items.len(),
            "pruned dead entries"
        );
    }
    removed
}

// Compares data addresses only: vtable pointers of `dyn` referents are not
// guaranteed unique. A dead entry may share an address with a newer
// allocation, hence the liveness check.
fn position_of<T: ?Sized>(items: &[Weak<T>], value: &Arc<T>) -> Option<usize> {
    let target = Arc::as_ptr(value);
    items
        .iter()
        .position(|item| item.strong_count() > 0 && std::ptr::addr_eq(item.as_ptr(), target))
}

impl<T: ?Sized> Default for WeakList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for WeakList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakList")
            .field("raw_len", &self.raw_len())
            .finish()
    }
}

impl<'a, T: ?Sized + 'a> FromIterator<&'a Arc<T>> for WeakList<T> {
    fn from_iter<I: IntoIterator<Item = &'a Arc<T>>>(iter: I) -> Self {
        Self {
            items: Mutex::new(iter.into_iter().map(Arc::downgrade).collect()),
        }
    }
}

impl<'a, T: ?Sized + 'a> Extend<&'a Arc<T>> for WeakList<T> {
    fn extend<I: IntoIterator<Item = &'a Arc<T>>>(&mut self, iter: I) {
        self.items
            .get_mut()
            .extend(iter.into_iter().map(Arc::downgrade));
    }
}

impl<'a, T: ?Sized> IntoIterator for &'a WeakList<T> {
    type Item = Option<Arc<T>>;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Snapshot-length iterator over a [`WeakList`], created by [`WeakList::iter`].
pub struct Iter<'a, T: ?Sized> {
    list: &'a WeakList<T>,
    next: usize,
    end: usize,
}

impl<T: ?Sized> Iterator for Iter<'_, T> {
    type Item = Option<Arc<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let index = self.next;
        self.next += 1;
        match self.list.get(index) {
            Ok(item) => Some(item),
            Err(_) => {
                self.next = self.end;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.end - self.next))
    }
}

impl<T: ?Sized> FusedIterator for Iter<'_, T> {}
