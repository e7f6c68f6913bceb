//! List handle that can be shared and replaced across threads.
//!
//! [`AtomicList`] holds the same nullable storage reference as
//! [`List`], but behind an [`ArcSwapOption`], so every method takes `&self`
//! and the reference itself can be loaded, stored or swapped concurrently.
//!
//! # Lazy Allocation
//!
//! The first writer on a null handle allocates storage with `Arc::new`,
//! which aborts on out-of-memory; element buffer growth after that is
//! fallible as everywhere else. Concurrent first
//! writers are arbitrated by a pooled spin lock keyed by the handle's
//! address:
//!
//! ```text
//! load ── Some ─────────────────────────────────────┐
//!   │                                               ▼
//!   └ None ─► spin lock ─► load ── Some ─► unlock ─► run on storage lock
//!                            │                       ▲
//!                            └ None ─► allocate ─► publish ─► unlock
//! ```
//!
//! Exactly one allocation wins, and no reader can observe storage that is
//! not fully constructed.
//!
//! # Unlocked Loads
//!
//! Reads load the reference without the spin lock and then call the
//! storage's locking methods. This is sound because storage reached through
//! a handle is only ever mutated under its lock, or through `&mut` access
//! that excludes every handle.

use core::cmp::Ordering;
use core::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::{ElementSource, List, ListError, ListIterator, ListPosition, ListStorage, spin};

/// Atomically swappable, nullable handle to a [`ListStorage`].
///
/// ```
/// use nexus_list::AtomicList;
/// use std::sync::Arc;
/// use std::thread;
///
/// let list: Arc<AtomicList<u32>> = Arc::new(AtomicList::new());
///
/// let workers: Vec<_> = (0..4)
///     .map(|i| {
///         let list = Arc::clone(&list);
///         thread::spawn(move || list.add(i).unwrap())
///     })
///     .collect();
/// for worker in workers {
///     worker.join().unwrap();
/// }
///
/// assert_eq!(list.len(), 4);
/// ```
pub struct AtomicList<T> {
    storage: ArcSwapOption<ListStorage<T>>,
}

// =============================================================================
// Construction and handle
// =============================================================================

impl<T> AtomicList<T> {
    /// The null handle.
    #[inline]
    pub const fn new() -> Self {
        Self {
            storage: ArcSwapOption::const_empty(),
        }
    }

    /// Snapshot of the current reference as a [`List`].
    #[inline]
    pub fn load(&self) -> List<T> {
        List::from_arc(self.storage.load_full())
    }

    /// Replaces the reference.
    #[inline]
    pub fn store(&self, list: List<T>) {
        self.storage.store(list.into_arc());
    }

    /// Replaces the reference, returning the previous one.
    #[inline]
    pub fn swap(&self, list: List<T>) -> List<T> {
        List::from_arc(self.storage.swap(list.into_arc()))
    }

    /// Returns `true` if the handle currently owns no storage.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.storage.load().is_none()
    }

    /// Drops this handle's reference, leaving it null.
    #[inline]
    pub fn set_null(&self) {
        self.storage.store(None);
    }

    /// Runs `f` on the current storage, if any.
    #[inline]
    fn with_storage<R>(&self, f: impl FnOnce(&ListStorage<T>) -> R) -> Option<R> {
        let current = self.storage.load();
        current.as_deref().map(f)
    }

    /// Current storage, allocating and publishing it if the handle is null.
    fn storage_or_create(&self) -> Arc<ListStorage<T>> {
        if let Some(storage) = self.storage.load_full() {
            return storage;
        }

        let addr = self as *const Self as usize;
        let _guard = spin::pool_lock_for(addr).lock();
        if let Some(storage) = self.storage.load_full() {
            return storage;
        }

        let storage = Arc::new(ListStorage::new());
        self.storage.store(Some(Arc::clone(&storage)));
        tracing::trace!(addr, "atomic list published new storage");
        storage
    }
}

impl<T> Default for AtomicList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for AtomicList<T> {
    /// New handle sharing the current storage.
    fn clone(&self) -> Self {
        Self::from(self.load())
    }
}

impl<T> From<List<T>> for AtomicList<T> {
    fn from(list: List<T>) -> Self {
        Self {
            storage: ArcSwapOption::new(list.into_arc()),
        }
    }
}

impl<T> From<&AtomicList<T>> for List<T> {
    fn from(atomic: &AtomicList<T>) -> Self {
        atomic.load()
    }
}

impl<T: fmt::Debug> fmt::Debug for AtomicList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicList").field(&self.load()).finish()
    }
}

// =============================================================================
// Queries
// =============================================================================

impl<T> AtomicList<T> {
    /// Number of elements. Zero for a null handle.
    #[inline]
    pub fn len(&self) -> usize {
        self.with_storage(ListStorage::len).unwrap_or(0)
    }

    /// Number of allocated slots. Zero for a null handle.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.with_storage(ListStorage::capacity).unwrap_or(0)
    }

    /// Returns `true` if there are no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if there is at least one element.
    #[inline]
    pub fn is_not_empty(&self) -> bool {
        self.len() != 0
    }

    /// Copy of the element at `index`.
    #[inline]
    pub fn get_at(&self, index: usize) -> Option<T>
    where
        T: Clone,
    {
        self.with_storage(|storage| storage.get_at(index)).flatten()
    }

    /// Copy of the element at `index`, or `T::default()`.
    #[inline]
    pub fn value_at(&self, index: usize) -> T
    where
        T: Clone + Default,
    {
        self.get_at(index).unwrap_or_default()
    }

    /// Copy of the element at `index`, or `default`.
    #[inline]
    pub fn value_at_or(&self, index: usize, default: T) -> T
    where
        T: Clone,
    {
        self.get_at(index).unwrap_or(default)
    }

    /// Index of the first element at or after `start` equal to `value`.
    #[inline]
    pub fn index_of<U>(&self, value: &U, start: usize) -> Option<usize>
    where
        T: PartialEq<U>,
    {
        self.with_storage(|storage| storage.index_of(value, start))
            .flatten()
    }

    /// Index of the first element at or after `start` matching `eq`.
    #[inline]
    pub fn index_of_by<U, F>(&self, value: &U, start: usize, eq: F) -> Option<usize>
    where
        F: Fn(&T, &U) -> bool,
    {
        self.with_storage(|storage| storage.index_of_by(value, start, eq))
            .flatten()
    }

    /// Index of the last element at or before `start` equal to `value`.
    #[inline]
    pub fn last_index_of<U>(&self, value: &U, start: Option<usize>) -> Option<usize>
    where
        T: PartialEq<U>,
    {
        self.with_storage(|storage| storage.last_index_of(value, start))
            .flatten()
    }

    /// Index of the last element at or before `start` matching `eq`.
    #[inline]
    pub fn last_index_of_by<U, F>(&self, value: &U, start: Option<usize>, eq: F) -> Option<usize>
    where
        F: Fn(&T, &U) -> bool,
    {
        self.with_storage(|storage| storage.last_index_of_by(value, start, eq))
            .flatten()
    }

    /// Returns `true` if some element equals `value`.
    #[inline]
    pub fn contains<U>(&self, value: &U) -> bool
    where
        T: PartialEq<U>,
    {
        self.with_storage(|storage| storage.contains(value))
            .unwrap_or(false)
    }

    /// Returns `true` if some element matches `eq`.
    #[inline]
    pub fn contains_by<U, F>(&self, value: &U, eq: F) -> bool
    where
        F: Fn(&T, &U) -> bool,
    {
        self.with_storage(|storage| storage.contains_by(value, eq))
            .unwrap_or(false)
    }

    /// Independent deep copy as a plain [`List`].
    ///
    /// A null or empty list yields the null handle.
    #[inline]
    pub fn duplicate(&self) -> Result<List<T>, ListError>
    where
        T: Clone,
    {
        self.load().duplicate()
    }

    /// Fixed-size copy of the elements.
    #[inline]
    pub fn to_array(&self) -> Result<Box<[T]>, ListError>
    where
        T: Clone,
    {
        self.load().to_array()
    }

    /// Cursor over the current storage bounded by its current count.
    #[inline]
    pub fn to_iterator(&self) -> ListIterator<T> {
        self.load().to_iterator()
    }

    /// Cursor over the elements of the current storage present now.
    #[inline]
    pub fn iter(&self) -> ListPosition<T> {
        self.load().iter()
    }
}

// =============================================================================
// Growing mutation
// =============================================================================

impl<T> AtomicList<T> {
    /// Resizes in place. Resizing a null handle to zero does not allocate.
    pub fn set_count(&self, count: usize) -> Result<(), ListError>
    where
        T: Default,
    {
        if count == 0 && self.is_null() {
            return Ok(());
        }
        self.storage_or_create().set_count(count)
    }

    /// Appends `value`.
    #[inline]
    pub fn add(&self, value: T) -> Result<(), ListError> {
        self.storage_or_create().add(value)
    }

    /// Appends converted copies of `values`.
    pub fn add_elements<U>(&self, values: &[U]) -> Result<(), ListError>
    where
        U: Clone + Into<T>,
    {
        if values.is_empty() {
            return Ok(());
        }
        self.storage_or_create().add_elements(values)
    }

    /// Appends converted copies of every element of `other`.
    ///
    /// A null or empty `other` succeeds without allocating. A source sharing
    /// this handle's storage fails with [`ListError::SelfReference`].
    pub fn add_all<U>(&self, other: &List<U>) -> Result<(), ListError>
    where
        U: Clone + Into<T>,
    {
        match other.storage() {
            Some(source) if !source.is_empty() => self.storage_or_create().add_all(source),
            _ => Ok(()),
        }
    }

    /// Appends everything `iter` yields.
    ///
    /// # Panics
    ///
    /// Panics if `iter` reads this same storage while it runs. Use
    /// [`add_all_from`](Self::add_all_from) with a cursor for that.
    pub fn add_all_iter<I>(&self, iter: I) -> Result<(), ListError>
    where
        I: IntoIterator<Item = T>,
    {
        let mut iter = iter.into_iter().peekable();
        if iter.peek().is_none() {
            return Ok(());
        }
        self.storage_or_create().add_all_iter(iter)
    }

    /// Appends everything `source` produces, locking once per element.
    pub fn add_all_from<S>(&self, mut source: S) -> Result<(), ListError>
    where
        S: ElementSource<T>,
        T: Default,
    {
        let mut value = T::default();
        while source.next_into(&mut value) {
            self.add(core::mem::take(&mut value))?;
        }
        Ok(())
    }

    /// Appends `value` unless an equal element is present.
    #[inline]
    pub fn add_if_not_exist(&self, value: T) -> Result<bool, ListError>
    where
        T: PartialEq,
    {
        self.storage_or_create().add_if_not_exist(value)
    }

    /// Appends `value` unless some element matches `eq`.
    #[inline]
    pub fn add_if_not_exist_by<F>(&self, value: T, eq: F) -> Result<bool, ListError>
    where
        F: Fn(&T, &T) -> bool,
    {
        self.storage_or_create().add_if_not_exist_by(value, eq)
    }

    /// Inserts `value` at `index`. Past the end appends.
    #[inline]
    pub fn insert(&self, index: usize, value: T) -> Result<(), ListError> {
        self.storage_or_create().insert(index, value)
    }

    /// Inserts converted copies of `values` at `index`.
    pub fn insert_elements<U>(&self, index: usize, values: &[U]) -> Result<(), ListError>
    where
        U: Clone + Into<T>,
    {
        if values.is_empty() {
            return Ok(());
        }
        self.storage_or_create().insert_elements(index, values)
    }

    /// Inserts converted copies of every element of `other` at `index`.
    pub fn insert_all<U>(&self, index: usize, other: &List<U>) -> Result<(), ListError>
    where
        U: Clone + Into<T>,
    {
        match other.storage() {
            Some(source) if !source.is_empty() => {
                self.storage_or_create().insert_all(index, source)
            }
            _ => Ok(()),
        }
    }
}

// =============================================================================
// In-place mutation
// =============================================================================

impl<T> AtomicList<T> {
    /// Replaces the element at `index`.
    pub fn set_at(&self, index: usize, value: T) -> Result<(), ListError> {
        self.with_storage(|storage| storage.set_at(index, value))
            .unwrap_or(Err(ListError::OutOfBounds { index, count: 0 }))
    }

    /// Removes and returns the element at `index`.
    #[inline]
    pub fn remove_at(&self, index: usize) -> Option<T> {
        self.with_storage(|storage| storage.remove_at(index))
            .flatten()
    }

    /// Removes up to `count` elements starting at `index`. Returns how many.
    #[inline]
    pub fn remove_range(&self, index: usize, count: usize) -> usize {
        self.with_storage(|storage| storage.remove_range(index, count))
            .unwrap_or(0)
    }

    /// Removes and returns the first element equal to `value`.
    #[inline]
    pub fn remove_value<U>(&self, value: &U) -> Option<T>
    where
        T: PartialEq<U>,
    {
        self.with_storage(|storage| storage.remove_value(value))
            .flatten()
    }

    /// Removes and returns the first element matching `eq`.
    #[inline]
    pub fn remove_value_by<U, F>(&self, value: &U, eq: F) -> Option<T>
    where
        F: Fn(&T, &U) -> bool,
    {
        self.with_storage(|storage| storage.remove_value_by(value, eq))
            .flatten()
    }

    /// Removes every element equal to `value`, pushing them to `out` when given.
    #[inline]
    pub fn remove_elements_by_value<U>(&self, value: &U, out: Option<&mut Vec<T>>) -> usize
    where
        T: PartialEq<U>,
    {
        self.with_storage(|storage| storage.remove_elements_by_value(value, out))
            .unwrap_or(0)
    }

    /// Removes every element matching `eq`, pushing them to `out` when given.
    #[inline]
    pub fn remove_elements_by_value_by<U, F>(
        &self,
        value: &U,
        out: Option<&mut Vec<T>>,
        eq: F,
    ) -> usize
    where
        F: Fn(&T, &U) -> bool,
    {
        self.with_storage(|storage| storage.remove_elements_by_value_by(value, out, eq))
            .unwrap_or(0)
    }

    /// Drops every element. Returns how many there were.
    #[inline]
    pub fn remove_all(&self) -> usize {
        self.with_storage(ListStorage::remove_all).unwrap_or(0)
    }

    /// Removes and returns the first element.
    #[inline]
    pub fn pop_front(&self) -> Option<T> {
        self.with_storage(ListStorage::pop_front).flatten()
    }

    /// Removes up to `count` elements from the front. Returns how many.
    #[inline]
    pub fn pop_front_elements(&self, count: usize) -> usize {
        self.with_storage(|storage| storage.pop_front_elements(count))
            .unwrap_or(0)
    }

    /// Removes and returns the last element.
    #[inline]
    pub fn pop_back(&self) -> Option<T> {
        self.with_storage(ListStorage::pop_back).flatten()
    }

    /// Removes up to `count` elements from the back. Returns how many.
    #[inline]
    pub fn pop_back_elements(&self, count: usize) -> usize {
        self.with_storage(|storage| storage.pop_back_elements(count))
            .unwrap_or(0)
    }

    /// Sorts in place.
    #[inline]
    pub fn sort(&self, ascending: bool)
    where
        T: Ord,
    {
        self.with_storage(|storage| storage.sort(ascending));
    }

    /// Sorts in place by `compare`.
    #[inline]
    pub fn sort_by<F>(&self, ascending: bool, compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.with_storage(|storage| storage.sort_by(ascending, compare));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(list: &AtomicList<i32>) -> Vec<i32> {
        list.to_array().unwrap().into_vec()
    }

    #[test]
    fn null_reads_are_neutral() {
        let list: AtomicList<i32> = AtomicList::new();
        assert!(list.is_null());
        assert_eq!(list.len(), 0);
        assert_eq!(list.get_at(0), None);
        assert_eq!(list.pop_front(), None);
        assert_eq!(list.remove_range(0, 1), 0);
        assert_eq!(
            list.set_at(1, 0),
            Err(ListError::OutOfBounds { index: 1, count: 0 })
        );
        list.sort(true);
        assert!(list.is_null());
        assert_eq!(format!("{list:?}"), "AtomicList(null)");
    }

    #[test]
    fn first_write_allocates() {
        let list: AtomicList<i32> = AtomicList::new();
        list.set_count(0).unwrap();
        assert!(list.is_null());

        list.insert(3, 1).unwrap();
        assert!(!list.is_null());
        list.add(2).unwrap();
        assert_eq!(contents(&list), vec![1, 2]);
    }

    #[test]
    fn load_shares_storage() {
        let atomic: AtomicList<i32> = AtomicList::new();
        atomic.add(1).unwrap();
        let list = atomic.load();
        list.set_at(0, 10).unwrap();
        assert_eq!(atomic.get_at(0), Some(10));

        let snapshot = List::from(&atomic);
        assert!(snapshot.ptr_eq(&list));
    }

    #[test]
    fn store_and_swap_replace_reference() {
        let atomic: AtomicList<i32> = AtomicList::from(List::from_slice(&[1]).unwrap());
        let previous = atomic.swap(List::from_slice(&[2, 3]).unwrap());
        assert_eq!(previous.get_at(0), Some(1));
        assert_eq!(contents(&atomic), vec![2, 3]);

        atomic.store(List::new());
        assert!(atomic.is_null());
        assert_eq!(previous.len(), 1);
    }

    #[test]
    fn clone_shares_current_storage() {
        let atomic: AtomicList<i32> = AtomicList::new();
        atomic.add(1).unwrap();
        let other = atomic.clone();
        other.add(2).unwrap();
        assert_eq!(contents(&atomic), vec![1, 2]);

        atomic.set_null();
        assert_eq!(contents(&other), vec![1, 2]);
    }

    #[test]
    fn add_all_rejects_own_storage() {
        let atomic: AtomicList<i32> = AtomicList::new();
        atomic.add_elements(&[1, 2]).unwrap();
        assert_eq!(atomic.add_all(&atomic.load()), Err(ListError::SelfReference));
        assert_eq!(atomic.len(), 2);

        atomic.add_all(&List::<i32>::from_slice(&[3]).unwrap()).unwrap();
        atomic.insert_all(0, &List::<i32>::from_slice(&[0]).unwrap()).unwrap();
        assert_eq!(contents(&atomic), vec![0, 1, 2, 3]);
    }

    #[test]
    fn add_if_not_exist_and_removals() {
        let atomic: AtomicList<i32> = AtomicList::new();
        assert_eq!(atomic.add_if_not_exist(5), Ok(true));
        assert_eq!(atomic.add_if_not_exist(5), Ok(false));
        atomic.add_all_iter([6, 5, 7]).unwrap();
        assert_eq!(atomic.remove_elements_by_value(&5, None), 2);
        assert_eq!(atomic.remove_value(&6), Some(6));
        assert_eq!(contents(&atomic), vec![7]);
    }

    #[test]
    fn duplicate_is_a_plain_list() {
        let atomic: AtomicList<i32> = AtomicList::new();
        atomic.add_elements(&[1, 2]).unwrap();
        let copy = atomic.duplicate().unwrap();
        copy.set_at(0, 9).unwrap();
        assert_eq!(atomic.get_at(0), Some(1));
        assert!(AtomicList::<i32>::new().duplicate().unwrap().is_null());
    }

    #[test]
    fn iteration_over_loaded_storage() {
        let atomic: AtomicList<i32> = AtomicList::new();
        atomic.add_elements(&[1, 2, 3]).unwrap();
        assert_eq!(atomic.iter().sum::<i32>(), 6);
        assert_eq!(atomic.to_iterator().count(), 3);
    }

    #[test]
    fn add_all_from_own_iterator_doubles() {
        let atomic: AtomicList<i32> = AtomicList::new();
        atomic.add_elements(&[1, 2, 3]).unwrap();
        atomic.add_all_from(atomic.to_iterator()).unwrap();
        assert_eq!(contents(&atomic), vec![1, 2, 3, 1, 2, 3]);
    }
}
