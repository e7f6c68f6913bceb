//! Element storage behind a per-storage re-entrant lock.
//!
//! [`ListStorage`] is what list handles share. Every operation exists in two
//! forms:
//!
//! | Form | Reached through | Lock |
//! |------|-----------------|------|
//! | locking | `storage.add(x)` | taken for the single call |
//! | no-lock | `storage.lock().borrow_mut().add(x)`, `storage.get_mut().add(x)` | already held by the caller |
//!
//! The no-lock forms are the methods of [`RawList`]. A held [`ListGuard`] is
//! the capability proving the lock is taken, so several operations can be
//! composed atomically:
//!
//! ```
//! use nexus_list::ListStorage;
//!
//! let storage: ListStorage<i32> = ListStorage::new();
//! {
//!     let mut guard = storage.lock();
//!     if !guard.borrow().contains(&7) {
//!         guard.borrow_mut().add(7).unwrap();
//!     }
//!     // Locking calls from the thread holding the guard proceed.
//!     assert_eq!(storage.len(), 1);
//!     guard.borrow_mut().sort(true);
//! }
//! assert_eq!(storage.len(), 1);
//! ```
//!
//! The lock is re-entrant: a thread holding a [`ListGuard`] may keep making
//! locking calls on the same storage, directly or through any handle. The
//! buffer itself sits in a `RefCell`, so a locking call made while a
//! [`Ref`](core::cell::Ref) or [`RefMut`](core::cell::RefMut) taken from the
//! guard (or a live [`ListLocker`](crate::ListLocker)) is still alive panics
//! instead of aliasing the buffer. It never blocks.
//!
//! # Two-Storage Operations
//!
//! [`add_all`](ListStorage::add_all) and [`insert_all`](ListStorage::insert_all)
//! lock both storages, lower address first, so two threads copying in
//! opposite directions cannot deadlock. Passing the destination as its own
//! source fails with [`ListError::SelfReference`].

use core::cell::RefCell;
use core::cmp::Ordering;
use core::fmt;

use parking_lot::ReentrantMutex;

use crate::{ListError, ListGuard, RawList};

/// Contiguous element buffer guarded by its own re-entrant lock.
pub struct ListStorage<T> {
    inner: ReentrantMutex<RefCell<RawList<T>>>,
}

impl<T> ListStorage<T> {
    /// Creates empty storage without allocating a buffer.
    #[inline]
    pub const fn new() -> Self {
        Self {
            inner: ReentrantMutex::new(RefCell::new(RawList::new())),
        }
    }

    /// Storage holding `count` default elements.
    pub fn with_count(count: usize) -> Result<Self, ListError>
    where
        T: Default,
    {
        RawList::with_count(count).map(Self::from_raw)
    }

    /// Storage holding `count` default elements with room for `capacity`.
    pub fn with_count_and_capacity(count: usize, capacity: usize) -> Result<Self, ListError>
    where
        T: Default,
    {
        RawList::with_count_and_capacity(count, capacity).map(Self::from_raw)
    }

    /// Storage holding converted copies of `values`.
    pub fn from_slice<U>(values: &[U]) -> Result<Self, ListError>
    where
        U: Clone + Into<T>,
    {
        RawList::from_slice(values).map(Self::from_raw)
    }

    /// Wraps an existing buffer.
    #[inline]
    pub const fn from_raw(raw: RawList<T>) -> Self {
        Self {
            inner: ReentrantMutex::new(RefCell::new(raw)),
        }
    }

    /// Unwraps the buffer.
    #[inline]
    pub fn into_inner(self) -> RawList<T> {
        self.inner.into_inner().into_inner()
    }

    /// Locks the storage, returning the no-lock capability.
    #[inline]
    pub fn lock(&self) -> ListGuard<'_, T> {
        ListGuard::new(self.inner.lock())
    }

    /// Locks the storage unless another thread holds it.
    #[inline]
    pub fn try_lock(&self) -> Option<ListGuard<'_, T>> {
        self.inner.try_lock().map(ListGuard::new)
    }

    /// Exclusive access to the buffer. No locking is needed.
    #[inline]
    pub fn get_mut(&mut self) -> &mut RawList<T> {
        self.inner.get_mut().get_mut()
    }

    /// Returns `true` if some thread holds the lock.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// Returns `true` if the calling thread holds the lock.
    #[inline]
    pub fn is_locked_by_current_thread(&self) -> bool {
        self.inner.is_owned_by_current_thread()
    }

    /// Shared access to the buffer without taking the lock.
    ///
    /// # Safety
    ///
    /// No other thread may mutate the storage while the returned reference
    /// is alive.
    #[inline]
    pub(crate) unsafe fn raw_unlocked(&self) -> &RawList<T> {
        // Safety: upheld by the caller.
        unsafe { &*(*self.inner.data_ptr()).as_ptr() }
    }

    /// The cell holding the buffer, reached without the lock.
    ///
    /// # Safety
    ///
    /// The calling thread must hold the lock for as long as the cell, or any
    /// borrow taken from it, is used.
    #[inline]
    pub(crate) unsafe fn cell(&self) -> &RefCell<RawList<T>> {
        // Safety: upheld by the caller.
        unsafe { &*self.inner.data_ptr() }
    }

    /// Runs `f` on the buffer under the lock with a shared borrow.
    #[inline]
    fn read<R>(&self, f: impl FnOnce(&RawList<T>) -> R) -> R {
        let lock = self.inner.lock();
        let raw = lock.borrow();
        f(&raw)
    }

    /// Runs `f` on the buffer under the lock with an exclusive borrow.
    #[inline]
    fn write<R>(&self, f: impl FnOnce(&mut RawList<T>) -> R) -> R {
        let lock = self.inner.lock();
        let mut raw = lock.borrow_mut();
        f(&mut raw)
    }

    /// Address used to order two-storage locking.
    #[inline]
    fn addr(&self) -> usize {
        self as *const Self as *const () as usize
    }
}

impl<T> Default for ListStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<RawList<T>> for ListStorage<T> {
    fn from(raw: RawList<T>) -> Self {
        Self::from_raw(raw)
    }
}

impl<T: fmt::Debug> fmt::Debug for ListStorage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lock = self.inner.try_lock();
        match lock.as_ref().and_then(|cell| cell.try_borrow().ok()) {
            Some(raw) => f.debug_struct("ListStorage").field("elements", &*raw).finish(),
            None => f.debug_struct("ListStorage").field("elements", &"<locked>").finish(),
        }
    }
}

// =============================================================================
// Locking queries
// =============================================================================

impl<T> ListStorage<T> {
    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.read(|raw| raw.len())
    }

    /// Number of allocated slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.read(|raw| raw.capacity())
    }

    /// Returns `true` if there are no live elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.read(|raw| raw.is_empty())
    }

    /// Copy of the element at `index`.
    #[inline]
    pub fn get_at(&self, index: usize) -> Option<T>
    where
        T: Clone,
    {
        self.read(|raw| raw.get_at(index))
    }

    /// Copy of the element at `index`, or `T::default()`.
    #[inline]
    pub fn value_at(&self, index: usize) -> T
    where
        T: Clone + Default,
    {
        self.read(|raw| raw.value_at(index))
    }

    /// Copy of the element at `index`, or `default`.
    #[inline]
    pub fn value_at_or(&self, index: usize, default: T) -> T
    where
        T: Clone,
    {
        self.read(|raw| raw.value_at_or(index, default))
    }

    /// See [`RawList::index_of`].
    #[inline]
    pub fn index_of<U>(&self, value: &U, start: usize) -> Option<usize>
    where
        T: PartialEq<U>,
    {
        self.read(|raw| raw.index_of(value, start))
    }

    /// See [`RawList::index_of_by`].
    #[inline]
    pub fn index_of_by<U, F>(&self, value: &U, start: usize, eq: F) -> Option<usize>
    where
        F: Fn(&T, &U) -> bool,
    {
        self.read(|raw| raw.index_of_by(value, start, eq))
    }

    /// See [`RawList::last_index_of`].
    #[inline]
    pub fn last_index_of<U>(&self, value: &U, start: Option<usize>) -> Option<usize>
    where
        T: PartialEq<U>,
    {
        self.read(|raw| raw.last_index_of(value, start))
    }

    /// See [`RawList::last_index_of_by`].
    #[inline]
    pub fn last_index_of_by<U, F>(&self, value: &U, start: Option<usize>, eq: F) -> Option<usize>
    where
        F: Fn(&T, &U) -> bool,
    {
        self.read(|raw| raw.last_index_of_by(value, start, eq))
    }

    /// Returns `true` if some element equals `value`.
    #[inline]
    pub fn contains<U>(&self, value: &U) -> bool
    where
        T: PartialEq<U>,
    {
        self.read(|raw| raw.contains(value))
    }

    /// Returns `true` if `eq(element, value)` holds for some element.
    #[inline]
    pub fn contains_by<U, F>(&self, value: &U, eq: F) -> bool
    where
        F: Fn(&T, &U) -> bool,
    {
        self.read(|raw| raw.contains_by(value, eq))
    }

    /// Deep copy into new, independent storage.
    pub fn duplicate(&self) -> Result<Self, ListError>
    where
        T: Clone,
    {
        self.read(|raw| raw.duplicate()).map(Self::from_raw)
    }

    /// Fixed-size copy of the live elements.
    #[inline]
    pub fn to_array(&self) -> Result<Box<[T]>, ListError>
    where
        T: Clone,
    {
        self.read(|raw| raw.to_array())
    }
}

// =============================================================================
// Locking mutation
// =============================================================================

impl<T> ListStorage<T> {
    /// Replaces the element at `index`.
    #[inline]
    pub fn set_at(&self, index: usize, value: T) -> Result<(), ListError> {
        self.write(|raw| raw.set_at(index, value))
    }

    /// Resizes in place. See [`RawList::set_count`].
    #[inline]
    pub fn set_count(&self, count: usize) -> Result<(), ListError>
    where
        T: Default,
    {
        self.write(|raw| raw.set_count(count))
    }

    /// Appends `value`.
    #[inline]
    pub fn add(&self, value: T) -> Result<(), ListError> {
        self.write(|raw| raw.add(value))
    }

    /// Appends converted copies of `values`.
    #[inline]
    pub fn add_elements<U>(&self, values: &[U]) -> Result<(), ListError>
    where
        U: Clone + Into<T>,
    {
        self.write(|raw| raw.add_elements(values))
    }

    /// Appends everything `iter` yields, holding the lock throughout.
    ///
    /// # Panics
    ///
    /// Panics if `iter` makes a locking call on this storage.
    #[inline]
    pub fn add_all_iter<I>(&self, iter: I) -> Result<(), ListError>
    where
        I: IntoIterator<Item = T>,
    {
        self.write(|raw| raw.add_all_iter(iter))
    }

    /// Appends `value` unless an equal element is present.
    #[inline]
    pub fn add_if_not_exist(&self, value: T) -> Result<bool, ListError>
    where
        T: PartialEq,
    {
        self.write(|raw| raw.add_if_not_exist(value))
    }

    /// Appends `value` unless `eq(element, &value)` holds for some element.
    #[inline]
    pub fn add_if_not_exist_by<F>(&self, value: T, eq: F) -> Result<bool, ListError>
    where
        F: Fn(&T, &T) -> bool,
    {
        self.write(|raw| raw.add_if_not_exist_by(value, eq))
    }

    /// Inserts `value` at `index`. Past the end appends.
    #[inline]
    pub fn insert(&self, index: usize, value: T) -> Result<(), ListError> {
        self.write(|raw| raw.insert(index, value))
    }

    /// Inserts converted copies of `values` at `index`.
    #[inline]
    pub fn insert_elements<U>(&self, index: usize, values: &[U]) -> Result<(), ListError>
    where
        U: Clone + Into<T>,
    {
        self.write(|raw| raw.insert_elements(index, values))
    }

    /// Appends converted copies of every element of `other`.
    ///
    /// Both storages are locked for the call. An empty `other` succeeds
    /// without touching `self`.
    pub fn add_all<U>(&self, other: &ListStorage<U>) -> Result<(), ListError>
    where
        U: Clone + Into<T>,
    {
        self.with_pair(other, |dst, src| dst.add_all(src))
    }

    /// Inserts converted copies of every element of `other` at `index`.
    pub fn insert_all<U>(&self, index: usize, other: &ListStorage<U>) -> Result<(), ListError>
    where
        U: Clone + Into<T>,
    {
        self.with_pair(other, |dst, src| dst.insert_all(index, src))
    }

    /// Removes and returns the element at `index`.
    #[inline]
    pub fn remove_at(&self, index: usize) -> Option<T> {
        self.write(|raw| raw.remove_at(index))
    }

    /// Removes up to `count` elements from `index`. Returns how many.
    #[inline]
    pub fn remove_range(&self, index: usize, count: usize) -> usize {
        self.write(|raw| raw.remove_range(index, count))
    }

    /// Removes and returns the first element equal to `value`.
    #[inline]
    pub fn remove_value<U>(&self, value: &U) -> Option<T>
    where
        T: PartialEq<U>,
    {
        self.write(|raw| raw.remove_value(value))
    }

    /// Removes and returns the first element matching `eq`.
    #[inline]
    pub fn remove_value_by<U, F>(&self, value: &U, eq: F) -> Option<T>
    where
        F: Fn(&T, &U) -> bool,
    {
        self.write(|raw| raw.remove_value_by(value, eq))
    }

    /// Removes every element equal to `value`. See
    /// [`RawList::remove_elements_by_value`].
    #[inline]
    pub fn remove_elements_by_value<U>(&self, value: &U, out: Option<&mut Vec<T>>) -> usize
    where
        T: PartialEq<U>,
    {
        self.write(|raw| raw.remove_elements_by_value(value, out))
    }

    /// Removes every element matching `eq`.
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
        self.write(|raw| raw.remove_elements_by_value_by(value, out, eq))
    }

    /// Drops every element. Returns how many there were.
    #[inline]
    pub fn remove_all(&self) -> usize {
        self.write(|raw| raw.remove_all())
    }

    /// Removes and returns the first element.
    #[inline]
    pub fn pop_front(&self) -> Option<T> {
        self.write(|raw| raw.pop_front())
    }

    /// Removes up to `count` elements from the front.
    #[inline]
    pub fn pop_front_elements(&self, count: usize) -> usize {
        self.write(|raw| raw.pop_front_elements(count))
    }

    /// Removes and returns the last element.
    #[inline]
    pub fn pop_back(&self) -> Option<T> {
        self.write(|raw| raw.pop_back())
    }

    /// Removes up to `count` elements from the back.
    #[inline]
    pub fn pop_back_elements(&self, count: usize) -> usize {
        self.write(|raw| raw.pop_back_elements(count))
    }

    /// Sorts in place.
    #[inline]
    pub fn sort(&self, ascending: bool)
    where
        T: Ord,
    {
        self.write(|raw| raw.sort(ascending));
    }

    /// Sorts in place by `compare`.
    #[inline]
    pub fn sort_by<F>(&self, ascending: bool, compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.write(|raw| raw.sort_by(ascending, compare));
    }

    /// Locks `self` and `other` in address order and runs `f` on both.
    fn with_pair<U, R>(
        &self,
        other: &ListStorage<U>,
        f: impl FnOnce(&mut RawList<T>, &RawList<U>) -> Result<R, ListError>,
    ) -> Result<R, ListError>
    where
        R: Default,
    {
        if self.addr() == other.addr() {
            tracing::trace!(addr = self.addr(), "rejected copying a list into itself");
            return Err(ListError::SelfReference);
        }

        let (dst_lock, src_lock) = if self.addr() < other.addr() {
            let dst = self.inner.lock();
            (dst, other.inner.lock())
        } else {
            let src = other.inner.lock();
            (self.inner.lock(), src)
        };

        let src = src_lock.borrow();
        if src.is_empty() {
            return Ok(R::default());
        }
        let mut dst = dst_lock.borrow_mut();
        f(&mut dst, &src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn storage_of(values: &[i32]) -> ListStorage<i32> {
        ListStorage::from_slice(values).unwrap()
    }

    fn contents<T: Clone>(storage: &ListStorage<T>) -> Vec<T> {
        storage.to_array().unwrap().into_vec()
    }

    #[test]
    fn locking_forms_match_raw_behavior() {
        let storage = ListStorage::new();
        storage.add(1).unwrap();
        storage.add(2).unwrap();
        storage.add(3).unwrap();
        assert_eq!(storage.len(), 3);

        assert_eq!(storage.remove_at(1), Some(2));
        storage.insert(1, 9).unwrap();
        assert_eq!(contents(&storage), vec![1, 9, 3]);
        assert_eq!(storage.pop_back(), Some(3));
        assert_eq!(contents(&storage), vec![1, 9]);
    }

    #[test]
    fn guard_composes_operations() {
        let storage = storage_of(&[3, 1, 2]);
        {
            let mut guard = storage.lock();
            let mut raw = guard.borrow_mut();
            raw.sort(true);
            raw.add(4).unwrap();
            drop(raw);
            thread::scope(|s| {
                s.spawn(|| assert!(storage.try_lock().is_none()));
            });
        }
        assert!(!storage.is_locked());
        assert_eq!(contents(&storage), vec![1, 2, 3, 4]);
    }

    #[test]
    fn locking_forms_reenter_from_guard_holder() {
        let storage = storage_of(&[1, 2]);
        let mut guard = storage.lock();
        assert!(storage.is_locked_by_current_thread());

        assert_eq!(storage.len(), 2);
        assert_eq!(storage.get_at(1), Some(2));
        storage.add(3).unwrap();
        assert!(storage.try_lock().is_some());

        guard.borrow_mut().pop_front();
        assert_eq!(contents(&storage), vec![2, 3]);
        drop(guard);
        assert!(!storage.is_locked());
    }

    #[test]
    fn guard_excludes_other_threads() {
        let storage = Arc::new(storage_of(&[1]));
        let guard = storage.lock();
        assert_eq!(storage.len(), 1);

        let remote = storage.clone();
        let handle = thread::spawn(move || remote.add(2).unwrap());
        // The spawned writer waits for the guard to drop.
        assert_eq!(storage.len(), 1);
        drop(guard);
        handle.join().unwrap();
        assert_eq!(contents(&storage), vec![1, 2]);
    }

    #[test]
    fn get_mut_needs_no_lock() {
        let mut storage = storage_of(&[1]);
        storage.get_mut().add(2).unwrap();
        assert_eq!(storage.into_inner().as_slice(), &[1, 2]);
    }

    #[test]
    fn add_all_rejects_self() {
        let storage = storage_of(&[1, 2]);
        assert_eq!(storage.add_all(&storage), Err(ListError::SelfReference));
        assert_eq!(storage.insert_all(0, &storage), Err(ListError::SelfReference));
        assert_eq!(storage.len(), 2);
    }

    #[test]
    fn add_all_empty_source_is_success() {
        let storage = storage_of(&[1]);
        let empty: ListStorage<i32> = ListStorage::new();
        assert_eq!(storage.add_all(&empty), Ok(()));
        assert_eq!(storage.insert_all(0, &empty), Ok(()));
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.capacity(), 1);
    }

    #[test]
    fn add_all_converts_between_types() {
        let wide: ListStorage<i64> = ListStorage::from_slice(&[10i64]).unwrap();
        let narrow = storage_of(&[1, 2]);
        wide.add_all(&narrow).unwrap();
        wide.insert_all(0, &narrow).unwrap();
        assert_eq!(contents(&wide), vec![1i64, 2, 10, 1, 2]);
    }

    #[test]
    fn duplicate_is_independent() {
        let storage = storage_of(&[1, 2, 3]);
        let copy = storage.duplicate().unwrap();
        copy.set_at(0, 7).unwrap();
        assert_eq!(storage.value_at(0), 1);
        assert_eq!(copy.value_at(0), 7);
    }

    #[test]
    fn debug_reports_locked_storage() {
        let storage = storage_of(&[1]);
        assert_eq!(format!("{storage:?}"), "ListStorage { elements: [1] }");
        let _guard = storage.lock();
        thread::scope(|s| {
            s.spawn(|| {
                assert_eq!(format!("{storage:?}"), "ListStorage { elements: \"<locked>\" }");
            });
        });
        assert_eq!(format!("{storage:?}"), "ListStorage { elements: [1] }");
    }

    #[test]
    fn opposite_direction_copies_do_not_deadlock() {
        let a = Arc::new(storage_of(&[1]));
        let b = Arc::new(storage_of(&[2]));

        let handles: Vec<_> = [(a.clone(), b.clone()), (b.clone(), a.clone())]
            .into_iter()
            .map(|(dst, src)| {
                thread::spawn(move || {
                    for _ in 0..200 {
                        dst.add_all(&src).unwrap();
                        dst.set_count(1).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert!(a.len() >= 1);
        assert!(b.len() >= 1);
    }
}
