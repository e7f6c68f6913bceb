//! Scoped views over list contents.
//!
//! | Type | Locks | Access |
//! |------|-------|--------|
//! | [`ListGuard`] | yes | full [`RawList`] API (the no-lock forms) through per-use borrows |
//! | [`ListLocker`] | yes | `[T]` borrowed for the view's lifetime, tolerates a null handle |
//! | [`ListElements`] | no | `&[T]`, caller guarantees no concurrent writers |
//!
//! The pointer and length a [`ListLocker`] or [`ListElements`] exposes are
//! stable for the view's lifetime. Locking views release the lock when
//! dropped, on every exit path.
//!
//! The storage lock is re-entrant. While a [`ListGuard`] is held, the same
//! thread may still make locking calls on the storage, as long as no borrow
//! taken from the guard is alive across the call. A [`ListLocker`] keeps its
//! borrow for its whole lifetime, so a locking call on the same storage
//! from inside its scope panics rather than blocking.

use core::cell::{Ref, RefCell, RefMut};
use core::fmt;
use core::ops::{Deref, DerefMut, Index, IndexMut};
use core::slice;

use parking_lot::ReentrantMutexGuard;

use crate::{List, ListStorage, RawList};

// =============================================================================
// ListGuard
// =============================================================================

/// Held lock on a [`ListStorage`].
///
/// Borrows of the underlying [`RawList`], whose methods are the no-lock form
/// of every list operation, are taken per use. Between borrows the holding
/// thread may make locking calls on the same storage.
///
/// ```
/// use nexus_list::ListStorage;
///
/// let storage: ListStorage<u8> = ListStorage::new();
/// let mut guard = storage.lock();
/// guard.borrow_mut().add(1).unwrap();
/// storage.add(2).unwrap();
/// assert_eq!(guard.borrow().as_slice(), &[1, 2]);
/// ```
pub struct ListGuard<'a, T> {
    inner: ReentrantMutexGuard<'a, RefCell<RawList<T>>>,
}

impl<'a, T> ListGuard<'a, T> {
    #[inline]
    pub(crate) fn new(inner: ReentrantMutexGuard<'a, RefCell<RawList<T>>>) -> Self {
        Self { inner }
    }

    /// Shared access to the buffer.
    ///
    /// # Panics
    ///
    /// Panics if a [`RefMut`] from this storage is alive on this thread.
    #[inline]
    pub fn borrow(&self) -> Ref<'_, RawList<T>> {
        self.inner.borrow()
    }

    /// Exclusive access to the buffer.
    ///
    /// # Panics
    ///
    /// Panics if any other borrow of this storage is alive on this thread.
    #[inline]
    pub fn borrow_mut(&mut self) -> RefMut<'_, RawList<T>> {
        self.inner.borrow_mut()
    }
}

impl<T: fmt::Debug> fmt::Debug for ListGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(raw) => fmt::Debug::fmt(&*raw, f),
            Err(_) => f.write_str("<borrowed>"),
        }
    }
}

// =============================================================================
// ListLocker
// =============================================================================

/// Locked slice view over a storage or a handle.
///
/// A null handle produces an empty view that holds no lock. The buffer is
/// borrowed exclusively until the view drops, so a locking call on the same
/// storage from inside the view's scope panics.
///
/// ```
/// use nexus_list::{List, ListLocker};
///
/// let mut list: List<i32> = List::new();
/// list.add_elements(&[3, 1, 2]).unwrap();
///
/// let mut locker = ListLocker::from_list(&list);
/// locker.sort();
/// assert_eq!(&*locker, &[1, 2, 3]);
/// ```
pub struct ListLocker<'a, T> {
    held: Option<Held<'a, T>>,
}

// Field order matters: the borrow is released before the lock.
struct Held<'a, T> {
    elements: RefMut<'a, RawList<T>>,
    _guard: ListGuard<'a, T>,
}

impl<'a, T> ListLocker<'a, T> {
    /// Locks `storage` for the lifetime of the view.
    ///
    /// # Panics
    ///
    /// Panics if this thread already holds a borrow of the storage.
    pub fn new(storage: &'a ListStorage<T>) -> Self {
        let guard = storage.lock();
        // Safety: `guard` keeps the lock held by this thread and is dropped
        // after `elements`.
        let elements = unsafe { storage.cell() }.borrow_mut();
        Self {
            held: Some(Held {
                elements,
                _guard: guard,
            }),
        }
    }

    /// Locks the storage behind `list`, if any.
    #[inline]
    pub fn from_list(list: &'a List<T>) -> Self {
        match list.storage() {
            Some(storage) => Self::new(storage),
            None => Self { held: None },
        }
    }

    /// The elements.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        match &self.held {
            Some(held) => held.elements.as_slice(),
            None => &[],
        }
    }

    /// The elements, mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match &mut self.held {
            Some(held) => held.elements.as_mut_slice(),
            None => &mut [],
        }
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Returns `true` if the view is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Iterator over references to the elements.
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Iterator over mutable references to the elements.
    #[inline]
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }
}

impl<T> Deref for ListLocker<'_, T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for ListLocker<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> Index<usize> for ListLocker<'_, T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T> IndexMut<usize> for ListLocker<'_, T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.as_mut_slice()[index]
    }
}

impl<'b, T> IntoIterator for &'b ListLocker<'_, T> {
    type Item = &'b T;
    type IntoIter = slice::Iter<'b, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'b, T> IntoIterator for &'b mut ListLocker<'_, T> {
    type Item = &'b mut T;
    type IntoIter = slice::IterMut<'b, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T: fmt::Debug> fmt::Debug for ListLocker<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

// =============================================================================
// ListElements
// =============================================================================

/// Unlocked slice view over a storage or a handle.
///
/// Construction is `unsafe`: the caller must already have ruled out
/// concurrent mutation, for example by holding the storage's only handle or
/// by external synchronization.
pub struct ListElements<'a, T> {
    elements: &'a [T],
}

impl<T> Clone for ListElements<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ListElements<'_, T> {}

impl<'a, T> ListElements<'a, T> {
    /// Captures the elements of `storage` without locking.
    ///
    /// # Safety
    ///
    /// No thread may mutate `storage` while the view is alive.
    #[inline]
    pub unsafe fn new(storage: &'a ListStorage<T>) -> Self {
        // Safety: upheld by the caller.
        let raw = unsafe { storage.raw_unlocked() };
        Self {
            elements: raw.as_slice(),
        }
    }

    /// Captures the elements behind `list` without locking.
    ///
    /// # Safety
    ///
    /// No thread may mutate the storage behind `list`, through any handle,
    /// while the view is alive.
    #[inline]
    pub unsafe fn from_list(list: &'a List<T>) -> Self {
        match list.storage() {
            // Safety: upheld by the caller.
            Some(storage) => unsafe { Self::new(storage) },
            None => Self { elements: &[] },
        }
    }

    /// The elements.
    #[inline]
    pub fn as_slice(&self) -> &'a [T] {
        self.elements
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the view is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterator over references to the elements.
    #[inline]
    pub fn iter(&self) -> slice::Iter<'a, T> {
        self.elements.iter()
    }
}

impl<T> Deref for ListElements<'_, T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.elements
    }
}

impl<'a, T> IntoIterator for ListElements<'a, T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for ListElements<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.elements).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_exposes_no_lock_forms() {
        let storage: ListStorage<u32> = ListStorage::new();
        let mut guard = storage.lock();
        guard.borrow_mut().add(2).unwrap();
        guard.borrow_mut().insert(0, 1).unwrap();
        assert_eq!(guard.borrow().as_slice(), &[1, 2]);
        assert_eq!(format!("{guard:?}"), "[1, 2]");

        let raw = guard.borrow();
        assert_eq!(format!("{guard:?}"), "[1, 2]");
        drop(raw);
        let _raw = guard.borrow_mut();
        assert_eq!(format!("{:?}", storage), "ListStorage { elements: \"<locked>\" }");
    }

    #[test]
    fn locking_calls_proceed_under_guard() {
        let mut list: List<i32> = List::new();
        list.add_elements(&[1, 2]).unwrap();
        let mut alias = list.clone();

        let mut guard = list.lock().unwrap();
        assert_eq!(alias.len(), 2);
        assert_eq!(alias.get_at(0), Some(1));
        alias.add(3).unwrap();
        guard.borrow_mut().add(4).unwrap();
        assert_eq!(guard.borrow().as_slice(), &[1, 2, 3, 4]);

        let nested = alias.lock().unwrap();
        assert_eq!(nested.borrow().len(), 4);
    }

    #[test]
    #[should_panic]
    fn locking_call_under_live_borrow_panics() {
        let storage: ListStorage<i32> = ListStorage::from_slice(&[1]).unwrap();
        let mut guard = storage.lock();
        let _raw = guard.borrow_mut();
        storage.len();
    }

    #[test]
    #[should_panic]
    fn locking_call_inside_locker_panics() {
        let storage: ListStorage<i32> = ListStorage::from_slice(&[1]).unwrap();
        let _locker = ListLocker::new(&storage);
        storage.add(2).unwrap();
    }

    #[test]
    fn locker_holds_lock_until_dropped() {
        let storage: ListStorage<i32> = ListStorage::from_slice(&[1, 2, 3]).unwrap();
        {
            let mut locker = ListLocker::new(&storage);
            assert!(storage.is_locked_by_current_thread());
            std::thread::scope(|s| {
                s.spawn(|| assert!(storage.try_lock().is_none()));
            });
            locker[0] = 10;
            for value in &mut locker {
                *value += 1;
            }
            assert_eq!(locker.len(), 3);
        }
        assert!(!storage.is_locked());
        assert_eq!(storage.get_at(0), Some(11));
    }

    #[test]
    fn locker_over_null_list_is_empty() {
        let list: List<u8> = List::new();
        let mut locker = ListLocker::from_list(&list);
        assert!(locker.is_empty());
        assert!(locker.as_mut_slice().is_empty());
        assert_eq!(locker.iter().count(), 0);
    }

    #[test]
    fn locker_over_list_sees_shared_storage() {
        let mut list: List<i32> = List::new();
        list.add_elements(&[5, 4]).unwrap();
        let alias = list.clone();

        let locker = ListLocker::from_list(&alias);
        assert_eq!(&*locker, &[5, 4]);
        assert_eq!(format!("{locker:?}"), "[5, 4]");
    }

    #[test]
    fn elements_view_without_lock() {
        let storage: ListStorage<&str> = ListStorage::from_slice(&["a", "b"]).unwrap();
        // Safety: no writer exists while the view is alive.
        let elements = unsafe { ListElements::new(&storage) };
        assert_eq!(elements.len(), 2);
        assert_eq!(elements.iter().copied().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn elements_view_over_null_list() {
        let list: List<u8> = List::new();
        // Safety: nothing else references the list.
        let elements = unsafe { ListElements::from_list(&list) };
        assert!(elements.is_empty());
    }
}
