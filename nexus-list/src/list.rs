//! Shared, reference-counted list handle.
//!
//! A [`List`] is a nullable reference to one [`ListStorage`]. Cloning a
//! handle is O(1) and shares the storage:
//!
//! ```text
//! List ──┐
//!        ├──► Arc<ListStorage<T>> ──► ReentrantMutex<RefCell<RawList<T>>>
//! List ──┘
//! ```
//!
//! Mutations go to the shared storage in place, so every clone sees them.
//! Use [`duplicate`](List::duplicate) for an independent copy.
//!
//! # Null Handles
//!
//! A null handle owns no storage. It reports zero elements, and every read
//! or removal on it returns the neutral result (`None`, `0`, `false`). The
//! calls that can grow a list (`add*`, `insert*`, `set_count`) take
//! `&mut self`, allocate storage on first use, and publish it into the
//! handle.
//!
//! The storage header itself is allocated with `Arc::new`, which aborts on
//! out-of-memory like any `Arc`. Only buffer growth reports
//! [`ListError::AllocationFailed`].
//!
//! ```
//! use nexus_list::List;
//!
//! let mut list: List<u32> = List::new();
//! assert!(list.is_null());
//!
//! list.add(1).unwrap();
//! let alias = list.clone();
//! alias.set_at(0, 5).unwrap();
//!
//! assert_eq!(list.get_at(0), Some(5));
//! assert!(list.ptr_eq(&alias));
//!
//! let copy = list.duplicate().unwrap();
//! copy.set_at(0, 9).unwrap();
//! assert_eq!(list.get_at(0), Some(5));
//! ```

use core::cmp::Ordering;
use core::fmt;
use std::sync::Arc;

use crate::{
    ElementSource, ListError, ListGuard, ListIterator, ListLocker, ListPosition, ListStorage,
    RawList,
};

/// Nullable shared handle to a [`ListStorage`].
pub struct List<T> {
    storage: Option<Arc<ListStorage<T>>>,
}

// =============================================================================
// Construction
// =============================================================================

impl<T> List<T> {
    /// The null handle.
    #[inline]
    pub const fn new() -> Self {
        Self { storage: None }
    }

    /// List holding `count` default elements.
    pub fn with_count(count: usize) -> Result<Self, ListError>
    where
        T: Default,
    {
        ListStorage::with_count(count).map(Self::from_storage)
    }

    /// List holding `count` default elements with room for `capacity`.
    ///
    /// Zero for both yields the null handle.
    pub fn with_count_and_capacity(count: usize, capacity: usize) -> Result<Self, ListError>
    where
        T: Default,
    {
        if count == 0 && capacity == 0 {
            return Ok(Self::new());
        }
        ListStorage::with_count_and_capacity(count, capacity).map(Self::from_storage)
    }

    /// List holding converted copies of `values`.
    pub fn from_slice<U>(values: &[U]) -> Result<Self, ListError>
    where
        U: Clone + Into<T>,
    {
        ListStorage::from_slice(values).map(Self::from_storage)
    }

    /// List holding the single element `value`.
    pub fn from_element(value: T) -> Result<Self, ListError> {
        let mut raw = RawList::new();
        raw.add(value)?;
        Ok(Self::from_storage(ListStorage::from_raw(raw)))
    }

    /// Independent list holding converted copies of the elements of `other`.
    ///
    /// A null `other` yields the null handle.
    pub fn copy_of<U>(other: &List<U>) -> Result<Self, ListError>
    where
        U: Clone + Into<T>,
    {
        match other.storage() {
            Some(storage) => Self::from_slice(storage.lock().borrow().as_slice()),
            None => Ok(Self::new()),
        }
    }

    /// Handle owning `storage`.
    #[inline]
    pub fn from_storage(storage: ListStorage<T>) -> Self {
        Self {
            storage: Some(Arc::new(storage)),
        }
    }

    #[inline]
    pub(crate) fn from_arc(storage: Option<Arc<ListStorage<T>>>) -> Self {
        Self { storage }
    }

    #[inline]
    pub(crate) fn into_arc(self) -> Option<Arc<ListStorage<T>>> {
        self.storage
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for List<T> {
    /// Shares the storage. See [`duplicate`](List::duplicate) for a deep copy.
    #[inline]
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
        }
    }
}

impl<T> From<RawList<T>> for List<T> {
    fn from(raw: RawList<T>) -> Self {
        Self::from_storage(ListStorage::from_raw(raw))
    }
}

impl<T> From<ListStorage<T>> for List<T> {
    fn from(storage: ListStorage<T>) -> Self {
        Self::from_storage(storage)
    }
}

impl<T: fmt::Debug> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.storage() {
            Some(storage) => fmt::Debug::fmt(&storage.lock(), f),
            None => f.write_str("null"),
        }
    }
}

// =============================================================================
// Handle
// =============================================================================

impl<T> List<T> {
    /// Returns `true` if the handle owns no storage.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.storage.is_none()
    }

    /// Returns `true` if both handles refer to the same storage, or both are null.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.storage, &other.storage) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// The shared storage, if any.
    #[inline]
    pub fn storage(&self) -> Option<&ListStorage<T>> {
        self.storage.as_deref()
    }

    /// Locks the storage, if any, returning the no-lock capability.
    #[inline]
    pub fn lock(&self) -> Option<ListGuard<'_, T>> {
        self.storage().map(ListStorage::lock)
    }

    /// Locked slice view. Empty for a null handle.
    #[inline]
    pub fn locker(&self) -> ListLocker<'_, T> {
        ListLocker::from_list(self)
    }

    /// Storage for a growing call, allocating it on a null handle.
    fn storage_or_create(&mut self) -> &ListStorage<T> {
        self.storage
            .get_or_insert_with(|| Arc::new(ListStorage::new()))
    }
}

// =============================================================================
// Queries
// =============================================================================

impl<T> List<T> {
    /// Number of elements. Zero for a null handle.
    #[inline]
    pub fn len(&self) -> usize {
        self.storage().map_or(0, ListStorage::len)
    }

    /// Number of allocated slots. Zero for a null handle.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage().map_or(0, ListStorage::capacity)
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
        self.storage()?.get_at(index)
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
        self.storage()?.index_of(value, start)
    }

    /// Index of the first element at or after `start` matching `eq`.
    #[inline]
    pub fn index_of_by<U, F>(&self, value: &U, start: usize, eq: F) -> Option<usize>
    where
        F: Fn(&T, &U) -> bool,
    {
        self.storage()?.index_of_by(value, start, eq)
    }

    /// Index of the last element at or before `start` equal to `value`.
    #[inline]
    pub fn last_index_of<U>(&self, value: &U, start: Option<usize>) -> Option<usize>
    where
        T: PartialEq<U>,
    {
        self.storage()?.last_index_of(value, start)
    }

    /// Index of the last element at or before `start` matching `eq`.
    #[inline]
    pub fn last_index_of_by<U, F>(&self, value: &U, start: Option<usize>, eq: F) -> Option<usize>
    where
        F: Fn(&T, &U) -> bool,
    {
        self.storage()?.last_index_of_by(value, start, eq)
    }

    /// Returns `true` if some element equals `value`.
    #[inline]
    pub fn contains<U>(&self, value: &U) -> bool
    where
        T: PartialEq<U>,
    {
        self.storage().is_some_and(|storage| storage.contains(value))
    }

    /// Returns `true` if some element matches `eq`.
    #[inline]
    pub fn contains_by<U, F>(&self, value: &U, eq: F) -> bool
    where
        F: Fn(&T, &U) -> bool,
    {
        self.storage()
            .is_some_and(|storage| storage.contains_by(value, eq))
    }

    /// Independent deep copy.
    ///
    /// Duplicating a null or empty list yields the null handle.
    pub fn duplicate(&self) -> Result<Self, ListError>
    where
        T: Clone,
    {
        let Some(storage) = self.storage() else {
            return Ok(Self::new());
        };
        let guard = storage.lock();
        let raw = guard.borrow();
        if raw.is_empty() {
            return Ok(Self::new());
        }
        raw.duplicate().map(Self::from)
    }

    /// Fixed-size copy of the elements. Empty for a null handle.
    pub fn to_array(&self) -> Result<Box<[T]>, ListError>
    where
        T: Clone,
    {
        match self.storage() {
            Some(storage) => storage.to_array(),
            None => Ok(Box::default()),
        }
    }

    /// Cursor bounded by the current count. See [`ListIterator`].
    #[inline]
    pub fn to_iterator(&self) -> ListIterator<T> {
        ListIterator::new(self.storage.clone())
    }

    /// Cursor over the elements present now. See [`ListPosition`].
    #[inline]
    pub fn iter(&self) -> ListPosition<T> {
        ListPosition::new(self.storage.clone())
    }
}

// =============================================================================
// Growing mutation
// =============================================================================

impl<T> List<T> {
    /// Resizes in place.
    ///
    /// Resizing a null handle to zero succeeds without allocating.
    pub fn set_count(&mut self, count: usize) -> Result<(), ListError>
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
    pub fn add(&mut self, value: T) -> Result<(), ListError> {
        self.storage_or_create().add(value)
    }

    /// Appends converted copies of `values`.
    #[inline]
    pub fn add_elements<U>(&mut self, values: &[U]) -> Result<(), ListError>
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
    /// A null or empty `other` succeeds without allocating. Appending a list
    /// to a handle sharing its storage fails with [`ListError::SelfReference`].
    pub fn add_all<U>(&mut self, other: &List<U>) -> Result<(), ListError>
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
    pub fn add_all_iter<I>(&mut self, iter: I) -> Result<(), ListError>
    where
        I: IntoIterator<Item = T>,
    {
        let mut iter = iter.into_iter().peekable();
        if iter.peek().is_none() {
            return Ok(());
        }
        self.storage_or_create().add_all_iter(iter)
    }

    /// Appends everything `source` produces.
    ///
    /// The storage lock is taken per element, so `source` may read from this
    /// same list. A cursor from [`to_iterator`](Self::to_iterator) stops at
    /// the count it captured, so appending a list to itself this way
    /// doubles it.
    pub fn add_all_from<S>(&mut self, mut source: S) -> Result<(), ListError>
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
    pub fn add_if_not_exist(&mut self, value: T) -> Result<bool, ListError>
    where
        T: PartialEq,
    {
        self.storage_or_create().add_if_not_exist(value)
    }

    /// Appends `value` unless some element matches `eq`.
    #[inline]
    pub fn add_if_not_exist_by<F>(&mut self, value: T, eq: F) -> Result<bool, ListError>
    where
        F: Fn(&T, &T) -> bool,
    {
        self.storage_or_create().add_if_not_exist_by(value, eq)
    }

    /// Inserts `value` at `index`. Past the end appends.
    #[inline]
    pub fn insert(&mut self, index: usize, value: T) -> Result<(), ListError> {
        self.storage_or_create().insert(index, value)
    }

    /// Inserts converted copies of `values` at `index`.
    #[inline]
    pub fn insert_elements<U>(&mut self, index: usize, values: &[U]) -> Result<(), ListError>
    where
        U: Clone + Into<T>,
    {
        if values.is_empty() {
            return Ok(());
        }
        self.storage_or_create().insert_elements(index, values)
    }

    /// Inserts converted copies of every element of `other` at `index`.
    ///
    /// Same null, empty and self rules as [`add_all`](List::add_all).
    pub fn insert_all<U>(&mut self, index: usize, other: &List<U>) -> Result<(), ListError>
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

impl<T> List<T> {
    /// Replaces the element at `index`.
    pub fn set_at(&self, index: usize, value: T) -> Result<(), ListError> {
        match self.storage() {
            Some(storage) => storage.set_at(index, value),
            None => Err(ListError::OutOfBounds { index, count: 0 }),
        }
    }

    /// Removes and returns the element at `index`.
    #[inline]
    pub fn remove_at(&self, index: usize) -> Option<T> {
        self.storage()?.remove_at(index)
    }

    /// Removes up to `count` elements starting at `index`. Returns how many.
    #[inline]
    pub fn remove_range(&self, index: usize, count: usize) -> usize {
        self.storage()
            .map_or(0, |storage| storage.remove_range(index, count))
    }

    /// Removes and returns the first element equal to `value`.
    #[inline]
    pub fn remove_value<U>(&self, value: &U) -> Option<T>
    where
        T: PartialEq<U>,
    {
        self.storage()?.remove_value(value)
    }

    /// Removes and returns the first element matching `eq`.
    #[inline]
    pub fn remove_value_by<U, F>(&self, value: &U, eq: F) -> Option<T>
    where
        F: Fn(&T, &U) -> bool,
    {
        self.storage()?.remove_value_by(value, eq)
    }

    /// Removes every element equal to `value`, pushing them to `out` when given.
    #[inline]
    pub fn remove_elements_by_value<U>(&self, value: &U, out: Option<&mut Vec<T>>) -> usize
    where
        T: PartialEq<U>,
    {
        self.storage()
            .map_or(0, |storage| storage.remove_elements_by_value(value, out))
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
        self.storage().map_or(0, |storage| {
            storage.remove_elements_by_value_by(value, out, eq)
        })
    }

    /// Drops every element, keeping the storage. Returns how many there were.
    #[inline]
    pub fn remove_all(&self) -> usize {
        self.storage().map_or(0, ListStorage::remove_all)
    }

    /// Removes and returns the first element.
    #[inline]
    pub fn pop_front(&self) -> Option<T> {
        self.storage()?.pop_front()
    }

    /// Removes up to `count` elements from the front. Returns how many.
    #[inline]
    pub fn pop_front_elements(&self, count: usize) -> usize {
        self.storage()
            .map_or(0, |storage| storage.pop_front_elements(count))
    }

    /// Removes and returns the last element.
    #[inline]
    pub fn pop_back(&self) -> Option<T> {
        self.storage()?.pop_back()
    }

    /// Removes up to `count` elements from the back. Returns how many.
    #[inline]
    pub fn pop_back_elements(&self, count: usize) -> usize {
        self.storage()
            .map_or(0, |storage| storage.pop_back_elements(count))
    }

    /// Sorts in place.
    #[inline]
    pub fn sort(&self, ascending: bool)
    where
        T: Ord,
    {
        if let Some(storage) = self.storage() {
            storage.sort(ascending);
        }
    }

    /// Sorts in place by `compare`.
    #[inline]
    pub fn sort_by<F>(&self, ascending: bool, compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        if let Some(storage) = self.storage() {
            storage.sort_by(ascending, compare);
        }
    }

    /// Drops this handle's reference, leaving it null.
    ///
    /// Other handles keep the storage alive.
    #[inline]
    pub fn set_null(&mut self) {
        self.storage = None;
    }
}

impl<T: Clone> IntoIterator for &List<T> {
    type Item = T;
    type IntoIter = ListPosition<T>;

    #[inline]
    fn into_iter(self) -> ListPosition<T> {
        self.iter()
    }
}
