//! Contiguous element buffer with explicit count and capacity.
//!
//! [`RawList`] is the buffer underneath every list handle. It owns `count`
//! constructed elements at the front of a region of `capacity` slots:
//!
//! ```text
//! ┌──────────────────────────────┬──────────────────────┐
//! │ [0, count)  constructed      │ [count, capacity)    │
//! │                              │ uninitialized        │
//! └──────────────────────────────┴──────────────────────┘
//! ```
//!
//! Every method here is the "no-lock" form of a list operation. A
//! `RawList` is reached either through a borrow from a held
//! [`ListGuard`](crate::ListGuard) or through exclusive access to its owner, so nothing in this module
//! synchronizes.
//!
//! # Capacity Policy
//!
//! ```text
//! grow   (capacity < n):                         max(capacity * 3/2 + 1, n, CAPACITY_MIN)
//! shrink (capacity > MIN and n < capacity / 2):  max(n * 3/2 + 1, CAPACITY_MIN)
//! ```
//!
//! Growth is geometric so appends are amortized O(1). Shrinking happens only
//! when the count goes down, which bounds peak memory after large pops while
//! leaving explicit pre-sizing alone.
//!
//! # Allocation Failure
//!
//! Buffer allocation never aborts. A failed grow returns
//! [`ListError::AllocationFailed`] and leaves the elements and the old buffer
//! exactly as they were. A failed shrink is ignored.
//!
//! # Example
//!
//! ```
//! use nexus_list::RawList;
//!
//! let mut raw: RawList<u32> = RawList::new();
//! raw.add(1).unwrap();
//! raw.add(2).unwrap();
//! raw.add(3).unwrap();
//!
//! assert_eq!(raw.remove_at(1), Some(2));
//! raw.insert(1, 9).unwrap();
//! assert_eq!(raw.as_slice(), &[1, 9, 3]);
//! assert_eq!(raw.pop_back(), Some(3));
//! ```

use core::cmp::Ordering;
use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ops::{Index, IndexMut};
use core::ptr::{self, NonNull};
use core::slice;
use std::alloc::{self, Layout};

use crate::ListError;

/// Smallest capacity the buffer grows to or shrinks to.
///
/// Growing never shrinks: a `set_count` that raises the count but leaves it
/// below half of a large pre-sized capacity keeps the buffer. Only calls
/// that lower the count shrink.
pub const CAPACITY_MIN: usize = 5;

/// Growable contiguous buffer of `T`.
///
/// See the [module documentation](self) for the layout and capacity policy.
pub struct RawList<T> {
    ptr: NonNull<T>,
    count: usize,
    capacity: usize,
    _marker: PhantomData<T>,
}

// Safety: RawList owns its elements like Vec<T>.
unsafe impl<T: Send> Send for RawList<T> {}
unsafe impl<T: Sync> Sync for RawList<T> {}

#[inline]
const fn is_zst<T>() -> bool {
    mem::size_of::<T>() == 0
}

#[inline]
fn array_layout<T>(n: usize) -> Result<Layout, ListError> {
    Layout::array::<T>(n).map_err(|_| ListError::CapacityOverflow)
}

// =============================================================================
// Construction
// =============================================================================

impl<T> RawList<T> {
    /// Creates an empty buffer without allocating.
    #[inline]
    pub const fn new() -> Self {
        Self {
            ptr: NonNull::dangling(),
            count: 0,
            capacity: 0,
            _marker: PhantomData,
        }
    }

    /// Creates a buffer holding `count` default elements, with capacity `count`.
    pub fn with_count(count: usize) -> Result<Self, ListError>
    where
        T: Default,
    {
        Self::with_count_and_capacity(count, count)
    }

    /// Creates a buffer holding `count` default elements with room for
    /// `capacity`.
    ///
    /// A `capacity` smaller than `count` is raised to `count`.
    pub fn with_count_and_capacity(count: usize, capacity: usize) -> Result<Self, ListError>
    where
        T: Default,
    {
        let mut list = Self::new();
        let capacity = capacity.max(count);
        if capacity > 0 {
            list.reallocate(capacity).inspect_err(|err| {
                tracing::warn!(capacity, error = %err, "list buffer allocation failed");
            })?;
        }
        list.fill_default(count);
        Ok(list)
    }

    /// Creates a buffer by converting each element of `values`.
    ///
    /// The capacity is exactly `values.len()`.
    pub fn from_slice<U>(values: &[U]) -> Result<Self, ListError>
    where
        U: Clone + Into<T>,
    {
        let mut list = Self::new();
        if !values.is_empty() {
            list.reallocate(values.len()).inspect_err(|err| {
                tracing::warn!(capacity = values.len(), error = %err, "list buffer allocation failed");
            })?;
            list.write_cloned(0, values);
            list.count = values.len();
        }
        Ok(list)
    }

    /// Creates a buffer from everything `iter` yields.
    pub fn from_iter_fallible<I>(iter: I) -> Result<Self, ListError>
    where
        I: IntoIterator<Item = T>,
    {
        let mut list = Self::new();
        list.add_all_iter(iter)?;
        Ok(list)
    }

    /// Deep copy of the live elements into a new buffer.
    pub fn duplicate(&self) -> Result<Self, ListError>
    where
        T: Clone,
    {
        Self::from_slice(self.as_slice())
    }

    /// Fixed-size copy of the live elements.
    pub fn to_array(&self) -> Result<Box<[T]>, ListError>
    where
        T: Clone,
    {
        let mut out = Vec::new();
        out.try_reserve_exact(self.count)
            .map_err(|_| ListError::AllocationFailed)?;
        out.extend_from_slice(self.as_slice());
        Ok(out.into_boxed_slice())
    }
}

impl<T> Default for RawList<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Queries
// =============================================================================

impl<T> RawList<T> {
    /// Number of live elements.
    #[inline]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Number of allocated slots.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` if there are no live elements.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns `true` if there is at least one live element.
    #[inline]
    pub const fn is_not_empty(&self) -> bool {
        self.count != 0
    }

    /// Pointer to the first element.
    ///
    /// Dangling (but aligned and non-null) while nothing is allocated.
    #[inline]
    pub const fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// The live elements.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // Safety: [0, count) is constructed and ptr is aligned and non-null.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.count) }
    }

    /// The live elements, mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // Safety: as for as_slice, and &mut self is exclusive.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.count) }
    }

    /// Iterator over references to the live elements.
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Iterator over mutable references to the live elements.
    #[inline]
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    /// Reference to the element at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    /// Mutable reference to the element at `index`.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    /// First element.
    #[inline]
    pub fn first(&self) -> Option<&T> {
        self.as_slice().first()
    }

    /// Last element.
    #[inline]
    pub fn last(&self) -> Option<&T> {
        self.as_slice().last()
    }

    /// Copy of the element at `index`.
    #[inline]
    pub fn get_at(&self, index: usize) -> Option<T>
    where
        T: Clone,
    {
        self.get(index).cloned()
    }

    /// Copy of the element at `index`, or `T::default()` when out of range.
    #[inline]
    pub fn value_at(&self, index: usize) -> T
    where
        T: Clone + Default,
    {
        self.get_at(index).unwrap_or_default()
    }

    /// Copy of the element at `index`, or `default` when out of range.
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
        self.index_of_by(value, start, PartialEq::eq)
    }

    /// Index of the first element at or after `start` for which
    /// `eq(element, value)` holds.
    pub fn index_of_by<U, F>(&self, value: &U, start: usize, eq: F) -> Option<usize>
    where
        F: Fn(&T, &U) -> bool,
    {
        self.as_slice()
            .get(start..)?
            .iter()
            .position(|e| eq(e, value))
            .map(|i| i + start)
    }

    /// Index of the last element at or before `start` equal to `value`.
    ///
    /// `None` or an out-of-range `start` scans from the last element.
    #[inline]
    pub fn last_index_of<U>(&self, value: &U, start: Option<usize>) -> Option<usize>
    where
        T: PartialEq<U>,
    {
        self.last_index_of_by(value, start, PartialEq::eq)
    }

    /// Index of the last element at or before `start` for which
    /// `eq(element, value)` holds.
    pub fn last_index_of_by<U, F>(&self, value: &U, start: Option<usize>, eq: F) -> Option<usize>
    where
        F: Fn(&T, &U) -> bool,
    {
        let end = match start {
            Some(start) if start < self.count => start + 1,
            _ => self.count,
        };
        self.as_slice()[..end].iter().rposition(|e| eq(e, value))
    }

    /// Returns `true` if some element equals `value`.
    #[inline]
    pub fn contains<U>(&self, value: &U) -> bool
    where
        T: PartialEq<U>,
    {
        self.index_of(value, 0).is_some()
    }

    /// Returns `true` if `eq(element, value)` holds for some element.
    #[inline]
    pub fn contains_by<U, F>(&self, value: &U, eq: F) -> bool
    where
        F: Fn(&T, &U) -> bool,
    {
        self.index_of_by(value, 0, eq).is_some()
    }
}

// =============================================================================
// Mutation
// =============================================================================

impl<T> RawList<T> {
    /// Replaces the element at `index`.
    pub fn set_at(&mut self, index: usize, value: T) -> Result<(), ListError> {
        let count = self.count;
        match self.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(ListError::OutOfBounds { index, count }),
        }
    }

    /// Resizes in place.
    ///
    /// Growing default-constructs `[old, count)`; shrinking drops
    /// `[count, old)`. On allocation failure the elements are untouched.
    pub fn set_count(&mut self, count: usize) -> Result<(), ListError>
    where
        T: Default,
    {
        if count <= self.count {
            self.truncate(count);
            return Ok(());
        }
        self.reserve_for(count)?;
        self.fill_default(count);
        Ok(())
    }

    /// Appends `value`.
    pub fn add(&mut self, value: T) -> Result<(), ListError> {
        let required = self.count.checked_add(1).ok_or(ListError::CapacityOverflow)?;
        self.reserve_for(required)?;
        // Safety: reserve_for guarantees a free slot at `count`.
        unsafe { self.ptr.as_ptr().add(self.count).write(value) };
        self.count = required;
        Ok(())
    }

    /// Appends a converted copy of every element of `values`.
    #[inline]
    pub fn add_elements<U>(&mut self, values: &[U]) -> Result<(), ListError>
    where
        U: Clone + Into<T>,
    {
        self.insert_elements(self.count, values)
    }

    /// Appends a converted copy of every element of `other`.
    #[inline]
    pub fn add_all<U>(&mut self, other: &RawList<U>) -> Result<(), ListError>
    where
        U: Clone + Into<T>,
    {
        self.insert_elements(self.count, other.as_slice())
    }

    /// Appends everything `iter` yields.
    ///
    /// Stops at the first allocation failure; elements appended before it
    /// stay in the list.
    pub fn add_all_iter<I>(&mut self, iter: I) -> Result<(), ListError>
    where
        I: IntoIterator<Item = T>,
    {
        for value in iter {
            self.add(value)?;
        }
        Ok(())
    }

    /// Appends `value` unless an equal element is present.
    ///
    /// Returns `Ok(true)` if the value was added.
    #[inline]
    pub fn add_if_not_exist(&mut self, value: T) -> Result<bool, ListError>
    where
        T: PartialEq,
    {
        self.add_if_not_exist_by(value, PartialEq::eq)
    }

    /// Appends `value` unless `eq(element, &value)` holds for some element.
    pub fn add_if_not_exist_by<F>(&mut self, value: T, eq: F) -> Result<bool, ListError>
    where
        F: Fn(&T, &T) -> bool,
    {
        if self.contains_by(&value, eq) {
            return Ok(false);
        }
        self.add(value).map(|()| true)
    }

    /// Inserts `value` at `index`, shifting the tail right.
    ///
    /// An `index` at or past the end appends.
    pub fn insert(&mut self, index: usize, value: T) -> Result<(), ListError> {
        let required = self.count.checked_add(1).ok_or(ListError::CapacityOverflow)?;
        self.reserve_for(required)?;
        let index = index.min(self.count);
        // Safety: capacity > count, so the shifted tail and `index` are in bounds.
        unsafe {
            let slot = self.ptr.as_ptr().add(index);
            ptr::copy(slot, slot.add(1), self.count - index);
            slot.write(value);
        }
        self.count = required;
        Ok(())
    }

    /// Inserts converted copies of `values` at `index`.
    ///
    /// An `index` at or past the end appends. Inserting nothing succeeds.
    pub fn insert_elements<U>(&mut self, index: usize, values: &[U]) -> Result<(), ListError>
    where
        U: Clone + Into<T>,
    {
        if values.is_empty() {
            return Ok(());
        }
        let required = self
            .count
            .checked_add(values.len())
            .ok_or(ListError::CapacityOverflow)?;
        self.reserve_for(required)?;

        let old = self.count;
        let index = index.min(old);
        // Leak rather than double-drop the tail if a clone panics.
        self.count = index;
        // Safety: capacity >= old + n, so both the moved tail and the gap fit.
        unsafe {
            let base = self.ptr.as_ptr();
            ptr::copy(base.add(index), base.add(index + values.len()), old - index);
        }
        self.write_cloned(index, values);
        self.count = required;
        Ok(())
    }

    /// Inserts converted copies of every element of `other` at `index`.
    #[inline]
    pub fn insert_all<U>(&mut self, index: usize, other: &RawList<U>) -> Result<(), ListError>
    where
        U: Clone + Into<T>,
    {
        self.insert_elements(index, other.as_slice())
    }

    /// Removes and returns the element at `index`.
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        if index >= self.count {
            return None;
        }
        // Safety: index < count; the tail move stays inside [0, count).
        let value = unsafe {
            let slot = self.ptr.as_ptr().add(index);
            let value = slot.read();
            ptr::copy(slot.add(1), slot, self.count - index - 1);
            value
        };
        self.count -= 1;
        self.shrink_after_removal();
        Some(value)
    }

    /// Removes up to `count` elements starting at `index`.
    ///
    /// `count` is clamped to the remaining tail. Returns how many were removed.
    pub fn remove_range(&mut self, index: usize, count: usize) -> usize {
        let total = self.count;
        if index >= total || count == 0 {
            return 0;
        }
        let count = count.min(total - index);
        // Leak the tail rather than double-drop it if a destructor panics.
        self.count = index;
        // Safety: [index, index + count) is constructed and the tail follows it.
        unsafe {
            let start = self.ptr.as_ptr().add(index);
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(start, count));
            ptr::copy(start.add(count), start, total - index - count);
        }
        self.count = total - count;
        self.shrink_after_removal();
        count
    }

    /// Removes and returns the first element equal to `value`.
    #[inline]
    pub fn remove_value<U>(&mut self, value: &U) -> Option<T>
    where
        T: PartialEq<U>,
    {
        self.remove_value_by(value, PartialEq::eq)
    }

    /// Removes and returns the first element for which `eq(element, value)` holds.
    pub fn remove_value_by<U, F>(&mut self, value: &U, eq: F) -> Option<T>
    where
        F: Fn(&T, &U) -> bool,
    {
        let index = self.index_of_by(value, 0, eq)?;
        self.remove_at(index)
    }

    /// Removes every element equal to `value`.
    ///
    /// Removed elements are pushed to `out` when given. Returns how many were
    /// removed.
    #[inline]
    pub fn remove_elements_by_value<U>(&mut self, value: &U, out: Option<&mut Vec<T>>) -> usize
    where
        T: PartialEq<U>,
    {
        self.remove_elements_by_value_by(value, out, PartialEq::eq)
    }

    /// Removes every element for which `eq(element, value)` holds.
    pub fn remove_elements_by_value_by<U, F>(
        &mut self,
        value: &U,
        mut out: Option<&mut Vec<T>>,
        eq: F,
    ) -> usize
    where
        F: Fn(&T, &U) -> bool,
    {
        let total = self.count;
        let base = self.ptr.as_ptr();
        let mut kept = 0;

        // Leak everything rather than double-drop if `eq` or `out` panics.
        self.count = 0;
        for i in 0..total {
            // Safety: slot i is constructed and has not been moved yet; kept <= i.
            unsafe {
                let slot = base.add(i);
                if eq(&*slot, value) {
                    let removed = slot.read();
                    if let Some(out) = out.as_mut() {
                        out.push(removed);
                    }
                } else {
                    if kept != i {
                        ptr::copy_nonoverlapping(slot, base.add(kept), 1);
                    }
                    kept += 1;
                }
            }
        }
        self.count = kept;

        let removed = total - kept;
        if removed > 0 {
            self.shrink_after_removal();
        }
        removed
    }

    /// Drops every element. Returns how many there were.
    pub fn remove_all(&mut self) -> usize {
        let count = self.count;
        self.truncate(0);
        count
    }

    /// Removes and returns the first element.
    #[inline]
    pub fn pop_front(&mut self) -> Option<T> {
        self.remove_at(0)
    }

    /// Removes up to `count` elements from the front. Returns how many.
    #[inline]
    pub fn pop_front_elements(&mut self, count: usize) -> usize {
        self.remove_range(0, count)
    }

    /// Removes and returns the last element.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }
        self.count -= 1;
        // Safety: the slot at the old last index is constructed and now outside the live range.
        let value = unsafe { self.ptr.as_ptr().add(self.count).read() };
        self.shrink_after_removal();
        Some(value)
    }

    /// Removes up to `count` elements from the back. Returns how many.
    pub fn pop_back_elements(&mut self, count: usize) -> usize {
        let count = count.min(self.count);
        if count > 0 {
            self.truncate(self.count - count);
        }
        count
    }

    /// Sorts in place with an unstable comparison sort.
    #[inline]
    pub fn sort(&mut self, ascending: bool)
    where
        T: Ord,
    {
        self.sort_by(ascending, Ord::cmp);
    }

    /// Sorts in place by `compare`, which must be a total order.
    ///
    /// Descending order reverses `compare`.
    pub fn sort_by<F>(&mut self, ascending: bool, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        if ascending {
            self.as_mut_slice().sort_unstable_by(compare);
        } else {
            self.as_mut_slice().sort_unstable_by(|a, b| compare(b, a));
        }
    }
}

// =============================================================================
// Buffer management
// =============================================================================

impl<T> RawList<T> {
    /// Drops `[count, len)` and applies the shrink policy.
    fn truncate(&mut self, count: usize) {
        let old = self.count;
        if count >= old {
            return;
        }
        self.count = count;
        // Safety: [count, old) was constructed and is now outside the live range.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.ptr.as_ptr().add(count),
                old - count,
            ));
        }
        self.shrink_after_removal();
    }

    /// Default-constructs elements until the count reaches `count`.
    ///
    /// Capacity must already be sufficient.
    fn fill_default(&mut self, count: usize)
    where
        T: Default,
    {
        debug_assert!(count <= self.capacity);
        while self.count < count {
            // Safety: count < capacity.
            unsafe { self.ptr.as_ptr().add(self.count).write(T::default()) };
            self.count += 1;
        }
    }

    /// Writes converted clones of `values` into the uninitialized slots
    /// starting at `at`. Does not touch the count.
    fn write_cloned<U>(&mut self, at: usize, values: &[U])
    where
        U: Clone + Into<T>,
    {
        debug_assert!(at + values.len() <= self.capacity);
        let base = self.ptr.as_ptr();
        for (i, value) in values.iter().enumerate() {
            // Safety: the caller reserved [at, at + len) as uninitialized slots.
            unsafe { base.add(at + i).write(value.clone().into()) };
        }
    }

    /// Ensures room for `required` elements, growing geometrically.
    fn reserve_for(&mut self, required: usize) -> Result<(), ListError> {
        if required <= self.capacity {
            return Ok(());
        }
        let grown = (self.capacity.saturating_mul(3) / 2)
            .saturating_add(1)
            .max(required)
            .max(CAPACITY_MIN);
        self.reallocate(grown).inspect_err(|err| {
            tracing::warn!(
                count = self.count,
                capacity = self.capacity,
                requested = grown,
                error = %err,
                "list buffer growth failed"
            );
        })
    }

    /// Gives back memory once usage falls under half the capacity.
    fn shrink_after_removal(&mut self) {
        if self.capacity > CAPACITY_MIN && self.count < self.capacity / 2 {
            let target = (self.count.saturating_mul(3) / 2)
                .saturating_add(1)
                .max(CAPACITY_MIN);
            if let Err(err) = self.reallocate(target) {
                tracing::debug!(
                    capacity = self.capacity,
                    target,
                    error = %err,
                    "list buffer shrink declined"
                );
            }
        }
    }

    /// Moves the buffer to exactly `capacity` slots.
    ///
    /// On failure the old buffer is left in place.
    fn reallocate(&mut self, capacity: usize) -> Result<(), ListError> {
        debug_assert!(capacity >= self.count);
        if is_zst::<T>() {
            self.capacity = capacity;
            return Ok(());
        }

        let new_layout = array_layout::<T>(capacity)?;
        let raw = if self.capacity == 0 {
            // Safety: capacity >= CAPACITY_MIN or a non-empty pre-size, so the layout is non-zero.
            unsafe { alloc::alloc(new_layout) }
        } else {
            let old_layout = array_layout::<T>(self.capacity)?;
            // Safety: ptr was allocated with old_layout by this allocator.
            unsafe { alloc::realloc(self.ptr.as_ptr().cast(), old_layout, new_layout.size()) }
        };

        match NonNull::new(raw.cast::<T>()) {
            Some(ptr) => {
                self.ptr = ptr;
                self.capacity = capacity;
                Ok(())
            }
            None => Err(ListError::AllocationFailed),
        }
    }
}

impl<T> Drop for RawList<T> {
    fn drop(&mut self) {
        // Safety: [0, count) is constructed.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.count));
        }
        if !is_zst::<T>() && self.capacity > 0 {
            if let Ok(layout) = array_layout::<T>(self.capacity) {
                // Safety: ptr was allocated with this layout.
                unsafe { alloc::dealloc(self.ptr.as_ptr().cast(), layout) };
            }
        }
    }
}

impl<T> Index<usize> for RawList<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T> IndexMut<usize> for RawList<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.as_mut_slice()[index]
    }
}

impl<T> AsRef<[T]> for RawList<T> {
    #[inline]
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<'a, T> IntoIterator for &'a RawList<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for RawList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}


#[cfg(test)]
mod bench_raw_list {
    use super::*;
    use hdrhistogram::Histogram;

    #[inline]
    fn rdtscp() -> u64 {
        #[cfg(target_arch = "x86_64")]
        unsafe {
            core::arch::x86_64::__rdtscp(&mut 0)
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            use std::sync::OnceLock;
            use std::time::Instant;

            static BASE: OnceLock<Instant> = OnceLock::new();
            BASE.get_or_init(Instant::now).elapsed().as_nanos() as u64
        }
    }

    #[test]
    fn clock_advances() {
        let start = rdtscp();
        let mut spin = 0u64;
        while rdtscp() == start {
            spin = core::hint::black_box(spin + 1);
        }
        assert!(rdtscp() > start);
    }

    fn print_histogram(name: &str, hist: &Histogram<u64>) {
        println!(
            "{:24} p50: {:4} cycles | p99: {:4} cycles | p999: {:5} cycles | min: {:4} | max: {:5}",
            name,
            hist.value_at_quantile(0.50),
            hist.value_at_quantile(0.99),
            hist.value_at_quantile(0.999),
            hist.min(),
            hist.max(),
        );
    }

    const WARMUP: usize = 10_000;
    const ITERATIONS: usize = 100_000;

    #[test]
    #[ignore]
    fn bench_add_pop_back() {
        let mut list: RawList<u64> = RawList::with_count_and_capacity(0, 1024).unwrap();
        let mut hist = Histogram::<u64>::new(3).unwrap();

        for i in 0..WARMUP {
            let _ = list.add(i as u64);
            let _ = list.pop_back();
        }

        for i in 0..ITERATIONS {
            let start = rdtscp();
            let _ = list.add(i as u64);
            let elapsed = rdtscp() - start;
            hist.record(elapsed).unwrap();
            let _ = list.pop_back();
        }

        print_histogram("add", &hist);
    }

    #[test]
    #[ignore]
    fn bench_insert_front() {
        let mut list: RawList<u64> = RawList::with_count(64).unwrap();
        let mut hist = Histogram::<u64>::new(3).unwrap();

        for i in 0..WARMUP {
            let _ = list.insert(0, i as u64);
            let _ = list.pop_front();
        }

        for i in 0..ITERATIONS {
            let start = rdtscp();
            let _ = list.insert(0, i as u64);
            let elapsed = rdtscp() - start;
            hist.record(elapsed).unwrap();
            let _ = list.pop_front();
        }

        print_histogram("insert(0) len=64", &hist);
    }

    #[test]
    #[ignore]
    fn bench_locked_add() {
        let storage: crate::ListStorage<u64> = crate::ListStorage::new();
        let mut hist = Histogram::<u64>::new(3).unwrap();

        for i in 0..WARMUP {
            let _ = storage.add(i as u64);
            let _ = storage.pop_back();
        }

        for i in 0..ITERATIONS {
            let start = rdtscp();
            let _ = storage.add(i as u64);
            let elapsed = rdtscp() - start;
            hist.record(elapsed).unwrap();
            let _ = storage.pop_back();
        }

        print_histogram("locked add", &hist);
    }
}
