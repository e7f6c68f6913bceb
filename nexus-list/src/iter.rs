//! Sequential, by-value traversal of a list.
//!
//! Both cursors hold a strong reference to the storage, so the elements
//! cannot be freed mid-traversal. Neither holds the storage lock between
//! steps: each step locks, copies one element out, and unlocks.
//!
//! Both are bounded by the count captured when they were created, so
//! elements appended during traversal are never visited and appending a
//! list to itself through a cursor terminates.
//!
//! | Cursor | After exhaustion | Extra |
//! |--------|------------------|-------|
//! | [`ListIterator`] | releases the storage | none |
//! | [`ListPosition`] | keeps nothing to release | [`remaining`](ListPosition::remaining) |
//!
//! On a list that shrank below the captured count, both stop at the new end.
//!
//! Neither cursor is a consistent snapshot. Callers that need one should
//! iterate a [`duplicate`](crate::List::duplicate) or hold a
//! [`ListLocker`](crate::ListLocker).
//!
//! ```
//! use nexus_list::{ElementSource, List};
//!
//! let mut list: List<i32> = List::new();
//! list.add_elements(&[1, 2, 3]).unwrap();
//!
//! let mut iter = list.to_iterator();
//! let mut value = 0;
//! while iter.next_into(&mut value) {
//!     assert_eq!(iter.index(), Some(value as usize - 1));
//! }
//! assert!(!iter.has_next());
//! ```

use core::iter::FusedIterator;
use std::sync::Arc;

use crate::ListStorage;

/// Source of elements consumed one at a time.
///
/// Traversal is single pass. There is no reset; start again with a new
/// source.
pub trait ElementSource<T> {
    /// Returns `true` if another element is available.
    fn has_next(&self) -> bool;

    /// Copies the next element into `out` and advances.
    ///
    /// Returns `false`, leaving `out` untouched, once the source is exhausted.
    fn next_into(&mut self, out: &mut T) -> bool;

    /// Index of the element most recently produced, `None` before the first.
    fn index(&self) -> Option<usize>;
}

// =============================================================================
// ListIterator
// =============================================================================

/// Cursor bounded by the count captured at creation.
///
/// Created by [`List::to_iterator`](crate::List::to_iterator). Once it
/// reports exhaustion it releases the storage and stays exhausted.
pub struct ListIterator<T> {
    storage: Option<Arc<ListStorage<T>>>,
    index: usize,
    count: usize,
}

impl<T> ListIterator<T> {
    pub(crate) fn new(storage: Option<Arc<ListStorage<T>>>) -> Self {
        let count = storage.as_ref().map_or(0, |storage| storage.len());
        Self {
            storage,
            index: 0,
            count,
        }
    }
}

impl<T: Clone> ElementSource<T> for ListIterator<T> {
    #[inline]
    fn has_next(&self) -> bool {
        self.storage.is_some() && self.index < self.count
    }

    fn next_into(&mut self, out: &mut T) -> bool {
        match self.next() {
            Some(value) => {
                *out = value;
                true
            }
            None => false,
        }
    }

    #[inline]
    fn index(&self) -> Option<usize> {
        self.index.checked_sub(1)
    }
}

impl<T: Clone> Iterator for ListIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let storage = self.storage.as_ref()?;
        let value = if self.index < self.count {
            storage.get_at(self.index)
        } else {
            None
        };
        match value {
            Some(value) => {
                self.index += 1;
                Some(value)
            }
            None => {
                self.storage = None;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.storage {
            Some(_) => (0, Some(self.count - self.index)),
            None => (0, Some(0)),
        }
    }
}

impl<T: Clone> FusedIterator for ListIterator<T> {}

// =============================================================================
// ListPosition
// =============================================================================

/// Cursor over the elements present when it was created.
///
/// Created by [`List::iter`](crate::List::iter) and by iterating `&List<T>`
/// in a `for` loop. The remaining count only decreases.
///
/// ```
/// use nexus_list::List;
///
/// let mut list: List<&str> = List::new();
/// list.add_elements(&["a", "b"]).unwrap();
///
/// let mut seen = Vec::new();
/// for value in &list {
///     seen.push(value);
/// }
/// assert_eq!(seen, ["a", "b"]);
/// ```
pub struct ListPosition<T> {
    storage: Option<Arc<ListStorage<T>>>,
    index: usize,
    remaining: usize,
}

impl<T> ListPosition<T> {
    pub(crate) fn new(storage: Option<Arc<ListStorage<T>>>) -> Self {
        let remaining = storage.as_ref().map_or(0, |storage| storage.len());
        Self {
            storage,
            index: 0,
            remaining,
        }
    }

    /// Elements left before the captured count is reached.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl<T: Clone> ElementSource<T> for ListPosition<T> {
    #[inline]
    fn has_next(&self) -> bool {
        self.remaining > 0
    }

    fn next_into(&mut self, out: &mut T) -> bool {
        match self.next() {
            Some(value) => {
                *out = value;
                true
            }
            None => false,
        }
    }

    #[inline]
    fn index(&self) -> Option<usize> {
        self.index.checked_sub(1)
    }
}

impl<T: Clone> Iterator for ListPosition<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.remaining == 0 {
            return None;
        }
        let value = self.storage.as_ref()?.get_at(self.index);
        match value {
            Some(value) => {
                self.index += 1;
                self.remaining -= 1;
                Some(value)
            }
            None => {
                self.remaining = 0;
                self.storage = None;
                None
            }
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl<T: Clone> FusedIterator for ListPosition<T> {}
