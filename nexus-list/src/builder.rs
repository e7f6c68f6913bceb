//! Pre-sized construction of any list type.

use crate::{AtomicList, List, ListError, ListStorage, RawList};

/// Builder for pre-sized lists.
///
/// ```
/// use nexus_list::ListBuilder;
///
/// let list = ListBuilder::default()
///     .count(2)
///     .capacity(32)
///     .build_list::<u64>()
///     .unwrap();
///
/// assert_eq!(list.len(), 2);
/// assert_eq!(list.capacity(), 32);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListBuilder {
    count: usize,
    capacity: usize,
}

impl ListBuilder {
    /// Builder for an empty, unallocated list.
    #[inline]
    pub const fn new() -> Self {
        Self {
            count: 0,
            capacity: 0,
        }
    }

    /// Number of default elements to start with. Default: 0.
    pub const fn count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Slots to reserve up front. Raised to `count` if smaller. Default: 0.
    pub const fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Builds a bare buffer.
    pub fn build_raw<T: Default>(self) -> Result<RawList<T>, ListError> {
        RawList::with_count_and_capacity(self.count, self.capacity)
    }

    /// Builds lockable storage.
    pub fn build_storage<T: Default>(self) -> Result<ListStorage<T>, ListError> {
        self.build_raw().map(ListStorage::from_raw)
    }

    /// Builds a shared handle. Zero count and capacity give the null handle.
    pub fn build_list<T: Default>(self) -> Result<List<T>, ListError> {
        List::with_count_and_capacity(self.count, self.capacity)
    }

    /// Builds an atomic handle. Zero count and capacity give the null handle.
    pub fn build_atomic<T: Default>(self) -> Result<AtomicList<T>, ListError> {
        self.build_list().map(AtomicList::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_empty() {
        let raw: RawList<u8> = ListBuilder::new().build_raw().unwrap();
        assert!(raw.is_empty());
        assert_eq!(raw.capacity(), 0);

        assert!(ListBuilder::new().build_list::<u8>().unwrap().is_null());
        assert!(ListBuilder::new().build_atomic::<u8>().unwrap().is_null());
        assert_eq!(ListBuilder::new(), ListBuilder::default());
    }

    #[test]
    fn capacity_raised_to_count() {
        let storage: ListStorage<u8> = ListBuilder::new()
            .count(10)
            .capacity(4)
            .build_storage()
            .unwrap();
        assert_eq!(storage.len(), 10);
        assert_eq!(storage.capacity(), 10);
    }

    #[test]
    fn presized_atomic_handle() {
        let atomic: AtomicList<String> = ListBuilder::new().capacity(16).build_atomic().unwrap();
        assert!(!atomic.is_null());
        assert_eq!(atomic.capacity(), 16);
        atomic.add("x".to_string()).unwrap();
        assert_eq!(atomic.capacity(), 16);
    }
}
