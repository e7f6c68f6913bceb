//! Error type for list operations.
//!
//! Every failure is local: it is returned to the immediate caller and the
//! list is left in its last fully consistent state. Lookups that can miss
//! return `Option` instead of an error.

/// Failure of a list mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ListError {
    /// The allocator could not provide the requested buffer.
    ///
    /// Existing elements are untouched; the list keeps its previous buffer.
    #[error("memory allocation failed")]
    AllocationFailed,

    /// The requested element count does not fit in the address space.
    #[error("capacity overflow")]
    CapacityOverflow,

    /// An index-addressed operation was given an index past the live elements.
    #[error("index {index} out of bounds for count {count}")]
    OutOfBounds {
        /// The index that was requested.
        index: usize,
        /// The element count at the time of the call.
        count: usize,
    },

    /// A list was asked to insert or append its own storage into itself.
    #[error("source and destination are the same list")]
    SelfReference,
}
