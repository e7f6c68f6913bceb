//! Growable contiguous lists with shared, lockable and atomic handles.
//!
//! One element buffer, several ways to hold it:
//!
//! ```text
//! RawList<T>          - pointer/count/capacity buffer, no synchronization
//!     │
//! ListStorage<T>      - RawList behind a per-storage re-entrant lock
//!     │
//!     ├── List<T>        - nullable Arc<ListStorage>, clones share storage
//!     │
//!     └── AtomicList<T>  - nullable reference swappable across threads
//! ```
//!
//! # Quick Start
//!
//! ```
//! use nexus_list::List;
//!
//! let mut list: List<i32> = List::new();
//! list.add(1).unwrap();
//! list.add(2).unwrap();
//! list.add(3).unwrap();
//!
//! assert_eq!(list.remove_at(1), Some(2));
//! list.insert(1, 9).unwrap();
//! assert_eq!(list.pop_back(), Some(3));
//! assert_eq!(&*list.locker(), &[1, 9]);
//! ```
//!
//! # Shared Semantics
//!
//! A list handle is a reference, not a value. Cloning a [`List`] shares its
//! storage and every clone sees every mutation. [`List::duplicate`] makes an
//! independent deep copy.
//!
//! # Locking
//!
//! Every operation has a locking form (a method on [`ListStorage`],
//! [`List`] or [`AtomicList`] that holds the storage lock for one call)
//! and a no-lock form (a method on [`RawList`], reached through a borrow
//! from a held [`ListGuard`]). Compose several operations atomically through
//! the guard:
//!
//! ```
//! use nexus_list::List;
//!
//! let list: List<u32> = List::from_slice(&[3u32, 1, 2]).unwrap();
//! if let Some(mut guard) = list.lock() {
//!     let mut raw = guard.borrow_mut();
//!     raw.sort(true);
//!     let smallest = raw.pop_front();
//!     assert_eq!(smallest, Some(1));
//! }
//! ```
//!
//! The storage lock is re-entrant. The thread holding a guard may keep
//! making locking calls on the same storage through any handle; they only
//! panic if a borrow taken from the guard, or a [`ListLocker`], is alive
//! across the call. No locking call blocks on a lock its own thread holds.
//!
//! # Capacity
//!
//! | Event | New capacity |
//! |-------|--------------|
//! | grow to `n` past capacity | `max(capacity * 3/2 + 1, n, CAPACITY_MIN)` |
//! | count falls below half of capacity | `max(count * 3/2 + 1, CAPACITY_MIN)` |
//!
//! Buffer allocation failure never aborts. Growing calls return
//! [`ListError::AllocationFailed`] and leave the list as it was. The small
//! shared storage header a handle allocates on first write goes through
//! `Arc::new` and is outside that guarantee.
//!
//! # Logging
//!
//! Allocation failures are reported through `tracing` at `warn`, declined
//! shrinks at `debug`, and atomic-handle publication at `trace`. The crate
//! never installs a subscriber.

#![warn(missing_docs)]

pub mod atomic;
pub mod builder;
pub mod error;
pub mod iter;
pub mod list;
pub mod raw;
pub mod spin;
pub mod storage;
pub mod view;

pub use atomic::AtomicList;
pub use builder::ListBuilder;
pub use error::ListError;
pub use iter::{ElementSource, ListIterator, ListPosition};
pub use list::List;
pub use raw::{CAPACITY_MIN, RawList};
pub use spin::{SPIN_POOL_SIZE, SpinGuard, SpinLock};
pub use storage::ListStorage;
pub use view::{ListElements, ListGuard, ListLocker};
