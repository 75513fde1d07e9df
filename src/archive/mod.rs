//! Read-only access to recorded rollouts.
//!
//! The archive is a hierarchical array store addressed by [`ArchiveKey`].
//! Backends implement [`ArchiveStore`]; consumers go through the caching
//! [`ArchiveReader`].

mod array;
mod key;
mod memory;
mod reader;
mod traits;

pub use array::Array;
pub use key::{ArchiveKey, Field, SnapshotId};
pub use memory::InMemoryArchive;
pub use reader::{ArchiveReader, CacheStats, Lookup, PlaceholderShapes, RolloutRecord};
pub use traits::{ArchiveError, ArchiveStore};
