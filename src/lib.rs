//! chain-map: a single-threaded hash map with separate chaining, where every
//! bucket's chain is a contiguous run of one shared forward-linked list.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a classic chained hash map (average O(1) find/insert/erase,
//!   explicit bucket count and load-factor control) without per-node
//!   heap allocations and without backward links.
//! - Layers:
//!   - `TraversalList<K, V>`: a slotmap arena of nodes threaded into one
//!     forward list, anchored by a `first` key and a past-last sentinel node.
//!   - `BucketIndex`: one optional head key per bucket, pointing at the
//!     first node of that bucket's run inside the list.
//!   - `ChainTable<K, V, S>`: the structural algorithms (insert, find,
//!     sentinel-swap erase, rehash, copy) that keep both in step.
//!   - `ChainMap<K, V, S>`: the public API; guards entry points with a
//!     debug-only reentrancy check and pairs fallible `try_xxx` methods with
//!     panicking convenience versions.
//!
//! Erase without predecessors
//! - The list only links forward, so erase cannot unlink a node from its
//!   predecessor. Instead the matched node takes over its successor's
//!   payload and link, and the successor's slot is freed. When the
//!   successor is the past-last sentinel, the matched node becomes the new
//!   sentinel and the old sentinel slot is freed.
//! - Node addresses are generational slotmap keys, so the slot that
//!   disappears leaves behind stale `Cursor`s that resolve to nothing
//!   rather than dangling pointers. The cursor of the erased element keeps
//!   resolving, now to its former successor (or to `end()`).
//!
//! Hashing and rehashing
//! - Each node stores its full `u64` hash and its bucket. Rehash and clone
//!   reuse the stored hash; `K: Hash` runs once per insertion and once per
//!   lookup, never during structural changes.
//! - Growth happens before an insertion whenever
//!   `bucket_count * max_load_factor < len + 1`; the map never shrinks.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` through the reentrancy marker.
//! - Keys are unique; a duplicate insert returns the existing element.
//! - Iteration order is unspecified and a clone may iterate differently
//!   from its source.
//!
//! Errors
//! - `Error::CapacityExceeded` for an explicit rehash that is too small,
//!   `Error::InvalidLoadFactor` for a zero/NaN/infinite load factor and
//!   `Error::OutOfMemory` when a node slot or the bucket index cannot be
//!   allocated. Both are reserved before any structural change, so a failed
//!   operation leaves the map as it was.
//!   Misses and duplicates are reported through return values.
//!
//! Logging
//! - With the `tracing` feature enabled, rehashes emit `trace` events and
//!   sentinel migration emits `debug` events.

mod buckets;
mod capacity;
pub mod chain_map;
mod chain_map_proptest;
mod error;
pub mod iter;
mod list;
mod node;
mod reentrancy;
mod table;

// Public surface
pub use chain_map::{ChainMap, DefaultHashBuilder};
pub use error::Error;
pub use iter::{Cursor, IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
