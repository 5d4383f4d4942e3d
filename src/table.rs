//! ChainTable: the structural layer of `ChainMap`.
//!
//! Owns the hasher, the traversal list and the bucket index and implements
//! insert, lookup, erase, rehash and copy on top of them. It performs no
//! reentrancy checks; `ChainMap` wraps every entry point that can call user
//! code.
//!
//! Layout invariants maintained by every mutation:
//! - each element's `bucket` equals `constrain(hash, bucket_count)`;
//! - the elements of one bucket form a contiguous run of the list and the
//!   bucket's head slot references the first of them;
//! - keys are pairwise distinct;
//! - `bucket_count == 0` implies the list is empty.

use crate::buckets::BucketIndex;
use crate::capacity;
use crate::error::Error;
use crate::list::TraversalList;
use crate::node::{Node, NodeKey};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};

pub(crate) const DEFAULT_MAX_LOAD_FACTOR: f32 = 1.0;

pub(crate) struct ChainTable<K, V, S> {
    pub(crate) hasher: S,
    pub(crate) list: TraversalList<K, V>,
    pub(crate) buckets: BucketIndex,
    pub(crate) max_load_factor: f32,
}

/// Outcome of scanning a bucket run for a key.
enum Probe {
    Occupied(NodeKey),
    /// `run_tail` is the last element of the run, `None` for an empty bucket.
    Vacant { run_tail: Option<NodeKey> },
}

impl<K, V, S> ChainTable<K, V, S> {
    pub(crate) fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            list: TraversalList::new(),
            buckets: BucketIndex::empty(),
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn set_max_load_factor(&mut self, factor: f32) -> Result<(), Error> {
        let factor = factor.abs();
        if !factor.is_finite() || factor == 0.0 {
            return Err(Error::InvalidLoadFactor);
        }
        self.max_load_factor = factor;
        Ok(())
    }

    /// Number of elements in bucket `bucket`; 0 for out-of-range buckets.
    pub(crate) fn run_len(&self, bucket: usize) -> usize {
        if bucket >= self.buckets.len() {
            return 0;
        }
        let last = self.list.last();
        let mut n = 0;
        let mut cur = self.buckets.head(bucket);
        while let Some(k) = cur.filter(|&k| k != last) {
            let node = self.list.node(k);
            if node.bucket != bucket {
                break;
            }
            n += 1;
            cur = node.next;
        }
        n
    }

    /// Last element of bucket `bucket`'s run, or `None` if the bucket is empty.
    fn run_tail(&self, bucket: usize) -> Option<NodeKey> {
        let last = self.list.last();
        let mut tail = self.buckets.head(bucket)?;
        while let Some(next) = self.list.node(tail).next {
            if next == last || self.list.node(next).bucket != bucket {
                break;
            }
            tail = next;
        }
        Some(tail)
    }

    /// Links an unlinked node into its bucket: as the new list head when the
    /// bucket is empty, otherwise right after the run's last element so the
    /// run stays contiguous and its head is unchanged.
    fn link(&mut self, node: Node<K, V>, run_tail: Option<NodeKey>) -> NodeKey {
        let bucket = node.bucket;
        match run_tail {
            None => {
                let k = self.list.push_front(node);
                self.buckets.set_head(bucket, k);
                k
            }
            Some(tail) => self.list.insert_after(tail, node),
        }
    }

    /// Ensures one more element fits under the maximum load factor.
    fn grow_for_insert(&mut self) -> Result<(), Error> {
        let len = self.len();
        if capacity::fits(self.buckets.len(), self.max_load_factor, len + 1) {
            return Ok(());
        }
        self.rebuild(capacity::grown(len, self.max_load_factor))
    }

    /// Grows the index so `additional` more elements fit without implicit
    /// growth. Never shrinks.
    pub(crate) fn reserve(&mut self, additional: usize) -> Result<(), Error> {
        let len = self.len().saturating_add(additional);
        let want = capacity::min_buckets(len, self.max_load_factor);
        if want > self.buckets.len() {
            self.rebuild(want)?;
        }
        Ok(())
    }

    pub(crate) fn rehash(&mut self, buckets: usize) -> Result<(), Error> {
        if !capacity::fits(buckets, self.max_load_factor, self.len()) {
            return Err(Error::CapacityExceeded {
                buckets,
                len: self.len(),
            });
        }
        self.rebuild(buckets)
    }

    /// Redistributes every element over `buckets` buckets. Nodes are relinked,
    /// never reallocated; the stored full hash is reused so `K: Hash` does not
    /// run. The new index is allocated first, so a failure leaves the table
    /// untouched.
    fn rebuild(&mut self, buckets: usize) -> Result<(), Error> {
        let mut index = BucketIndex::try_with_buckets(buckets)?;

        #[cfg(feature = "tracing")]
        tracing::trace!(from = self.buckets.len(), to = buckets, len = self.len(), "rehash");

        let last = self.list.last();
        let mut cur = self.list.detach_all();
        while cur != last {
            let Some(node) = self.list.get_mut(cur) else {
                break;
            };
            let next = node.next;
            let bucket = capacity::constrain(node.hash, buckets);
            node.bucket = bucket;
            match index.head(bucket) {
                None => {
                    self.list.relink_front(cur);
                    index.set_head(bucket, cur);
                }
                Some(head) => self.list.relink_after(head, cur),
            }
            match next {
                Some(n) => cur = n,
                None => break,
            }
        }
        self.buckets = index;
        Ok(())
    }

    /// Frees every element and the bucket index.
    pub(crate) fn clear(&mut self) {
        self.list.clear();
        self.buckets = BucketIndex::empty();
    }

    pub(crate) fn entry_at(&self, at: NodeKey) -> Option<(&K, &V)> {
        self.list
            .get(at)
            .and_then(|n| n.entry.as_ref())
            .map(|(k, v)| (k, v))
    }

    pub(crate) fn entry_at_mut(&mut self, at: NodeKey) -> Option<(&K, &mut V)> {
        self.list
            .get_mut(at)
            .and_then(|n| n.entry.as_mut())
            .map(|(k, v)| (&*k, v))
    }

    /// Copies every element into a fresh table with the same bucket count,
    /// one element at a time. Bucket runs keep their internal order but the
    /// runs themselves come out in reverse. Every allocation happens before
    /// the first element is cloned; on failure the partial copy is dropped.
    pub(crate) fn try_clone(&self) -> Result<Self, Error>
    where
        K: Clone,
        V: Clone,
        S: Clone,
    {
        let mut out = Self {
            hasher: self.hasher.clone(),
            list: TraversalList::new(),
            buckets: BucketIndex::try_with_buckets(self.buckets.len())?,
            max_load_factor: self.max_load_factor,
        };
        out.list.try_reserve(self.len())?;
        let last = self.list.last();
        let mut cur = self.list.first();
        while cur != last {
            let node = self.list.node(cur);
            if let Some(copy) = node.clone_detached() {
                let run_tail = out.run_tail(copy.bucket);
                out.link(copy, run_tail);
            }
            match node.next {
                Some(n) => cur = n,
                None => break,
            }
        }
        Ok(out)
    }
}

impl<K, V, S> ChainTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    #[inline]
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Bucket `q` maps to under the current bucket count.
    pub(crate) fn bucket_of<Q>(&self, q: &Q) -> Option<usize>
    where
        Q: ?Sized + Hash,
    {
        match self.buckets.len() {
            0 => None,
            n => Some(capacity::constrain(self.make_hash(q), n)),
        }
    }

    /// Finds the element whose key equals `q`, returning its bucket too.
    /// The scan stops at the first node of another bucket or at the sentinel.
    fn locate<Q>(&self, q: &Q) -> Option<(usize, NodeKey)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let n = self.buckets.len();
        if n == 0 {
            return None;
        }
        let hash = self.make_hash(q);
        let bucket = capacity::constrain(hash, n);
        let last = self.list.last();
        let mut cur = self.buckets.head(bucket)?;
        while cur != last {
            let node = self.list.node(cur);
            if node.bucket != bucket {
                break;
            }
            if node.hash == hash && node.key().is_some_and(|k| k.borrow() == q) {
                return Some((bucket, cur));
            }
            cur = node.next?;
        }
        None
    }

    pub(crate) fn find<Q>(&self, q: &Q) -> Option<NodeKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.locate(q).map(|(_, at)| at)
    }

    fn probe(&self, bucket: usize, hash: u64, key: &K) -> Probe {
        let Some(mut cur) = self.buckets.head(bucket) else {
            return Probe::Vacant { run_tail: None };
        };
        let last = self.list.last();
        loop {
            let node = self.list.node(cur);
            if node.hash == hash && node.key() == Some(key) {
                return Probe::Occupied(cur);
            }
            match node.next {
                Some(next) if next != last && self.list.node(next).bucket == bucket => cur = next,
                _ => return Probe::Vacant { run_tail: Some(cur) },
            }
        }
    }

    /// Inserts `key` unless present. `make` runs only when the key is new.
    /// Returns the element's position and whether it was inserted.
    ///
    /// Room for the node and growth are both secured before the key scan, so
    /// an allocation failure leaves the table untouched and a duplicate insert
    /// can still rehash.
    pub(crate) fn insert_with<F>(&mut self, key: K, make: F) -> Result<(NodeKey, bool), Error>
    where
        F: FnOnce() -> V,
    {
        let hash = self.make_hash(&key);
        self.list.try_reserve(1)?;
        self.grow_for_insert()?;
        let bucket = capacity::constrain(hash, self.buckets.len());
        match self.probe(bucket, hash, &key) {
            Probe::Occupied(at) => Ok((at, false)),
            Probe::Vacant { run_tail } => {
                let node = Node::new(key, make(), hash, bucket);
                Ok((self.link(node, run_tail), true))
            }
        }
    }

    /// Erases the element matching `q` by overwriting it with its successor.
    ///
    /// Head fix-ups happen before the swap: the erased node's bucket loses its
    /// head (or passes it to the successor), and a bucket whose run started at
    /// the successor is redirected to the erased node's slot, which is about
    /// to hold the successor's payload.
    pub(crate) fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (bucket, g) = self.locate(q)?;
        let s = self.list.next(g)?;
        let last = self.list.last();

        if self.buckets.is_head(bucket, g) {
            if s != last && self.list.node(s).bucket == bucket {
                self.buckets.set_head(bucket, s);
            } else {
                self.buckets.clear_head(bucket);
            }
        }
        if s != last {
            let successor_bucket = self.list.node(s).bucket;
            if self.buckets.is_head(successor_bucket, s) {
                self.buckets.set_head(successor_bucket, g);
            }
        }
        self.list.unlink_by_swap(g)
    }

    /// Walks the whole structure and panics on any broken layout invariant.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let n = self.buckets.len();
        let last = self.list.last();
        assert!(self.list.node(last).is_sentinel(), "past-last must be payload-less");
        if n == 0 {
            assert!(self.list.is_empty(), "elements stored without buckets");
            return;
        }
        let mut seen = vec![false; n];
        let mut runs = 0;
        let mut count = 0;
        let mut prev_bucket = None;
        let mut cur = self.list.first();
        while cur != last {
            let node = self.list.node(cur);
            let key = node.key().expect("only the sentinel lacks a payload");
            assert_eq!(node.bucket, capacity::constrain(node.hash, n), "stale bucket");
            assert_eq!(node.hash, self.make_hash(key), "stale hash");
            if prev_bucket != Some(node.bucket) {
                assert!(!seen[node.bucket], "bucket {} is not contiguous", node.bucket);
                assert!(self.buckets.is_head(node.bucket, cur), "wrong head for bucket {}", node.bucket);
                seen[node.bucket] = true;
                runs += 1;
            }
            assert_eq!(self.find(key), Some(cur), "key not uniquely reachable");
            prev_bucket = Some(node.bucket);
            count += 1;
            cur = node.next.expect("element without successor");
        }
        assert_eq!(count, self.len());
        assert_eq!(runs, self.buckets.occupied(), "dangling bucket heads");
    }
}
