//! Bucket index: one head slot per bucket, pointing into the traversal list.

use crate::error::Error;
use crate::node::NodeKey;

/// Non-owning heads of every bucket run. Slot `i` is `None` when bucket `i`
/// holds no element.
#[derive(Debug, Default, Clone)]
pub(crate) struct BucketIndex {
    heads: Vec<Option<NodeKey>>,
}

impl BucketIndex {
    /// An index with no buckets; the state of a map that never inserted.
    pub(crate) const fn empty() -> Self {
        Self { heads: Vec::new() }
    }

    /// Allocates `buckets` empty slots, reporting allocation failure instead
    /// of aborting.
    pub(crate) fn try_with_buckets(buckets: usize) -> Result<Self, Error> {
        let mut heads = Vec::new();
        heads.try_reserve_exact(buckets)?;
        heads.resize(buckets, None);
        Ok(Self { heads })
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.heads.len()
    }

    #[inline]
    pub(crate) fn head(&self, bucket: usize) -> Option<NodeKey> {
        self.heads[bucket]
    }

    #[inline]
    pub(crate) fn set_head(&mut self, bucket: usize, node: NodeKey) {
        self.heads[bucket] = Some(node);
    }

    #[inline]
    pub(crate) fn clear_head(&mut self, bucket: usize) {
        self.heads[bucket] = None;
    }

    /// True if `node` currently starts bucket `bucket`'s run.
    #[inline]
    pub(crate) fn is_head(&self, bucket: usize, node: NodeKey) -> bool {
        self.heads.get(bucket).copied().flatten() == Some(node)
    }

    #[cfg(test)]
    pub(crate) fn occupied(&self) -> usize {
        self.heads.iter().filter(|h| h.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn new_index_is_all_empty() {
        let idx = BucketIndex::try_with_buckets(7).unwrap();
        assert_eq!(idx.len(), 7);
        assert!((0..7).all(|i| idx.head(i).is_none()));
        assert_eq!(idx.occupied(), 0);
        assert_eq!(BucketIndex::empty().len(), 0);
    }

    #[test]
    fn heads_set_and_clear() {
        let mut arena: SlotMap<NodeKey, ()> = SlotMap::with_key();
        let a = arena.insert(());
        let mut idx = BucketIndex::try_with_buckets(3).unwrap();
        idx.set_head(1, a);
        assert!(idx.is_head(1, a));
        assert!(!idx.is_head(0, a));
        assert!(!idx.is_head(usize::MAX, a));
        assert_eq!(idx.occupied(), 1);
        idx.clear_head(1);
        assert_eq!(idx.head(1), None);
    }

    #[test]
    fn oversized_index_reports_out_of_memory() {
        match BucketIndex::try_with_buckets(usize::MAX) {
            Err(Error::OutOfMemory(_)) => {}
            other => panic!("unexpected result: {:?}", other.map(|i| i.len())),
        }
    }
}
