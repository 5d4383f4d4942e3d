//! Arena-resident list node.

slotmap::new_key_type! {
    /// Generational address of a node in the traversal arena.
    pub struct NodeKey;
}

/// One element of the shared traversal list.
///
/// A node with no entry is the past-last sentinel; it is also the only linked
/// node without a successor.
#[derive(Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) entry: Option<(K, V)>,
    /// Full hash computed once at insertion.
    pub(crate) hash: u64,
    /// `constrain(hash, bucket_count)` for the current bucket count.
    pub(crate) bucket: usize,
    pub(crate) next: Option<NodeKey>,
}

impl<K, V> Node<K, V> {
    /// An unlinked element; the list sets `next` when it links the node.
    pub(crate) fn new(key: K, value: V, hash: u64, bucket: usize) -> Self {
        Self {
            entry: Some((key, value)),
            hash,
            bucket,
            next: None,
        }
    }

    pub(crate) fn sentinel() -> Self {
        Self {
            entry: None,
            hash: 0,
            bucket: usize::MAX,
            next: None,
        }
    }

    #[inline]
    pub(crate) fn is_sentinel(&self) -> bool {
        self.entry.is_none()
    }

    #[inline]
    pub(crate) fn key(&self) -> Option<&K> {
        self.entry.as_ref().map(|(k, _)| k)
    }

    /// Clones the payload into a fresh unlinked node. The caller links it.
    pub(crate) fn clone_detached(&self) -> Option<Self>
    where
        K: Clone,
        V: Clone,
    {
        self.entry.as_ref().map(|(k, v)| Self {
            entry: Some((k.clone(), v.clone())),
            hash: self.hash,
            bucket: self.bucket,
            next: None,
        })
    }
}
