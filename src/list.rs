//! Shared traversal list: one forward-linked sequence threading every bucket
//! run, anchored by a before-first slot (`first`) and a past-last sentinel
//! node (`last`).
//!
//! The list owns the node arena. It knows nothing about buckets; keeping runs
//! contiguous is the caller's job, done by choosing where to link.

use crate::error::Error;
use crate::node::{Node, NodeKey};
use slotmap::SlotMap;

pub(crate) struct TraversalList<K, V> {
    nodes: SlotMap<NodeKey, Node<K, V>>,
    /// Successor of the before-first sentinel.
    first: NodeKey,
    /// Past-last sentinel. Its key changes when the tail element is erased.
    last: NodeKey,
}

impl<K, V> TraversalList<K, V> {
    pub(crate) fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let last = nodes.insert(Node::sentinel());
        Self {
            nodes,
            first: last,
            last,
        }
    }

    /// Number of real elements; the sentinel is not counted.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.first == self.last
    }

    #[inline]
    pub(crate) fn first(&self) -> NodeKey {
        self.first
    }

    #[inline]
    pub(crate) fn last(&self) -> NodeKey {
        self.last
    }

    /// Node at `k`. Panics on a stale key; internal callers only hold live ones.
    #[inline]
    pub(crate) fn node(&self, k: NodeKey) -> &Node<K, V> {
        &self.nodes[k]
    }

    #[inline]
    pub(crate) fn get(&self, k: NodeKey) -> Option<&Node<K, V>> {
        self.nodes.get(k)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, k: NodeKey) -> Option<&mut Node<K, V>> {
        self.nodes.get_mut(k)
    }

    /// Successor of `k`, or `None` for the sentinel and for stale keys.
    #[inline]
    pub(crate) fn next(&self, k: NodeKey) -> Option<NodeKey> {
        self.nodes.get(k).and_then(|n| n.next)
    }

    /// Makes room for `additional` more nodes, so the next `additional` links
    /// cannot fail to allocate.
    pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<(), Error> {
        self.nodes.try_reserve(additional)?;
        Ok(())
    }

    /// Links a new node directly after the before-first sentinel.
    pub(crate) fn push_front(&mut self, mut node: Node<K, V>) -> NodeKey {
        node.next = Some(self.first);
        let k = self.nodes.insert(node);
        self.first = k;
        k
    }

    /// Links a new node directly after the element `at`.
    pub(crate) fn insert_after(&mut self, at: NodeKey, mut node: Node<K, V>) -> NodeKey {
        debug_assert!(at != self.last, "cannot link past the sentinel");
        node.next = self.nodes[at].next;
        let k = self.nodes.insert(node);
        self.nodes[at].next = Some(k);
        k
    }

    /// Empties the list logically without freeing any node, returning the old
    /// first element. The caller walks the detached chain (it still ends at
    /// `last`) and relinks every node.
    pub(crate) fn detach_all(&mut self) -> NodeKey {
        core::mem::replace(&mut self.first, self.last)
    }

    /// Relinks an already allocated node as the new first element.
    pub(crate) fn relink_front(&mut self, k: NodeKey) {
        self.nodes[k].next = Some(self.first);
        self.first = k;
    }

    /// Relinks an already allocated node directly after `at`.
    pub(crate) fn relink_after(&mut self, at: NodeKey, k: NodeKey) {
        let after = self.nodes[at].next;
        self.nodes[k].next = after;
        self.nodes[at].next = Some(k);
    }

    /// Removes the element stored at `g` without knowing its predecessor.
    ///
    /// `g` takes over its successor's payload, hash and link, and the
    /// successor's slot is freed. When the successor is the sentinel, `g`
    /// becomes the sentinel instead and the old sentinel slot is freed. Either
    /// way the key that disappears from the arena is the successor's, while
    /// `g` stays live and now stands for different data.
    ///
    /// Returns the payload that was stored at `g`, or `None` if `g` is the
    /// sentinel or stale.
    pub(crate) fn unlink_by_swap(&mut self, g: NodeKey) -> Option<(K, V)> {
        debug_assert!(self.nodes[self.last].is_sentinel());
        let s = self.nodes.get(g)?.next?;
        let replacement = if s == self.last {
            #[cfg(feature = "tracing")]
            tracing::debug!(old = ?s, new = ?g, "past-last sentinel migrated");
            self.nodes.remove(s);
            self.last = g;
            Node::sentinel()
        } else {
            self.nodes.remove(s)?
        };
        let old = core::mem::replace(&mut self.nodes[g], replacement);
        old.entry
    }

    /// Unlinks and frees the first element.
    pub(crate) fn pop_front(&mut self) -> Option<(K, V)> {
        if self.is_empty() {
            return None;
        }
        let node = self.nodes.remove(self.first)?;
        self.first = node.next?;
        node.entry
    }

    /// Frees every element, keeping the current sentinel.
    pub(crate) fn clear(&mut self) {
        let last = self.last;
        self.nodes.retain(|k, _| k == last);
        self.first = last;
    }

    /// All arena slots, sentinel included, in arena order.
    pub(crate) fn slots_mut(&mut self) -> slotmap::basic::IterMut<'_, NodeKey, Node<K, V>> {
        self.nodes.iter_mut()
    }
}
