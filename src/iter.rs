//! Cursors and iterators over a `ChainMap`.
//!
//! `Iter`, `Keys`, `Values` and `IntoIter` follow the traversal list, so
//! elements of one bucket come out together. `IterMut` and `ValuesMut` visit
//! the same elements in arena order. No order is promised either way.

use crate::chain_map::ChainMap;
use crate::list::TraversalList;
use crate::node::{Node, NodeKey};
use core::iter::FusedIterator;

/// A position in the traversal list: an element or the past-last sentinel.
///
/// Cursors are plain copies of a node address and do not borrow the map.
/// They compare equal exactly when they name the same node. Erasing an
/// element relabels nodes instead of unlinking them (see [`ChainMap::erase`]),
/// so after an erase a cursor may name a different element, or resolve to
/// nothing at all; a stale cursor never aliases freed memory.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Cursor(NodeKey);

impl Cursor {
    #[inline]
    pub(crate) fn new(k: NodeKey) -> Self {
        Cursor(k)
    }

    #[inline]
    pub(crate) fn node(&self) -> NodeKey {
        self.0
    }

    pub fn key<'a, K, V, S>(&self, map: &'a ChainMap<K, V, S>) -> Option<&'a K> {
        map.entry_at(*self).map(|(k, _)| k)
    }

    pub fn value<'a, K, V, S>(&self, map: &'a ChainMap<K, V, S>) -> Option<&'a V> {
        map.entry_at(*self).map(|(_, v)| v)
    }

    pub fn entry<'a, K, V, S>(&self, map: &'a ChainMap<K, V, S>) -> Option<(&'a K, &'a V)> {
        map.entry_at(*self)
    }

    pub fn value_mut<'a, K, V, S>(&self, map: &'a mut ChainMap<K, V, S>) -> Option<&'a mut V> {
        map.entry_at_mut(*self).map(|(_, v)| v)
    }
}

/// Iterator over `(&K, &V)` in traversal-list order.
pub struct Iter<'a, K, V> {
    list: &'a TraversalList<K, V>,
    cur: NodeKey,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(list: &'a TraversalList<K, V>) -> Self {
        Self {
            list,
            cur: list.first(),
            remaining: list.len(),
        }
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            list: self.list,
            cur: self.cur,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let list: &'a TraversalList<K, V> = self.list;
        let node = list.get(self.cur)?;
        let (k, v) = node.entry.as_ref()?;
        self.cur = node.next?;
        self.remaining -= 1;
        Some((k, v))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in arena order.
pub struct IterMut<'a, K, V> {
    it: slotmap::basic::IterMut<'a, NodeKey, Node<K, V>>,
    remaining: usize,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(list: &'a mut TraversalList<K, V>) -> Self {
        let remaining = list.len();
        Self {
            it: list.slots_mut(),
            remaining,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        // Skip the sentinel slot.
        for (_, node) in self.it.by_ref() {
            if let Some((k, v)) = node.entry.as_mut() {
                self.remaining -= 1;
                return Some((&*k, v));
            }
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owning iterator; drains the list front to back.
pub struct IntoIter<K, V> {
    list: TraversalList<K, V>,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(list: TraversalList<K, V>) -> Self {
        Self { list }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.list.pop_front()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.list.len(), Some(self.list.len()))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

pub struct Keys<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

pub struct ValuesMut<'a, K, V> {
    pub(crate) inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}
