//! ChainMap: public hash map API with a debug reentrancy guard.
//!
//! Every method that can run user code (`K: Hash`, `K: Eq`, value
//! constructors, `Clone`) enters the guard and then delegates to
//! `ChainTable`, which holds the actual structure.

use crate::error::Error;
use crate::iter::{Cursor, IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
use crate::reentrancy::ReentrancyCheck;
use crate::table::ChainTable;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};

/// Hasher used when none is given.
pub type DefaultHashBuilder = hashbrown::hash_map::DefaultHashBuilder;

/// A hash map with unique keys, chained buckets and a single shared
/// forward-linked list threading all of them.
///
/// Lookup, insertion and removal are O(1) on average. Before each insertion
/// the map grows so that `len() <= bucket_count() * max_load_factor()`; it
/// never shrinks on removal.
pub struct ChainMap<K, V, S = DefaultHashBuilder> {
    table: ChainTable<K, V, S>,
    reentrancy: ReentrancyCheck,
}

/// Panics with the error's message; the convenience half of `try_xxx` pairs.
#[cold]
#[track_caller]
fn fail(op: &str, e: Error) -> ! {
    panic!("ChainMap::{}: {}", op, e)
}

impl<K, V> ChainMap<K, V> {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<K, V, S: Default> Default for ChainMap<K, V, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> ChainMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            table: ChainTable::with_hasher(hasher),
            reentrancy: ReentrancyCheck::new(),
        }
    }

    pub fn hasher(&self) -> &S {
        &self.table.hasher
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.list.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Number of elements stored in bucket `bucket`.
    pub fn bucket_len(&self, bucket: usize) -> usize {
        self.table.run_len(bucket)
    }

    pub fn max_load_factor(&self) -> f32 {
        self.table.max_load_factor
    }

    /// Sets the growth threshold. The magnitude of `factor` is used; zero,
    /// NaN and infinities are rejected. Takes effect at the next insertion.
    pub fn set_max_load_factor(&mut self, factor: f32) -> Result<(), Error> {
        self.table.set_max_load_factor(factor)
    }

    /// Average number of elements per bucket, `0.0` without buckets.
    pub fn load_factor(&self) -> f32 {
        match self.bucket_count() {
            0 => 0.0,
            n => self.len() as f32 / n as f32,
        }
    }

    /// Redistributes the elements over exactly `buckets` buckets.
    ///
    /// Fails with [`Error::CapacityExceeded`] when
    /// `buckets * max_load_factor() < len()`; the map is then unchanged.
    pub fn rehash(&mut self, buckets: usize) -> Result<(), Error> {
        let _g = self.reentrancy.enter("rehash");
        self.table.rehash(buckets)
    }

    /// Grows the bucket index so `additional` more elements can be inserted
    /// without implicit growth.
    pub fn reserve(&mut self, additional: usize) -> Result<(), Error> {
        let _g = self.reentrancy.enter("reserve");
        self.table.reserve(additional)
    }

    /// Removes every element and releases the bucket index.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Cursor at the first element, or `end()` when empty.
    pub fn begin(&self) -> Cursor {
        Cursor::new(self.table.list.first())
    }

    /// Cursor at the past-last sentinel.
    ///
    /// Erasing the last element of the traversal list moves the sentinel into
    /// that element's slot, so an `end()` captured earlier no longer compares
    /// equal to the current one.
    pub fn end(&self) -> Cursor {
        Cursor::new(self.table.list.last())
    }

    /// Cursor following `at`. Advancing `end()` or a stale cursor yields `end()`.
    pub fn advance(&self, at: Cursor) -> Cursor {
        self.table
            .list
            .next(at.node())
            .map_or_else(|| self.end(), Cursor::new)
    }

    pub(crate) fn entry_at(&self, at: Cursor) -> Option<(&K, &V)> {
        self.table.entry_at(at.node())
    }

    pub(crate) fn entry_at_mut(&mut self, at: Cursor) -> Option<(&K, &mut V)> {
        self.table.entry_at_mut(at.node())
    }

    /// Visits every element in traversal-list order, each bucket's run
    /// contiguously.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.table.list)
    }

    /// Visits every element once with mutable access to its value.
    ///
    /// Unlike [`iter`](Self::iter), the order follows node storage rather than
    /// the traversal list, so bucket runs are not necessarily contiguous. For
    /// mutation in list order, step a [`Cursor`] from [`begin`](Self::begin)
    /// with [`advance`](Self::advance) and use [`Cursor::value_mut`].
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(&mut self.table.list)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Mutable values in the same storage order as [`iter_mut`](Self::iter_mut).
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Copies the map. The copy has the same bucket count and load factor
    /// but may iterate in a different order.
    pub fn try_clone(&self) -> Result<Self, Error>
    where
        K: Clone,
        V: Clone,
        S: Clone,
    {
        let _g = self.reentrancy.enter("try_clone");
        Ok(Self {
            table: self.table.try_clone()?,
            reentrancy: ReentrancyCheck::new(),
        })
    }
}

impl<K, V, S> ChainMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Cursor at the element for `q`, or `end()` on a miss.
    pub fn find<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("find");
        self.table
            .find(q)
            .map_or_else(|| self.end(), Cursor::new)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("contains_key");
        self.table.find(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(q).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get_key_value");
        let at = self.table.find(q)?;
        self.table.entry_at(at)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get_mut");
        let at = self.table.find(q)?;
        self.table.entry_at_mut(at).map(|(_, v)| v)
    }

    /// Bucket that `q` hashes to, or `None` while the map has no buckets.
    pub fn bucket_of<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
    {
        let _g = self.reentrancy.enter("bucket_of");
        self.table.bucket_of(q)
    }

    /// Inserts `key -> value` unless `key` is present.
    ///
    /// Returns a cursor at the new element with `true`, or at the existing
    /// element with `false`; an existing value is never overwritten.
    ///
    /// # Panics
    /// If the bucket index cannot be allocated; see [`try_insert`](Self::try_insert).
    pub fn insert(&mut self, key: K, value: V) -> (Cursor, bool) {
        self.try_insert(key, value)
            .unwrap_or_else(|e| fail("insert", e))
    }

    pub fn try_insert(&mut self, key: K, value: V) -> Result<(Cursor, bool), Error> {
        self.try_insert_with(key, || value)
    }

    /// Like `insert`, but builds the value only when `key` is absent.
    pub fn insert_with<F>(&mut self, key: K, make: F) -> (Cursor, bool)
    where
        F: FnOnce() -> V,
    {
        self.try_insert_with(key, make)
            .unwrap_or_else(|e| fail("insert_with", e))
    }

    pub fn try_insert_with<F>(&mut self, key: K, make: F) -> Result<(Cursor, bool), Error>
    where
        F: FnOnce() -> V,
    {
        let _g = self.reentrancy.enter("try_insert_with");
        let (at, inserted) = self.table.insert_with(key, make)?;
        Ok((Cursor::new(at), inserted))
    }

    /// Value for `key`, inserting `make()` first if the key is absent.
    pub fn get_or_insert_with<F>(&mut self, key: K, make: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        self.try_get_or_insert_with(key, make)
            .unwrap_or_else(|e| fail("get_or_insert_with", e))
    }

    pub fn try_get_or_insert_with<F>(&mut self, key: K, make: F) -> Result<&mut V, Error>
    where
        F: FnOnce() -> V,
    {
        let _g = self.reentrancy.enter("try_get_or_insert_with");
        let (at, _) = self.table.insert_with(key, make)?;
        match self.table.entry_at_mut(at) {
            Some((_, v)) => Ok(v),
            None => unreachable!("element located by insert is live"),
        }
    }

    /// Value for `key`, inserting `V::default()` first if the key is absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Erases the element for `q`; returns whether one was found.
    ///
    /// The erased element's node is not freed. It takes over its successor in
    /// the traversal list, and the successor's node is freed instead (or the
    /// erased node becomes the new past-last sentinel when it was last).
    /// Consequently a cursor at the erased element afterwards names the
    /// element that followed it, and a cursor at that follower goes stale.
    pub fn erase<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).is_some()
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("remove_entry");
        self.table.remove_entry(q)
    }

    /// Replaces the contents with `iter`.
    pub fn assign<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.clear();
        self.extend(iter);
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        self.table.check_invariants();
    }
}

impl<K, V, S> Clone for ChainMap<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        self.try_clone().unwrap_or_else(|e| fail("clone", e))
    }
}

impl<K, V, S> fmt::Debug for ChainMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Maps are equal when they hold the same key/value pairs, in any order.
impl<K, V, S> PartialEq for ChainMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Eq for ChainMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> Extend<(K, V)> for ChainMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for ChainMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Self::default();
        m.extend(iter);
        m
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for ChainMap<K, V>
where
    K: Eq + Hash,
{
    fn from(arr: [(K, V); N]) -> Self {
        arr.into_iter().collect()
    }
}

impl<K, V, S> IntoIterator for ChainMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.table.list)
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut ChainMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
