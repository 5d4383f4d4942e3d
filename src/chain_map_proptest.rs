#![cfg(test)]

// Property tests for ChainMap kept inside the crate so they can call the
// structural invariant checker.

use crate::{ChainMap, Error};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations so shrinking moves towards earlier keys.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    InsertWith(usize, i32),
    GetOrDefault(usize, i32),
    Erase(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Rehash(usize),
    Reserve(usize),
    SetLoadFactor(f32),
    CloneSwap,
    Clear,
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let capacity = prop_oneof![
            (0usize..40).prop_map(Op::Rehash),
            (0usize..20).prop_map(Op::Reserve),
            prop_oneof![Just(0.25f32), Just(0.5), Just(1.0), Just(3.0), Just(-0.75)]
                .prop_map(Op::SetLoadFactor),
        ];
        let lifecycle = prop_oneof![Just(Op::CloneSwap), Just(Op::Clear), Just(Op::Iterate)];
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::InsertWith(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::GetOrDefault(i, d)),
            3 => idx.clone().prop_map(Op::Erase),
            2 => idx.clone().prop_map(Op::Find),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(Op::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            2 => capacity,
            2 => lifecycle,
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn snapshot<S: BuildHasher>(m: &ChainMap<Key, i32, S>) -> BTreeMap<Key, i32> {
    m.iter().map(|(k, v)| (k.clone(), *v)).collect()
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - Insert succeeds only for absent keys and never overwrites; the returned
//   cursor resolves to the stored element either way.
// - `find`/`contains_key`/`get` agree with the model; misses return `end()`.
// - `erase` returns true exactly when the model held the key.
// - Rehash to an undersized bucket count fails and changes nothing.
// - Clones compare equal and are independent of their source.
// - After every op: run layout, bucket heads, uniqueness, `len` parity and
//   the load-factor bound after growth.
fn run_state_machine<S>(
    mut sut: ChainMap<Key, i32, S>,
    pool: Vec<String>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher + Clone,
{
    let mut model: HashMap<Key, i32> = HashMap::new();
    for op in ops {
        let mut inserted_now = false;
        match op {
            Op::Insert(i, v) => {
                let k = key_from(&pool, i);
                let already = model.contains_key(&k);
                let (at, inserted) = sut.insert(k.clone(), v);
                prop_assert_eq!(inserted, !already);
                prop_assert_eq!(at.key(&sut), Some(&k));
                model.entry(k).or_insert(v);
                inserted_now = inserted;
            }
            Op::InsertWith(i, v) => {
                let k = key_from(&pool, i);
                let already = model.contains_key(&k);
                let mut ran = false;
                let (_, inserted) = sut.insert_with(k.clone(), || {
                    ran = true;
                    v
                });
                prop_assert_eq!(inserted, !already);
                prop_assert_eq!(ran, !already, "constructor runs only on success");
                model.entry(k).or_insert(v);
                inserted_now = inserted;
            }
            Op::GetOrDefault(i, d) => {
                let k = key_from(&pool, i);
                inserted_now = !model.contains_key(&k);
                let slot = sut.get_or_insert_default(k.clone());
                *slot = slot.wrapping_add(d);
                let m = model.entry(k).or_default();
                *m = m.wrapping_add(d);
            }
            Op::Erase(i) => {
                let k = key_from(&pool, i);
                let expected = model.remove(&k).is_some();
                prop_assert_eq!(sut.erase(&k), expected);
                prop_assert_eq!(sut.find(&k), sut.end());
            }
            Op::Find(i) => {
                let k = key_from(&pool, i);
                let at = sut.find(&k);
                match model.get(&k) {
                    Some(v) => prop_assert_eq!(at.value(&sut), Some(v)),
                    None => prop_assert_eq!(at, sut.end()),
                }
            }
            Op::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
                prop_assert_eq!(sut.get(s.as_str()).is_some(), has_model);
            }
            Op::Mutate(i, d) => {
                let k = key_from(&pool, i);
                if let Some(v) = sut.get_mut(&k) {
                    *v = v.wrapping_add(d);
                    let m = model.get_mut(&k).expect("model holds every live key");
                    *m = m.wrapping_add(d);
                } else {
                    prop_assert!(!model.contains_key(&k));
                }
            }
            Op::Rehash(n) => {
                let before = snapshot(&sut);
                let buckets = sut.bucket_count();
                let fits = n as f64 * sut.max_load_factor() as f64 >= sut.len() as f64;
                match sut.rehash(n) {
                    Ok(()) => {
                        prop_assert!(fits);
                        prop_assert_eq!(sut.bucket_count(), n);
                    }
                    Err(Error::CapacityExceeded { buckets: b, len }) => {
                        prop_assert!(!fits);
                        prop_assert_eq!((b, len), (n, sut.len()));
                        prop_assert_eq!(sut.bucket_count(), buckets);
                    }
                    Err(other) => prop_assert!(false, "unexpected error: {:?}", other),
                }
                prop_assert_eq!(snapshot(&sut), before);
            }
            Op::Reserve(n) => {
                sut.reserve(n).expect("small reservations succeed");
                // The reserved headroom fits without further growth.
                let room = sut.bucket_count() as f64 * sut.max_load_factor() as f64;
                prop_assert!(room >= (sut.len() + n) as f64);
            }
            Op::SetLoadFactor(f) => {
                sut.set_max_load_factor(f).expect("finite non-zero factor");
                prop_assert_eq!(sut.max_load_factor(), f.abs());
            }
            Op::CloneSwap => {
                let mut copy = sut.clone();
                prop_assert!(copy == sut);
                prop_assert_eq!(copy.bucket_count(), sut.bucket_count());
                copy.check_invariants();
                // Mutating the source must not leak into the copy.
                sut.insert(Key("clone-probe".to_string()), 0);
                prop_assert!(!copy.contains_key("clone-probe"));
                sut.erase("clone-probe");
                copy.insert(Key("clone-probe".to_string()), 1);
                prop_assert!(!sut.contains_key("clone-probe"));
                copy.erase("clone-probe");
                sut = copy;
            }
            Op::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.bucket_count(), 0);
                prop_assert_eq!(sut.begin(), sut.end());
            }
            Op::Iterate => {
                let m: BTreeMap<Key, i32> = model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(snapshot(&sut), m);
                prop_assert_eq!(sut.iter().count(), sut.len());
            }
        }

        sut.check_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        if inserted_now {
            let room = sut.bucket_count() as f64 * sut.max_load_factor() as f64;
            prop_assert!(sut.len() as f64 <= room);
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_state_machine(ChainMap::new(), pool, ops)?;
    }
}

// Collision variant using a constant hasher: every key lands in bucket 0,
// so all erases go through the run-internal and tail-sentinel paths.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Low-entropy variant: only the first byte matters, so runs of several
// buckets sit next to each other and erase exercises head redirection.
#[derive(Clone, Default)]
struct FirstByteBuildHasher;
#[derive(Default)]
struct FirstByteHasher(Option<u8>);
impl BuildHasher for FirstByteBuildHasher {
    type Hasher = FirstByteHasher;
    fn build_hasher(&self) -> Self::Hasher {
        FirstByteHasher::default()
    }
}
impl Hasher for FirstByteHasher {
    fn write(&mut self, bytes: &[u8]) {
        if self.0.is_none() {
            self.0 = bytes.first().copied();
        }
    }
    fn finish(&self) -> u64 {
        u64::from(self.0.unwrap_or(0))
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_state_machine(ChainMap::with_hasher(ConstBuildHasher), pool, ops)?;
    }

    #[test]
    fn prop_state_machine_with_clustered_buckets((pool, ops) in arb_scenario()) {
        run_state_machine(ChainMap::with_hasher(FirstByteBuildHasher), pool, ops)?;
    }
}
