// Allocation failure must reach the caller as `Error::OutOfMemory` and leave
// the map untouched.
//
// This binary installs a global allocator that refuses every request at or
// above a configurable size. Only large requests are refused, so the test
// harness keeps working while the map's node arena can no longer grow.
// Everything lives in one #[test] so no other test shares the cap.
use chain_map::{ChainMap, Error};
use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

struct CappedAlloc;

static CAP: AtomicUsize = AtomicUsize::new(usize::MAX);

unsafe impl GlobalAlloc for CappedAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.size() >= CAP.load(Ordering::Relaxed) {
            return std::ptr::null_mut();
        }
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if new_size >= CAP.load(Ordering::Relaxed) {
            return std::ptr::null_mut();
        }
        System.realloc(ptr, layout, new_size)
    }
}

#[global_allocator]
static ALLOC: CappedAlloc = CappedAlloc;

/// Caps allocations at `bytes` until dropped.
struct Capped;
impl Capped {
    fn at(bytes: usize) -> Self {
        CAP.store(bytes, Ordering::Relaxed);
        Capped
    }
}
impl Drop for Capped {
    fn drop(&mut self) {
        CAP.store(usize::MAX, Ordering::Relaxed);
    }
}

#[test]
fn node_allocation_failure_is_reported_not_aborted() {
    let mut m: ChainMap<u64, u64> = ChainMap::new();
    // 5000 buckets fit well under the cap, so only the node arena can fail.
    m.reserve(5000).unwrap();
    let buckets = m.bucket_count();

    // Insert: the arena doubles until a doubling crosses 64 KiB.
    let (failed_at, err) = {
        let _cap = Capped::at(64 * 1024);
        let mut outcome = None;
        for i in 0..5000u64 {
            if let Err(e) = m.try_insert(i, i) {
                outcome = Some((i, e));
                break;
            }
        }
        outcome.expect("node arena must hit the cap before 5000 elements")
    };
    assert!(matches!(err, Error::OutOfMemory(_)), "{:?}", err);
    assert_eq!(m.len() as u64, failed_at);
    assert!(!m.contains_key(&failed_at));
    assert_eq!(m.bucket_count(), buckets);
    for i in 0..failed_at {
        assert_eq!(m.get(&i), Some(&i));
    }

    // Clone: the copy's bucket index fits under the cap, its node arena does not.
    m.rehash(m.len() + 64).unwrap();
    let copy_err = {
        let _cap = Capped::at(32 * 1024);
        match m.try_clone() {
            Ok(_) => None,
            Err(e) => Some(e),
        }
    };
    assert!(
        matches!(copy_err, Some(Error::OutOfMemory(_))),
        "{:?}",
        copy_err
    );
    assert_eq!(m.len() as u64, failed_at);

    // With the cap lifted the same operations succeed.
    assert!(m.try_insert(failed_at, failed_at).unwrap().1);
    let copy = m.try_clone().unwrap();
    assert_eq!(copy, m);
}
