//! Debug-only reentrancy check for `ChainMap` entry points.
//!
//! While an insert, lookup or erase is in flight the bucket index and the
//! traversal list can briefly disagree (a head redirected before the swap,
//! a chain detached during rehash). The only user code that runs in those
//! windows is `K: Hash`, `K: Eq` and value constructors. If any of them
//! reaches back into the same map, debug builds panic naming both the
//! running operation and the one that tried to start. Release builds carry
//! no state.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug)]
pub(crate) struct ReentrancyCheck {
    /// Name of the operation currently running, if any.
    #[cfg(debug_assertions)]
    running: Cell<Option<&'static str>>,
    // The map is single-threaded; this also keeps it !Send + !Sync.
    _single_thread: PhantomData<*mut ()>,
}

impl ReentrancyCheck {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            running: Cell::new(None),
            _single_thread: PhantomData,
        }
    }

    /// Marks `op` as running until the returned guard drops.
    #[inline]
    #[track_caller]
    pub(crate) fn enter(&self, op: &'static str) -> Entered<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.running.replace(Some(op)) {
                self.running.set(Some(outer));
                panic!(
                    "reentrancy detected: ChainMap::{} called from Hash, Eq or a value \
                     constructor while ChainMap::{} is running",
                    op, outer
                );
            }
            Entered { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            Entered { _owner: PhantomData }
        }
    }

    #[cfg(all(test, debug_assertions))]
    fn running(&self) -> Option<&'static str> {
        self.running.get()
    }
}

impl Default for ReentrancyCheck {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct Entered<'a> {
    #[cfg(debug_assertions)]
    owner: &'a ReentrancyCheck,
    #[cfg(not(debug_assertions))]
    _owner: PhantomData<&'a ReentrancyCheck>,
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.running.set(None);
    }
}
