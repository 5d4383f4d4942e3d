//! Failure type for the operations of `ChainMap` that can fail.
//!
//! A missing key or a duplicate insert is not a failure: those outcomes are
//! encoded in return values (`Cursor`, `bool`, `Option`). Only capacity
//! violations and allocation failures are reported here.

use std::collections::TryReserveError;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// An explicit rehash asked for too few buckets to hold `len` elements at
    /// the current maximum load factor. The map is left untouched.
    CapacityExceeded { buckets: usize, len: usize },
    /// The maximum load factor must be finite and non-zero.
    InvalidLoadFactor,
    /// A node slot or the bucket index could not be allocated.
    OutOfMemory(TryReserveError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CapacityExceeded { buckets, len } => write!(
                f,
                "{} buckets cannot hold {} elements at the current max load factor",
                buckets, len
            ),
            Error::InvalidLoadFactor => f.write_str("max load factor must be finite and non-zero"),
            Error::OutOfMemory(e) => write!(f, "memory allocation failed: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OutOfMemory(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TryReserveError> for Error {
    fn from(e: TryReserveError) -> Self {
        Error::OutOfMemory(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn capacity_message_names_both_sides() {
        let e = Error::CapacityExceeded { buckets: 2, len: 5 };
        let msg = e.to_string();
        assert!(msg.contains("2 buckets"));
        assert!(msg.contains("5 elements"));
        assert!(e.source().is_none());
    }

    #[test]
    fn out_of_memory_exposes_source() {
        let mut v: Vec<u64> = Vec::new();
        let reserve = v.try_reserve_exact(usize::MAX).unwrap_err();
        let e = Error::from(reserve);
        assert!(matches!(e, Error::OutOfMemory(_)));
        assert!(e.source().is_some());
    }
}
