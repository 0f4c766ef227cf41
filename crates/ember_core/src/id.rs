//! Actor handles and id allocation

use core::fmt;
use serde::{Deserialize, Serialize};

/// Opaque handle identifying an actor uniquely within a zone
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(i64);

impl ActorId {
    /// The invalid/sentinel handle
    pub const INVALID: ActorId = ActorId(-1);

    /// Create a handle from a raw integer
    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Get the raw integer value
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Check whether this handle could refer to an actor
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "ActorId({})", self.0)
        } else {
            write!(f, "ActorId(invalid)")
        }
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic id source owned by the actor set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorIdAllocator {
    next: i64,
}

impl ActorIdAllocator {
    /// Create a new allocator starting at zero
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Hand out the next unique handle
    pub fn next(&mut self) -> ActorId {
        let id = ActorId(self.next);
        self.next += 1;
        id
    }
}

impl Default for ActorIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
