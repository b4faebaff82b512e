//! Process-wide object ids.
//!
//! Every drawable carries an [`ObjectId`]. Renderers key their queues by it,
//! so iteration order is id order and removal by id is a map lookup.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_ID: AtomicU32 = AtomicU32::new(0);

/// Stable identity of a drawable object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u32);

impl ObjectId {
    /// Hand out the next id. Ids start at 0 and increase monotonically for
    /// the lifetime of the process.
    pub fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap an explicit id. Nothing stops this from colliding with a
    /// generated one; a renderer holding both keeps the last one added.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
