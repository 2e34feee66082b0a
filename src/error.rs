//! Errors reported by the red-black tree map.

use allocated::AllocErrorWithLayout;
use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur while operating on a tree map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// A key-required lookup found no matching element.
    #[error("key not found")]
    KeyNotFound,

    /// The allocator refused to provide storage for a new node.
    ///
    /// The map is left exactly as it was before the call.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(AllocErrorWithLayout),

    /// A structural check found a broken red-black invariant.
    ///
    /// Only [`validate`](crate::RbTreeMap::validate) reports this; a correct
    /// tree never produces it.
    #[error("red-black invariant violated: {0}")]
    InvariantViolation(#[from] Violation),
}

impl From<AllocErrorWithLayout> for Error {
    fn from(err: AllocErrorWithLayout) -> Self {
        Error::ResourceExhausted(err)
    }
}

/// The structural rule a [`Error::InvariantViolation`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("root is red")]
    RedRoot,

    #[error("sentinel is red or does not link to itself")]
    CorruptSentinel,

    #[error("red node has a red child")]
    RedRedEdge,

    #[error("black height differs between paths ({expected} vs {found})")]
    BlackHeight { expected: usize, found: usize },

    #[error("child does not link back to its parent")]
    BrokenParentLink,

    #[error("keys are not strictly increasing under the comparator")]
    Unordered,

    #[error("stored length {stored} differs from reachable node count {counted}")]
    LengthMismatch { stored: usize, counted: usize },
}
