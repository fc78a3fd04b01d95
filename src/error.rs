//! Crate-wide error type.
//!
//! Every fallible entry point in this crate returns [`Result`]. There is no
//! partial-IR recovery: a pass either finishes cleanly or the caller gets an
//! `Err` and is expected to discard the `Ir` it was building.

use thiserror::Error;

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The core error type.
///
/// This plays the same role as the teacher crate's hand-written
/// `Error`/`ErrorKind` pair (a closed set of named failure kinds, with an
/// optional wrapped source for errors that originate in a pluggable
/// backend), generated here with `thiserror` instead of by hand.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("invalid input types for operation `{op}`: {types:?}")]
    InvalidInputTypes { op: String, types: Vec<String> },

    #[error("operation `{0}` has no valid output type for the given inputs")]
    InvalidOutputType(String),

    #[error("shape mismatch: {a:?} is not compatible with {b:?}")]
    ShapeMismatch { a: Vec<String>, b: Vec<String> },

    #[error("shape is not fully defined")]
    ShapeNotFullyDefined,

    #[error("matmul inner dimension mismatch: {a} != {b}")]
    InnerDimensionMismatch { a: usize, b: usize },

    #[error("argument not found for role {0:?} slot {1}")]
    ArgumentNotFound(crate::arg::ArgRole, u32),

    #[error("null argument passed to node construction")]
    NullArgument,

    #[error("topological violation: input node index {input} is not before consumer index {consumer}")]
    TopologicalViolation { input: i64, consumer: i64 },

    #[error("scope stack underflow: no scope to end")]
    ScopeUnderflow,

    #[error("no common parent between the two nodes")]
    NoCommonParent,

    #[error("node already initialized")]
    NodeAlreadyInitialized,

    #[error("attempted to allocate a tensor with a zero-sized dimension")]
    ZeroSize,

    #[error("buffer is not marked for deletion")]
    BufferNotMarkedForDeletion,

    #[error("operation `{0}` is not differentiable")]
    NonDifferentiableOp(String),

    #[error("cannot squeeze axis {axis} with non-unit size {size}")]
    SqueezeNonUnit { axis: i64, size: usize },

    #[error(transparent)]
    Backend(#[from] Box<dyn std::error::Error + Send + Sync>),
}
