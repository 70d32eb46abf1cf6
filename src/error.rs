//! Error types for the marshalling layer and the engine bridge.

use std::path::PathBuf;
use std::str::Utf8Error;
use thiserror::Error;

/// Result type alias for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors surfaced by the marshalling layer and the engine bridge.
///
/// Parse failures are expected and recoverable by the caller; everything
/// else indicates either an engine/library version mismatch
/// ([`UnsupportedConstruct`](BridgeError::UnsupportedConstruct) and the
/// unknown-value variants) or a violated construction invariant
/// ([`MalformedUnion`](BridgeError::MalformedUnion)).
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The engine's one-time initialization returned a non-zero status.
    #[error("bash engine initialization failed (status {status})")]
    EngineInitFailed { status: i32 },

    /// The engine rejected the input file.
    #[error("failed to set engine input {} (status {})", .path.display(), .status)]
    InputSetFailed { path: PathBuf, status: i32 },

    /// The engine could not parse the input; shell script may be invalid.
    #[error("failed to parse {}: shell script may be invalid", .path.display())]
    ParseFailed { path: PathBuf },

    /// A command type tag outside the known range of 0..=14.
    #[error("unsupported command type tag {tag}")]
    UnsupportedConstruct { tag: i32 },

    /// A connection carried a connector token outside the six known values.
    #[error("unknown connector value {value}")]
    UnknownConnector { value: i32 },

    /// A conditional expression carried an unknown type value.
    #[error("unknown conditional expression type {value}")]
    UnknownCondKind { value: i32 },

    /// A redirect carried an instruction outside the known range of 0..=19.
    #[error("unknown redirect instruction {value}")]
    UnknownInstruction { value: i32 },

    /// A discriminated union arm disagreed with its discriminator, or a
    /// required pointer in the foreign graph was null.
    #[error("malformed union: {what}")]
    MalformedUnion { what: &'static str },

    /// Text crossing the boundary was not valid UTF-8.
    #[error("invalid utf-8 in {what}")]
    BadText {
        what: &'static str,
        #[source]
        source: Utf8Error,
    },

    /// Text headed for the engine contained an interior NUL byte.
    #[error("interior NUL byte in {what}")]
    InteriorNul { what: &'static str },

    /// The engine returned no text for a command graph.
    #[error("the engine failed to render a {kind} command")]
    RenderFailed { kind: &'static str },

    /// The engine shared object could not be loaded or lacks a symbol.
    #[error("engine library error: {0}")]
    Library(#[from] libloading::Error),
}
