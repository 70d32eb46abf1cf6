//! Marshalling between owned command trees and the engine's pointer graphs.
//!
//! `decode` walks a graph the engine produced into an owned tree; `encode`
//! rebuilds an engine-shaped graph from a tree, backed by an [`Arena`] that
//! owns every allocation. Both directions are total over the command forms.

pub mod arena;
pub mod decode;
pub mod encode;
pub mod raw;

pub use arena::Arena;
pub use decode::decode_command;
pub use encode::encode_command;

// ============================================================================
// Tests
// ============================================================================
