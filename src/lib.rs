//! bash-bridge - lossless marshalling between bash's parser and an owned AST
//!
//! This library models a shell script's syntax tree and converts it, in both
//! directions, to the pointer-graph representation used by an external
//! shell-grammar engine (a patched bash built as a shared object). Parse a
//! script through [`Engine::parse_file`], inspect or compare the owned
//! trees, and hand them back through [`Engine::render`] to regenerate
//! source text.

pub mod ast;
pub mod engine;
pub mod error;
pub mod ffi;

pub use ast::equality::{ast_equals, ast_equals_with, Ordering};
pub use ast::flags::{CommandFlag, Flag, OpenFlag, PatternFlag, RedirectFlag, WordFlag};
pub use ast::json::{ast_to_json, command_to_json};
pub use ast::types::*;
pub use engine::{Engine, EngineOptions, ENGINE_PATH_VAR};
pub use error::{BridgeError, BridgeResult};
