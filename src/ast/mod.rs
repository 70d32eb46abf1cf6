//! Abstract Syntax Tree (AST) Types for Bash
//!
//! This module defines the owned command tree for bash scripts, the flag
//! families that annotate it, structural equality over trees, and the
//! canonical JSON projection.

pub mod equality;
pub mod flags;
pub mod json;
pub mod types;
