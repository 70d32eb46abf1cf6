//! Dynamic handle to the shell-grammar engine.
//!
//! The engine is a patched bash 5.2 built as a shared object; it owns the
//! lexer, the grammar and the pretty-printer, and exposes them through four
//! entry points plus two globals. This module loads it, drives the
//! one-command-at-a-time read loop, and hands trees back for text
//! regeneration.
//!
//! All of the engine's state is process-global — opening the same shared
//! object twice aliases the same globals — so every parse/render cycle in
//! the process serializes behind a single lock, no matter how many handles
//! exist. Decoded trees are plain immutable data and freely shareable.

use std::env;
use std::ffi::{CStr, CString};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use lazy_static::lazy_static;
use libc::{c_char, c_int};
use libloading::{Library, Symbol};
use log::{debug, trace};

use crate::ast::types::Command;
use crate::error::{BridgeError, BridgeResult};
use crate::ffi::{decode_command, encode_command, raw, Arena};

/// Environment variable naming the engine shared object.
pub const ENGINE_PATH_VAR: &str = "BASH_BRIDGE_SO";

/// Conventional location of the engine inside its build tree.
const DEFAULT_ENGINE_PATH: &str = "bash-5.2/bash.so";

lazy_static! {
    static ref ENGINE_GATE: Mutex<()> = Mutex::new(());
}

type InitFn = unsafe extern "C" fn() -> c_int;
type SetFileFn = unsafe extern "C" fn(*const c_char) -> c_int;
type ReadFn = unsafe extern "C" fn() -> c_int;
type UnsetInputFn = unsafe extern "C" fn(c_int);
type RenderFn = unsafe extern "C" fn(*mut raw::command) -> *const c_char;

/// Options for opening an engine handle.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Path to the engine shared object. Defaults to `$BASH_BRIDGE_SO`,
    /// then to `bash-5.2/bash.so` relative to the working directory.
    pub library_path: Option<PathBuf>,
}

/// A loaded, initialized engine.
#[derive(Debug)]
pub struct Engine {
    lib: Library,
}

impl Engine {
    /// Open the engine at an explicit path.
    pub fn load(path: impl Into<PathBuf>) -> BridgeResult<Self> {
        Self::with_options(EngineOptions {
            library_path: Some(path.into()),
        })
    }

    /// Open the engine, resolving the shared object path from the options.
    pub fn with_options(options: EngineOptions) -> BridgeResult<Self> {
        let path = resolve_library_path(&options);
        let _cycle = cycle_lock();
        let lib = unsafe { Library::new(&path) }?;
        let engine = Self { lib };
        let status = {
            let init: Symbol<InitFn> = engine.sym(b"initialize_shell_libbash\0")?;
            unsafe { init() }
        };
        if status != 0 {
            return Err(BridgeError::EngineInitFailed { status });
        }
        debug!("bash engine loaded from {}", path.display());
        Ok(engine)
    }

    /// Parse a script file into owned command trees, one per top-level
    /// command.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> BridgeResult<Vec<Command>> {
        let path = path.as_ref();
        let _cycle = cycle_lock();

        let set_input: Symbol<SetFileFn> = self.sym(b"set_bash_file\0")?;
        let read_one: Symbol<ReadFn> = self.sym(b"read_command_safe\0")?;
        let last_parsed: Symbol<*mut *mut raw::command> = self.sym(b"global_command\0")?;
        let eof_reached: Symbol<*mut c_int> = self.sym(b"EOF_Reached\0")?;

        let c_path = CString::new(path.to_string_lossy().as_bytes())
            .map_err(|_| BridgeError::InteriorNul { what: "input path" })?;
        let status = unsafe { set_input(c_path.as_ptr()) };
        if status < 0 {
            return Err(BridgeError::InputSetFailed {
                path: path.to_path_buf(),
                status,
            });
        }
        debug!("engine input set to {}", path.display());

        // the engine now holds an open input file; release it on every exit
        // path, including parse failure
        let _input = InputGuard { engine: self };

        let mut commands = Vec::new();
        loop {
            if unsafe { read_one() } != 0 {
                return Err(BridgeError::ParseFailed {
                    path: path.to_path_buf(),
                });
            }
            let current = unsafe { **last_parsed };
            if current.is_null() {
                if unsafe { **eof_reached } != 0 {
                    break;
                }
                // a blank line parses to nothing; keep reading
                continue;
            }
            let command = unsafe { decode_command(current) }?;
            trace!("decoded a {} command", command.kind().name());
            commands.push(command);
        }
        Ok(commands)
    }

    /// Render trees back to shell source, one command per line.
    pub fn render(&self, ast: &[Command]) -> BridgeResult<String> {
        let _cycle = cycle_lock();
        let make_string: Symbol<RenderFn> = self.sym(b"make_command_string\0")?;

        let mut script = String::new();
        for command in ast {
            let mut arena = Arena::new();
            let graph = encode_command(command, &mut arena)?;
            let text = unsafe { make_string(graph) };
            if text.is_null() {
                return Err(BridgeError::RenderFailed {
                    kind: command.kind().name(),
                });
            }
            let text = unsafe { CStr::from_ptr(text) }.to_str().map_err(|source| {
                BridgeError::BadText {
                    what: "rendered command text",
                    source,
                }
            })?;
            script.push_str(text);
            script.push('\n');
            // the arena drops here, after the engine's text has been copied
        }
        Ok(script)
    }

    fn sym<'lib, T>(&'lib self, name: &[u8]) -> BridgeResult<Symbol<'lib, T>> {
        unsafe { self.lib.get(name) }.map_err(BridgeError::from)
    }
}

/// Closes the engine's input file when the read loop exits.
struct InputGuard<'a> {
    engine: &'a Engine,
}

impl Drop for InputGuard<'_> {
    fn drop(&mut self) {
        if let Ok(unset) = self.engine.sym::<UnsetInputFn>(b"unset_bash_input\0") {
            unsafe { unset(0) };
        }
    }
}

fn cycle_lock() -> MutexGuard<'static, ()> {
    ENGINE_GATE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn resolve_library_path(options: &EngineOptions) -> PathBuf {
    options
        .library_path
        .clone()
        .or_else(|| env::var_os(ENGINE_PATH_VAR).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ENGINE_PATH))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::ast::equality::ast_equals;

    #[test]
    fn test_explicit_path_wins_over_defaults() {
        let options = EngineOptions {
            library_path: Some(PathBuf::from("/opt/engine/bash.so")),
        };
        assert_eq!(
            resolve_library_path(&options),
            PathBuf::from("/opt/engine/bash.so")
        );
    }

    #[test]
    fn test_missing_library_is_a_library_error() {
        let err = Engine::load("/nonexistent/bash.so").unwrap_err();
        assert!(matches!(err, BridgeError::Library(_)));
    }

    #[test]
    #[ignore = "needs a compiled engine shared object; point BASH_BRIDGE_SO at it"]
    fn test_parse_render_reparse_is_stable() {
        let engine = Engine::with_options(EngineOptions::default()).unwrap();

        let mut script = tempfile::NamedTempFile::new().unwrap();
        writeln!(script, "echo hello > out.txt").unwrap();
        writeln!(script, "for i in a b c; do echo $i; done").unwrap();
        writeln!(script, "if true; then echo yes; fi").unwrap();
        script.flush().unwrap();

        let mut previous = engine.parse_file(script.path()).unwrap();
        for _ in 0..3 {
            let rendered = engine.render(&previous).unwrap();
            let mut reparse = tempfile::NamedTempFile::new().unwrap();
            write!(reparse, "{rendered}").unwrap();
            reparse.flush().unwrap();
            let next = engine.parse_file(reparse.path()).unwrap();
            assert!(ast_equals(&previous, &next));
            previous = next;
        }
    }

    #[test]
    #[ignore = "needs a compiled engine shared object; point BASH_BRIDGE_SO at it"]
    fn test_malformed_script_fails_consistently() {
        let engine = Engine::with_options(EngineOptions::default()).unwrap();

        let mut script = tempfile::NamedTempFile::new().unwrap();
        writeln!(script, "if then fi").unwrap();
        script.flush().unwrap();

        let first = engine.parse_file(script.path()).unwrap_err();
        let second = engine.parse_file(script.path()).unwrap_err();
        assert!(matches!(first, BridgeError::ParseFailed { .. }));
        assert_eq!(first.to_string(), second.to_string());
    }
}
