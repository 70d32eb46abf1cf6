//! C-layout mirrors of the engine's syntax structs.
//!
//! Field order and types follow the engine's `command.h` exactly; struct
//! and field names are kept as the engine spells them so the two sides can
//! be read against each other. These types exist only for the decode/encode
//! walks — nothing outside `ffi` touches them.

#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

use libc::{c_char, c_int};

#[repr(C)]
#[derive(Clone, Copy)]
pub struct word_desc {
    pub word: *mut c_char,
    pub flags: c_int,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct word_list {
    pub next: *mut word_list,
    pub word: *mut word_desc,
}

/// Either a file descriptor or a word; which arm is live is decided by the
/// enclosing redirect's rflags (redirector) or instruction (redirectee).
#[repr(C)]
#[derive(Clone, Copy)]
pub union REDIRECTEE {
    pub dest: c_int,
    pub filename: *mut word_desc,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct redirect {
    pub next: *mut redirect,
    pub redirector: REDIRECTEE,
    pub rflags: c_int,
    pub flags: c_int,
    pub instruction: c_int,
    pub redirectee: REDIRECTEE,
    pub here_doc_eof: *mut c_char,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct for_com {
    pub flags: c_int,
    pub line: c_int,
    pub name: *mut word_desc,
    pub map_list: *mut word_list,
    pub action: *mut command,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct pattern_list {
    pub next: *mut pattern_list,
    pub patterns: *mut word_list,
    pub action: *mut command,
    pub flags: c_int,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct case_com {
    pub flags: c_int,
    pub line: c_int,
    pub word: *mut word_desc,
    pub clauses: *mut pattern_list,
}

/// Shared by `while` and `until`; the outer type tag tells them apart.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct while_com {
    pub flags: c_int,
    pub test: *mut command,
    pub action: *mut command,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct if_com {
    pub flags: c_int,
    pub test: *mut command,
    pub true_case: *mut command,
    pub false_case: *mut command,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct connection {
    pub ignore: c_int,
    pub first: *mut command,
    pub second: *mut command,
    pub connector: c_int,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct simple_com {
    pub flags: c_int,
    pub line: c_int,
    pub words: *mut word_list,
    pub redirects: *mut redirect,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct function_def {
    pub flags: c_int,
    pub line: c_int,
    pub name: *mut word_desc,
    pub command: *mut command,
    pub source_file: *mut c_char,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct group_com {
    pub ignore: c_int,
    pub command: *mut command,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct select_com {
    pub flags: c_int,
    pub line: c_int,
    pub name: *mut word_desc,
    pub map_list: *mut word_list,
    pub action: *mut command,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct arith_com {
    pub flags: c_int,
    pub line: c_int,
    pub exp: *mut word_list,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct cond_com {
    pub flags: c_int,
    pub line: c_int,
    pub type_: c_int,
    pub op: *mut word_desc,
    pub left: *mut cond_com,
    pub right: *mut cond_com,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct arith_for_com {
    pub flags: c_int,
    pub line: c_int,
    pub init: *mut word_list,
    pub test: *mut word_list,
    pub step: *mut word_list,
    pub action: *mut command,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct subshell_com {
    pub flags: c_int,
    pub line: c_int,
    pub command: *mut command,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct coproc_com {
    pub flags: c_int,
    pub name: *mut c_char,
    pub command: *mut command,
}

/// Exactly one arm is live, selected by the enclosing command's type tag.
#[repr(C)]
#[derive(Clone, Copy)]
pub union value {
    pub For: *mut for_com,
    pub Case: *mut case_com,
    pub While: *mut while_com,
    pub If: *mut if_com,
    pub Connection: *mut connection,
    pub Simple: *mut simple_com,
    pub Function_def: *mut function_def,
    pub Group: *mut group_com,
    pub Select: *mut select_com,
    pub Arith: *mut arith_com,
    pub Cond: *mut cond_com,
    pub ArithFor: *mut arith_for_com,
    pub Subshell: *mut subshell_com,
    pub Coproc: *mut coproc_com,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct command {
    pub type_: c_int,
    pub flags: c_int,
    /// Unused by the engine's printer; preserved for layout only
    pub line: c_int,
    pub redirects: *mut redirect,
    pub value: value,
}
