//! Construction of engine-shaped pointer graphs from owned trees.
//!
//! The structural inverse of decode: every recursive child gets a freshly
//! allocated foreign node, every `Option` maps to present-or-null. Linked
//! lists are built iteratively — all nodes first, then one forward pass
//! linking `next` pointers — so construction depth never scales with list
//! length. Every allocation lands in the caller's [`Arena`].

use std::ptr;

use libc::{c_char, c_int};

use crate::ast::flags::{CommandFlag, Flag, OpenFlag, PatternFlag, RedirectFlag, WordFlag};
use crate::ast::types::{
    Addressee, Command, CommandBody, CondExpr, Pattern, Redirect, WordDesc,
};
use crate::error::BridgeResult;
use crate::ffi::arena::Arena;
use crate::ffi::raw;

/// Build the foreign graph for one command. The graph stays valid for as
/// long as the arena lives.
pub fn encode_command(command: &Command, arena: &mut Arena) -> BridgeResult<*mut raw::command> {
    let value = encode_body(&command.body, arena)?;
    let node = raw::command {
        type_: command.kind().tag(),
        flags: CommandFlag::encode(&command.flags) as c_int,
        line: 0,
        redirects: encode_redirect_list(&command.redirects, arena)?,
        value,
    };
    Ok(arena.alloc(node))
}

fn encode_body(body: &CommandBody, arena: &mut Arena) -> BridgeResult<raw::value> {
    Ok(match body {
        CommandBody::For(c) => raw::value {
            For: {
                let node = raw::for_com {
                    flags: CommandFlag::encode(&c.flags) as c_int,
                    line: c.line,
                    name: encode_word(&c.loop_var, arena)?,
                    map_list: encode_word_list(&c.items, arena)?,
                    action: encode_command(&c.body, arena)?,
                };
                arena.alloc(node)
            },
        },
        CommandBody::Case(c) => raw::value {
            Case: {
                let node = raw::case_com {
                    flags: CommandFlag::encode(&c.flags) as c_int,
                    line: c.line,
                    word: encode_word(&c.subject, arena)?,
                    clauses: encode_pattern_list(&c.clauses, arena)?,
                };
                arena.alloc(node)
            },
        },
        CommandBody::While(c) => raw::value {
            While: encode_while(&c.flags, &c.test, &c.body, arena)?,
        },
        CommandBody::Until(c) => raw::value {
            While: encode_while(&c.flags, &c.test, &c.body, arena)?,
        },
        CommandBody::If(c) => raw::value {
            If: {
                let node = raw::if_com {
                    flags: CommandFlag::encode(&c.flags) as c_int,
                    test: encode_command(&c.test, arena)?,
                    true_case: encode_command(&c.true_branch, arena)?,
                    // an absent else branch stays a null pointer
                    false_case: encode_opt_command(&c.false_branch, arena)?,
                };
                arena.alloc(node)
            },
        },
        CommandBody::Simple(c) => raw::value {
            Simple: {
                let node = raw::simple_com {
                    flags: CommandFlag::encode(&c.flags) as c_int,
                    line: c.line,
                    words: encode_word_list(&c.words, arena)?,
                    redirects: encode_redirect_list(&c.redirects, arena)?,
                };
                arena.alloc(node)
            },
        },
        CommandBody::Select(c) => raw::value {
            Select: {
                let node = raw::select_com {
                    flags: CommandFlag::encode(&c.flags) as c_int,
                    line: c.line,
                    name: encode_word(&c.loop_var, arena)?,
                    map_list: encode_word_list(&c.items, arena)?,
                    action: encode_command(&c.body, arena)?,
                };
                arena.alloc(node)
            },
        },
        CommandBody::Connection(c) => raw::value {
            Connection: {
                let node = raw::connection {
                    ignore: CommandFlag::encode(&c.flags) as c_int,
                    first: encode_command(&c.left, arena)?,
                    second: encode_opt_command(&c.right, arena)?,
                    connector: c.connector.raw(),
                };
                arena.alloc(node)
            },
        },
        CommandBody::FunctionDef(c) => raw::value {
            Function_def: {
                let source_file = match &c.source_file {
                    Some(path) => arena.alloc_text(path, "function_def source_file")?,
                    None => ptr::null_mut(),
                };
                let node = raw::function_def {
                    flags: CommandFlag::encode(&c.flags) as c_int,
                    line: c.line,
                    name: encode_word(&c.name, arena)?,
                    command: encode_command(&c.body, arena)?,
                    source_file,
                };
                arena.alloc(node)
            },
        },
        CommandBody::Group(c) => raw::value {
            Group: {
                let node = raw::group_com {
                    ignore: CommandFlag::encode(&c.flags) as c_int,
                    command: encode_command(&c.body, arena)?,
                };
                arena.alloc(node)
            },
        },
        CommandBody::Arithmetic(c) => raw::value {
            Arith: {
                let node = raw::arith_com {
                    flags: CommandFlag::encode(&c.flags) as c_int,
                    line: c.line,
                    exp: encode_word_list(&c.expr, arena)?,
                };
                arena.alloc(node)
            },
        },
        CommandBody::Conditional(c) => raw::value {
            Cond: encode_cond(c, arena)?,
        },
        CommandBody::ArithmeticFor(c) => raw::value {
            ArithFor: {
                let node = raw::arith_for_com {
                    flags: CommandFlag::encode(&c.flags) as c_int,
                    line: c.line,
                    init: encode_word_list(&c.init, arena)?,
                    test: encode_word_list(&c.test, arena)?,
                    step: encode_word_list(&c.step, arena)?,
                    action: encode_command(&c.body, arena)?,
                };
                arena.alloc(node)
            },
        },
        CommandBody::Subshell(c) => raw::value {
            Subshell: {
                let node = raw::subshell_com {
                    flags: CommandFlag::encode(&c.flags) as c_int,
                    line: c.line,
                    command: encode_command(&c.body, arena)?,
                };
                arena.alloc(node)
            },
        },
        CommandBody::Coprocess(c) => raw::value {
            Coproc: {
                let node = raw::coproc_com {
                    flags: CommandFlag::encode(&c.flags) as c_int,
                    name: arena.alloc_text(&c.name, "coproc name")?,
                    command: encode_command(&c.body, arena)?,
                };
                arena.alloc(node)
            },
        },
    })
}

/// `while` and `until` share the engine's struct; only the outer tag differs.
fn encode_while(
    flags: &[CommandFlag],
    test: &Command,
    body: &Command,
    arena: &mut Arena,
) -> BridgeResult<*mut raw::while_com> {
    let node = raw::while_com {
        flags: CommandFlag::encode(flags) as c_int,
        test: encode_command(test, arena)?,
        action: encode_command(body, arena)?,
    };
    Ok(arena.alloc(node))
}

fn encode_cond(cond: &CondExpr, arena: &mut Arena) -> BridgeResult<*mut raw::cond_com> {
    let left = match &cond.left {
        Some(child) => encode_cond(child, arena)?,
        None => ptr::null_mut(),
    };
    let right = match &cond.right {
        Some(child) => encode_cond(child, arena)?,
        None => ptr::null_mut(),
    };
    let node = raw::cond_com {
        flags: CommandFlag::encode(&cond.flags) as c_int,
        line: cond.line,
        type_: cond.op_kind.raw(),
        op: encode_word(&cond.operator, arena)?,
        left,
        right,
    };
    Ok(arena.alloc(node))
}

/// Build a null-terminated word list in forward order: allocate every cell,
/// then link them in one pass.
fn encode_word_list(words: &[WordDesc], arena: &mut Arena) -> BridgeResult<*mut raw::word_list> {
    let mut cells = Vec::with_capacity(words.len());
    for word in words {
        let word = encode_word(word, arena)?;
        cells.push(arena.alloc(raw::word_list {
            next: ptr::null_mut(),
            word,
        }));
    }
    for pair in cells.windows(2) {
        unsafe { (*pair[0]).next = pair[1] };
    }
    Ok(cells.first().copied().unwrap_or(ptr::null_mut()))
}

fn encode_redirect_list(
    redirects: &[Redirect],
    arena: &mut Arena,
) -> BridgeResult<*mut raw::redirect> {
    let mut cells = Vec::with_capacity(redirects.len());
    for redirect in redirects {
        let cell = encode_redirect(redirect, arena)?;
        cells.push(cell);
    }
    for pair in cells.windows(2) {
        unsafe { (*pair[0]).next = pair[1] };
    }
    Ok(cells.first().copied().unwrap_or(ptr::null_mut()))
}

fn encode_pattern_list(
    clauses: &[Pattern],
    arena: &mut Arena,
) -> BridgeResult<*mut raw::pattern_list> {
    let mut cells = Vec::with_capacity(clauses.len());
    for clause in clauses {
        let node = raw::pattern_list {
            next: ptr::null_mut(),
            patterns: encode_word_list(&clause.patterns, arena)?,
            action: encode_opt_command(&clause.action, arena)?,
            flags: PatternFlag::encode(&clause.flags) as c_int,
        };
        cells.push(arena.alloc(node));
    }
    for pair in cells.windows(2) {
        unsafe { (*pair[0]).next = pair[1] };
    }
    Ok(cells.first().copied().unwrap_or(ptr::null_mut()))
}

fn encode_redirect(redirect: &Redirect, arena: &mut Arena) -> BridgeResult<*mut raw::redirect> {
    // the fields are public, so the discrimination invariants are
    // re-checked before the union arms are written
    redirect.validate()?;
    let node = raw::redirect {
        next: ptr::null_mut(),
        redirector: encode_addressee(&redirect.redirector, arena)?,
        rflags: RedirectFlag::encode(&redirect.rflags) as c_int,
        flags: OpenFlag::encode(&redirect.oflags) as c_int,
        instruction: redirect.instruction.raw(),
        redirectee: encode_addressee(&redirect.redirectee, arena)?,
        here_doc_eof: match &redirect.here_doc_terminator {
            Some(terminator) => arena.alloc_text(terminator, "here_doc_eof")?,
            None => ptr::null_mut(),
        },
    };
    Ok(arena.alloc(node))
}

fn encode_addressee(addressee: &Addressee, arena: &mut Arena) -> BridgeResult<raw::REDIRECTEE> {
    Ok(match addressee {
        Addressee::Descriptor(dest) => raw::REDIRECTEE { dest: *dest },
        Addressee::Word(word) => raw::REDIRECTEE {
            filename: encode_word(word, arena)?,
        },
    })
}

fn encode_word(word: &WordDesc, arena: &mut Arena) -> BridgeResult<*mut raw::word_desc> {
    let text: *mut c_char = arena.alloc_text(&word.text, "word_desc word")?;
    let node = raw::word_desc {
        word: text,
        flags: WordFlag::encode(&word.flags) as c_int,
    };
    Ok(arena.alloc(node))
}

fn encode_opt_command(
    command: &Option<Box<Command>>,
    arena: &mut Arena,
) -> BridgeResult<*mut raw::command> {
    match command {
        Some(command) => encode_command(command, arena),
        None => Ok(ptr::null_mut()),
    }
}
