//! Reconstruction of owned command trees from the engine's pointer graphs.
//!
//! A single recursive descent keyed on the foreign type tag. Null-terminated
//! linked lists become `Vec`s with an iterative walk; discriminated unions
//! are read through the arm their discriminator selects. A tag outside the
//! known kinds fails closed with `UnsupportedConstruct` — silent data loss
//! would defeat a round-trip tool. Required pointers that turn out null are
//! `MalformedUnion`, named after the offending field.

use std::ffi::CStr;

use libc::c_char;

use crate::ast::flags::{CommandFlag, Flag, OpenFlag, PatternFlag, RedirectFlag, WordFlag};
use crate::ast::types::{
    Addressee, ArithForCommand, ArithmeticCommand, CaseCommand, Command, CommandBody, CommandKind,
    CondExpr, CondKind, ConnectionCommand, ConnectorKind, CoprocCommand, ForCommand,
    FunctionDefCommand, GroupCommand, IfCommand, Pattern, Redirect, RedirInstruction,
    SelectCommand, SimpleCommand, SubshellCommand, UntilCommand, WhileCommand, WordDesc,
};
use crate::error::{BridgeError, BridgeResult};
use crate::ffi::raw;

/// Decode one parsed command from the engine's graph.
///
/// # Safety
///
/// `command` must point to a well-formed graph produced by the engine, and
/// the graph must stay untouched for the duration of the call.
pub unsafe fn decode_command(command: *const raw::command) -> BridgeResult<Command> {
    let command = deref(command, "command")?;
    let kind = CommandKind::from_tag(command.type_)?;
    Ok(Command {
        flags: CommandFlag::decode(command.flags as u32),
        redirects: decode_redirect_list(command.redirects)?,
        body: decode_body(kind, &command.value)?,
    })
}

unsafe fn decode_body(kind: CommandKind, value: &raw::value) -> BridgeResult<CommandBody> {
    match kind {
        CommandKind::For => {
            let c = deref(value.For, "for body")?;
            Ok(CommandBody::For(ForCommand {
                flags: CommandFlag::decode(c.flags as u32),
                line: c.line,
                loop_var: decode_word_ptr(c.name, "for name")?,
                items: decode_word_list(c.map_list)?,
                body: decode_child(c.action, "for action")?,
            }))
        }
        CommandKind::Case => {
            let c = deref(value.Case, "case body")?;
            Ok(CommandBody::Case(CaseCommand {
                flags: CommandFlag::decode(c.flags as u32),
                line: c.line,
                subject: decode_word_ptr(c.word, "case word")?,
                clauses: decode_pattern_list(c.clauses)?,
            }))
        }
        CommandKind::While => {
            let c = deref(value.While, "while body")?;
            Ok(CommandBody::While(WhileCommand {
                flags: CommandFlag::decode(c.flags as u32),
                test: decode_child(c.test, "while test")?,
                body: decode_child(c.action, "while action")?,
            }))
        }
        // until shares the while struct; only the outer tag differs
        CommandKind::Until => {
            let c = deref(value.While, "until body")?;
            Ok(CommandBody::Until(UntilCommand {
                flags: CommandFlag::decode(c.flags as u32),
                test: decode_child(c.test, "until test")?,
                body: decode_child(c.action, "until action")?,
            }))
        }
        CommandKind::If => {
            let c = deref(value.If, "if body")?;
            Ok(CommandBody::If(IfCommand {
                flags: CommandFlag::decode(c.flags as u32),
                test: decode_child(c.test, "if test")?,
                true_branch: decode_child(c.true_case, "if true_case")?,
                false_branch: decode_opt_child(c.false_case)?,
            }))
        }
        CommandKind::Simple => {
            let c = deref(value.Simple, "simple body")?;
            Ok(CommandBody::Simple(SimpleCommand {
                flags: CommandFlag::decode(c.flags as u32),
                line: c.line,
                words: decode_word_list(c.words)?,
                redirects: decode_redirect_list(c.redirects)?,
            }))
        }
        CommandKind::Select => {
            let c = deref(value.Select, "select body")?;
            Ok(CommandBody::Select(SelectCommand {
                flags: CommandFlag::decode(c.flags as u32),
                line: c.line,
                loop_var: decode_word_ptr(c.name, "select name")?,
                items: decode_word_list(c.map_list)?,
                body: decode_child(c.action, "select action")?,
            }))
        }
        CommandKind::Connection => {
            let c = deref(value.Connection, "connection body")?;
            Ok(CommandBody::Connection(ConnectionCommand {
                flags: CommandFlag::decode(c.ignore as u32),
                left: decode_child(c.first, "connection first")?,
                right: decode_opt_child(c.second)?,
                connector: ConnectorKind::from_raw(c.connector)?,
            }))
        }
        CommandKind::FunctionDef => {
            let c = deref(value.Function_def, "function_def body")?;
            Ok(CommandBody::FunctionDef(FunctionDefCommand {
                flags: CommandFlag::decode(c.flags as u32),
                line: c.line,
                name: decode_word_ptr(c.name, "function_def name")?,
                body: decode_child(c.command, "function_def command")?,
                source_file: decode_opt_text(c.source_file, "function_def source_file")?,
            }))
        }
        CommandKind::Group => {
            let c = deref(value.Group, "group body")?;
            Ok(CommandBody::Group(GroupCommand {
                flags: CommandFlag::decode(c.ignore as u32),
                body: decode_child(c.command, "group command")?,
            }))
        }
        CommandKind::Arithmetic => {
            let c = deref(value.Arith, "arith body")?;
            Ok(CommandBody::Arithmetic(ArithmeticCommand {
                flags: CommandFlag::decode(c.flags as u32),
                line: c.line,
                expr: decode_word_list(c.exp)?,
            }))
        }
        CommandKind::Conditional => {
            let c = deref(value.Cond, "cond body")?;
            Ok(CommandBody::Conditional(decode_cond(c)?))
        }
        CommandKind::ArithmeticFor => {
            let c = deref(value.ArithFor, "arith_for body")?;
            Ok(CommandBody::ArithmeticFor(ArithForCommand {
                flags: CommandFlag::decode(c.flags as u32),
                line: c.line,
                init: decode_word_list(c.init)?,
                test: decode_word_list(c.test)?,
                step: decode_word_list(c.step)?,
                body: decode_child(c.action, "arith_for action")?,
            }))
        }
        CommandKind::Subshell => {
            let c = deref(value.Subshell, "subshell body")?;
            Ok(CommandBody::Subshell(SubshellCommand {
                flags: CommandFlag::decode(c.flags as u32),
                line: c.line,
                body: decode_child(c.command, "subshell command")?,
            }))
        }
        CommandKind::Coprocess => {
            let c = deref(value.Coproc, "coproc body")?;
            Ok(CommandBody::Coprocess(CoprocCommand {
                flags: CommandFlag::decode(c.flags as u32),
                name: decode_text(require(c.name, "coproc name")?, "coproc name")?,
                body: decode_child(c.command, "coproc command")?,
            }))
        }
    }
}

unsafe fn decode_cond(cond: &raw::cond_com) -> BridgeResult<CondExpr> {
    Ok(CondExpr {
        flags: CommandFlag::decode(cond.flags as u32),
        line: cond.line,
        op_kind: CondKind::from_raw(cond.type_)?,
        operator: decode_word_ptr(cond.op, "cond op")?,
        left: if cond.left.is_null() {
            None
        } else {
            Some(Box::new(decode_cond(deref(cond.left, "cond left")?)?))
        },
        right: if cond.right.is_null() {
            None
        } else {
            Some(Box::new(decode_cond(deref(cond.right, "cond right")?)?))
        },
    })
}

/// Walk a null-terminated word list into an ordered sequence.
/// A null head is the empty sequence, not an error.
unsafe fn decode_word_list(head: *mut raw::word_list) -> BridgeResult<Vec<WordDesc>> {
    let mut words = Vec::new();
    let mut node = head as *const raw::word_list;
    while let Some(cell) = node.as_ref() {
        words.push(decode_word_ptr(cell.word, "word_list word")?);
        node = cell.next;
    }
    Ok(words)
}

unsafe fn decode_redirect_list(head: *mut raw::redirect) -> BridgeResult<Vec<Redirect>> {
    let mut redirects = Vec::new();
    let mut node = head as *const raw::redirect;
    while let Some(cell) = node.as_ref() {
        redirects.push(decode_redirect(cell)?);
        node = cell.next;
    }
    Ok(redirects)
}

unsafe fn decode_pattern_list(head: *mut raw::pattern_list) -> BridgeResult<Vec<Pattern>> {
    let mut clauses = Vec::new();
    let mut node = head as *const raw::pattern_list;
    while let Some(cell) = node.as_ref() {
        clauses.push(Pattern {
            patterns: decode_word_list(cell.patterns)?,
            action: decode_opt_child(cell.action)?,
            flags: PatternFlag::decode(cell.flags as u32),
        });
        node = cell.next;
    }
    Ok(clauses)
}

unsafe fn decode_redirect(redirect: &raw::redirect) -> BridgeResult<Redirect> {
    let rflags = RedirectFlag::decode(redirect.rflags as u32);
    let instruction = RedirInstruction::from_raw(redirect.instruction)?;

    // which union arm is live is decided by the discriminators, exactly as
    // the engine's printer reads them
    let redirector = if rflags.contains(&RedirectFlag::VarAssign) {
        Addressee::Word(decode_word_ptr(
            redirect.redirector.filename,
            "redirector filename",
        )?)
    } else {
        Addressee::Descriptor(redirect.redirector.dest)
    };
    let redirectee = if instruction.takes_descriptor() {
        Addressee::Descriptor(redirect.redirectee.dest)
    } else {
        Addressee::Word(decode_word_ptr(
            redirect.redirectee.filename,
            "redirectee filename",
        )?)
    };

    Redirect::new(
        redirector,
        rflags,
        OpenFlag::decode(redirect.flags as u32),
        instruction,
        redirectee,
        decode_opt_text(redirect.here_doc_eof, "here_doc_eof")?,
    )
}

unsafe fn decode_word_ptr(
    word: *mut raw::word_desc,
    what: &'static str,
) -> BridgeResult<WordDesc> {
    let word = deref(word, what)?;
    Ok(WordDesc {
        text: decode_text(require(word.word, "word_desc word")?, "word_desc word")?,
        flags: WordFlag::decode(word.flags as u32),
    })
}

unsafe fn decode_child(
    command: *mut raw::command,
    what: &'static str,
) -> BridgeResult<Box<Command>> {
    require(command, what)?;
    Ok(Box::new(decode_command(command)?))
}

unsafe fn decode_opt_child(command: *mut raw::command) -> BridgeResult<Option<Box<Command>>> {
    if command.is_null() {
        Ok(None)
    } else {
        Ok(Some(Box::new(decode_command(command)?)))
    }
}

unsafe fn decode_text(text: *const c_char, what: &'static str) -> BridgeResult<String> {
    CStr::from_ptr(text)
        .to_str()
        .map(str::to_owned)
        .map_err(|source| BridgeError::BadText { what, source })
}

unsafe fn decode_opt_text(
    text: *const c_char,
    what: &'static str,
) -> BridgeResult<Option<String>> {
    if text.is_null() {
        Ok(None)
    } else {
        decode_text(text, what).map(Some)
    }
}

unsafe fn deref<'a, T>(ptr: *const T, what: &'static str) -> BridgeResult<&'a T> {
    ptr.as_ref()
        .ok_or(BridgeError::MalformedUnion { what })
}

fn require<T>(ptr: *mut T, what: &'static str) -> BridgeResult<*mut T> {
    if ptr.is_null() {
        Err(BridgeError::MalformedUnion { what })
    } else {
        Ok(ptr)
    }
}
