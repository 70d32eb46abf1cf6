//! Canonical JSON projection of command trees.
//!
//! A pure, deterministic rendering of a tree into nested
//! [`serde_json::Value`]s. Key names and flag/operator spellings follow the
//! engine bridge's established wire format (`map_list`, `true_case`,
//! `here_doc_eof`, ...), so projections stay comparable across
//! implementations.

use serde_json::{json, Value};

use crate::ast::flags::Flag;
use crate::ast::types::{
    Addressee, Command, CommandBody, CondExpr, Pattern, Redirect, WordDesc,
};

/// Project a whole parsed script.
pub fn ast_to_json(ast: &[Command]) -> Value {
    Value::Array(ast.iter().map(command_to_json).collect())
}

/// Project one command.
pub fn command_to_json(command: &Command) -> Value {
    json!({
        "type": command.kind().name(),
        "flags": flag_names(&command.flags),
        "redirects": redirects_to_json(&command.redirects),
        "value": body_to_json(&command.body),
    })
}

fn body_to_json(body: &CommandBody) -> Value {
    match body {
        CommandBody::For(c) => json!({
            "flags": flag_names(&c.flags),
            "line": c.line,
            "name": word_to_json(&c.loop_var),
            "map_list": words_to_json(&c.items),
            "action": command_to_json(&c.body),
        }),
        CommandBody::Case(c) => json!({
            "flags": flag_names(&c.flags),
            "line": c.line,
            "word": word_to_json(&c.subject),
            "clauses": c.clauses.iter().map(pattern_to_json).collect::<Vec<_>>(),
        }),
        CommandBody::While(c) => json!({
            "flags": flag_names(&c.flags),
            "test": command_to_json(&c.test),
            "action": command_to_json(&c.body),
        }),
        CommandBody::Until(c) => json!({
            "flags": flag_names(&c.flags),
            "test": command_to_json(&c.test),
            "action": command_to_json(&c.body),
        }),
        CommandBody::If(c) => json!({
            "flags": flag_names(&c.flags),
            "test": command_to_json(&c.test),
            "true_case": command_to_json(&c.true_branch),
            "false_case": opt_command_to_json(&c.false_branch),
        }),
        CommandBody::Simple(c) => json!({
            "flags": flag_names(&c.flags),
            "line": c.line,
            "words": words_to_json(&c.words),
            "redirects": redirects_to_json(&c.redirects),
        }),
        CommandBody::Select(c) => json!({
            "flags": flag_names(&c.flags),
            "line": c.line,
            "name": word_to_json(&c.loop_var),
            "map_list": words_to_json(&c.items),
            "action": command_to_json(&c.body),
        }),
        CommandBody::Connection(c) => json!({
            "ignore": flag_names(&c.flags),
            "first": command_to_json(&c.left),
            "second": opt_command_to_json(&c.right),
            "connector": c.connector.symbol(),
        }),
        CommandBody::FunctionDef(c) => json!({
            "flags": flag_names(&c.flags),
            "line": c.line,
            "name": word_to_json(&c.name),
            "command": command_to_json(&c.body),
            "source_file": c.source_file,
        }),
        CommandBody::Group(c) => json!({
            "ignore": flag_names(&c.flags),
            "command": command_to_json(&c.body),
        }),
        CommandBody::Arithmetic(c) => json!({
            "flags": flag_names(&c.flags),
            "line": c.line,
            "exp": words_to_json(&c.expr),
        }),
        CommandBody::Conditional(c) => cond_to_json(c),
        CommandBody::ArithmeticFor(c) => json!({
            "flags": flag_names(&c.flags),
            "line": c.line,
            "init": words_to_json(&c.init),
            "test": words_to_json(&c.test),
            "step": words_to_json(&c.step),
            "action": command_to_json(&c.body),
        }),
        CommandBody::Subshell(c) => json!({
            "flags": flag_names(&c.flags),
            "line": c.line,
            "command": command_to_json(&c.body),
        }),
        CommandBody::Coprocess(c) => json!({
            "flags": flag_names(&c.flags),
            "name": c.name,
            "command": command_to_json(&c.body),
        }),
    }
}

fn cond_to_json(cond: &CondExpr) -> Value {
    json!({
        "flags": flag_names(&cond.flags),
        "line": cond.line,
        "cond_type": cond.op_kind.name(),
        "op": word_to_json(&cond.operator),
        "left": cond.left.as_deref().map(cond_to_json),
        "right": cond.right.as_deref().map(cond_to_json),
    })
}

fn pattern_to_json(pattern: &Pattern) -> Value {
    json!({
        "patterns": words_to_json(&pattern.patterns),
        "action": opt_command_to_json(&pattern.action),
        "flags": flag_names(&pattern.flags),
    })
}

fn redirects_to_json(redirects: &[Redirect]) -> Value {
    Value::Array(redirects.iter().map(redirect_to_json).collect())
}

fn redirect_to_json(redirect: &Redirect) -> Value {
    json!({
        "redirector": addressee_to_json(&redirect.redirector),
        "rflags": flag_names(&redirect.rflags),
        "flags": flag_names(&redirect.oflags),
        "instruction": redirect.instruction.symbol(),
        "redirectee": addressee_to_json(&redirect.redirectee),
        "here_doc_eof": redirect.here_doc_terminator,
    })
}

fn addressee_to_json(addressee: &Addressee) -> Value {
    match addressee {
        Addressee::Descriptor(dest) => json!({ "dest": dest }),
        Addressee::Word(word) => json!({ "filename": word_to_json(word) }),
    }
}

fn words_to_json(words: &[WordDesc]) -> Value {
    Value::Array(words.iter().map(word_to_json).collect())
}

fn word_to_json(word: &WordDesc) -> Value {
    json!({
        "word": word.text,
        "flags": flag_names(&word.flags),
    })
}

fn opt_command_to_json(command: &Option<Box<Command>>) -> Value {
    match command {
        Some(command) => command_to_json(command),
        None => Value::Null,
    }
}

fn flag_names<F: Flag>(flags: &[F]) -> Value {
    Value::Array(
        flags
            .iter()
            .map(|flag| Value::String(flag.name().to_string()))
            .collect(),
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::flags::{OpenFlag, WordFlag};
    use crate::ast::types::{
        ConnectorKind, ForCommand, IfCommand, RedirInstruction, SimpleCommand,
    };

    fn simple(words: &[&str]) -> Command {
        Command::from_body(CommandBody::Simple(SimpleCommand {
            flags: vec![],
            line: 1,
            words: words.iter().map(|w| WordDesc::bare(*w)).collect(),
            redirects: vec![],
        }))
    }

    #[test]
    fn test_simple_with_redirect() {
        let redirect = Redirect::new(
            Addressee::Descriptor(1),
            vec![],
            vec![OpenFlag::WriteOnly, OpenFlag::Create, OpenFlag::Truncate],
            RedirInstruction::OutputDirection,
            Addressee::Word(WordDesc::bare("out.txt")),
            None,
        )
        .unwrap();
        let cmd = Command::new(
            vec![],
            vec![],
            CommandBody::Simple(SimpleCommand {
                flags: vec![],
                line: 1,
                words: vec![WordDesc::bare("echo"), WordDesc::bare("hello")],
                redirects: vec![redirect],
            }),
        );

        let v = command_to_json(&cmd);
        assert_eq!(v["type"], "simple");
        assert_eq!(v["value"]["words"][0]["word"], "echo");
        assert_eq!(v["value"]["words"][1]["word"], "hello");
        let r = &v["value"]["redirects"][0];
        assert_eq!(r["instruction"], ">");
        assert_eq!(r["redirector"]["dest"], 1);
        assert_eq!(r["redirectee"]["filename"]["word"], "out.txt");
        assert_eq!(r["here_doc_eof"], Value::Null);
        assert_eq!(r["flags"][0], "write_only");
    }

    #[test]
    fn test_for_loop_projection() {
        let cmd = Command::from_body(CommandBody::For(ForCommand {
            flags: vec![],
            line: 1,
            loop_var: WordDesc::bare("i"),
            items: vec![
                WordDesc::bare("a"),
                WordDesc::bare("b"),
                WordDesc::bare("c"),
            ],
            body: Box::new(simple(&["echo", "$i"])),
        }));

        let v = command_to_json(&cmd);
        assert_eq!(v["type"], "for");
        assert_eq!(v["value"]["name"]["word"], "i");
        assert_eq!(v["value"]["map_list"][2]["word"], "c");
        assert_eq!(v["value"]["action"]["type"], "simple");
    }

    #[test]
    fn test_if_without_else_projects_null() {
        let cmd = Command::from_body(CommandBody::If(IfCommand {
            flags: vec![],
            test: Box::new(simple(&["true"])),
            true_branch: Box::new(simple(&["echo", "yes"])),
            false_branch: None,
        }));
        let v = command_to_json(&cmd);
        assert_eq!(v["value"]["false_case"], Value::Null);
    }

    #[test]
    fn test_word_flags_use_wire_names() {
        let word = WordDesc::new("$x", vec![WordFlag::HasDollar]);
        let v = word_to_json(&word);
        assert_eq!(v["flags"][0], "has_dollar");
    }

    #[test]
    fn test_connection_projection() {
        let cmd = Command::from_body(CommandBody::Connection(
            crate::ast::types::ConnectionCommand {
                flags: vec![],
                left: Box::new(simple(&["true"])),
                right: Some(Box::new(simple(&["echo", "yes"]))),
                connector: ConnectorKind::AndAnd,
            },
        ));
        let v = command_to_json(&cmd);
        assert_eq!(v["value"]["connector"], "&&");
        assert_eq!(v["value"]["first"]["type"], "simple");
    }

    #[test]
    fn test_projection_is_deterministic() {
        let cmd = simple(&["echo", "hello"]);
        assert_eq!(command_to_json(&cmd), command_to_json(&cmd));
    }

    #[test]
    fn test_ast_to_json_is_array() {
        let script = vec![simple(&["true"]), simple(&["false"])];
        let v = ast_to_json(&script);
        assert_eq!(v.as_array().unwrap().len(), 2);
    }
}
