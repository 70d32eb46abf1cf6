//! Structural equality over command trees.
//!
//! Flag collections are always compared as multisets since flags have no
//! inherent order. Positional program data (argument words, map lists, case
//! clauses, redirect lists) is compared order-sensitively by default; the
//! reference bridge compared those as multisets too, which makes
//! `echo a b` equal to `echo b a`, so that behavior is kept available
//! behind an explicit [`Ordering`] choice instead of being the default.

use crate::ast::types::{
    Addressee, Command, CommandBody, CondExpr, Pattern, Redirect, WordDesc,
};

/// How positional sequences are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ordering {
    /// Order-sensitive comparison of words, clauses and redirect lists.
    #[default]
    Positional,
    /// Order-insensitive comparison, reproducing the reference behavior.
    Unordered,
}

/// Compare two parsed scripts with the default [`Ordering::Positional`].
pub fn ast_equals(a: &[Command], b: &[Command]) -> bool {
    ast_equals_with(a, b, Ordering::Positional)
}

/// Compare two parsed scripts with an explicit ordering choice.
/// Top-level commands are always compared pairwise in order.
pub fn ast_equals_with(a: &[Command], b: &[Command], ordering: Ordering) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| command_equal(x, y, ordering))
}

pub fn command_equal(a: &Command, b: &Command, ordering: Ordering) -> bool {
    multiset_equal(&a.flags, &b.flags)
        && seq_equal(&a.redirects, &b.redirects, ordering, |x, y| {
            redirect_equal(x, y)
        })
        && body_equal(&a.body, &b.body, ordering)
}

fn body_equal(a: &CommandBody, b: &CommandBody, ordering: Ordering) -> bool {
    use CommandBody::*;
    match (a, b) {
        (For(x), For(y)) => {
            multiset_equal(&x.flags, &y.flags)
                && word_equal(&x.loop_var, &y.loop_var)
                && words_equal(&x.items, &y.items, ordering)
                && command_equal(&x.body, &y.body, ordering)
        }
        (Case(x), Case(y)) => {
            multiset_equal(&x.flags, &y.flags)
                && word_equal(&x.subject, &y.subject)
                && seq_equal(&x.clauses, &y.clauses, ordering, |p, q| {
                    pattern_equal(p, q, ordering)
                })
        }
        (While(x), While(y)) => {
            multiset_equal(&x.flags, &y.flags)
                && command_equal(&x.test, &y.test, ordering)
                && command_equal(&x.body, &y.body, ordering)
        }
        (Until(x), Until(y)) => {
            multiset_equal(&x.flags, &y.flags)
                && command_equal(&x.test, &y.test, ordering)
                && command_equal(&x.body, &y.body, ordering)
        }
        (If(x), If(y)) => {
            multiset_equal(&x.flags, &y.flags)
                && command_equal(&x.test, &y.test, ordering)
                && command_equal(&x.true_branch, &y.true_branch, ordering)
                && opt_equal(&x.false_branch, &y.false_branch, |p, q| {
                    command_equal(p, q, ordering)
                })
        }
        (Simple(x), Simple(y)) => {
            multiset_equal(&x.flags, &y.flags)
                && words_equal(&x.words, &y.words, ordering)
                && seq_equal(&x.redirects, &y.redirects, ordering, |p, q| {
                    redirect_equal(p, q)
                })
        }
        (Select(x), Select(y)) => {
            multiset_equal(&x.flags, &y.flags)
                && word_equal(&x.loop_var, &y.loop_var)
                && words_equal(&x.items, &y.items, ordering)
                && command_equal(&x.body, &y.body, ordering)
        }
        (Connection(x), Connection(y)) => {
            x.connector == y.connector
                && multiset_equal(&x.flags, &y.flags)
                && command_equal(&x.left, &y.left, ordering)
                && opt_equal(&x.right, &y.right, |p, q| command_equal(p, q, ordering))
        }
        (FunctionDef(x), FunctionDef(y)) => {
            multiset_equal(&x.flags, &y.flags)
                && word_equal(&x.name, &y.name)
                && command_equal(&x.body, &y.body, ordering)
                && x.source_file == y.source_file
        }
        (Group(x), Group(y)) => {
            multiset_equal(&x.flags, &y.flags) && command_equal(&x.body, &y.body, ordering)
        }
        (Arithmetic(x), Arithmetic(y)) => {
            multiset_equal(&x.flags, &y.flags) && words_equal(&x.expr, &y.expr, ordering)
        }
        (Conditional(x), Conditional(y)) => cond_equal(x, y, ordering),
        (ArithmeticFor(x), ArithmeticFor(y)) => {
            multiset_equal(&x.flags, &y.flags)
                && words_equal(&x.init, &y.init, ordering)
                && words_equal(&x.test, &y.test, ordering)
                && words_equal(&x.step, &y.step, ordering)
                && command_equal(&x.body, &y.body, ordering)
        }
        (Subshell(x), Subshell(y)) => {
            multiset_equal(&x.flags, &y.flags) && command_equal(&x.body, &y.body, ordering)
        }
        (Coprocess(x), Coprocess(y)) => {
            multiset_equal(&x.flags, &y.flags)
                && x.name == y.name
                && command_equal(&x.body, &y.body, ordering)
        }
        _ => false,
    }
}

fn cond_equal(a: &CondExpr, b: &CondExpr, ordering: Ordering) -> bool {
    a.op_kind == b.op_kind
        && multiset_equal(&a.flags, &b.flags)
        && word_equal(&a.operator, &b.operator)
        && opt_equal(&a.left, &b.left, |p, q| cond_equal(p, q, ordering))
        && opt_equal(&a.right, &b.right, |p, q| cond_equal(p, q, ordering))
}

fn pattern_equal(a: &Pattern, b: &Pattern, ordering: Ordering) -> bool {
    multiset_equal(&a.flags, &b.flags)
        && seq_equal(&a.patterns, &b.patterns, ordering, word_equal)
        && opt_equal(&a.action, &b.action, |p, q| command_equal(p, q, ordering))
}

fn redirect_equal(a: &Redirect, b: &Redirect) -> bool {
    a.instruction == b.instruction
        && addressee_equal(&a.redirector, &b.redirector)
        && addressee_equal(&a.redirectee, &b.redirectee)
        && multiset_equal(&a.rflags, &b.rflags)
        && multiset_equal(&a.oflags, &b.oflags)
        && a.here_doc_terminator == b.here_doc_terminator
}

fn addressee_equal(a: &Addressee, b: &Addressee) -> bool {
    match (a, b) {
        (Addressee::Descriptor(x), Addressee::Descriptor(y)) => x == y,
        (Addressee::Word(x), Addressee::Word(y)) => word_equal(x, y),
        _ => false,
    }
}

fn word_equal(a: &WordDesc, b: &WordDesc) -> bool {
    a.text == b.text && multiset_equal(&a.flags, &b.flags)
}

fn words_equal(a: &[WordDesc], b: &[WordDesc], ordering: Ordering) -> bool {
    seq_equal(a, b, ordering, word_equal)
}

fn opt_equal<T>(a: &Option<Box<T>>, b: &Option<Box<T>>, eq: impl Fn(&T, &T) -> bool) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => eq(x, y),
        _ => false,
    }
}

fn seq_equal<T>(a: &[T], b: &[T], ordering: Ordering, eq: impl Fn(&T, &T) -> bool + Copy) -> bool {
    match ordering {
        Ordering::Positional => a.len() == b.len() && a.iter().zip(b).all(|(x, y)| eq(x, y)),
        Ordering::Unordered => multiset_equal_by(a, b, eq),
    }
}

fn multiset_equal<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    multiset_equal_by(a, b, |x, y| x == y)
}

/// Match every element of `a` against a distinct element of `b`.
fn multiset_equal_by<T>(a: &[T], b: &[T], eq: impl Fn(&T, &T) -> bool) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut unmatched: Vec<&T> = b.iter().collect();
    for x in a {
        match unmatched.iter().position(|y| eq(x, y)) {
            Some(i) => {
                unmatched.swap_remove(i);
            }
            None => return false,
        }
    }
    true
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::flags::{CommandFlag, WordFlag};
    use crate::ast::types::SimpleCommand;

    fn simple(words: &[&str]) -> Command {
        Command::from_body(CommandBody::Simple(SimpleCommand {
            flags: vec![],
            line: 0,
            words: words.iter().map(|w| WordDesc::bare(*w)).collect(),
            redirects: vec![],
        }))
    }

    #[test]
    fn test_identical_trees_are_equal() {
        let a = simple(&["echo", "a", "b"]);
        let b = simple(&["echo", "a", "b"]);
        assert!(ast_equals(&[a], &[b]));
    }

    #[test]
    fn test_word_order_matters_positionally() {
        let a = simple(&["echo", "a", "b"]);
        let b = simple(&["echo", "b", "a"]);
        assert!(!ast_equals(&[a.clone()], &[b.clone()]));
        // the reference behavior treats the argument list as a multiset
        assert!(ast_equals_with(&[a], &[b], Ordering::Unordered));
    }

    #[test]
    fn test_flag_order_never_matters() {
        let mut a = simple(&["echo"]);
        let mut b = simple(&["echo"]);
        a.flags = vec![CommandFlag::InvertReturn, CommandFlag::Ampersand];
        b.flags = vec![CommandFlag::Ampersand, CommandFlag::InvertReturn];
        assert!(ast_equals(&[a], &[b]));
    }

    #[test]
    fn test_word_flag_order_never_matters() {
        let a = Command::from_body(CommandBody::Simple(SimpleCommand {
            flags: vec![],
            line: 0,
            words: vec![WordDesc::new(
                "$x",
                vec![WordFlag::HasDollar, WordFlag::Quoted],
            )],
            redirects: vec![],
        }));
        let b = Command::from_body(CommandBody::Simple(SimpleCommand {
            flags: vec![],
            line: 0,
            words: vec![WordDesc::new(
                "$x",
                vec![WordFlag::Quoted, WordFlag::HasDollar],
            )],
            redirects: vec![],
        }));
        assert!(ast_equals(&[a], &[b]));
    }

    #[test]
    fn test_different_kinds_never_equal() {
        let a = simple(&["true"]);
        let b = Command::from_body(CommandBody::Group(crate::ast::types::GroupCommand {
            flags: vec![],
            body: Box::new(simple(&["true"])),
        }));
        assert!(!ast_equals(&[a], &[b]));
    }

    #[test]
    fn test_length_mismatch() {
        let a = simple(&["echo"]);
        assert!(!ast_equals(&[a.clone(), a.clone()], &[a]));
    }

    #[test]
    fn test_multiset_does_not_double_count() {
        // [x, x] vs [x, y] must not match x against the same element twice
        let a = simple(&["echo", "x", "x"]);
        let b = simple(&["echo", "x", "y"]);
        assert!(!ast_equals_with(&[a], &[b], Ordering::Unordered));
    }
}
