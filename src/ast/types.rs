//! Abstract Syntax Tree (AST) Types for Bash
//!
//! This module defines the owned command tree for bash scripts. The shapes
//! mirror the engine's command structs, with two deliberate departures: the
//! C-style "N nullable fields, exactly one non-null" unions become real sum
//! types ([`CommandBody`], [`Addressee`]), and raw flag integers become
//! typed sets. A tree is built once from a single read of the engine's
//! output and never mutated afterward; every child is exclusively owned, so
//! the tree is acyclic by construction.

use crate::ast::flags::{CommandFlag, OpenFlag, PatternFlag, RedirectFlag, WordFlag};
use crate::error::{BridgeError, BridgeResult};

// =============================================================================
// DISCRIMINANTS
// =============================================================================

/// Command type tags, numbered exactly as the engine numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum CommandKind {
    For = 0,
    Case = 1,
    While = 2,
    If = 3,
    Simple = 4,
    Select = 5,
    Connection = 6,
    FunctionDef = 7,
    Until = 8,
    Group = 9,
    Arithmetic = 10,
    Conditional = 11,
    ArithmeticFor = 12,
    Subshell = 13,
    Coprocess = 14,
}

impl CommandKind {
    /// Map a foreign type tag to a kind; anything outside 0..=14 fails
    /// closed rather than producing a default variant.
    pub fn from_tag(tag: i32) -> BridgeResult<Self> {
        match tag {
            0 => Ok(Self::For),
            1 => Ok(Self::Case),
            2 => Ok(Self::While),
            3 => Ok(Self::If),
            4 => Ok(Self::Simple),
            5 => Ok(Self::Select),
            6 => Ok(Self::Connection),
            7 => Ok(Self::FunctionDef),
            8 => Ok(Self::Until),
            9 => Ok(Self::Group),
            10 => Ok(Self::Arithmetic),
            11 => Ok(Self::Conditional),
            12 => Ok(Self::ArithmeticFor),
            13 => Ok(Self::Subshell),
            14 => Ok(Self::Coprocess),
            tag => Err(BridgeError::UnsupportedConstruct { tag }),
        }
    }

    pub fn tag(self) -> i32 {
        self as i32
    }

    /// Name used by the JSON projection.
    pub fn name(self) -> &'static str {
        match self {
            Self::For => "for",
            Self::Case => "case",
            Self::While => "while",
            Self::If => "if",
            Self::Simple => "simple",
            Self::Select => "select",
            Self::Connection => "connection",
            Self::FunctionDef => "function_def",
            Self::Until => "until",
            Self::Group => "group",
            Self::Arithmetic => "arithmetic",
            Self::Conditional => "conditional",
            Self::ArithmeticFor => "arithmetic_for",
            Self::Subshell => "subshell",
            Self::Coprocess => "coproc",
        }
    }
}

/// The 20 redirection instructions the grammar can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum RedirInstruction {
    /// >foo
    OutputDirection = 0,
    /// <foo
    InputDirection = 1,
    /// the implicit </dev/null on `foo &`
    InputADirection = 2,
    /// >>foo
    AppendingTo = 3,
    /// <<foo
    ReadingUntil = 4,
    /// <<<foo
    ReadingString = 5,
    /// 1<&2
    DuplicatingInput = 6,
    /// 1>&2
    DuplicatingOutput = 7,
    /// <<-foo
    DeblankReadingUntil = 8,
    /// <&-
    CloseThis = 9,
    /// &>filename
    ErrAndOut = 10,
    /// <>foo
    InputOutput = 11,
    /// >|foo
    OutputForce = 12,
    /// 1<&$foo
    DuplicatingInputWord = 13,
    /// 1>&$foo
    DuplicatingOutputWord = 14,
    /// 1<&2-
    MoveInput = 15,
    /// 1>&2-
    MoveOutput = 16,
    /// 1<&$foo-
    MoveInputWord = 17,
    /// 1>&$foo-
    MoveOutputWord = 18,
    /// &>>filename
    AppendErrAndOut = 19,
}

impl RedirInstruction {
    pub fn from_raw(value: i32) -> BridgeResult<Self> {
        match value {
            0 => Ok(Self::OutputDirection),
            1 => Ok(Self::InputDirection),
            2 => Ok(Self::InputADirection),
            3 => Ok(Self::AppendingTo),
            4 => Ok(Self::ReadingUntil),
            5 => Ok(Self::ReadingString),
            6 => Ok(Self::DuplicatingInput),
            7 => Ok(Self::DuplicatingOutput),
            8 => Ok(Self::DeblankReadingUntil),
            9 => Ok(Self::CloseThis),
            10 => Ok(Self::ErrAndOut),
            11 => Ok(Self::InputOutput),
            12 => Ok(Self::OutputForce),
            13 => Ok(Self::DuplicatingInputWord),
            14 => Ok(Self::DuplicatingOutputWord),
            15 => Ok(Self::MoveInput),
            16 => Ok(Self::MoveOutput),
            17 => Ok(Self::MoveInputWord),
            18 => Ok(Self::MoveOutputWord),
            19 => Ok(Self::AppendErrAndOut),
            value => Err(BridgeError::UnknownInstruction { value }),
        }
    }

    pub fn raw(self) -> i32 {
        self as i32
    }

    /// Instructions whose redirectee is a file descriptor rather than a word.
    pub fn takes_descriptor(self) -> bool {
        matches!(
            self,
            Self::DuplicatingInput
                | Self::DuplicatingOutput
                | Self::CloseThis
                | Self::MoveInput
                | Self::MoveOutput
        )
    }

    /// Operator spelling used by the JSON projection.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::OutputDirection => ">",
            Self::InputDirection => "<",
            Self::InputADirection => "&",
            Self::AppendingTo => ">>",
            Self::ReadingUntil => "<<",
            Self::ReadingString => "<<<",
            Self::DuplicatingInput => "<&",
            Self::DuplicatingOutput => ">&",
            Self::DeblankReadingUntil => "<<-",
            Self::CloseThis => "<&-",
            Self::ErrAndOut => "&>",
            Self::InputOutput => "<>",
            Self::OutputForce => ">|",
            Self::DuplicatingInputWord => "<&$",
            Self::DuplicatingOutputWord => ">&$",
            Self::MoveInput => "<&-",
            Self::MoveOutput => ">&-",
            Self::MoveInputWord => "<&$-",
            Self::MoveOutputWord => ">&$-",
            Self::AppendErrAndOut => "&>>",
        }
    }
}

/// How the two sides of a connection are joined.
///
/// The engine stores the lexer's token value directly, which is why the
/// discriminants look arbitrary: the single-character connectors are ASCII
/// codes and the double-character ones are token numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ConnectorKind {
    Ampersand = 38,
    Semicolon = 59,
    Newline = 10,
    Pipe = 124,
    AndAnd = 288,
    OrOr = 289,
}

impl ConnectorKind {
    /// Closed over the six known values; anything else is a hard decode
    /// error, never a silently-accepted unknown.
    pub fn from_raw(value: i32) -> BridgeResult<Self> {
        match value {
            38 => Ok(Self::Ampersand),
            59 => Ok(Self::Semicolon),
            10 => Ok(Self::Newline),
            124 => Ok(Self::Pipe),
            288 => Ok(Self::AndAnd),
            289 => Ok(Self::OrOr),
            value => Err(BridgeError::UnknownConnector { value }),
        }
    }

    pub fn raw(self) -> i32 {
        self as i32
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Ampersand => "&",
            Self::Semicolon => ";",
            Self::Newline => "\n",
            Self::Pipe => "|",
            Self::AndAnd => "&&",
            Self::OrOr => "||",
        }
    }
}

/// Node shapes inside a `[[ ]]` conditional expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum CondKind {
    And = 0,
    Or = 1,
    Unary = 2,
    Binary = 3,
    Term = 4,
    Expr = 5,
}

impl CondKind {
    pub fn from_raw(value: i32) -> BridgeResult<Self> {
        match value {
            0 => Ok(Self::And),
            1 => Ok(Self::Or),
            2 => Ok(Self::Unary),
            3 => Ok(Self::Binary),
            4 => Ok(Self::Term),
            5 => Ok(Self::Expr),
            value => Err(BridgeError::UnknownCondKind { value }),
        }
    }

    pub fn raw(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Unary => "unary",
            Self::Binary => "binary",
            Self::Term => "term",
            Self::Expr => "expression",
        }
    }
}

// =============================================================================
// PRIMITIVE NODES
// =============================================================================

/// A single word as the grammar saw it: text plus word flags.
///
/// The text may carry the engine's embedded control bytes; quoted-null
/// markers are expressed through flags, not literal encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct WordDesc {
    pub text: String,
    pub flags: Vec<WordFlag>,
}

impl WordDesc {
    pub fn new(text: impl Into<String>, flags: Vec<WordFlag>) -> Self {
        Self {
            text: text.into(),
            flags,
        }
    }

    /// A word with no flags set.
    pub fn bare(text: impl Into<String>) -> Self {
        Self::new(text, Vec::new())
    }
}

/// A redirection endpoint: either a file descriptor or a word.
#[derive(Debug, Clone, PartialEq)]
pub enum Addressee {
    Descriptor(i32),
    Word(WordDesc),
}

/// A redirection such as `>`, `>>`, `<`, `<<`.
///
/// The two [`Addressee`] fields are discriminated: `redirector` is a word
/// iff [`RedirectFlag::VarAssign`] is set, and `redirectee` is a descriptor
/// iff the instruction duplicates, closes or moves an fd. [`Redirect::new`]
/// enforces both rules.
#[derive(Debug, Clone, PartialEq)]
pub struct Redirect {
    /// The thing being redirected
    pub redirector: Addressee,
    pub rflags: Vec<RedirectFlag>,
    pub oflags: Vec<OpenFlag>,
    pub instruction: RedirInstruction,
    /// The thing being redirected to
    pub redirectee: Addressee,
    /// The delimiter word of a here-document, if any
    pub here_doc_terminator: Option<String>,
}

impl Redirect {
    pub fn new(
        redirector: Addressee,
        rflags: Vec<RedirectFlag>,
        oflags: Vec<OpenFlag>,
        instruction: RedirInstruction,
        redirectee: Addressee,
        here_doc_terminator: Option<String>,
    ) -> BridgeResult<Self> {
        let redirect = Self {
            redirector,
            rflags,
            oflags,
            instruction,
            redirectee,
            here_doc_terminator,
        };
        redirect.validate()?;
        Ok(redirect)
    }

    /// Check the discrimination invariants. The encoder re-checks these
    /// since the fields are public.
    pub fn validate(&self) -> BridgeResult<()> {
        let var_assign = self.rflags.contains(&RedirectFlag::VarAssign);
        match (&self.redirector, var_assign) {
            (Addressee::Word(_), true) | (Addressee::Descriptor(_), false) => {}
            (Addressee::Word(_), false) => {
                return Err(BridgeError::MalformedUnion {
                    what: "redirector is a word but var_assign is not set",
                })
            }
            (Addressee::Descriptor(_), true) => {
                return Err(BridgeError::MalformedUnion {
                    what: "var_assign is set but redirector is a descriptor",
                })
            }
        }
        match (&self.redirectee, self.instruction.takes_descriptor()) {
            (Addressee::Descriptor(_), true) | (Addressee::Word(_), false) => Ok(()),
            (Addressee::Word(_), true) => Err(BridgeError::MalformedUnion {
                what: "instruction expects a descriptor redirectee but got a word",
            }),
            (Addressee::Descriptor(_), false) => Err(BridgeError::MalformedUnion {
                what: "instruction expects a word redirectee but got a descriptor",
            }),
        }
    }
}

// =============================================================================
// COMMAND TREE
// =============================================================================

/// One top-level or nested command.
///
/// The kind tag is derived from the body instead of stored beside it, so a
/// tag/body mismatch cannot be represented.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub flags: Vec<CommandFlag>,
    pub redirects: Vec<Redirect>,
    pub body: CommandBody,
}

impl Command {
    pub fn new(flags: Vec<CommandFlag>, redirects: Vec<Redirect>, body: CommandBody) -> Self {
        Self {
            flags,
            redirects,
            body,
        }
    }

    /// A command with no outer flags or redirects, just a body.
    pub fn from_body(body: CommandBody) -> Self {
        Self::new(Vec::new(), Vec::new(), body)
    }

    pub fn kind(&self) -> CommandKind {
        self.body.kind()
    }
}

/// The form-specific payload of a [`Command`], one variant per kind.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandBody {
    For(ForCommand),
    Case(CaseCommand),
    While(WhileCommand),
    If(IfCommand),
    Simple(SimpleCommand),
    Select(SelectCommand),
    Connection(ConnectionCommand),
    FunctionDef(FunctionDefCommand),
    Until(UntilCommand),
    Group(GroupCommand),
    Arithmetic(ArithmeticCommand),
    Conditional(CondExpr),
    ArithmeticFor(ArithForCommand),
    Subshell(SubshellCommand),
    Coprocess(CoprocCommand),
}

impl CommandBody {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::For(_) => CommandKind::For,
            Self::Case(_) => CommandKind::Case,
            Self::While(_) => CommandKind::While,
            Self::If(_) => CommandKind::If,
            Self::Simple(_) => CommandKind::Simple,
            Self::Select(_) => CommandKind::Select,
            Self::Connection(_) => CommandKind::Connection,
            Self::FunctionDef(_) => CommandKind::FunctionDef,
            Self::Until(_) => CommandKind::Until,
            Self::Group(_) => CommandKind::Group,
            Self::Arithmetic(_) => CommandKind::Arithmetic,
            Self::Conditional(_) => CommandKind::Conditional,
            Self::ArithmeticFor(_) => CommandKind::ArithmeticFor,
            Self::Subshell(_) => CommandKind::Subshell,
            Self::Coprocess(_) => CommandKind::Coprocess,
        }
    }
}

/// for NAME in WORDS; do ...; done
#[derive(Debug, Clone, PartialEq)]
pub struct ForCommand {
    pub flags: Vec<CommandFlag>,
    pub line: i32,
    /// The variable bound on each iteration
    pub loop_var: WordDesc,
    /// The words mapped over
    pub items: Vec<WordDesc>,
    pub body: Box<Command>,
}

/// case WORD in PATTERN) ...;; esac
#[derive(Debug, Clone, PartialEq)]
pub struct CaseCommand {
    pub flags: Vec<CommandFlag>,
    pub line: i32,
    /// The word matched against the clauses
    pub subject: WordDesc,
    pub clauses: Vec<Pattern>,
}

/// One clause of a case command.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub patterns: Vec<WordDesc>,
    /// Null in the engine when the clause body is empty
    pub action: Option<Box<Command>>,
    pub flags: Vec<PatternFlag>,
}

/// while TEST; do BODY; done
#[derive(Debug, Clone, PartialEq)]
pub struct WhileCommand {
    pub flags: Vec<CommandFlag>,
    pub test: Box<Command>,
    pub body: Box<Command>,
}

/// until TEST; do BODY; done — same payload shape as while.
#[derive(Debug, Clone, PartialEq)]
pub struct UntilCommand {
    pub flags: Vec<CommandFlag>,
    pub test: Box<Command>,
    pub body: Box<Command>,
}

/// if TEST; then ...; else ...; fi
#[derive(Debug, Clone, PartialEq)]
pub struct IfCommand {
    pub flags: Vec<CommandFlag>,
    pub test: Box<Command>,
    pub true_branch: Box<Command>,
    /// None when there is no else clause; must stay None through a
    /// round-trip (no empty else branch is ever synthesized)
    pub false_branch: Option<Box<Command>>,
}

/// Two commands joined by a connector token.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionCommand {
    pub flags: Vec<CommandFlag>,
    pub left: Box<Command>,
    /// Null in the engine for a trailing `&` with nothing after it
    pub right: Option<Box<Command>>,
    pub connector: ConnectorKind,
}

/// Program name, arguments and assignments, with redirections.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleCommand {
    pub flags: Vec<CommandFlag>,
    pub line: i32,
    pub words: Vec<WordDesc>,
    pub redirects: Vec<Redirect>,
}

/// name() { ... }
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefCommand {
    pub flags: Vec<CommandFlag>,
    pub line: i32,
    pub name: WordDesc,
    pub body: Box<Command>,
    /// The file the function was defined in, if known
    pub source_file: Option<String>,
}

/// { ...; } — lets redirects and pipes apply to a group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupCommand {
    pub flags: Vec<CommandFlag>,
    pub body: Box<Command>,
}

/// select NAME in WORDS; do ...; done
#[derive(Debug, Clone, PartialEq)]
pub struct SelectCommand {
    pub flags: Vec<CommandFlag>,
    pub line: i32,
    pub loop_var: WordDesc,
    pub items: Vec<WordDesc>,
    pub body: Box<Command>,
}

/// (( EXPR ))
#[derive(Debug, Clone, PartialEq)]
pub struct ArithmeticCommand {
    pub flags: Vec<CommandFlag>,
    pub line: i32,
    pub expr: Vec<WordDesc>,
}

/// A node of a `[[ ]]` conditional expression tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CondExpr {
    pub flags: Vec<CommandFlag>,
    pub line: i32,
    pub op_kind: CondKind,
    pub operator: WordDesc,
    pub left: Option<Box<CondExpr>>,
    pub right: Option<Box<CondExpr>>,
}

/// for (( INIT; TEST; STEP )); do ...; done
#[derive(Debug, Clone, PartialEq)]
pub struct ArithForCommand {
    pub flags: Vec<CommandFlag>,
    pub line: i32,
    pub init: Vec<WordDesc>,
    pub test: Vec<WordDesc>,
    pub step: Vec<WordDesc>,
    pub body: Box<Command>,
}

/// ( ... )
#[derive(Debug, Clone, PartialEq)]
pub struct SubshellCommand {
    pub flags: Vec<CommandFlag>,
    pub line: i32,
    pub body: Box<Command>,
}

/// coproc NAME { ... }
#[derive(Debug, Clone, PartialEq)]
pub struct CoprocCommand {
    pub flags: Vec<CommandFlag>,
    pub name: String,
    pub body: Box<Command>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn word_redirectee(text: &str) -> Addressee {
        Addressee::Word(WordDesc::bare(text))
    }

    #[test]
    fn test_kind_follows_body() {
        let cmd = Command::from_body(CommandBody::Simple(SimpleCommand {
            flags: vec![],
            line: 1,
            words: vec![WordDesc::bare("echo")],
            redirects: vec![],
        }));
        assert_eq!(cmd.kind(), CommandKind::Simple);
        assert_eq!(cmd.kind().name(), "simple");
    }

    #[test]
    fn test_kind_tag_round_trip() {
        for tag in 0..=14 {
            let kind = CommandKind::from_tag(tag).unwrap();
            assert_eq!(kind.tag(), tag);
        }
    }

    #[test]
    fn test_tag_past_last_kind_fails_closed() {
        let err = CommandKind::from_tag(15).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::UnsupportedConstruct { tag: 15 }
        ));
        assert!(CommandKind::from_tag(-1).is_err());
    }

    #[test]
    fn test_connector_round_trip_and_unknown() {
        for raw in [38, 59, 10, 124, 288, 289] {
            assert_eq!(ConnectorKind::from_raw(raw).unwrap().raw(), raw);
        }
        assert!(matches!(
            ConnectorKind::from_raw(42),
            Err(BridgeError::UnknownConnector { value: 42 })
        ));
    }

    #[test]
    fn test_instruction_round_trip_and_unknown() {
        for raw in 0..=19 {
            assert_eq!(RedirInstruction::from_raw(raw).unwrap().raw(), raw);
        }
        assert!(matches!(
            RedirInstruction::from_raw(20),
            Err(BridgeError::UnknownInstruction { value: 20 })
        ));
    }

    #[test]
    fn test_redirect_plain_output() {
        let redirect = Redirect::new(
            Addressee::Descriptor(1),
            vec![],
            vec![OpenFlag::WriteOnly, OpenFlag::Create, OpenFlag::Truncate],
            RedirInstruction::OutputDirection,
            word_redirectee("out.txt"),
            None,
        )
        .unwrap();
        assert_eq!(redirect.instruction.symbol(), ">");
    }

    #[test]
    fn test_redirect_word_redirector_requires_var_assign() {
        let err = Redirect::new(
            word_redirectee("fd"),
            vec![],
            vec![],
            RedirInstruction::OutputDirection,
            word_redirectee("out.txt"),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, BridgeError::MalformedUnion { .. }));

        // and the valid spelling of the same redirect
        assert!(Redirect::new(
            word_redirectee("fd"),
            vec![RedirectFlag::VarAssign],
            vec![],
            RedirInstruction::OutputDirection,
            word_redirectee("out.txt"),
            None,
        )
        .is_ok());
    }

    #[test]
    fn test_redirect_descriptor_redirectee_must_match_instruction() {
        // 2>&1 carries a descriptor redirectee
        assert!(Redirect::new(
            Addressee::Descriptor(2),
            vec![],
            vec![],
            RedirInstruction::DuplicatingOutput,
            Addressee::Descriptor(1),
            None,
        )
        .is_ok());

        // a word where a descriptor is required
        let err = Redirect::new(
            Addressee::Descriptor(2),
            vec![],
            vec![],
            RedirInstruction::DuplicatingOutput,
            word_redirectee("1"),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, BridgeError::MalformedUnion { .. }));

        // a descriptor where a word is required
        let err = Redirect::new(
            Addressee::Descriptor(1),
            vec![],
            vec![],
            RedirInstruction::OutputDirection,
            Addressee::Descriptor(3),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, BridgeError::MalformedUnion { .. }));
    }
}
