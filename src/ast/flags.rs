//! Bit-Flag Families
//!
//! The engine packs word, command, open, redirect and pattern flags into
//! plain C ints. This module decodes them into typed sets at the boundary
//! and re-encodes them on the way back. The five families are distinct
//! types and are never conflated.

/// A bit-flag family that round-trips through a raw integer.
///
/// `decode` keeps exactly the defined flags whose bit is set, in
/// declaration order; undefined bits are dropped silently, since several
/// engine bits are reserved or unused. `encode(decode(bits)) == bits` holds
/// for any value composed solely of defined bits.
pub trait Flag: Copy + PartialEq + Sized + 'static {
    /// Every defined flag, in declaration order.
    const ALL: &'static [Self];

    /// The single-bit value of this flag.
    fn bit(self) -> u32;

    /// The canonical lowercase name used by the JSON projection.
    fn name(self) -> &'static str;

    fn decode(bits: u32) -> Vec<Self> {
        Self::ALL
            .iter()
            .copied()
            .filter(|flag| bits & flag.bit() != 0)
            .collect()
    }

    fn encode(flags: &[Self]) -> u32 {
        flags.iter().fold(0, |bits, flag| bits | flag.bit())
    }
}

/// Flags attached to a single word by the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum WordFlag {
    /// Dollar sign present
    HasDollar = 1 << 0,
    /// Some form of quote character is present
    Quoted = 1 << 1,
    /// This word is a variable assignment
    Assignment = 1 << 2,
    /// Split this word on " " regardless of IFS
    SplitSpace = 1 << 3,
    /// Do not perform word splitting because IFS is the empty string
    NoSplit = 1 << 4,
    NoGlob = 1 << 5,
    /// Don't split word except for $@ expansion
    NoSplit2 = 1 << 6,
    /// Tilde expand this assignment word
    TildeExp = 1 << 7,
    /// Unused by the engine; $@ and its special handling
    DollarAt = 1 << 8,
    /// Word is a valid array reference
    ArrayRef = 1 << 9,
    NoComsub = 1 << 10,
    /// Word is rhs of an assignment statement
    AssignRhs = 1 << 11,
    NoTilde = 1 << 12,
    /// Don't do tilde expansion like an assignment statement
    NoAssignTilde = 1 << 13,
    /// Expanding word in ${param OP word}
    ExpandRhs = 1 << 14,
    /// Compound assignment
    CompAssign = 1 << 15,
    /// Word is a builtin command that takes assignments
    AssignBuiltin = 1 << 16,
    /// Word is assignment argument to command
    AssignArg = 1 << 17,
    /// Word contains a quoted null character
    HasQuotedNull = 1 << 18,
    /// Unused by the engine; treat as if double-quoted
    Dquote = 1 << 19,
    NoProcsub = 1 << 20,
    /// Word contained a quoted null that was removed
    SawQuotedNull = 1 << 21,
    /// Word looks like an associative array assignment
    AssignAssoc = 1 << 22,
    /// Word looks like a compound indexed array assignment
    AssignArray = 1 << 23,
    /// Word is an array index being expanded
    ArrayIndex = 1 << 24,
    /// Word is a global assignment to declare (declare/typeset -g)
    AssignGlobal = 1 << 25,
    NoBrace = 1 << 26,
    /// Word is being expanded for completion
    Complete = 1 << 27,
    /// Check for local vars on assignment
    CheckLocal = 1 << 28,
    /// Force assignments to be to local variables
    ForceLocal = 1 << 29,
}

impl Flag for WordFlag {
    const ALL: &'static [Self] = &[
        Self::HasDollar,
        Self::Quoted,
        Self::Assignment,
        Self::SplitSpace,
        Self::NoSplit,
        Self::NoGlob,
        Self::NoSplit2,
        Self::TildeExp,
        Self::DollarAt,
        Self::ArrayRef,
        Self::NoComsub,
        Self::AssignRhs,
        Self::NoTilde,
        Self::NoAssignTilde,
        Self::ExpandRhs,
        Self::CompAssign,
        Self::AssignBuiltin,
        Self::AssignArg,
        Self::HasQuotedNull,
        Self::Dquote,
        Self::NoProcsub,
        Self::SawQuotedNull,
        Self::AssignAssoc,
        Self::AssignArray,
        Self::ArrayIndex,
        Self::AssignGlobal,
        Self::NoBrace,
        Self::Complete,
        Self::CheckLocal,
        Self::ForceLocal,
    ];

    fn bit(self) -> u32 {
        self as u32
    }

    fn name(self) -> &'static str {
        match self {
            Self::HasDollar => "has_dollar",
            Self::Quoted => "quoted",
            Self::Assignment => "assignment",
            Self::SplitSpace => "split_space",
            Self::NoSplit => "no_split",
            Self::NoGlob => "no_glob",
            Self::NoSplit2 => "no_split2",
            Self::TildeExp => "tilde_exp",
            Self::DollarAt => "dollar_at",
            Self::ArrayRef => "array_ref",
            Self::NoComsub => "no_comsub",
            Self::AssignRhs => "assign_rhs",
            Self::NoTilde => "no_tilde",
            Self::NoAssignTilde => "no_assign_tilde",
            Self::ExpandRhs => "expand_rhs",
            Self::CompAssign => "comp_assign",
            Self::AssignBuiltin => "assign_builtin",
            Self::AssignArg => "assign_arg",
            Self::HasQuotedNull => "has_quoted_null",
            Self::Dquote => "dquote",
            Self::NoProcsub => "no_procsub",
            Self::SawQuotedNull => "saw_quoted_null",
            Self::AssignAssoc => "assign_assoc",
            Self::AssignArray => "assign_array",
            Self::ArrayIndex => "array_index",
            Self::AssignGlobal => "assign_global",
            Self::NoBrace => "no_brace",
            Self::Complete => "complete",
            Self::CheckLocal => "check_local",
            Self::ForceLocal => "force_local",
        }
    }
}

/// Flags shared by every command form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CommandFlag {
    /// User wants a subshell
    WantSubshell = 1 << 0,
    /// Shell needs to force a subshell
    ForceSubshell = 1 << 1,
    /// Invert the exit value
    InvertReturn = 1 << 2,
    /// Ignore the exit value
    IgnoreReturn = 1 << 3,
    /// Ignore functions during command lookup
    NoFunctions = 1 << 4,
    /// Do not expand command words
    InhibitExpansion = 1 << 5,
    /// Do not fork, just call execv
    NoFork = 1 << 6,
    TimePipeline = 1 << 7,
    /// time -p was specified
    TimePosix = 1 << 8,
    /// command &
    Ampersand = 1 << 9,
    /// Async command needs implicit </dev/null
    StdinRedirected = 1 << 10,
    /// Command executed by the 'command' builtin
    CommandBuiltin = 1 << 11,
    CoprocShell = 1 << 12,
    /// Last command in pipeline
    LastPipe = 1 << 13,
    /// Use default PATH for command lookup
    StdPath = 1 << 14,
    TryOptimizing = 1 << 15,
}

impl Flag for CommandFlag {
    const ALL: &'static [Self] = &[
        Self::WantSubshell,
        Self::ForceSubshell,
        Self::InvertReturn,
        Self::IgnoreReturn,
        Self::NoFunctions,
        Self::InhibitExpansion,
        Self::NoFork,
        Self::TimePipeline,
        Self::TimePosix,
        Self::Ampersand,
        Self::StdinRedirected,
        Self::CommandBuiltin,
        Self::CoprocShell,
        Self::LastPipe,
        Self::StdPath,
        Self::TryOptimizing,
    ];

    fn bit(self) -> u32 {
        self as u32
    }

    fn name(self) -> &'static str {
        match self {
            Self::WantSubshell => "want_subshell",
            Self::ForceSubshell => "force_subshell",
            Self::InvertReturn => "invert_return",
            Self::IgnoreReturn => "ignore_return",
            Self::NoFunctions => "no_functions",
            Self::InhibitExpansion => "inhibit_expansion",
            Self::NoFork => "no_fork",
            Self::TimePipeline => "time_pipeline",
            Self::TimePosix => "time_posix",
            Self::Ampersand => "ampersand",
            Self::StdinRedirected => "stdin_redirected",
            Self::CommandBuiltin => "command_builtin",
            Self::CoprocShell => "coproc_shell",
            Self::LastPipe => "last_pipe",
            Self::StdPath => "std_path",
            Self::TryOptimizing => "try_optimizing",
        }
    }
}

/// open(2) flags carried by a redirect.
///
/// `ReadOnly` is the zero value; it never appears in a decoded set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum OpenFlag {
    ReadOnly = 0,
    WriteOnly = 1 << 0,
    ReadWrite = 1 << 1,
    Append = 1 << 3,
    Create = 1 << 9,
    Truncate = 1 << 10,
}

impl Flag for OpenFlag {
    const ALL: &'static [Self] = &[
        Self::ReadOnly,
        Self::WriteOnly,
        Self::ReadWrite,
        Self::Append,
        Self::Create,
        Self::Truncate,
    ];

    fn bit(self) -> u32 {
        self as u32
    }

    fn name(self) -> &'static str {
        match self {
            Self::ReadOnly => "read_only",
            Self::WriteOnly => "write_only",
            Self::ReadWrite => "read_write",
            Self::Append => "append",
            Self::Create => "create",
            Self::Truncate => "truncate",
        }
    }
}

/// Flags on a redirect itself, as opposed to the open flags it implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RedirectFlag {
    /// The redirector is a variable name to receive an allocated fd,
    /// as in `{fd}>file`
    VarAssign = 1 << 0,
}

impl Flag for RedirectFlag {
    const ALL: &'static [Self] = &[Self::VarAssign];

    fn bit(self) -> u32 {
        self as u32
    }

    fn name(self) -> &'static str {
        match self {
            Self::VarAssign => "var_assign",
        }
    }
}

/// Flags on a case clause, set by the `;&` and `;;&` terminators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PatternFlag {
    /// Fall through to the next clause's body
    Fallthrough = 1 << 0,
    /// Test the next clause's patterns
    TestNext = 1 << 1,
}

impl Flag for PatternFlag {
    const ALL: &'static [Self] = &[Self::Fallthrough, Self::TestNext];

    fn bit(self) -> u32 {
        self as u32
    }

    fn name(self) -> &'static str {
        match self {
            Self::Fallthrough => "fallthrough",
            Self::TestNext => "test_next",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_flag_round_trip() {
        let bits = WordFlag::HasDollar.bit() | WordFlag::Quoted.bit() | WordFlag::ForceLocal.bit();
        let decoded = WordFlag::decode(bits);
        assert_eq!(
            decoded,
            vec![WordFlag::HasDollar, WordFlag::Quoted, WordFlag::ForceLocal]
        );
        assert_eq!(WordFlag::encode(&decoded), bits);
    }

    #[test]
    fn test_every_defined_word_bit_round_trips() {
        for flag in WordFlag::ALL {
            assert_eq!(WordFlag::encode(&WordFlag::decode(flag.bit())), flag.bit());
        }
        let all_bits = WordFlag::encode(WordFlag::ALL);
        assert_eq!(WordFlag::encode(&WordFlag::decode(all_bits)), all_bits);
    }

    #[test]
    fn test_undefined_bits_are_dropped() {
        // 1 << 30 and 1 << 31 are not defined word flags
        let bits = WordFlag::HasDollar.bit() | (1 << 30) | (1 << 31);
        let decoded = WordFlag::decode(bits);
        assert_eq!(decoded, vec![WordFlag::HasDollar]);
        assert_eq!(WordFlag::encode(&decoded), WordFlag::HasDollar.bit());
    }

    #[test]
    fn test_decode_order_is_declaration_order() {
        // Order of the input bits never shows; decode is canonical
        let bits = CommandFlag::TryOptimizing.bit() | CommandFlag::WantSubshell.bit();
        assert_eq!(
            CommandFlag::decode(bits),
            vec![CommandFlag::WantSubshell, CommandFlag::TryOptimizing]
        );
    }

    #[test]
    fn test_command_flag_round_trip() {
        let bits = CommandFlag::InvertReturn.bit() | CommandFlag::Ampersand.bit();
        assert_eq!(CommandFlag::encode(&CommandFlag::decode(bits)), bits);
    }

    #[test]
    fn test_open_flag_zero_value_never_decodes() {
        assert_eq!(OpenFlag::decode(0), vec![]);
        let bits = OpenFlag::WriteOnly.bit() | OpenFlag::Create.bit() | OpenFlag::Truncate.bit();
        let decoded = OpenFlag::decode(bits);
        assert!(!decoded.contains(&OpenFlag::ReadOnly));
        assert_eq!(OpenFlag::encode(&decoded), bits);
    }

    #[test]
    fn test_redirect_and_pattern_flags() {
        assert_eq!(RedirectFlag::decode(1), vec![RedirectFlag::VarAssign]);
        assert_eq!(RedirectFlag::decode(0), vec![]);
        assert_eq!(
            PatternFlag::decode(0b11),
            vec![PatternFlag::Fallthrough, PatternFlag::TestNext]
        );
        assert_eq!(PatternFlag::encode(&[PatternFlag::TestNext]), 2);
    }
}
