//! strex: streaming best-match regular expression engine.
//!
//! A POSIX-like regular expression is compiled into a flat NFA-style
//! program with explicit branch/jump edges, then matched against a
//! character stream one character at a time. The engine reports the best
//! match under a longest-then-leftmost policy, optionally refined by a
//! user-supplied id priority (the non-standard `{N!}` tag).
//!
//! Supported syntax: literals, `\x` escapes, `.`, `[...]`/`[^...]`
//! classes with ranges, `(...)` grouping, `|` alternation, `*`, `+`,
//! `?`, `{m,n}` bounded repetition (expanded by unrolling), the `^`/`$`
//! anchors (folded into flags), and `{N!}` id tags.
//!
//! Matching is streaming: input can be fed in arbitrary chunks and the
//! result is identical to feeding the concatenation.
//!
//! ```
//! use strex::{compile, Flags, Match};
//!
//! let machine = compile("a(b|c)*d", Flags::empty()).unwrap();
//! let mut m = Match::new(machine);
//! m.feed("abb");
//! m.feed("cdxx");
//! let hit = m.result().unwrap();
//! assert_eq!((hit.begin, hit.end), (0, 5));
//! ```

use std::fmt;
use std::sync::Arc;

mod cache;
mod engine;
mod machine;
mod parser;
mod program;
mod shared;

#[cfg(test)]
mod samples;

pub use cache::MachineCache;
pub use engine::Match;
pub use machine::Machine;
pub use shared::SharedMachine;

bitflags::bitflags! {
    /// Compilation and matching options.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Flags: u32 {
        /// The match must start at the first input character (`^`).
        const MATCH_BEGIN = 0x01;
        /// The match must extend to the last input character (`$`).
        const MATCH_END = 0x02;
        /// `.` and inverted classes additionally reject `\n` and `\r`.
        const NEWLINE = 0x04;
        /// Prefer the shortest match over the longest.
        const NON_GREEDY = 0x08;
        /// Id tags participate in match priority. Set by the compiler
        /// whenever the pattern carries a `{N!}` tag with N > 0.
        const ID_CHECK = 0x10;
    }
}

/// Errors reported by [`Machine::compile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The pattern is structurally or syntactically invalid.
    InvalidRegex {
        message: String,
        /// Byte offset of the offending position in the pattern.
        offset: usize,
    },
    /// Expanding the pattern would exceed the compiled-program size cap.
    TooLarge,
}

impl CompileError {
    pub(crate) fn invalid(message: impl Into<String>, offset: usize) -> Self {
        CompileError::InvalidRegex {
            message: message.into(),
            offset,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::InvalidRegex { message, offset } => {
                write!(f, "invalid regex: {} at offset {}", message, offset)
            }
            CompileError::TooLarge => write!(f, "compiled pattern would be too large"),
        }
    }
}

impl std::error::Error for CompileError {}

/// A reported match.
///
/// `begin` and `end` are character indices into the stream fed so far;
/// `end` is exclusive. `id` is the highest `{N!}` tag encountered on the
/// winning path, or 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchSpan {
    pub begin: usize,
    pub end: usize,
    pub id: u32,
}

/// Compile a pattern into a shareable machine.
///
/// Shorthand for [`Machine::compile`].
pub fn compile(pattern: &str, flags: Flags) -> Result<Arc<Machine>, CompileError> {
    Machine::compile(pattern, flags)
}
