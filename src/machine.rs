//! Compiled machine.
//!
//! Compilation runs the parser, the transition builder and the analyzer,
//! then "bakes" every character-consuming term: its predicate plus the
//! ε-closure of slot-bearing positions reachable once it consumes. The
//! engine dispatches on baked terms by slot index, which stands in for
//! the per-term entry addresses of a native backend.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::parser::{self, Term, TermKind};
use crate::program::{self, SlotInfo};
use crate::{CompileError, Flags};

/// One element of a character class predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RangeItem {
    One(u32),
    Span(u32, u32),
}

/// Character predicate of a baked term.
#[derive(Clone, Debug)]
pub(crate) enum Test {
    Char(u32),
    Range {
        invert: bool,
        items: SmallVec<[RangeItem; 4]>,
    },
}

impl Test {
    #[inline]
    pub(crate) fn matches(&self, c: char) -> bool {
        let c = c as u32;
        match self {
            Test::Char(v) => c == *v,
            Test::Range { invert, items } => {
                let hit = items.iter().any(|item| match *item {
                    RangeItem::One(v) => c == v,
                    RangeItem::Span(lo, hi) => lo <= c && c <= hi,
                });
                hit != *invert
            }
        }
    }

    fn is_inverted_range(&self) -> bool {
        matches!(self, Test::Range { invert: true, .. })
    }
}

/// A slot reachable without consuming a character, with the highest id
/// tag seen along any path to it.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Target {
    pub slot: u32,
    pub id: u32,
}

/// Baked code for one character-consuming term.
#[derive(Debug)]
pub(crate) struct TermCode {
    pub test: Test,
    /// Slots to merge into the next state vector when the test passes.
    pub targets: Vec<Target>,
}

/// A compiled, immutable, shareable matcher.
///
/// The [`Display`](fmt::Display) implementation renders the flat program
/// listing, which is stable for a given pattern and flag set.
#[derive(Debug)]
pub struct Machine {
    flags: Flags,
    /// State-record width in words: 2..=4 depending on flags.
    no_states: usize,
    /// Number of term slots, counting the shared Begin/End slot 0.
    terms_size: usize,
    /// Width of the longest character class, in program positions.
    longest_range: usize,
    program: Vec<Term>,
    /// Slot index per program position, -1 for ε-only positions.
    slots: Vec<i32>,
    /// Baked term code, indexed by `slot - 1`.
    codes: Vec<TermCode>,
    /// ε-closure of the Begin position, used for seeding and reset.
    begin_closure: Vec<Target>,
    /// True when the input may be scanned ahead while only the Begin
    /// closure is active.
    suggest_fast_forward: bool,
}

impl Machine {
    /// Compile `pattern` under `flags` into a shareable machine.
    ///
    /// Only `MATCH_BEGIN`, `MATCH_END`, `NEWLINE` and `NON_GREEDY` are
    /// honored from the caller; `ID_CHECK` is inferred from the pattern.
    pub fn compile(pattern: &str, flags: Flags) -> Result<Arc<Machine>, CompileError> {
        let settable =
            Flags::MATCH_BEGIN | Flags::MATCH_END | Flags::NEWLINE | Flags::NON_GREEDY;
        let parsed = parser::parse(pattern, flags & settable)?;
        let mut flags = parsed.flags;

        let program = program::build(parsed.terms, parsed.program_size);
        let mut analysis = program::analyze(&program);
        if analysis.id_check {
            flags |= Flags::ID_CHECK;
        }

        let no_states = if flags.contains(Flags::ID_CHECK) && !flags.contains(Flags::MATCH_BEGIN) {
            4
        } else if !flags.contains(Flags::ID_CHECK) && flags.contains(Flags::MATCH_BEGIN) {
            2
        } else {
            3
        };

        // bake the per-term predicates and closures
        let mut codes = Vec::with_capacity(analysis.terms_size - 1);
        let mut visited = Vec::new();
        let mut depth = Vec::new();
        let mut i = 1;
        while i < program.len() - 1 {
            match program[i].kind {
                TermKind::Char => {
                    let targets =
                        bake_closure(&program, &mut analysis.slots, i, &mut visited, &mut depth);
                    codes.push(TermCode {
                        test: Test::Char(program[i].value),
                        targets,
                    });
                }
                TermKind::RngStart => {
                    let invert = program[i].value != 0;
                    let mut items = SmallVec::new();
                    loop {
                        i += 1;
                        match program[i].kind {
                            TermKind::RngChar => items.push(RangeItem::One(program[i].value)),
                            TermKind::RngLeft => {
                                let lo = program[i].value;
                                i += 1;
                                debug_assert_eq!(program[i].kind, TermKind::RngRight);
                                items.push(RangeItem::Span(lo, program[i].value));
                            }
                            TermKind::RngEnd => break,
                            kind => unreachable!("unexpected {:?} inside a range", kind),
                        }
                    }
                    let targets =
                        bake_closure(&program, &mut analysis.slots, i, &mut visited, &mut depth);
                    codes.push(TermCode {
                        test: Test::Range { invert, items },
                        targets,
                    });
                }
                _ => {}
            }
            i += 1;
        }
        debug_assert_eq!(codes.len(), analysis.terms_size - 1);

        let begin_closure =
            bake_closure(&program, &mut analysis.slots, 0, &mut visited, &mut depth);

        // Scanning ahead is sound only when a missed character cannot
        // matter: no empty match pending (End in the closure) and no
        // near-universal predicate (inverted class) to start one.
        let suggest_fast_forward = !flags.contains(Flags::MATCH_BEGIN)
            && begin_closure.iter().all(|t| {
                t.slot != 0 && !codes[t.slot as usize - 1].test.is_inverted_range()
            });

        Ok(Arc::new(Machine {
            flags,
            no_states,
            terms_size: analysis.terms_size,
            longest_range: analysis.longest_range,
            slots: analysis.slots.iter().map(|s| s.term).collect(),
            program,
            codes,
            begin_closure,
            suggest_fast_forward,
        }))
    }

    /// The effective flag set, including an inferred `ID_CHECK`.
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Number of term slots in a state vector.
    pub fn slot_count(&self) -> usize {
        self.terms_size
    }

    pub(crate) fn no_states(&self) -> usize {
        self.no_states
    }

    pub(crate) fn terms_size(&self) -> usize {
        self.terms_size
    }

    pub(crate) fn code(&self, slot: usize) -> &TermCode {
        &self.codes[slot - 1]
    }

    pub(crate) fn begin_closure(&self) -> &[Target] {
        &self.begin_closure
    }

    pub(crate) fn suggest_fast_forward(&self) -> bool {
        self.suggest_fast_forward
    }

    /// True when at least one Begin-closure predicate accepts `c`.
    pub(crate) fn begin_closure_accepts(&self, c: char) -> bool {
        self.begin_closure
            .iter()
            .any(|t| t.slot != 0 && self.codes[t.slot as usize - 1].test.matches(c))
    }
}

/// Run a trace and collect the slot-bearing positions it reached, in
/// the order the engine should merge them, resetting the marks.
fn bake_closure(
    program: &[Term],
    slots: &mut [SlotInfo],
    from: usize,
    visited: &mut Vec<usize>,
    depth: &mut Vec<(i32, usize)>,
) -> Vec<Target> {
    program::trace(program, slots, from, visited, depth);
    let mut out = Vec::new();
    for &p in visited.iter().rev() {
        if slots[p].term >= 0 {
            out.push(Target {
                slot: slots[p].term as u32,
                id: slots[p].mark as u32,
            });
        }
        slots[p].mark = -1;
    }
    visited.clear();
    out
}

fn write_char(f: &mut fmt::Formatter<'_>, label: &str, value: u32) -> fmt::Result {
    match char::from_u32(value).filter(|c| !c.is_control()) {
        Some(c) => writeln!(f, "{} '{}'", label, c),
        None => writeln!(f, "{} {:#x}", label, value),
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, t) in self.program.iter().enumerate() {
            write!(f, "[{:3}] ", i)?;
            if self.slots[i] >= 0 {
                write!(f, "({:3}) ", self.slots[i])?;
            } else {
                write!(f, "      ")?;
            }
            match t.kind {
                TermKind::Begin => writeln!(f, "begin")?,
                TermKind::End => writeln!(f, "end")?,
                TermKind::Char => write_char(f, "char", t.value)?,
                TermKind::Id => writeln!(f, "id {}", t.value)?,
                TermKind::RngStart => writeln!(
                    f,
                    "range start {}",
                    if t.value != 0 { "(invert)" } else { "(normal)" }
                )?,
                TermKind::RngEnd => writeln!(f, "range end")?,
                TermKind::RngChar => write_char(f, "range char", t.value)?,
                TermKind::RngLeft => write_char(f, "range left", t.value)?,
                TermKind::RngRight => write_char(f, "range right", t.value)?,
                TermKind::Branch => writeln!(f, "branch -> {}", t.value)?,
                TermKind::Jump => writeln!(f, "jump -> {}", t.value)?,
                kind => unreachable!("parser-only {:?} in a program", kind),
            }
        }
        write!(f, "flags:")?;
        if self.flags.is_empty() {
            write!(f, " none")?;
        }
        for (name, _) in self.flags.iter_names() {
            write!(f, " {}", name)?;
        }
        if self.longest_range > 0 {
            write!(f, " (longest range: {})", self.longest_range)?;
        }
        writeln!(f)
    }
}
