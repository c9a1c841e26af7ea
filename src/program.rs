//! Flat program construction and analysis.
//!
//! The transition builder walks the parser's term stack right to left
//! into a pre-allocated buffer, resolving iterators and alternation into
//! `Branch` (non-deterministic fork: `value` is the alternate target,
//! fall-through is the next instruction) and `Jump` (unconditional goto)
//! edges. The search-state analyzer then assigns a slot index to every
//! position that can hold runtime state, and the trace walks ε-edges
//! from a given position to find the reachable slot-bearing positions.

use crate::parser::{Term, TermKind};

/// Per-position slot assignment and trace memo.
///
/// `term` is the slot index for positions that hold runtime state
/// (`Begin`/`End` share slot 0, each `Char` and each complete range get
/// their own) or -1 for ε-only positions. `mark` is transient: the
/// highest id a trace entered this position with, -1 outside a trace.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SlotInfo {
    pub term: i32,
    pub mark: i32,
}

/// Analyzer output.
pub(crate) struct Analysis {
    pub slots: Vec<SlotInfo>,
    /// Number of slots, counting the shared Begin/End slot 0.
    pub terms_size: usize,
    /// Width of the longest character class, in program positions.
    pub longest_range: usize,
    /// True when any id tag with a value > 0 is present.
    pub id_check: bool,
}

fn put(program: &mut [Term], w: &mut usize, kind: TermKind, value: u32) {
    *w -= 1;
    program[*w] = Term::new(kind, value);
}

/// Pop pending iterator markers and backpatch their branches around the
/// body that was just written.
fn handle_iteratives(program: &mut [Term], w: &mut usize, depth: &mut Vec<Term>) {
    while let Some(&top) = depth.last() {
        match top.kind {
            TermKind::Star => {
                debug_assert_eq!(program[top.value as usize].kind, TermKind::Branch);
                program[top.value as usize].value = *w as u32;
                put(program, w, TermKind::Branch, top.value + 1);
            }
            TermKind::Plus => {
                debug_assert_eq!(program[top.value as usize].kind, TermKind::Branch);
                program[top.value as usize].value = *w as u32;
            }
            TermKind::Question => {
                put(program, w, TermKind::Branch, top.value);
            }
            _ => return,
        }
        depth.pop();
    }
}

/// Transform the term stack into the flat program.
///
/// The buffer is filled from the end; `size` is the parser's exact
/// prediction. `depth` carries pending iterator and alternation
/// positions: each `End`/`CloseBr` pushes a merge point, each `Select`
/// turns it into a chain of jumps, and the matching `Begin`/`OpenBr`
/// resolves the chain with a leading branch.
pub(crate) fn build(mut stack: Vec<Term>, size: usize) -> Vec<Term> {
    let mut program = vec![Term::new(TermKind::Begin, 0); size];
    let mut w = size;
    let mut depth: Vec<Term> = Vec::new();

    while let Some(item) = stack.pop() {
        match item.kind {
            TermKind::Begin | TermKind::OpenBr => {
                let d = depth.pop().expect("matching group marker");
                if d.kind == TermKind::Select {
                    put(&mut program, &mut w, TermKind::Branch, d.value + 1);
                } else {
                    debug_assert_eq!(d.kind, TermKind::CloseBr);
                }
                if stack.is_empty() {
                    put(&mut program, &mut w, TermKind::Begin, 0);
                } else {
                    handle_iteratives(&mut program, &mut w, &mut depth);
                }
            }
            TermKind::End | TermKind::CloseBr => {
                if item.kind == TermKind::End {
                    put(&mut program, &mut w, TermKind::End, 0);
                }
                depth.push(Term::new(TermKind::CloseBr, w as u32));
            }
            TermKind::Select => {
                let top = depth.last_mut().expect("alternation inside a group");
                if top.kind == TermKind::Select {
                    debug_assert_eq!(program[top.value as usize].kind, TermKind::Jump);
                    let link = top.value;
                    put(&mut program, &mut w, TermKind::Branch, link + 1);
                    put(&mut program, &mut w, TermKind::Jump, link);
                    top.value = w as u32;
                } else {
                    debug_assert_eq!(top.kind, TermKind::CloseBr);
                    let merge = top.value;
                    top.kind = TermKind::Select;
                    put(&mut program, &mut w, TermKind::Jump, merge);
                    top.value = w as u32;
                }
            }
            TermKind::Star | TermKind::Plus | TermKind::Question => {
                if item.kind != TermKind::Question {
                    put(&mut program, &mut w, TermKind::Branch, 0);
                }
                depth.push(Term::new(item.kind, w as u32));
            }
            TermKind::Char | TermKind::RngStart => {
                put(&mut program, &mut w, item.kind, item.value);
                handle_iteratives(&mut program, &mut w, &mut depth);
            }
            _ => {
                // Id and the range interior are copied verbatim
                put(&mut program, &mut w, item.kind, item.value);
            }
        }
    }

    debug_assert_eq!(w, 0, "program size prediction must be exact");
    debug_assert!(depth.is_empty());
    program
}

/// Assign slot indices and collect program-wide facts in one forward
/// pass.
pub(crate) fn analyze(program: &[Term]) -> Analysis {
    let mut slots = Vec::with_capacity(program.len());
    let mut terms_size: i32 = 1; // slot 0 is reserved for Begin/End
    let mut longest_range = 0usize;
    let mut id_check = false;
    let mut rng_start = 0usize;

    for (i, t) in program.iter().enumerate() {
        let term = match t.kind {
            TermKind::Begin | TermKind::End => 0,
            TermKind::Char => {
                terms_size += 1;
                terms_size - 1
            }
            TermKind::Id => {
                if t.value > 0 {
                    id_check = true;
                }
                -1
            }
            TermKind::RngStart => {
                // the range start shares the slot its RngEnd will take
                rng_start = i;
                terms_size
            }
            TermKind::RngEnd => {
                terms_size += 1;
                if longest_range < i - rng_start {
                    longest_range = i - rng_start;
                }
                terms_size - 1
            }
            _ => -1,
        };
        slots.push(SlotInfo { term, mark: -1 });
    }

    Analysis {
        slots,
        terms_size: terms_size as usize,
        longest_range,
        id_check,
    }
}

/// Walk the ε-closure reachable from `from + 1` without consuming a
/// character, following `Branch` forks (via a scratch stack), `Jump`s,
/// id tags and ε-only positions.
///
/// Every entered position is recorded in `visited` the first time, and
/// its `mark` is raised to the highest id accumulated along any path
/// that entered it; a position is re-entered only with a strictly
/// higher id, which bounds the walk even on looping programs. Callers
/// filter `visited` for slot-bearing positions and must reset the marks
/// back to -1.
pub(crate) fn trace(
    program: &[Term],
    slots: &mut [SlotInfo],
    from: usize,
    visited: &mut Vec<usize>,
    depth: &mut Vec<(i32, usize)>,
) {
    debug_assert!(slots[from].term >= 0);
    debug_assert!(depth.is_empty());

    let mut id: i32 = 0;
    let mut pos = from + 1;

    loop {
        if program[pos].kind == TermKind::Id && (program[pos].value as i32) > id {
            id = program[pos].value as i32;
        }

        if slots[pos].mark < id {
            if slots[pos].mark == -1 {
                visited.push(pos);
            }
            slots[pos].mark = id;

            match program[pos].kind {
                TermKind::Branch => {
                    depth.push((id, pos));
                    pos += 1;
                    continue;
                }
                TermKind::Jump => {
                    pos = program[pos].value as usize;
                    continue;
                }
                _ => {
                    if slots[pos].term < 0 {
                        pos += 1;
                        continue;
                    }
                }
            }
        }

        // backtrack to the most recent untaken branch alternate
        match depth.pop() {
            Some((branch_id, branch_pos)) => {
                id = branch_id;
                pos = program[branch_pos].value as usize;
            }
            None => return,
        }
    }
}
