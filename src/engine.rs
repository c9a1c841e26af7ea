//! Match engine.
//!
//! A match session owns two state vectors of `slot_count x width` words
//! each. Active slots form a singly linked chain of word offsets rooted
//! at `head`; offset 0 doubles as the chain terminator, which works out
//! because slot 0 (the shared Begin/End slot) is never linked in. Each
//! step drains the current chain into the next vector, swaps the two,
//! and applies the best-match policy when a path has completed.

use std::str::Chars;
use std::sync::Arc;

use crate::machine::Machine;
use crate::{Flags, MatchSpan};

/// Word offsets inside a state record.
const LINK: usize = 1;
const START: usize = 2;

/// A running match session over a compiled [`Machine`].
///
/// Sessions are single-threaded; the machine behind them can be shared
/// freely. Input is consumed by [`feed`](Match::feed) in arbitrary
/// chunks.
pub struct Match {
    machine: Arc<Machine>,
    state: State,
}

struct State {
    current: Vec<i64>,
    next: Vec<i64>,
    /// Word offset of the first active slot in `current`, 0 when none.
    head: i64,
    /// 1-based character index, monotonically increasing.
    index: i64,
    /// Character index of the best match begin, -1 when none yet.
    best_begin: i64,
    best_end: i64,
    best_id: i64,
    /// Latched once the result can no longer change.
    fast_quit: bool,
    /// Set when the previous step left only the Begin closure active.
    fast_forward: bool,
}

impl Match {
    /// Allocate and seed a session for `machine`.
    pub fn new(machine: Arc<Machine>) -> Match {
        let w = machine.no_states();
        let t = machine.terms_size();
        let mut state = State {
            current: vec![0; t * w],
            next: vec![0; t * w],
            head: 0,
            index: 1,
            best_begin: -1,
            best_end: 0,
            best_id: 0,
            fast_quit: false,
            fast_forward: false,
        };
        for slot in 0..t {
            state.current[slot * w] = slot as i64;
            state.next[slot * w] = slot as i64;
            state.current[slot * w + LINK] = -1;
            state.next[slot * w + LINK] = -1;
        }
        let mut m = Match { machine, state };
        m.reset();
        m
    }

    /// The machine this session runs on.
    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// Re-seed the session without reallocating. Afterwards the session
    /// behaves exactly like a freshly created one.
    pub fn reset(&mut self) {
        self.state.reset(&self.machine);
    }

    /// Advance the match by the characters of `input`.
    ///
    /// Chunked calls are equivalent to one call with the concatenation.
    /// Input past the point where the result is settled is ignored; see
    /// [`is_finished`](Match::is_finished).
    pub fn feed(&mut self, input: &str) {
        let machine = &*self.machine;
        let state = &mut self.state;
        if state.fast_quit {
            return;
        }
        let mut chars = input.chars();
        loop {
            let c = if state.fast_forward && machine.suggest_fast_forward() {
                match state.fast_forward_scan(machine, &mut chars) {
                    Some(c) => c,
                    None => return,
                }
            } else {
                match chars.next() {
                    Some(c) => c,
                    None => return,
                }
            };
            state.step(machine, c);
            if state.fast_quit {
                return;
            }
        }
    }

    /// The best match so far, or `None`.
    ///
    /// Under `MATCH_END` this succeeds only if the last consumed
    /// character completed the pattern.
    pub fn result(&self) -> Option<MatchSpan> {
        let flags = self.machine.flags();
        let state = &self.state;

        if !flags.contains(Flags::MATCH_END) {
            if state.best_begin == -1 {
                return None;
            }
            return Some(MatchSpan {
                begin: state.best_begin as usize,
                end: state.best_end as usize,
                id: state.best_id as u32,
            });
        }

        // end-anchored: inspect the End slot of the current vector
        if state.current[LINK] == -1 {
            return None;
        }
        let w = self.machine.no_states();
        let end = (state.index - 1) as usize;
        if !flags.contains(Flags::MATCH_BEGIN) {
            let id = if flags.contains(Flags::ID_CHECK) {
                state.current[w - 1] as u32
            } else {
                0
            };
            Some(MatchSpan {
                begin: state.current[START] as usize,
                end,
                id,
            })
        } else {
            let id = if flags.contains(Flags::ID_CHECK) {
                state.current[2] as u32
            } else {
                0
            };
            Some(MatchSpan { begin: 0, end, id })
        }
    }

    /// True once no further input can change the result.
    pub fn is_finished(&self) -> bool {
        self.state.fast_quit
    }
}

impl State {
    fn reset(&mut self, machine: &Machine) {
        // deactivate the current chain; the End flag sits outside it
        let mut off = self.head;
        while off != 0 {
            let o = off as usize;
            off = self.current[o + LINK];
            self.current[o + LINK] = -1;
        }
        self.current[LINK] = -1;

        self.index = 1;
        self.best_begin = -1;
        self.best_end = 0;
        self.best_id = 0;
        self.fast_quit = false;
        self.fast_forward = false;

        self.head = seed(machine, &mut self.current, 0, 0);
    }

    /// Skip input while only the Begin closure is active, looking for a
    /// character at least one closure predicate accepts. On a hit the
    /// closure's start fields are rewritten to the hit position and the
    /// character is returned for normal stepping. Streaming-safe: on
    /// end of input the index already accounts for the skipped run.
    fn fast_forward_scan(&mut self, machine: &Machine, chars: &mut Chars<'_>) -> Option<char> {
        let w = machine.no_states();
        loop {
            let c = chars.next()?;
            if machine.begin_closure_accepts(c) {
                let start = self.index - 1;
                for t in machine.begin_closure() {
                    self.current[t.slot as usize * w + START] = start;
                }
                self.fast_forward = false;
                return Some(c);
            }
            self.index += 1;
        }
    }

    fn step(&mut self, machine: &Machine, c: char) {
        let w = machine.no_states();
        let flags = machine.flags();
        let match_begin = flags.contains(Flags::MATCH_BEGIN);
        let match_end = flags.contains(Flags::MATCH_END);
        let id_check = flags.contains(Flags::ID_CHECK);

        self.fast_forward = !match_begin;

        // seed the next vector with fresh match candidates; once a best
        // match is recorded, later-starting candidates cannot beat it
        let mut next_head = 0;
        if !match_begin && (match_end || self.best_begin == -1) {
            next_head = seed(machine, &mut self.next, 0, self.index);
        }

        // drain the current chain
        let mut off = self.head;
        while off != 0 {
            let o = off as usize;
            let slot = o / w;
            let link = self.current[o + LINK];
            self.current[o + LINK] = -1;

            let code = machine.code(slot);
            if code.test.matches(c) {
                self.fast_forward = false;
                let sigma = if !match_begin {
                    self.current[o + START]
                } else {
                    0
                };
                let src_id = if id_check { self.current[o + w - 1] } else { 0 };
                for t in &code.targets {
                    let id = if (t.id as i64) > src_id {
                        t.id as i64
                    } else {
                        src_id
                    };
                    next_head = self.insert(machine, next_head, t.slot as usize, sigma, id);
                }
            }
            off = link;
        }

        // the vector built this step becomes current
        std::mem::swap(&mut self.current, &mut self.next);
        self.head = next_head;

        if !match_end && self.current[LINK] != -1 {
            self.best_update(machine);
        }
        self.next[LINK] = -1;
        self.index += 1;

        #[cfg(debug_assertions)]
        self.check_chains(machine);

        // can the result still change?
        if match_begin {
            if self.head == 0 && !(match_end && self.current[LINK] != -1) {
                self.fast_quit = true;
            }
        } else if !match_end && self.best_begin != -1 && self.head == 0 {
            self.fast_quit = true;
        }
    }

    /// Merge slot `slot` into the next vector with start `sigma` and
    /// path id `id`; earlier starts win, then higher ids.
    fn insert(
        &mut self,
        machine: &Machine,
        mut next_head: i64,
        slot: usize,
        sigma: i64,
        id: i64,
    ) -> i64 {
        let w = machine.no_states();
        let flags = machine.flags();
        let off = slot * w;
        let next = &mut self.next;

        fn activate(next: &mut [i64], off: usize, next_head: &mut i64) {
            next[off + LINK] = *next_head;
            if off > 0 {
                *next_head = off as i64;
            }
        }

        if !flags.contains(Flags::ID_CHECK) {
            if !flags.contains(Flags::MATCH_BEGIN) {
                if next[off + LINK] == -1 {
                    activate(next, off, &mut next_head);
                    next[off + START] = sigma;
                } else if next[off + START] > sigma {
                    next[off + START] = sigma;
                }
            } else if next[off + LINK] == -1 {
                activate(next, off, &mut next_head);
            }
        } else if !flags.contains(Flags::MATCH_BEGIN) {
            if next[off + LINK] == -1 {
                activate(next, off, &mut next_head);
                next[off + START] = sigma;
                next[off + w - 1] = id;
            } else if next[off + START] > sigma {
                next[off + START] = sigma;
                next[off + w - 1] = id;
            } else if next[off + START] == sigma && next[off + w - 1] < id {
                next[off + w - 1] = id;
            }
        } else {
            // begin-anchored with ids: the id lives at word 2
            if next[off + LINK] == -1 {
                activate(next, off, &mut next_head);
                next[off + 2] = id;
            } else if next[off + 2] < id {
                next[off + 2] = id;
            }
        }
        next_head
    }

    /// A path completed at End: apply the best-match policy.
    ///
    /// Priority is smallest begin, then (because `index` only grows)
    /// the later update for the same begin under greedy matching, or
    /// the first one under non-greedy.
    fn best_update(&mut self, machine: &Machine) {
        let w = machine.no_states();
        let flags = machine.flags();
        let non_greedy = flags.contains(Flags::NON_GREEDY);

        if flags.contains(Flags::MATCH_BEGIN) {
            self.best_begin = 0;
            self.best_end = self.index;
            if flags.contains(Flags::ID_CHECK) {
                self.best_id = self.current[2];
            }
            if non_greedy {
                self.fast_quit = true;
            }
            return;
        }

        let new_begin = self.current[START];
        if self.best_begin != -1 {
            if !non_greedy && self.best_begin < new_begin {
                return;
            }
            if non_greedy && self.best_begin <= new_begin {
                return;
            }
        }
        let improved = self.best_begin == -1 || new_begin < self.best_begin;
        self.best_begin = new_begin;
        self.best_end = self.index;
        if flags.contains(Flags::ID_CHECK) {
            self.best_id = self.current[w - 1];
        }

        if improved {
            // drop candidates that can no longer beat the recorded match
            let mut off = self.head;
            self.head = 0;
            while off != 0 {
                let o = off as usize;
                let link = self.current[o + LINK];
                let keep = if non_greedy {
                    self.current[o + START] < new_begin
                } else {
                    self.current[o + START] <= new_begin
                };
                if keep {
                    self.current[o + LINK] = self.head;
                    self.head = o as i64;
                } else {
                    self.current[o + LINK] = -1;
                }
                off = link;
            }
        }
    }

    #[cfg(debug_assertions)]
    fn check_chains(&self, machine: &Machine) {
        let w = machine.no_states();
        let t = machine.terms_size();
        // the freshly drained vector must be fully inactive
        for slot in 0..t {
            debug_assert_eq!(self.next[slot * w + LINK], -1);
        }
        // the chain is acyclic, in bounds, and covers the active slots
        let mut active = (1..t)
            .filter(|&slot| self.current[slot * w + LINK] != -1)
            .count();
        let mut off = self.head;
        while off != 0 {
            let o = off as usize;
            debug_assert!(o < t * w);
            debug_assert_eq!(o % w, 0);
            debug_assert!(active > 0, "cycle or stray link in the active chain");
            active -= 1;
            off = self.current[o + LINK];
        }
        debug_assert_eq!(active, 0);
    }
}

/// Write the Begin closure into `vec` unconditionally, threading the
/// chain through the activated slots. Returns the new chain head.
fn seed(machine: &Machine, vec: &mut [i64], mut head: i64, start: i64) -> i64 {
    let w = machine.no_states();
    let flags = machine.flags();
    for t in machine.begin_closure() {
        let off = t.slot as usize * w;
        vec[off + LINK] = head;
        if off > 0 {
            head = off as i64;
        }
        if !flags.contains(Flags::MATCH_BEGIN) {
            vec[off + START] = start;
            if flags.contains(Flags::ID_CHECK) {
                vec[off + w - 1] = t.id as i64;
            }
        } else if flags.contains(Flags::ID_CHECK) {
            vec[off + 2] = t.id as i64;
        }
    }
    head
}
