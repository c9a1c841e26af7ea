//! Sample corpus for the full compile-and-match pipeline.
//!
//! Each sample pins the observable result for one pattern/flags/input
//! triple. The driver runs every sample three ways: whole input, split
//! at every character boundary, and after a reset, so the corpus also
//! exercises streaming equivalence and reset idempotence.

use crate::{compile, Flags, Match};

struct Sample {
    regex: &'static str,
    flags: Flags,
    input: &'static str,
    /// (begin, end, id), or None for no match.
    expect: Option<(usize, usize, u32)>,
}

const B: Flags = Flags::MATCH_BEGIN;
const E: Flags = Flags::MATCH_END;
const NL: Flags = Flags::NEWLINE;
const NG: Flags = Flags::NON_GREEDY;

static SAMPLES: &[Sample] = &[
    // literals
    Sample { regex: "a", flags: Flags::empty(), input: "a", expect: Some((0, 1, 0)) },
    Sample { regex: "a", flags: Flags::empty(), input: "xxaxx", expect: Some((2, 3, 0)) },
    Sample { regex: "a", flags: Flags::empty(), input: "xyz", expect: None },
    Sample { regex: "abc", flags: Flags::empty(), input: "zabcz", expect: Some((1, 4, 0)) },
    Sample { regex: "abc", flags: Flags::empty(), input: "ababc", expect: Some((2, 5, 0)) },
    // escapes
    Sample { regex: r"a\*b", flags: Flags::empty(), input: "a*b", expect: Some((0, 3, 0)) },
    Sample { regex: r"a\*b", flags: Flags::empty(), input: "aab", expect: None },
    // alternation
    Sample { regex: "cat|dog", flags: Flags::empty(), input: "hotdog", expect: Some((3, 6, 0)) },
    Sample { regex: "cat|dog", flags: Flags::empty(), input: "cow", expect: None },
    Sample { regex: "a|ab|abc", flags: Flags::empty(), input: "abc", expect: Some((0, 3, 0)) },
    Sample { regex: "a|ab|abc", flags: NG, input: "abc", expect: Some((0, 1, 0)) },
    // iterators
    Sample { regex: "ab*c", flags: Flags::empty(), input: "ac", expect: Some((0, 2, 0)) },
    Sample { regex: "ab*c", flags: Flags::empty(), input: "abbbc", expect: Some((0, 5, 0)) },
    Sample { regex: "ab+c", flags: Flags::empty(), input: "ac", expect: None },
    Sample { regex: "ab+c", flags: Flags::empty(), input: "abbc", expect: Some((0, 4, 0)) },
    Sample { regex: "ab?c", flags: Flags::empty(), input: "abc", expect: Some((0, 3, 0)) },
    Sample { regex: "ab?c", flags: Flags::empty(), input: "abbc", expect: None },
    Sample { regex: "a*", flags: Flags::empty(), input: "baaa", expect: Some((1, 4, 0)) },
    // bounded repetition
    Sample { regex: "a{3}", flags: Flags::empty(), input: "aaaa", expect: Some((0, 3, 0)) },
    Sample { regex: "a{3}", flags: Flags::empty(), input: "aa", expect: None },
    Sample { regex: "a{2,4}", flags: Flags::empty(), input: "aaaaaa", expect: Some((0, 4, 0)) },
    Sample { regex: "a{2,4}", flags: NG, input: "aaaaaa", expect: Some((0, 2, 0)) },
    Sample { regex: "a{2,}", flags: Flags::empty(), input: "xaaa", expect: Some((1, 4, 0)) },
    Sample { regex: "a{,2}b", flags: Flags::empty(), input: "aaab", expect: Some((1, 4, 0)) },
    Sample { regex: "(ab){2}", flags: Flags::empty(), input: "ababab", expect: Some((0, 4, 0)) },
    Sample { regex: "(a|b){3}", flags: Flags::empty(), input: "xbaby", expect: Some((1, 4, 0)) },
    Sample { regex: "ab{0,0}c", flags: Flags::empty(), input: "ac", expect: Some((0, 2, 0)) },
    Sample { regex: "ab{0,0}c", flags: Flags::empty(), input: "abc", expect: None },
    // grouping and nesting
    Sample { regex: "a(b|c)*d", flags: Flags::empty(), input: "abbcdxx", expect: Some((0, 5, 0)) },
    Sample { regex: "a(b|c)*d", flags: Flags::empty(), input: "adxx", expect: Some((0, 2, 0)) },
    Sample { regex: "x(y(z|w)+)*", flags: Flags::empty(), input: "xyzyw", expect: Some((0, 5, 0)) },
    Sample { regex: "()", flags: Flags::empty(), input: "ab", expect: Some((1, 1, 0)) },
    // character classes
    Sample { regex: "[abc]+", flags: Flags::empty(), input: "zzcabz", expect: Some((2, 5, 0)) },
    Sample { regex: "[a-f]+", flags: Flags::empty(), input: "xxdeadbeefxx", expect: Some((2, 10, 0)) },
    Sample { regex: "[^abc]+", flags: Flags::empty(), input: "abxyzab", expect: Some((2, 5, 0)) },
    Sample { regex: "[]x]+", flags: Flags::empty(), input: "a]x]b", expect: Some((1, 4, 0)) },
    Sample { regex: "[a-]", flags: Flags::empty(), input: "z-z", expect: Some((1, 2, 0)) },
    Sample { regex: "[z-a]", flags: Flags::empty(), input: "m", expect: Some((0, 1, 0)) },
    // dot and newline handling
    Sample { regex: "a.c", flags: Flags::empty(), input: "azc", expect: Some((0, 3, 0)) },
    Sample { regex: "a.c", flags: Flags::empty(), input: "a\nc", expect: Some((0, 3, 0)) },
    Sample { regex: "a.c", flags: NL, input: "a\nc", expect: None },
    Sample { regex: "a.*b", flags: NL, input: "ax\nyb", expect: None },
    Sample { regex: "a.*b", flags: Flags::empty(), input: "ax\nyb", expect: Some((0, 5, 0)) },
    Sample { regex: "[^x]", flags: NL, input: "\r", expect: None },
    // anchors
    Sample { regex: "^foo$", flags: Flags::empty(), input: "foo", expect: Some((0, 3, 0)) },
    Sample { regex: "foo", flags: B.union(E), input: "foo", expect: Some((0, 3, 0)) },
    Sample { regex: "^foo$", flags: Flags::empty(), input: "foox", expect: None },
    Sample { regex: "^foo$", flags: Flags::empty(), input: "xfoo", expect: None },
    Sample { regex: "^fo+", flags: Flags::empty(), input: "foooo", expect: Some((0, 5, 0)) },
    Sample { regex: "o+$", flags: Flags::empty(), input: "foo", expect: Some((1, 3, 0)) },
    Sample { regex: "a$b", flags: Flags::empty(), input: "a$b", expect: Some((0, 3, 0)) },
    // id tags
    Sample { regex: "(ab){3!}", flags: Flags::empty(), input: "ababab", expect: Some((0, 2, 3)) },
    Sample { regex: "(ab){3}{3!}", flags: Flags::empty(), input: "ababab", expect: Some((0, 6, 3)) },
    Sample { regex: "cat{1!}|dog{2!}", flags: Flags::empty(), input: "hotdog", expect: Some((3, 6, 2)) },
    Sample { regex: "(a){1!}|(a){2!}", flags: Flags::empty(), input: "a", expect: Some((0, 1, 2)) },
    Sample { regex: "{5!}ab", flags: B, input: "ab", expect: Some((0, 2, 5)) },
    // best-match selection
    Sample { regex: "ab|b", flags: Flags::empty(), input: "xxbxabyy", expect: Some((2, 3, 0)) },
    Sample { regex: "b|ab", flags: Flags::empty(), input: "xab", expect: Some((1, 3, 0)) },
    Sample { regex: "a+", flags: Flags::empty(), input: "baaac", expect: Some((1, 4, 0)) },
    Sample { regex: "a+", flags: NG, input: "baaac", expect: Some((1, 2, 0)) },
    // literal brace forms
    Sample { regex: "a{b}", flags: Flags::empty(), input: "xa{b}y", expect: Some((1, 5, 0)) },
    Sample { regex: "a{", flags: Flags::empty(), input: "a{", expect: Some((0, 2, 0)) },
    // multibyte characters count as single positions
    Sample { regex: "é+", flags: Flags::empty(), input: "xéé", expect: Some((1, 3, 0)) },
    Sample { regex: "[α-ω]+", flags: Flags::empty(), input: "abγδz", expect: Some((2, 4, 0)) },
];

fn feed_result(m: &mut Match, chunks: &[&str]) -> Option<(usize, usize, u32)> {
    for chunk in chunks {
        m.feed(chunk);
    }
    m.result().map(|r| (r.begin, r.end, r.id))
}

#[test]
fn test_samples_whole_input() {
    for s in SAMPLES {
        let machine = compile(s.regex, s.flags)
            .unwrap_or_else(|e| panic!("{:?} failed to compile: {}", s.regex, e));
        let mut m = Match::new(machine);
        let got = feed_result(&mut m, &[s.input]);
        assert_eq!(got, s.expect, "{:?} flags {:?} on {:?}", s.regex, s.flags, s.input);
    }
}

#[test]
fn test_samples_every_split() {
    for s in SAMPLES {
        let machine = compile(s.regex, s.flags).unwrap();
        for (split, _) in s.input.char_indices().skip(1) {
            let mut m = Match::new(machine.clone());
            let got = feed_result(&mut m, &[&s.input[..split], &s.input[split..]]);
            assert_eq!(
                got, s.expect,
                "{:?} on {:?} split at byte {}",
                s.regex, s.input, split
            );
        }
    }
}

#[test]
fn test_samples_after_reset() {
    for s in SAMPLES {
        let machine = compile(s.regex, s.flags).unwrap();
        let mut m = Match::new(machine);
        m.feed(s.input);
        m.reset();
        let got = feed_result(&mut m, &[s.input]);
        assert_eq!(got, s.expect, "{:?} on {:?} after reset", s.regex, s.input);
    }
}
