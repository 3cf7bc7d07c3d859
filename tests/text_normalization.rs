//! Text cleaning and wrapping tests.

use vobsrt::text::{MAX_LINES, clean_text, normalize, wrap_text};

const SAMPLES: &[&str] = &[
    "",
    "Hello world",
    "  |t's  caf\u{e9} ~ time!  ",
    "/ don't know \\ what you mean.",
    "\u{201c}Stop!\u{201d} she said \u{2014} twice\u{2026}",
    "Na\u{ef}ve \u{bd} price: \u{a3}5 @ #home",
    "Stra\u{df}e\tund\nWeg",
    "\u{b0}\u{b9}\u{b2}\u{b3} <>[]{} *&^%$",
    "a",
    "-- (ok) --",
];

// ── Cleaning ───────────────────────────────────────────────────────

#[test]
fn repairs_italic_capital_i() {
    assert_eq!(clean_text("/ am here"), "I am here");
    assert_eq!(clean_text("|t was \\t"), "It was It");
}

#[test]
fn replaces_accented_letters() {
    assert_eq!(clean_text("Cr\u{e8}me br\u{fb}l\u{e9}e"), "Creme brulee");
    assert_eq!(clean_text("\u{c9}T\u{c9}"), "ETE");
    assert_eq!(clean_text("Stra\u{df}e"), "Strasse");
}

#[test]
fn replaces_typographic_punctuation() {
    assert_eq!(clean_text("\u{2018}Yes\u{2019}"), "'Yes'");
    assert_eq!(clean_text("\u{201c}No\u{201d}"), "\"No\"");
    assert_eq!(clean_text("wait\u{2014}what"), "wait-what");
    assert_eq!(clean_text("so\u{2026}"), "so...");
}

#[test]
fn strips_unsupported_characters() {
    assert_eq!(clean_text("Hi <there> [you] {all} *"), "Hi there you all");
    assert_eq!(clean_text("50% off @ #1"), "50 off 1");
    assert_eq!(clean_text("\u{263a} smile"), "smile");
}

#[test]
fn keeps_allowed_punctuation() {
    let text = "Well, (maybe): yes; no! \"Really?\" It's - over.";
    assert_eq!(clean_text(text), text);
}

#[test]
fn collapses_whitespace() {
    assert_eq!(clean_text("  one\t\ttwo\n\nthree  "), "one two three");
}

#[test]
fn empty_input_stays_empty() {
    assert_eq!(clean_text(""), "");
}

#[test]
fn cleaning_is_idempotent() {
    for sample in SAMPLES {
        let once = clean_text(sample);
        let twice = clean_text(&once);
        assert_eq!(once, twice, "cleaning {sample:?} is not idempotent");
    }
}

// ── Wrapping ───────────────────────────────────────────────────────

#[test]
fn short_text_is_unchanged() {
    assert_eq!(wrap_text("Hello world", 42), "Hello world");
}

#[test]
fn wraps_at_word_boundary() {
    assert_eq!(wrap_text("one two three", 7), "one two\nthree");
    assert_eq!(wrap_text("one two three", 8), "one two\nthree");
}

#[test]
fn keeps_at_most_two_lines() {
    let wrapped = wrap_text("alpha beta gamma delta epsilon zeta", 11);
    assert_eq!(wrapped, "alpha beta\ngamma delta");
}

#[test]
fn long_word_is_hyphenated() {
    assert_eq!(wrap_text("abcdefghij", 4), "abc-\ndef-");
    assert_eq!(wrap_text("go abcdefgh", 5), "go\nabcd-");
}

#[test]
fn single_column_breaks_every_character() {
    assert_eq!(wrap_text("abc de", 1), "a-\nb-");
    assert_eq!(wrap_text("a b", 1), "a\nb");
}

#[test]
fn wrapped_lines_respect_bound() {
    for sample in SAMPLES {
        let cleaned = clean_text(sample);
        for max_length in [1, 2, 3, 5, 8, 13, 42] {
            let wrapped = wrap_text(&cleaned, max_length);
            let lines: Vec<&str> = wrapped.lines().collect();
            assert!(lines.len() <= MAX_LINES, "{wrapped:?} has too many lines");
            for line in lines {
                // A hard break keeps at least one character before its hyphen.
                let limit = if line.ends_with('-') {
                    max_length.max(2)
                } else {
                    max_length
                };
                assert!(
                    line.chars().count() <= limit,
                    "line {line:?} exceeds {limit} characters"
                );
            }
        }
    }
}

#[test]
fn length_is_counted_in_characters() {
    let accented = "\u{e9}\u{e9}\u{e9} \u{e9}\u{e9}\u{e9}";
    assert_eq!(wrap_text(accented, 7), accented);
}

// ── Normalization ──────────────────────────────────────────────────

#[test]
fn normalize_cleans_and_wraps() {
    assert_eq!(
        normalize("  |'m   going  home now ", 10),
        Some("I'm going\nhome now".to_string())
    );
}

#[test]
fn too_short_text_is_discarded() {
    assert_eq!(normalize("", 42), None);
    assert_eq!(normalize("a", 42), None);
    assert_eq!(normalize(" * ", 42), None);
    assert_eq!(normalize("@ x #", 42), None);
    assert_eq!(normalize("Ok", 42), Some("Ok".to_string()));
}
