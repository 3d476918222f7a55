use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::models::{Marker, NormalizedDocument, any_marker_pattern};

/// Configuration for the tag normalizer
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Upper bound on full passes over the table before giving up on a fixpoint
    pub max_rounds: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self { max_rounds: 8 }
    }
}

/// A named, pure text rewrite
///
/// Every pass leaves the text single-spaced and trimmed, and every pass is a
/// no-op on text that the full table has already brought to a fixpoint.
#[derive(Debug, Clone, Copy)]
pub struct NormalizePass {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

/// The ordered pass table. Later passes rely on the spacing guarantees of
/// `seed_markers`: every marker literal is surrounded by single spaces.
pub const PASSES: [NormalizePass; 7] = [
    NormalizePass {
        name: "seed_markers",
        apply: seed_markers,
    },
    NormalizePass {
        name: "optimize_tag_runs",
        apply: optimize_tag_runs,
    },
    NormalizePass {
        name: "optimize_bold_spans",
        apply: optimize_bold_spans,
    },
    NormalizePass {
        name: "normalize_punctuation",
        apply: normalize_punctuation,
    },
    NormalizePass {
        name: "reconstruct_spaced_headers",
        apply: reconstruct_spaced_headers,
    },
    NormalizePass {
        name: "remove_repeating_punctuation",
        apply: remove_repeating_punctuation,
    },
    NormalizePass {
        name: "repair_marker_spelling",
        apply: repair_marker_spelling,
    },
];

/// Perform Stage 1: normalize a raw marker-seeded string
pub fn execute_normalize(raw: &str, config: &NormalizerConfig) -> NormalizedDocument {
    NormalizedDocument::new(normalize_text(raw, config))
}

/// Apply the pass table until the text stops changing
pub fn normalize_text(text: &str, config: &NormalizerConfig) -> String {
    let mut current = text.to_string();

    for round in 0..config.max_rounds {
        let next = apply_passes(&current);
        if next == current {
            debug!("Normalization reached a fixpoint after {} round(s)", round);
            return current;
        }
        current = next;
    }

    warn!(
        "Normalization did not converge within {} rounds",
        config.max_rounds
    );
    current
}

/// One round over the table, in order
pub fn apply_passes(text: &str) -> String {
    PASSES
        .iter()
        .fold(text.to_string(), |acc, pass| (pass.apply)(&acc))
}

static MULTI_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ ]{2,}").expect("Invalid multi-space regex"));

static ANY_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&any_marker_pattern()).expect("Invalid marker regex"));

static MULTISPACE_LINEBREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"{}\s*{}",
        regex::escape(Marker::MultiSpace.literal()),
        regex::escape(Marker::LineBreak.literal())
    ))
    .expect("Invalid paragraph regex")
});

const CHAR_SUBSTITUTIONS: &[(char, &str)] = &[
    ('\u{FFFD}', ""),
    ('\u{00A9}', ""),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{2013}', "-"),
    ('\u{2014}', "--"),
    ('\u{2022}', "-"),
    ('\u{2023}', "-"),
    ('\u{25CF}', "-"),
    ('\u{25E6}', "-"),
    ('\u{25AA}', "-"),
];

const CONTROL_MARKERS: &[(char, Marker)] = &[
    ('\u{00A0}', Marker::NonBreakingSpace),
    ('\u{000C}', Marker::PageBreak),
    ('\n', Marker::LineBreak),
    ('\t', Marker::Tab),
];

/// Map a single character the way the seeding pass does, if it maps at all
pub fn substitute_char(c: char) -> Option<&'static str> {
    CHAR_SUBSTITUTIONS
        .iter()
        .find(|(from, _)| *from == c)
        .map(|(_, to)| *to)
}

/// Pass 1: character substitution and marker seeding
///
/// Post: no raw newline, tab, form feed or NBSP remains; literal space runs
/// became MultiSpace; MultiSpace directly before LineBreak became
/// ParagraphBreak; markers are space-padded.
fn seed_markers(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match substitute_char(c) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(c),
        }
    }

    let multi = format!(" {} ", Marker::MultiSpace);
    let mut out = MULTI_SPACE.replace_all(&out, multi.as_str()).into_owned();

    for (c, marker) in CONTROL_MARKERS {
        if out.contains(*c) {
            out = out.replace(*c, &format!(" {} ", marker));
        }
    }

    let out = pad_markers(&out);
    let paragraph = format!(" {} ", Marker::ParagraphBreak);
    let out = MULTISPACE_LINEBREAK.replace_all(&out, paragraph.as_str());

    collapse_whitespace(&out)
}

struct TagRunRules {
    marker: Marker,
    bracketed: Regex,
    repeated: Regex,
}

static TAG_RUN_RULES: LazyLock<Vec<TagRunRules>> = LazyLock::new(|| {
    Marker::ALL
        .into_iter()
        .filter(|m| !m.is_bold())
        .map(|marker| {
            let lit = regex::escape(marker.literal());
            TagRunRules {
                marker,
                bracketed: Regex::new(&format!(
                    r"{lit}(?:\s*(?:[A-Za-z0-9]|[,.;:!?\-])\s*{lit})+"
                ))
                .expect("Invalid bracketed tag regex"),
                repeated: Regex::new(&format!(r"(?:{lit}\s*){{2,}}"))
                    .expect("Invalid repeated tag regex"),
            }
        })
        .collect()
});

/// Pass 2: tag-run optimization
///
/// `M x M` with a single letter, digit or punctuation mark collapses to `M`
/// (whole chains `M x M y M ...` at once); consecutive identical markers
/// collapse to one. Loops to its own fixpoint: one marker's rewrite can expose
/// a new run for another.
fn optimize_tag_runs(text: &str) -> String {
    let mut current = collapse_whitespace(&pad_markers(text));

    loop {
        let mut out = current.clone();
        for rule in TAG_RUN_RULES.iter() {
            let lit = rule.marker.literal();
            if !out.contains(lit) {
                continue;
            }
            let single = format!(" {} ", lit);
            out = rule.bracketed.replace_all(&out, single.as_str()).into_owned();
            out = rule.repeated.replace_all(&out, single.as_str()).into_owned();
        }

        // every rewrite drops a marker or a character, so this terminates
        let out = collapse_whitespace(&pad_markers(&out));
        if out == current {
            return out;
        }
        current = out;
    }
}

static BOLD_SINGLE_CHAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"{}\s*([A-Za-z0-9]|[,.;:!?\-])\s*{}",
        regex::escape(Marker::BoldOpen.literal()),
        regex::escape(Marker::BoldClose.literal())
    ))
    .expect("Invalid bold single-char regex")
});

static BOLD_ADJACENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"{}\s*{}",
        regex::escape(Marker::BoldClose.literal()),
        regex::escape(Marker::BoldOpen.literal())
    ))
    .expect("Invalid adjacent bold regex")
});

/// Pass 3: bold-span optimization
///
/// Bold around a single character is dropped (the character stays);
/// `<-BOLD> <BOLD->` disappears so adjacent bold spans merge.
fn optimize_bold_spans(text: &str) -> String {
    if !text.contains(Marker::BoldOpen.literal()) {
        return text.to_string();
    }
    let out = BOLD_SINGLE_CHAR.replace_all(text, " ${1} ");
    let out = BOLD_ADJACENT.replace_all(&out, " ");
    collapse_whitespace(&pad_markers(&out))
}

static COLON_BEFORE_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":(\w)").expect("Invalid colon regex"));

static SPACE_BEFORE_COLON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w)\s+:").expect("Invalid space-colon regex"));

static ISOLATED_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[,.;:!?]\s+").expect("Invalid isolated punctuation regex"));

/// Pass 4: punctuation normalization
fn normalize_punctuation(text: &str) -> String {
    let out = COLON_BEFORE_WORD.replace_all(text, ": ${1}");
    let out = SPACE_BEFORE_COLON.replace_all(&out, "${1}:");
    let out = ISOLATED_PUNCTUATION.replace_all(&out, " ");
    collapse_whitespace(&out)
}

static SPACED_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)([A-Z](?:\s+[A-Z0-9]){2,})(?:\s|$)").expect("Invalid spaced run regex")
});

static WIDE_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("Invalid wide gap regex"));

static CASE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("Invalid case boundary regex"));

static DIGIT_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d)\s+(\d)").expect("Invalid digit gap regex"));

static PERIOD_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z]{1,2}\d)((?:19|20)\d{2})$").expect("Invalid period-year regex")
});

/// Pass 5: spaced-header reconstruction
///
/// `Q 2 2 0 2 3  E A R N I N G S` becomes `Q2 2023 EARNINGS`. Runs inside a
/// (mis-spelled) marker literal are left for `repair_marker_spelling`.
fn reconstruct_spaced_headers(text: &str) -> String {
    let out = SPACED_RUN.replace_all(text, |caps: &Captures| {
        let whole = caps.get(0).map(|m| m.range()).unwrap_or_default();
        let run = match caps.get(1) {
            Some(run) => run,
            None => return text[whole].to_string(),
        };

        let run_text = run.as_str();
        if !is_spaced_header(run_text) || inside_marker(text, run.end()) {
            return text[whole].to_string();
        }

        format!(
            "{}{}{}",
            &text[whole.start..run.start()],
            rebuild_spaced_header(run_text),
            &text[run.end()..whole.end]
        )
    });

    collapse_whitespace(&out)
}

/// A letter-led run with two or more letters, or a lone letter spelling out
/// a period and year (`Q 2 2 0 2 3`). `A 1 2` stays prose.
fn is_spaced_header(run: &str) -> bool {
    let letters = run.chars().filter(|c| c.is_ascii_uppercase()).count();
    if letters >= 2 {
        return true;
    }
    let condensed: String = run.split_whitespace().collect();
    PERIOD_YEAR.is_match(&condensed)
}

/// Condense one spaced run into words
pub fn rebuild_spaced_header(run: &str) -> String {
    let words: Vec<String> = if WIDE_GAP.is_match(run) {
        WIDE_GAP
            .split(run)
            .map(|word| word.split_whitespace().collect::<String>())
            .filter(|word| !word.is_empty())
            .collect()
    } else {
        let condensed: String = run.split_whitespace().collect();
        let spaced = CASE_BOUNDARY.replace_all(&condensed, "${1} ${2}");
        let merged = DIGIT_GAP.replace_all(&spaced, "${1}${2}");
        merged.split_whitespace().map(str::to_string).collect()
    };

    words
        .iter()
        .map(|word| PERIOD_YEAR.replace(word, "${1} ${2}").into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether `pos` sits between a `<` and its closing `>`
fn inside_marker(text: &str, pos: usize) -> bool {
    for c in text[pos..].chars() {
        match c {
            '<' => return false,
            '>' => return true,
            _ => {}
        }
    }
    false
}

static REPEATED_PUNCTUATION: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [r"\.(?:\s*\.){2,}", r"!(?:\s*!){2,}", r"\?(?:\s*\?){2,}"]
        .map(|p| Regex::new(p).expect("Invalid repeated punctuation regex"))
});

/// Pass 6: remove runs of three or more `.`, `!` or `?`
fn remove_repeating_punctuation(text: &str) -> String {
    let mut out = text.to_string();
    for re in REPEATED_PUNCTUATION.iter() {
        out = re.replace_all(&out, " ").into_owned();
    }
    collapse_whitespace(&out)
}

static SPLIT_MARKERS: LazyLock<Vec<(Marker, Regex)>> = LazyLock::new(|| {
    Marker::ALL
        .into_iter()
        .map(|m| {
            let re = Regex::new(&m.spaced_pattern()).expect("Invalid split marker regex");
            (m, re)
        })
        .collect()
});

/// Pass 7: restore marker literals whose characters were split by spaces
fn repair_marker_spelling(text: &str) -> String {
    if !text.contains('<') {
        return text.to_string();
    }
    let mut out = text.to_string();
    for (marker, re) in SPLIT_MARKERS.iter() {
        out = re.replace_all(&out, marker.literal()).into_owned();
    }
    collapse_whitespace(&pad_markers(&out))
}

/// Surround every marker literal with spaces (collapse afterwards)
fn pad_markers(text: &str) -> String {
    if !text.contains('<') {
        return text.to_string();
    }
    ANY_MARKER.replace_all(text, " ${0} ").into_owned()
}

/// Single-space all whitespace and trim
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(text: &str) -> String {
        normalize_text(text, &NormalizerConfig::default())
    }

    #[test]
    fn test_spaced_header_with_wide_gap() {
        assert_eq!(
            reconstruct_spaced_headers("Q 2 2 0 2 3  E A R N I N G S"),
            "Q2 2023 EARNINGS"
        );
    }

    #[test]
    fn test_spaced_header_through_full_pipeline() {
        assert_eq!(
            normalize("Q 2 2 0 2 3  E A R N I N G S"),
            "Q2 2023 <TAG_3> EARNINGS"
        );
    }

    #[test]
    fn test_spaced_header_single_spaced() {
        assert_eq!(rebuild_spaced_header("Q 2 E A R N I N G S"), "Q2 EARNINGS");
        assert_eq!(reconstruct_spaced_headers("the U S A today"), "the USA today");
    }

    #[test]
    fn test_spaced_header_left_alone() {
        // digits only, too short, glued to a word, or inside a marker
        assert_eq!(reconstruct_spaced_headers("1 2 3"), "1 2 3");
        assert_eq!(reconstruct_spaced_headers("A B"), "A B");
        assert_eq!(reconstruct_spaced_headers("xA B C"), "xA B C");
        assert_eq!(reconstruct_spaced_headers("< T A G _ 2 >"), "< T A G _ 2 >");
    }

    #[test]
    fn test_spaced_digits_in_prose_left_alone() {
        assert_eq!(
            reconstruct_spaced_headers("options A 1 2 were chosen"),
            "options A 1 2 were chosen"
        );
        assert_eq!(
            reconstruct_spaced_headers("we sold 2 3 4 A grade units"),
            "we sold 2 3 4 A grade units"
        );
        assert_eq!(reconstruct_spaced_headers("the Q 2 2 0 2 3 call"), "the Q2 2023 call");
    }

    #[test]
    fn test_seed_markers() {
        let out = seed_markers("Hello\u{2019}s world\nNext\tcol\u{00A0}x");
        assert_eq!(out, "Hello's world <TAG_2> Next <TAB> col <NBSP> x");
    }

    #[test]
    fn test_seed_multispace_and_paragraph() {
        assert_eq!(seed_markers("a   b"), "a <TAG_3> b");
        assert_eq!(seed_markers("end  \nnext"), "end <TAG_4> next");
        assert_eq!(seed_markers("end  <TAG_2>next"), "end <TAG_4> next");
    }

    #[test]
    fn test_dashes_and_quotes() {
        assert_eq!(
            seed_markers("\u{201C}Jane\u{201D} \u{2014} CEO \u{2013} Acme \u{2022} VP"),
            "\"Jane\" -- CEO - Acme - VP"
        );
    }

    #[test]
    fn test_optimize_tag_runs() {
        assert_eq!(optimize_tag_runs("a <TAG_2> Q <TAG_2> b"), "a <TAG_2> b");
        assert_eq!(optimize_tag_runs("a <TAG_2> 7 <TAG_2> b"), "a <TAG_2> b");
        assert_eq!(optimize_tag_runs("a <TAG_2> <TAG_2> <TAG_2> b"), "a <TAG_2> b");
        assert_eq!(optimize_tag_runs("a <TAG_2> - <TAG_2> b"), "a <TAG_2> b");
        assert_eq!(optimize_tag_runs("a <TAG_2> <TAG_3> b"), "a <TAG_2> <TAG_3> b");
    }

    #[test]
    fn test_optimize_tag_runs_consumes_long_chains() {
        let mut chain = String::from("start");
        for i in 0..600 {
            chain.push_str(if i % 2 == 0 { " <TAG_2> a" } else { " <TAG_2> b" });
        }
        chain.push_str(" <TAG_2> end");

        assert_eq!(optimize_tag_runs(&chain), "start <TAG_2> end");
        assert_eq!(normalize(&chain), "start <TAG_2> end");
        assert_eq!(
            optimize_tag_runs("x <TAG_3> 1 <TAG_3> <TAG_2> , <TAG_2> y"),
            "x <TAG_3> <TAG_2> y"
        );
    }

    #[test]
    fn test_optimize_bold_spans() {
        assert_eq!(optimize_bold_spans("<BOLD-> : <-BOLD>"), ":");
        assert_eq!(
            optimize_bold_spans("<BOLD-> John <-BOLD> <BOLD-> Smith <-BOLD>"),
            "<BOLD-> John Smith <-BOLD>"
        );
        assert_eq!(optimize_bold_spans("<BOLD-> A <-BOLD> x"), "A x");
    }

    #[test]
    fn test_normalize_punctuation() {
        assert_eq!(normalize_punctuation("Note:this"), "Note: this");
        assert_eq!(normalize_punctuation("John Smith :"), "John Smith:");
        assert_eq!(normalize_punctuation("well , then"), "well then");
        assert_eq!(normalize_punctuation("<TAG_2> : John"), "<TAG_2> John");
    }

    #[test]
    fn test_remove_repeating_punctuation() {
        assert_eq!(remove_repeating_punctuation("Operator........ 3"), "Operator 3");
        assert_eq!(remove_repeating_punctuation("wait . . . what"), "wait what");
        assert_eq!(remove_repeating_punctuation("Really?!"), "Really?!");
        assert_eq!(remove_repeating_punctuation("no!!!"), "no");
    }

    #[test]
    fn test_repair_marker_spelling() {
        assert_eq!(repair_marker_spelling("a < T A G _ 2 > b"), "a <TAG_2> b");
        assert_eq!(repair_marker_spelling("<B O L D - >x< - BOLD>"), "<BOLD-> x <-BOLD>");
    }

    #[test]
    fn test_normalize_full_example() {
        let raw = "OPERATOR: Good morning.  \nJohn Smith :Thank you......\n<BOLD->Jane<-BOLD><BOLD->Doe<-BOLD>";
        let out = normalize(raw);
        assert_eq!(
            out,
            "OPERATOR: Good morning. <TAG_4> John Smith: Thank you <TAG_2> <BOLD-> Jane Doe <-BOLD>"
        );
    }

    #[test]
    fn test_idempotence() {
        let inputs = [
            "Q 2 2 0 2 3  E A R N I N G S\nJOHN SMITH: Hello",
            "a <TAG_2> b <TAG_2> c <TAG_2> d",
            "x<TAG_3><TAG_2><TAG_2> y",
            "Thanks... very much!!! Next ? ? ? item",
            "< T A G _ 2 > Operator <BOLD-> : <-BOLD> hi",
            "<BOLD-> A <-BOLD> <BOLD-> B <-BOLD> <TAG_2> , <TAG_2>",
            "time 10:30 , then : ok",
            "\u{00A0}\u{00A0}lead\t\ttabs\u{000C}page",
            "",
            "   ",
        ];
        let mut chain = String::from("start");
        for i in 0..600 {
            chain.push_str(if i % 2 == 0 { " <TAG_2> a" } else { " <TAG_2> b" });
        }
        chain.push_str(" <TAG_2> end");
        let inputs = inputs.iter().map(|s| s.to_string()).chain([chain]);

        for input in inputs {
            let once = normalize(&input);
            let twice = normalize(&once);
            assert_eq!(once, twice, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_every_pass_is_stable_on_fixpoint() {
        let fixed = normalize("Jane Doe -- CFO <TAG_2> We grew . . . a lot\n\nOPERATOR  \nNext");
        for pass in PASSES.iter() {
            assert_eq!((pass.apply)(&fixed), fixed, "pass {} changed a fixpoint", pass.name);
        }
    }
}
