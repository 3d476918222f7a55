use std::ops::Range;

use super::tokenizer::Token;

/// How many consecutive tokens an element consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    One,
    Optional,
    OneOrMore,
    ZeroOrMore,
    /// Between zero and n tokens
    UpTo(usize),
}

impl Quantifier {
    fn bounds(self) -> (usize, usize) {
        match self {
            Quantifier::One => (1, 1),
            Quantifier::Optional => (0, 1),
            Quantifier::OneOrMore => (1, usize::MAX),
            Quantifier::ZeroOrMore => (0, usize::MAX),
            Quantifier::UpTo(n) => (0, n),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PatternElement {
    pub predicate: fn(&Token) -> bool,
    pub quantifier: Quantifier,
}

const fn element(predicate: fn(&Token) -> bool, quantifier: Quantifier) -> PatternElement {
    PatternElement {
        predicate,
        quantifier,
    }
}

/// A named token-sequence pattern
#[derive(Debug, Clone, Copy)]
pub struct PatternRule {
    pub name: &'static str,
    pub elements: &'static [PatternElement],
}

fn proper_noun(token: &Token) -> bool {
    token.proper_noun
}

fn sentence_initial_proper_noun(token: &Token) -> bool {
    token.proper_noun && token.sentence_start
}

fn non_proper_noun(token: &Token) -> bool {
    !token.proper_noun && !token.is_marker()
}

fn punctuation(token: &Token) -> bool {
    token.is_punct()
}

fn marker(token: &Token) -> bool {
    token.is_marker()
}

/// Speaker attribution shapes, in evaluation order
pub const DEFAULT_RULES: [PatternRule; 3] = [
    PatternRule {
        name: "name_punctuation",
        elements: &[
            element(proper_noun, Quantifier::OneOrMore),
            element(punctuation, Quantifier::One),
        ],
    },
    PatternRule {
        name: "sentence_name_marker",
        elements: &[
            element(sentence_initial_proper_noun, Quantifier::One),
            element(proper_noun, Quantifier::ZeroOrMore),
            element(marker, Quantifier::One),
        ],
    },
    PatternRule {
        name: "sentence_name_gap_name_marker",
        elements: &[
            element(sentence_initial_proper_noun, Quantifier::One),
            element(proper_noun, Quantifier::ZeroOrMore),
            element(non_proper_noun, Quantifier::UpTo(6)),
            element(proper_noun, Quantifier::OneOrMore),
            element(marker, Quantifier::One),
        ],
    },
];

impl PatternRule {
    /// Non-overlapping matches as token index ranges, scanning left to right
    /// and taking the longest match at each start
    pub fn find_matches(&self, tokens: &[Token]) -> Vec<Range<usize>> {
        let mut matches = Vec::new();
        let mut pos = 0;

        while pos < tokens.len() {
            match longest_match(self.elements, tokens, pos).filter(|end| *end > pos) {
                Some(end) => {
                    matches.push(pos..end);
                    pos = end;
                }
                None => pos += 1,
            }
        }

        matches
    }
}

fn longest_match(elements: &[PatternElement], tokens: &[Token], pos: usize) -> Option<usize> {
    let Some((first, rest)) = elements.split_first() else {
        return Some(pos);
    };

    let (min, max) = first.quantifier.bounds();
    let available = tokens[pos..]
        .iter()
        .take(max)
        .take_while(|t| (first.predicate)(t))
        .count();

    if available < min {
        return None;
    }

    (min..=available)
        .rev()
        .filter_map(|taken| longest_match(rest, tokens, pos + taken))
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::tokenize;

    fn matched<'a>(rule: &PatternRule, text: &'a str) -> Vec<&'a str> {
        let tokens = tokenize(text);
        rule.find_matches(&tokens)
            .into_iter()
            .map(|r| &text[tokens[r.start].start..tokens[r.end - 1].end])
            .collect()
    }

    #[test]
    fn test_name_punctuation() {
        assert_eq!(
            matched(&DEFAULT_RULES[0], "<TAG_2> John Smith: Thanks, we grew."),
            vec!["John Smith:"]
        );
    }

    #[test]
    fn test_sentence_name_marker() {
        assert_eq!(
            matched(&DEFAULT_RULES[1], "<TAG_2> Jane Doe <TAG_2> Thanks Bob <TAG_2>"),
            vec!["Jane Doe <TAG_2>"]
        );
    }

    #[test]
    fn test_sentence_name_gap_name_marker() {
        assert_eq!(
            matched(
                &DEFAULT_RULES[2],
                "<TAG_2> Jane Doe from the Example Bank <TAG_2> Hello"
            ),
            vec!["Jane Doe from the Example Bank <TAG_2>"]
        );
    }

    #[test]
    fn test_gap_is_bounded() {
        let text = "<TAG_2> Jane one two three four five six seven Bank <TAG_2>";
        assert!(matched(&DEFAULT_RULES[2], text).is_empty());
    }

    #[test]
    fn test_backtracking_leaves_name_for_final_element() {
        // the greedy PROPN* must give back "Doe" so PROPN+ can match
        assert_eq!(
            matched(&DEFAULT_RULES[2], "<TAG_2> Jane Doe <TAG_2>"),
            vec!["Jane Doe <TAG_2>"]
        );
    }
}
