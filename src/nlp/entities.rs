use std::ops::Range;

use super::tokenizer::{Token, is_function_word, tokenize};

/// Capitalized words that belong to titles and company names, not people
const NON_NAME_WORDS: &[&str] = &[
    "Chief", "Executive", "Officer", "Financial", "Operating", "President", "Vice", "Senior",
    "Director", "Head", "Managing", "Analyst", "Chairman", "Chair", "Treasurer", "Secretary",
    "General", "Counsel", "Bank", "Group", "Holdings", "Inc", "Corp", "Corporation", "Company",
    "Capital", "Securities", "Research", "Partners", "Relations", "Investor", "Investors",
    "Operator", "Call", "Conference", "Earnings", "Quarter", "Results", "Question", "Questions",
    "Answer", "Session", "Q&A",
];

/// Source of person-name spans in the normalized document
pub trait EntityRecognizer: Send + Sync {
    fn name(&self) -> &str;

    /// Byte ranges of person names, in document order
    fn person_spans(&self, text: &str) -> Vec<Range<usize>>;
}

/// Lexical person recognizer: runs of title-case words, optionally with one
/// middle initial
#[derive(Debug, Clone)]
pub struct TitleCaseNameRecognizer {
    pub min_words: usize,
    pub max_words: usize,
}

impl Default for TitleCaseNameRecognizer {
    fn default() -> Self {
        Self {
            min_words: 2,
            max_words: 4,
        }
    }
}

impl EntityRecognizer for TitleCaseNameRecognizer {
    fn name(&self) -> &str {
        "title_case"
    }

    fn person_spans(&self, text: &str) -> Vec<Range<usize>> {
        let tokens = tokenize(text);
        let mut spans = Vec::new();
        let mut i = 0;

        while i < tokens.len() {
            match self.run_at(text, &tokens, i) {
                Some((span, next)) => {
                    spans.push(span);
                    i = next;
                }
                None => i += 1,
            }
        }

        spans
    }
}

impl TitleCaseNameRecognizer {
    /// A name run starting at token `i`, with the index after it
    fn run_at(&self, text: &str, tokens: &[Token], i: usize) -> Option<(Range<usize>, usize)> {
        if !is_name_word(text, &tokens[i]) {
            return None;
        }

        let start = tokens[i].start;
        let mut end = tokens[i].end;
        let mut words = 1;
        let mut used_initial = false;
        let mut j = i + 1;

        while j < tokens.len() && words < self.max_words {
            if is_name_word(text, &tokens[j]) {
                end = tokens[j].end;
                words += 1;
                j += 1;
                continue;
            }

            if used_initial || !is_initial(text, &tokens[j]) {
                break;
            }

            let mut k = j + 1;
            if k < tokens.len() && tokens[k].text(text) == "." && tokens[k].start == tokens[j].end
            {
                k += 1;
            }
            if k >= tokens.len() || !is_name_word(text, &tokens[k]) {
                break;
            }

            used_initial = true;
            end = tokens[k].end;
            words += 1;
            j = k + 1;
        }

        (words >= self.min_words).then_some((start..end, j))
    }
}

fn is_name_word(text: &str, token: &Token) -> bool {
    if !token.is_word() {
        return false;
    }
    let word = token.text(text);
    let mut chars = word.chars();
    let title_shape = chars.next().is_some_and(char::is_uppercase)
        && word.chars().count() >= 2
        && chars.any(char::is_lowercase);

    title_shape && !is_function_word(word) && !NON_NAME_WORDS.contains(&word)
}

fn is_initial(text: &str, token: &Token) -> bool {
    let word = token.text(text);
    token.is_word() && word.chars().count() == 1 && word.chars().all(char::is_uppercase)
}
