use crate::models::Marker;

/// Capitalized words that never count as proper nouns
pub const FUNCTION_WORDS: &[&str] = &[
    "I", "A", "An", "The", "And", "But", "Or", "So", "We", "Our", "Us", "You", "Your", "It",
    "Its", "This", "That", "These", "Those", "There", "Here", "Thank", "Thanks", "Good", "Yes",
    "No", "Okay", "Ok", "Well", "In", "On", "At", "For", "Of", "To", "With", "As", "If", "Now",
    "Let", "Please", "Hello", "Hi", "He", "She", "They", "Their", "My", "Me", "Is", "Are", "Was",
    "Be", "Do", "Did", "Can", "Could", "Would", "Will", "Just", "Sure", "Right", "Great", "Also",
    "Then", "What", "When", "How", "Why", "Who", "Which", "Next", "First", "Finally", "Sorry",
    "Hey", "Morning", "Afternoon", "Evening", "Everyone", "All",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Punct,
    Marker(Marker),
}

/// A token with the lexical features the pattern rules look at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    pub proper_noun: bool,
    pub sentence_start: bool,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }

    pub fn is_punct(&self) -> bool {
        self.kind == TokenKind::Punct
    }

    pub fn marker(&self) -> Option<Marker> {
        match self.kind {
            TokenKind::Marker(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_marker(&self) -> bool {
        self.marker().is_some()
    }
}

/// Split `text` into words, single punctuation characters and atomic marker
/// literals, then annotate proper-noun and sentence-start features
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(c) = text[pos..].chars().next() {
        if c.is_whitespace() {
            pos += c.len_utf8();
            continue;
        }

        let (kind, end) = if let Some(marker) = Marker::at_start(&text[pos..]) {
            (TokenKind::Marker(marker), pos + marker.literal().len())
        } else if c.is_alphanumeric() {
            (TokenKind::Word, word_end(text, pos))
        } else {
            (TokenKind::Punct, pos + c.len_utf8())
        };

        tokens.push(Token {
            kind,
            start: pos,
            end,
            proper_noun: false,
            sentence_start: false,
        });
        pos = end;
    }

    annotate(text, &mut tokens);
    tokens
}

/// End of the word starting at `start`; `'`, `-` and `&` join alphanumerics
fn word_end(text: &str, start: usize) -> usize {
    let mut chars = text[start..].char_indices().peekable();
    let mut end = start;

    while let Some((offset, c)) = chars.next() {
        let joins = matches!(c, '\'' | '-' | '&')
            && chars.peek().is_some_and(|(_, next)| next.is_alphanumeric());
        if !c.is_alphanumeric() && !joins {
            break;
        }
        end = start + offset + c.len_utf8();
    }

    end
}

fn annotate(text: &str, tokens: &mut [Token]) {
    let mut after_boundary = true;

    for token in tokens.iter_mut() {
        token.sentence_start = after_boundary;
        token.proper_noun = token.is_word() && is_proper_noun(token.text(text));

        match token.kind {
            TokenKind::Marker(m) if m.is_bold() => {}
            TokenKind::Marker(m) => after_boundary = m.is_break(),
            TokenKind::Punct => after_boundary = matches!(token.text(text), "." | "!" | "?"),
            TokenKind::Word => after_boundary = false,
        }
    }
}

/// Capitalized word outside the function-word lexicon
pub fn is_proper_noun(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase) && !is_function_word(word)
}

pub fn is_function_word(word: &str) -> bool {
    FUNCTION_WORDS.iter().any(|w| w.eq_ignore_ascii_case(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(source: &'a str, tokens: &[Token]) -> Vec<&'a str> {
        tokens.iter().map(|t| t.text(source)).collect()
    }

    #[test]
    fn test_markers_are_atomic() {
        let text = "<TAG_2> <BOLD-> O'Brien <-BOLD>: AT&T, co-CEO.";
        let tokens = tokenize(text);

        assert_eq!(
            texts(text, &tokens),
            vec!["<TAG_2>", "<BOLD->", "O'Brien", "<-BOLD>", ":", "AT&T", ",", "co-CEO", "."]
        );
        assert_eq!(tokens[0].marker(), Some(Marker::LineBreak));
        assert_eq!(tokens[3].marker(), Some(Marker::BoldClose));
        assert!(tokens[4].is_punct());
    }

    #[test]
    fn test_trailing_joiner_is_punctuation() {
        let text = "Smith- ok";
        assert_eq!(texts(text, &tokenize(text)), vec!["Smith", "-", "ok"]);
    }

    #[test]
    fn test_features() {
        let text = "Thanks John. <TAG_2> <BOLD-> Jane Doe <-BOLD> and Bob";
        let tokens = tokenize(text);
        let find = |w: &str| tokens.iter().find(|t| t.text(text) == w).unwrap().clone();

        assert!(find("Thanks").sentence_start);
        assert!(!find("Thanks").proper_noun);
        assert!(find("John").proper_noun);
        assert!(!find("John").sentence_start);
        assert!(find("Jane").sentence_start);
        assert!(!find("Doe").sentence_start);
        assert!(find("Bob").proper_noun);
        assert!(!find("and").proper_noun);
    }
}
