use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Inline structural marker standing in for layout lost during text extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    LineBreak,
    ParagraphBreak,
    MultiSpace,
    BoldOpen,
    BoldClose,
    NonBreakingSpace,
    /// Form feed inside a single page
    PageBreak,
    /// Boundary between two source pages
    PageSeparator,
    Tab,
}

impl Marker {
    /// Every marker, longest literal first so prefix scans never stop early
    pub const ALL: [Marker; 9] = [
        Marker::PageSeparator,
        Marker::PageBreak,
        Marker::ParagraphBreak,
        Marker::LineBreak,
        Marker::MultiSpace,
        Marker::BoldOpen,
        Marker::BoldClose,
        Marker::NonBreakingSpace,
        Marker::Tab,
    ];

    /// The exact literal embedded in the text stream
    pub fn literal(self) -> &'static str {
        match self {
            Marker::LineBreak => "<TAG_2>",
            Marker::MultiSpace => "<TAG_3>",
            Marker::ParagraphBreak => "<TAG_4>",
            Marker::BoldOpen => "<BOLD->",
            Marker::BoldClose => "<-BOLD>",
            Marker::NonBreakingSpace => "<NBSP>",
            Marker::PageBreak => "<PAGEBREAK>",
            Marker::PageSeparator => "<PAGE_BREAK>",
            Marker::Tab => "<TAB>",
        }
    }

    /// Human description used when explaining the markup to the resolver
    pub fn description(self) -> &'static str {
        match self {
            Marker::LineBreak => "line break",
            Marker::MultiSpace => "run of multiple spaces",
            Marker::ParagraphBreak => "paragraph break",
            Marker::BoldOpen => "start of bold text",
            Marker::BoldClose => "end of bold text",
            Marker::NonBreakingSpace => "non-breaking space",
            Marker::PageBreak => "page break inside a page",
            Marker::PageSeparator => "boundary between pages",
            Marker::Tab => "tab",
        }
    }

    pub fn is_bold(self) -> bool {
        matches!(self, Marker::BoldOpen | Marker::BoldClose)
    }

    /// Markers that end a visual line; a token after one starts a new sentence
    pub fn is_break(self) -> bool {
        matches!(
            self,
            Marker::LineBreak | Marker::ParagraphBreak | Marker::PageBreak | Marker::PageSeparator
        )
    }

    pub fn from_literal(literal: &str) -> Option<Marker> {
        Marker::ALL.into_iter().find(|m| m.literal() == literal)
    }

    /// The marker whose literal starts `text`, if any
    pub fn at_start(text: &str) -> Option<Marker> {
        if !text.starts_with('<') {
            return None;
        }
        Marker::ALL.into_iter().find(|m| text.starts_with(m.literal()))
    }

    /// Regex source matching this literal with arbitrary whitespace between
    /// its characters (e.g. `< T A G _ 2 >`)
    pub fn spaced_pattern(self) -> String {
        self.literal()
            .chars()
            .map(|c| regex::escape(&c.to_string()))
            .collect::<Vec<_>>()
            .join(r"\s*")
    }
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.literal())
    }
}

/// Alternation of every marker literal, for embedding in larger patterns
pub fn any_marker_pattern() -> String {
    Marker::ALL
        .iter()
        .map(|m| regex::escape(m.literal()))
        .collect::<Vec<_>>()
        .join("|")
}

/// Byte ranges of every marker literal in `text`, in order
pub fn marker_ranges(text: &str) -> Vec<(Marker, Range<usize>)> {
    let mut ranges = Vec::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find('<') {
        let start = pos + offset;
        match Marker::at_start(&text[start..]) {
            Some(marker) => {
                let end = start + marker.literal().len();
                ranges.push((marker, start..end));
                pos = end;
            }
            None => pos = start + 1,
        }
    }

    ranges
}

/// Remove every marker literal from `text` and collapse whitespace
pub fn strip_markers(text: &str) -> String {
    let mut stripped = text.to_string();
    for marker in Marker::ALL {
        stripped = stripped.replace(marker.literal(), " ");
    }
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals_round_trip() {
        for marker in Marker::ALL {
            assert_eq!(Marker::from_literal(marker.literal()), Some(marker));
        }
        assert_eq!(Marker::from_literal("<TAG_9>"), None);
    }

    #[test]
    fn test_at_start_prefers_full_literal() {
        assert_eq!(Marker::at_start("<PAGE_BREAK> x"), Some(Marker::PageSeparator));
        assert_eq!(Marker::at_start("<PAGEBREAK> x"), Some(Marker::PageBreak));
        assert_eq!(Marker::at_start("<TAG_2>"), Some(Marker::LineBreak));
        assert_eq!(Marker::at_start("<TAG_"), None);
        assert_eq!(Marker::at_start("TAG_2>"), None);
    }

    #[test]
    fn test_marker_ranges() {
        let text = "<TAG_2> John <BOLD->Smith<-BOLD> a < b";
        let ranges = marker_ranges(text);
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[0], (Marker::LineBreak, 0..7));
        assert_eq!(&text[ranges[1].1.clone()], "<BOLD->");
        assert_eq!(&text[ranges[2].1.clone()], "<-BOLD>");
    }

    #[test]
    fn test_strip_markers() {
        assert_eq!(
            strip_markers("ACME BANK <TAG_3> Q2 2023 <TAG_2>"),
            "ACME BANK Q2 2023"
        );
    }

    #[test]
    fn test_spaced_pattern_matches_split_literal() {
        let re = regex::Regex::new(&Marker::LineBreak.spaced_pattern()).unwrap();
        assert!(re.is_match("< T A G _ 2 >"));
        assert!(re.is_match("<TAG_2>"));
        assert!(!re.is_match("<TAG_3>"));
    }
}
