use std::ops::Range;

use serde::{Deserialize, Serialize};

/// One literal position of a resolved attribution string in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributionOccurrence {
    pub attribution: String,
    pub speaker: String,
    pub start: usize,
    pub end: usize,
}

impl AttributionOccurrence {
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// One contiguous speaker turn, still carrying document markup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Utterance {
    pub speaker: String,
    /// Byte range of the turn in the normalized document
    pub span: Range<usize>,
    pub raw_text: String,
    /// Position among all utterances, starting at 0
    pub ordinal: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl Utterance {
    pub fn is_blank(&self) -> bool {
        self.raw_text.trim().is_empty()
    }
}

/// Final, markup-free speaker turn as serialized in the output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanedUtterance {
    pub speaker: String,
    pub utterance: String,
    pub uuid: String,
}
