use serde::Serialize;

/// Which technique produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// Person entity widened to surrounding markers and punctuation
    Entity,
    /// Structural/lexical rule, identified by rule name
    Pattern(&'static str),
}

/// A substring that plausibly names a speaker
#[derive(Debug, Clone, Serialize)]
pub struct AttributionCandidate {
    pub text: String,
    /// Byte offset of the first discovery
    pub start: usize,
    pub end: usize,
    pub source: CandidateSource,
    /// Surrounding text of the first literal occurrence in the document
    pub context: String,
}

/// Deduplicated output of candidate extraction
#[derive(Debug, Clone, Default, Serialize)]
pub struct CandidateSet {
    pub candidates: Vec<AttributionCandidate>,
    pub operator_candidates: Vec<String>,
}

impl CandidateSet {
    /// Add a candidate unless its text is already present
    pub fn push(&mut self, candidate: AttributionCandidate) -> bool {
        if candidate.text.is_empty() || self.contains(&candidate.text) {
            return false;
        }
        self.candidates.push(candidate);
        true
    }

    pub fn contains(&self, text: &str) -> bool {
        self.candidates.iter().any(|c| c.text == text)
    }

    pub fn texts(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.text.as_str()).collect()
    }

    pub fn count_by(&self, entity: bool) -> usize {
        self.candidates
            .iter()
            .filter(|c| matches!(c.source, CandidateSource::Entity) == entity)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty() && self.operator_candidates.is_empty()
    }

    /// Human-readable listing of each candidate with its context
    pub fn report(&self) -> String {
        let mut output = String::new();
        for (i, candidate) in self.candidates.iter().enumerate() {
            output.push_str(&format!("Pattern {}: {}\n", i + 1, candidate.text));
            output.push_str(&format!("Context: \"{}\"\n\n", candidate.context));
        }
        output
    }

    pub fn operator_report(&self) -> String {
        self.operator_candidates
            .iter()
            .map(|op| format!("Operator with tags: {}\n", op))
            .collect()
    }
}
