use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::models::{
    AttributionCandidate, CandidateSet, CandidateSource, Marker, NormalizedDocument,
    any_marker_pattern, marker_ranges,
};
use crate::nlp::{EntityRecognizer, PatternRule, Token, tokenize};

/// Configuration for Stage 2 candidate extraction
#[derive(Debug, Clone)]
pub struct CandidateConfig {
    /// Characters an entity start is pushed back before the marker scan
    pub entity_lead: usize,
    /// Characters scanned before the entity for a marker
    pub pre_window: usize,
    /// Characters scanned after the entity for closing punctuation
    pub post_window: usize,
    /// Characters of context on either side in the report
    pub context_radius: usize,
    /// Skip entities with no marker shortly before them
    pub require_leading_marker: bool,
}

impl Default for CandidateConfig {
    fn default() -> Self {
        Self {
            entity_lead: 2,
            pre_window: 10,
            post_window: 15,
            context_radius: 10,
            require_leading_marker: false,
        }
    }
}

const CLOSING_PUNCTUATION: [char; 4] = [':', '-', ',', '>'];

static OPERATOR_WITH_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?:(?:{})\s*)+Operator\b", any_marker_pattern()))
        .expect("Invalid operator candidate regex")
});

/// Perform Stage 2: propose substrings that plausibly attribute a speaker
pub fn execute_candidates(
    doc: &NormalizedDocument,
    recognizer: &dyn EntityRecognizer,
    rules: &[PatternRule],
    config: &CandidateConfig,
) -> CandidateSet {
    let text = doc.text();
    let markers: Vec<Range<usize>> = marker_ranges(text).into_iter().map(|(_, r)| r).collect();
    let mut set = CandidateSet::default();

    // Entity-derived candidates
    let entities = recognizer.person_spans(text);
    debug!(
        "Recognizer '{}' found {} person spans",
        recognizer.name(),
        entities.len()
    );

    for entity in entities {
        let Some(span) = widen_entity(text, entity, &markers, config) else {
            continue;
        };
        let candidate = build_candidate(text, span, CandidateSource::Entity, config);
        set.push(candidate);
    }

    // Pattern-derived candidates, rule table order
    let tokens = tokenize(text);
    for rule in rules {
        let mut added = 0;
        for range in rule.find_matches(&tokens) {
            let span = token_span(&tokens, range);
            let candidate = build_candidate(text, span, CandidateSource::Pattern(rule.name), config);
            if set.push(candidate) {
                added += 1;
            }
        }
        debug!("Rule '{}' added {} candidates", rule.name, added);
    }

    // Marker runs before "Operator"
    set.operator_candidates = find_operator_candidates(text);

    info!(
        "Found {} candidates ({} entity, {} pattern) and {} operator candidates",
        set.candidates.len(),
        set.count_by(true),
        set.count_by(false),
        set.operator_candidates.len()
    );
    if set.is_empty() {
        warn!("No attribution candidates found");
    }

    set
}

/// Widen a person span to a leading marker and closing punctuation
///
/// Returns `None` only when a leading marker is required and absent.
pub fn widen_entity(
    text: &str,
    entity: Range<usize>,
    markers: &[Range<usize>],
    config: &CandidateConfig,
) -> Option<Range<usize>> {
    let lead = back_chars(text, entity.start, config.entity_lead);
    let pre_from = back_chars(text, lead, config.pre_window);

    let mut start = entity.start;
    match marker_ranges(&text[pre_from..entity.start]).last() {
        Some((_, found)) => start = pre_from + found.start,
        None if config.require_leading_marker => return None,
        None => {}
    }

    let mut end = entity.end;
    let post_to = forward_chars(text, entity.end, config.post_window);
    if let Some(pos) = text[entity.end..post_to].find(CLOSING_PUNCTUATION) {
        end = entity.end + pos + 1;
    }

    Some(snap_to_markers(start..end, markers))
}

/// Move edges that fall inside a marker literal out to the marker's edges
fn snap_to_markers(span: Range<usize>, markers: &[Range<usize>]) -> Range<usize> {
    let mut start = span.start;
    let mut end = span.end;
    for marker in markers {
        if marker.start < start && start < marker.end {
            start = marker.start;
        }
        if marker.start < end && end < marker.end {
            end = marker.end;
        }
    }
    start..end
}

fn token_span(tokens: &[Token], range: Range<usize>) -> Range<usize> {
    tokens[range.start].start..tokens[range.end - 1].end
}

fn build_candidate(
    text: &str,
    span: Range<usize>,
    source: CandidateSource,
    config: &CandidateConfig,
) -> AttributionCandidate {
    let candidate_text = text[span.clone()].to_string();
    let context = context_of(text, &candidate_text, config.context_radius)
        .unwrap_or_else(|| candidate_text.clone());

    AttributionCandidate {
        text: candidate_text,
        start: span.start,
        end: span.end,
        source,
        context,
    }
}

/// Text around the first occurrence of `needle`
pub fn context_of(text: &str, needle: &str, radius: usize) -> Option<String> {
    let pos = text.find(needle)?;
    let from = back_chars(text, pos, radius);
    let to = forward_chars(text, pos + needle.len(), radius);
    Some(text[from..to].to_string())
}

/// Every run of markers directly followed by the word `Operator`, unique, in
/// document order
pub fn find_operator_candidates(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for m in OPERATOR_WITH_MARKERS.find_iter(text) {
        let candidate = m.as_str().to_string();
        if !found.contains(&candidate) {
            found.push(candidate);
        }
    }
    found
}

/// Byte offset `n` chars before `idx`, clamped to the start of `text`
fn back_chars(text: &str, idx: usize, n: usize) -> usize {
    if n == 0 {
        return idx;
    }
    text[..idx]
        .char_indices()
        .rev()
        .take(n)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(idx)
}

/// Byte offset `n` chars after `idx`, clamped to the end of `text`
fn forward_chars(text: &str, idx: usize, n: usize) -> usize {
    text[idx..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| idx + i)
        .unwrap_or(text.len())
}

/// Count of each marker kind in the document, for analysis output
pub fn marker_statistics(text: &str) -> Vec<(Marker, usize)> {
    let ranges = marker_ranges(text);
    Marker::ALL
        .into_iter()
        .map(|m| (m, ranges.iter().filter(|(found, _)| *found == m).count()))
        .collect()
}
