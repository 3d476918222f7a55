use std::cmp::Reverse;

use tracing::{debug, info, warn};

use crate::models::{
    AttributionOccurrence, Marker, NormalizedDocument, ResolverResponse, Utterance, strip_markers,
};

/// Perform Stage 4: cut the document into speaker turns at every literal
/// occurrence of a resolved attribution
///
/// Text before the first occurrence is discarded. Zero occurrences yield an
/// empty list.
pub fn execute_segment(doc: &NormalizedDocument, response: &ResolverResponse) -> Vec<Utterance> {
    // Flatten participants, then locate every attribution
    let attributions = collect_attributions(response);
    let occurrences = find_occurrences(doc.text(), &attributions);

    if occurrences.is_empty() {
        warn!(
            "None of {} attributions occur in the document",
            attributions.len()
        );
        return Vec::new();
    }

    // Cut between consecutive occurrences
    let utterances = partition(doc.text(), &occurrences);
    info!(
        "Segmented {} utterances from {} attributions",
        utterances.len(),
        attributions.len()
    );
    utterances
}

/// `(speaker, attribution)` pairs after leading-marker collapse, without
/// empty or repeated attribution strings
pub fn collect_attributions(response: &ResolverResponse) -> Vec<(String, String)> {
    let mut seen: Vec<(String, String)> = Vec::new();

    for (speaker, attribution) in response.attribution_pairs() {
        let attribution = collapse_leading_markers(&attribution);
        if strip_markers(&attribution).is_empty() {
            debug!("Skipping attribution without text: {:?}", attribution);
            continue;
        }
        if seen.iter().any(|(_, a)| *a == attribution) {
            continue;
        }
        seen.push((speaker, attribution));
    }

    seen
}

/// Rewrite the leading marker section with single spaces and no adjacent
/// repeats: `<TAG_2> <TAG_2> John Smith:` becomes `<TAG_2> John Smith:`
pub fn collapse_leading_markers(attribution: &str) -> String {
    let mut leading: Vec<Marker> = Vec::new();
    let mut rest = attribution.trim_start();

    while let Some(marker) = Marker::at_start(rest) {
        if leading.last() != Some(&marker) {
            leading.push(marker);
        }
        rest = rest[marker.literal().len()..].trim_start();
    }

    if leading.is_empty() {
        return attribution.to_string();
    }

    let markers: Vec<&str> = leading.iter().map(|m| m.literal()).collect();
    format!("{} {}", markers.join(" "), rest)
}

/// Every literal occurrence of every attribution, ordered by start
///
/// When several attributions start at the same offset only the longest is
/// kept, so the turn goes to the most specific attribution and none of its
/// text leaks into the utterance. Attributions are unique, so two survivors
/// of equal length cannot share a start.
pub fn find_occurrences(text: &str, attributions: &[(String, String)]) -> Vec<AttributionOccurrence> {
    let mut occurrences = Vec::new();

    for (speaker, attribution) in attributions {
        if attribution.is_empty() {
            continue;
        }
        let mut from = 0;
        while let Some(pos) = text[from..].find(attribution.as_str()) {
            let start = from + pos;
            occurrences.push(AttributionOccurrence {
                attribution: attribution.clone(),
                speaker: speaker.clone(),
                start,
                end: start + attribution.len(),
            });
            from = start + text[start..].chars().next().map_or(1, char::len_utf8);
        }
    }

    // longest first within a start, then keep the first per start
    occurrences.sort_by_key(|o| (o.start, Reverse(o.end)));
    occurrences.dedup_by_key(|o| o.start);
    occurrences
}

/// One utterance per occurrence: from its end to the next start (empty when
/// they overlap), the last one running to the end of the text
pub fn partition(text: &str, occurrences: &[AttributionOccurrence]) -> Vec<Utterance> {
    occurrences
        .iter()
        .enumerate()
        .map(|(ordinal, occurrence)| {
            let next_start = occurrences
                .get(ordinal + 1)
                .map_or(text.len(), |next| next.start);
            let span = occurrence.end..next_start.max(occurrence.end);

            Utterance {
                speaker: occurrence.speaker.clone(),
                raw_text: text[span.clone()].to_string(),
                span,
                ordinal,
                uuid: None,
            }
        })
        .collect()
}
