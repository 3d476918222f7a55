use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{CleanedUtterance, ResolverResponse, Utterance, strip_markers};
use crate::stages::stage1_normalize::collapse_whitespace;

/// Configuration for Stage 5 cleaning
#[derive(Debug, Clone)]
pub struct CleanerConfig {
    /// Append a header- and footer-stripped copy of every utterance
    pub append_pattern_stripped_copies: bool,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            append_pattern_stripped_copies: true,
        }
    }
}

static REMOVABLE_SPANS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [r"<[^>]*>", r"\([^)]*\)", r"//[^/]*//", r"\\[^\\]*\\"]
        .map(|p| Regex::new(p).expect("Invalid removable span regex"))
});

/// Perform Stage 5: strip markup from each turn and assign ids
pub fn execute_clean(
    utterances: &[Utterance],
    response: &ResolverResponse,
    config: &CleanerConfig,
) -> Vec<CleanedUtterance> {
    // Drop blank turns and clean the rest
    let originals: Vec<CleanedUtterance> = utterances
        .iter()
        .filter(|u| !u.is_blank())
        .map(|u| CleanedUtterance {
            speaker: u.speaker.clone(),
            utterance: clean_text(&u.raw_text),
            uuid: u.uuid.clone().unwrap_or_else(new_uuid),
        })
        .collect();

    let dropped = utterances.len() - originals.len();
    let mut cleaned = originals.clone();

    // Header/footer copies are appended, never substituted
    if config.append_pattern_stripped_copies {
        for pattern in [response.header(), response.footer()].into_iter().flatten() {
            cleaned.extend(pattern_stripped_copies(&originals, pattern));
        }
    }

    info!(
        "Cleaned {} utterances ({} blank dropped, {} pattern-stripped copies)",
        originals.len(),
        dropped,
        cleaned.len() - originals.len()
    );

    cleaned
}

/// Remove markers and bracketed asides, then collapse whitespace
pub fn clean_text(raw: &str) -> String {
    let mut text = raw.to_string();
    for re in REMOVABLE_SPANS.iter() {
        text = re.replace_all(&text, " ").into_owned();
    }
    collapse_whitespace(&text)
}

/// A copy of every utterance with `pattern` (markers stripped) removed,
/// case-insensitively, each under a fresh id
fn pattern_stripped_copies(originals: &[CleanedUtterance], pattern: &str) -> Vec<CleanedUtterance> {
    let pattern = strip_markers(pattern);
    if pattern.is_empty() {
        return Vec::new();
    }

    let re = match Regex::new(&format!("(?i){}", regex::escape(&pattern))) {
        Ok(re) => re,
        Err(e) => {
            warn!("Skipping unusable header/footer pattern {:?}: {}", pattern, e);
            return Vec::new();
        }
    };

    originals
        .iter()
        .map(|u| CleanedUtterance {
            speaker: u.speaker.clone(),
            utterance: collapse_whitespace(&re.replace_all(&u.utterance, " ")),
            uuid: new_uuid(),
        })
        .collect()
}

fn new_uuid() -> String {
    Uuid::new_v4().to_string()
}
