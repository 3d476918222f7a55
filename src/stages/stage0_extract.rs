use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::{PipelineError, PipelineResult};
use crate::models::{Marker, SourcePage, TextSpan};
use crate::stages::stage1_normalize::substitute_char;

/// Configuration for Stage 0 extraction
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Spans set larger than this (in points) are decorative and dropped
    pub decorative_size_threshold: f32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            decorative_size_threshold: 18.0,
        }
    }
}

/// Perform Stage 0: turn ordered pages into one raw, marker-seeded string
///
/// Each retained line is followed by a LineBreak marker and pages are joined
/// with a PageSeparator. Fails when no page yields a retained line.
pub fn execute_extract(pages: &[SourcePage], config: &ExtractorConfig) -> PipelineResult<String> {
    if pages.is_empty() {
        return Err(PipelineError::Extraction("document has no pages".to_string()));
    }

    let mut rendered_pages = Vec::with_capacity(pages.len());
    let mut line_count = 0;

    for (index, page) in pages.iter().enumerate() {
        // Layout pages are rendered first so bold spans carry markers
        let page_text = if page.has_layout() {
            render_layout(&page.lines, config)
        } else {
            page.text.clone()
        };

        // Clean, strip and case each line; short lines are dropped
        let lines = extract_lines(&clean_special_characters(&page_text));
        if lines.is_empty() {
            debug!("Page {} produced no usable lines", index + 1);
            continue;
        }

        line_count += lines.len();
        rendered_pages.push(lines.join(" "));
    }

    if rendered_pages.is_empty() {
        return Err(PipelineError::Extraction(
            "no readable text on any page".to_string(),
        ));
    }

    info!(
        "Extracted {} lines from {} of {} pages",
        line_count,
        rendered_pages.len(),
        pages.len()
    );

    // Join pages
    Ok(rendered_pages.join(&format!(" {} ", Marker::PageSeparator)))
}

/// Render span layout to plain lines, dropping decorative spans and wrapping
/// bold spans in bold markers
pub fn render_layout(lines: &[Vec<TextSpan>], config: &ExtractorConfig) -> String {
    lines
        .iter()
        .map(|spans| {
            spans
                .iter()
                .filter(|span| span.size <= config.decorative_size_threshold)
                .map(render_span)
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_span(span: &TextSpan) -> String {
    if span.bold && !span.text.trim().is_empty() {
        format!(" {} {} {} ", Marker::BoldOpen, span.text, Marker::BoldClose)
    } else {
        span.text.clone()
    }
}

/// Remove or replace characters that confuse downstream matching
pub fn clean_special_characters(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match substitute_char(c) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(c),
        }
    }
    out
}

fn extract_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let stripped = strip_leading_noise(line);
            let cased = case_names(stripped);
            if visible_chars(&cased) <= 1 {
                return None;
            }
            Some(format!("{}{}", cased, Marker::LineBreak))
        })
        .collect()
}

/// Strip leading whitespace and punctuation (parentheses excepted), stopping
/// at a marker literal
pub fn strip_leading_noise(line: &str) -> &str {
    let mut rest = line;
    loop {
        if Marker::at_start(rest).is_some() {
            return rest;
        }
        let mut chars = rest.chars();
        match chars.next() {
            Some(c) if is_leading_noise(c) => rest = chars.as_str(),
            _ => return rest,
        }
    }
}

fn is_leading_noise(c: char) -> bool {
    c.is_whitespace() || (c.is_ascii_punctuation() && c != '(' && c != ')')
}

fn visible_chars(line: &str) -> usize {
    line.chars().filter(|c| !c.is_whitespace()).count()
}

static OPERATOR_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bOPERATOR\b").expect("Invalid operator regex"));

static UPPERCASE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][A-Z'\-]+(?:\s+[A-Z]\.?)?(?:\s+[A-Z][A-Z'\-]+)+\b")
        .expect("Invalid uppercase name regex")
});

/// `OPERATOR` becomes `Operator`; runs of all-caps words become title case
pub fn case_names(line: &str) -> String {
    let line = OPERATOR_WORD.replace_all(line, "Operator");
    UPPERCASE_NAME
        .replace_all(&line, |caps: &regex::Captures| title_case(&caps[0]))
        .into_owned()
}

/// Uppercase a letter that follows a non-letter, lowercase the rest
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
        } else {
            out.push(c);
        }
        prev_is_letter = c.is_alphabetic();
    }
    out
}
