use std::path::Path;

use anyhow::{Context, Result};

use crate::models::{SourceDocument, SourcePage};

/// Load source pages: `.json` files hold a `SourceDocument`, anything else is
/// UTF-8 text with pages separated by form feeds
pub fn load_pages(path: &Path) -> Result<Vec<SourcePage>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        parse_document_json(&content)
    } else {
        Ok(split_text_pages(&content))
    }
}

/// Parse the JSON page container
pub fn parse_document_json(json: &str) -> Result<Vec<SourcePage>> {
    let document: SourceDocument =
        serde_json::from_str(json).context("Failed to parse source document JSON")?;
    Ok(document.pages)
}

/// Split plain text on form feeds, dropping trailing empty pages
pub fn split_text_pages(content: &str) -> Vec<SourcePage> {
    let mut pages: Vec<&str> = content.split('\u{000C}').collect();
    while pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages.into_iter().map(SourcePage::from_text).collect()
}
