use crate::error::ResolverError;
use crate::models::ResolverResponse;

/// Remove a surrounding Markdown code fence (```json or bare ```)
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();

    let inner = if let Some(rest) = trimmed.strip_prefix("```json") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest
    } else {
        return trimmed;
    };

    match inner.rfind("```") {
        Some(end) => inner[..end].trim(),
        None => inner.trim(),
    }
}

/// Parse the resolver's reply text into the attribution schema
pub fn parse_response(text: &str) -> Result<ResolverResponse, ResolverError> {
    let cleaned = strip_code_fence(text);
    if cleaned.is_empty() {
        return Err(ResolverError::EmptyResponse);
    }

    serde_json::from_str(cleaned).map_err(|e| ResolverError::Parse {
        message: e.to_string(),
    })
}
