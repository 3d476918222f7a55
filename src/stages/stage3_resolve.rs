use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::ResolverError;
use crate::io::Diagnostics;
use crate::llm::{parse_response, strip_code_fence};
use crate::models::{CandidateSet, NormalizedDocument, ResolverResponse};

/// Everything the resolver is shown for one document
#[derive(Debug, Clone, Serialize)]
pub struct ResolverRequest {
    pub document: String,
    /// Candidate listing with context, as produced by `CandidateSet::report`
    pub candidate_report: String,
    pub operator_candidates: Vec<String>,
}

impl ResolverRequest {
    pub fn new(doc: &NormalizedDocument, candidates: &CandidateSet) -> Self {
        Self {
            document: doc.text().to_string(),
            candidate_report: candidates.report(),
            operator_candidates: candidates.operator_candidates.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    /// Cost in USD given per-million-token prices
    pub fn cost(&self, input_per_million: f64, output_per_million: f64) -> f64 {
        (self.input_tokens as f64 / 1_000_000.0) * input_per_million
            + (self.output_tokens as f64 / 1_000_000.0) * output_per_million
    }
}

/// Unparsed resolver answer
#[derive(Debug, Clone)]
pub struct ResolverReply {
    pub raw_text: String,
    pub usage: Option<TokenUsage>,
}

impl ResolverReply {
    pub fn cleaned_text(&self) -> &str {
        strip_code_fence(&self.raw_text)
    }

    pub fn parse(&self) -> Result<ResolverResponse, ResolverError> {
        parse_response(&self.raw_text)
    }
}

/// External judgment over candidates: which are real speaker attributions
/// and who they belong to
#[async_trait]
pub trait AttributionResolver: Send + Sync {
    fn name(&self) -> &str;

    async fn resolve(&self, request: &ResolverRequest) -> Result<ResolverReply, ResolverError>;
}

/// Perform Stage 3: ask the resolver and parse its answer
pub async fn execute_resolve<R: AttributionResolver + ?Sized>(
    resolver: &R,
    request: &ResolverRequest,
    diagnostics: &Diagnostics,
) -> Result<ResolverResponse, ResolverError> {
    info!("Resolving attributions with {}", resolver.name());

    let reply = resolver.resolve(request).await.inspect_err(|e| {
        diagnostics.write_text("resolver_response_error.txt", &e.to_string());
    })?;

    diagnostics.write_text("resolver_response_raw.txt", &reply.raw_text);
    diagnostics.write_text("resolver_response_cleaned.txt", reply.cleaned_text());

    // Strip any fence and parse; failures keep the raw reply for inspection
    let response = match reply.parse() {
        Ok(response) => response,
        Err(e) => {
            diagnostics.write_text(
                "resolver_response_error.txt",
                &format!("{}\n\n{}", e, reply.raw_text),
            );
            return Err(e);
        }
    };
    diagnostics.write_json("resolver_response_parsed.json", &response);

    info!(
        "Resolver identified {} participants with {} attributions",
        response.participants.len(),
        response.attribution_count()
    );
    if response.participants.is_empty() {
        warn!("Resolver returned no participants");
    }

    Ok(response)
}
