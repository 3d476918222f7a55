use thiserror::Error;

/// Failures at the resolver boundary, all handled without unwinding
#[derive(Error, Debug)]
pub enum ResolverError {
    /// Transport failure before a response arrived
    #[error("resolver request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status
    #[error("resolver responded with error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("resolver returned an empty response")]
    EmptyResponse,

    /// The reply could not be read as the attribution schema
    #[error("failed to parse resolver response: {message}")]
    Parse { message: String },
}

/// Pipeline-level failure for a single document
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Source unreadable or without usable text; nothing downstream runs
    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error(transparent)]
    Resolver(#[from] ResolverError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
