pub mod error;
pub mod io;
pub mod llm;
pub mod models;
pub mod nlp;
pub mod pipeline;
pub mod stages;

pub use error::{PipelineError, PipelineResult, ResolverError};
pub use io::{Diagnostics, FinalTranscript, default_output_path, load_pages};
pub use llm::{AnthropicClient, AnthropicConfig};
pub use models::{
    CandidateSet, CleanedUtterance, Marker, NormalizedDocument, ResolverResponse, SourcePage,
    Utterance,
};
pub use nlp::{DEFAULT_RULES, EntityRecognizer, PatternRule, TitleCaseNameRecognizer};
pub use pipeline::{Analysis, Pipeline, PipelineConfig};
pub use stages::{
    AttributionResolver, CandidateConfig, CleanerConfig, ExtractorConfig, NormalizerConfig,
    ResolverReply, ResolverRequest, marker_statistics,
};
