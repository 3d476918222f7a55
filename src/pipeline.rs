use tracing::info;

use crate::error::PipelineResult;
use crate::io::{Diagnostics, FinalTranscript};
use crate::models::{CandidateSet, NormalizedDocument, SourcePage};
use crate::nlp::{EntityRecognizer, PatternRule};
use crate::stages::{
    AttributionResolver, CandidateConfig, CleanerConfig, ExtractorConfig, NormalizerConfig,
    ResolverRequest, collect_attributions, execute_candidates, execute_clean, execute_extract,
    execute_normalize, execute_resolve, execute_segment,
};

/// Configuration for every stage of one run
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub extractor: ExtractorConfig,
    pub normalizer: NormalizerConfig,
    pub candidates: CandidateConfig,
    pub cleaner: CleanerConfig,
}

/// Result of the offline stages (extract, normalize, candidates)
#[derive(Debug, Clone)]
pub struct Analysis {
    pub raw_text: String,
    pub document: NormalizedDocument,
    pub candidates: CandidateSet,
}

/// Shared, read-only collaborators for processing documents
pub struct Pipeline<'a> {
    pub config: &'a PipelineConfig,
    pub recognizer: &'a dyn EntityRecognizer,
    pub rules: &'a [PatternRule],
    pub diagnostics: &'a Diagnostics,
}

impl Pipeline<'_> {
    /// Stages 0-2; no network
    pub fn analyze(&self, pages: &[SourcePage]) -> PipelineResult<Analysis> {
        info!("Stage 0: Extracting text from {} pages...", pages.len());
        let raw_text = execute_extract(pages, &self.config.extractor)?;
        self.diagnostics.write_text("extracted_text.txt", &raw_text);

        info!("Stage 1: Normalizing markup...");
        let document = execute_normalize(&raw_text, &self.config.normalizer);
        self.diagnostics
            .write_text("normalized_text.txt", document.text());
        info!(
            "Normalized document: {} -> {} bytes",
            raw_text.len(),
            document.len()
        );

        info!("Stage 2: Extracting attribution candidates...");
        let candidates = execute_candidates(
            &document,
            self.recognizer,
            self.rules,
            &self.config.candidates,
        );
        self.diagnostics
            .write_text("candidate_patterns.txt", &candidates.report());
        self.diagnostics
            .write_text("operator_candidates.txt", &candidates.operator_report());

        Ok(Analysis {
            raw_text,
            document,
            candidates,
        })
    }

    /// All stages for one document
    pub async fn process<R: AttributionResolver + ?Sized>(
        &self,
        pages: &[SourcePage],
        resolver: &R,
    ) -> PipelineResult<FinalTranscript> {
        let analysis = self.analyze(pages)?;

        info!("Stage 3: Resolving speaker attributions...");
        let request = ResolverRequest::new(&analysis.document, &analysis.candidates);
        let response = execute_resolve(resolver, &request, self.diagnostics).await?;

        if self.diagnostics.is_enabled() {
            let listing: String = collect_attributions(&response)
                .iter()
                .map(|(speaker, attribution)| format!("{}\t{}\n", speaker, attribution))
                .collect();
            self.diagnostics.write_text("all_attributions.txt", &listing);
        }

        info!("Stage 4: Segmenting utterances...");
        let utterances = execute_segment(&analysis.document, &response);
        self.diagnostics
            .write_json("utterances_raw.json", &utterances);

        info!("Stage 5: Cleaning utterances...");
        let cleaned = execute_clean(&utterances, &response, &self.config.cleaner);

        Ok(FinalTranscript::new(&response, cleaned))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::{PipelineError, ResolverError};
    use crate::nlp::{DEFAULT_RULES, TitleCaseNameRecognizer};
    use crate::stages::ResolverReply;

    /// Replies with fixed text and remembers the request it saw
    struct StubResolver {
        reply: String,
        seen: Mutex<Option<ResolverRequest>>,
    }

    impl StubResolver {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl AttributionResolver for StubResolver {
        fn name(&self) -> &str {
            "stub"
        }

        async fn resolve(&self, request: &ResolverRequest) -> Result<ResolverReply, ResolverError> {
            *self.seen.lock().unwrap() = Some(request.clone());
            if self.reply.is_empty() {
                return Err(ResolverError::Request("connection refused".to_string()));
            }
            Ok(ResolverReply {
                raw_text: self.reply.clone(),
                usage: None,
            })
        }
    }

    const CALL: &str = "OPERATOR: Welcome to the call.\nJOHN SMITH: Thank you. Revenue grew.\nOPERATOR: Next question.";

    async fn run(pages: &[SourcePage], resolver: &StubResolver) -> PipelineResult<FinalTranscript> {
        let config = PipelineConfig::default();
        let recognizer = TitleCaseNameRecognizer::default();
        let diagnostics = Diagnostics::disabled();
        let pipeline = Pipeline {
            config: &config,
            recognizer: &recognizer,
            rules: &DEFAULT_RULES,
            diagnostics: &diagnostics,
        };
        pipeline.process(pages, resolver).await
    }

    #[tokio::test]
    async fn test_process_end_to_end() {
        let resolver = StubResolver::new(
            r#"```json
{
  "bank_name": "Acme Bank",
  "participants": [
    {"speaker_name_variants": ["Operator"], "speaker_attributions": ["Operator:"]},
    {"speaker_name_variants": ["John Smith"], "speaker_attributions": ["<TAG_2> John Smith:"]}
  ]
}
```"#,
        );

        let transcript = run(&[SourcePage::from_text(CALL)], &resolver).await.unwrap();

        let turns: Vec<(&str, &str)> = transcript
            .utterances
            .iter()
            .map(|u| (u.speaker.as_str(), u.utterance.as_str()))
            .collect();
        assert_eq!(
            turns,
            vec![
                ("Operator", "Welcome to the call."),
                ("John Smith", "Thank you. Revenue grew."),
                ("Operator", "Next question."),
            ]
        );
        assert_eq!(transcript.response.bank_name.as_deref(), Some("Acme Bank"));

        let seen = resolver.seen.lock().unwrap().clone().unwrap();
        assert!(seen.document.contains("<TAG_2> John Smith: Thank you."));
        assert!(seen.candidate_report.contains("John Smith:"));
        assert_eq!(seen.operator_candidates, vec!["<TAG_2> Operator"]);
    }

    #[tokio::test]
    async fn test_unmatched_attributions_give_empty_output() {
        let resolver = StubResolver::new(
            r#"{"participants": [{"speaker_name_variants": ["Ghost"], "speaker_attributions": ["<TAG_4> Ghost:"]}]}"#,
        );

        let transcript = run(&[SourcePage::from_text(CALL)], &resolver).await.unwrap();

        assert!(transcript.utterances.is_empty());
    }

    #[tokio::test]
    async fn test_resolver_failure_is_reported() {
        let resolver = StubResolver::new("");
        let result = run(&[SourcePage::from_text(CALL)], &resolver).await;
        assert!(matches!(
            result,
            Err(PipelineError::Resolver(ResolverError::Request(_)))
        ));
    }

    #[tokio::test]
    async fn test_extraction_failure_skips_resolver() {
        let resolver = StubResolver::new("{}");
        let result = run(&[SourcePage::from_text("\n . \n")], &resolver).await;

        assert!(matches!(result, Err(PipelineError::Extraction(_))));
        assert!(resolver.seen.lock().unwrap().is_none());
    }

    #[test]
    fn test_analyze_writes_diagnostics() {
        let root = tempfile::tempdir().unwrap();
        let diagnostics = Diagnostics::create(root.path(), std::path::Path::new("call.txt"));
        let config = PipelineConfig::default();
        let recognizer = TitleCaseNameRecognizer::default();
        let pipeline = Pipeline {
            config: &config,
            recognizer: &recognizer,
            rules: &DEFAULT_RULES,
            diagnostics: &diagnostics,
        };

        let analysis = pipeline.analyze(&[SourcePage::from_text(CALL)]).unwrap();

        assert!(analysis.document.text().starts_with("Operator: Welcome"));
        let dir = diagnostics.dir().unwrap();
        for name in [
            "extracted_text.txt",
            "normalized_text.txt",
            "candidate_patterns.txt",
            "operator_candidates.txt",
        ] {
            assert!(dir.join(name).exists(), "missing {}", name);
        }
    }
}
