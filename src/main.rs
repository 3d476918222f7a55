use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use turnscript::{
    AnthropicClient, AnthropicConfig, CandidateConfig, DEFAULT_RULES, Diagnostics, Pipeline,
    PipelineConfig, TitleCaseNameRecognizer, default_output_path, load_pages, marker_statistics,
};

#[derive(Parser)]
#[command(name = "turnscript")]
#[command(author, version, about = "Earnings-call transcript speaker-turn extraction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a transcript into attributed speaker turns
    Process {
        /// Input document (page JSON, or text with form-feed page breaks)
        #[arg(short, long)]
        input: PathBuf,

        /// Output JSON file (default: <input stem>_final.json next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for per-run intermediate artifacts
        #[arg(long)]
        diagnostics_dir: Option<PathBuf>,

        /// Model to use (overrides ANTHROPIC_MODEL)
        #[arg(long)]
        model: Option<String>,

        /// Maximum tokens in the resolver response
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Only propose entity candidates that follow a marker
        #[arg(long)]
        require_leading_marker: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show markup statistics and attribution candidates without calling the resolver
    Analyze {
        /// Input document (page JSON, or text with form-feed page breaks)
        #[arg(short, long)]
        input: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            output,
            diagnostics_dir,
            model,
            max_tokens,
            require_leading_marker,
            verbose,
        } => {
            setup_logging(verbose);
            process_document(
                input,
                output,
                diagnostics_dir,
                model,
                max_tokens,
                require_leading_marker,
            )
            .await
        }
        Commands::Analyze { input, verbose } => {
            setup_logging(verbose);
            analyze_document(input)
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

async fn process_document(
    input: PathBuf,
    output: Option<PathBuf>,
    diagnostics_dir: Option<PathBuf>,
    model: Option<String>,
    max_tokens: Option<u32>,
    require_leading_marker: bool,
) -> Result<()> {
    info!("Loading document from {:?}", input);
    let pages = load_pages(&input).context("Failed to load input document")?;
    let output = output.unwrap_or_else(|| default_output_path(&input));

    let mut api_config = AnthropicConfig::from_env()?;
    if let Some(model) = model {
        api_config.model = model;
    }
    if let Some(max_tokens) = max_tokens {
        api_config.max_tokens = max_tokens;
    }
    let client = AnthropicClient::new(api_config);

    let diagnostics = diagnostics_dir
        .map(|dir| Diagnostics::create(&dir, &input))
        .unwrap_or_default();

    let config = PipelineConfig {
        candidates: CandidateConfig {
            require_leading_marker,
            ..Default::default()
        },
        ..Default::default()
    };
    let recognizer = TitleCaseNameRecognizer::default();
    let pipeline = Pipeline {
        config: &config,
        recognizer: &recognizer,
        rules: &DEFAULT_RULES,
        diagnostics: &diagnostics,
    };

    let transcript = pipeline
        .process(&pages, &client)
        .await
        .with_context(|| format!("Failed to process {:?}", input))?;

    transcript.write_json(&output)?;
    info!("Output written to {:?}", output);

    let mut per_speaker: BTreeMap<&str, usize> = BTreeMap::new();
    for utterance in &transcript.utterances {
        *per_speaker.entry(utterance.speaker.as_str()).or_default() += 1;
    }
    for (speaker, count) in &per_speaker {
        info!("{}: {} utterances", speaker, count);
    }
    info!(
        "Complete: {} utterances from {} speakers",
        transcript.utterances.len(),
        per_speaker.len()
    );

    Ok(())
}

fn analyze_document(input: PathBuf) -> Result<()> {
    info!("Analyzing document from {:?}", input);
    let pages = load_pages(&input).context("Failed to load input document")?;

    let config = PipelineConfig::default();
    let recognizer = TitleCaseNameRecognizer::default();
    let diagnostics = Diagnostics::disabled();
    let pipeline = Pipeline {
        config: &config,
        recognizer: &recognizer,
        rules: &DEFAULT_RULES,
        diagnostics: &diagnostics,
    };
    let analysis = pipeline
        .analyze(&pages)
        .with_context(|| format!("Failed to analyze {:?}", input))?;

    println!("Document Analysis");
    println!("=================");
    println!("Pages: {}", pages.len());
    println!("Extracted characters: {}", analysis.raw_text.chars().count());
    println!(
        "Normalized characters: {}",
        analysis.document.text().chars().count()
    );
    println!();

    println!("Markers");
    println!("-------");
    for (marker, count) in marker_statistics(analysis.document.text()) {
        if count > 0 {
            println!("{:<14} {}", marker.literal(), count);
        }
    }
    println!();

    println!("Candidates");
    println!("----------");
    println!("Entity-derived: {}", analysis.candidates.count_by(true));
    println!("Pattern-derived: {}", analysis.candidates.count_by(false));
    println!(
        "Operator candidates: {}",
        analysis.candidates.operator_candidates.len()
    );
    println!();
    print!("{}", analysis.candidates.report());
    print!("{}", analysis.candidates.operator_report());

    Ok(())
}
