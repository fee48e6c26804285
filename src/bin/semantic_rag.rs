use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use waste_rag::core::config::{AppPaths, ConfigService};
use waste_rag::core::logging;
use waste_rag::llm::LlmService;
use waste_rag::rag::{BuildReport, EngineStatus, QueryResult, SemanticRag};

const RULE: &str = "================================================================================";

#[derive(Parser, Debug)]
#[command(
    name = "semantic-rag",
    about = "Semantic search and question answering over the waste-management email corpus",
    after_help = "Examples:\n  semantic-rag --build-embeddings\n  semantic-rag --query \"contamination issues at garden properties\"\n  semantic-rag --query \"WM pricing\" --keyword-only\n  semantic-rag --info"
)]
struct Cli {
    /// Google AI API key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Embed every corpus chunk not yet in the cache
    #[arg(long, default_value_t = false)]
    build_embeddings: bool,

    /// Re-embed cached chunks too (with --build-embeddings)
    #[arg(long, default_value_t = false)]
    force: bool,

    /// Question to answer from the corpus
    #[arg(long)]
    query: Option<String>,

    /// Rank by keywords instead of embeddings
    #[arg(long, default_value_t = false)]
    keyword_only: bool,

    /// Chunks to include in the answer context
    #[arg(long, default_value_t = 5)]
    max_results: usize,

    /// Show cache and corpus status
    #[arg(long, default_value_t = false)]
    info: bool,

    /// Print machine-readable JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl Cli {
    fn needs_api_key(&self) -> bool {
        self.build_embeddings || (self.query.is_some() && !self.keyword_only)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_stderr();

    let paths = Arc::new(AppPaths::new());
    let config = ConfigService::new(paths.clone());
    let mut settings = config.load_settings().context("failed to load configuration")?;
    if let Some(key) = cli.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        settings.gemini.api_key = Some(key.to_string());
    }

    if cli.needs_api_key() && settings.gemini_api_key().is_none() {
        bail!("API key required: use --api-key or set GOOGLE_API_KEY (https://aistudio.google.com/app/apikey)");
    }

    let llm = LlmService::from_settings(&settings).context("failed to initialize Gemini client")?;
    let rag = SemanticRag::new(settings, &paths, llm);

    if cli.build_embeddings {
        let report = rag.build_embeddings(cli.force).await?;
        print_build_report(&report, cli.json)?;
    } else if let Some(question) = cli.query.as_deref() {
        let result = rag.query(question, cli.max_results, cli.keyword_only).await?;
        print_query_result(&result, cli.json)?;
    } else {
        if !cli.info && !cli.json {
            println!("No action specified. Use --help for usage information.");
        }
        print_status(&rag.status().await, cli.json)?;
    }

    Ok(())
}

fn print_build_report(report: &BuildReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    println!("Embedding complete!");
    println!("  Chunks scanned: {}", report.total_chunks);
    println!("  Already cached: {}", report.already_cached);
    println!("  Successful: {}", report.embedded_count);
    println!("  Errors: {}", report.error_count);
    println!("  Cached total: {}", report.cached_total);
    Ok(())
}

fn print_query_result(result: &QueryResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    println!("Question: {}", result.question);
    match result.fallback_reason {
        Some(reason) => println!("Search: {} (fallback: {})", result.search_type, reason),
        None => println!("Search: {}", result.search_type),
    }
    println!("Chunks used: {}", result.chunks_found);
    println!();
    println!("Answer:");
    println!("{}", RULE);
    println!("{}", result.answer);
    Ok(())
}

fn print_status(status: &EngineStatus, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(status)?);
        return Ok(());
    }
    let mb = |bytes: u64| bytes as f64 / (1024.0 * 1024.0);
    println!("Semantic RAG System Status");
    println!("{}", RULE);
    println!("Batch Files: {}", status.batch_files);
    println!("Corpus Size: {:.2}MB", mb(status.corpus_bytes));
    println!();
    println!("Embeddings Cache:");
    println!("  Cached Chunks: {}", status.embeddings_cached);
    if status.embeddings_cached > 0 {
        println!("  Cache Size: {:.2}MB", mb(status.cache_file_bytes));
        println!("  Embedding Model: {}", status.embedding_model);
    } else {
        println!("  Status: NOT BUILT - run --build-embeddings");
    }
    println!("Generation Model: {}", status.generation_model);
    println!("Search Mode: {}", status.search_type);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_is_only_required_for_remote_actions() {
        let info = Cli::parse_from(["semantic-rag", "--info"]);
        assert!(!info.needs_api_key());

        let keyword = Cli::parse_from(["semantic-rag", "--query", "WM pricing", "--keyword-only"]);
        assert!(!keyword.needs_api_key());

        let semantic = Cli::parse_from(["semantic-rag", "--query", "WM pricing"]);
        assert!(semantic.needs_api_key());

        let build = Cli::parse_from(["semantic-rag", "--build-embeddings", "--force"]);
        assert!(build.needs_api_key());
        assert!(build.force);
    }

    #[test]
    fn max_results_defaults_to_five() {
        let cli = Cli::parse_from(["semantic-rag", "--query", "fees"]);
        assert_eq!(cli.max_results, 5);
        assert!(!cli.json);
    }
}
