//! Diff-driven translation update.
//!
//! Usage:
//!   docs-update <base_sha> <head_sha>
//!
//! Classifies the changes between two commits and, when only English
//! documentation changed, refreshes the translations of those pages.
//!
//! Reads the same environment variables as `docs-sync`; the result manifest
//! defaults to /tmp/update_results.json.

use anyhow::Result;
use docs_sync::analyzer::GitChangeAnalyzer;
use docs_sync::config::{Config, SyncProfile};
use docs_sync::orchestrator::Orchestrator;
use docs_sync::structure::DocsJsonSynchronizer;
use docs_sync::translator::ModelTranslator;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("docs_sync=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: docs-update <base_sha> <head_sha>");
        return Ok(ExitCode::FAILURE);
    }
    let (base, head) = (&args[1], &args[2]);

    info!("Starting translation update");

    let config = Config::from_env()?;
    let profile = config.apply_to(SyncProfile::update()?);

    let analyzer = GitChangeAnalyzer::new(&config.docs_root, &profile);
    let translator = ModelTranslator::from_config(reqwest::Client::new(), &config);
    let structure = DocsJsonSynchronizer::new(&config.docs_root, &profile);
    let orchestrator = Orchestrator::new(
        profile,
        config.orchestrator_settings(),
        translator,
        structure,
    );

    match orchestrator.run_update(&analyzer, base, head).await {
        Ok(outcome) if outcome.is_success() => {
            info!("Translation update completed");
            Ok(ExitCode::SUCCESS)
        }
        Ok(_) => {
            error!("Translation update completed with failures");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => {
            error!("{}: {}", e.kind(), e);
            Ok(ExitCode::FAILURE)
        }
    }
}
