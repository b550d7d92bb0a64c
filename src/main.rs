//! Plan-driven documentation sync.
//!
//! Usage:
//!   docs-sync <work_dir>
//!
//! Reads `<work_dir>/sync_plan.json`, translates the planned English pages into
//! every target locale and writes the result manifest.
//!
//! Required environment variables:
//! - OPENAI_API_KEY
//!
//! Optional:
//! - OPENAI_MODEL, OPENAI_API_URL
//! - DOCS_ROOT (defaults to the current directory)
//! - MAX_SYNC_FILES (defaults to 10)
//! - STRICT_STRUCTURE_SYNC (defaults to false)
//! - SYNC_RESULTS_PATH (defaults to /tmp/sync_results.json)

use anyhow::Result;
use docs_sync::config::{Config, SyncProfile};
use docs_sync::orchestrator::Orchestrator;
use docs_sync::plan::SyncPlan;
use docs_sync::structure::DocsJsonSynchronizer;
use docs_sync::translator::ModelTranslator;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file (ignored in CI)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("docs_sync=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: docs-sync <work_dir>");
        return Ok(ExitCode::FAILURE);
    }
    let work_dir = PathBuf::from(&args[1]);

    info!("Starting documentation sync");

    let config = Config::from_env()?;
    let profile = config.apply_to(SyncProfile::plan()?);

    let plan = match SyncPlan::load(&work_dir).await {
        Ok(plan) => plan,
        Err(e) => {
            error!("{}: {}", e.kind(), e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let translator = ModelTranslator::from_config(reqwest::Client::new(), &config);
    let structure = DocsJsonSynchronizer::new(&config.docs_root, &profile);
    let orchestrator = Orchestrator::new(
        profile,
        config.orchestrator_settings(),
        translator,
        structure,
    );

    match orchestrator.run_plan(&plan).await {
        Ok(outcome) if outcome.is_success() => {
            info!("Sync completed");
            Ok(ExitCode::SUCCESS)
        }
        Ok(_) => {
            error!("Sync completed with failures");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => {
            error!("{}: {}", e.kind(), e);
            Ok(ExitCode::FAILURE)
        }
    }
}
