//! `cpg` - content-plan generation from the command line
//!
//! ```text
//! cpg process --username geoffreyhinton --root ./data
//! cpg run --context account.json --root ./data
//! cpg audit --plan content_plan.json --context account.json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cpg_audit::{count_by_kind, QualityAuditor};
use cpg_core::{CommandGenerator, ContentPlanPipeline, PipelineConfig, PipelineOutcome};
use cpg_model::{AccountContext, ContentPlan};
use cpg_storage::FsBlobStore;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cpg", version, about = "Generate and verify social media content plans")]
struct Cli {
    /// Pipeline configuration (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Model command-line tool used for generation
    #[arg(long, global = true, default_value = "claude")]
    generator: String,

    /// Model name passed to the generator
    #[arg(long, global = true)]
    model: Option<String>,

    /// Override the configured retry budget
    #[arg(long, global = true)]
    max_retries: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load stored account info for a user and run the pipeline
    Process {
        #[arg(long)]
        username: String,
        /// Storage root directory
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
    /// Run the pipeline for an account context file
    Run {
        /// Account context JSON
        #[arg(long)]
        context: PathBuf,
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
    /// Audit a stored content plan against an account context
    Audit {
        #[arg(long)]
        plan: PathBuf,
        #[arg(long)]
        context: PathBuf,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(max_retries) = cli.max_retries {
        config = config.with_max_retries(max_retries);
    }
    Ok(config)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn pipeline(cli: &Cli, root: &Path) -> Result<ContentPlanPipeline> {
    let config = load_config(cli)?;
    let mut generator =
        CommandGenerator::new(&cli.generator).with_timeout(config.generation_timeout());
    if let Some(model) = &cli.model {
        generator = generator.with_model(model);
    }
    let store = FsBlobStore::new(root);
    Ok(ContentPlanPipeline::new(config, Arc::new(store), Arc::new(generator)))
}

fn report(outcome: &PipelineOutcome) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    if outcome.skip_export {
        info!(username = %outcome.primary_username, "no data available; nothing exported");
        return Ok(ExitCode::SUCCESS);
    }
    if outcome.success {
        Ok(ExitCode::SUCCESS)
    } else {
        error!(
            username = %outcome.primary_username,
            issues = outcome.issues.len(),
            "content plan failed validation"
        );
        Ok(ExitCode::FAILURE)
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match &cli.command {
        Command::Process { username, root } => {
            let outcome = pipeline(&cli, root)?.process(username).await?;
            report(&outcome)
        }
        Command::Run { context, root } => {
            let context: AccountContext = read_json(context)?;
            let outcome = pipeline(&cli, root)?.run_pipeline(context).await?;
            report(&outcome)
        }
        Command::Audit { plan, context } => {
            let config = load_config(&cli)?;
            let plan: ContentPlan = read_json(plan)?;
            let context: AccountContext = read_json(context)?;
            let auditor = QualityAuditor::new(config.audit);
            let violations = auditor.violations(&plan, &context);
            let report = auditor.audit(&plan, &context);
            let summary = serde_json::json!({
                "report": report,
                "by_kind": count_by_kind(&violations),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(if report.passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
