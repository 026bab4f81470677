mod display;
mod input;

use std::future::Future;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use certame_ai::{CohereGateway, GatewayConfig, gateway};
use certame_core::AnalysisMode;
use certame_pipeline::{
    AnalysisOrchestrator, AnalysisOutcome, AppealOutcome, ProgressEstimator, RetryPolicy,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

const PROGRESS_TICK: Duration = Duration::from_millis(400);

#[derive(Parser, Debug)]
#[command(name = "certame", version)]
#[command(about = "Compliance analysis of Brazilian public procurement documents")]
struct Cli {
    /// Cohere API key.
    #[arg(long, env = "COHERE_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,
    #[arg(long, env = "COHERE_BASE_URL", default_value = gateway::DEFAULT_ENDPOINT, global = true)]
    endpoint: String,
    #[arg(long, env = "CERTAME_MODEL", default_value = gateway::DEFAULT_MODEL, global = true)]
    model: String,
    /// Extra attempts after a transient gateway failure.
    #[arg(long, default_value_t = 2, global = true)]
    retries: u32,
    #[arg(long, default_value_t = 500, global = true)]
    retry_backoff_ms: u64,
    /// HTTP timeout per generation request.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    /// Print a readable report instead of JSON.
    #[arg(long, global = true)]
    report: bool,
    /// No progress line on stderr.
    #[arg(long, short, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a tender notice for irregularities.
    Edital { file: Option<PathBuf> },
    /// Check a winning bid against its tender notice.
    Proposta {
        edital: Option<PathBuf>,
        proposta: Option<PathBuf>,
    },
    /// Draft an appeal for one irregularity of an earlier scan.
    Recurso {
        /// JSON written by `edital` or `proposta`.
        #[arg(long)]
        analysis: PathBuf,
        #[arg(long)]
        id: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), command = ?cli.command, "certame");

    let orchestrator = build_orchestrator(&cli)?;
    let show_progress = !cli.quiet && std::io::stderr().is_terminal();

    let success = match &cli.command {
        Command::Edital { file } => {
            let document = input::read_document(file.as_deref()).await?;
            let result =
                with_progress(show_progress, orchestrator.analyze_single_document(document)).await;
            let outcome = AnalysisOutcome::from_result(AnalysisMode::SingleDocumentScan, result);
            emit_analysis(&outcome, cli.report)?
        }
        Command::Proposta { edital, proposta } => {
            let notice = input::read_document(edital.as_deref()).await?;
            let bid = input::read_document(proposta.as_deref()).await?;
            let result =
                with_progress(show_progress, orchestrator.analyze_comparative(notice, bid)).await;
            let outcome = AnalysisOutcome::from_result(AnalysisMode::ComparativeScan, result);
            emit_analysis(&outcome, cli.report)?
        }
        Command::Recurso { analysis, id } => {
            let prior = input::read_prior_result(analysis).await?;
            let irregularity = input::select_irregularity(&prior, *id)?;
            let result =
                with_progress(show_progress, orchestrator.draft_appeal(Some(irregularity))).await;
            emit_appeal(&AppealOutcome::from_result(result), cli.report)?
        }
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn gateway_config(cli: &Cli) -> anyhow::Result<GatewayConfig> {
    let mut config = GatewayConfig::from_lookup(|name| match name {
        gateway::API_KEY_VAR => cli.api_key.clone(),
        gateway::ENDPOINT_VAR => Some(cli.endpoint.clone()),
        gateway::MODEL_VAR => Some(cli.model.clone()),
        _ => None,
    })
    .context("pass --api-key or set COHERE_API_KEY")?;
    config.timeout = cli.timeout_secs.map(Duration::from_secs);
    Ok(config)
}

fn build_orchestrator(cli: &Cli) -> anyhow::Result<AnalysisOrchestrator> {
    let config = gateway_config(cli)?;
    tracing::debug!(?config, "gateway configuration");
    let gateway = CohereGateway::new(config).context("building HTTP client")?;
    tracing::info!(model = gateway.model(), "text-generation gateway ready");
    let retry = RetryPolicy::new(cli.retries, Duration::from_millis(cli.retry_backoff_ms));
    Ok(AnalysisOrchestrator::new(Arc::new(gateway)).with_retry_policy(retry))
}

/// Await `work`, animating an estimated progress line on stderr meanwhile.
async fn with_progress<T>(enabled: bool, work: impl Future<Output = T>) -> T {
    if !enabled {
        return work.await;
    }

    let mut progress = ProgressEstimator::new();
    let mut ticker = tokio::time::interval(PROGRESS_TICK);
    tokio::pin!(work);
    loop {
        tokio::select! {
            out = &mut work => {
                progress.finish();
                eprintln!("\r{:>3.0}% {:<48}", progress.percent(), progress.label());
                return out;
            }
            _ = ticker.tick() => {
                let percent = progress.tick();
                eprint!("\r{:>3.0}% {:<48}", percent, progress.label());
            }
        }
    }
}

fn emit_analysis(outcome: &AnalysisOutcome, report: bool) -> anyhow::Result<bool> {
    if report {
        print!("{}", display::render_analysis(outcome));
    } else {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    }
    Ok(outcome.success)
}

fn emit_appeal(outcome: &AppealOutcome, report: bool) -> anyhow::Result<bool> {
    if report {
        print!("{}", display::render_appeal(outcome));
    } else {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    }
    Ok(outcome.success)
}
