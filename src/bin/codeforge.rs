//! Command-line client for the analysis service
//!
//! Usage:
//!   codeforge --repo https://github.com/org/repo
//!   codeforge --archive project.zip --direction lr --filter calls
//!   codeforge --repo <url> --select fn_handle_payment --json

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use codeforge::api::{AnalysisInput, HttpAnalysisClient};
use codeforge::config::ClientConfig;
use codeforge::job::{JobOrchestrator, JobSnapshot, JobState, StageStatus};
use codeforge::layout::{LayoutDirection, LayoutEngine};
use codeforge::view::{EdgeFilter, ResultsExplorer};

#[derive(Parser)]
#[command(name = "codeforge")]
#[command(about = "Analyse a codebase and explore its dependency graph")]
struct Args {
    /// Zip archive to upload
    #[arg(short = 'a', long, conflicts_with = "repo", required_unless_present = "repo")]
    archive: Option<PathBuf>,

    /// Repository URL to analyse
    #[arg(short = 'r', long)]
    repo: Option<String>,

    /// Analysis service base URL
    #[arg(long, env = "CODEFORGE_API_URL")]
    api_url: Option<String>,

    /// Status poll interval in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Layout direction (tb, lr)
    #[arg(short = 'd', long, default_value = "tb")]
    direction: LayoutDirection,

    /// Edge filter (all, calls, structural, dependency, flow)
    #[arg(short = 'f', long, default_value = "all")]
    filter: EdgeFilter,

    /// Node id to show details for
    #[arg(short = 's', long)]
    select: Option<String>,

    /// Print the derived view as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,codeforge=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "ERROR:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &args.api_url {
        config = config.base_url(url)?;
    }
    if let Some(ms) = args.poll_interval_ms {
        config = config.poll_interval_ms(ms);
    }

    let input = match (&args.archive, &args.repo) {
        (Some(path), _) => AnalysisInput::from_path(path)
            .await
            .with_context(|| format!("Failed to read archive {}", path.display()))?,
        (None, Some(url)) => AnalysisInput::repository(url.clone()),
        (None, None) => anyhow::bail!("either --archive or --repo is required"),
    };

    let client = Arc::new(HttpAnalysisClient::new(config.clone())?);
    let orchestrator = JobOrchestrator::from_config(client, &config);
    let handle = orchestrator.start(input);

    let mut rx = handle.subscribe();
    let mut last_progress: Option<(u8, String)> = None;
    while !rx.borrow().is_settled() {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                handle.cancel();
                break;
            }
        }
        let snapshot = rx.borrow_and_update().clone();
        if !args.json {
            print_progress(&snapshot, &mut last_progress);
        }
    }

    let snapshot = handle.snapshot();
    if snapshot.cancelled {
        eprintln!("{}", "Cancelled".yellow());
        return Ok(ExitCode::FAILURE);
    }

    match snapshot.job.state {
        JobState::Done => {}
        JobState::Failed => {
            let message = snapshot.job.error_detail().unwrap_or("Analysis failed");
            eprintln!("{} {}", "FAILED:".red().bold(), message);
            return Ok(ExitCode::FAILURE);
        }
        other => anyhow::bail!("job stopped in unexpected state {}", other),
    }

    let results = snapshot
        .job
        .result
        .context("finished job carries no results")?;

    let mut explorer = ResultsExplorer::new(Arc::clone(&results), LayoutEngine::new(config.layout));
    explorer.set_direction(args.direction);
    explorer.set_filter(args.filter);
    if let Some(id) = &args.select {
        explorer.select(id);
    }
    let view = explorer.view();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!();
    println!("{}", explorer.insight().bold());
    println!(
        "Nodes: {}  Edges: {} ({} shown, filter {})",
        view.stats.nodes.to_string().green(),
        view.stats.total_edges.to_string().green(),
        view.stats.visible_edges,
        view.filter
    );
    if let Some(loc) = results.stats.loc_estimate() {
        println!("Lines of code: ~{}", loc);
    }
    if let Some(confidence) = results.stats.confidence_ratio() {
        println!("Confidence: {:.0}%", confidence * 100.0);
    }
    if !view.stats.agrees_with(&results.stats) {
        println!(
            "{} service reported {} nodes / {} edges",
            "NOTE:".yellow(),
            results.stats.nodes,
            results.stats.edges
        );
    }
    if !results.validation.is_clean() {
        println!(
            "{} dropped {} edges ({} dangling, {} unknown label, {} duplicate)",
            "NOTE:".yellow(),
            results.validation.dropped(),
            results.validation.dangling_edges,
            results.validation.unknown_labels,
            results.validation.duplicate_edges
        );
    }

    if let Some(node) = &view.selected_node {
        println!();
        println!("{} ({})", node.name.bold(), node.node_type);
        println!("  Location: {}", node.location());
        println!("  Risk:     {}", node.risk_level);
        if let Some(reason) = &node.failure_reason {
            println!("  Reason:   {}", reason);
        }
        if !node.calls.is_empty() {
            println!("  Calls:    {}", node.calls.join(", "));
        }
        if let Some(p) = view.selected_position {
            println!("  Position: ({:.0}, {:.0})", p.x, p.y);
        }
    } else if let Some(id) = &args.select {
        println!("{} no node with id '{}'", "NOTE:".yellow(), id);
    }

    Ok(ExitCode::SUCCESS)
}

fn print_progress(snapshot: &JobSnapshot, last: &mut Option<(u8, String)>) {
    let job = &snapshot.job;
    let current = (job.progress_step, job.progress_message.clone());
    if last.as_ref() == Some(&current) {
        return;
    }
    let stage = job
        .stage_statuses()
        .into_iter()
        .find(|(_, status)| *status == StageStatus::Current)
        .map(|(stage, _)| stage.to_string())
        .unwrap_or_default();
    println!(
        "[{}/6] {} {}",
        job.progress_step,
        current.1.cyan(),
        stage.dimmed()
    );
    *last = Some(current);
}
