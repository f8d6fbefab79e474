//! gapfinder
//!
//! Command-line front end for the WikiGap pipeline:
//! - `rank`: find a category's articles missing from a target edition and rank them
//! - `languages`: list supported language editions
//! - `categories`: suggest category titles for a query

use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};
use wikigap_common::errors::ErrorResponse;
use wikigap_common::metrics::{install_recorder, register_metrics};
use wikigap_common::telemetry::init_tracing;
use wikigap_common::{AppConfig, AppError, RunRequest, VERSION};
use wikigap_pipeline::{
    find_languages, suggest_categories, ProgressEvent, RankingPipeline, RunReport, Upstreams,
};

#[derive(Parser, Debug)]
#[command(name = "gapfinder", version)]
#[command(
    about = "Find and rank Wikipedia articles missing from a language edition",
    long_about = None
)]
struct Cli {
    /// Configuration file; defaults to the layered `config/` directory
    #[arg(long, global = true, env = "GAPFINDER_CONFIG")]
    config: Option<String>,

    /// Print collected metrics in Prometheus text format to stderr on exit
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank a category's articles missing from the target edition.
    Rank(RankCmd),
    /// List supported language editions.
    Languages(LanguagesCmd),
    /// Suggest category titles in a language edition.
    Categories(CategoriesCmd),
}

#[derive(clap::Args, Debug)]
struct RankCmd {
    /// Edition to check, as a code (`he`) or label (`Hebrew (he)`)
    #[arg(long)]
    target: String,
    /// Category title in the reference edition
    #[arg(long)]
    category: String,
    /// Edition the category is taken from
    #[arg(long)]
    reference: String,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
    /// Print interim rankings to stderr as batches complete
    #[arg(long)]
    progress: bool,
}

#[derive(clap::Args, Debug)]
struct LanguagesCmd {
    /// Case-insensitive filter on name or code
    #[arg(long)]
    query: Option<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(clap::Args, Debug)]
struct CategoriesCmd {
    /// Language edition to search
    #[arg(long)]
    lang: String,
    /// Start of the category title
    #[arg(long)]
    query: String,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config = match cli.config.as_deref() {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::load(),
    }
    .map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    // Initialize tracing and metrics
    init_tracing(&config.observability)?;
    let metrics = install_recorder()?;
    register_metrics();

    info!("Starting gapfinder v{}", VERSION);

    let result = match cli.command {
        Commands::Rank(cmd) => rank(&config, cmd).await,
        Commands::Languages(cmd) => languages(&config, cmd).await,
        Commands::Categories(cmd) => categories(&config, cmd).await,
    };

    if cli.metrics {
        eprint!("{}", metrics.render());
    }
    result
}

async fn rank(config: &AppConfig, cmd: RankCmd) -> anyhow::Result<()> {
    let request = match RunRequest::new(&cmd.target, &cmd.category, &cmd.reference) {
        Ok(request) => request,
        Err(e) => fail(&e, cmd.format),
    };

    let pipeline = RankingPipeline::from_config(config)?;

    // Ctrl-C stops the run and keeps what is already ranked
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, returning partial ranking");
            let _ = cancel_tx.send(true);
        }
    });

    let (progress_tx, printer) = if cmd.progress {
        let (tx, mut rx) = mpsc::channel::<ProgressEvent>(8);
        let printer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                print_progress(&event);
            }
        });
        (Some(tx), Some(printer))
    } else {
        (None, None)
    };

    let result = pipeline.run_with(&request, progress_tx, cancel_rx).await;
    if let Some(printer) = printer {
        let _ = printer.await;
    }

    let report = match result {
        Ok(report) => report,
        Err(e) => fail(&e, cmd.format),
    };

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print_report(&report),
    }
    Ok(())
}

async fn languages(config: &AppConfig, cmd: LanguagesCmd) -> anyhow::Result<()> {
    let upstreams = Upstreams::from_config(config)?;
    let query = cmd.query.as_deref().unwrap_or("");
    let matches = match find_languages(upstreams.catalog.as_ref(), query).await {
        Ok(matches) => matches,
        Err(e) => fail(&e, cmd.format),
    };

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&matches)?),
        OutputFormat::Table => {
            for language in matches {
                println!("{}", language.label());
            }
        }
    }
    Ok(())
}

async fn categories(config: &AppConfig, cmd: CategoriesCmd) -> anyhow::Result<()> {
    let upstreams = Upstreams::from_config(config)?;
    let titles =
        match suggest_categories(upstreams.categories.as_ref(), &cmd.lang, &cmd.query).await {
            Ok(titles) => titles,
            Err(e) => fail(&e, cmd.format),
        };

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&titles)?),
        OutputFormat::Table => {
            for title in titles {
                println!("{}", title);
            }
        }
    }
    Ok(())
}

fn fail(err: &AppError, format: OutputFormat) -> ! {
    let response = ErrorResponse::from(err);
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(&response) {
            Ok(body) => println!("{}", body),
            Err(e) => error!(error = %e, "Failed to serialize error response"),
        },
        OutputFormat::Table => eprintln!("Error: {}", response.error.user_message),
    }
    std::process::exit(1);
}

fn print_progress(event: &ProgressEvent) {
    match event {
        ProgressEvent::Resolved { candidates } => {
            eprintln!("Resolved {} candidate articles", candidates);
        }
        ProgressEvent::BatchCompleted {
            batch,
            total_batches,
            processed,
            total,
            ranking,
        } => {
            let leader = ranking.first().map(|a| a.title()).unwrap_or("-");
            eprintln!(
                "Batch {}/{}: {}/{} checked, {} missing so far, top: {}",
                batch,
                total_batches,
                processed,
                total,
                ranking.len(),
                leader
            );
        }
        ProgressEvent::Cancelled { processed } => {
            eprintln!("Cancelled after {} candidates", processed);
        }
    }
}

fn print_report(report: &RunReport) {
    if report.articles.is_empty() {
        println!("No missing articles found.");
    } else {
        println!("{:>4}  {:>6}  Title", "#", "Score");
        for article in &report.articles {
            let flag = if article.article.low_confidence {
                "  (no metadata)"
            } else {
                ""
            };
            println!(
                "{:>4}  {:>6.3}  {}{}",
                article.position,
                article.score(),
                article.title(),
                flag
            );
            println!("{:>14}view: {}", "", article.links.view_url);
            println!("{:>14}edit: {}", "", article.links.edit_url);
        }
    }

    let summary = &report.summary;
    println!();
    println!(
        "{} candidates, {} already in {}, {} unknown, {} without a reference page, \
         {} ranked in {}ms{}",
        summary.candidates,
        summary.existing,
        report.request.target_lang,
        summary.unknown_verdicts,
        summary.missing_reference,
        summary.ranked,
        summary.duration_ms,
        if summary.cancelled { " (cancelled)" } else { "" }
    );
}
