use std::{path::PathBuf, time::Instant};

use anyhow::Result;
use clap::{Parser, Subcommand};
use reelsight_core::{
    AnalysisSession, Analyzer, ReasoningAgent, Settings, UploadedVideo, VideoStore,
};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod repl;
mod ui;

#[derive(Parser)]
#[command(name = "reelsight")]
#[command(about = "Ask questions about a local video with Gemini, enriched with web search")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file (TOML). Defaults to ./reelsight.toml or the user config dir.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Gemini model id
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Delay between processing-state checks, in milliseconds
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    /// Give up after this many processing-state checks (0 = never)
    #[arg(long, global = true)]
    max_polls: Option<u32>,

    /// Answer from the video alone, without web search
    #[arg(long, global = true)]
    no_web_search: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Ask one or more questions about a video and print the answers
    Analyze {
        /// Video file (mp4, mov or avi)
        video: PathBuf,

        /// Question to ask; repeat for several questions
        #[arg(short, long = "query", required = true)]
        queries: Vec<String>,
    },
    /// Interactive session: load videos, ask questions, review history
    Session {
        /// Video to load at start
        video: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("reelsight=debug,reelsight_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::discover(cli.config.as_deref())?.with_env();

    if let Some(model) = &cli.model {
        settings.model = model.clone();
    }
    if let Some(interval) = cli.poll_interval_ms {
        settings.poll_interval_ms = interval;
    }
    if let Some(max_polls) = cli.max_polls {
        settings.max_polls = max_polls;
    }
    if cli.no_web_search {
        settings.web_search = false;
    }

    Ok(settings)
}

async fn analyze<S, A>(analyzer: &Analyzer<S, A>, video: PathBuf, queries: Vec<String>) -> Result<()>
where
    S: VideoStore,
    A: ReasoningAgent,
{
    let video = UploadedVideo::from_path(&video).await?;
    ui::video_loaded(&video);
    ui::rule();

    let mut session = AnalysisSession::new();
    let mut failures = 0usize;

    for query in &queries {
        println!("{} {}\n", console::style("Query:").bold(), query);

        let started = Instant::now();
        let spinner = ui::create_spinner("Processing video...");
        let outcome = tokio::select! {
            outcome = analyzer.analyze(&mut session, &video, query) => Some(outcome),
            Ok(()) = tokio::signal::ctrl_c() => None,
        };
        spinner.finish_and_clear();

        let Some(outcome) = outcome else {
            anyhow::bail!("interrupted");
        };
        match outcome {
            Ok(entry) => ui::answer(entry, started.elapsed()),
            Err(e) => {
                ui::analysis_failed(&e);
                failures += 1;
            }
        }
        ui::rule();
    }

    if failures > 0 {
        anyhow::bail!("{} of {} queries failed", failures, queries.len());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            ui::error(&e.to_string());
            std::process::exit(1);
        }
    };

    // Without a key the client stays unconfigured and every analysis reports it.
    if settings.api_key.is_none() {
        warn!("no API key configured; set GOOGLE_API_KEY or api_key in the settings file");
    }
    debug!(model = %settings.model, poll_interval_ms = settings.poll_interval_ms, max_polls = settings.max_polls, "settings resolved");

    let analyzer = Analyzer::gemini(settings.provider_config(), settings.poll_policy());

    ui::banner();

    match cli.command {
        Command::Analyze { video, queries } => analyze(&analyzer, video, queries).await,
        Command::Session { video } => repl::run(&analyzer, video).await,
    }
}
