use std::{
    io::Write,
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::Result;
use console::style;
use reelsight_core::{
    AnalysisSession, Analyzer, QUERY_SUGGESTIONS, ReasoningAgent, UploadedVideo, VideoStore,
    format_history,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::ui;

#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Query(String),
    Video(PathBuf),
    History,
    Suggest,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Input::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Input::Query(line.to_string());
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match name {
            "video" | "v" if !arg.is_empty() => Input::Video(PathBuf::from(arg)),
            "history" | "h" => Input::History,
            "suggest" | "s" => Input::Suggest,
            "help" | "?" => Input::Help,
            "quit" | "q" | "exit" => Input::Quit,
            _ => Input::Unknown(line.to_string()),
        }
    }
}

fn print_help() {
    println!("Type a question to analyze the loaded video, or one of:");
    println!("  {}  load a video (mp4, mov, avi)", style("/video <path>").cyan());
    println!("  {}       previous queries and answers", style("/history").cyan());
    println!("  {}       query suggestions", style("/suggest").cyan());
    println!("  {}          leave the session", style("/quit").cyan());
}

fn print_suggestions() {
    println!("{}", style("Query suggestions").bold());
    for suggestion in QUERY_SUGGESTIONS {
        println!("  - {}", suggestion);
    }
}

fn prompt() -> std::io::Result<()> {
    print!("{} ", style("›").cyan().bold());
    std::io::stdout().flush()
}

async fn load_video(path: &Path) -> Option<UploadedVideo> {
    match UploadedVideo::from_path(path).await {
        Ok(video) => {
            ui::video_loaded(&video);
            Some(video)
        }
        Err(e) => {
            ui::error(&e.to_string());
            None
        }
    }
}

/// Interactive loop: one session, one history, any number of videos and questions.
pub async fn run<S, A>(analyzer: &Analyzer<S, A>, initial_video: Option<PathBuf>) -> Result<()>
where
    S: VideoStore,
    A: ReasoningAgent,
{
    let mut session = AnalysisSession::new();
    debug!(session = %session.id(), "interactive session started");

    let mut video = match initial_video {
        Some(path) => load_video(&path).await,
        None => None,
    };
    if video.is_none() {
        ui::info("Load a video with /video <path> to begin analysis.");
    }
    print_help();
    ui::rule();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let line = tokio::select! {
            line = lines.next_line() => line?,
            Ok(()) = tokio::signal::ctrl_c() => {
                println!();
                None
            }
        };
        let Some(line) = line else {
            break;
        };

        match Input::parse(&line) {
            Input::Empty => {}
            Input::Quit => break,
            Input::Help => print_help(),
            Input::Suggest => print_suggestions(),
            Input::History => {
                println!("{}", style("Previous queries & results").bold());
                print!("{}", format_history(session.history()));
            }
            Input::Video(path) => {
                if let Some(loaded) = load_video(&path).await {
                    video = Some(loaded);
                }
            }
            Input::Unknown(command) => {
                ui::warning(&format!("Unknown command {}. Type /help.", command));
            }
            Input::Query(query) => {
                let Some(current) = video.as_ref() else {
                    ui::warning("Please load a video first with /video <path>.");
                    continue;
                };

                let started = Instant::now();
                let spinner = ui::create_spinner("Processing video...");
                // Ctrl-C drops the request, which also removes the staged copy.
                let outcome = tokio::select! {
                    outcome = analyzer.analyze(&mut session, current, &query) => Some(outcome),
                    Ok(()) = tokio::signal::ctrl_c() => None,
                };
                spinner.finish_and_clear();

                match outcome {
                    Some(Ok(entry)) => ui::answer(entry, started.elapsed()),
                    Some(Err(e)) => ui::analysis_failed(&e),
                    None => ui::warning("Request cancelled."),
                }
            }
        }
    }

    println!(
        "\n{} {} answered in this session.",
        style("Bye.").dim(),
        session.history().len()
    );
    Ok(())
}
