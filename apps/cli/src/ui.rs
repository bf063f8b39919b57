use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use reelsight_core::{AnalysisError, HistoryEntry, UploadedVideo, format_answer};

pub fn format_duration(d: Duration) -> String {
    let total = d.as_secs();
    if total < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", total / 60, total % 60)
    }
}

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn banner() {
    println!(
        "\n{}  {}\n",
        style("reelsight").cyan().bold(),
        style("Video Q&A with Gemini").dim()
    );
}

pub fn rule() {
    println!("{}", style("─".repeat(60)).dim());
}

pub fn video_loaded(video: &UploadedVideo) {
    println!(
        "{} Video loaded: {} {}",
        style("✓").green().bold(),
        style(video.file_name()).dim(),
        style(format!("[{}, {:.1} MB]", video.mime_type(), video.len() as f64 / 1_048_576.0)).dim()
    );
}

pub fn answer(entry: &HistoryEntry, elapsed: Duration) {
    println!(
        "{} Analyzed {}\n",
        style("✓").green().bold(),
        style(format!("[{}]", format_duration(elapsed))).dim()
    );
    println!("{}", format_answer(entry));
}

pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

pub fn warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Validation problems are warnings the user can fix; everything else is an error.
pub fn analysis_failed(err: &AnalysisError) {
    if err.is_validation() {
        warning(&err.to_string());
    } else {
        error(&err.to_string());
    }
}
