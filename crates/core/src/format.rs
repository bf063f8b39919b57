use crate::{
    history::HistoryStore,
    types::{HistoryEntry, WebSource},
};

pub const EMPTY_HISTORY_MESSAGE: &str = "You haven't analyzed any videos yet.";

/// Numbered markdown list of web sources, empty when there are none
pub fn format_sources(sources: &[WebSource]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, source)| format!("{}. [{}]({})", i + 1, source.title, source.uri))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_answer(entry: &HistoryEntry) -> String {
    let mut output = String::new();
    output.push_str("## Analysis Result\n\n");
    output.push_str(entry.response.trim_end());
    output.push_str("\n\n");

    if !entry.sources.is_empty() {
        output.push_str("### Sources\n\n");
        output.push_str(&format_sources(&entry.sources));
        output.push_str("\n\n");
    }

    output
}

/// History as markdown, most recent first and numbered from 1.
pub fn format_history(history: &HistoryStore) -> String {
    if history.is_empty() {
        return format!("{}\n", EMPTY_HISTORY_MESSAGE);
    }

    let mut output = String::new();
    for (i, entry) in history.list().enumerate() {
        output.push_str(&format!("**{}. Query:** {}\n", i + 1, entry.query));
        output.push_str(&format!("**Answer:** {}\n", entry.response.trim_end()));
        output.push_str("---\n");
    }
    output
}
