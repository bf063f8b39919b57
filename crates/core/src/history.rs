use crate::types::{AgentReply, HistoryEntry};

/// Append-only log of answered queries for one session.
#[derive(Debug, Default, Clone)]
pub struct HistoryStore {
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, query: impl Into<String>, reply: AgentReply) -> &HistoryEntry {
        self.entries.push(HistoryEntry {
            query: query.into(),
            response: reply.text,
            sources: reply.sources,
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Most recent first.
    pub fn list(&self) -> impl ExactSizeIterator<Item = &HistoryEntry> {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
