use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completed exchange: what the partner wrote since the previous reply, and the
/// reply that was injected in answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub remote_text: String,
    pub remote_translation: String,
    pub local_text: String,
    pub local_translation: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only conversation log kept by the embedded side.
///
/// Remote deltas accumulate until the next local injection closes the exchange. The
/// running transcript mirrors what the chat area shows, in arrival order.
#[derive(Debug, Default)]
pub struct SessionHistory {
    entries: Vec<HistoryEntry>,
    pending_remote: Vec<String>,
    transcript: String,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_remote(&mut self, delta: &str) {
        if delta.is_empty() {
            return;
        }
        self.pending_remote.push(delta.to_string());
        self.append_transcript(delta);
    }

    pub fn record_exchange(
        &mut self,
        remote_translation: Option<&str>,
        local_text: &str,
        local_translation: &str,
    ) -> &HistoryEntry {
        let remote_text = std::mem::take(&mut self.pending_remote).join("\n");
        self.append_transcript(local_translation);

        self.entries.push(HistoryEntry {
            remote_text,
            remote_translation: remote_translation.unwrap_or_default().to_string(),
            local_text: local_text.to_string(),
            local_translation: local_translation.to_string(),
            timestamp: Utc::now(),
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.pending_remote.clear();
        self.transcript.clear();
    }

    /// Audit export of every closed exchange.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries)
    }

    fn append_transcript(&mut self, text: &str) {
        if !self.transcript.is_empty() {
            self.transcript.push('\n');
        }
        self.transcript.push_str(text);
    }
}
