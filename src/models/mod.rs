use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One tracked book and the topics already covered for it.
///
/// The full set of entries is loaded at the start of a run, mutated in
/// place, and rewritten as a whole at the end. `covered_topics` is
/// append-only; `updated_at` moves only when a topic was successfully
/// appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub book: String,
    pub covered_topics: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

/// A freshly generated analysis for one book. Lives only for the duration
/// of a run: it is projected into a feed item and, when audio is present,
/// into an `audio/<id>.mp3` file.
#[derive(Debug, Clone)]
pub struct Topic {
    pub id: String,
    pub book: String,
    pub topic: String,
    pub description: String,
    pub audio: Option<Vec<u8>>,
}
