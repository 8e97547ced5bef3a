use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::ai::TopicGenerator;
use crate::config::Config;
use crate::error::Result;
use crate::feed::FeedBuilder;
use crate::history::HistoryStore;
use crate::infra::{Clock, Storage};
use crate::models::{HistoryEntry, Topic};

/// The run loop: reads history, generates a topic for every due book,
/// merges the feed, and persists feed, audio and history.
///
/// One invocation is one run; there is no transactionality across the
/// persistence steps, and overlapping invocations are assumed to be
/// prevented by the scheduler.
pub struct FeedPipeline<G, S, C> {
    generator: G,
    storage: S,
    clock: C,
    history: HistoryStore<S>,
    builder: FeedBuilder,
    feed_path: PathBuf,
    audio_dir: PathBuf,
}

impl<G, S, C> FeedPipeline<G, S, C>
where
    G: TopicGenerator,
    S: Storage + Clone,
    C: Clock,
{
    pub fn new(config: &Config, generator: G, storage: S, clock: C) -> Self {
        let history = HistoryStore::new(storage.clone(), config.history_path());
        let builder = FeedBuilder::new(
            config.feed_title.clone(),
            config.feed_description.clone(),
            config.feed_link.clone(),
            config.feed_domain.clone(),
        );

        Self {
            generator,
            storage,
            clock,
            history,
            builder,
            feed_path: config.feed_path(),
            audio_dir: config.audio_dir(),
        }
    }

    pub async fn run(&self) -> Result<()> {
        let mut history = self.history.load()?;
        let new_topics = self.generate_new_topics(&history).await;

        info!(
            "new topics: {}",
            new_topics
                .iter()
                .map(|t| t.topic.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let existing = if self.storage.exists(&self.feed_path) {
            Some(self.storage.read(&self.feed_path)?)
        } else {
            None
        };

        let feed = self
            .builder
            .build(existing.as_deref(), &new_topics, self.clock.now())?;
        self.storage.write(&self.feed_path, &feed)?;

        self.write_audio_files(&new_topics)?;

        update_history(&mut history, &new_topics, self.clock.now());
        self.history.save(&history)?;

        Ok(())
    }

    /// One generator call per due book, sequentially and in history order.
    /// A failed book is logged and skipped; it never aborts the run.
    async fn generate_new_topics(&self, history: &[HistoryEntry]) -> Vec<Topic> {
        let today = self.clock.today();
        let mut topics = Vec::new();

        for entry in history.iter().filter(|e| is_due(e, today)) {
            match self
                .generator
                .generate(&entry.book, &entry.covered_topics)
                .await
            {
                Ok(topic) => topics.push(topic),
                Err(e) => warn!(book = %entry.book, "skipping book: {e}"),
            }
        }

        topics
    }

    fn write_audio_files(&self, topics: &[Topic]) -> Result<()> {
        for topic in topics {
            if let Some(audio) = &topic.audio {
                let path = self.audio_dir.join(format!("{}.mp3", topic.id));
                self.storage.write_binary(&path, audio)?;
            }
        }
        Ok(())
    }
}

/// A book is due when its entry was not already updated on the current
/// calendar date. The timestamp's own date component is compared, so a
/// run shortly after midnight picks up books updated late the previous
/// day.
fn is_due(entry: &HistoryEntry, today: chrono::NaiveDate) -> bool {
    entry.updated_at.date_naive() != today
}

/// Appends each new topic to its book's entry and stamps the entry with
/// the run time. Topics whose book is missing from history are skipped
/// silently: the book may have been removed by hand mid-run, or the
/// generator may have returned a mismatched book.
pub fn update_history(history: &mut [HistoryEntry], new_topics: &[Topic], now: DateTime<Utc>) {
    for topic in new_topics {
        let Some(entry) = history.iter_mut().find(|e| e.book == topic.book) else {
            continue;
        };
        entry.covered_topics.push(topic.topic.clone());
        entry.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn entry(book: &str, covered: &[&str], updated_at: DateTime<Utc>) -> HistoryEntry {
        HistoryEntry {
            book: book.to_string(),
            covered_topics: covered.iter().map(|s| s.to_string()).collect(),
            updated_at,
        }
    }

    fn topic_for(book: &str, title: &str) -> Topic {
        Topic {
            id: "id1".to_string(),
            book: book.to_string(),
            topic: title.to_string(),
            description: "body".to_string(),
            audio: None,
        }
    }

    #[test]
    fn entries_updated_today_are_not_due() {
        let updated = Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap();
        let e = entry("Ruby Programming", &[], updated);

        assert!(!is_due(&e, updated.date_naive()));
        assert!(is_due(&e, updated.date_naive().succ_opt().unwrap()));
    }

    #[test]
    fn update_history_appends_and_stamps_matching_entries() {
        let yesterday = Utc.with_ymd_and_hms(2025, 1, 14, 10, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap();
        let mut history = vec![
            entry("Ruby Programming", &["Variables"], yesterday),
            entry("Rails Guide", &["Models"], yesterday),
            entry("Untouched Book", &["Intro"], yesterday),
        ];
        let new_topics = vec![
            topic_for("Ruby Programming", "Classes"),
            topic_for("Rails Guide", "Views"),
        ];

        update_history(&mut history, &new_topics, now);

        assert_eq!(history[0].covered_topics, vec!["Variables", "Classes"]);
        assert_eq!(history[0].updated_at, now);
        assert_eq!(history[1].covered_topics, vec!["Models", "Views"]);
        assert_eq!(history[1].updated_at, now);
        assert_eq!(history[2].covered_topics, vec!["Intro"]);
        assert_eq!(history[2].updated_at, yesterday);
    }

    #[test]
    fn update_history_ignores_orphan_topics() {
        let yesterday = Utc.with_ymd_and_hms(2025, 1, 14, 10, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap();
        let mut history = vec![entry("Ruby Programming", &["Variables"], yesterday)];
        let new_topics = vec![topic_for("Unknown Book", "Orphan")];

        update_history(&mut history, &new_topics, now);

        assert_eq!(history[0].covered_topics, vec!["Variables"]);
        assert_eq!(history[0].updated_at, yesterday);
    }
}
