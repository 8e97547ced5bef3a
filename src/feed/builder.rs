use chrono::{DateTime, Utc};
use regex::Regex;
use rss::{Channel, ChannelBuilder, GuidBuilder, Item, ItemBuilder};

use crate::error::{AppError, Result};
use crate::models::Topic;

/// Builds the RSS document for a run: fresh on the first run, otherwise a
/// merge that prepends the new items and carries every previously
/// published item forward verbatim.
pub struct FeedBuilder {
    title: String,
    description: String,
    link: String,
    domain: String,
}

impl FeedBuilder {
    pub fn new(title: String, description: String, link: String, domain: String) -> Self {
        Self {
            title,
            description,
            link,
            domain,
        }
    }

    /// Merges `topics` with the previously persisted document, newest
    /// first. Published items are never mutated or removed; an existing
    /// document that no longer parses is fatal, since merging over it
    /// would drop them.
    pub fn build(
        &self,
        existing: Option<&str>,
        topics: &[Topic],
        now: DateTime<Utc>,
    ) -> Result<String> {
        let mut items: Vec<Item> = topics
            .iter()
            .map(|topic| self.new_item(topic, now))
            .collect();

        if let Some(existing) = existing {
            let old = Channel::read_from(existing.as_bytes())
                .map_err(|e| AppError::MalformedFeed(e.to_string()))?;
            items.extend(old.items().iter().map(copy_item));
        }

        let channel = ChannelBuilder::default()
            .title(self.title.as_str())
            .description(self.description.as_str())
            .link(self.link.as_str())
            .language(Some("en".to_string()))
            .pub_date(Some(now.to_rfc2822()))
            .last_build_date(Some(now.to_rfc2822()))
            .items(items)
            .build();

        Ok(channel.to_string())
    }

    fn new_item(&self, topic: &Topic, now: DateTime<Utc>) -> Item {
        let mut item = ItemBuilder::default();
        item.guid(
            GuidBuilder::default()
                .value(topic.id.as_str())
                .permalink(false)
                .build(),
        )
        .title(topic.topic.clone())
        .description(self.enriched_description(topic))
        .pub_date(now.to_rfc2822())
        .author(topic.book.clone());

        if topic.audio.is_some() {
            item.link(self.audio_url(&topic.id));
        }

        item.build()
    }

    /// The sanitized description, prefixed with a "listen" anchor when the
    /// topic carries audio.
    pub fn enriched_description(&self, topic: &Topic) -> String {
        let description = sanitize_content(&topic.description);
        if topic.audio.is_none() {
            return description;
        }

        format!(
            "<a href=\"{}\">Listen to the audio</a><br><br>{}",
            self.audio_url(&topic.id),
            description
        )
    }

    pub fn audio_url(&self, id: &str) -> String {
        format!("https://{}/audio/{}", self.domain, id)
    }
}

/// Normalizes model punctuation: the garbled `‚` character becomes a plain
/// comma, then every comma (with whatever whitespace already follows it)
/// becomes "comma + single space". Idempotent.
pub fn sanitize_content(content: &str) -> String {
    let comma_spacing = Regex::new(r",\s*").expect("valid regex");
    comma_spacing
        .replace_all(&content.replace('‚', ","), ", ")
        .into_owned()
}

// Structural copy of a previously published item. Fields the item model
// does not carry are dropped here.
fn copy_item(old: &Item) -> Item {
    let mut item = ItemBuilder::default();

    if let Some(guid) = old.guid() {
        item.guid(
            GuidBuilder::default()
                .value(guid.value())
                .permalink(guid.is_permalink())
                .build(),
        );
    }

    item.title(old.title().map(str::to_string))
        .description(old.description().map(str::to_string))
        .pub_date(old.pub_date().map(str::to_string))
        .author(old.author().map(str::to_string));

    if let Some(link) = old.link() {
        item.link(link.to_string());
    }

    item.build()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn builder() -> FeedBuilder {
        FeedBuilder::new(
            "Bookcast".to_string(),
            "Daily analyses".to_string(),
            "https://example.com".to_string(),
            "example.com".to_string(),
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap()
    }

    fn topic(id: &str, title: &str, description: &str, audio: Option<Vec<u8>>) -> Topic {
        Topic {
            id: id.to_string(),
            book: "Ruby Programming".to_string(),
            topic: title.to_string(),
            description: description.to_string(),
            audio,
        }
    }

    #[test]
    fn sanitize_spaces_out_commas() {
        assert_eq!(sanitize_content("one,two,three"), "one, two, three");
    }

    #[test]
    fn sanitize_corrects_garbled_commas() {
        assert_eq!(sanitize_content("one‚two"), "one, two");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let once = sanitize_content("a,b‚c,  d, e");
        assert_eq!(once, "a, b, c, d, e");
        assert_eq!(sanitize_content(&once), once);
    }

    #[test]
    fn enriched_description_without_audio_is_sanitized_verbatim() {
        let topic = topic("id1", "Classes", "About Ruby classes", None);
        assert_eq!(
            builder().enriched_description(&topic),
            "About Ruby classes"
        );
    }

    #[test]
    fn enriched_description_with_audio_prepends_anchor() {
        let topic = topic("id2", "Methods", "About methods", Some(vec![1, 2, 3]));
        let enriched = builder().enriched_description(&topic);

        assert!(enriched
            .starts_with("<a href=\"https://example.com/audio/id2\">Listen to the audio</a><br><br>"));
        assert!(enriched.ends_with("About methods"));
    }

    #[test]
    fn fresh_feed_contains_channel_metadata_and_new_items() {
        let feed = builder()
            .build(None, &[topic("id1", "Classes", "About Ruby classes", None)], now())
            .unwrap();

        let channel = Channel::read_from(feed.as_bytes()).unwrap();
        assert_eq!(channel.title(), "Bookcast");
        assert_eq!(channel.language(), Some("en"));
        assert_eq!(channel.items().len(), 1);

        let item = &channel.items()[0];
        assert_eq!(item.title(), Some("Classes"));
        assert_eq!(item.description(), Some("About Ruby classes"));
        assert_eq!(item.author(), Some("Ruby Programming"));
        assert_eq!(item.link(), None);

        let guid = item.guid().unwrap();
        assert_eq!(guid.value(), "id1");
        assert!(!guid.is_permalink());
    }

    #[test]
    fn item_with_audio_links_to_the_audio_location() {
        let feed = builder()
            .build(
                None,
                &[topic("id9", "Methods", "About methods", Some(vec![0]))],
                now(),
            )
            .unwrap();

        let channel = Channel::read_from(feed.as_bytes()).unwrap();
        assert_eq!(
            channel.items()[0].link(),
            Some("https://example.com/audio/id9")
        );
    }

    #[test]
    fn merge_prepends_new_items() {
        let b = builder();
        let existing = b
            .build(None, &[topic("g1", "Old", "old body", None)], now())
            .unwrap();

        let merged = b
            .build(
                Some(&existing),
                &[topic("g2", "New", "new body", None)],
                now(),
            )
            .unwrap();

        let channel = Channel::read_from(merged.as_bytes()).unwrap();
        let titles: Vec<_> = channel.items().iter().map(|i| i.title().unwrap()).collect();
        assert_eq!(titles, vec!["New", "Old"]);
    }

    #[test]
    fn merge_copies_old_items_field_for_field() {
        let existing = r#"<?xml version="1.0" encoding="UTF-8"?>
            <rss version="2.0"><channel>
                <title>Bookcast</title>
                <link>https://example.com</link>
                <description>Daily analyses</description>
                <item>
                    <guid isPermaLink="true">https://example.com/posts/1</guid>
                    <title>Old</title>
                    <description>old body</description>
                    <pubDate>Tue, 14 Jan 2025 10:00:00 +0000</pubDate>
                    <link>https://example.com/audio/g1</link>
                    <author>Rails Guide</author>
                </item>
            </channel></rss>"#;

        let merged = builder().build(Some(existing), &[], now()).unwrap();
        let channel = Channel::read_from(merged.as_bytes()).unwrap();

        assert_eq!(channel.items().len(), 1);
        let item = &channel.items()[0];
        let guid = item.guid().unwrap();
        assert_eq!(guid.value(), "https://example.com/posts/1");
        assert!(guid.is_permalink());
        assert_eq!(item.title(), Some("Old"));
        assert_eq!(item.description(), Some("old body"));
        assert_eq!(item.pub_date(), Some("Tue, 14 Jan 2025 10:00:00 +0000"));
        assert_eq!(item.link(), Some("https://example.com/audio/g1"));
        assert_eq!(item.author(), Some("Rails Guide"));
    }

    #[test]
    fn merge_rejects_a_document_that_no_longer_parses() {
        let result = builder().build(Some("not an rss document"), &[], now());
        assert!(matches!(result, Err(AppError::MalformedFeed(_))));
    }
}
