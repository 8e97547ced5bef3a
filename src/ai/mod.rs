//! Content generation against the model provider.

pub mod generator;

use async_trait::async_trait;

pub use generator::{OpenAiGenerator, SampleGenerator};

use crate::error::Result;
use crate::models::Topic;

/// Produces one new analysis for a book, steering away from topics that
/// were already covered. An `Err` means "no new topic for this book this
/// run"; callers continue with the remaining books.
#[async_trait]
pub trait TopicGenerator: Send + Sync {
    async fn generate(&self, book: &str, covered_topics: &[String]) -> Result<Topic>;
}
