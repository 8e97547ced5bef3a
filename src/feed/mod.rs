pub mod builder;

pub use builder::{sanitize_content, FeedBuilder};
