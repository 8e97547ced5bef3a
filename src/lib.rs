//! bookcast - a podcast-style RSS feed of AI-narrated book analyses
//!
//! Each `--generate` run asks the model for one uncovered topic per
//! tracked book, writes a long-form analysis, synthesizes narration, and
//! merges the results into a persistent RSS feed. A history file keeps
//! the topics already covered per book so the model is steered away from
//! repeats. The default mode serves the feed and audio files over HTTP.
//!
//! # Modules
//!
//! - `ai`: content generation against the model provider
//! - `feed`: RSS construction and merge
//! - `history`: the per-book topic history
//! - `pipeline`: the run loop tying the above together
//! - `server`: delivery of the persisted feed and audio files
//! - `infra`: storage and clock capabilities injected into the pipeline

pub mod ai;
pub mod config;
pub mod error;
pub mod feed;
pub mod history;
pub mod infra;
pub mod models;
pub mod pipeline;
pub mod server;

pub use config::Config;
pub use error::{AppError, Result};
pub use pipeline::FeedPipeline;
