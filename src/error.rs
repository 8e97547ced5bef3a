use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// The persisted history file is unreadable or structurally invalid.
    /// Fatal: no due-book selection can proceed without a trustworthy baseline.
    #[error("Malformed history: {0}")]
    MalformedHistory(String),

    /// The persisted feed document cannot be parsed back. Fatal: merging
    /// would otherwise drop previously published items.
    #[error("Malformed feed: {0}")]
    MalformedFeed(String),

    /// The model failed to produce a usable topic/analysis. Recovered per
    /// book: the affected book is skipped for this run.
    #[error("Topic generation failed: {0}")]
    Generation(String),

    /// Speech synthesis failed. Recovered by emitting a text-only item.
    #[error("Audio synthesis failed: {0}")]
    AudioSynthesis(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Server error: {0}")]
    Server(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
