use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommitLensError {
    #[error("Commit statistics for {owner}/{repo} still processing after {attempts} attempts")]
    StatsNotReady {
        owner: String,
        repo: String,
        attempts: u32,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CommitLensError>;
