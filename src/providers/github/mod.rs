mod client;
mod provider;

pub use provider::{GitHubProvider, PollOptions};

pub const DEFAULT_API_URL: &str = "https://api.github.com/";
