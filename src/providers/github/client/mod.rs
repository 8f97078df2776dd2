mod contributors;
mod core;
mod stats;

pub use core::GitHubClient;
pub use stats::StatsResponse;
