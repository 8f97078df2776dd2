mod core;
mod polling;

pub use core::GitHubProvider;
pub use polling::PollOptions;
