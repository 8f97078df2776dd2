mod cache;
mod orchestrator;
mod view;

pub use cache::QueryStatus;
pub use orchestrator::QueryOrchestrator;
pub use view::{Panel, RepoView, ViewSnapshot};
