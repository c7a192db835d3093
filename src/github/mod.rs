pub mod client;
pub mod types;

#[cfg(test)]
mod tests;

pub use client::{GitHubClient, PullRequestLookup};
pub use types::PullRequestSummary;

#[cfg(test)]
pub use client::MockPullRequestLookup;
