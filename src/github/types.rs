use serde::Deserialize;

/// The fields of a pull request we read from `GET /repos/{owner}/{repo}/pulls`
#[derive(Debug, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub state: String,
    pub merged_at: Option<String>,
    pub head: PullRequestRef,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PullRequestSummary {
    pub number: u64,
    pub state: String,
    pub merged_at: Option<String>,
    pub head_ref: String,
}

impl PullRequestSummary {
    pub fn is_merged(&self) -> bool {
        self.merged_at.as_deref().is_some_and(|at| !at.is_empty())
    }
}

impl From<PullRequest> for PullRequestSummary {
    fn from(pr: PullRequest) -> Self {
        Self {
            number: pr.number,
            state: pr.state,
            merged_at: pr.merged_at,
            head_ref: pr.head.ref_name,
        }
    }
}
