use crate::errors::{Result, TidyError};
use crate::github::types::{PullRequest, PullRequestSummary};
use crate::remote::RepositoryId;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;

pub const GITHUB_API_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const GITHUB_JSON: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub trait PullRequestLookup {
    /// The pull request whose head is `owner:branch`, in any state
    fn find_for_branch(
        &self,
        repo: &RepositoryId,
        branch: &str,
    ) -> Result<Option<PullRequestSummary>>;
}

impl<T: PullRequestLookup + ?Sized> PullRequestLookup for &T {
    fn find_for_branch(
        &self,
        repo: &RepositoryId,
        branch: &str,
    ) -> Result<Option<PullRequestSummary>> {
        (**self).find_for_branch(repo, branch)
    }
}

pub struct GitHubClient {
    http: Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(token: String) -> Result<Self> {
        Self::with_api_url(GITHUB_API_URL, token)
    }

    pub fn with_api_url(api_url: &str, token: String) -> Result<Self> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn pulls_url(&self, repo: &RepositoryId) -> String {
        format!("{}/repos/{}/{}/pulls", self.api_url, repo.owner, repo.name)
    }
}

impl PullRequestLookup for GitHubClient {
    fn find_for_branch(
        &self,
        repo: &RepositoryId,
        branch: &str,
    ) -> Result<Option<PullRequestSummary>> {
        let url = self.pulls_url(repo);
        let head = format!("{}:{}", repo.owner, branch);
        log::debug!("GET {}?head={}&state=all&per_page=1", url, head);

        let response = self
            .http
            .get(&url)
            .query(&[("head", head.as_str()), ("state", "all"), ("per_page", "1")])
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_JSON)
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        log::debug!("{} answered {}", url, status);

        parse_pull_requests(status, &body)
    }
}

/// Turn a pulls listing response into the first pull request, if any
///
/// The first element wins when the API returns more than one match.
pub fn parse_pull_requests(status: StatusCode, body: &str) -> Result<Option<PullRequestSummary>> {
    if !status.is_success() {
        return Err(TidyError::Api {
            status,
            body: body.to_string(),
        });
    }

    let pulls: Vec<PullRequest> = serde_json::from_str(body)?;
    Ok(pulls.into_iter().next().map(PullRequestSummary::from))
}

#[cfg(test)]
pub struct MockPullRequestLookup {
    pub pulls: std::collections::HashMap<String, PullRequestSummary>,
    pub failing: Vec<String>,
    pub calls: std::sync::Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
impl MockPullRequestLookup {
    pub fn new() -> Self {
        Self {
            pulls: std::collections::HashMap::new(),
            failing: Vec::new(),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn with_merged(self, branch: &str, number: u64) -> Self {
        self.with_pull(branch, number, "closed", Some("2024-01-15T10:00:00Z"))
    }

    pub fn with_open(self, branch: &str, number: u64) -> Self {
        self.with_pull(branch, number, "open", None)
    }

    pub fn with_pull(
        mut self,
        branch: &str,
        number: u64,
        state: &str,
        merged_at: Option<&str>,
    ) -> Self {
        self.pulls.insert(
            branch.to_string(),
            PullRequestSummary {
                number,
                state: state.to_string(),
                merged_at: merged_at.map(|m| m.to_string()),
                head_ref: branch.to_string(),
            },
        );
        self
    }

    pub fn with_failure(mut self, branch: &str) -> Self {
        self.failing.push(branch.to_string());
        self
    }

    pub fn get_calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl PullRequestLookup for MockPullRequestLookup {
    fn find_for_branch(
        &self,
        repo: &RepositoryId,
        branch: &str,
    ) -> Result<Option<PullRequestSummary>> {
        self.calls
            .lock()
            .unwrap()
            .push((repo.to_string(), branch.to_string()));

        if self.failing.iter().any(|b| b == branch) {
            return Err(TidyError::Api {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "{\"message\":\"Server Error\"}".to_string(),
            });
        }
        Ok(self.pulls.get(branch).cloned())
    }
}
