use crate::errors::{Result, TidyError};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use url::Url;

pub const GITHUB_HOST: &str = "github.com";

/// `owner/name` of a GitHub repository, both parts non-empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryId {
    pub owner: String,
    pub name: String,
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Resolve a remote URL into the GitHub repository it points at
///
/// Accepts the scp-like form `git@github.com:owner/repo.git` and any URL
/// (`https://`, `ssh://`, ...) whose host is github.com. At most one
/// trailing `.git` is removed from the repository name.
pub fn parse_remote_url(raw: &str) -> Result<RepositoryId> {
    let raw = raw.trim();
    parse_scp_like(raw)
        .or_else(|| parse_url(raw))
        .ok_or_else(|| TidyError::RemoteUrl(raw.to_string()))
}

fn scp_like_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^[^@/\s]+@github\.com:(?P<owner>[^/]+)/(?P<repo>[^/]+?)(?:\.git)?$").ok()
        })
        .as_ref()
}

fn parse_scp_like(raw: &str) -> Option<RepositoryId> {
    let caps = scp_like_pattern()?.captures(raw)?;
    Some(RepositoryId {
        owner: caps.name("owner")?.as_str().to_string(),
        name: caps.name("repo")?.as_str().to_string(),
    })
}

fn parse_url(raw: &str) -> Option<RepositoryId> {
    let url = Url::parse(raw).ok()?;
    if url.host_str()? != GITHUB_HOST {
        log::debug!("{} is not hosted on {}", raw, GITHUB_HOST);
        return None;
    }

    let path = url.path();
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = path.strip_suffix('/').unwrap_or(path);
    let path = path.strip_suffix(".git").unwrap_or(path);

    let (owner, name) = path.split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }

    Some(RepositoryId {
        owner: owner.to_string(),
        name: name.to_string(),
    })
}
