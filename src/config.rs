use crate::git::Git;

pub const DEFAULT_REMOTE: &str = "origin";
pub const DEFAULT_PROTECTED_BRANCHES: [&str; 2] = ["main", "master"];

/// Settings read from the `[tidy]` section of git config
///
/// ```text
/// [tidy]
///     remote = upstream
///     protectedBranches = main, develop
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub remote: String,
    pub protected_branches: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: DEFAULT_REMOTE.to_string(),
            protected_branches: DEFAULT_PROTECTED_BRANCHES
                .iter()
                .map(|b| b.to_string())
                .collect(),
        }
    }
}

impl Config {
    pub fn load(git: &Git) -> Self {
        match git.repository.config() {
            Ok(config) => Self::from_git_config(&config),
            Err(e) => {
                log::debug!("cannot read git config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    pub fn from_git_config(config: &git2::Config) -> Self {
        let mut result = Self::default();

        if let Ok(remote) = config.get_string("tidy.remote") {
            let remote = remote.trim();
            if !remote.is_empty() {
                result.remote = remote.to_string();
            }
        }

        if let Ok(branches) = config.get_string("tidy.protectedBranches") {
            let branches = parse_branch_list(&branches);
            if !branches.is_empty() {
                result.protected_branches = branches;
            }
        }

        log::debug!("config: {:?}", result);
        result
    }
}

fn parse_branch_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .collect()
}
