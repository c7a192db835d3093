use crate::errors::{Result, TidyError};
use git2::{BranchType, Repository};
use std::path::Path;

/// The operations the tidy run needs from a local repository.
pub trait LocalRepository {
    /// Local branch names, minus the protected ones, in refname order
    fn list_local_branches(&self, protected: &[String]) -> Result<Vec<String>>;
    fn remote_url(&self, remote: &str) -> Result<String>;
    /// Force delete: the branch does not have to be merged into HEAD
    fn delete_branch(&self, name: &str) -> Result<()>;
}

pub struct Git {
    pub repository: Repository,
}

impl Git {
    /// Open the repository containing `path`, walking up parents like git does
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let repository = Repository::discover(path).map_err(|e| {
            TidyError::Git(format!(
                "cannot open repository at {}: {}",
                path.display(),
                e.message()
            ))
        })?;
        log::debug!("opened repository at {}", repository.path().display());
        Ok(Self { repository })
    }
}

impl LocalRepository for Git {
    fn list_local_branches(&self, protected: &[String]) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in self.repository.branches(Some(BranchType::Local))? {
            let (branch, _) = entry?;
            match branch.name()? {
                Some(name) => names.push(name.to_string()),
                None => log::debug!("skipping branch with a non UTF-8 name"),
            }
        }
        // libgit2 does not guarantee an order, `git branch` sorts by refname
        names.sort();

        Ok(candidate_branches(names.iter().map(String::as_str), protected))
    }

    fn remote_url(&self, remote: &str) -> Result<String> {
        let found = self.repository.find_remote(remote).map_err(|e| {
            TidyError::Git(format!("failed to get remote URL: {}", e.message()))
        })?;
        let url = found
            .url()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        url.ok_or_else(|| TidyError::Git(format!("remote '{}' has no URL", remote)))
    }

    fn delete_branch(&self, name: &str) -> Result<()> {
        let mut branch = self.repository.find_branch(name, BranchType::Local)?;
        branch.delete()?;
        log::debug!("deleted refs/heads/{}", name);
        Ok(())
    }
}

/// Trim names, drop empty ones and the protected ones, keep the order
pub fn candidate_branches<'a>(
    names: impl IntoIterator<Item = &'a str>,
    protected: &[String],
) -> Vec<String> {
    names
        .into_iter()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter(|name| !protected.iter().any(|p| p == name))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
pub struct MockRepository {
    pub branches: Vec<String>,
    pub remote: Option<String>,
    pub broken: bool,
    pub undeletable: Vec<String>,
    pub deleted: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockRepository {
    pub fn new(branches: &[&str]) -> Self {
        Self {
            branches: branches.iter().map(|b| b.to_string()).collect(),
            remote: Some("git@github.com:octo/widgets.git".to_string()),
            broken: false,
            undeletable: Vec::new(),
            deleted: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn with_remote(mut self, remote: Option<&str>) -> Self {
        self.remote = remote.map(|r| r.to_string());
        self
    }

    /// Every operation fails, as if there were no repository at all
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    pub fn with_undeletable(mut self, branch: &str) -> Self {
        self.undeletable.push(branch.to_string());
        self
    }

    pub fn get_deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl LocalRepository for MockRepository {
    fn list_local_branches(&self, protected: &[String]) -> Result<Vec<String>> {
        if self.broken {
            return Err(TidyError::Git("not a git repository".to_string()));
        }
        Ok(candidate_branches(
            self.branches.iter().map(String::as_str),
            protected,
        ))
    }

    fn remote_url(&self, remote: &str) -> Result<String> {
        self.remote
            .clone()
            .ok_or_else(|| TidyError::Git(format!("remote '{}' not found", remote)))
    }

    fn delete_branch(&self, name: &str) -> Result<()> {
        if self.broken || self.undeletable.iter().any(|b| b == name) {
            return Err(TidyError::Git(format!("cannot delete branch '{}'", name)));
        }
        self.deleted.lock().unwrap().push(name.to_string());
        Ok(())
    }
}
