use crate::{
    config::Config,
    core::{reconcile, Report},
    credentials::CredentialResolver,
    errors::Result,
    git::{Git, LocalRepository},
    github::{GitHubClient, PullRequestLookup},
    remote::parse_remote_url,
};
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct Tidy {
    /// Show what would be deleted without deleting
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Run as if started in <path>
    #[arg(short = 'C', value_name = "path", default_value = ".")]
    pub path: PathBuf,
}

impl Tidy {
    pub fn execute(&self) -> Result<Report> {
        let git = Git::open(&self.path)?;
        let config = Config::load(&git);

        self.run(&git, &config, || {
            let token = CredentialResolver::from_system().resolve()?;
            GitHubClient::new(token)
        })
    }

    /// The whole run against any repository and lookup backend
    ///
    /// `connect` is only called once there are branches to check and the
    /// remote is known to be a GitHub repository, so nothing touches the
    /// network or the keyring before that.
    pub fn run<R, L, F>(&self, git: &R, config: &Config, connect: F) -> Result<Report>
    where
        R: LocalRepository,
        L: PullRequestLookup,
        F: FnOnce() -> Result<L>,
    {
        let branches = git.list_local_branches(&config.protected_branches)?;
        if branches.is_empty() {
            println!(
                "No branches to check (only {} exist)",
                config.protected_branches.join(", ")
            );
            return Ok(Report::default());
        }
        println!("Found {} branches to check", branches.len());

        let remote_url = git.remote_url(&config.remote)?;
        let repo = parse_remote_url(&remote_url)?;
        log::info!("checking pull requests of {}", repo);

        let lookup = connect()?;

        Ok(reconcile(git, &lookup, &repo, &branches, self.dry_run))
    }
}
