use crate::{
    errors::TidyError,
    git::LocalRepository,
    github::{PullRequestLookup, PullRequestSummary},
    remote::RepositoryId,
};

/// What a pull request lookup says about a branch
#[derive(Debug)]
pub enum Verdict {
    LookupFailed(TidyError),
    NoPullRequest,
    NotMerged(PullRequestSummary),
    Merged(PullRequestSummary),
}

impl Verdict {
    pub fn from_lookup(result: crate::errors::Result<Option<PullRequestSummary>>) -> Self {
        match result {
            Err(e) => Verdict::LookupFailed(e),
            Ok(None) => Verdict::NoPullRequest,
            Ok(Some(pr)) if pr.is_merged() => Verdict::Merged(pr),
            Ok(Some(pr)) => Verdict::NotMerged(pr),
        }
    }

    pub fn should_delete(&self) -> bool {
        matches!(self, Verdict::Merged(_))
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Report {
    pub checked: usize,
    /// Branches with a merged pull request, in discovery order
    pub to_delete: Vec<String>,
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
}

/// Look up every branch and print what we found
///
/// Returns the branches whose pull request is merged. A failed lookup only
/// skips that branch.
pub fn classify_branches<L: PullRequestLookup>(
    lookup: &L,
    repo: &RepositoryId,
    branches: &[String],
) -> Vec<String> {
    let mut to_delete = Vec::new();

    for branch in branches {
        let verdict = Verdict::from_lookup(lookup.find_for_branch(repo, branch));

        match &verdict {
            Verdict::LookupFailed(e) => {
                println!("  {}: error checking PR: {}", branch, e);
            }
            Verdict::NoPullRequest => {
                println!("  {}: no PR found", branch);
            }
            Verdict::NotMerged(pr) => {
                println!("  {}: PR #{} not merged (state: {})", branch, pr.number, pr.state);
            }
            Verdict::Merged(pr) => {
                log::debug!("PR #{} was opened from {}", pr.number, pr.head_ref);
                println!("  {}: PR #{} merged", branch, pr.number);
            }
        }

        if verdict.should_delete() {
            to_delete.push(branch.clone());
        }
    }

    to_delete
}

/// Delete the given branches, or only say so in dry run
///
/// A failed deletion is reported and the remaining branches are still tried.
pub fn delete_branches<R: LocalRepository>(
    git: &R,
    branches: &[String],
    dry_run: bool,
    report: &mut Report,
) {
    for branch in branches {
        if dry_run {
            println!("  Would delete: {}", branch);
            continue;
        }

        match git.delete_branch(branch) {
            Ok(()) => {
                println!("  Deleted: {}", branch);
                report.deleted.push(branch.clone());
            }
            Err(e) => {
                log::debug!("failed to delete {}: {:?}", branch, e);
                println!("  Error deleting {}: {}", branch, e);
                report.failed.push(branch.clone());
            }
        }
    }
}

/// Check every branch against GitHub and delete the merged ones
pub fn reconcile<R: LocalRepository, L: PullRequestLookup>(
    git: &R,
    lookup: &L,
    repo: &RepositoryId,
    branches: &[String],
    dry_run: bool,
) -> Report {
    let mut report = Report {
        checked: branches.len(),
        to_delete: classify_branches(lookup, repo, branches),
        ..Report::default()
    };

    if report.to_delete.is_empty() {
        println!("\nNo branches to delete");
        return report;
    }

    println!("\nBranches to delete: {}", report.to_delete.len());
    let to_delete = report.to_delete.clone();
    delete_branches(git, &to_delete, dry_run, &mut report);

    report
}
