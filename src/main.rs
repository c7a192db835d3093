use clap::Parser;
use commands::tidy::Tidy;

mod commands;
mod config;
mod core;
mod credentials;
mod errors;
mod git;
mod github;
mod remote;

#[derive(Debug, Parser)] // requires `derive` feature
#[command(name = "git-tidy", version)]
#[command(about = "Deletes local branches whose PRs have been merged", long_about = None)]
struct Cli {
    #[command(flatten)]
    tidy: Tidy,
}

fn main() {
    env_logger::init();

    let args = Cli::parse();

    match args.tidy.execute() {
        Ok(report) => log::info!(
            "checked {} branches, {} merged, {} deleted, {} failed",
            report.checked,
            report.to_delete.len(),
            report.deleted.len(),
            report.failed.len()
        ),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
