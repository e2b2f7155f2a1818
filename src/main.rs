mod cli;
mod commands;
mod config;
mod constants;
mod dashboard;
mod error;
mod format;
mod git;
mod jsonc;
mod paths;
mod process;
mod session;
mod state;
mod status;
mod ui;
mod worktree;
mod worktree_session;


use anyhow::Result;
use clap::Parser;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    let config = config::Config::load()?;
    let report = commands::run(cli.command, &config)?;
    println!("{report}");
    Ok(())
}
