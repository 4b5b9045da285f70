mod cli;
mod commands;
mod destination;
mod metadata;
mod utils;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use commands::inspect::cmd_inspect;
use commands::organize::cmd_organize;
use commands::rename::cmd_rename;
use utils::{AppConfig, Policy};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = AppConfig {
        suffixes: cli
            .suffix
            .iter()
            .map(|s| s.trim_start_matches('.').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect(),
        dry_run: cli.dry_run,
    };

    match &cli.command {
        Commands::Organize {
            root,
            recursive,
            move_files,
            day_folders,
            rename,
        } => {
            let policy = Policy::new(root, *rename, *move_files, *day_folders, *recursive)?;
            cmd_organize(&config, &policy)?;
        }
        Commands::Rename { root, recursive } => {
            cmd_rename(&config, root, *recursive)?;
        }
        Commands::Inspect { paths } => cmd_inspect(&config, paths)?,
    }

    Ok(())
}
