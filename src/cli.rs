use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "media_organizer")]
#[command(about = "rename and sort photos and videos by capture date")]
pub struct Cli {
    /// Only process these extensions (comma separated, default: every file)
    #[arg(short = 'e', long, value_delimiter = ',', global = true)]
    pub suffix: Vec<String>,

    /// Show what would happen without touching any file
    #[arg(long, default_value_t = false, global = true)]
    pub dry_run: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rename and/or move files into year/month[/day] folders
    Organize {
        /// Root directory; date folders are created below it
        #[arg(required = true)]
        root: PathBuf,
        /// Descend into subdirectories
        #[arg(short, long, default_value_t = false)]
        recursive: bool,
        /// Move files into date folders under the root
        #[arg(short = 'm', long = "move", default_value_t = false)]
        move_files: bool,
        /// Add a day level below year/month
        #[arg(short, long, default_value_t = false, requires = "move_files")]
        day_folders: bool,
        /// Prefix names with the capture time ("YYYY-MM-DD HH-mm-ss (name) - camera")
        #[arg(short = 'n', long, default_value_t = false)]
        rename: bool,
    },
    /// Rename files in place using their capture date and camera
    Rename {
        #[arg(required = true)]
        root: PathBuf,
        /// Descend into subdirectories
        #[arg(short, long, default_value_t = false)]
        recursive: bool,
    },
    /// Print the capture date and camera found for files
    Inspect {
        /// Files or directories to inspect
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_organize() {
        let cli = Cli::parse_from([
            "media_organizer",
            "organize",
            "/photos",
            "-r",
            "--move",
            "-d",
            "-n",
            "-e",
            "jpg,MP4",
        ]);
        assert_eq!(cli.suffix, vec!["jpg", "MP4"]);
        match cli.command {
            Commands::Organize {
                root,
                recursive,
                move_files,
                day_folders,
                rename,
            } => {
                assert_eq!(root, PathBuf::from("/photos"));
                assert!(recursive && move_files && day_folders && rename);
            }
            _ => panic!("expected organize"),
        }
    }

    #[test]
    fn test_day_folders_need_move() {
        assert!(Cli::try_parse_from(["media_organizer", "organize", "/photos", "-d"]).is_err());
    }
}
