use crate::destination::{derive_destination, MediaFile};
use crate::metadata::{CaptureMetadata, MetadataSource, Resolver};
use crate::utils::{get_files, occupied, AppConfig, Policy, Progress};
use anyhow::{Context, Result};
use colored::Colorize;
use log::{debug, info};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// What happened to a single file.
#[derive(Debug)]
pub enum Outcome {
    /// Moved or renamed to the contained path (planned only, on a dry run).
    Success(PathBuf),
    AlreadyRenamed,
    MetadataUnavailable,
    Failed(anyhow::Error),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub success: usize,
    pub already_renamed: usize,
    pub metadata_unavailable: usize,
    pub failed: usize,
}

impl Summary {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Success(_) => self.success += 1,
            Outcome::AlreadyRenamed => self.already_renamed += 1,
            Outcome::MetadataUnavailable => self.metadata_unavailable += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }
}

pub fn cmd_organize(config: &AppConfig, policy: &Policy) -> Result<Summary> {
    organize_with(config, policy, &Resolver::system())
}

pub fn organize_with<P, F>(
    config: &AppConfig,
    policy: &Policy,
    resolver: &Resolver<P, F>,
) -> Result<Summary>
where
    P: MetadataSource,
    F: MetadataSource,
{
    if !policy.rename && !policy.move_files {
        println!(
            "{}",
            "Neither renaming nor moving is enabled, nothing will change.".yellow()
        );
    }

    let files = get_files(&policy.root, config, policy.recursive);
    println!(
        "{}",
        format!("{:?}: {} files", policy.root, files.len()).bold()
    );
    info!("Processing with {:?}", policy);

    let mut progress = Progress::new(files.len());
    let mut summary = Summary::default();
    // destinations handed out on a dry run, nothing lands on disk to probe
    let mut planned: HashSet<PathBuf> = HashSet::new();

    let mut current_dir: Option<&Path> = None;

    for path in &files {
        let dir = path.parent();
        if dir != current_dir {
            if let Some(dir) = dir {
                println!("{}", format!("Processing directory {:?}", dir).bold());
            }
            current_dir = dir;
        }

        let outcome = match resolver.resolve(path) {
            Some(metadata) => match relocate(path, &metadata, config, policy, &mut planned) {
                Ok(Some(dest)) => Outcome::Success(dest),
                Ok(None) => Outcome::AlreadyRenamed,
                Err(e) => Outcome::Failed(e),
            },
            None => Outcome::MetadataUnavailable,
        };

        progress.advance();
        report(&progress, path, &outcome, config.dry_run);
        summary.record(&outcome);
    }

    print_summary(&summary);
    Ok(summary)
}

/// Returns the new path, or `None` when the file already sits where it belongs.
fn relocate(
    path: &Path,
    metadata: &CaptureMetadata,
    config: &AppConfig,
    policy: &Policy,
    planned: &mut HashSet<PathBuf>,
) -> Result<Option<PathBuf>> {
    let file = MediaFile::new(path)?;
    let destination = derive_destination(&file, metadata, policy, |candidate| {
        occupied(candidate) || planned.contains(candidate)
    })?;

    if destination == file.path {
        return Ok(None);
    }

    if config.dry_run {
        planned.insert(destination.clone());
        return Ok(Some(destination));
    }

    if let Some(parent) = destination.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
            debug!("Created directory {:?}", parent);
        }
    }

    move_file(&file.path, &destination)?;
    Ok(Some(destination))
}

/// Move `source` to `destination`, refusing to replace anything already there.
///
/// The destination is claimed with a hard link, which fails if the name
/// exists, and the source link is dropped afterwards. Filesystems without
/// hard links fall back to a check followed by a rename, where a file
/// created in between would still be overwritten.
fn move_file(source: &Path, destination: &Path) -> Result<()> {
    match fs::hard_link(source, destination) {
        Ok(()) => {
            if let Err(e) = fs::remove_file(source) {
                let _ = fs::remove_file(destination);
                return Err(e).with_context(|| format!("Failed to remove {:?}", source));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(anyhow::anyhow!(
            "Destination {:?} appeared in the meantime, not overwriting it",
            destination
        )),
        Err(e)
            if matches!(
                e.kind(),
                io::ErrorKind::Unsupported | io::ErrorKind::PermissionDenied
            ) =>
        {
            debug!("Hard link to {:?} failed ({}), renaming", destination, e);
            rename_unless_occupied(source, destination)
        }
        Err(e) => {
            Err(e).with_context(|| format!("Failed to move {:?} to {:?}", source, destination))
        }
    }
}

fn rename_unless_occupied(source: &Path, destination: &Path) -> Result<()> {
    if occupied(destination) {
        return Err(anyhow::anyhow!(
            "Destination {:?} appeared in the meantime, not overwriting it",
            destination
        ));
    }
    fs::rename(source, destination)
        .with_context(|| format!("Failed to move {:?} to {:?}", source, destination))
}

fn report(progress: &Progress, path: &Path, outcome: &Outcome, dry_run: bool) {
    let prefix = format!("{} {:?}: ", progress, path);
    match outcome {
        Outcome::Success(dest) if dry_run => {
            println!("{}{}", prefix, format!("DRY-RUN: -> {:?}", dest).green())
        }
        Outcome::Success(dest) => println!("{}{} -> {:?}", prefix, "Success".green(), dest),
        Outcome::AlreadyRenamed => println!("{}{}", prefix, "Already renamed".white()),
        Outcome::MetadataUnavailable => {
            println!("{}{}", prefix, "Cannot get file metadata".red())
        }
        Outcome::Failed(e) => eprintln!("{}{} {:#}", prefix, "Failed:".red().bold(), e),
    }
}

fn print_summary(summary: &Summary) {
    println!();
    println!("{}", "Done!".bold());
    println!("  Success: {}", summary.success.to_string().green());
    println!("  Already renamed: {}", summary.already_renamed);
    if summary.metadata_unavailable > 0 {
        println!(
            "  Without metadata: {}",
            summary.metadata_unavailable.to_string().yellow()
        );
    }
    if summary.failed > 0 {
        println!("  Failed: {}", summary.failed.to_string().red());
    }
}
