use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, NaiveDateTime};
use log::debug;
use std::path::{Path, PathBuf};

use crate::metadata::CaptureMetadata;
use crate::utils::Policy;

const RENAME_FORMAT: &str = "%Y-%m-%d %H-%M-%S";

/// A file as found during the walk, split into the parts renaming works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
    /// File name without the final extension.
    pub stem: String,
    /// Final extension including its dot, empty when there is none.
    pub extension: String,
    pub directory: PathBuf,
}

impl MediaFile {
    pub fn new(path: &Path) -> Result<Self> {
        let directory = path
            .parent()
            .with_context(|| format!("No parent directory for {:?}", path))?;
        let stem = path
            .file_stem()
            .with_context(|| format!("No file name in {:?}", path))?
            .to_str()
            .context("Path not UTF-8")?;
        let extension = match path.extension() {
            Some(ext) => format!(".{}", ext.to_str().context("Path not UTF-8")?),
            None => String::new(),
        };

        Ok(MediaFile {
            path: path.to_path_buf(),
            stem: stem.to_string(),
            extension,
            directory: directory.to_path_buf(),
        })
    }
}

/// Base name the file should carry.
///
/// A stem that already starts with its own timestamp is kept as is, so
/// running twice never prefixes twice.
pub fn new_base_name(stem: &str, metadata: &CaptureMetadata, rename: bool) -> String {
    if !rename {
        return stem.to_string();
    }

    let candidate = metadata.timestamp.format(RENAME_FORMAT).to_string();
    if stem.starts_with(&candidate) {
        return stem.to_string();
    }

    match &metadata.camera_model {
        Some(model) => format!("{} ({}) - {}", candidate, stem, model),
        None => format!("{} ({})", candidate, stem),
    }
}

/// `root/year/month[/day]`, components without zero padding.
pub fn date_directory(root: &Path, timestamp: &NaiveDateTime, use_day_folders: bool) -> PathBuf {
    let month_dir = root
        .join(timestamp.year().to_string())
        .join(timestamp.month().to_string());

    if use_day_folders {
        month_dir.join(timestamp.day().to_string())
    } else {
        month_dir
    }
}

/// Compute where `file` has to go.
///
/// `occupied` is asked whether a candidate path is taken. The source path is
/// never treated as taken, so a file that is already in place comes back
/// unchanged. Otherwise " (2)", " (3)", ... are tried until a free name turns
/// up. The answer is only valid at the time of the probe; another process may
/// claim the path before the move happens.
pub fn derive_destination<F>(
    file: &MediaFile,
    metadata: &CaptureMetadata,
    policy: &Policy,
    occupied: F,
) -> Result<PathBuf>
where
    F: Fn(&Path) -> bool,
{
    let name = new_base_name(&file.stem, metadata, policy.rename);
    let directory = if policy.move_files {
        date_directory(&policy.root, &metadata.timestamp, policy.use_day_folders)
    } else {
        file.directory.clone()
    };

    let is_free = |candidate: &Path| candidate == file.path.as_path() || !occupied(candidate);

    let candidate = directory.join(format!("{}{}", name, file.extension));
    if is_free(candidate.as_path()) {
        return Ok(candidate);
    }

    for counter in 2..=u32::MAX {
        let candidate = directory.join(format!("{} ({}){}", name, counter, file.extension));
        if is_free(candidate.as_path()) {
            return Ok(candidate);
        }
        debug!("{:?} is taken", candidate);
    }

    Err(anyhow!("No free name left for {:?} in {:?}", name, directory))
}
