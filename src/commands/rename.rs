use crate::commands::organize::{organize_with, Summary};
use crate::metadata::{MetadataSource, Resolver};
use crate::utils::{AppConfig, Policy};
use anyhow::Result;
use std::path::Path;

/// Timestamp-prefix files where they are, no date folders.
pub fn cmd_rename(config: &AppConfig, root: &Path, recursive: bool) -> Result<Summary> {
    rename_with(config, root, recursive, &Resolver::system())
}

pub fn rename_with<P, F>(
    config: &AppConfig,
    root: &Path,
    recursive: bool,
    resolver: &Resolver<P, F>,
) -> Result<Summary>
where
    P: MetadataSource,
    F: MetadataSource,
{
    let policy = Policy::new(root, true, false, false, recursive)?;
    organize_with(config, &policy, resolver)
}
