use crate::metadata::{MetadataSource, Resolver};
use crate::utils::{get_all_files_from_paths, AppConfig};
use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

pub fn cmd_inspect(config: &AppConfig, paths: &[PathBuf]) -> Result<()> {
    inspect_with(config, paths, &Resolver::system()).map(|_| ())
}

/// Print what the resolver finds for every file, returns how many resolved.
fn inspect_with<P, F>(
    config: &AppConfig,
    paths: &[PathBuf],
    resolver: &Resolver<P, F>,
) -> Result<usize>
where
    P: MetadataSource,
    F: MetadataSource,
{
    let files = get_all_files_from_paths(config, paths);

    if files.is_empty() {
        println!("No files found.");
        return Ok(0);
    }

    let mut resolved = 0;
    for path in files {
        match resolver.resolve(&path) {
            Some(metadata) => {
                resolved += 1;
                println!(
                    "File: {:?}, Captured: {}, Camera: {}",
                    path,
                    metadata
                        .timestamp
                        .format("%Y-%m-%d %H:%M:%S")
                        .to_string()
                        .green(),
                    metadata.camera_model.as_deref().unwrap_or("unknown")
                );
            }
            None => eprintln!("File: {:?}, {}", path, "Cannot get file metadata".red()),
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::CaptureMetadata;
    use anyhow::anyhow;
    use chrono::NaiveDate;
    use std::fs;
    use std::path::Path;

    struct OnlyJpeg;

    impl MetadataSource for OnlyJpeg {
        fn capture_metadata(&self, path: &Path) -> Result<CaptureMetadata> {
            if path.extension().and_then(|e| e.to_str()) != Some("jpg") {
                return Err(anyhow!("not a jpeg"));
            }
            Ok(CaptureMetadata {
                timestamp: NaiveDate::from_ymd_opt(2022, 8, 1)
                    .unwrap()
                    .and_hms_opt(8, 0, 0)
                    .unwrap(),
                camera_model: None,
            })
        }
    }

    struct Nothing;

    impl MetadataSource for Nothing {
        fn capture_metadata(&self, _path: &Path) -> Result<CaptureMetadata> {
            Err(anyhow!("nothing"))
        }
    }

    #[test]
    fn test_inspect_counts_resolved_files_and_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.jpg"), b"").unwrap();
        fs::write(dir.path().join("sub/b.jpg"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let resolver = Resolver::new(OnlyJpeg, Nothing);
        let paths = vec![dir.path().to_path_buf(), dir.path().join("missing.jpg")];
        let resolved = inspect_with(&AppConfig::default(), &paths, &resolver).unwrap();

        assert_eq!(resolved, 2);
        assert!(dir.path().join("a.jpg").is_file());
        assert!(dir.path().join("sub/b.jpg").is_file());
    }

    #[test]
    fn test_inspect_nothing_found() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = Resolver::new(OnlyJpeg, Nothing);
        let paths = vec![dir.path().to_path_buf()];
        let resolved = inspect_with(&AppConfig::default(), &paths, &resolver).unwrap();
        assert_eq!(resolved, 0);
    }
}
