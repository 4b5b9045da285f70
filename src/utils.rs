use anyhow::{Context, Result};
use log::warn;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use walkdir::{DirEntry, WalkDir};

// --- Config ---

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Lowercase extensions to process, empty means every file.
    pub suffixes: Vec<String>,
    pub dry_run: bool,
}

impl AppConfig {
    pub fn accepts(&self, path: &Path) -> bool {
        if self.suffixes.is_empty() {
            return true;
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        self.suffixes.contains(&ext)
    }
}

/// What to do with each file. Fixed for the whole run.
#[derive(Debug, Clone)]
pub struct Policy {
    pub rename: bool,
    pub move_files: bool,
    pub use_day_folders: bool,
    pub recursive: bool,
    pub root: PathBuf,
}

impl Policy {
    pub fn new(
        root: &Path,
        rename: bool,
        move_files: bool,
        use_day_folders: bool,
        recursive: bool,
    ) -> Result<Policy> {
        Ok(Policy {
            rename,
            move_files,
            use_day_folders,
            recursive,
            root: resolve_root(root)?,
        })
    }
}

// --- Progress ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

impl Progress {
    pub fn new(total: usize) -> Progress {
        Progress {
            processed: 0,
            total,
        }
    }

    pub fn advance(&mut self) {
        self.processed += 1;
    }

    pub fn percent(&self) -> usize {
        if self.total == 0 {
            100
        } else {
            self.processed * 100 / self.total
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} / {} ({}%)]", self.processed, self.total, self.percent())
    }
}

// --- Helpers ---

pub fn run_capture(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("Failed to execute {}", program))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "Command {} failed: {}",
            program,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Canonical form of the directory a run works on.
pub fn resolve_root(dir: &Path) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(anyhow::anyhow!("Directory does not exist: {:?}", dir));
    }
    fs::canonicalize(dir).with_context(|| format!("Failed to canonicalize {:?}", dir))
}

/// True when anything, a dangling symlink included, sits at `path`.
pub fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

// files before subdirectories, each group by name
fn walk_order(a: &DirEntry, b: &DirEntry) -> std::cmp::Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Collect every accepted file under `dir` up front, so that directories
/// created while processing are never walked in the same run.
pub fn get_files(dir: &Path, config: &AppConfig, recursive: bool) -> Vec<PathBuf> {
    let max_depth = if recursive { usize::MAX } else { 1 };

    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by(walk_order)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|e| e.file_type().is_file() && config.accepts(e.path()))
        .map(DirEntry::into_path)
        .collect()
}

pub fn get_all_files_from_paths(config: &AppConfig, paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut all_files = Vec::new();
    for path in paths {
        if path.is_file() {
            all_files.push(path.clone());
        } else if path.is_dir() {
            all_files.extend(get_files(path, config, true));
        } else {
            eprintln!("Warning: Path {:?} does not exist, skipping.", path);
        }
    }
    all_files
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_progress() {
        let mut progress = Progress::new(4);
        assert_eq!(progress.to_string(), "[0 / 4 (0%)]");
        progress.advance();
        assert_eq!(progress.to_string(), "[1 / 4 (25%)]");
        progress.advance();
        progress.advance();
        progress.advance();
        assert_eq!(progress.percent(), 100);
        assert_eq!(Progress::new(0).percent(), 100);
    }

    #[test]
    fn test_accepts() {
        let all = AppConfig::default();
        assert!(all.accepts(Path::new("notes.txt")));
        assert!(all.accepts(Path::new("README")));

        let config = AppConfig {
            suffixes: vec!["jpg".to_string(), "mp4".to_string()],
            dry_run: false,
        };
        assert!(config.accepts(Path::new("IMG_0001.JPG")));
        assert!(config.accepts(Path::new("clip.mp4")));
        assert!(!config.accepts(Path::new("notes.txt")));
        assert!(!config.accepts(Path::new("README")));
    }

    #[test]
    fn test_get_files_order_and_depth() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("b.jpg"));
        touch(&root.join("a.jpg"));
        touch(&root.join("aa/c.jpg"));
        touch(&root.join("aa/deeper/d.jpg"));
        touch(&root.join("z.txt"));

        let config = AppConfig::default();

        let flat = get_files(root, &config, false);
        assert_eq!(names(root, &flat), vec!["a.jpg", "b.jpg", "z.txt"]);

        let all = get_files(root, &config, true);
        assert_eq!(
            names(root, &all),
            vec!["a.jpg", "b.jpg", "z.txt", "aa/c.jpg", "aa/deeper/d.jpg"]
        );

        let jpg_only = AppConfig {
            suffixes: vec!["jpg".to_string()],
            dry_run: false,
        };
        assert_eq!(get_files(root, &jpg_only, true).len(), 4);
    }

    #[test]
    fn test_resolve_root() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_root(dir.path()).unwrap();
        assert!(resolved.is_absolute());

        assert!(resolve_root(&dir.path().join("missing")).is_err());

        let file = dir.path().join("file.jpg");
        touch(&file);
        assert!(resolve_root(&file).is_err());
    }

    #[test]
    fn test_occupied() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("IMG.jpg");
        assert!(!occupied(&file));
        touch(&file);
        assert!(occupied(&file));
    }

    #[test]
    fn test_run_capture_missing_program() {
        assert!(run_capture("definitely-not-a-real-program-xyz", &[]).is_err());
    }
}
