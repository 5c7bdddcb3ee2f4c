use crate::classifier::ORGANIZED_PREFIX;
use crate::error::Error;
use glob::Pattern;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::error;
use walkdir::WalkDir;

/// OS bookkeeping files that are never organized.
pub const SYSTEM_FILES: &[&str] = &[".DS_Store", ".localized", "Thumbs.db", ".Trashes", ".fseventsd"];

/// Decides which direct children of a root are left alone: system files,
/// dotfiles, symlinks and anything matching a configured glob.
#[derive(Debug, Clone, Default)]
pub struct IgnorePolicy {
    patterns: Vec<Pattern>,
}

impl IgnorePolicy {
    pub fn new(ignore_globs: &[String]) -> Self {
        let patterns = ignore_globs
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();

        if SYSTEM_FILES.contains(&name.as_str()) || name.starts_with('.') {
            return true;
        }

        let is_symlink = fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);
        if is_symlink {
            return true;
        }

        self.patterns
            .iter()
            .any(|pattern| pattern.matches_path(path) || pattern.matches(&name))
    }
}

/// Direct file children of a root, sorted by name. Symlinks are returned so the
/// caller's ignore policy can report them; organized folders never are.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    direct_files(dir, true)
}

/// Every direct file of an organized folder, sorted by name.
pub fn list_organized_files(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    direct_files(dir, false)
}

fn direct_files(dir: &Path, skip_organized: bool) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry?;
        let file_type = entry.file_type();
        if !(file_type.is_file() || file_type.is_symlink()) {
            continue;
        }
        if skip_organized
            && entry
                .file_name()
                .to_string_lossy()
                .starts_with(ORGANIZED_PREFIX)
        {
            continue;
        }
        files.push(entry.into_path());
    }

    Ok(files)
}

/// An `Organized_<Label>` directory found directly under a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizedFolder {
    pub path: PathBuf,
    /// Folder name with the prefix stripped. Not necessarily a known category.
    pub label: String,
}

pub fn list_organized_folders(dir: &Path) -> Result<Vec<OrganizedFolder>, Error> {
    let mut folders = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(label) = name.strip_prefix(ORGANIZED_PREFIX) {
            folders.push(OrganizedFolder {
                label: label.to_string(),
                path: entry.into_path(),
            });
        }
    }

    Ok(folders)
}
