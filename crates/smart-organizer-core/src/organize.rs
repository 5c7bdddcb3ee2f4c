use crate::action_log::{ActionKind, LogEntry};
use crate::conflict::resolve_path;
use crate::engine::Organizer;
use crate::error::Error;
use crate::fs_ops::{ensure_organized_folders, move_file};
use crate::progress::ProgressReporter;
use crate::scanner::list_files;
use serde::Serialize;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrganizeStats {
    pub files_seen: usize,
    pub files_organized: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
}

impl AddAssign for OrganizeStats {
    fn add_assign(&mut self, other: Self) {
        self.files_seen += other.files_seen;
        self.files_organized += other.files_organized;
        self.files_skipped += other.files_skipped;
        self.files_failed += other.files_failed;
    }
}

impl Organizer {
    /// Move every direct file of `folder` into its category folder.
    ///
    /// Per-file failures are logged and counted; they never stop the loop. A
    /// missing folder is a warning, not an error.
    pub fn organize_folder(
        &mut self,
        folder: &Path,
        reporter: &dyn ProgressReporter,
    ) -> Result<OrganizeStats, Error> {
        let mut stats = OrganizeStats::default();

        if !folder.is_dir() {
            warn!("Folder does not exist: {}", folder.display());
            return Ok(stats);
        }

        info!("Processing folder: {}", folder.display());
        ensure_organized_folders(folder)?;

        let files = list_files(folder)?;
        info!("Found {} files to process", files.len());

        for path in files {
            stats.files_seen += 1;

            if self.is_ignored(&path) {
                debug!("Skipping system file: {}", path.display());
                stats.files_skipped += 1;
                continue;
            }

            reporter.on_file_start(&path);
            match self.organize_file(folder, &path) {
                Ok(dest) => {
                    stats.files_organized += 1;
                    reporter.on_file_done(&path, &dest, false);
                }
                Err(e) => {
                    error!("Error processing {}: {}", path.display(), e);
                    stats.files_failed += 1;
                    reporter.on_file_failed(&path, &e.to_string());
                }
            }
        }

        Ok(stats)
    }

    fn organize_file(&mut self, root: &Path, path: &Path) -> Result<PathBuf, Error> {
        let plan = self.plan_file(path)?;
        info!(
            "Processing: {} (Type: {}, Category: {})",
            plan.metadata.entry.name, plan.mime_type, plan.category
        );

        let dest_folder = root.join(plan.category.folder_name());
        let dest = resolve_path(
            &dest_folder,
            &plan.name.name,
            &plan.metadata.entry.suffix,
            |p| p.exists(),
            None,
        );

        move_file(path, &dest)?;

        let new_name = dest
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();

        let entry = LogEntry {
            action: ActionKind::Organize,
            original_path: path.to_string_lossy().into_owned(),
            new_path: dest.to_string_lossy().into_owned(),
            original_name: plan.metadata.entry.name.clone(),
            new_name,
            category: plan.category.label().to_string(),
            original_category: None,
            mime_type: plan.mime_type.clone(),
            metadata: plan.metadata.to_log_map(),
            change_type: Vec::new(),
            timestamp: LogEntry::now(),
        };
        // The file has already moved; a missing log line must not undo that.
        if let Err(e) = self.action_log().append(&entry) {
            error!(
                "Moved {} but could not record it in {}: {}",
                path.display(),
                self.action_log().path().display(),
                e
            );
        }

        info!("Moved: {} -> {}", plan.metadata.entry.name, dest.display());
        Ok(dest)
    }
}
