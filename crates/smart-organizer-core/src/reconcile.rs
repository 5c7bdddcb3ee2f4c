use crate::action_log::{ActionKind, ChangeKind, LogEntry};
use crate::classifier::Category;
use crate::conflict::resolve_path;
use crate::engine::{FilePlan, Organizer};
use crate::error::Error;
use crate::fs_ops::move_file;
use crate::progress::ProgressReporter;
use crate::scanner::{list_organized_files, list_organized_folders, OrganizedFolder};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// A name this much longer than the old stem counts as an AI improvement. Only a
/// heuristic: the naming rule that produced it may not have been the AI one.
const IMPROVEMENT_MARGIN: usize = 5;

/// Counters for one reconcile invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReanalysisStats {
    pub files_processed: usize,
    pub files_renamed: usize,
    pub files_moved: usize,
    pub ai_improvements: usize,
}

impl AddAssign for ReanalysisStats {
    fn add_assign(&mut self, other: Self) {
        self.files_processed += other.files_processed;
        self.files_renamed += other.files_renamed;
        self.files_moved += other.files_moved;
        self.ai_improvements += other.ai_improvements;
    }
}

/// Filesystem view with this pass's planned moves applied on top. Dry runs and
/// live runs resolve conflicts against the same picture.
#[derive(Debug, Default)]
struct Occupancy {
    vacated: HashSet<PathBuf>,
    occupied: HashSet<PathBuf>,
}

impl Occupancy {
    fn exists(&self, path: &Path) -> bool {
        self.occupied.contains(path) || (!self.vacated.contains(path) && path.exists())
    }

    fn vacate(&mut self, path: &Path) {
        self.occupied.remove(path);
        self.vacated.insert(path.to_path_buf());
    }

    fn claim(&mut self, path: &Path) {
        self.vacated.remove(path);
        self.occupied.insert(path.to_path_buf());
    }
}

/// A file whose category or name differs from what it would get today.
struct Candidate<'a> {
    org: &'a OrganizedFolder,
    path: PathBuf,
    /// Where the file sits right now. Differs from `path` once parked.
    from: PathBuf,
    plan: FilePlan,
    category_changed: bool,
    target_folder: PathBuf,
    dest: PathBuf,
    leaving: bool,
}

impl Candidate<'_> {
    fn current_name(&self) -> &str {
        &self.plan.metadata.entry.name
    }

    fn new_name(&self) -> String {
        self.dest
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn renamed(&self) -> bool {
        self.new_name() != self.current_name()
    }

    fn improved(&self) -> bool {
        self.renamed()
            && self.plan.name.name.chars().count()
                > self.plan.metadata.entry.stem.chars().count() + IMPROVEMENT_MARGIN
    }

    fn change_type(&self) -> Vec<ChangeKind> {
        let mut kinds = Vec::new();
        if self.category_changed {
            kinds.push(ChangeKind::CategoryChange);
        }
        if self.renamed() {
            kinds.push(ChangeKind::Rename);
        }
        kinds
    }

    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.category_changed {
            parts.push(format!(
                "category: {} -> {}",
                self.org.label, self.plan.category
            ));
        }
        if self.renamed() {
            parts.push(format!("name: {} -> {}", self.current_name(), self.new_name()));
        }
        parts.join(", ")
    }
}

impl ReanalysisStats {
    fn record(&mut self, candidate: &Candidate<'_>) {
        if candidate.category_changed {
            self.files_moved += 1;
        }
        if candidate.renamed() {
            self.files_renamed += 1;
        }
        if candidate.improved() {
            self.ai_improvements += 1;
        }
    }
}

impl Organizer {
    /// Re-derive category and name for every file already inside an
    /// `Organized_*` folder of `folder`, moving or renaming only what changed.
    ///
    /// Every file is planned before anything moves, so a name that is only
    /// free once another file leaves it is still handed out. Running this twice
    /// in a row changes nothing the second time.
    ///
    /// Returns `Ok(None)` when there is nothing to reconcile (missing folder or no
    /// organized subfolders). With `dry_run` nothing on disk is touched.
    pub fn reconcile_folder(
        &mut self,
        folder: &Path,
        dry_run: bool,
        reporter: &dyn ProgressReporter,
    ) -> Result<Option<ReanalysisStats>, Error> {
        if !folder.is_dir() {
            warn!("Folder does not exist: {}", folder.display());
            return Ok(None);
        }

        info!("Re-analyzing organized files in: {}", folder.display());

        let organized = list_organized_folders(folder)?;
        if organized.is_empty() {
            info!("No organized folders found - run initial organization first");
            return Ok(None);
        }

        // Snapshot first so a file moved into a later folder is not seen twice.
        let mut work: Vec<(&OrganizedFolder, PathBuf)> = Vec::new();
        for org in &organized {
            for path in list_organized_files(&org.path)? {
                work.push((org, path));
            }
        }

        let mut stats = ReanalysisStats::default();
        let mut candidates = Vec::new();

        for (org, path) in work {
            if self.is_ignored(&path) {
                continue;
            }
            stats.files_processed += 1;
            reporter.on_file_start(&path);

            match self.plan_change(folder, org, &path) {
                Ok(Some(candidate)) => candidates.push(candidate),
                Ok(None) => {}
                Err(e) => {
                    error!("Error re-analyzing {}: {}", path.display(), e);
                    reporter.on_file_failed(&path, &e.to_string());
                }
            }
        }

        assign_destinations(&mut candidates);
        candidates.retain(|c| c.leaving);

        if dry_run {
            for candidate in &candidates {
                info!(
                    "[DRY RUN] Would change {}: {}",
                    candidate.current_name(),
                    candidate.describe()
                );
                stats.record(candidate);
                reporter.on_file_done(&candidate.path, &candidate.dest, true);
            }
        } else {
            self.apply_changes(candidates, &mut stats, reporter);
        }

        let action_word = if dry_run { "Would process" } else { "Processed" };
        info!(
            "Re-analysis summary: {} {} files, {} renamed, {} moved to new categories, {} AI naming improvements",
            action_word,
            stats.files_processed,
            stats.files_renamed,
            stats.files_moved,
            stats.ai_improvements
        );

        Ok(Some(stats))
    }

    fn plan_change<'a>(
        &mut self,
        root: &Path,
        org: &'a OrganizedFolder,
        path: &Path,
    ) -> Result<Option<Candidate<'a>>, Error> {
        let plan = self.plan_file(path)?;

        let category_changed = Category::from_label(&org.label) != Some(plan.category);
        if !category_changed && plan.new_filename() == plan.metadata.entry.name {
            debug!("No changes needed for: {}", plan.metadata.entry.name);
            return Ok(None);
        }

        let target_folder = if category_changed {
            root.join(plan.category.folder_name())
        } else {
            org.path.clone()
        };

        Ok(Some(Candidate {
            org,
            path: path.to_path_buf(),
            from: path.to_path_buf(),
            plan,
            category_changed,
            target_folder,
            dest: path.to_path_buf(),
            leaving: true,
        }))
    }

    /// Move candidates once their destination is free. When every remaining
    /// destination is held by another pending file the chain is a cycle, and
    /// one file is parked under a temporary name to break it.
    fn apply_changes(
        &self,
        mut pending: Vec<Candidate<'_>>,
        stats: &mut ReanalysisStats,
        reporter: &dyn ProgressReporter,
    ) {
        while !pending.is_empty() {
            let before = pending.len();
            let mut waiting = Vec::new();

            for candidate in pending {
                if candidate.dest.exists() {
                    waiting.push(candidate);
                    continue;
                }
                match self.apply_change(&candidate) {
                    Ok(()) => {
                        stats.record(&candidate);
                        reporter.on_file_done(&candidate.path, &candidate.dest, false);
                    }
                    Err(e) => {
                        error!("Error re-analyzing {}: {}", candidate.path.display(), e);
                        reporter.on_file_failed(&candidate.path, &e.to_string());
                    }
                }
            }

            pending = waiting;
            if pending.len() < before {
                continue;
            }

            let sources: HashSet<PathBuf> = pending.iter().map(|c| c.from.clone()).collect();
            let (stuck, chained): (Vec<_>, Vec<_>) = pending
                .into_iter()
                .partition(|c| !sources.contains(&c.dest));
            pending = chained;

            if !stuck.is_empty() {
                for candidate in stuck {
                    let msg = format!("destination is occupied: {}", candidate.dest.display());
                    error!("Error re-analyzing {}: {}", candidate.path.display(), msg);
                    reporter.on_file_failed(&candidate.path, &msg);
                }
                continue;
            }

            let held = pending[0].dest.clone();
            let Some(idx) = pending.iter().position(|c| c.from == held) else {
                break;
            };
            let taken: HashSet<PathBuf> = pending.iter().map(|c| c.dest.clone()).collect();
            match park(&pending[idx], &taken) {
                Ok(parked) => {
                    debug!(
                        "Parked {} at {} to break a rename cycle",
                        pending[idx].from.display(),
                        parked.display()
                    );
                    pending[idx].from = parked;
                }
                Err(e) => {
                    let candidate = pending.remove(idx);
                    error!("Error re-analyzing {}: {}", candidate.path.display(), e);
                    reporter.on_file_failed(&candidate.path, &e.to_string());
                }
            }
        }
    }

    fn apply_change(&self, candidate: &Candidate<'_>) -> Result<(), Error> {
        if candidate.category_changed {
            fs::create_dir_all(&candidate.target_folder)?;
        }
        move_file(&candidate.from, &candidate.dest)?;
        info!("Updated: {}", candidate.describe());

        let entry = LogEntry {
            action: ActionKind::Reanalysis,
            original_path: candidate.path.to_string_lossy().into_owned(),
            new_path: candidate.dest.to_string_lossy().into_owned(),
            original_name: candidate.current_name().to_string(),
            new_name: candidate.new_name(),
            category: candidate.plan.category.label().to_string(),
            original_category: Some(candidate.org.label.clone()),
            mime_type: candidate.plan.mime_type.clone(),
            metadata: candidate.plan.metadata.to_log_map(),
            change_type: candidate.change_type(),
            timestamp: LogEntry::now(),
        };
        // The file has already moved; a missing log line must not undo that.
        if let Err(e) = self.action_log().append(&entry) {
            error!(
                "Moved {} but could not record it in {}: {}",
                candidate.path.display(),
                self.action_log().path().display(),
                e
            );
        }
        Ok(())
    }
}

/// Give every leaving candidate a destination, treating all leaving sources as
/// already vacated. A candidate whose best name is its own path stays put and
/// the round is repeated without it, so this ends after at most one round per
/// candidate.
fn assign_destinations(candidates: &mut [Candidate<'_>]) {
    'round: loop {
        let mut occupancy = Occupancy::default();
        for candidate in candidates.iter().filter(|c| c.leaving) {
            occupancy.vacate(&candidate.path);
        }

        for candidate in candidates.iter_mut().filter(|c| c.leaving) {
            let dest = resolve_path(
                &candidate.target_folder,
                &candidate.plan.name.name,
                &candidate.plan.metadata.entry.suffix,
                |p| occupancy.exists(p),
                Some(&candidate.path),
            );
            if dest == candidate.path {
                debug!("{} already holds its resolved name", candidate.current_name());
                candidate.leaving = false;
                continue 'round;
            }
            occupancy.claim(&dest);
            candidate.dest = dest;
        }
        break;
    }
}

fn park(candidate: &Candidate<'_>, taken: &HashSet<PathBuf>) -> Result<PathBuf, Error> {
    let entry = &candidate.plan.metadata.entry;
    let folder = candidate.from.parent().unwrap_or_else(|| Path::new(""));
    let parked = resolve_path(
        folder,
        &format!("{}_tmp", entry.stem),
        &entry.suffix,
        |p| taken.contains(p) || p.exists(),
        None,
    );
    move_file(&candidate.from, &parked)?;
    Ok(parked)
}
