use crate::action_log::ActionLog;
use crate::analyzer::ContentAnalyzer;
use crate::classifier::{classify, Category};
use crate::config::{AppConfig, RootFolder};
use crate::error::Error;
use crate::metadata::{FileEntry, FileInspector, FsInspector, Metadata, EXIF_EXTENSIONS};
use crate::namer::{choose_name, NameChoice, NamingInput};
use crate::organize::OrganizeStats;
use crate::progress::ProgressReporter;
use crate::reconcile::ReanalysisStats;
use crate::scanner::IgnorePolicy;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Runs organize and reconcile passes over configured roots.
pub struct Organizer {
    config: AppConfig,
    analyzer: ContentAnalyzer,
    inspector: Box<dyn FileInspector>,
    ignore: IgnorePolicy,
    action_log: ActionLog,
}

/// Everything decided about one file before it is moved.
#[derive(Debug, Clone)]
pub struct FilePlan {
    pub metadata: Metadata,
    pub mime_type: String,
    pub category: Category,
    pub name: NameChoice,
}

impl FilePlan {
    /// New base name plus the file's original extension.
    pub fn new_filename(&self) -> String {
        format!("{}{}", self.name.name, self.metadata.entry.suffix)
    }
}

impl Organizer {
    pub fn new(config: AppConfig, analyzer: ContentAnalyzer) -> Result<Self, Error> {
        let action_log = ActionLog::open(&config.log_dir_path())?;
        let ignore = IgnorePolicy::new(&config.ignore_patterns);
        Ok(Self {
            config,
            analyzer,
            inspector: Box::new(FsInspector),
            ignore,
            action_log,
        })
    }

    pub fn with_inspector(mut self, inspector: Box<dyn FileInspector>) -> Self {
        self.inspector = inspector;
        self
    }

    pub fn action_log(&self) -> &ActionLog {
        &self.action_log
    }

    pub(crate) fn is_ignored(&self, path: &Path) -> bool {
        self.ignore.is_ignored(path)
    }

    /// Classify, inspect and name one file. Shared by both passes so they always
    /// agree on where a file belongs.
    pub fn plan_file(&mut self, path: &Path) -> Result<FilePlan, Error> {
        let entry = FileEntry::read(path)?;

        let mime_hint = self.inspector.sniff_mime(path);
        let (mime_type, category) = classify(&entry.extension, mime_hint.as_deref());

        let image = if EXIF_EXTENSIONS.contains(&entry.extension.as_str()) {
            self.inspector.image_metadata(path)
        } else {
            None
        };
        let preview = self.inspector.text_preview(path, &entry.extension);
        let metadata = Metadata::new(entry, image);

        let suggestion = if !preview.is_empty() && self.analyzer.is_available() {
            self.analyzer.suggest(
                &metadata.entry.name,
                &metadata.entry.stem,
                &metadata.entry.suffix,
                &preview,
            )
        } else {
            String::new()
        };

        let name = choose_name(&NamingInput::from_metadata(&metadata, &preview, &suggestion));
        debug!(
            "{}: {} / {} via {:?}",
            metadata.entry.name, category, name.name, name.rule
        );

        Ok(FilePlan {
            metadata,
            mime_type,
            category,
            name,
        })
    }

    /// Organize every root. A failing root is logged and left out of the totals.
    pub fn run_organize(&mut self, roots: &[RootFolder], reporter: &dyn ProgressReporter) -> OrganizeStats {
        info!("Starting file organization");
        let start = Instant::now();
        let mut total = OrganizeStats::default();

        for root in roots {
            let path = root.resolved_path();
            info!("Processing {} folder", root.name);
            reporter.on_folder_start(&root.name, &path);
            match self.organize_folder(&path, reporter) {
                Ok(stats) => total += stats,
                Err(e) => error!("Error processing {}: {}", root.name, e),
            }
            reporter.on_folder_complete(&root.name);
        }

        info!(
            "File organization completed in {:.2}s: {} organized, {} skipped, {} failed",
            start.elapsed().as_secs_f64(),
            total.files_organized,
            total.files_skipped,
            total.files_failed
        );
        info!("Logs saved to: {}", self.config.log_dir_path().display());
        total
    }

    /// Reconcile every root and sum the per-root counters.
    pub fn run_reconcile(
        &mut self,
        roots: &[RootFolder],
        dry_run: bool,
        reporter: &dyn ProgressReporter,
    ) -> ReanalysisStats {
        if !self.analyzer.is_available() {
            warn!("AI client not available - re-analysis will use basic naming only");
        }
        let mode = if dry_run { "DRY RUN" } else { "LIVE" };
        info!("Starting file re-analysis ({})", mode);

        let mut total = ReanalysisStats::default();
        for root in roots {
            let path = root.resolved_path();
            info!("Re-analyzing {} folder", root.name);
            reporter.on_folder_start(&root.name, &path);
            match self.reconcile_folder(&path, dry_run, reporter) {
                Ok(Some(stats)) => total += stats,
                Ok(None) => {}
                Err(e) => error!("Error re-analyzing {}: {}", root.name, e),
            }
            reporter.on_folder_complete(&root.name);
        }

        info!(
            "Total re-analysis summary ({}): {} processed, {} renamed, {} moved, {} AI improvements",
            mode,
            total.files_processed,
            total.files_renamed,
            total.files_moved,
            total.ai_improvements
        );
        if dry_run {
            info!("This was a dry run - no files were actually changed");
        }
        total
    }
}
