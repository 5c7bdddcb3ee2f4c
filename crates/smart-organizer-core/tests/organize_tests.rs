use std::fs;
use std::path::Path;
use tempfile::tempdir;

use smart_organizer_core::action_log::ActionKind;
use smart_organizer_core::analyzer::{NameSuggester, SuggestError};
use smart_organizer_core::metadata::{FileInspector, FsInspector, ImageMetadata};
use smart_organizer_core::{
    AppConfig, Category, ContentAnalyzer, DisableReason, Organizer, RootFolder, SilentReporter,
};

fn test_config(log_dir: &Path, roots: Vec<RootFolder>) -> AppConfig {
    AppConfig {
        log_dir: log_dir.to_string_lossy().into_owned(),
        roots,
        ..AppConfig::default()
    }
}

fn organizer(log_dir: &Path) -> Organizer {
    Organizer::new(
        test_config(log_dir, Vec::new()),
        ContentAnalyzer::disabled(DisableReason::TurnedOff),
    )
    .unwrap()
}

/// Reports a fixed EXIF capture date for every JPEG and defers the rest to disk.
struct FixedExif;

impl FileInspector for FixedExif {
    fn image_metadata(&self, _path: &Path) -> Option<ImageMetadata> {
        Some(ImageMetadata {
            photo_date: Some("2024:07:15 14:30:22".to_string()),
            camera: Some("Canon EOS R5".to_string()),
            ..ImageMetadata::default()
        })
    }

    fn sniff_mime(&self, path: &Path) -> Option<String> {
        FsInspector.sniff_mime(path)
    }

    fn text_preview(&self, path: &Path, extension: &str) -> String {
        FsInspector.text_preview(path, extension)
    }
}

struct FixedSuggestion(&'static str);

impl NameSuggester for FixedSuggestion {
    fn suggest_name(&self, _stem: &str, _ext: &str, _preview: &str) -> Result<String, SuggestError> {
        Ok(self.0.to_string())
    }
}

#[test]
fn test_organize_creates_every_category_folder() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("Downloads");
    fs::create_dir_all(&root).unwrap();

    let stats = organizer(&tmp.path().join("logs"))
        .organize_folder(&root, &SilentReporter)
        .unwrap();

    assert_eq!(stats.files_seen, 0);
    for category in Category::ALL {
        assert!(root.join(category.folder_name()).is_dir(), "{} missing", category);
    }
}

#[test]
fn test_organize_names_document_from_content() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("Desktop");
    fs::create_dir_all(&root).unwrap();
    fs::write(
        root.join("sample.txt"),
        "This is a sample document about machine learning algorithms.",
    )
    .unwrap();

    let mut org = organizer(&tmp.path().join("logs"));
    let stats = org.organize_folder(&root, &SilentReporter).unwrap();

    assert_eq!(stats.files_organized, 1);
    assert!(!root.join("sample.txt").exists());
    assert!(root
        .join("Organized_Documents")
        .join("this_sample_document.txt")
        .is_file());
}

#[test]
fn test_organize_never_overwrites_existing_file() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("Documents");
    let docs = root.join("Organized_Documents");
    fs::create_dir_all(&docs).unwrap();
    fs::write(docs.join("report.pdf"), "first").unwrap();
    fs::write(root.join("report.pdf"), "second").unwrap();

    let stats = organizer(&tmp.path().join("logs"))
        .organize_folder(&root, &SilentReporter)
        .unwrap();

    assert_eq!(stats.files_organized, 1);
    assert_eq!(fs::read_to_string(docs.join("report.pdf")).unwrap(), "first");
    assert_eq!(fs::read_to_string(docs.join("report_1.pdf")).unwrap(), "second");
}

#[test]
fn test_organize_skips_system_and_hidden_files() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("Desktop");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join(".DS_Store"), "").unwrap();
    fs::write(root.join(".hidden"), "").unwrap();
    fs::write(root.join("song.mp3"), "id3").unwrap();

    let stats = organizer(&tmp.path().join("logs"))
        .organize_folder(&root, &SilentReporter)
        .unwrap();

    assert_eq!(stats.files_seen, 3);
    assert_eq!(stats.files_skipped, 2);
    assert_eq!(stats.files_organized, 1);
    assert!(root.join(".DS_Store").exists());
    assert!(root.join("Organized_Audio").join("song.mp3").is_file());
}

#[test]
fn test_organize_respects_ignore_globs() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("Downloads");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("setup.part"), "partial").unwrap();

    let config = AppConfig {
        ignore_patterns: vec!["*.part".to_string()],
        ..test_config(&tmp.path().join("logs"), Vec::new())
    };
    let mut org =
        Organizer::new(config, ContentAnalyzer::disabled(DisableReason::TurnedOff)).unwrap();
    let stats = org.organize_folder(&root, &SilentReporter).unwrap();

    assert_eq!(stats.files_skipped, 1);
    assert!(root.join("setup.part").exists());
}

#[test]
fn test_organize_unknown_extension_goes_to_other() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("Downloads");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("mystery.xyz"), "??").unwrap();
    fs::write(root.join("Makefile"), "all:").unwrap();

    organizer(&tmp.path().join("logs"))
        .organize_folder(&root, &SilentReporter)
        .unwrap();

    let other = root.join("Organized_Other");
    assert!(other.join("mystery.xyz").is_file());
    assert!(other.join("Makefile").is_file());
}

#[test]
fn test_organize_leaves_subdirectories_alone() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("Documents");
    let project = root.join("project");
    fs::create_dir_all(&project).unwrap();
    fs::write(project.join("main.py"), "print('hi')").unwrap();

    let stats = organizer(&tmp.path().join("logs"))
        .organize_folder(&root, &SilentReporter)
        .unwrap();

    assert_eq!(stats.files_seen, 0);
    assert!(project.join("main.py").is_file());
}

#[test]
fn test_organize_photo_named_by_capture_date() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("Desktop");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("IMG_0001.JPG"), [0xFFu8, 0xD8, 0xFF]).unwrap();

    let mut org = organizer(&tmp.path().join("logs")).with_inspector(Box::new(FixedExif));
    org.organize_folder(&root, &SilentReporter).unwrap();

    assert!(root
        .join("Organized_Images")
        .join("photo_20240715_143022.JPG")
        .is_file());

    let entries = org.action_log().entries().unwrap();
    assert_eq!(entries[0].metadata["camera"], "Canon EOS R5");
}

#[test]
fn test_organize_uses_ai_suggestion_for_text() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("Desktop");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("scan001.txt"), "Q3 totals: revenue up, costs flat.").unwrap();
    fs::write(root.join("archive.zip"), "PK").unwrap();

    let mut org = Organizer::new(
        test_config(&tmp.path().join("logs"), Vec::new()),
        ContentAnalyzer::new(Box::new(FixedSuggestion("Quarterly Budget Review"))),
    )
    .unwrap();
    org.organize_folder(&root, &SilentReporter).unwrap();

    assert!(root
        .join("Organized_Documents")
        .join("Quarterly_Budget_Review.txt")
        .is_file());
    // No preview, so the analyzer is never consulted.
    assert!(root.join("Organized_Archives").join("archive.zip").is_file());
}

#[test]
fn test_organize_appends_action_log() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("Desktop");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("a.png"), "png").unwrap();
    fs::write(root.join("b.csv"), "x,y").unwrap();

    let mut org = organizer(&tmp.path().join("logs"));
    org.organize_folder(&root, &SilentReporter).unwrap();

    let log_path = tmp.path().join("logs").join("actions_log.jsonl");
    assert_eq!(org.action_log().path(), log_path.as_path());

    let entries = org.action_log().entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.action == ActionKind::Organize));
    assert_eq!(entries[0].original_name, "a.png");
    assert_eq!(entries[0].category, "Images");
    assert_eq!(entries[1].category, "Spreadsheets");
    assert!(entries[1].new_path.ends_with("b.csv"));
}

#[test]
fn test_organize_counts_move_when_action_log_is_unwritable() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("Desktop");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("b.csv"), "x,y").unwrap();

    let log_dir = tmp.path().join("logs");
    let mut org = organizer(&log_dir);
    // A directory where the log file should be makes every append fail.
    fs::create_dir_all(log_dir.join("actions_log.jsonl")).unwrap();

    let stats = org.organize_folder(&root, &SilentReporter).unwrap();

    assert_eq!(stats.files_organized, 1);
    assert_eq!(stats.files_failed, 0);
    assert!(root.join("Organized_Spreadsheets").join("b.csv").is_file());
    assert!(!root.join("b.csv").exists());
}

#[test]
fn test_run_organize_tolerates_missing_root() {
    let tmp = tempdir().unwrap();
    let present = tmp.path().join("Desktop");
    fs::create_dir_all(&present).unwrap();
    fs::write(present.join("clip.mp4"), "video").unwrap();

    let roots = vec![
        RootFolder::new("Missing", &tmp.path().join("nope").to_string_lossy()),
        RootFolder::new("Desktop", &present.to_string_lossy()),
    ];
    let mut org = organizer(&tmp.path().join("logs"));
    let total = org.run_organize(&roots, &SilentReporter);

    assert_eq!(total.files_organized, 1);
    assert!(!tmp.path().join("nope").exists());
    assert!(present.join("Organized_Video").join("clip.mp4").is_file());
}
