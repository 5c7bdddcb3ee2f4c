use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix shared by every category folder created under a root.
pub const ORGANIZED_PREFIX: &str = "Organized_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Images,
    Documents,
    Spreadsheets,
    Presentations,
    Audio,
    Video,
    Archives,
    Code,
    Data,
    Other,
}

/// Lookup order for [`classify`]. The extension sets are disjoint, the order only
/// pins which category wins if they ever overlap.
const CATEGORY_TABLE: &[(Category, &[&str])] = &[
    (
        Category::Images,
        &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".svg", ".webp", ".ico"],
    ),
    (
        Category::Documents,
        &[".pdf", ".doc", ".docx", ".txt", ".rtf", ".odt", ".pages"],
    ),
    (
        Category::Spreadsheets,
        &[".xls", ".xlsx", ".csv", ".numbers", ".ods"],
    ),
    (Category::Presentations, &[".ppt", ".pptx", ".key", ".odp"]),
    (
        Category::Audio,
        &[".mp3", ".wav", ".aac", ".flac", ".ogg", ".m4a"],
    ),
    (
        Category::Video,
        &[".mp4", ".avi", ".mov", ".mkv", ".wmv", ".flv", ".webm", ".m4v"],
    ),
    (
        Category::Archives,
        &[".zip", ".rar", ".7z", ".tar", ".gz", ".dmg", ".pkg"],
    ),
    (
        Category::Code,
        &[
            ".py", ".js", ".html", ".css", ".java", ".cpp", ".c", ".php", ".rb", ".go", ".swift",
        ],
    ),
    (
        Category::Data,
        &[".json", ".xml", ".yaml", ".yml", ".sql", ".db", ".sqlite"],
    ),
];

impl Category {
    /// Every category, `Other` last. This is also the folder creation order.
    pub const ALL: [Category; 10] = [
        Category::Images,
        Category::Documents,
        Category::Spreadsheets,
        Category::Presentations,
        Category::Audio,
        Category::Video,
        Category::Archives,
        Category::Code,
        Category::Data,
        Category::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Images => "Images",
            Self::Documents => "Documents",
            Self::Spreadsheets => "Spreadsheets",
            Self::Presentations => "Presentations",
            Self::Audio => "Audio",
            Self::Video => "Video",
            Self::Archives => "Archives",
            Self::Code => "Code",
            Self::Data => "Data",
            Self::Other => "Other",
        }
    }

    pub fn from_label(label: &str) -> Option<Category> {
        Self::ALL.iter().copied().find(|c| c.label() == label)
    }

    /// Name of the organized folder holding this category, e.g. `Organized_Code`.
    pub fn folder_name(self) -> String {
        format!("{}{}", ORGANIZED_PREFIX, self.label())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a lowercased extension (with leading dot, possibly empty) to a MIME label
/// and a category. Never fails: unknown extensions land in `Other`.
pub fn classify(extension: &str, mime_hint: Option<&str>) -> (String, Category) {
    let mime = mime_hint.unwrap_or("Unknown").to_string();

    let category = CATEGORY_TABLE
        .iter()
        .find(|(_, extensions)| extensions.contains(&extension))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other);

    (mime, category)
}
