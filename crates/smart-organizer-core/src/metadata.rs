use chrono::{DateTime, Local};
use exif::{In, Reader, Tag, Value};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Image types EXIF extraction is attempted on.
pub const EXIF_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".tiff"];

/// Text-like types whose first characters are read as a content preview.
pub const PREVIEW_EXTENSIONS: &[&str] = &[
    ".txt", ".md", ".py", ".js", ".html", ".css", ".json", ".xml", ".csv",
];

pub const PREVIEW_CHARS: usize = 1000;

/// Only the leading pages of a PDF are extracted for the preview.
pub const PDF_PREVIEW_PAGES: usize = 3;

// Worst case for PREVIEW_CHARS of UTF-8.
const PREVIEW_READ_BYTES: u64 = (PREVIEW_CHARS * 4) as u64;

/// Filesystem view of one regular file, read fresh on every pass.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name: String,
    pub stem: String,
    /// Lowercased extension with leading dot, empty when there is none.
    pub extension: String,
    /// Extension as it appears on disk, reused when building the new filename.
    pub suffix: String,
    pub size: u64,
    pub created: Option<DateTime<Local>>,
    pub modified: Option<DateTime<Local>>,
}

impl FileEntry {
    pub fn read(path: &Path) -> io::Result<FileEntry> {
        let metadata = fs::metadata(path)?;

        let name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        let suffix = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        Ok(FileEntry {
            path: path.to_path_buf(),
            name,
            stem,
            extension: suffix.to_lowercase(),
            suffix,
            size: metadata.len(),
            created: metadata.created().ok().map(DateTime::<Local>::from),
            modified: metadata.modified().ok().map(DateTime::<Local>::from),
        })
    }
}

/// EXIF-derived fields for an image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageMetadata {
    pub photo_date: Option<String>,
    pub camera: Option<String>,
    pub exif: BTreeMap<String, String>,
}

/// Per-pass metadata for one file. Only persisted inside a log entry.
#[derive(Debug, Clone)]
pub struct Metadata {
    pub entry: FileEntry,
    pub photo_date: Option<String>,
    pub camera: Option<String>,
    pub exif: BTreeMap<String, String>,
}

impl Metadata {
    pub fn new(entry: FileEntry, image: Option<ImageMetadata>) -> Self {
        let image = image.unwrap_or_default();
        Self {
            entry,
            photo_date: image.photo_date,
            camera: image.camera,
            exif: image.exif,
        }
    }

    /// Every value stringified, for the action log.
    pub fn to_log_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("original_name".to_string(), self.entry.name.clone());
        map.insert("size".to_string(), self.entry.size.to_string());
        map.insert("extension".to_string(), self.entry.extension.clone());
        if let Some(created) = self.entry.created {
            map.insert("created".to_string(), created.to_rfc3339());
        }
        if let Some(modified) = self.entry.modified {
            map.insert("modified".to_string(), modified.to_rfc3339());
        }
        if let Some(date) = &self.photo_date {
            map.insert("photo_date".to_string(), date.clone());
        }
        if let Some(camera) = &self.camera {
            map.insert("camera".to_string(), camera.clone());
        }
        if !self.exif.is_empty() {
            let joined = self
                .exif
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; ");
            map.insert("exif".to_string(), joined);
        }
        map
    }
}

/// Best-effort metadata collaborators. None of these may fail a file: missing
/// data is `None` or an empty string.
pub trait FileInspector {
    fn image_metadata(&self, path: &Path) -> Option<ImageMetadata>;
    fn sniff_mime(&self, path: &Path) -> Option<String>;
    fn text_preview(&self, path: &Path, extension: &str) -> String;
}

/// Inspector backed by the real filesystem.
pub struct FsInspector;

impl FileInspector for FsInspector {
    fn image_metadata(&self, path: &Path) -> Option<ImageMetadata> {
        match read_exif(path) {
            Ok(meta) => Some(meta),
            Err(e) => {
                debug!("Could not extract EXIF from {}: {}", path.display(), e);
                None
            }
        }
    }

    fn sniff_mime(&self, path: &Path) -> Option<String> {
        mime_guess::from_path(path).first().map(|m| m.to_string())
    }

    fn text_preview(&self, path: &Path, extension: &str) -> String {
        let result = if extension == ".pdf" {
            read_pdf_preview(path)
        } else if PREVIEW_EXTENSIONS.contains(&extension) {
            read_preview(path).map_err(|e| e.to_string())
        } else {
            return String::new();
        };
        match result {
            Ok(text) => text,
            Err(e) => {
                debug!("Could not read content from {}: {}", path.display(), e);
                String::new()
            }
        }
    }
}

fn read_preview(path: &Path) -> io::Result<String> {
    let mut buffer = Vec::new();
    File::open(path)?
        .take(PREVIEW_READ_BYTES)
        .read_to_end(&mut buffer)?;
    Ok(decode_skipping_invalid(&buffer)
        .chars()
        .take(PREVIEW_CHARS)
        .collect())
}

/// Decode UTF-8, dropping invalid or truncated sequences instead of replacing
/// them, so words on either side of a bad byte join up.
fn decode_skipping_invalid(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

fn read_pdf_preview(path: &Path) -> Result<String, String> {
    let bytes = fs::read(path).map_err(|e| e.to_string())?;

    // pdf-extract can panic on malformed fonts.
    let pages = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(&bytes)
    }))
    .map_err(|_| "PDF extraction panicked".to_string())?
    .map_err(|e| e.to_string())?;

    Ok(pages
        .iter()
        .take(PDF_PREVIEW_PAGES)
        .flat_map(|page| page.chars())
        .take(PREVIEW_CHARS)
        .collect())
}

fn read_exif(path: &Path) -> Result<ImageMetadata, exif::Error> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let exif = Reader::new().read_from_container(&mut reader)?;

    let fields: BTreeMap<String, String> = exif
        .fields()
        .filter(|f| f.ifd_num == In::PRIMARY)
        .map(|f| (f.tag.to_string(), f.display_value().to_string()))
        .collect();

    let camera = match (ascii_field(&exif, Tag::Make), ascii_field(&exif, Tag::Model)) {
        (Some(make), Some(model)) => Some(format!("{} {}", make, model)),
        _ => None,
    };

    Ok(ImageMetadata {
        // Raw ASCII keeps the `YYYY:MM:DD HH:MM:SS` form the namer expects.
        photo_date: ascii_field(&exif, Tag::DateTime),
        camera,
        exif: fields,
    })
}

fn ascii_field(exif: &exif::Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Ascii(values) => values
            .first()
            .map(|v| String::from_utf8_lossy(v).trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_entry_keeps_suffix_case() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Holiday.JPG");
        fs::write(&path, b"\xff\xd8\xff\xe0").unwrap();

        let entry = FileEntry::read(&path).unwrap();
        assert_eq!(entry.name, "Holiday.JPG");
        assert_eq!(entry.stem, "Holiday");
        assert_eq!(entry.extension, ".jpg");
        assert_eq!(entry.suffix, ".JPG");
        assert_eq!(entry.size, 4);
        assert!(entry.modified.is_some());
    }

    #[test]
    fn test_file_entry_without_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("README");
        fs::write(&path, "hello").unwrap();

        let entry = FileEntry::read(&path).unwrap();
        assert_eq!(entry.extension, "");
        assert_eq!(entry.suffix, "");
        assert_eq!(entry.stem, "README");
    }

    #[test]
    fn test_preview_is_bounded_and_allow_listed() {
        let dir = tempdir().unwrap();
        let long = dir.path().join("long.txt");
        fs::write(&long, "x".repeat(5000)).unwrap();
        let binary = dir.path().join("blob.bin");
        fs::write(&binary, "not read").unwrap();

        let inspector = FsInspector;
        assert_eq!(inspector.text_preview(&long, ".txt").chars().count(), PREVIEW_CHARS);
        assert_eq!(inspector.text_preview(&binary, ".bin"), "");
        assert_eq!(
            inspector.text_preview(&dir.path().join("missing.txt"), ".txt"),
            ""
        );
    }

    #[test]
    fn test_preview_drops_invalid_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"Quarterly\xffbudget \xc3review").unwrap();

        let preview = FsInspector.text_preview(&path, ".txt");
        assert_eq!(preview, "Quarterlybudget review");
        assert!(!preview.contains('\u{FFFD}'));
    }

    #[test]
    fn test_pdf_preview_extracts_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        fs::write(&path, minimal_pdf("Quarterly budget review")).unwrap();

        let preview = FsInspector.text_preview(&path, ".pdf");
        assert!(preview.contains("budget"), "got {:?}", preview);
    }

    #[test]
    fn test_corrupt_pdf_preview_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"%PDF-1.4 not really a pdf").unwrap();
        assert_eq!(FsInspector.text_preview(&path, ".pdf"), "");
    }

    /// One page, one Helvetica line, with a correct xref table.
    fn minimal_pdf(text: &str) -> Vec<u8> {
        let stream = format!("BT /F1 12 Tf 72 712 Td ({}) Tj ET", text);
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
                .to_string(),
            format!("<< /Length {} >>\nstream\n{}\nendstream", stream.len(), stream),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        ];

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }
        let xref = pdf.len();
        let header = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        pdf.extend_from_slice(header.as_bytes());
        for offset in offsets {
            pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref
            )
            .as_bytes(),
        );
        pdf
    }

    #[test]
    fn test_truncated_jpeg_has_no_exif() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        fs::write(&path, b"\xff\xd8\xff\xe0").unwrap();
        assert_eq!(FsInspector.image_metadata(&path), None);
    }

    #[test]
    fn test_sniff_mime_by_extension() {
        let inspector = FsInspector;
        assert_eq!(
            inspector.sniff_mime(Path::new("a/report.pdf")).as_deref(),
            Some("application/pdf")
        );
        assert_eq!(inspector.sniff_mime(Path::new("a/blob.zzzunknown")), None);
    }

    #[test]
    fn test_log_map_stringifies_everything() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        fs::write(&path, b"abc").unwrap();
        let entry = FileEntry::read(&path).unwrap();
        let image = ImageMetadata {
            photo_date: Some("2024:07:15 14:30:22".to_string()),
            camera: Some("Canon EOS".to_string()),
            exif: BTreeMap::from([("Make".to_string(), "Canon".to_string())]),
        };
        let map = Metadata::new(entry, Some(image)).to_log_map();
        assert_eq!(map["size"], "3");
        assert_eq!(map["photo_date"], "2024:07:15 14:30:22");
        assert_eq!(map["camera"], "Canon EOS");
        assert_eq!(map["exif"], "Make=Canon");
    }
}
