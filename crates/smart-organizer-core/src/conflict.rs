use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Numbered suffixes tried before falling back to a hash suffix.
pub const MAX_SUFFIX: u32 = 10_000;

const HASH_SUFFIX_LEN: usize = 12;

/// Find the first free path for `base + extension` inside `dest_folder`.
///
/// Tries `base.ext`, then `base_1.ext`, `base_2.ext`, ... A candidate equal to
/// `current` (the file's own path) counts as free, so a file never conflicts
/// with itself.
pub fn resolve_path<F>(
    dest_folder: &Path,
    base: &str,
    extension: &str,
    exists: F,
    current: Option<&Path>,
) -> PathBuf
where
    F: Fn(&Path) -> bool,
{
    resolve_with_limit(dest_folder, base, extension, exists, current, MAX_SUFFIX)
}

fn resolve_with_limit<F>(
    dest_folder: &Path,
    base: &str,
    extension: &str,
    exists: F,
    current: Option<&Path>,
    limit: u32,
) -> PathBuf
where
    F: Fn(&Path) -> bool,
{
    let available = |candidate: &Path| current == Some(candidate) || !exists(candidate);

    let candidate = dest_folder.join(format!("{}{}", base, extension));
    if available(&candidate) {
        return candidate;
    }

    for n in 1..=limit {
        let candidate = dest_folder.join(format!("{}_{}{}", base, n, extension));
        if available(&candidate) {
            return candidate;
        }
    }

    warn!(
        "{} numbered names for '{}{}' are taken in {}, using a hash suffix",
        limit,
        base,
        extension,
        dest_folder.display()
    );

    let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let mut nonce: u64 = 0;
    loop {
        let mut hasher = blake3::Hasher::new();
        hasher.update(base.as_bytes());
        hasher.update(extension.as_bytes());
        hasher.update(&stamp.to_le_bytes());
        hasher.update(&nonce.to_le_bytes());
        let digest = hasher.finalize().to_hex();
        let candidate = dest_folder.join(format!(
            "{}_{}{}",
            base,
            &digest.as_str()[..HASH_SUFFIX_LEN],
            extension
        ));
        if available(&candidate) {
            return candidate;
        }
        nonce += 1;
    }
}
