use crate::classifier::Category;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;
use tracing::{debug, trace};

/// Create every `Organized_<Category>` folder under `root`. Existing folders are
/// left untouched.
pub fn ensure_organized_folders(root: &Path) -> io::Result<()> {
    for category in Category::ALL {
        let folder = root.join(category.folder_name());
        fs::create_dir_all(&folder)?;
        trace!("Created/verified folder: {}", folder.display());
    }
    Ok(())
}

/// Move a file without ever overwriting `to`. Falls back to copy + remove when a
/// plain rename is refused (e.g. across filesystems).
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if to.exists() {
        return Err(io::Error::new(
            ErrorKind::AlreadyExists,
            format!("destination already exists: {}", to.display()),
        ));
    }

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            if !from.is_file() {
                return Err(rename_err);
            }
            debug!(
                "Rename {} -> {} failed ({}), copying instead",
                from.display(),
                to.display(),
                rename_err
            );
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}
