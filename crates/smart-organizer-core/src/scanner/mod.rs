mod walk;

pub use walk::{list_files, list_organized_files, list_organized_folders, IgnorePolicy, OrganizedFolder, SYSTEM_FILES};
