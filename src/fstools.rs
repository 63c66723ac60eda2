use std::fs;
use std::io;
use std::path::Path;

use log::{debug, warn};

#[derive(Debug, PartialEq, Eq)]
pub enum DirEntryCategory {
    DoesNotExist,
    RegularFile,
    Directory,
    Unknown,
}

/// Classifies `path`, following symlinks.
pub fn classify_file(path: &Path) -> DirEntryCategory {
    match fs::metadata(path) {
        Ok(metadata) => {
            if metadata.is_file() {
                DirEntryCategory::RegularFile
            } else if metadata.is_dir() {
                DirEntryCategory::Directory
            } else {
                DirEntryCategory::Unknown
            }
        },
        Err(_) => DirEntryCategory::DoesNotExist,
    }
}

/// True when something with content already sits at `path`.
pub fn is_occupied(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(metadata) => metadata.len() > 0,
        Err(_) => false,
    }
}

pub fn file_size(path: &Path) -> Option<u64> {
    fs::metadata(path).ok().map(|m| m.len())
}

/// Best-effort delete; a missing file is not an error and failures are only logged.
pub fn remove_artifact(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("removed {:?}", path),
        Err(err) if err.kind() == io::ErrorKind::NotFound => (),
        Err(err) => warn!("unable to remove {:?}: {}", path, err),
    }
}
