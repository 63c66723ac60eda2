use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::fstools::is_occupied;

/// Picks the output path for `input` inside `destination`.
///
/// `clip.mp4` becomes `clip.<extension>`. If that file already exists with
/// content, `clip_copy1`, `clip_copy2`, ... are tried in turn. An existing
/// empty file counts as free and gets overwritten, so leftovers from an
/// aborted run do not force a rename.
pub fn allocate(input: &Path, destination: &Path, extension: &str) -> PathBuf {
    let stem = input.file_stem().map(OsString::from).unwrap_or_else(|| OsString::from("output"));
    let mut candidate = candidate_path(destination, &stem, None, extension);
    let mut counter: u64 = 1;
    while is_occupied(&candidate) {
        candidate = candidate_path(destination, &stem, Some(counter), extension);
        counter += 1;
    }
    candidate
}

fn candidate_path(destination: &Path, stem: &OsString, copy: Option<u64>, extension: &str) -> PathBuf {
    let mut name = stem.clone();
    if let Some(n) = copy {
        name.push(format!("_copy{n}"));
    }
    name.push(".");
    name.push(extension);
    destination.join(name)
}
