use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Writes an executable `/bin/sh` script standing in for ffmpeg or ffprobe.
pub fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// A probe that knows only the duration.
pub fn duration_probe(dir: &Path, seconds: &str) -> PathBuf {
    fake_tool(dir, "ffprobe", &format!(r#"
case "$*" in
  *format=duration*) echo "{seconds}" ;;
  *) exit 1 ;;
esac"#))
}
