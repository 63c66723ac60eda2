use std::env;
use std::path::{Path, PathBuf};

use log::debug;

pub const ENCODER_NAME: &str = "ffmpeg";
pub const PROBE_NAME: &str = "ffprobe";

/// Locations of the external encoder and probe binaries.
///
/// Resolved once at startup and handed to the probe and the job controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolPaths {
    pub encoder: PathBuf,
    pub probe: PathBuf,
}

impl ToolPaths {
    pub fn new(encoder: impl Into<PathBuf>, probe: impl Into<PathBuf>) -> Self {
        ToolPaths {
            encoder: encoder.into(),
            probe: probe.into(),
        }
    }

    /// Prefers binaries bundled next to the running executable, then `PATH`.
    pub fn discover() -> Self {
        let bundle_dir = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        let paths = ToolPaths {
            encoder: locate(ENCODER_NAME, bundle_dir.as_deref()),
            probe: locate(PROBE_NAME, bundle_dir.as_deref()),
        };
        debug!("encoder={:?} probe={:?}", paths.encoder, paths.probe);
        paths
    }

    pub fn with_encoder(mut self, encoder: PathBuf) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_probe(mut self, probe: PathBuf) -> Self {
        self.probe = probe;
        self
    }
}

fn locate(name: &str, bundle_dir: Option<&Path>) -> PathBuf {
    if let Some(found) = bundle_dir.and_then(|dir| bundled(name, dir)) {
        return found;
    }
    which::which(name).unwrap_or_else(|_| PathBuf::from(name))
}

fn bundled(name: &str, dir: &Path) -> Option<PathBuf> {
    let file_name = format!("{name}{}", env::consts::EXE_SUFFIX);
    [dir.join("usr").join("bin").join(&file_name), dir.join(&file_name)]
        .into_iter()
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_bundled_prefers_usr_bin() {
        let dir = tempfile::tempdir().unwrap();
        let usr_bin = dir.path().join("usr").join("bin");
        fs::create_dir_all(&usr_bin).unwrap();
        let name = format!("ffmpeg{}", env::consts::EXE_SUFFIX);
        fs::write(usr_bin.join(&name), b"").unwrap();
        fs::write(dir.path().join(&name), b"").unwrap();
        assert_eq!(locate("ffmpeg", Some(dir.path())), usr_bin.join(&name));
    }

    #[test]
    fn test_bundled_beside_executable() {
        let dir = tempfile::tempdir().unwrap();
        let name = format!("ffprobe{}", env::consts::EXE_SUFFIX);
        fs::write(dir.path().join(&name), b"").unwrap();
        assert_eq!(bundled("ffprobe", dir.path()), Some(dir.path().join(&name)));
    }

    #[test]
    fn test_falls_back_to_bare_name() {
        let dir = tempfile::tempdir().unwrap();
        let found = locate("movconv-no-such-tool", Some(dir.path()));
        assert_eq!(found, PathBuf::from("movconv-no-such-tool"));
    }
}
