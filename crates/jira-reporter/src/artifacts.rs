//! Report artifacts attached to every filed issue.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// A file read once per run and uploaded to each created issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Load every path that exists. Missing files are skipped silently,
/// unreadable ones with a warning; neither stops the run.
pub fn load_artifacts(paths: &[PathBuf]) -> Vec<Artifact> {
    paths.iter().filter_map(|p| load_one(p)).collect()
}

fn load_one(path: &Path) -> Option<Artifact> {
    let filename = path.file_name()?.to_string_lossy().into_owned();
    match std::fs::read(path) {
        Ok(bytes) => {
            debug!(path = %path.display(), size = bytes.len(), "Loaded artifact");
            Some(Artifact { filename, bytes })
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "Artifact not present, skipping");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read artifact, skipping");
            None
        }
    }
}
