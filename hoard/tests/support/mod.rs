//! Test support utilities for hoard behavioural tests.
//!
//! This module provides helpers shared by the behaviour test binaries:
//! UTF-8 temporary directories and artifact decoding.

use camino::{Utf8Path, Utf8PathBuf};
use hoard::codec::Codec;
use std::io::Read;
use tempfile::TempDir;

/// A temporary directory with a UTF-8 path, removed on drop.
pub struct Sandbox {
    _temp: TempDir,
    root: Utf8PathBuf,
}

impl Sandbox {
    /// Create an empty sandbox.
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf())
            .expect("temp dir path should be UTF-8");
        Self { _temp: temp, root }
    }

    /// Return the sandbox root.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: &[u8]) -> Utf8PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, content).expect("write file");
        path
    }
}

/// Decode the artifact at `path` with the codec implied by its name.
pub fn decode_artifact(path: &Utf8Path) -> Vec<u8> {
    let codec = path
        .file_name()
        .and_then(Codec::from_stored_name)
        .expect("artifact name has a codec extension");
    let file = std::fs::File::open(path).expect("open artifact");
    let mut decoded = Vec::new();
    codec
        .decoder(file)
        .expect("create decoder")
        .read_to_end(&mut decoded)
        .expect("decode artifact");
    decoded
}
