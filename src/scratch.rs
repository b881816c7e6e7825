//! Per-invocation scratch storage for downloaded images.
//!
//! Each invocation gets its own uniquely named temp file, removed when the
//! handle drops, on success and failure paths alike. Concurrent invocations
//! sharing an execution environment never collide on a path.

use std::io;
use std::path::Path;

use tempfile::NamedTempFile;

/// A uniquely named scratch file, deleted on drop.
pub struct ScratchFile {
    file: NamedTempFile,
}

impl ScratchFile {
    /// Acquire a fresh scratch file.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            file: NamedTempFile::new()?,
        })
    }

    /// Path to write the download to.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Read the full scratch contents.
    pub async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.path()).await
    }
}
