//! services/audiobook/src/adapters/audio_cache.rs
//!
//! Filesystem implementation of the `AudioCache` port.

use async_trait::async_trait;
use audiobook_core::ports::{AudioCache, PortError, PortResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stores each clip as a file under `root`.
///
/// Writes go to a sibling `.part` file that is renamed into place, so a file
/// at the final path is always complete.
#[derive(Debug, Clone)]
pub struct FsAudioCache {
    root: PathBuf,
}

impl FsAudioCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl AudioCache for FsAudioCache {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn load(&self, path: &Path) -> PortResult<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                debug!(path = %path.display(), "Audio cache hit");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PortError::Unexpected(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    async fn store(&self, path: &Path, audio: &[u8]) -> PortResult<()> {
        let io_error =
            |e: std::io::Error| PortError::Unexpected(format!("failed to write {}: {e}", path.display()));

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        let mut partial = path.as_os_str().to_owned();
        partial.push(".part");
        let partial = PathBuf::from(partial);

        tokio::fs::write(&partial, audio).await.map_err(io_error)?;
        tokio::fs::rename(&partial, path).await.map_err(io_error)?;
        Ok(())
    }

    async fn discard(&self, dir: &Path) -> PortResult<()> {
        match tokio::fs::remove_dir_all(dir).await {
            Ok(()) => {
                debug!(dir = %dir.display(), "Discarded cached audio");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortError::Unexpected(format!(
                "failed to remove {}: {e}",
                dir.display()
            ))),
        }
    }
}
