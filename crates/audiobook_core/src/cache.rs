//! Derivation of the on-disk location for a chunk's synthesized audio.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Extension of every cached audio file.
pub const AUDIO_EXTENSION: &str = "mp3";

/// Returns `root/<upload_id>/<index>_<digest>.mp3`, where `digest` is the
/// SHA-256 of the voice and the chunk text.
///
/// The path is a pure function of its inputs; a file existing there is the
/// only cache-hit signal.
pub fn cache_path_for(root: &Path, upload_id: Uuid, index: usize, text: &str, voice: &str) -> PathBuf {
    upload_cache_dir(root, upload_id)
        .join(format!("{index:05}_{}.{AUDIO_EXTENSION}", content_digest(text, voice)))
}

/// Directory holding every clip of one upload session.
pub fn upload_cache_dir(root: &Path, upload_id: Uuid) -> PathBuf {
    root.join(upload_id.to_string())
}

fn content_digest(text: &str, voice: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(voice.as_bytes());
    // Separator keeps ("ab", "c") and ("a", "bc") apart.
    hasher.update([0u8]);
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
