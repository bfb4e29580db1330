//! services/audiobook/src/service.rs
//!
//! The application service: turns an uploaded book into a session of chunks
//! and serves synthesized audio for those chunks, caching every clip.

use audiobook_core::{
    cache_path_for, chunk_book, read_book, upload_cache_dir, AudioCache, BookError, ChapterReference,
    Chunk, PortError, SessionStore, TextToSpeechService, UploadSession,
};
use futures::{stream, StreamExt};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::ServiceError;

//=========================================================================================
// Result Types
//=========================================================================================

/// What the caller learns about a freshly created upload session.
#[derive(Debug, Clone, Serialize)]
pub struct UploadSummary {
    pub upload_id: Uuid,
    pub title: String,
    pub cover: Option<String>,
    pub chapters: Vec<ChapterReference>,
    pub chunk_count: usize,
    pub voice: String,
}

/// Audio for one chunk and where it is cached.
#[derive(Debug, Clone)]
pub struct SynthesizedChunk {
    pub index: usize,
    pub path: PathBuf,
    pub audio: Vec<u8>,
    pub from_cache: bool,
}

/// Outcome of synthesizing every text chunk of a session.
#[derive(Debug, Default, Clone, Serialize)]
pub struct PregenerateReport {
    pub synthesized: usize,
    pub cached: usize,
    pub failed: Vec<usize>,
}

/// One line of the manifest: a chunk and, for text, its audio location.
#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    pub index: usize,
    pub chunk: Chunk,
    pub audio_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub upload_id: Uuid,
    pub title: String,
    pub cover: Option<String>,
    pub voice: String,
    pub entries: Vec<ManifestEntry>,
}

//=========================================================================================
// Service
//=========================================================================================

pub struct AudiobookService {
    tts: Arc<dyn TextToSpeechService>,
    sessions: Arc<dyn SessionStore>,
    cache: Arc<dyn AudioCache>,
    max_chunk_len: usize,
    synthesis_concurrency: usize,
}

impl AudiobookService {
    pub fn new(
        config: &Config,
        tts: Arc<dyn TextToSpeechService>,
        sessions: Arc<dyn SessionStore>,
        cache: Arc<dyn AudioCache>,
    ) -> Self {
        Self {
            tts,
            sessions,
            cache,
            max_chunk_len: config.max_chunk_len,
            synthesis_concurrency: config.synthesis_concurrency.max(1),
        }
    }

    /// Extracts and chunks the book, then opens a session for it.
    ///
    /// Parsing is CPU bound and runs on the blocking pool.
    pub async fn upload(&self, epub_bytes: &[u8], voice: &str) -> Result<UploadSummary, ServiceError> {
        let expired = self.sessions.evict_expired().await;
        self.discard_audio(&expired).await;

        let bytes = epub_bytes.to_vec();
        let max_chunk_len = self.max_chunk_len;
        let (title, cover, chapter_refs, chunks) = tokio::task::spawn_blocking(move || {
            let book = read_book(&bytes)?;
            let chapters = book.extract_all();
            let chunks = chunk_book(&chapters, max_chunk_len);
            let chapter_refs: Vec<ChapterReference> =
                chapters.into_iter().map(|chapter| chapter.reference).collect();
            let cover = book.cover.as_ref().map(|image| image.data_uri());
            Ok::<_, BookError>((book.title, cover, chapter_refs, chunks))
        })
        .await??;
        if chunks.is_empty() {
            return Err(BookError::NoContent.into());
        }

        let admission = self
            .sessions
            .insert(UploadSession::new(title, cover, chunks, voice.to_string()))
            .await
            .map_err(ServiceError::Store)?;
        self.discard_audio(&admission.evicted).await;
        let session = admission.session;

        info!(
            upload_id = %session.id,
            title = %session.title,
            chapters = chapter_refs.len(),
            chunks = session.chunks.len(),
            voice = %session.voice,
            "Upload session created"
        );

        Ok(UploadSummary {
            upload_id: session.id,
            title: session.title.clone(),
            cover: session.cover.clone(),
            chapters: chapter_refs,
            chunk_count: session.chunks.len(),
            voice: session.voice.clone(),
        })
    }

    /// All chunks of a session, in playback order.
    pub async fn chunks(&self, upload_id: Uuid) -> Result<Vec<Chunk>, ServiceError> {
        Ok(self.session(upload_id).await?.chunks.clone())
    }

    pub async fn chunk(&self, upload_id: Uuid, index: usize) -> Result<Chunk, ServiceError> {
        let session = self.session(upload_id).await?;
        chunk_at(&session, index).cloned()
    }

    /// Returns the audio for one text chunk, synthesizing it on a cache miss.
    ///
    /// Two concurrent calls for the same uncached chunk may both synthesize;
    /// the second write simply replaces the first.
    pub async fn synthesize_chunk(&self, upload_id: Uuid, index: usize) -> Result<SynthesizedChunk, ServiceError> {
        let session = self.session(upload_id).await?;
        let text = chunk_at(&session, index)?.as_text().ok_or_else(|| {
            ServiceError::InvalidRequest(format!("chunk {index} is an image and has no audio"))
        })?;
        let path = cache_path_for(self.cache.root(), upload_id, index, text, &session.voice);

        if let Some(audio) = self.cache.load(&path).await.map_err(ServiceError::Cache)? {
            return Ok(SynthesizedChunk {
                index,
                path,
                audio,
                from_cache: true,
            });
        }

        let audio = self
            .tts
            .generate_audio(text, &session.voice)
            .await
            .map_err(|source| {
                error!(upload_id = %upload_id, index, "Speech synthesis failed: {source}");
                ServiceError::Synthesis { index, source }
            })?;

        if let Err(e) = self.cache.store(&path, &audio).await {
            warn!(path = %path.display(), "Failed to cache synthesized audio: {e}");
        }

        Ok(SynthesizedChunk {
            index,
            path,
            audio,
            from_cache: false,
        })
    }

    /// Synthesizes every text chunk with bounded concurrency. A failing chunk
    /// is recorded in the report and does not stop the others.
    pub async fn pregenerate(&self, upload_id: Uuid) -> Result<PregenerateReport, ServiceError> {
        let session = self.session(upload_id).await?;
        let text_indices: Vec<usize> = session
            .chunks
            .iter()
            .enumerate()
            .filter(|(_, chunk)| chunk.as_text().is_some())
            .map(|(index, _)| index)
            .collect();

        info!(
            upload_id = %upload_id,
            chunks = text_indices.len(),
            concurrency = self.synthesis_concurrency,
            "Pre-generating audio"
        );

        let results: Vec<(usize, Result<SynthesizedChunk, ServiceError>)> = stream::iter(text_indices)
            .map(|index| async move { (index, self.synthesize_chunk(upload_id, index).await) })
            .buffer_unordered(self.synthesis_concurrency)
            .collect()
            .await;

        let mut report = PregenerateReport::default();
        for (index, result) in results {
            match result {
                Ok(chunk) if chunk.from_cache => report.cached += 1,
                Ok(_) => report.synthesized += 1,
                Err(e) => {
                    warn!(index, "Chunk left without audio: {e}");
                    report.failed.push(index);
                }
            }
        }
        report.failed.sort_unstable();

        info!(
            synthesized = report.synthesized,
            cached = report.cached,
            failed = report.failed.len(),
            "Pre-generation finished"
        );
        Ok(report)
    }

    /// Lists every chunk with the path its audio is (or would be) cached at.
    pub async fn manifest(&self, upload_id: Uuid) -> Result<Manifest, ServiceError> {
        let session = self.session(upload_id).await?;
        let entries = session
            .chunks
            .iter()
            .enumerate()
            .map(|(index, chunk)| ManifestEntry {
                index,
                chunk: chunk.clone(),
                audio_path: chunk
                    .as_text()
                    .map(|text| cache_path_for(self.cache.root(), upload_id, index, text, &session.voice)),
            })
            .collect();

        Ok(Manifest {
            upload_id,
            title: session.title.clone(),
            cover: session.cover.clone(),
            voice: session.voice.clone(),
            entries,
        })
    }

    /// Ends a session and deletes its cached audio.
    pub async fn close(&self, upload_id: Uuid) -> Result<(), ServiceError> {
        self.sessions.remove(upload_id).await.map_err(|e| match e {
            PortError::NotFound(_) => unknown_upload(upload_id),
            other => ServiceError::Store(other),
        })?;
        self.cache
            .discard(&upload_cache_dir(self.cache.root(), upload_id))
            .await
            .map_err(ServiceError::Cache)
    }

    /// Best effort: a directory that cannot be removed is logged and left behind.
    async fn discard_audio(&self, sessions: &[Arc<UploadSession>]) {
        for session in sessions {
            let dir = upload_cache_dir(self.cache.root(), session.id);
            if let Err(e) = self.cache.discard(&dir).await {
                warn!(upload_id = %session.id, "Failed to discard cached audio: {e}");
            }
        }
    }

    async fn session(&self, upload_id: Uuid) -> Result<Arc<UploadSession>, ServiceError> {
        self.sessions.get(upload_id).await.map_err(|e| match e {
            PortError::NotFound(_) => unknown_upload(upload_id),
            other => ServiceError::Store(other),
        })
    }
}

fn chunk_at(session: &UploadSession, index: usize) -> Result<&Chunk, ServiceError> {
    session.chunks.get(index).ok_or_else(|| {
        ServiceError::InvalidRequest(format!(
            "chunk index {index} is out of range (upload has {} chunks)",
            session.chunks.len()
        ))
    })
}

fn unknown_upload(upload_id: Uuid) -> ServiceError {
    ServiceError::InvalidRequest(format!("unknown upload id {upload_id}"))
}
