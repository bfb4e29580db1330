//! services/audiobook/src/bin/audiobook.rs

use async_openai::{config::OpenAIConfig, Client};
use audiobook_lib::{
    adapters::{tts::parse_model, FsAudioCache, InMemorySessionStore, OpenAiTtsAdapter},
    config::{Config, ConfigError},
    error::AppError,
    service::AudiobookService,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Narrate an EPUB: split it into speech-sized chunks and synthesize audio for them
#[derive(Parser, Debug)]
#[command(name = "audiobook", version, about)]
struct Cli {
    /// Path to the input EPUB file
    input: PathBuf,

    /// Voice to synthesize with. Defaults to TTS_VOICE.
    #[arg(short, long)]
    voice: Option<String>,

    /// Synthesize audio for every text chunk instead of only listing them
    #[arg(short, long, default_value_t = false)]
    pregenerate: bool,

    /// Write a JSON manifest of chunks and audio paths to this file
    #[arg(short, long)]
    manifest: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded.");

    // --- 2. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new().with_api_key(config.require_openai_api_key()?);
    let model = parse_model(&config.tts_model)
        .map_err(|e| ConfigError::InvalidValue("TTS_MODEL".to_string(), e.to_string()))?;
    let tts_adapter = Arc::new(OpenAiTtsAdapter::new(Client::with_config(openai_config), model));
    let session_store = Arc::new(InMemorySessionStore::new(
        config.session_ttl,
        config.session_capacity,
    ));
    let audio_cache = Arc::new(FsAudioCache::new(config.audio_cache_dir.clone()));

    let service = AudiobookService::new(&config, tts_adapter, session_store, audio_cache);

    // --- 3. Extract and Chunk the Book ---
    let voice = cli.voice.unwrap_or_else(|| config.tts_voice.clone());
    info!(path = %cli.input.display(), "Reading EPUB");
    let epub_bytes = tokio::fs::read(&cli.input).await?;
    let summary = service.upload(&epub_bytes, &voice).await?;

    println!("{} ({} chunks, voice {})", summary.title, summary.chunk_count, summary.voice);
    for chapter in &summary.chapters {
        println!("  - {}", chapter.title);
    }

    // --- 4. Synthesize ---
    // Audio lives under AUDIO_CACHE_DIR/<upload_id>/ and is left there as the
    // output of this run; a later run uploads again and starts a fresh directory.
    if cli.pregenerate {
        let mut report = service.pregenerate(summary.upload_id).await?;
        if !report.failed.is_empty() {
            // Finished chunks are cache hits now, so only the failures are resent.
            warn!(failed = ?report.failed, "Retrying chunks that failed to synthesize");
            let retry = service.pregenerate(summary.upload_id).await?;
            report.synthesized += retry.synthesized;
            report.failed = retry.failed;
        }
        println!(
            "Audio: {} synthesized, {} failed",
            report.synthesized,
            report.failed.len()
        );
        if !report.failed.is_empty() {
            warn!(failed = ?report.failed, "Some chunks still have no audio after a retry");
        }
    }

    // --- 5. Write the Manifest ---
    if let Some(path) = cli.manifest {
        let manifest = service.manifest(summary.upload_id).await?;
        tokio::fs::write(&path, serde_json::to_vec_pretty(&manifest)?).await?;
        info!(path = %path.display(), "Manifest written");
    }

    Ok(())
}
