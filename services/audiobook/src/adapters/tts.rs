//! services/audiobook/src/adapters/tts.rs
//!
//! This module contains the adapter for OpenAI's Text-to-Speech (TTS) service.
//! It implements the `TextToSpeechService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::audio::{CreateSpeechRequest, SpeechModel, SpeechResponseFormat, Voice},
    Client,
};
use async_trait::async_trait;
use audiobook_core::ports::{PortError, PortResult, TextToSpeechService};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `TextToSpeechService` port using the OpenAI TTS API.
///
/// The voice is chosen per request because every upload carries its own.
#[derive(Clone)]
pub struct OpenAiTtsAdapter {
    client: Client<OpenAIConfig>,
    model: SpeechModel,
}

impl OpenAiTtsAdapter {
    /// Creates a new `OpenAiTtsAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: SpeechModel) -> Self {
        Self { client, model }
    }

    /// Builds an MP3 speech request; cached clips are stored as `.mp3`.
    fn speech_request(&self, text: &str, voice: &str) -> PortResult<CreateSpeechRequest> {
        Ok(CreateSpeechRequest {
            model: self.model.clone(),
            input: text.to_string(),
            voice: parse_voice(voice)?,
            response_format: Some(SpeechResponseFormat::Mp3),
            ..Default::default()
        })
    }
}

/// Maps a configured model name onto the client's model type.
pub fn parse_model(name: &str) -> PortResult<SpeechModel> {
    match name.to_lowercase().as_str() {
        "tts-1" => Ok(SpeechModel::Tts1),
        "tts-1-hd" => Ok(SpeechModel::Tts1Hd),
        other => Err(PortError::InvalidInput(format!("unsupported TTS model '{other}'"))),
    }
}

/// Maps a voice name onto the client's voice type.
pub fn parse_voice(name: &str) -> PortResult<Voice> {
    match name.to_lowercase().as_str() {
        "alloy" => Ok(Voice::Alloy),
        "echo" => Ok(Voice::Echo),
        "fable" => Ok(Voice::Fable),
        "onyx" => Ok(Voice::Onyx),
        "nova" => Ok(Voice::Nova),
        "shimmer" => Ok(Voice::Shimmer),
        other => Err(PortError::InvalidInput(format!("unsupported TTS voice '{other}'"))),
    }
}

//=========================================================================================
// `TextToSpeechService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextToSpeechService for OpenAiTtsAdapter {
    /// Generates a vector of audio data (`Vec<u8>`) from the given text.
    async fn generate_audio(&self, text: &str, voice: &str) -> PortResult<Vec<u8>> {
        let request = self.speech_request(text, voice)?;
        debug!(chars = text.len(), voice, "Requesting speech synthesis");

        // Map the client error by hand; the orphan rule forbids a `From` impl here.
        let response = self
            .client
            .audio()
            .speech()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        Ok(response.bytes.to_vec())
    }
}
