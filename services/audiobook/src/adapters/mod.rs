pub mod audio_cache;
#[cfg(test)]
pub mod mock;
pub mod session_store;
pub mod tts;

pub use audio_cache::FsAudioCache;
pub use session_store::InMemorySessionStore;
pub use tts::OpenAiTtsAdapter;
