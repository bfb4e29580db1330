//! Mock speech adapter for tests.
//!
//! - `MockTtsAdapter::working()` - returns deterministic fake audio
//! - `MockTtsAdapter::failing_on(..)` - fails for any text containing a marker

use async_trait::async_trait;
use audiobook_core::ports::{PortError, PortResult, TextToSpeechService};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct MockTtsAdapter {
    calls: Arc<AtomicUsize>,
    fail_marker: Option<String>,
}

impl MockTtsAdapter {
    pub fn working() -> Self {
        Self::default()
    }

    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Self::default()
        }
    }

    /// Number of synthesis requests received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fake_audio(text: &str, voice: &str) -> Vec<u8> {
        format!("{voice}:{text}").into_bytes()
    }
}

#[async_trait]
impl TextToSpeechService for MockTtsAdapter {
    async fn generate_audio(&self, text: &str, voice: &str) -> PortResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_marker {
            Some(marker) if text.contains(marker.as_str()) => {
                Err(PortError::Unexpected("simulated synthesis failure".to_string()))
            }
            _ => Ok(Self::fake_audio(text, voice)),
        }
    }
}
