//! voxbridge - Resilient orchestration for a remote speech backend
//!
//! Turns unreliable, latency-variable calls to a remote speech-recognition
//! and speech-synthesis service into a dependable pipeline: streaming
//! transcription, retry with exponential backoff, response caching, and
//! batch execution with per-item failure isolation. Transport, codecs and
//! authentication live behind the backend traits and are not this crate's
//! concern.

// Enforce error handling discipline in non-test code
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod backend;
pub mod batch;
pub mod cache;
pub mod config;
pub mod defaults;
pub mod error;
pub mod pipeline;
pub mod retry;
pub mod streaming;
pub mod synthesis;
pub mod transcript;

// Backend seams (transcribe / synthesize / stream)
pub use backend::{MockRecognizer, MockSynthesizer, SpeechRecognizer, SpeechSynthesizer};
pub use streaming::{
    MockStreamingRecognizer, RecognizerStream, SessionState, StreamConfig, StreamEvent,
    StreamingRecognizer, StreamingSession,
};

// Pipeline
pub use pipeline::{
    IdentityTransform, PipelineOptions, ProcessedAudio, SpeechPipeline, TextTransform,
};

// Batch execution
pub use batch::{
    BatchItemFailure, BatchItemResult, BatchRunner, BatchSummary, ExportRow, ExportStatus,
    export_rows,
};

// Resilience primitives
pub use cache::{CacheKey, ResponseCache};
pub use retry::RetryPolicy;

// Data model
pub use audio::{AudioData, AudioDescriptor, AudioEncoding};
pub use synthesis::{
    Prosody, SynthesisInput, SynthesisRequest, SynthesizedAudio, VoiceGender, VoiceSelection,
};
pub use transcript::{Transcription, TranscriptAlternative, TranscriptSegment, WordTiming};

// Error handling
pub use error::{PipelineStage, Result, VoxbridgeError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.2+abc1234"` when git hash is available, `"0.1.2"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }
}
