//! Backend seams for the remote speech service.
//!
//! The pipeline never talks to a vendor SDK directly; it goes through these
//! traits. A transport binding implements them, tests use the mocks.

use crate::audio::AudioData;
use crate::error::{Result, VoxbridgeError};
use crate::synthesis::{SynthesisRequest, SynthesizedAudio};
use crate::transcript::Transcription;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Trait for one-shot speech-to-text against the remote backend.
///
/// The language tag rides on the [`AudioData`] itself.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe encoded audio to text with confidence metadata.
    async fn transcribe(&self, audio: &AudioData) -> Result<Transcription>;
}

/// Trait for text-to-speech against the remote backend.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize the request into encoded audio bytes.
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesizedAudio>;
}

/// Implement SpeechRecognizer for Arc<T> to allow sharing across pipelines.
#[async_trait]
impl<T: SpeechRecognizer> SpeechRecognizer for Arc<T> {
    async fn transcribe(&self, audio: &AudioData) -> Result<Transcription> {
        (**self).transcribe(audio).await
    }
}

/// Implement SpeechSynthesizer for Arc<T> to allow sharing across pipelines.
#[async_trait]
impl<T: SpeechSynthesizer> SpeechSynthesizer for Arc<T> {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesizedAudio> {
        (**self).synthesize(request).await
    }
}

/// Mock recognizer for testing.
///
/// Returns a fixed transcription, optionally failing a configured number of
/// times first so retry behavior can be exercised.
pub struct MockRecognizer {
    transcription: Transcription,
    fail_first: AtomicUsize,
    fail_permanently: bool,
    calls: AtomicUsize,
}

impl MockRecognizer {
    /// Mock that always succeeds with a single-segment transcription.
    pub fn new(text: &str, confidence: f32) -> Self {
        Self {
            transcription: Transcription::single(text, confidence),
            fail_first: AtomicUsize::new(0),
            fail_permanently: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Mock that returns the given transcription verbatim.
    pub fn with_transcription(transcription: Transcription) -> Self {
        Self {
            transcription,
            fail_first: AtomicUsize::new(0),
            fail_permanently: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail the first `n` calls with a transient error, then succeed.
    pub fn failing_transiently(mut self, n: usize) -> Self {
        self.fail_first = AtomicUsize::new(n);
        self.fail_permanently = false;
        self
    }

    /// Fail every call with a permanent error.
    pub fn failing_permanently(mut self) -> Self {
        self.fail_first = AtomicUsize::new(usize::MAX);
        self.fail_permanently = true;
        self
    }

    /// How many times `transcribe` has been invoked.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechRecognizer for MockRecognizer {
    async fn transcribe(&self, _audio: &AudioData) -> Result<Transcription> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let remaining = self.fail_first.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != usize::MAX {
                self.fail_first.fetch_sub(1, Ordering::SeqCst);
            }
            return if self.fail_permanently {
                Err(VoxbridgeError::PermanentBackend {
                    message: "mock permanent recognizer failure".to_string(),
                })
            } else {
                Err(VoxbridgeError::TransientBackend {
                    message: "mock transient recognizer failure".to_string(),
                })
            };
        }

        Ok(self.transcription.clone())
    }
}

/// Mock synthesizer for testing.
pub struct MockSynthesizer {
    bytes: Vec<u8>,
    fail_first: AtomicUsize,
    fail_permanently: bool,
    calls: AtomicUsize,
}

impl MockSynthesizer {
    /// Mock that always succeeds with the given audio payload.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            fail_first: AtomicUsize::new(0),
            fail_permanently: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail the first `n` calls with a transient error, then succeed.
    pub fn failing_transiently(mut self, n: usize) -> Self {
        self.fail_first = AtomicUsize::new(n);
        self.fail_permanently = false;
        self
    }

    /// Fail every call with a permanent error.
    pub fn failing_permanently(mut self) -> Self {
        self.fail_first = AtomicUsize::new(usize::MAX);
        self.fail_permanently = true;
        self
    }

    /// How many times `synthesize` has been invoked.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesizedAudio> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let remaining = self.fail_first.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != usize::MAX {
                self.fail_first.fetch_sub(1, Ordering::SeqCst);
            }
            return if self.fail_permanently {
                Err(VoxbridgeError::PermanentBackend {
                    message: "mock permanent synthesizer failure".to_string(),
                })
            } else {
                Err(VoxbridgeError::TransientBackend {
                    message: "mock transient synthesizer failure".to_string(),
                })
            };
        }

        Ok(SynthesizedAudio::new(self.bytes.clone(), request.encoding))
    }
}
