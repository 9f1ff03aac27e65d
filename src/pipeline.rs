//! Transcribe → transform → synthesize pipeline.
//!
//! [`SpeechPipeline`] is the unit of work shared by single-shot calls and
//! batch runs: transcribe the audio, pass the top transcript through an
//! injected text transform, synthesize the transformed text. Backend calls
//! are wrapped by the pipeline's retry policy and memoized in injected
//! caches. The pipeline fails fast; batch callers isolate the failure per
//! item.

use crate::audio::{AudioData, AudioDescriptor, AudioEncoding};
use crate::backend::{SpeechRecognizer, SpeechSynthesizer};
use crate::cache::{CacheKey, ResponseCache};
use crate::defaults;
use crate::error::{PipelineStage, Result, VoxbridgeError};
use crate::retry::RetryPolicy;
use crate::synthesis::{Prosody, SynthesisInput, SynthesisRequest, SynthesizedAudio, VoiceSelection};
use crate::transcript::Transcription;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cache operation names; also the scopes for targeted invalidation.
const TRANSCRIBE_OP: &str = "transcribe";
const SYNTHESIZE_OP: &str = "synthesize";

/// Text transform applied between transcription and synthesis.
///
/// Identity by default; a bot-style flow plugs its response generation in
/// here. Failures propagate like backend failures, tagged with the
/// transform stage.
#[async_trait]
pub trait TextTransform: Send + Sync {
    async fn transform(&self, text: &str) -> Result<String>;
}

/// Passes the transcript through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransform;

#[async_trait]
impl TextTransform for IdentityTransform {
    async fn transform(&self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }
}

/// Implement TextTransform for Arc<T> to allow sharing across pipelines.
#[async_trait]
impl<T: TextTransform> TextTransform for Arc<T> {
    async fn transform(&self, text: &str) -> Result<String> {
        (**self).transform(text).await
    }
}

/// Per-pipeline knobs: output voice, caching behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub voice: VoiceSelection,
    pub prosody: Prosody,
    pub output_encoding: AudioEncoding,
    pub cache_ttl: Duration,
    /// Force fresh backend calls; results are still stored.
    pub skip_cache: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            voice: VoiceSelection::default(),
            prosody: Prosody::default(),
            output_encoding: AudioEncoding::Linear16,
            cache_ttl: defaults::CACHE_TTL,
            skip_cache: false,
        }
    }
}

impl PipelineOptions {
    pub fn with_voice(mut self, voice: VoiceSelection) -> Self {
        self.voice = voice;
        self
    }

    pub fn with_prosody(mut self, prosody: Prosody) -> Self {
        self.prosody = prosody;
        self
    }

    pub fn with_output_encoding(mut self, encoding: AudioEncoding) -> Self {
        self.output_encoding = encoding;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_skip_cache(mut self, skip: bool) -> Self {
        self.skip_cache = skip;
        self
    }
}

/// Outcome of one pipeline run over one audio input.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedAudio {
    /// What went in, minus the payload.
    pub source: AudioDescriptor,
    /// Top transcript of the source audio.
    pub transcript: String,
    /// Confidence of the transcript, in [0, 1].
    pub confidence: f32,
    /// Transcript after the injected transform.
    pub processed_text: String,
    /// Synthesized rendering of the processed text.
    pub audio: SynthesizedAudio,
    /// Wall-clock time for the whole pipeline run.
    pub elapsed: Duration,
}

/// Composable transcribe/transform/synthesize unit.
pub struct SpeechPipeline {
    recognizer: Arc<dyn SpeechRecognizer>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    transform: Arc<dyn TextTransform>,
    retry: RetryPolicy,
    options: PipelineOptions,
    transcriptions: Arc<ResponseCache<Transcription>>,
    syntheses: Arc<ResponseCache<SynthesizedAudio>>,
}

impl SpeechPipeline {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        let options = PipelineOptions::default();
        Self {
            recognizer,
            synthesizer,
            transform: Arc::new(IdentityTransform),
            retry: RetryPolicy::default(),
            transcriptions: Arc::new(ResponseCache::new(options.cache_ttl)),
            syntheses: Arc::new(ResponseCache::new(options.cache_ttl)),
            options,
        }
    }

    pub fn with_transform(mut self, transform: Arc<dyn TextTransform>) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Injects shared caches so several pipelines memoize together.
    pub fn with_caches(
        mut self,
        transcriptions: Arc<ResponseCache<Transcription>>,
        syntheses: Arc<ResponseCache<SynthesizedAudio>>,
    ) -> Self {
        self.transcriptions = transcriptions;
        self.syntheses = syntheses;
        self
    }

    pub fn transcription_cache(&self) -> &Arc<ResponseCache<Transcription>> {
        &self.transcriptions
    }

    pub fn synthesis_cache(&self) -> &Arc<ResponseCache<SynthesizedAudio>> {
        &self.syntheses
    }

    /// Transcribes with retry and caching.
    ///
    /// The cache key covers the audio payload, encoding, rate, channels and
    /// language; an empty transcription is rejected before it can be
    /// cached.
    pub async fn transcribe(&self, audio: &AudioData) -> Result<Transcription> {
        let key = CacheKey::new(TRANSCRIBE_OP, &audio.digest_input());
        self.transcriptions
            .get_or_execute_with(&key, self.options.cache_ttl, self.options.skip_cache, || {
                async move {
                    let transcription = self
                        .retry
                        .execute_transient(|| async move {
                            self.recognizer.transcribe(audio).await
                        })
                        .await?;
                    if transcription.is_empty() {
                        return Err(VoxbridgeError::EmptyResult {
                            operation: TRANSCRIBE_OP.to_string(),
                        });
                    }
                    Ok(transcription)
                }
            })
            .await
    }

    /// Synthesizes with validation, retry and caching.
    pub async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesizedAudio> {
        request.validate()?;
        let key = CacheKey::new(SYNTHESIZE_OP, &request.digest_input());
        self.syntheses
            .get_or_execute_with(&key, self.options.cache_ttl, self.options.skip_cache, || {
                async move {
                    let audio = self
                        .retry
                        .execute_transient(|| async move {
                            self.synthesizer.synthesize(request).await
                        })
                        .await?;
                    if audio.is_empty() {
                        return Err(VoxbridgeError::EmptyResult {
                            operation: SYNTHESIZE_OP.to_string(),
                        });
                    }
                    Ok(audio)
                }
            })
            .await
    }

    /// Runs the full pipeline over one audio input.
    ///
    /// Fails fast: the first failing stage aborts the item, tagged with
    /// the stage for batch reporting.
    pub async fn process(&self, audio: &AudioData) -> Result<ProcessedAudio> {
        let started = Instant::now();

        let transcription = self
            .transcribe(audio)
            .await
            .map_err(|e| e.at_stage(PipelineStage::Transcription))?;
        let transcript = transcription.full_text();
        let confidence = transcription.mean_confidence().unwrap_or(0.0);

        let processed_text = self
            .transform
            .transform(&transcript)
            .await
            .map_err(|e| e.at_stage(PipelineStage::Transform))?;

        let request = SynthesisRequest {
            input: SynthesisInput::Text(processed_text.clone()),
            voice: self.options.voice.clone(),
            prosody: self.options.prosody.clone(),
            encoding: self.options.output_encoding,
        };
        let output = self
            .synthesize(&request)
            .await
            .map_err(|e| e.at_stage(PipelineStage::Synthesis))?;

        let elapsed = started.elapsed();
        tracing::debug!(
            transcript_chars = transcript.len(),
            output_bytes = output.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "pipeline run complete"
        );

        Ok(ProcessedAudio {
            source: audio.descriptor(),
            transcript,
            confidence,
            processed_text,
            audio: output,
            elapsed,
        })
    }
}
