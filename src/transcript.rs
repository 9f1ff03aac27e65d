//! Transcription results returned by the remote recognizer.
//!
//! A [`Transcription`] is an ordered sequence of finalized segments. It is
//! produced once by the backend and never mutated afterwards; cached copies
//! are exact replays.

use std::time::Duration;

/// Timing span for a single recognized word.
#[derive(Debug, Clone, PartialEq)]
pub struct WordTiming {
    pub word: String,
    /// Offset of the word start from the beginning of the audio.
    pub start: Duration,
    /// Offset of the word end from the beginning of the audio.
    pub end: Duration,
}

/// A lower-ranked hypothesis for a segment.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptAlternative {
    pub text: String,
    pub confidence: f32,
}

/// One finalized utterance segment.
///
/// `text` and `confidence` are the backend's top hypothesis; `alternatives`
/// hold the rest in rank order.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub text: String,
    /// Confidence in [0, 1] for the top hypothesis.
    pub confidence: f32,
    pub words: Vec<WordTiming>,
    pub alternatives: Vec<TranscriptAlternative>,
}

impl TranscriptSegment {
    /// Creates a segment with no word timings or alternatives.
    pub fn new(text: &str, confidence: f32) -> Self {
        Self {
            text: text.to_string(),
            confidence,
            words: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    pub fn with_words(mut self, words: Vec<WordTiming>) -> Self {
        self.words = words;
        self
    }

    pub fn with_alternatives(mut self, alternatives: Vec<TranscriptAlternative>) -> Self {
        self.alternatives = alternatives;
        self
    }
}

/// Ordered transcription of one audio input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transcription {
    pub segments: Vec<TranscriptSegment>,
}

impl Transcription {
    pub fn new(segments: Vec<TranscriptSegment>) -> Self {
        Self { segments }
    }

    /// Single-segment transcription, the common case for short clips.
    pub fn single(text: &str, confidence: f32) -> Self {
        Self {
            segments: vec![TranscriptSegment::new(text, confidence)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Top-hypothesis texts of all segments joined with spaces.
    pub fn full_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Mean top-hypothesis confidence across segments.
    ///
    /// `None` for an empty transcription rather than a fabricated zero.
    pub fn mean_confidence(&self) -> Option<f32> {
        if self.segments.is_empty() {
            return None;
        }
        let sum: f32 = self.segments.iter().map(|s| s.confidence).sum();
        Some(sum / self.segments.len() as f32)
    }
}
