//! Streaming session state machine over a duplex recognizer transport.
//!
//! The transport is a pair of channels obtained from a
//! [`StreamingRecognizer`]: audio chunks go down, transcript events come
//! back. [`StreamingSession`] wraps the pair with the `Idle → Open →
//! {Idle, Closed}` state machine and makes the ordering guarantees
//! structural: events arrive in backend order, and nothing is delivered
//! after an error.

use crate::audio::AudioEncoding;
use crate::defaults;
use crate::error::{Result, VoxbridgeError};
use crate::streaming::event::StreamEvent;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Fixed configuration for one streaming session.
///
/// Set at open time and immutable for the session's lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamConfig {
    pub encoding: AudioEncoding,
    pub sample_rate_hz: u32,
    /// BCP-47 language tag the recognizer should assume.
    pub language: String,
    /// Whether the backend should insert punctuation into transcripts.
    pub punctuation: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            encoding: AudioEncoding::Linear16,
            sample_rate_hz: defaults::SAMPLE_RATE,
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            punctuation: true,
        }
    }
}

/// Duplex transport pair for one open stream.
///
/// A transport binding sends recognized events into `event_rx`'s sender
/// side in backend order and terminates the channel when the backend is
/// done; an error item must be the last thing sent.
pub struct RecognizerStream {
    pub audio_tx: mpsc::Sender<Vec<u8>>,
    pub event_rx: mpsc::Receiver<Result<StreamEvent>>,
}

/// Trait for backends that support bidirectional streaming recognition.
#[async_trait]
pub trait StreamingRecognizer: Send + Sync {
    /// Opens a stream with a fixed configuration.
    async fn open_stream(&self, config: &StreamConfig) -> Result<RecognizerStream>;
}

/// Implement StreamingRecognizer for Arc<T> to allow sharing across sessions.
#[async_trait]
impl<T: StreamingRecognizer> StreamingRecognizer for Arc<T> {
    async fn open_stream(&self, config: &StreamConfig) -> Result<RecognizerStream> {
        (**self).open_stream(config).await
    }
}

/// Lifecycle state of a [`StreamingSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Session is exchanging audio and events.
    Open,
    /// Session ended gracefully; all finals were delivered.
    Idle,
    /// Session terminated on a transport or backend error.
    Closed,
}

/// One open duplex exchange with the remote recognizer.
///
/// Push chunks in arrival order, pull events until the sequence ends.
/// Mid-stream resumption is not supported; retrying after an error is a
/// whole-session decision left to the caller.
pub struct StreamingSession {
    config: StreamConfig,
    state: SessionState,
    audio_tx: Option<mpsc::Sender<Vec<u8>>>,
    event_rx: mpsc::Receiver<Result<StreamEvent>>,
}

impl StreamingSession {
    /// Establishes a session against the recognizer.
    pub async fn open(
        recognizer: &dyn StreamingRecognizer,
        config: StreamConfig,
    ) -> Result<Self> {
        let stream = recognizer.open_stream(&config).await?;
        tracing::debug!(
            language = %config.language,
            sample_rate_hz = config.sample_rate_hz,
            "streaming session opened"
        );
        Ok(Self {
            config,
            state: SessionState::Open,
            audio_tx: Some(stream.audio_tx),
            event_rx: stream.event_rx,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Forwards one audio chunk to the recognizer.
    ///
    /// Fails with [`VoxbridgeError::StreamClosed`] once the input side has
    /// been closed, by [`Self::finish`] or by a terminated transport.
    pub async fn push_chunk(&mut self, chunk: Vec<u8>) -> Result<()> {
        let Some(audio_tx) = &self.audio_tx else {
            return Err(VoxbridgeError::StreamClosed {
                message: "input side already closed".to_string(),
            });
        };
        audio_tx
            .send(chunk)
            .await
            .map_err(|_| VoxbridgeError::StreamClosed {
                message: "transport dropped the input side".to_string(),
            })
    }

    /// Signals end of input. Buffered finals are still delivered through
    /// [`Self::next_event`] before the sequence terminates.
    pub fn finish(&mut self) {
        self.audio_tx = None;
    }

    /// Next event in strict backend order.
    ///
    /// `None` means the sequence ended: gracefully if [`Self::state`] is
    /// `Idle`, after an error if it is `Closed`. The error itself is
    /// yielded exactly once, and nothing follows it.
    pub async fn next_event(&mut self) -> Option<Result<StreamEvent>> {
        if self.state != SessionState::Open {
            return None;
        }
        match self.event_rx.recv().await {
            Some(Ok(event)) => Some(Ok(event)),
            Some(Err(error)) => {
                tracing::debug!(error = %error, "streaming session closed on error");
                self.state = SessionState::Closed;
                self.audio_tx = None;
                self.event_rx.close();
                Some(Err(error))
            }
            None => {
                self.state = SessionState::Idle;
                None
            }
        }
    }

    /// Closes the input side and drains the session to its end.
    ///
    /// Returns every delivered event plus the terminating error, if any.
    pub async fn collect(mut self) -> (Vec<StreamEvent>, Option<VoxbridgeError>) {
        self.finish();
        let mut events = Vec::new();
        while let Some(item) = self.next_event().await {
            match item {
                Ok(event) => events.push(event),
                Err(error) => return (events, Some(error)),
            }
        }
        (events, None)
    }
}

/// Scripted utterance for [`MockStreamingRecognizer`].
#[derive(Debug, Clone)]
struct MockUtterance {
    text: String,
    confidence: f32,
    /// How many chunks the backend consumes before finalizing this
    /// utterance.
    chunks: usize,
}

/// Mock streaming recognizer for testing.
///
/// Emits one progressively longer interim per consumed chunk and a final
/// once an utterance's chunk budget is reached. Closing the input flushes
/// the in-progress utterance's final, matching a backend that commits
/// whatever it has buffered on end-of-input.
#[derive(Debug, Clone, Default)]
pub struct MockStreamingRecognizer {
    utterances: Vec<MockUtterance>,
    fail_at_chunk: Option<usize>,
}

impl MockStreamingRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts an utterance finalized after `chunks` consumed chunks.
    pub fn utterance(mut self, text: &str, confidence: f32, chunks: usize) -> Self {
        self.utterances.push(MockUtterance {
            text: text.to_string(),
            confidence,
            chunks: chunks.max(1),
        });
        self
    }

    /// Scripts a transport failure when the nth chunk (1-indexed) arrives.
    pub fn failing_at_chunk(mut self, n: usize) -> Self {
        self.fail_at_chunk = Some(n.max(1));
        self
    }
}

/// First words of `text` proportional to how much of the utterance the
/// backend has heard.
fn partial_text(text: &str, consumed: usize, total: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return String::new();
    }
    let take = (words.len() * consumed)
        .div_ceil(total)
        .clamp(1, words.len());
    words[..take].join(" ")
}

#[async_trait]
impl StreamingRecognizer for MockStreamingRecognizer {
    async fn open_stream(&self, _config: &StreamConfig) -> Result<RecognizerStream> {
        let (audio_tx, mut audio_rx) =
            mpsc::channel::<Vec<u8>>(defaults::STREAM_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(defaults::STREAM_CHANNEL_CAPACITY);

        let script = self.utterances.clone();
        let fail_at_chunk = self.fail_at_chunk;

        tokio::spawn(async move {
            let mut total_chunks = 0usize;
            let mut utterance_idx = 0usize;
            let mut consumed = 0usize;

            while let Some(_chunk) = audio_rx.recv().await {
                total_chunks += 1;

                if fail_at_chunk == Some(total_chunks) {
                    let _ = event_tx
                        .send(Err(VoxbridgeError::TransientBackend {
                            message: "mock stream transport failure".to_string(),
                        }))
                        .await;
                    return;
                }

                let Some(utterance) = script.get(utterance_idx) else {
                    continue;
                };
                consumed += 1;

                let interim = partial_text(&utterance.text, consumed, utterance.chunks);
                if event_tx.send(Ok(StreamEvent::interim(&interim))).await.is_err() {
                    return;
                }

                if consumed >= utterance.chunks {
                    let final_event =
                        StreamEvent::final_result(&utterance.text, utterance.confidence);
                    if event_tx.send(Ok(final_event)).await.is_err() {
                        return;
                    }
                    utterance_idx += 1;
                    consumed = 0;
                }
            }

            // End of input: commit whatever is buffered for the current
            // utterance before closing the event sequence.
            if consumed > 0
                && let Some(utterance) = script.get(utterance_idx)
            {
                let final_event =
                    StreamEvent::final_result(&utterance.text, utterance.confidence);
                let _ = event_tx.send(Ok(final_event)).await;
            }
        });

        Ok(RecognizerStream { audio_tx, event_rx })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk() -> Vec<u8> {
        vec![0u8; 320]
    }

    #[tokio::test]
    async fn test_final_after_second_chunk_then_next_utterance() {
        let recognizer = MockStreamingRecognizer::new()
            .utterance("good morning", 0.93, 2)
            .utterance("how are you", 0.88, 2);

        let mut session = StreamingSession::open(&recognizer, StreamConfig::default())
            .await
            .expect("open");
        assert_eq!(session.state(), SessionState::Open);

        for _ in 0..3 {
            session.push_chunk(chunk()).await.expect("push");
        }
        let (events, error) = session.collect().await;
        assert!(error.is_none());

        // Interims (zero or more) then exactly one final for [c1, c2]
        let first_final = events
            .iter()
            .position(|e| e.is_final())
            .expect("first utterance must finalize");
        assert_eq!(events[first_final].transcript(), "good morning");
        assert_eq!(events[first_final].confidence(), Some(0.93));
        assert!(events[..first_final].iter().all(|e| !e.is_final()));

        // Events for c3 follow: the second utterance flushes on finish
        let tail: Vec<_> = events[first_final + 1..].iter().collect();
        assert!(!tail.is_empty());
        let finals: Vec<_> = events.iter().filter(|e| e.is_final()).collect();
        assert_eq!(finals.len(), 2, "one final per utterance, never repeated");
        assert_eq!(finals[1].transcript(), "how are you");
    }

    #[tokio::test]
    async fn test_interims_are_superseded_not_retracted() {
        let recognizer = MockStreamingRecognizer::new().utterance("one two three", 0.9, 3);

        let mut session = StreamingSession::open(&recognizer, StreamConfig::default())
            .await
            .expect("open");
        for _ in 0..3 {
            session.push_chunk(chunk()).await.expect("push");
        }
        let (events, error) = session.collect().await;
        assert!(error.is_none());

        let interims: Vec<&str> = events
            .iter()
            .filter(|e| !e.is_final())
            .map(|e| e.transcript())
            .collect();
        assert_eq!(interims, vec!["one", "one two", "one two three"]);
        // Each interim extends the previous; only the last one is current
        for pair in interims.windows(2) {
            assert!(pair[1].starts_with(pair[0]));
        }
    }

    #[tokio::test]
    async fn test_error_terminates_sequence_immediately() {
        let recognizer = MockStreamingRecognizer::new()
            .utterance("never finished", 0.9, 5)
            .failing_at_chunk(2);

        let mut session = StreamingSession::open(&recognizer, StreamConfig::default())
            .await
            .expect("open");
        session.push_chunk(chunk()).await.expect("push c1");
        session.push_chunk(chunk()).await.expect("push c2");
        session.finish();

        let mut saw_error = false;
        let mut events_after_error = 0;
        while let Some(item) = session.next_event().await {
            match item {
                Ok(_) if saw_error => events_after_error += 1,
                Ok(_) => {}
                Err(error) => {
                    assert!(error.is_transient());
                    saw_error = true;
                }
            }
        }

        assert!(saw_error);
        assert_eq!(events_after_error, 0, "no events delivered after an error");
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_graceful_end_reaches_idle() {
        let recognizer = MockStreamingRecognizer::new().utterance("short", 0.9, 1);

        let mut session = StreamingSession::open(&recognizer, StreamConfig::default())
            .await
            .expect("open");
        session.push_chunk(chunk()).await.expect("push");
        session.finish();

        while let Some(item) = session.next_event().await {
            assert!(item.is_ok());
        }
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_push_after_finish_is_rejected() {
        let recognizer = MockStreamingRecognizer::new().utterance("late", 0.9, 1);

        let mut session = StreamingSession::open(&recognizer, StreamConfig::default())
            .await
            .expect("open");
        session.finish();

        let err = session.push_chunk(chunk()).await.unwrap_err();
        assert!(matches!(err, VoxbridgeError::StreamClosed { .. }));
    }

    #[tokio::test]
    async fn test_finish_flushes_buffered_final() {
        // Utterance needs 3 chunks but input ends after 1: the backend
        // commits what it heard.
        let recognizer = MockStreamingRecognizer::new().utterance("buffered words", 0.8, 3);

        let mut session = StreamingSession::open(&recognizer, StreamConfig::default())
            .await
            .expect("open");
        session.push_chunk(chunk()).await.expect("push");

        let (events, error) = session.collect().await;
        assert!(error.is_none());
        let finals: Vec<_> = events.iter().filter(|e| e.is_final()).collect();
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].transcript(), "buffered words");
    }

    #[tokio::test]
    async fn test_empty_session_yields_no_events() {
        let recognizer = MockStreamingRecognizer::new().utterance("unused", 0.9, 1);

        let session = StreamingSession::open(&recognizer, StreamConfig::default())
            .await
            .expect("open");
        let (events, error) = session.collect().await;
        assert!(events.is_empty());
        assert!(error.is_none());
    }

    #[test]
    fn test_partial_text_progression() {
        assert_eq!(partial_text("a b c d", 1, 2), "a b");
        assert_eq!(partial_text("a b c d", 2, 2), "a b c d");
        assert_eq!(partial_text("a", 1, 3), "a");
        assert_eq!(partial_text("", 1, 1), "");
    }
}
