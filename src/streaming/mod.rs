//! Streaming transcription against the remote recognizer.
//!
//! A [`StreamingSession`] manages one duplex exchange: the caller pushes
//! audio chunks in arrival order and pulls a strictly ordered, finite
//! sequence of interim and final transcript events. Ordering and
//! termination are guaranteed by the types, not by callback discipline.

pub mod event;
pub mod session;

pub use event::StreamEvent;
pub use session::{
    MockStreamingRecognizer, RecognizerStream, SessionState, StreamConfig, StreamingRecognizer,
    StreamingSession,
};
