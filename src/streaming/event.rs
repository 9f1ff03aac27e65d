//! Events emitted by a streaming transcription session.

/// One event in a session's ordered output sequence.
///
/// Interim events are provisional: a later interim for the same utterance
/// supersedes the earlier one (never an explicit retraction), so consumers
/// must treat only the most recent interim as current. A `Final` closes the
/// utterance and is never repeated for it.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Provisional transcript, text only — the backend has not committed,
    /// so no confidence is attached.
    Interim { transcript: String },
    /// Committed transcript for one utterance, with confidence.
    Final { transcript: String, confidence: f32 },
}

impl StreamEvent {
    pub fn interim(transcript: &str) -> Self {
        StreamEvent::Interim {
            transcript: transcript.to_string(),
        }
    }

    pub fn final_result(transcript: &str, confidence: f32) -> Self {
        StreamEvent::Final {
            transcript: transcript.to_string(),
            confidence,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, StreamEvent::Final { .. })
    }

    /// The transcript text, regardless of variant.
    pub fn transcript(&self) -> &str {
        match self {
            StreamEvent::Interim { transcript } => transcript,
            StreamEvent::Final { transcript, .. } => transcript,
        }
    }

    /// Confidence, present only on final events.
    pub fn confidence(&self) -> Option<f32> {
        match self {
            StreamEvent::Interim { .. } => None,
            StreamEvent::Final { confidence, .. } => Some(*confidence),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_variants() {
        let interim = StreamEvent::interim("hel");
        assert!(!interim.is_final());
        assert_eq!(interim.transcript(), "hel");
        assert_eq!(interim.confidence(), None);

        let final_event = StreamEvent::final_result("hello", 0.95);
        assert!(final_event.is_final());
        assert_eq!(final_event.transcript(), "hello");
        assert_eq!(final_event.confidence(), Some(0.95));
    }

    #[test]
    fn test_event_equality() {
        assert_eq!(StreamEvent::interim("a"), StreamEvent::interim("a"));
        assert_ne!(
            StreamEvent::interim("a"),
            StreamEvent::final_result("a", 1.0)
        );
    }
}
