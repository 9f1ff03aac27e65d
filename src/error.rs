//! Error types for voxbridge.

use thiserror::Error;

/// Pipeline stage at which an error occurred.
///
/// Attached to [`VoxbridgeError::Stage`] so batch reports can tell a failed
/// transcription apart from a failed synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Audio → text against the remote recognizer.
    Transcription,
    /// Caller-supplied text transform between transcription and synthesis.
    Transform,
    /// Text → audio against the remote synthesizer.
    Synthesis,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineStage::Transcription => write!(f, "transcription"),
            PipelineStage::Transform => write!(f, "transform"),
            PipelineStage::Synthesis => write!(f, "synthesis"),
        }
    }
}

#[derive(Error, Debug)]
pub enum VoxbridgeError {
    // Backend errors, split by retry class
    #[error("Transient backend failure: {message}")]
    TransientBackend { message: String },

    #[error("Permanent backend failure: {message}")]
    PermanentBackend { message: String },

    #[error("Backend returned no usable result for {operation}")]
    EmptyResult { operation: String },

    // Pipeline stage wrapper for batch reporting
    #[error("Pipeline {stage} stage failed: {source}")]
    Stage {
        stage: PipelineStage,
        #[source]
        source: Box<VoxbridgeError>,
    },

    // Request validation
    #[error("Invalid request field {field}: {message}")]
    InvalidRequest { field: String, message: String },

    // Streaming session errors
    #[error("Streaming session closed: {message}")]
    StreamClosed { message: String },

    // Audio ingestion errors
    #[error("Audio error: {message}")]
    Audio { message: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VoxbridgeError {
    /// Whether this error is worth retrying.
    ///
    /// Only transient backend failures (rate limits, transport drops)
    /// qualify; stage wrappers are classified by what they wrap.
    pub fn is_transient(&self) -> bool {
        match self {
            VoxbridgeError::TransientBackend { .. } => true,
            VoxbridgeError::Stage { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    /// The stage recorded on this error, if it carries one.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            VoxbridgeError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Wraps this error with the pipeline stage it occurred at.
    ///
    /// Already-tagged errors are left untouched so nesting never stacks.
    pub fn at_stage(self, stage: PipelineStage) -> Self {
        match self {
            VoxbridgeError::Stage { .. } => self,
            other => VoxbridgeError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, VoxbridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let transient = VoxbridgeError::TransientBackend {
            message: "rate limited".to_string(),
        };
        assert!(transient.is_transient());

        let permanent = VoxbridgeError::PermanentBackend {
            message: "unsupported encoding".to_string(),
        };
        assert!(!permanent.is_transient());

        let empty = VoxbridgeError::EmptyResult {
            operation: "transcribe".to_string(),
        };
        assert!(!empty.is_transient());
    }

    #[test]
    fn test_stage_wrapper_preserves_transience() {
        let wrapped = VoxbridgeError::TransientBackend {
            message: "connection reset".to_string(),
        }
        .at_stage(PipelineStage::Transcription);

        assert!(wrapped.is_transient());
        assert_eq!(wrapped.stage(), Some(PipelineStage::Transcription));
    }

    #[test]
    fn test_at_stage_does_not_nest() {
        let wrapped = VoxbridgeError::PermanentBackend {
            message: "bad input".to_string(),
        }
        .at_stage(PipelineStage::Synthesis)
        .at_stage(PipelineStage::Transcription);

        // First tag wins; re-wrapping is a no-op
        assert_eq!(wrapped.stage(), Some(PipelineStage::Synthesis));
    }

    #[test]
    fn test_stage_display() {
        let err = VoxbridgeError::EmptyResult {
            operation: "transcribe".to_string(),
        }
        .at_stage(PipelineStage::Transcription);

        let rendered = err.to_string();
        assert!(rendered.contains("transcription"));
        assert!(rendered.contains("no usable result"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let err: VoxbridgeError = io_err.into();
        assert!(matches!(err, VoxbridgeError::Io(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_invalid_request_display() {
        let err = VoxbridgeError::InvalidRequest {
            field: "speaking_rate".to_string(),
            message: "must be between 0.25 and 4.0".to_string(),
        };
        assert!(err.to_string().contains("speaking_rate"));
    }
}
