//! Text-to-speech request and result types.
//!
//! A [`SynthesisRequest`] is an immutable value describing exactly one
//! synthesis call: what to say, which voice, how fast, and the output
//! encoding. Voice options are closed enums rather than open maps so every
//! mode is handled exhaustively.

use crate::audio::AudioEncoding;
use crate::defaults;
use crate::error::{Result, VoxbridgeError};

/// What the synthesizer should speak.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisInput {
    /// Plain text.
    Text(String),
    /// Speech Synthesis Markup Language document.
    Ssml(String),
}

impl SynthesisInput {
    /// The raw input string, regardless of markup.
    pub fn as_str(&self) -> &str {
        match self {
            SynthesisInput::Text(s) => s,
            SynthesisInput::Ssml(s) => s,
        }
    }

    pub fn is_ssml(&self) -> bool {
        matches!(self, SynthesisInput::Ssml(_))
    }
}

/// Voice gender class requested from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceGender {
    /// Let the backend pick.
    #[default]
    Unspecified,
    Female,
    Male,
    Neutral,
}

impl VoiceGender {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceGender::Unspecified => "unspecified",
            VoiceGender::Female => "female",
            VoiceGender::Male => "male",
            VoiceGender::Neutral => "neutral",
        }
    }
}

/// Which voice speaks the output.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSelection {
    /// BCP-47 language tag of the voice.
    pub language: String,
    /// Specific named voice; `None` lets the backend choose by language
    /// and gender.
    pub name: Option<String>,
    pub gender: VoiceGender,
}

impl Default for VoiceSelection {
    fn default() -> Self {
        Self {
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            name: None,
            gender: VoiceGender::Unspecified,
        }
    }
}

impl VoiceSelection {
    pub fn named(language: &str, name: &str) -> Self {
        Self {
            language: language.to_string(),
            name: Some(name.to_string()),
            gender: VoiceGender::Unspecified,
        }
    }
}

/// Prosody parameters applied to the synthesized voice.
#[derive(Debug, Clone, PartialEq)]
pub struct Prosody {
    /// Speaking rate relative to the voice's native speed.
    pub speaking_rate: f64,
    /// Pitch shift in semitones.
    pub pitch_semitones: f64,
    /// Volume gain in dB.
    pub volume_gain_db: f64,
}

impl Default for Prosody {
    fn default() -> Self {
        Self {
            speaking_rate: defaults::SPEAKING_RATE,
            pitch_semitones: 0.0,
            volume_gain_db: 0.0,
        }
    }
}

/// Immutable description of one synthesis call.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub input: SynthesisInput,
    pub voice: VoiceSelection,
    pub prosody: Prosody,
    pub encoding: AudioEncoding,
}

impl SynthesisRequest {
    /// Plain-text request with default voice, prosody and Linear16 output.
    pub fn text(text: &str) -> Self {
        Self {
            input: SynthesisInput::Text(text.to_string()),
            voice: VoiceSelection::default(),
            prosody: Prosody::default(),
            encoding: AudioEncoding::Linear16,
        }
    }

    /// SSML request with default voice, prosody and Linear16 output.
    pub fn ssml(markup: &str) -> Self {
        Self {
            input: SynthesisInput::Ssml(markup.to_string()),
            voice: VoiceSelection::default(),
            prosody: Prosody::default(),
            encoding: AudioEncoding::Linear16,
        }
    }

    pub fn with_voice(mut self, voice: VoiceSelection) -> Self {
        self.voice = voice;
        self
    }

    pub fn with_prosody(mut self, prosody: Prosody) -> Self {
        self.prosody = prosody;
        self
    }

    pub fn with_encoding(mut self, encoding: AudioEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Rejects requests the backend would refuse anyway.
    ///
    /// Validation failures are permanent errors; retrying an out-of-range
    /// prosody value cannot succeed.
    pub fn validate(&self) -> Result<()> {
        if self.input.as_str().trim().is_empty() {
            return Err(VoxbridgeError::InvalidRequest {
                field: "input".to_string(),
                message: "synthesis input must not be empty".to_string(),
            });
        }
        let rate = self.prosody.speaking_rate;
        if !(defaults::MIN_SPEAKING_RATE..=defaults::MAX_SPEAKING_RATE).contains(&rate) {
            return Err(VoxbridgeError::InvalidRequest {
                field: "speaking_rate".to_string(),
                message: format!(
                    "must be between {} and {}, got {}",
                    defaults::MIN_SPEAKING_RATE,
                    defaults::MAX_SPEAKING_RATE,
                    rate
                ),
            });
        }
        let pitch = self.prosody.pitch_semitones;
        if pitch.abs() > defaults::MAX_PITCH_SEMITONES {
            return Err(VoxbridgeError::InvalidRequest {
                field: "pitch_semitones".to_string(),
                message: format!(
                    "must be within ±{}, got {}",
                    defaults::MAX_PITCH_SEMITONES,
                    pitch
                ),
            });
        }
        let gain = self.prosody.volume_gain_db;
        if !(defaults::MIN_VOLUME_GAIN_DB..=defaults::MAX_VOLUME_GAIN_DB).contains(&gain) {
            return Err(VoxbridgeError::InvalidRequest {
                field: "volume_gain_db".to_string(),
                message: format!(
                    "must be between {} and {}, got {}",
                    defaults::MIN_VOLUME_GAIN_DB,
                    defaults::MAX_VOLUME_GAIN_DB,
                    gain
                ),
            });
        }
        Ok(())
    }

    /// Canonical bytes fed into the synthesis cache digest.
    ///
    /// Every field here changes the produced audio, so every field
    /// participates.
    pub(crate) fn digest_input(&self) -> Vec<u8> {
        let mut input = Vec::new();
        input.extend_from_slice(if self.input.is_ssml() { b"ssml" } else { b"text" });
        input.push(0);
        input.extend_from_slice(self.input.as_str().as_bytes());
        input.push(0);
        input.extend_from_slice(self.voice.language.as_bytes());
        input.push(0);
        if let Some(name) = &self.voice.name {
            input.extend_from_slice(name.as_bytes());
        }
        input.push(0);
        input.extend_from_slice(self.voice.gender.as_str().as_bytes());
        input.push(0);
        input.extend_from_slice(&self.prosody.speaking_rate.to_le_bytes());
        input.extend_from_slice(&self.prosody.pitch_semitones.to_le_bytes());
        input.extend_from_slice(&self.prosody.volume_gain_db.to_le_bytes());
        input.extend_from_slice(self.encoding.as_str().as_bytes());
        input
    }
}

/// Encoded audio produced by the synthesizer.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub bytes: Vec<u8>,
    pub encoding: AudioEncoding,
}

impl SynthesizedAudio {
    pub fn new(bytes: Vec<u8>, encoding: AudioEncoding) -> Self {
        Self { bytes, encoding }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_request_defaults() {
        let request = SynthesisRequest::text("hello");
        assert_eq!(request.input.as_str(), "hello");
        assert!(!request.input.is_ssml());
        assert_eq!(request.encoding, AudioEncoding::Linear16);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_ssml_request() {
        let request = SynthesisRequest::ssml("<speak>hello</speak>");
        assert!(request.input.is_ssml());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_empty_input_rejected() {
        let request = SynthesisRequest::text("   ");
        let err = request.validate().unwrap_err();
        match err {
            VoxbridgeError::InvalidRequest { field, .. } => assert_eq!(field, "input"),
            other => panic!("Expected InvalidRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_speaking_rate_bounds() {
        let too_fast = SynthesisRequest::text("hi").with_prosody(Prosody {
            speaking_rate: 4.5,
            ..Default::default()
        });
        assert!(too_fast.validate().is_err());

        let slowest = SynthesisRequest::text("hi").with_prosody(Prosody {
            speaking_rate: 0.25,
            ..Default::default()
        });
        assert!(slowest.validate().is_ok());
    }

    #[test]
    fn test_pitch_and_gain_bounds() {
        let shrill = SynthesisRequest::text("hi").with_prosody(Prosody {
            pitch_semitones: 25.0,
            ..Default::default()
        });
        assert!(shrill.validate().is_err());

        let muted = SynthesisRequest::text("hi").with_prosody(Prosody {
            volume_gain_db: -100.0,
            ..Default::default()
        });
        assert!(muted.validate().is_err());
    }

    #[test]
    fn test_validation_errors_are_permanent() {
        let request = SynthesisRequest::text("");
        let err = request.validate().unwrap_err();
        assert!(!err.is_transient());
    }

    #[test]
    fn test_digest_distinguishes_voice_and_markup() {
        let plain = SynthesisRequest::text("hello");
        let markup = SynthesisRequest::ssml("hello");
        assert_ne!(plain.digest_input(), markup.digest_input());

        let named = SynthesisRequest::text("hello")
            .with_voice(VoiceSelection::named("en-US", "en-US-Standard-C"));
        assert_ne!(plain.digest_input(), named.digest_input());
    }

    #[test]
    fn test_digest_distinguishes_prosody() {
        let normal = SynthesisRequest::text("hello");
        let fast = SynthesisRequest::text("hello").with_prosody(Prosody {
            speaking_rate: 1.5,
            ..Default::default()
        });
        assert_ne!(normal.digest_input(), fast.digest_input());
    }

    #[test]
    fn test_synthesized_audio_accessors() {
        let audio = SynthesizedAudio::new(vec![1, 2, 3], AudioEncoding::Mp3);
        assert_eq!(audio.len(), 3);
        assert!(!audio.is_empty());
        assert_eq!(audio.encoding, AudioEncoding::Mp3);
    }
}
