//! Audio payloads handed to the pipeline.
//!
//! An [`AudioData`] is an opaque encoded byte sequence plus the metadata a
//! remote recognizer needs to decode it. It is immutable once captured and
//! borrowed by the pipeline for the duration of one call.

use crate::defaults;
use crate::error::{Result, VoxbridgeError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Audio container/codec tag understood by the remote backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioEncoding {
    /// Uncompressed 16-bit signed little-endian PCM.
    Linear16,
    /// Free lossless audio codec.
    Flac,
    /// MPEG layer 3.
    Mp3,
    /// Opus frames in an Ogg container.
    OggOpus,
}

impl AudioEncoding {
    /// Stable identifier used in cache keys and config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioEncoding::Linear16 => "linear16",
            AudioEncoding::Flac => "flac",
            AudioEncoding::Mp3 => "mp3",
            AudioEncoding::OggOpus => "ogg-opus",
        }
    }
}

impl std::fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoded audio plus the metadata needed to transcribe it.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioData {
    bytes: Vec<u8>,
    encoding: AudioEncoding,
    sample_rate_hz: u32,
    channels: u16,
    language: String,
}

impl AudioData {
    /// Creates audio data from already-encoded bytes.
    pub fn new(
        bytes: Vec<u8>,
        encoding: AudioEncoding,
        sample_rate_hz: u32,
        channels: u16,
        language: &str,
    ) -> Self {
        Self {
            bytes,
            encoding,
            sample_rate_hz,
            channels,
            language: language.to_string(),
        }
    }

    /// Creates 16kHz mono PCM audio with the default language.
    ///
    /// Convenience for tests and callers that capture speech themselves.
    pub fn linear16(bytes: Vec<u8>) -> Self {
        Self::new(
            bytes,
            AudioEncoding::Linear16,
            defaults::SAMPLE_RATE,
            defaults::CHANNELS,
            defaults::DEFAULT_LANGUAGE,
        )
    }

    /// Loads a RIFF/WAV file, taking sample rate and channel count from the
    /// header. Samples are carried as Linear16 bytes.
    pub fn from_wav_file(path: &Path, language: &str) -> Result<Self> {
        let mut reader = hound::WavReader::open(path).map_err(|e| VoxbridgeError::Audio {
            message: format!("Failed to parse WAV file {}: {}", path.display(), e),
        })?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| VoxbridgeError::Audio {
                message: format!("Failed to read WAV samples: {}", e),
            })?;

        let mut bytes = Vec::with_capacity(samples.len() * 2);
        for sample in samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }

        Ok(Self::new(
            bytes,
            AudioEncoding::Linear16,
            spec.sample_rate,
            spec.channels,
            language,
        ))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn encoding(&self) -> AudioEncoding {
        self.encoding
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// BCP-47 language tag of the speech in this audio.
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lightweight description of this audio for results and failure records.
    pub fn descriptor(&self) -> AudioDescriptor {
        AudioDescriptor {
            encoding: self.encoding,
            sample_rate_hz: self.sample_rate_hz,
            channels: self.channels,
            language: self.language.clone(),
            byte_len: self.bytes.len(),
        }
    }

    /// Canonical bytes fed into the transcription cache digest.
    ///
    /// Covers the payload and every field that changes what the recognizer
    /// would return; incidental metadata stays out.
    pub(crate) fn digest_input(&self) -> Vec<u8> {
        let mut input = Vec::with_capacity(self.bytes.len() + 64);
        input.extend_from_slice(self.encoding.as_str().as_bytes());
        input.push(0);
        input.extend_from_slice(&self.sample_rate_hz.to_le_bytes());
        input.extend_from_slice(&self.channels.to_le_bytes());
        input.extend_from_slice(self.language.as_bytes());
        input.push(0);
        input.extend_from_slice(&self.bytes);
        input
    }
}

/// Summary of an [`AudioData`] without the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioDescriptor {
    pub encoding: AudioEncoding,
    pub sample_rate_hz: u32,
    pub channels: u16,
    pub language: String,
    pub byte_len: usize,
}
