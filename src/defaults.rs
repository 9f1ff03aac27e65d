//! Default configuration constants for voxbridge.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

use std::time::Duration;

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and provides a good balance
/// between quality and bandwidth for voice audio sent to a remote backend.
pub const SAMPLE_RATE: u32 = 16000;

/// Default channel count for captured speech audio.
pub const CHANNELS: u16 = 1;

/// Default BCP-47 language tag for transcription and synthesis.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Default number of retries after the initial attempt.
///
/// Three retries with exponential backoff rides out the short rate-limit
/// and transport blips a remote speech backend produces under load.
pub const MAX_RETRIES: u32 = 3;

/// Default delay before the first retry.
pub const BASE_DELAY: Duration = Duration::from_millis(1000);

/// Default backoff multiplier applied after each failed attempt.
pub const BACKOFF_MULTIPLIER: f64 = 2.0;

/// Default time-to-live for cached backend responses.
///
/// One hour keeps repeated transcriptions of the same clip (demo loops,
/// batch re-runs) off the network without letting stale synthesis voices
/// linger for days.
pub const CACHE_TTL: Duration = Duration::from_secs(3600);

/// Default number of batch items processed concurrently.
///
/// Sequential by default; raise to overlap remote round-trips.
pub const BATCH_PARALLELISM: usize = 1;

/// Buffer size for streaming session channels.
///
/// Bounds how many audio chunks and events can be in flight between the
/// caller and the transport before backpressure applies.
pub const STREAM_CHANNEL_CAPACITY: usize = 100;

/// Maximum characters kept when excerpting text for batch export rows.
pub const EXCERPT_MAX_CHARS: usize = 48;

/// Default speaking rate for synthesis (1.0 = native voice speed).
pub const SPEAKING_RATE: f64 = 1.0;

/// Lowest accepted speaking rate.
pub const MIN_SPEAKING_RATE: f64 = 0.25;

/// Highest accepted speaking rate.
pub const MAX_SPEAKING_RATE: f64 = 4.0;

/// Pitch adjustment bounds in semitones.
pub const MAX_PITCH_SEMITONES: f64 = 20.0;

/// Volume gain bounds in dB.
pub const MIN_VOLUME_GAIN_DB: f64 = -96.0;
pub const MAX_VOLUME_GAIN_DB: f64 = 16.0;
