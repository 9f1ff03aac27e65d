//! End-to-end pipeline scenarios through the public API.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use voxbridge::{
    AudioData, BatchRunner, BatchSummary, ExportStatus, MockRecognizer, MockStreamingRecognizer,
    MockSynthesizer, PipelineOptions, Prosody, Result, RetryPolicy, SpeechPipeline,
    SpeechRecognizer, StreamConfig, StreamingSession, Transcription, VoiceSelection,
    VoxbridgeError, export_rows,
};

fn clip(seed: u8) -> AudioData {
    AudioData::linear16(vec![seed; 320])
}

/// Recognizer that rejects clips whose payload starts with zero, so batch
/// failures are driven by the input itself.
struct ZeroRejectingRecognizer;

#[async_trait]
impl SpeechRecognizer for ZeroRejectingRecognizer {
    async fn transcribe(&self, audio: &AudioData) -> Result<Transcription> {
        match audio.bytes().first() {
            Some(0) | None => Err(VoxbridgeError::PermanentBackend {
                message: "undecodable clip".to_string(),
            }),
            Some(&seed) => Ok(Transcription::single(&format!("clip {}", seed), 0.9)),
        }
    }
}

#[tokio::test]
async fn single_shot_transcribe_and_synthesize() {
    let pipeline = SpeechPipeline::new(
        Arc::new(MockRecognizer::new("hello", 0.92)),
        Arc::new(MockSynthesizer::new(vec![0xAB; 256])),
    );

    let result = pipeline.process(&clip(1)).await.expect("pipeline run");

    assert_eq!(result.transcript, "hello");
    assert_eq!(result.confidence, 0.92);
    assert_eq!(result.processed_text, "hello");
    assert!(!result.audio.is_empty());
    assert_eq!(result.source.byte_len, 320);
}

#[tokio::test]
async fn repeated_input_is_served_from_cache() {
    let recognizer = Arc::new(MockRecognizer::new("same clip", 0.88));
    let synthesizer = Arc::new(MockSynthesizer::new(vec![1; 32]));
    let pipeline = SpeechPipeline::new(recognizer.clone(), synthesizer.clone());

    let audio = clip(2);
    let first = pipeline.process(&audio).await.expect("first");
    let second = pipeline.process(&audio).await.expect("second");

    assert_eq!(first.transcript, second.transcript);
    assert_eq!(first.audio, second.audio);
    assert_eq!(recognizer.call_count(), 1, "cache hit must skip the backend");
    assert_eq!(synthesizer.call_count(), 1);

    // A different clip misses the cache
    pipeline.process(&clip(3)).await.expect("third");
    assert_eq!(recognizer.call_count(), 2);
}

#[tokio::test]
async fn transient_backend_blips_are_absorbed() {
    let recognizer = Arc::new(MockRecognizer::new("eventually", 0.8).failing_transiently(2));
    let pipeline = SpeechPipeline::new(
        recognizer.clone(),
        Arc::new(MockSynthesizer::new(vec![1; 8])),
    )
    .with_retry(RetryPolicy::new(3, Duration::from_millis(1), 2.0));

    let result = pipeline.process(&clip(4)).await.expect("recovers");
    assert_eq!(result.transcript, "eventually");
    assert_eq!(recognizer.call_count(), 3);
}

#[tokio::test]
async fn batch_run_isolates_failures_and_exports() {
    let pipeline = Arc::new(
        SpeechPipeline::new(
            Arc::new(ZeroRejectingRecognizer),
            Arc::new(MockSynthesizer::new(vec![1; 8])),
        )
        .with_retry(RetryPolicy::no_retry()),
    );

    // The middle clip is undecodable; its siblings still pass
    let results = BatchRunner::new()
        .run(pipeline, vec![clip(1), clip(0), clip(3)])
        .await;

    assert_eq!(results.len(), 3);
    assert!(results[0].is_success());
    assert!(!results[1].is_success());
    assert!(results[2].is_success());

    // The failure carries its originating input
    let failure = results[1].failure().expect("failed item");
    assert_eq!(failure.input.bytes()[0], 0);

    let summary = BatchSummary::of(&results);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);

    let rows = export_rows(&results);
    assert_eq!(rows[0].transcript_excerpt, "clip 1");
    assert_eq!(rows[1].status, ExportStatus::Failed);
    assert_eq!(rows[1].confidence, None);
    assert_eq!(rows[2].transcript_excerpt, "clip 3");
}

#[tokio::test]
async fn batch_of_many_clips_with_parallelism() {
    let pipeline = Arc::new(SpeechPipeline::new(
        Arc::new(MockRecognizer::new("bulk clip", 0.75)),
        Arc::new(MockSynthesizer::new(vec![5; 16])),
    ));

    let items: Vec<AudioData> = (0..12u8).map(clip).collect();
    let results = BatchRunner::with_parallelism(4)
        .run(pipeline, items)
        .await;

    assert_eq!(results.len(), 12);
    for (position, result) in results.iter().enumerate() {
        assert_eq!(result.index, position);
        assert!(result.is_success());
    }

    let summary = BatchSummary::of(&results);
    assert_eq!(summary.succeeded, 12);
    let mean = summary.mean_confidence.expect("successes present");
    assert!((mean - 0.75).abs() < 1e-6);
}

#[tokio::test]
async fn streaming_session_interleaves_interims_and_finals() {
    let recognizer = MockStreamingRecognizer::new()
        .utterance("first sentence", 0.91, 2)
        .utterance("second one", 0.89, 1);

    let mut session = StreamingSession::open(&recognizer, StreamConfig::default())
        .await
        .expect("open session");

    for seed in 0..3u8 {
        session.push_chunk(vec![seed; 160]).await.expect("push");
    }
    let (events, error) = session.collect().await;

    assert!(error.is_none());
    let finals: Vec<_> = events.iter().filter(|e| e.is_final()).collect();
    assert_eq!(finals.len(), 2);
    assert_eq!(finals[0].transcript(), "first sentence");
    assert_eq!(finals[0].confidence(), Some(0.91));
    assert_eq!(finals[1].transcript(), "second one");
}

#[tokio::test]
async fn pipeline_options_shape_the_synthesis_request() {
    let pipeline = SpeechPipeline::new(
        Arc::new(MockRecognizer::new("styled output", 0.9)),
        Arc::new(MockSynthesizer::new(vec![2; 64])),
    )
    .with_options(
        PipelineOptions::default()
            .with_voice(VoiceSelection::named("en-GB", "en-GB-News-K"))
            .with_prosody(Prosody {
                speaking_rate: 1.2,
                pitch_semitones: -2.0,
                volume_gain_db: 3.0,
            }),
    );

    let result = pipeline.process(&clip(9)).await.expect("styled run");
    assert_eq!(result.processed_text, "styled output");
    assert!(!result.audio.is_empty());
}
