//! Reply playback ownership.

use moodnest::{MoodError, PlaybackManager};

use crate::helpers::{reply_audio, FakeSink};

#[test]
fn new_reply_replaces_the_current_one() {
    let sink = FakeSink::new();
    let playback = PlaybackManager::new(sink.clone());

    playback.play(&reply_audio(0.2)).unwrap();
    playback.play(&reply_audio(0.1)).unwrap();

    assert_eq!(sink.started(), 2);
    assert_eq!(sink.playing(), 1);
    assert_eq!(sink.stopped(), 1);
    assert_eq!(sink.last_clip().unwrap().sample_rate, 24_000);
}

#[test]
fn preempt_reports_whether_anything_played() {
    let sink = FakeSink::new();
    let playback = PlaybackManager::new(sink.clone());
    assert!(!playback.preempt());

    playback.play(&reply_audio(0.2)).unwrap();
    assert!(playback.is_playing());
    assert!(playback.preempt());
    assert!(!playback.is_playing());
    assert_eq!(sink.playing(), 0);
}

#[test]
fn bad_payload_stops_current_reply_and_plays_nothing() {
    let sink = FakeSink::new();
    let playback = PlaybackManager::new(sink.clone());
    playback.play(&reply_audio(0.2)).unwrap();

    let err = playback.play("bm90IGF1ZGlv").unwrap_err();
    assert!(matches!(err, MoodError::DecodeFailed(_)));
    assert_eq!(sink.started(), 1);
    assert_eq!(sink.playing(), 0);
    assert!(!playback.is_playing());
}
