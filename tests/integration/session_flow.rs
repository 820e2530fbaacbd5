//! Voice session sequencing against fake devices and a scripted service.

use std::time::Duration;

use moodnest::{AnalysisMode, MoodError, NoticeKind, SessionOutcome, SessionState};
use moodnest_scene::{Mood, Rgb};

use crate::helpers::{
    awaiting, detected, eventually, reply_audio, rig, rig_with_mic, unsuccessful, FakeMicrophone,
};

#[tokio::test]
async fn detected_mood_lights_every_fixture() {
    let rig = rig();
    rig.service.reply(Ok(detected("angry", 0.91)));

    let mut session = rig.app.new_session();
    session.press().await.unwrap();
    assert_eq!(session.state(), &SessionState::Recording);
    let outcome = session.release().await;

    match outcome {
        SessionOutcome::Committed {
            mood,
            confidence,
            confidence_percent,
        } => {
            assert_eq!(mood, Mood::Angry);
            assert_eq!(confidence, Some(0.91));
            assert_eq!(confidence_percent, Some(91));
        }
        other => panic!("expected commit, got {other:?}"),
    }
    assert_eq!(session.state(), &SessionState::Idle);

    let stage = rig.app.stage();
    assert_eq!(stage.fixture_count(), 2);
    assert_eq!(stage.with_scene(|s| s.shows(Mood::Angry)), Some(true));
    let lighting = stage.lighting();
    assert_eq!(lighting.color, Rgb::from_hex(0xff0055));
    assert_eq!(lighting.intensity, 2.5);

    let notice = rig.app.notices().current().unwrap();
    assert_eq!(notice.kind, NoticeKind::MoodDetected);
    assert_eq!(notice.title, "Angry");
    assert_eq!(notice.detail.as_deref(), Some("91% confidence"));
}

#[tokio::test]
async fn upload_uses_session_mode() {
    let rig = rig();
    rig.service.reply(Ok(detected("happy", 0.7)));

    let mut session = rig.app.new_session_with_mode(AnalysisMode::Conversation);
    session.press().await.unwrap();
    session.release().await;

    let uploads = rig.service.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].mode, AnalysisMode::Conversation);
    assert!(uploads[0].wav_len > 44);
}

#[tokio::test]
async fn microphone_is_released_before_upload() {
    let rig = rig();
    rig.service.reply(Ok(detected("sad", 0.6)));

    let mut session = rig.app.new_session();
    session.press().await.unwrap();
    assert_eq!(rig.mic.open_count(), 1);
    session.release().await;

    assert_eq!(rig.service.uploads()[0].mic_open, 0);
    assert_eq!(rig.mic.open_count(), 0);
}

#[tokio::test]
async fn confirmation_holds_lighting_until_confirmed() {
    let rig = rig();
    rig.service.reply(Ok(awaiting("sad")));
    rig.service.reply(Ok(detected("sad", 0.8)));

    let mut session = rig.app.new_session_with_mode(AnalysisMode::Conversation);
    session.press().await.unwrap();
    let outcome = session.release().await;
    assert!(matches!(
        outcome,
        SessionOutcome::AwaitingConfirmation { ref pending_mood } if pending_mood == "sad"
    ));
    assert_eq!(session.pending_mood(), Some("sad"));
    assert_eq!(rig.app.stage().current_mood(), None);
    assert_eq!(rig.app.stage().lighting(), Mood::Neutral.preset());
    let notice = rig.app.notices().current().unwrap();
    assert_eq!(notice.kind, NoticeKind::PendingConfirmation);
    assert_eq!(notice.title, "Switch to Sad?");
    assert!(notice.detail.unwrap().contains("change the lights"));

    session.press().await.unwrap();
    let outcome = session.release().await;
    assert!(matches!(outcome, SessionOutcome::Committed { mood: Mood::Sad, .. }));
    assert_eq!(session.pending_mood(), None);
    assert_eq!(rig.app.stage().with_scene(|s| s.shows(Mood::Sad)), Some(true));
}

#[tokio::test]
async fn follow_up_without_mood_declines() {
    let rig = rig();
    rig.service.reply(Ok(awaiting("happy")));
    rig.service.reply(Ok(moodnest::AnalysisResult {
        success: true,
        ai_response: Some("Okay, leaving things as they are.".into()),
        ..Default::default()
    }));

    let mut session = rig.app.new_session_with_mode(AnalysisMode::Conversation);
    session.press().await.unwrap();
    session.release().await;
    session.press().await.unwrap();
    let outcome = session.release().await;

    assert!(matches!(outcome, SessionOutcome::Declined));
    assert_eq!(session.state(), &SessionState::Idle);
    assert_eq!(rig.app.stage().current_mood(), None);
}

#[tokio::test]
async fn unsuccessful_result_fails_to_idle() {
    let rig = rig();
    rig.service.reply(Ok(unsuccessful("Audio too short")));

    let mut session = rig.app.new_session();
    session.press().await.unwrap();
    let outcome = session.release().await;

    match outcome {
        SessionOutcome::Failed(MoodError::AnalysisFailed(reason)) => {
            assert_eq!(reason.as_deref(), Some("Audio too short"));
        }
        other => panic!("expected analysis failure, got {other:?}"),
    }
    assert_eq!(session.state(), &SessionState::Idle);
    assert_eq!(rig.app.stage().lighting(), Mood::Neutral.preset());

    let notice = rig.app.notices().current().unwrap();
    assert_eq!(notice.title, "Unable to Detect Mood");
    assert_eq!(notice.detail.as_deref(), Some("Audio too short"));
}

#[tokio::test]
async fn network_failure_clears_pending_mood() {
    let rig = rig();
    rig.service.reply(Ok(awaiting("angry")));
    rig.service
        .reply(Err(MoodError::NetworkUnavailable("request timed out".into())));

    let mut session = rig.app.new_session_with_mode(AnalysisMode::Conversation);
    session.press().await.unwrap();
    session.release().await;
    session.press().await.unwrap();
    let outcome = session.release().await;

    assert!(matches!(
        outcome,
        SessionOutcome::Failed(MoodError::NetworkUnavailable(_))
    ));
    assert_eq!(session.pending_mood(), None);
    assert_eq!(rig.app.stage().current_mood(), None);
    assert_eq!(
        rig.app.notices().current().unwrap().title,
        "Unable to Detect Mood"
    );
}

#[tokio::test]
async fn denied_microphone_returns_to_idle() {
    let rig = rig_with_mic(FakeMicrophone::denied());
    let mut session = rig.app.new_session();

    let err = session.press().await.unwrap_err();
    assert!(matches!(err, MoodError::PermissionDenied(_)));
    assert_eq!(session.state(), &SessionState::Idle);
    assert!(!rig.app.gate().is_busy());
    assert!(rig.service.uploads().is_empty());
    assert_eq!(
        rig.app.notices().current().unwrap().title,
        "Microphone Unavailable"
    );

    assert!(matches!(session.release().await, SessionOutcome::Ignored));
}

#[tokio::test]
async fn second_session_is_rejected_while_first_records() {
    let rig = rig();
    rig.service.reply(Ok(detected("happy", 0.9)));

    let mut first = rig.app.new_session();
    let mut second = rig.app.new_session();
    first.press().await.unwrap();

    assert!(matches!(second.press().await, Err(MoodError::SessionBusy)));
    assert_eq!(second.state(), &SessionState::Idle);
    assert_eq!(rig.mic.acquired(), 1);

    first.release().await;
    rig.service.reply(Ok(detected("sad", 0.9)));
    second.press().await.unwrap();
    assert!(matches!(
        second.release().await,
        SessionOutcome::Committed { mood: Mood::Sad, .. }
    ));
}

#[tokio::test]
async fn second_session_is_rejected_while_first_processes() {
    let rig = rig();
    let hold = rig.service.hold_responses();
    rig.service.reply(Ok(detected("happy", 0.9)));

    let mut first = rig.app.new_session();
    let mut second = rig.app.new_session();
    first.press().await.unwrap();
    let task = tokio::spawn(async move {
        let outcome = first.release().await;
        (first, outcome)
    });

    let service = rig.service.clone();
    assert!(eventually(|| service.uploads().len() == 1).await);
    assert!(rig.app.gate().is_busy());
    assert!(matches!(second.press().await, Err(MoodError::SessionBusy)));
    assert_eq!(second.state(), &SessionState::Idle);
    assert_eq!(rig.mic.acquired(), 1);

    hold.notify_one();
    let (first, outcome) = tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(outcome, SessionOutcome::Committed { mood: Mood::Happy, .. }));
    assert_eq!(first.state(), &SessionState::Idle);
    assert!(!rig.app.gate().is_busy());
}

#[tokio::test]
async fn superseded_result_is_discarded() {
    let rig = rig();
    let hold = rig.service.hold_responses();
    rig.service.reply(Ok(detected("angry", 0.99)));

    let mut session = rig.app.new_session();
    session.press().await.unwrap();
    let task = tokio::spawn(async move { session.release().await });

    let service = rig.service.clone();
    assert!(eventually(|| service.uploads().len() == 1).await);
    assert!(rig.app.gate().supersede());
    hold.notify_one();

    let outcome = tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(outcome, SessionOutcome::Superseded));
    assert_eq!(rig.app.stage().current_mood(), None);
    assert_eq!(rig.app.stage().lighting(), Mood::Neutral.preset());
    assert!(!rig.app.gate().is_busy());
}

#[tokio::test]
async fn reply_audio_plays_and_next_press_stops_it() {
    let rig = rig();
    let mut reply = detected("happy", 0.8);
    reply.audio = Some(reply_audio(0.5));
    rig.service.reply(Ok(reply));

    let mut session = rig.app.new_session_with_mode(AnalysisMode::Conversation);
    session.press().await.unwrap();
    session.release().await;

    assert_eq!(rig.sink.started(), 1);
    assert_eq!(rig.sink.playing(), 1);
    assert!(rig.app.playback().is_playing());
    let clip = rig.sink.last_clip().unwrap();
    assert_eq!(clip.samples.len(), 12_000);

    rig.service.reply(Ok(detected("sad", 0.8)));
    session.press().await.unwrap();
    assert_eq!(rig.sink.playing(), 0);
    assert_eq!(rig.sink.stopped(), 1);
    session.release().await;
}

#[tokio::test]
async fn undecodable_reply_still_commits() {
    let rig = rig();
    let mut reply = detected("sad", 0.5);
    reply.audio = Some("%%% not base64 %%%".into());
    rig.service.reply(Ok(reply));

    let mut session = rig.app.new_session();
    session.press().await.unwrap();
    let outcome = session.release().await;

    assert!(matches!(outcome, SessionOutcome::Committed { mood: Mood::Sad, .. }));
    assert_eq!(rig.sink.started(), 0);
}

#[tokio::test]
async fn unknown_mood_label_commits_neutral() {
    let rig = rig();
    rig.app.stage().commit_mood("happy");
    rig.service.reply(Ok(detected("surprised", 0.4)));

    let mut session = rig.app.new_session();
    session.press().await.unwrap();
    let outcome = session.release().await;

    assert!(matches!(outcome, SessionOutcome::Committed { mood: Mood::Neutral, .. }));
    assert_eq!(
        rig.app.stage().with_scene(|s| s.shows(Mood::Neutral)),
        Some(true)
    );
}
