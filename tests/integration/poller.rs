//! Ambient state polling through the HTTP client.

use std::sync::Arc;
use std::time::Duration;

use moodnest::config::ServiceConfig;
use moodnest::{HttpMoodService, MoodStage, StatePoller};
use moodnest_scene::{Mood, MoodPreset, Rgb};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::{eventually, living_room};

fn poller_for(server: &MockServer, stage: &MoodStage) -> StatePoller {
    let service = HttpMoodService::new(&ServiceConfig {
        base_url: server.uri(),
        request_timeout_secs: 2,
    })
    .unwrap();
    StatePoller::new(
        Arc::new(service),
        stage.clone(),
        Duration::from_millis(20),
        CancellationToken::new(),
    )
}

#[tokio::test]
async fn polled_vibe_lights_the_scene() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "label": "Chill Lounge",
            "color": "#FFCC80",
            "intensity": 0.4,
            "youtube_id": "jfKfPfyJRdk"
        })))
        .mount(&server)
        .await;

    let stage = MoodStage::new();
    stage.install_scene(living_room());
    let handle = poller_for(&server, &stage).spawn();

    let expected = MoodPreset::new(Rgb::from_hex(0xffcc80), 0.4);
    assert!(eventually(|| stage.lighting() == expected).await);
    handle.shutdown().await;

    let fixture = stage.with_scene(|s| s.fixture_handles()[0]).unwrap();
    let shown = stage.with_scene(|s| s.fixture_preset(fixture)).flatten();
    assert_eq!(shown, Some(expected));
    assert_eq!(stage.ambient().label, "Chill Lounge");
}

#[tokio::test]
async fn next_poll_overrides_a_local_commit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "label": "Deep Work",
            "color": "#00E5FF",
            "intensity": 1.5
        })))
        .mount(&server)
        .await;

    let stage = MoodStage::new();
    stage.install_scene(living_room());
    let handle = poller_for(&server, &stage).spawn();

    let focus = MoodPreset::new(Rgb::from_hex(0x00e5ff), 1.5);
    assert!(eventually(|| stage.lighting() == focus).await);

    stage.commit_mood("sad");

    assert!(eventually(|| stage.ambient().label == "Deep Work").await);
    assert!(eventually(|| stage.lighting() == focus).await);
    handle.shutdown().await;

    let fixture = stage.with_scene(|s| s.fixture_handles()[0]).unwrap();
    let shown = stage.with_scene(|s| s.fixture_preset(fixture)).flatten();
    assert_eq!(shown, Some(focus));
}

#[tokio::test]
async fn failing_state_keeps_last_known_values() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "label": "happy",
            "color": "#FFD54F"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/state"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let stage = MoodStage::new();
    let handle = poller_for(&server, &stage).spawn();

    assert!(eventually(|| stage.current_mood() == Some(Mood::Happy)).await);
    let mut seen = 0;
    for _ in 0..100 {
        seen = server.received_requests().await.unwrap_or_default().len();
        if seen >= 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(seen >= 3, "poller should keep retrying, saw {seen} requests");
    assert_eq!(stage.current_mood(), Some(Mood::Happy));
    assert_eq!(stage.lighting(), Mood::Happy.preset());

    handle.shutdown().await;
}

#[tokio::test]
async fn shutdown_stops_polling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"label": "neutral"})))
        .mount(&server)
        .await;

    let stage = MoodStage::new();
    let handle = poller_for(&server, &stage).spawn();
    tokio::time::sleep(Duration::from_millis(60)).await;
    tokio::time::timeout(Duration::from_secs(2), handle.shutdown())
        .await
        .unwrap();

    let seen = server.received_requests().await.unwrap().len();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.received_requests().await.unwrap().len(), seen);
}
