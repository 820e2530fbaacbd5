//! Test doubles for devices and the analysis service, plus a small scene.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use moodnest::audio::{
    ActivePlayback, AudioSink, CaptureHandle, CapturedAudio, DecodedClip, Microphone,
};
use moodnest::config::MoodNestConfig;
use moodnest::{
    AmbientState, AnalysisMode, AnalysisResult, MoodError, MoodNestApp, MoodService, Result,
};
use moodnest_scene::{
    Aabb, LampDetector, Material, MeshData, SceneGraph, SceneInstance, SceneNormalizer, Transform,
};
use tokio::sync::Notify;

// ── Microphone ───────────────────────────────────────────────────────────────

/// Hands out half a second of a 440 Hz tone per recording.
#[derive(Default)]
pub(crate) struct FakeMicrophone {
    deny: AtomicBool,
    open: Arc<AtomicUsize>,
    acquired: AtomicUsize,
}

impl FakeMicrophone {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn denied() -> Arc<Self> {
        let mic = Self::default();
        mic.deny.store(true, Ordering::SeqCst);
        Arc::new(mic)
    }

    /// Captures currently holding the device.
    pub(crate) fn open_count(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub(crate) fn open_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.open)
    }

    pub(crate) fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Microphone for FakeMicrophone {
    async fn acquire(&self) -> Result<Box<dyn CaptureHandle>> {
        if self.deny.load(Ordering::SeqCst) {
            return Err(MoodError::PermissionDenied("access denied by user".into()));
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        self.open.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeCapture {
            open: Arc::clone(&self.open),
            released: false,
        }))
    }
}

struct FakeCapture {
    open: Arc<AtomicUsize>,
    released: bool,
}

impl FakeCapture {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.open.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl CaptureHandle for FakeCapture {
    fn finish(mut self: Box<Self>) -> Result<CapturedAudio> {
        self.release();
        let sample_rate = 16_000;
        let samples = (0..sample_rate / 2)
            .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / sample_rate as f32).sin() * 0.3)
            .collect();
        Ok(CapturedAudio {
            samples,
            sample_rate,
        })
    }
}

impl Drop for FakeCapture {
    fn drop(&mut self) {
        self.release();
    }
}

// ── Speaker ──────────────────────────────────────────────────────────────────

/// Records started clips. Playbacks never finish on their own.
#[derive(Default)]
pub(crate) struct FakeSink {
    started: Mutex<Vec<DecodedClip>>,
    playing: Arc<AtomicUsize>,
    stopped: Arc<AtomicUsize>,
}

impl FakeSink {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn started(&self) -> usize {
        self.started.lock().unwrap().len()
    }

    pub(crate) fn last_clip(&self) -> Option<DecodedClip> {
        self.started.lock().unwrap().last().cloned()
    }

    pub(crate) fn playing(&self) -> usize {
        self.playing.load(Ordering::SeqCst)
    }

    pub(crate) fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl AudioSink for FakeSink {
    fn start(&self, clip: DecodedClip) -> Result<Box<dyn ActivePlayback>> {
        self.started.lock().unwrap().push(clip);
        self.playing.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakePlayback {
            playing: Arc::clone(&self.playing),
            stopped: Arc::clone(&self.stopped),
        }))
    }
}

struct FakePlayback {
    playing: Arc<AtomicUsize>,
    stopped: Arc<AtomicUsize>,
}

impl ActivePlayback for FakePlayback {
    fn is_finished(&self) -> bool {
        false
    }

    fn stop(self: Box<Self>) {
        self.playing.fetch_sub(1, Ordering::SeqCst);
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Service ──────────────────────────────────────────────────────────────────

/// One recorded upload.
#[derive(Debug, Clone)]
pub(crate) struct Upload {
    pub mode: AnalysisMode,
    pub wav_len: usize,
    /// Microphone captures still open when the upload was sent.
    pub mic_open: usize,
}

/// Replays scripted analysis results in order.
#[derive(Default)]
pub(crate) struct FakeService {
    replies: Mutex<VecDeque<Result<AnalysisResult>>>,
    uploads: Mutex<Vec<Upload>>,
    hold: Mutex<Option<Arc<Notify>>>,
    mic_open: Mutex<Option<Arc<AtomicUsize>>>,
}

impl FakeService {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn reply(&self, result: Result<AnalysisResult>) {
        self.replies.lock().unwrap().push_back(result);
    }

    /// Blocks the next analyze calls until the returned handle is notified.
    pub(crate) fn hold_responses(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.hold.lock().unwrap() = Some(Arc::clone(&notify));
        notify
    }

    pub(crate) fn watch_microphone(&self, open: Arc<AtomicUsize>) {
        *self.mic_open.lock().unwrap() = Some(open);
    }

    pub(crate) fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl MoodService for FakeService {
    async fn analyze(&self, mode: AnalysisMode, wav: Vec<u8>) -> Result<AnalysisResult> {
        let mic_open = self
            .mic_open
            .lock()
            .unwrap()
            .as_ref()
            .map_or(0, |open| open.load(Ordering::SeqCst));
        self.uploads.lock().unwrap().push(Upload {
            mode,
            wav_len: wav.len(),
            mic_open,
        });

        let hold = self.hold.lock().unwrap().clone();
        if let Some(hold) = hold {
            hold.notified().await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(MoodError::NetworkUnavailable("no scripted reply".into())))
    }

    async fn fetch_state(&self) -> Result<AmbientState> {
        Err(MoodError::NetworkUnavailable("state not scripted".into()))
    }
}

// ── Results ──────────────────────────────────────────────────────────────────

pub(crate) fn detected(mood: &str, confidence: f32) -> AnalysisResult {
    AnalysisResult {
        success: true,
        detected_mood: Some(mood.into()),
        confidence: Some(confidence),
        ..AnalysisResult::default()
    }
}

pub(crate) fn awaiting(pending: &str) -> AnalysisResult {
    AnalysisResult {
        success: true,
        awaiting_confirmation: Some(true),
        pending_mood: Some(pending.into()),
        ai_response: Some(format!("You sound {pending}. Shall I change the lights?")),
        ..AnalysisResult::default()
    }
}

pub(crate) fn unsuccessful(error: &str) -> AnalysisResult {
    AnalysisResult {
        success: false,
        error: Some(error.into()),
        ..AnalysisResult::default()
    }
}

/// Base64 WAV of `seconds` of silence at 24 kHz.
pub(crate) fn reply_audio(seconds: f32) -> String {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 24_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..(24_000.0 * seconds) as usize {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    base64::engine::general_purpose::STANDARD.encode(cursor.into_inner())
}

// ── Scene ────────────────────────────────────────────────────────────────────

/// Living room with two lamps and a sofa.
pub(crate) fn living_room() -> SceneInstance {
    let mut graph = SceneGraph::new();
    let plaster = graph.add_material(Material::default().with_name("plaster"));
    let brass = graph.add_material(Material::default().with_name("brass"));

    let room = Aabb::from_points(&[[0.0, 0.0, 0.0].into(), [6.0, 3.0, 4.0].into()]).unwrap();
    let lamp = Aabb::from_points(&[[-0.2, 0.0, -0.2].into(), [0.2, 1.6, 0.2].into()]).unwrap();

    graph
        .add_mesh(None, "Room", Transform::identity(), MeshData::new(room, plaster))
        .unwrap();
    graph
        .add_mesh(
            None,
            "Floor_Lamp",
            Transform::from_translation([1.0, 0.0, 1.0].into()),
            MeshData::new(lamp, brass),
        )
        .unwrap();
    graph
        .add_mesh(
            None,
            "Desk_Lamp",
            Transform::from_translation([4.0, 0.8, 3.0].into()),
            MeshData::new(lamp, brass),
        )
        .unwrap();
    graph
        .add_mesh(
            None,
            "Sofa",
            Transform::from_translation([3.0, 0.0, 1.0].into()),
            MeshData::new(lamp, plaster),
        )
        .unwrap();

    SceneInstance::from_source(graph, SceneNormalizer::default(), LampDetector::default()).unwrap()
}

// ── App ──────────────────────────────────────────────────────────────────────

pub(crate) struct Rig {
    pub app: MoodNestApp,
    pub mic: Arc<FakeMicrophone>,
    pub sink: Arc<FakeSink>,
    pub service: Arc<FakeService>,
}

/// App wired to fakes with the living room installed.
pub(crate) fn rig() -> Rig {
    rig_with_mic(FakeMicrophone::new())
}

pub(crate) fn rig_with_mic(mic: Arc<FakeMicrophone>) -> Rig {
    let sink = FakeSink::new();
    let service = FakeService::new();
    service.watch_microphone(mic.open_counter());
    let app = MoodNestApp::with_parts(
        MoodNestConfig::default(),
        mic.clone(),
        sink.clone(),
        service.clone(),
    );
    app.stage().install_scene(living_room());
    Rig {
        app,
        mic,
        sink,
        service,
    }
}

/// Polls `cond` until it holds or two seconds pass.
pub(crate) async fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
