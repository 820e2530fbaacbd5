//! CLI binary for MoodNest.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use moodnest::audio::list_devices;
use moodnest::{
    AnalysisMode, MoodNestApp, MoodNestConfig, MoodService, Notice, NoticeBoard, NoticeKind,
};
use moodnest_scene::{LampDetector, SceneInstance, SceneNormalizer};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// MoodNest: voice mood detection driving live apartment lighting.
#[derive(Parser)]
#[command(name = "moodnest", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Record voice turns from the terminal and light the scene.
    Listen {
        /// `quick` or `conversation`; overrides the config file.
        #[arg(short, long)]
        mode: Option<AnalysisMode>,

        /// Scene asset; overrides `scene.asset_path`.
        #[arg(short, long)]
        scene: Option<PathBuf>,
    },

    /// Import a glTF asset and print its normalisation and lamp fixtures.
    Inspect {
        asset: PathBuf,
    },

    /// Fetch and print the shared ambient state once.
    State,

    /// List available audio devices.
    Devices,

    /// Write the effective configuration to the default config path.
    InitConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("moodnest=info,moodnest_scene=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Listen {
        mode: None,
        scene: None,
    }) {
        Command::Listen { mode, scene } => run_listen(config, mode, scene).await,
        Command::Inspect { asset } => inspect(&config, &asset),
        Command::State => print_state(config).await,
        Command::Devices => print_devices(),
        Command::InitConfig => init_config(&config),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<MoodNestConfig> {
    if let Some(path) = path {
        return Ok(MoodNestConfig::from_file(path)?);
    }
    let default_path = MoodNestConfig::default_config_path();
    if default_path.exists() {
        info!(path = %default_path.display(), "using default config file");
        return Ok(MoodNestConfig::from_file(&default_path)?);
    }
    Ok(MoodNestConfig::default())
}

async fn run_listen(
    config: MoodNestConfig,
    mode: Option<AnalysisMode>,
    scene: Option<PathBuf>,
) -> anyhow::Result<()> {
    println!("MoodNest v{}", env!("CARGO_PKG_VERSION"));
    let app = MoodNestApp::from_config(config)?;

    match (&scene, app.load_scene(scene.as_deref())) {
        (_, Ok(fixtures)) => println!("Scene loaded with {fixtures} lamp fixture(s)."),
        (Some(_), Err(e)) => return Err(e.into()),
        (None, Err(e)) => warn!(error = %e, "no scene loaded, lighting state only"),
    }

    let cancel = CancellationToken::new();
    let poller = app.spawn_poller(cancel.child_token());

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, shutting down...");
            ctrl_c.cancel();
        }
    });

    let mut session = match mode {
        Some(mode) => app.new_session_with_mode(mode),
        None => app.new_session(),
    };
    println!(
        "\nPress Enter to start recording, Enter again to send ({:?} mode). Ctrl+C quits.\n",
        session.mode()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if !wait_for_enter(&mut lines, &cancel).await {
            break;
        }
        app.notices().dismiss();
        if let Err(e) = session.press().await {
            warn!(error = %e, "press rejected");
            show_notice(app.notices());
            continue;
        }
        println!("Recording... press Enter to send.");
        if !wait_for_enter(&mut lines, &cancel).await {
            break;
        }
        app.notices().dismiss();
        let outcome = session.release().await;
        info!(?outcome, pending = ?session.pending_mood(), "turn finished");
        show_notice(app.notices());
        let lighting = app.stage().lighting();
        println!("  lighting: {} @ {:.1}", lighting.color, lighting.intensity);
    }

    if let Some(poller) = poller {
        poller.shutdown().await;
    }
    app.playback().preempt();
    Ok(())
}

/// Prints whatever the session posted to the notice board.
fn show_notice(notices: &NoticeBoard) {
    if let Some(notice) = notices.current() {
        println!("{}", notice_line(&notice));
    }
}

fn notice_line(notice: &Notice) -> String {
    let marker = match notice.kind {
        NoticeKind::MoodDetected => "*",
        NoticeKind::PendingConfirmation => "?",
        NoticeKind::Warning | NoticeKind::Error => "!",
    };
    match &notice.detail {
        Some(detail) => format!("{marker} {}: {detail}", notice.title),
        None => format!("{marker} {}", notice.title),
    }
}

/// Returns `false` on Ctrl+C or end of input.
async fn wait_for_enter(
    lines: &mut tokio::io::Lines<BufReader<tokio::io::Stdin>>,
    cancel: &CancellationToken,
) -> bool {
    tokio::select! {
        () = cancel.cancelled() => false,
        line = lines.next_line() => matches!(line, Ok(Some(_))),
    }
}

fn inspect(config: &MoodNestConfig, asset: &Path) -> anyhow::Result<()> {
    let scene = SceneInstance::load(
        asset,
        SceneNormalizer::new(config.scene.target_span),
        LampDetector::with_keywords(&config.scene.lamp_keywords),
    )?;
    let norm = scene.normalization();
    let size = norm.source_bounds.size();
    println!("Asset: {}", asset.display());
    println!(
        "  source size: {:.3} x {:.3} x {:.3}",
        size.x, size.y, size.z
    );
    println!("  scale: {:.4}", norm.scale);
    println!(
        "  offset: ({:.3}, {:.3}, {:.3})",
        norm.offset.x, norm.offset.y, norm.offset.z
    );
    println!("Lamp fixtures ({}):", scene.fixture_count());
    for name in scene.fixture_names() {
        println!("  - {name}");
    }
    Ok(())
}

async fn print_state(config: MoodNestConfig) -> anyhow::Result<()> {
    let app = MoodNestApp::from_config(config)?;
    let state = app.service().fetch_state().await?;
    println!("label: {}", state.label);
    println!("color: {}", state.color);
    if let Some(intensity) = state.intensity {
        println!("intensity: {intensity:.2}");
    }
    if let Some(track) = state.track {
        println!("track: {track:?}");
    }
    Ok(())
}

fn print_devices() -> anyhow::Result<()> {
    let (inputs, outputs) = list_devices()?;
    println!("Input devices:");
    for name in inputs {
        println!("  - {name}");
    }
    println!("\nOutput devices:");
    for name in outputs {
        println!("  - {name}");
    }
    Ok(())
}

fn init_config(config: &MoodNestConfig) -> anyhow::Result<()> {
    let path = MoodNestConfig::default_config_path();
    config.save_to_file(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
