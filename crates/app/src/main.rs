use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use ivideo_core::Clock;
use ivideo_core::model::{
    DEFAULT_POLL_INTERVAL, DEFAULT_SAVE_DIR, DEFAULT_TRIGGER_THRESHOLD_SECS, IVideoId,
    IVideoManifest, OverlaySettings, ViewerId,
};
use services::sim::{PresenterEvent, RecordingPresenter, SimulatedPlayer};
use services::{PlayerEvent, SessionLoopService, SessionReport, capture_viewer};
use storage::{HttpUploadConfig, InMemoryUploadStore, Storage};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod viewer;

use viewer::{ScriptedAnswer, ScriptedViewer};

#[derive(Parser, Debug)]
#[command(name = "ivideo", version, about = "Timed quiz overlay for video")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play an interactive video with a simulated player and a scripted viewer.
    Simulate(SimulateArgs),
    /// Check a viewer identifier (10-digit phone number or email).
    CheckViewer { id: String },
}

#[derive(Args, Debug)]
struct SimulateArgs {
    /// Interactive video manifest (JSON).
    #[arg(long)]
    manifest: PathBuf,
    /// Id used in the answer storage key; defaults to the manifest file stem.
    #[arg(long)]
    ivideo_id: Option<String>,
    #[arg(long)]
    viewer: String,
    /// Comma-separated answers: option text, 1-based option number, or `skip`.
    #[arg(long, default_value = "")]
    answers: String,
    #[arg(long, env = "IVIDEO_THRESHOLD", default_value_t = DEFAULT_TRIGGER_THRESHOLD_SECS)]
    threshold: f64,
    /// Movement required after a resume; defaults to the trigger threshold.
    #[arg(long, env = "IVIDEO_SETTLE")]
    settle: Option<f64>,
    #[arg(long, env = "IVIDEO_POLL_MS", default_value_t = default_poll_ms())]
    poll_ms: u64,
    #[arg(long, env = "IVIDEO_SAVE_DIR", default_value = DEFAULT_SAVE_DIR)]
    save_dir: String,
    /// Object store base URL; answers stay in memory when unset.
    /// Falls back to `IVIDEO_UPLOAD_URL`/`IVIDEO_UPLOAD_TOKEN`.
    #[arg(long)]
    upload_url: Option<String>,
    #[arg(long, requires = "upload_url")]
    upload_token: Option<String>,
    /// Video length in seconds; defaults to two seconds past the last question.
    #[arg(long)]
    duration: Option<f64>,
    /// Playback rate of the simulated player.
    #[arg(long, default_value_t = 1.0)]
    speed: f64,
}

fn default_poll_ms() -> u64 {
    u64::try_from(DEFAULT_POLL_INTERVAL.as_millis()).unwrap_or(100)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Simulate(args) => simulate(args).await,
        Command::CheckViewer { id } => check_viewer(&id),
    }
}

fn check_viewer(raw: &str) -> Result<()> {
    let viewer =
        ViewerId::parse(raw).with_context(|| format!("invalid viewer identifier {raw:?}"))?;
    println!("{viewer} ({:?})", viewer.kind());
    Ok(())
}

async fn simulate(args: SimulateArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.manifest)
        .with_context(|| format!("failed to read {}", args.manifest.display()))?;
    let ivideo_raw = match args.ivideo_id.clone() {
        Some(id) => id,
        None => args
            .manifest
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_string)
            .context("cannot derive an interactive video id from the manifest path")?,
    };
    let (manifest, ivideo, settings) = prepare(&raw, ivideo_raw, &args)
        .with_context(|| format!("cannot start a session for {}", args.manifest.display()))?;

    let step = settings.poll_interval().as_secs_f64() * args.speed;
    if step >= settings.trigger_threshold() {
        warn!(
            step,
            threshold = settings.trigger_threshold(),
            "playback moves further per poll than the trigger threshold; questions may be skipped"
        );
    }

    let mut presenter = RecordingPresenter::new();
    let Some(viewer) = capture_viewer(&args.viewer, &mut presenter) else {
        let reason = presenter
            .events()
            .into_iter()
            .find_map(|event| match event {
                PresenterEvent::IdentifierError(err) => Some(err.to_string()),
                _ => None,
            })
            .unwrap_or_default();
        bail!("invalid viewer identifier {:?}: {reason}", args.viewer);
    };

    let upload = match args.upload_url {
        Some(url) => Some(HttpUploadConfig::new(&url, args.upload_token)?),
        None => HttpUploadConfig::from_env()?,
    };
    let (storage, memory) = match upload {
        Some(config) => {
            info!(endpoint = %config.base_url(), "uploading answers over HTTP");
            (Storage::http(config), None)
        }
        None => {
            let store = InMemoryUploadStore::new();
            (Storage::from_gateway(Arc::new(store.clone())), Some(store))
        }
    };

    let schedule = manifest.schedule().clone();
    let duration = args
        .duration
        .unwrap_or_else(|| schedule.last_trigger_time() + 2.0);
    let player = SimulatedPlayer::new(duration).with_speed(args.speed);
    info!(
        video = manifest.video_id(),
        %ivideo,
        questions = schedule.len(),
        duration,
        "starting simulated playback"
    );

    let service = SessionLoopService::new(Clock::Default, storage, settings);
    let events = presenter.subscribe();
    let (runner, handle) = service
        .start(
            ivideo,
            viewer,
            manifest.into_schedule(),
            Box::new(player.clone()),
            Box::new(presenter),
        )
        .await;

    let script = ScriptedAnswer::parse_script(&args.answers);
    let viewer_task =
        tokio::spawn(ScriptedViewer::new(script, handle.clone(), player.clone()).run(events));
    handle.player_event(PlayerEvent::EnterFullscreen);
    player.start();
    drop(handle);

    let report = runner.run().await?;
    viewer_task.await.context("scripted viewer task failed")?;

    print_report(&report, &schedule.prompts());
    if let Some(store) = memory {
        for key in store.keys() {
            if let Some(object) = store.object(&key) {
                let body = String::from_utf8_lossy(&object.body);
                println!("stored {key} (v{}): {body}", object.version);
            }
        }
    }
    Ok(())
}

/// Everything about a session that is decided before playback starts.
fn prepare(
    manifest: &str,
    ivideo: String,
    args: &SimulateArgs,
) -> Result<(IVideoManifest, IVideoId, OverlaySettings), ivideo_core::Error> {
    let manifest = IVideoManifest::from_json(manifest)?;
    let ivideo = IVideoId::new(ivideo)?;
    let settings = OverlaySettings::new(
        args.threshold,
        args.settle.unwrap_or(args.threshold),
        Duration::from_millis(args.poll_ms),
        args.save_dir.clone(),
    )?;
    Ok((manifest, ivideo, settings))
}

fn print_report(report: &SessionReport, prompts: &[String]) {
    println!();
    println!("session {} ({} / {})", report.session_id, report.ivideo, report.viewer);
    for (index, prompt) in prompts.iter().enumerate() {
        let shown = report.shown.contains(&index);
        let answer = report
            .answers
            .get(index)
            .and_then(|a| a.as_deref())
            .unwrap_or(if shown { "(dismissed)" } else { "(not shown)" });
        println!("  {}. {prompt}: {answer}", index + 1);
    }
    for outcome in &report.uploads {
        match &outcome.result {
            Ok(receipt) => println!("  upload {} ok ({} bytes)", receipt.key, receipt.bytes),
            Err(err) => println!("  upload {} failed: {err}", outcome.key),
        }
    }
    let elapsed = report.ended_at - report.started_at;
    println!("  took {:.1}s", elapsed.num_milliseconds() as f64 / 1000.0);
}
