//! Wiring: build the detector, drive it, and present it.
//!
//! The detector runs on its own task. The presentation only ever talks to
//! it through a [`DetectorHandle`] and redraws from published snapshots.

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::watch;

use crate::camera::NativeCameraProvider;
use crate::config::Config;
use crate::detector::{Detector, DetectorHandle, DetectorSnapshot, Notice, RunState};
use crate::model::{ModelLoader, OnnxLoader, Prediction};
use crate::ui::{self, TerminalGuard, UiAction, ViewOptions};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Terminal error: {0}")]
    Terminal(#[from] io::Error),
    #[error("Failed to install Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("Detector task failed: {0}")]
    Detector(#[from] tokio::task::JoinError),
    #[error("Failed to encode predictions: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{0}")]
    Unavailable(&'static str),
}

/// Run the detector with the terminal UI, or headless when `headless`.
pub async fn run(config: &Config, headless: bool) -> Result<(), AppError> {
    let detector = Detector::new(Arc::new(NativeCameraProvider), config.camera_settings());
    let handle = detector.handle();
    let loader: Arc<dyn ModelLoader> = Arc::new(OnnxLoader::new(config.model.layout));
    let driver = tokio::spawn(detector.run(
        loader,
        config.model_paths(),
        config.detector.refresh_rate,
    ));

    let result = if headless {
        run_headless(&handle, config.view_options()).await
    } else {
        run_tui(&handle, config.view_options()).await
    };

    handle.teardown();
    drop(handle);
    driver.await?;
    result
}

/// Interactive terminal UI. Returns when the user quits.
async fn run_tui(handle: &DetectorHandle, options: ViewOptions) -> Result<(), AppError> {
    let mut guard = TerminalGuard::enter()?;
    let mut stdout = io::stdout();
    let mut events = EventStream::new();
    let mut snapshots = handle.subscribe();
    let (mut cols, mut rows) = crossterm::terminal::size().unwrap_or((80, 24));

    redraw(&mut stdout, &mut snapshots, &options, cols, rows)?;

    loop {
        tokio::select! {
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) => match ui::handle_key_event(key) {
                        UiAction::Toggle => handle.toggle(),
                        UiAction::Quit => break,
                        UiAction::None => {}
                    },
                    Some(Ok(Event::FocusLost)) => handle.set_hidden(true),
                    Some(Ok(Event::FocusGained)) => handle.set_hidden(false),
                    Some(Ok(Event::Resize(c, r))) => {
                        cols = c;
                        rows = r;
                        redraw(&mut stdout, &mut snapshots, &options, cols, rows)?;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                }
            }

            changed = snapshots.changed() => {
                if changed.is_err() {
                    log::debug!("Detector stopped publishing");
                    break;
                }
                redraw(&mut stdout, &mut snapshots, &options, cols, rows)?;
            }
        }
    }

    guard.exit()?;
    Ok(())
}

fn redraw(
    out: &mut impl Write,
    snapshots: &mut watch::Receiver<DetectorSnapshot>,
    options: &ViewOptions,
    cols: u16,
    rows: u16,
) -> io::Result<()> {
    let snap = snapshots.borrow_and_update().clone();
    let lines = ui::layout(&snap, options, cols, rows);
    ui::draw(out, &lines, cols, rows)
}

/// One JSON line per published prediction set.
#[derive(Serialize)]
struct PredictionLine<'a> {
    generation: u64,
    predictions: &'a [Prediction],
}

/// Start as soon as the model is ready and stream predictions to stdout
/// until Ctrl+C.
async fn run_headless(handle: &DetectorHandle, options: ViewOptions) -> Result<(), AppError> {
    let on_signal = handle.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nReceived Ctrl+C, shutting down...");
        on_signal.teardown();
    })?;

    let mut snapshots = handle.subscribe();
    let mut started = false;
    let mut last_generation = 0;
    let stdout = io::stdout();

    loop {
        let snap = snapshots.borrow_and_update().clone();
        match (snap.state, snap.notice) {
            (RunState::Error, _) | (_, Some(Notice::ModelLoad)) => {
                return Err(AppError::Unavailable(
                    options.locale.messages().model_load_failed,
                ));
            }
            (_, Some(Notice::CameraAccess)) => {
                return Err(AppError::Unavailable(options.locale.messages().camera_denied));
            }
            (RunState::ReadyStopped, None) if snap.loop_halted => {
                return Err(AppError::Unavailable(options.locale.messages().loop_halted));
            }
            (RunState::ReadyStopped, None) if !started => {
                started = true;
                handle.start();
            }
            _ => {}
        }

        if snap.generation != last_generation && !snap.predictions.is_empty() {
            last_generation = snap.generation;
            let line = serde_json::to_string(&PredictionLine {
                generation: snap.generation,
                predictions: &snap.predictions,
            })?;
            let mut out = stdout.lock();
            writeln!(out, "{}", line)?;
            out.flush()?;
        }

        if snapshots.changed().await.is_err() {
            return Ok(());
        }
    }
}
