//! Background capture thread implementation.

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat as NokhwaFrameFormat, RequestedFormat,
    RequestedFormatType,
};
use nokhwa::Camera;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use super::frame_utils::{convert_to_rgb, fit_to, mirror_horizontal};
use super::types::{CameraError, CameraSettings, Frame, Resolution};

/// Latest frame shared between the capture thread and its owner.
pub type SharedFrame = Arc<Mutex<Option<Arc<Frame>>>>;

/// Consecutive failed reads before the stream is considered dead.
const MAX_READ_FAILURES: u32 = 10;
/// How long reads must keep failing before giving up.
const READ_FAILURE_GRACE: Duration = Duration::from_secs(2);

/// Tracks the current streak of failed frame reads.
#[derive(Debug, Default)]
pub(crate) struct ReadFailures {
    count: u32,
    since: Option<Instant>,
}

impl ReadFailures {
    pub(crate) fn record_success(&mut self) {
        self.count = 0;
        self.since = None;
    }

    /// Returns `true` once the streak is long enough, in both count and
    /// time, to treat the stream as dead.
    pub(crate) fn record_failure(&mut self, now: Instant) -> bool {
        self.count = self.count.saturating_add(1);
        let since = *self.since.get_or_insert(now);
        self.count >= MAX_READ_FAILURES && now.duration_since(since) >= READ_FAILURE_GRACE
    }
}

/// Commands sent to the capture thread.
pub enum CaptureCommand {
    Stop,
}

/// Run the capture loop in a background thread.
///
/// Reports the negotiated device resolution and fps (or the open error)
/// on `info_tx` exactly once, then keeps `buffer` filled with the newest
/// frame, already fitted to `settings.resolution` and mirrored if asked.
/// The thread exits on its own once reads keep failing, which is how the
/// owner learns the stream died.
pub fn run_capture_loop(
    settings: CameraSettings,
    buffer: SharedFrame,
    stop: Arc<AtomicBool>,
    rx: Receiver<CaptureCommand>,
    info_tx: Sender<Result<(Resolution, u32), CameraError>>,
) {
    let index = CameraIndex::Index(settings.device_index);

    let mut camera = match open_camera_with_fallback(&index, &settings) {
        Ok(cam) => cam,
        Err(e) => {
            let _ = info_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = camera.open_stream() {
        let err = classify_open_error(&e.to_string(), CameraError::StreamFailed);
        let _ = info_tx.send(Err(err));
        return;
    }

    let res = camera.resolution();
    let device_res = Resolution::new(res.width(), res.height());
    let device_fps = camera.frame_rate();
    log::info!(
        "Camera {} streaming at {} @ {} fps (output {})",
        settings.device_index,
        device_res,
        device_fps,
        settings.resolution
    );
    let _ = info_tx.send(Ok((device_res, device_fps)));

    let mut dropped = 0u64;
    let mut failures = ReadFailures::default();
    while !stop.load(Ordering::Relaxed) {
        if let Ok(CaptureCommand::Stop) = rx.try_recv() {
            break;
        }

        match camera.frame() {
            Ok(raw_frame) => {
                failures.record_success();
                let frame = convert_to_rgb(&raw_frame)
                    .and_then(|frame| fit_to(frame, settings.resolution));

                match frame {
                    Some(mut frame) => {
                        if settings.mirror {
                            mirror_horizontal(&mut frame);
                        }
                        if let Ok(mut buf) = buffer.lock() {
                            *buf = Some(Arc::new(frame));
                        }
                    }
                    None => {
                        dropped += 1;
                        log::trace!("Dropped undecodable frame ({} so far)", dropped);
                    }
                }
            }
            Err(e) => {
                log::debug!("Camera frame read failed: {}", e);
                if failures.record_failure(Instant::now()) {
                    log::warn!(
                        "Camera {} stopped delivering frames: {}",
                        settings.device_index,
                        e
                    );
                    break;
                }
            }
        }

        // Small sleep to allow checking stop signal
        thread::sleep(Duration::from_millis(1));
    }

    if let Err(e) = camera.stop_stream() {
        log::debug!("Camera stop_stream: {}", e);
    }
    log::info!("Camera {} released", settings.device_index);
}

/// Try to open a camera with multiple format fallback strategies.
fn open_camera_with_fallback(
    index: &CameraIndex,
    settings: &CameraSettings,
) -> Result<Camera, CameraError> {
    // In order: NV12 (native on macOS), MJPEG (widely supported), then
    // whatever the device offers at its highest resolution.
    let requested_res =
        nokhwa::utils::Resolution::new(settings.resolution.width, settings.resolution.height);
    let format_attempts: Vec<RequestedFormat> = vec![
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            requested_res,
            NokhwaFrameFormat::NV12,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            requested_res,
            NokhwaFrameFormat::MJPEG,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
    ];

    let mut last_error = None;

    for requested in format_attempts {
        match Camera::new(index.clone(), requested) {
            Ok(cam) => return Ok(cam),
            Err(e) => {
                log::debug!("Camera format attempt failed: {}", e);
                last_error = Some(e.to_string());
            }
        }
    }

    let msg = last_error.unwrap_or_else(|| "no usable camera format".to_string());
    Err(classify_open_error(&msg, CameraError::OpenFailed))
}

/// Map a backend error message onto `PermissionDenied` when it smells like
/// an authorization failure.
pub(crate) fn classify_open_error(
    msg: &str,
    otherwise: impl FnOnce(String) -> CameraError,
) -> CameraError {
    let lower = msg.to_lowercase();
    if lower.contains("permission")
        || lower.contains("denied")
        || lower.contains("authorization")
        || lower.contains("access")
    {
        CameraError::PermissionDenied
    } else {
        otherwise(msg.to_string())
    }
}
