//! Camera capture handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use super::capture_loop::{run_capture_loop, CaptureCommand, SharedFrame};
use super::device::list_devices;
use super::source::CaptureSource;
use super::types::{CameraError, CameraSettings, Frame, Resolution};

/// Camera capture handle.
///
/// The camera runs on a background thread that continuously captures frames
/// and stores the latest one in a shared buffer. `refresh_frame()` copies
/// that frame (cheaply, it is reference counted) into `current`, which is
/// what the detector classifies and the preview renders.
pub struct CameraCapture {
    /// Latest captured frame (shared with capture thread)
    frame_buffer: SharedFrame,
    /// Frame pulled by the last `refresh_frame()`
    current: Option<Arc<Frame>>,
    /// Capture thread handle
    capture_thread: Option<JoinHandle<()>>,
    /// Channel to send commands to capture thread
    command_tx: Option<Sender<CaptureCommand>>,
    /// Signal to stop capture thread
    stop_signal: Arc<AtomicBool>,
    settings: CameraSettings,
    set_up: bool,
    /// Device resolution (set after camera opens)
    device_resolution: Option<Resolution>,
    /// Device FPS (set after camera opens)
    device_fps: Option<u32>,
}

impl std::fmt::Debug for CameraCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraCapture")
            .field("settings", &self.settings)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl CameraCapture {
    /// Create an unbound capture handle. Nothing touches the device until
    /// `setup()`.
    pub fn new(settings: CameraSettings) -> Self {
        Self {
            frame_buffer: Arc::new(Mutex::new(None)),
            current: None,
            capture_thread: None,
            command_tx: None,
            stop_signal: Arc::new(AtomicBool::new(false)),
            settings,
            set_up: false,
            device_resolution: None,
            device_fps: None,
        }
    }

    /// Get the current camera settings.
    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Resolution the device negotiated, before fitting. `None` until started.
    pub fn device_resolution(&self) -> Option<Resolution> {
        self.device_resolution
    }

    /// Frame rate the device negotiated. `None` until started.
    pub fn device_fps(&self) -> Option<u32> {
        self.device_fps
    }

    /// Check if the capture thread is currently running.
    pub fn is_running(&self) -> bool {
        self.capture_thread
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    fn join_thread(&mut self) {
        if let Some(handle) = self.capture_thread.take() {
            if handle.join().is_err() {
                log::warn!("Capture thread panicked");
            }
        }
    }
}

impl CaptureSource for CameraCapture {
    /// Validate that the configured device exists. The camera itself is
    /// opened inside the background thread in `start()`.
    fn setup(&mut self) -> Result<(), CameraError> {
        let devices = list_devices()?;
        if devices.is_empty() {
            return Err(CameraError::NoDevices);
        }
        if !devices.iter().any(|d| d.index == self.settings.device_index) {
            return Err(CameraError::DeviceNotFound(self.settings.device_index));
        }
        self.set_up = true;
        Ok(())
    }

    /// Spawn the capture thread and block until it reports the stream is up
    /// (or why it is not).
    fn start(&mut self) -> Result<(), CameraError> {
        if !self.set_up {
            return Err(CameraError::NotSetUp);
        }
        if self.is_running() {
            return Err(CameraError::AlreadyRunning);
        }

        self.stop_signal.store(false, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel();
        self.command_tx = Some(tx);

        let buffer = Arc::clone(&self.frame_buffer);
        let stop = Arc::clone(&self.stop_signal);
        let settings = self.settings.clone();

        let (info_tx, info_rx) = mpsc::channel::<Result<(Resolution, u32), CameraError>>();

        let handle = std::thread::Builder::new()
            .name("camera-capture".into())
            .spawn(move || run_capture_loop(settings, buffer, stop, rx, info_tx))
            .map_err(|e| CameraError::StreamFailed(e.to_string()))?;
        self.capture_thread = Some(handle);

        match info_rx.recv() {
            Ok(Ok((res, fps))) => {
                self.device_resolution = Some(res);
                self.device_fps = Some(fps);
                Ok(())
            }
            Ok(Err(e)) => {
                self.stop_signal.store(true, Ordering::SeqCst);
                self.join_thread();
                Err(e)
            }
            Err(_) => {
                self.stop_signal.store(true, Ordering::SeqCst);
                self.join_thread();
                Err(CameraError::StreamFailed(
                    "Capture thread terminated unexpectedly".to_string(),
                ))
            }
        }
    }

    fn refresh_frame(&mut self) -> Result<Option<Arc<Frame>>, CameraError> {
        if !self.is_running() {
            return Err(CameraError::StreamFailed(
                "capture thread is not running".to_string(),
            ));
        }
        let latest = self
            .frame_buffer
            .lock()
            .map_err(|_| CameraError::StreamFailed("frame buffer poisoned".to_string()))?
            .clone();
        if latest.is_some() {
            self.current = latest;
        }
        Ok(self.current.clone())
    }

    fn stop(&mut self) {
        if self.capture_thread.is_none() {
            log::debug!("Camera already stopped");
            return;
        }

        self.stop_signal.store(true, Ordering::SeqCst);
        // Also send stop command via channel (in case thread is blocked)
        if let Some(tx) = self.command_tx.take() {
            let _ = tx.send(CaptureCommand::Stop);
        }
        self.join_thread();

        self.current = None;
        if let Ok(mut buf) = self.frame_buffer.lock() {
            *buf = None;
        }
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        self.stop();
    }
}
