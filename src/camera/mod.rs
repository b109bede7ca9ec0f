//! Camera capture: device enumeration, the capture contract the detector
//! drives, and its nokhwa-backed implementation.

mod capture;
mod capture_loop;
mod device;
mod frame_utils;
mod source;
mod types;

pub use capture::CameraCapture;
pub use device::list_devices;
pub use frame_utils::{fit_to, mirror_horizontal};
pub use source::{CaptureProvider, CaptureSource, NativeCameraProvider};
pub use types::{CameraError, CameraInfo, CameraSettings, Frame, FrameFormat, Resolution};
