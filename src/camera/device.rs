//! Camera device enumeration.

use nokhwa::query;
use nokhwa::utils::ApiBackend;

use super::types::{CameraError, CameraInfo};

/// List all available camera devices on the system, ordered by index.
///
/// If no cameras are found, returns an empty vector (not an error).
pub fn list_devices() -> Result<Vec<CameraInfo>, CameraError> {
    let devices = query(ApiBackend::Auto).map_err(|e| CameraError::QueryFailed(e.to_string()))?;

    let mut cameras: Vec<CameraInfo> = devices
        .into_iter()
        .map(|d| CameraInfo {
            index: d.index().as_index().unwrap_or(0),
            name: d.human_name(),
            description: d.description().to_string(),
        })
        .collect();
    cameras.sort_by_key(|c| c.index);

    log::debug!("Found {} camera(s)", cameras.len());
    Ok(cameras)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_devices_is_sorted() {
        // Hosts without a camera backend report QueryFailed; nothing to check then.
        if let Ok(devices) = list_devices() {
            assert!(devices.windows(2).all(|w| w[0].index <= w[1].index));
        }
    }
}
