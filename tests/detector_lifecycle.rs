//! End-to-end detector lifecycle through the public handle API.

use futures_util::future::BoxFuture;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use mask_detector::camera::{CameraError, CameraSettings, CaptureProvider, CaptureSource, Frame};
use mask_detector::detector::{Detector, DetectorHandle, Notice, RunState};
use mask_detector::model::{Classifier, ModelError, ModelLoader, ModelPaths, Prediction};

const WAIT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct Webcam {
    open: AtomicUsize,
    max_open: AtomicUsize,
    denied: AtomicBool,
}

struct WebcamSource {
    cam: Arc<Webcam>,
    live: bool,
}

impl CaptureSource for WebcamSource {
    fn setup(&mut self) -> Result<(), CameraError> {
        if self.cam.denied.load(Ordering::SeqCst) {
            Err(CameraError::PermissionDenied)
        } else {
            Ok(())
        }
    }

    fn start(&mut self) -> Result<(), CameraError> {
        self.live = true;
        let n = self.cam.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.cam.max_open.fetch_max(n, Ordering::SeqCst);
        Ok(())
    }

    fn refresh_frame(&mut self) -> Result<Option<Arc<Frame>>, CameraError> {
        Ok(Some(Arc::new(Frame::rgb(vec![128; 4 * 4 * 3], 4, 4))))
    }

    fn stop(&mut self) {
        if std::mem::take(&mut self.live) {
            self.cam.open.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

struct WebcamProvider(Arc<Webcam>);

impl CaptureProvider for WebcamProvider {
    fn create(&self, _settings: &CameraSettings) -> Box<dyn CaptureSource> {
        Box::new(WebcamSource {
            cam: Arc::clone(&self.0),
            live: false,
        })
    }
}

struct MaskModel {
    labels: Vec<String>,
    calls: AtomicUsize,
}

impl Classifier for MaskModel {
    fn predict(&self, _frame: Arc<Frame>) -> BoxFuture<'static, Result<Vec<Prediction>, ModelError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            Ok(vec![
                Prediction::new("Mask", 0.92),
                Prediction::new("NoMask", 0.08),
            ])
        })
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }
}

struct Loader(Option<Arc<MaskModel>>);

impl ModelLoader for Loader {
    fn load(&self, paths: &ModelPaths) -> BoxFuture<'static, Result<Arc<dyn Classifier>, ModelError>> {
        let model = self.0.clone();
        let path = paths.metadata.clone();
        Box::pin(async move {
            match model {
                Some(m) => Ok(m as Arc<dyn Classifier>),
                None => Err(ModelError::Read {
                    path,
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
                }),
            }
        })
    }
}

fn mask_model() -> Arc<MaskModel> {
    Arc::new(MaskModel {
        labels: vec!["Mask".into(), "NoMask".into()],
        calls: AtomicUsize::new(0),
    })
}

fn launch(
    cam: &Arc<Webcam>,
    model: Option<Arc<MaskModel>>,
) -> (DetectorHandle, tokio::task::JoinHandle<()>) {
    let detector = Detector::new(
        Arc::new(WebcamProvider(Arc::clone(cam))),
        CameraSettings::default(),
    );
    let handle = detector.handle();
    let paths = ModelPaths::in_dir(std::path::Path::new("model"), "model.onnx", "metadata.json");
    let task = tokio::spawn(detector.run(Arc::new(Loader(model)), paths, 60));
    (handle, task)
}

async fn wait_until(handle: &DetectorHandle, check: impl FnMut(&mask_detector::detector::DetectorSnapshot) -> bool) {
    let mut rx = handle.subscribe();
    timeout(WAIT, rx.wait_for(check))
        .await
        .expect("timed out waiting for detector")
        .expect("detector gone");
}

#[tokio::test]
async fn test_mask_scenario() {
    let cam = Arc::new(Webcam::default());
    let (handle, task) = launch(&cam, Some(mask_model()));

    wait_until(&handle, |s| s.state == RunState::ReadyStopped).await;
    handle.start();
    wait_until(&handle, |s| s.generation >= 1).await;

    let snap = handle.snapshot();
    assert_eq!(snap.state, RunState::Running);
    assert_eq!(snap.predictions.len(), 2);
    assert_eq!(snap.predictions[0].label, "Mask");
    assert!((snap.predictions[0].probability - 0.92).abs() < 1e-6);
    assert!(snap.predictions[0].shows_mask());
    assert!(!snap.predictions[1].shows_mask());
    assert_eq!(snap.predictions[0].percent(), "92.0%");

    handle.stop();
    wait_until(&handle, |s| s.state == RunState::ReadyStopped).await;
    assert!(handle.snapshot().predictions.is_empty());
    assert_eq!(cam.open.load(Ordering::SeqCst), 0);

    handle.teardown();
    timeout(WAIT, task).await.unwrap().unwrap();
    assert_eq!(cam.max_open.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_model_missing_blocks_camera() {
    let cam = Arc::new(Webcam::default());
    let (handle, task) = launch(&cam, None);

    wait_until(&handle, |s| s.state == RunState::Error).await;
    assert_eq!(handle.snapshot().notice, Some(Notice::ModelLoad));
    assert!(!handle.snapshot().start_enabled());

    handle.start();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(handle.snapshot().state, RunState::Error);
    assert_eq!(cam.max_open.load(Ordering::SeqCst), 0);

    handle.teardown();
    timeout(WAIT, task).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_permission_denied_then_granted() {
    let cam = Arc::new(Webcam::default());
    cam.denied.store(true, Ordering::SeqCst);
    let (handle, task) = launch(&cam, Some(mask_model()));

    wait_until(&handle, |s| s.state == RunState::ReadyStopped).await;
    handle.start();
    wait_until(&handle, |s| s.notice == Some(Notice::CameraAccess)).await;
    assert_eq!(handle.snapshot().state, RunState::ReadyStopped);
    assert!(handle.snapshot().start_enabled());

    cam.denied.store(false, Ordering::SeqCst);
    handle.start();
    wait_until(&handle, |s| s.state == RunState::Running && s.generation >= 1).await;
    assert_eq!(handle.snapshot().notice, None);

    drop(handle);
    timeout(WAIT, task).await.unwrap().unwrap();
    assert_eq!(cam.open.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_hidden_mid_loop() {
    let cam = Arc::new(Webcam::default());
    let model = mask_model();
    let (handle, task) = launch(&cam, Some(Arc::clone(&model)));

    wait_until(&handle, |s| s.state == RunState::ReadyStopped).await;
    handle.toggle();
    wait_until(&handle, |s| s.generation >= 2).await;

    handle.set_hidden(true);
    wait_until(&handle, |s| s.state == RunState::ReadyStopped).await;
    let calls = model.calls.load(Ordering::SeqCst);
    handle.set_hidden(false);
    tokio::time::sleep(Duration::from_millis(40)).await;

    let snap = handle.snapshot();
    assert_eq!(snap.state, RunState::ReadyStopped);
    assert!(snap.predictions.is_empty());
    assert!(snap.preview.is_none());
    assert_eq!(cam.open.load(Ordering::SeqCst), 0);
    assert_eq!(model.calls.load(Ordering::SeqCst), calls);

    handle.teardown();
    handle.teardown();
    timeout(WAIT, task).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_mixed_controls_keep_one_camera_session() {
    let cam = Arc::new(Webcam::default());
    let (handle, task) = launch(&cam, Some(mask_model()));

    wait_until(&handle, |s| s.state == RunState::ReadyStopped).await;

    // Bursts sent back to back, so commands queue up behind each other.
    handle.start();
    handle.start();
    handle.stop();
    handle.start();
    handle.set_hidden(true);
    handle.start();
    handle.set_hidden(false);
    handle.toggle();
    handle.start();
    handle.stop();
    handle.stop();
    handle.start();
    wait_until(&handle, |s| s.state == RunState::Running).await;

    for round in 0..20 {
        match round % 5 {
            0 => handle.toggle(),
            1 => handle.set_hidden(true),
            2 => handle.start(),
            3 => handle.set_hidden(false),
            _ => handle.stop(),
        }
        handle.start();
        tokio::time::sleep(Duration::from_millis(3)).await;
        assert!(cam.open.load(Ordering::SeqCst) <= 1);
    }

    handle.set_hidden(true);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(handle.snapshot().state, RunState::ReadyStopped);
    assert_eq!(cam.open.load(Ordering::SeqCst), 0);

    handle.start();
    handle.teardown();
    handle.start();
    timeout(WAIT, task).await.unwrap().unwrap();

    assert_eq!(cam.max_open.load(Ordering::SeqCst), 1);
    assert_eq!(cam.open.load(Ordering::SeqCst), 0);
}
