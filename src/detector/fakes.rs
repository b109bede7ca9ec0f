//! In-memory camera and model doubles for detector tests.

use futures_util::future::BoxFuture;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::camera::{CameraError, CameraSettings, CaptureProvider, CaptureSource, Frame};
use crate::model::{Classifier, ModelError, ModelLoader, ModelPaths, Prediction};

/// Shared counters for every camera a [`FakeProvider`] hands out.
#[derive(Default)]
pub struct CameraProbe {
    pub open: AtomicUsize,
    pub max_open: AtomicUsize,
    pub created: AtomicUsize,
    pub stops: AtomicUsize,
    pub refreshes: AtomicUsize,
    pub deny_permission: AtomicBool,
    pub fail_refresh: AtomicBool,
    pub no_frames: AtomicBool,
}

impl CameraProbe {
    pub fn open_now(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

pub struct FakeCamera {
    probe: Arc<CameraProbe>,
    streaming: bool,
}

impl CaptureSource for FakeCamera {
    fn setup(&mut self) -> Result<(), CameraError> {
        if self.probe.deny_permission.load(Ordering::SeqCst) {
            return Err(CameraError::PermissionDenied);
        }
        Ok(())
    }

    fn start(&mut self) -> Result<(), CameraError> {
        self.streaming = true;
        let now = self.probe.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.max_open.fetch_max(now, Ordering::SeqCst);
        Ok(())
    }

    fn refresh_frame(&mut self) -> Result<Option<Arc<Frame>>, CameraError> {
        self.probe.refreshes.fetch_add(1, Ordering::SeqCst);
        if self.probe.fail_refresh.load(Ordering::SeqCst) {
            return Err(CameraError::StreamFailed("unplugged".into()));
        }
        if self.probe.no_frames.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(Arc::new(Frame::rgb(vec![0; 2 * 2 * 3], 2, 2))))
    }

    fn stop(&mut self) {
        if self.streaming {
            self.streaming = false;
            self.probe.open.fetch_sub(1, Ordering::SeqCst);
            self.probe.stops.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeProvider {
    pub probe: Arc<CameraProbe>,
}

impl CaptureProvider for FakeProvider {
    fn create(&self, _settings: &CameraSettings) -> Box<dyn CaptureSource> {
        self.probe.created.fetch_add(1, Ordering::SeqCst);
        Box::new(FakeCamera {
            probe: Arc::clone(&self.probe),
            streaming: false,
        })
    }
}

/// Classifier returning scripted results, tracking concurrency.
pub struct FakeModel {
    labels: Vec<String>,
    script: Mutex<VecDeque<Result<Vec<f32>, String>>>,
    fallback: Vec<f32>,
    delay: Duration,
    pub calls: AtomicUsize,
    pub in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

impl FakeModel {
    pub fn new(labels: &[&str], fallback: &[f32]) -> Self {
        Self {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            script: Mutex::new(VecDeque::new()),
            fallback: fallback.to_vec(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn mask() -> Self {
        Self::new(&["Mask", "NoMask"], &[0.92, 0.08])
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn then(self, result: Result<Vec<f32>, String>) -> Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Classifier for FakeModel {
    fn predict(&self, _frame: Arc<Frame>) -> BoxFuture<'static, Result<Vec<Prediction>, ModelError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()));
        let labels = self.labels.clone();
        let delay = self.delay;
        let in_flight = Arc::clone(&self.in_flight);
        let max_in_flight = Arc::clone(&self.max_in_flight);

        Box::pin(async move {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            in_flight.fetch_sub(1, Ordering::SeqCst);
            let scores = next.map_err(ModelError::Inference)?;
            Ok(labels
                .into_iter()
                .zip(scores)
                .map(|(label, p)| Prediction::new(label, p))
                .collect())
        })
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Loader handing out a prepared model, or failing like a missing file.
pub struct FakeLoader {
    model: Option<Arc<FakeModel>>,
}

impl FakeLoader {
    pub fn ok(model: Arc<FakeModel>) -> Self {
        Self { model: Some(model) }
    }

    pub fn missing_metadata() -> Self {
        Self { model: None }
    }
}

impl ModelLoader for FakeLoader {
    fn load(
        &self,
        paths: &ModelPaths,
    ) -> BoxFuture<'static, Result<Arc<dyn Classifier>, ModelError>> {
        let model = self.model.clone();
        let metadata = paths.metadata.clone();
        Box::pin(async move {
            match model {
                Some(model) => Ok(model as Arc<dyn Classifier>),
                None => Err(ModelError::Read {
                    path: metadata,
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
                }),
            }
        })
    }
}

pub fn paths() -> ModelPaths {
    ModelPaths::in_dir(std::path::Path::new("model"), "model.onnx", "metadata.json")
}

/// A detector over fakes with the model already loaded.
pub async fn ready_detector(
    model: Arc<FakeModel>,
) -> (super::Detector, Arc<CameraProbe>) {
    let provider = FakeProvider::default();
    let probe = Arc::clone(&provider.probe);
    let mut detector = super::Detector::new(Arc::new(provider), CameraSettings::default());
    detector
        .load_model(&FakeLoader::ok(model), &paths())
        .await
        .expect("fake model loads");
    (detector, probe)
}
