//! Model loading and the single-task driver loop.

use std::sync::Arc;
use tokio::sync::mpsc;

use super::clock::RefreshClock;
use super::handle::DetectorCommand;
use super::state::{Notice, RunState};
use super::{Detector, DetectorError};
use crate::model::{Classifier, ModelError, ModelLoader, ModelPaths};

impl Detector {
    /// Load the model. Runs once per session: `Idle -> Loading ->
    /// ReadyStopped`, or `-> Error` with a `ModelLoad` notice. There is no
    /// retry.
    pub async fn load_model(
        &mut self,
        loader: &dyn ModelLoader,
        paths: &ModelPaths,
    ) -> Result<(), DetectorError> {
        if !self.begin_load(paths) {
            return Err(DetectorError::NotReady(self.state));
        }
        let result = loader.load(paths).await;
        self.finish_load(result)
    }

    fn begin_load(&mut self, paths: &ModelPaths) -> bool {
        if self.state != RunState::Idle {
            log::warn!("Model load requested while {}; ignored", self.state);
            return false;
        }
        log::info!(
            "Loading model {} (labels from {})",
            paths.model.display(),
            paths.metadata.display()
        );
        self.set_state(RunState::Loading);
        true
    }

    fn finish_load(
        &mut self,
        result: Result<Arc<dyn Classifier>, ModelError>,
    ) -> Result<(), DetectorError> {
        match result {
            Ok(model) => {
                log::info!("Model ready: {}", model.labels().join(", "));
                self.model = Some(model);
                self.set_state(RunState::ReadyStopped);
                Ok(())
            }
            Err(e) => {
                log::error!("Error loading model: {}", e);
                self.publish(|snap| snap.notice = Some(Notice::ModelLoad));
                self.set_state(RunState::Error);
                Err(DetectorError::ModelLoad(e))
            }
        }
    }

    /// Apply one command. Start failures are logged and reflected in the
    /// snapshot; nothing propagates.
    pub async fn apply(&mut self, command: DetectorCommand) {
        log::debug!("Command {:?} in state {}", command, self.state);
        match command {
            DetectorCommand::Start => {
                if let Err(e) = self.start().await {
                    match e {
                        DetectorError::CameraAccess(_) => {}
                        other => log::warn!("Start refused: {}", other),
                    }
                }
            }
            DetectorCommand::Stop => self.stop(),
            DetectorCommand::Visibility { hidden } => self.set_visibility(hidden),
            DetectorCommand::Teardown => self.teardown(),
        }
    }

    /// Drive the detector until teardown.
    ///
    /// Loads the model first (only teardown is honoured meanwhile; the start
    /// control is disabled while loading), then multiplexes commands with
    /// refresh ticks. Commands win ties, so a stop always lands between
    /// iterations, and ticks are only scheduled while
    /// [`can_schedule`](Detector::can_schedule) holds. Exactly one `predict`
    /// is ever in flight because each tick is awaited to completion before
    /// the next `select!`.
    pub async fn run(mut self, loader: Arc<dyn ModelLoader>, paths: ModelPaths, refresh_rate: u32) {
        let Some(mut commands) = self.commands.take() else {
            log::error!("Detector::run called twice");
            return;
        };
        // Only handles keep the channel open from here on.
        self.tx = None;

        if !self.load_phase(loader.as_ref(), &paths, &mut commands).await {
            return;
        }

        let mut clock = RefreshClock::new(refresh_rate);
        log::debug!("Refresh clock period {:?}", clock.period());

        loop {
            tokio::select! {
                biased;

                command = commands.recv() => {
                    let command = command.unwrap_or_else(|| {
                        log::debug!("All detector handles dropped");
                        DetectorCommand::Teardown
                    });
                    // Handles disarm the token before the command lands, so
                    // look at the session rather than `can_schedule`.
                    let was_looping = self.loop_active();
                    self.apply(command).await;
                    if self.is_torn_down() {
                        break;
                    }
                    if was_looping && !self.loop_active() {
                        clock.cancel_pending();
                    }
                }

                _ = clock.next_tick(), if self.can_schedule() => {
                    self.tick().await;
                    if !self.loop_active() {
                        clock.cancel_pending();
                    }
                }
            }
        }

        log::info!("Detector shut down");
    }

    /// Returns `false` if the detector was torn down before the model
    /// finished loading.
    async fn load_phase(
        &mut self,
        loader: &dyn ModelLoader,
        paths: &ModelPaths,
        commands: &mut mpsc::UnboundedReceiver<DetectorCommand>,
    ) -> bool {
        if !self.begin_load(paths) {
            return true;
        }
        let mut load = loader.load(paths);

        loop {
            tokio::select! {
                result = &mut load => {
                    let _ = self.finish_load(result);
                    return true;
                }
                command = commands.recv() => match command {
                    Some(DetectorCommand::Teardown) | None => {
                        self.teardown();
                        return false;
                    }
                    Some(other) => log::debug!("Ignoring {:?} while loading", other),
                },
            }
        }
    }
}
