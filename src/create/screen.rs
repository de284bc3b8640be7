/// A mounted Create screen
///
/// Owns the flow for as long as the screen is shown and turns the flow's
/// effects into iced tasks. Every mount gets a fresh id so that results of
/// work started by an earlier mount can be recognised and dropped.

use iced::Task;
use rfd::FileDialog;
use std::sync::Arc;
use tokio::sync::watch;

use super::flow::{CreateEvent, CreateFlow, Effect};
use super::mission::load_personal_mission;
use super::submit::submit;
use crate::backend::Backend;
use crate::config::AppConfig;
use crate::media::{CameraRecorder, MediaBlob, PreviewRegistry};
use crate::world::{World, WorldContext};

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "webm", "mkv", "avi"];

/// Collaborators shared by every mount
#[derive(Clone)]
pub struct Services {
    pub backend: Backend,
    pub recorder: Arc<dyn CameraRecorder>,
    pub config: Arc<AppConfig>,
    pub previews: PreviewRegistry,
}

pub struct CreateScreen {
    mount_id: u64,
    flow: CreateFlow,
    world: watch::Receiver<World>,
    recorder: Arc<dyn CameraRecorder>,
}

impl CreateScreen {
    /// Mount a fresh screen and start its mission fetch
    pub fn mount(mount_id: u64, services: &Services, world: &WorldContext) -> (Self, Task<CreateEvent>) {
        let screen = Self {
            mount_id,
            flow: CreateFlow::new(services.previews.clone()),
            world: world.subscribe(),
            recorder: Arc::clone(&services.recorder),
        };

        let backend = services.backend.clone();
        let limit = services.config.mission_feed_limit;
        let task = Task::perform(
            async move { load_personal_mission(&backend, limit).await },
            CreateEvent::MissionLoaded,
        );

        tracing::debug!("🎬 create screen mounted ({})", mount_id);
        (screen, task)
    }

    pub fn mount_id(&self) -> u64 {
        self.mount_id
    }

    pub fn flow(&self) -> &CreateFlow {
        &self.flow
    }

    /// World the clip is being created in
    pub fn active_world(&self) -> World {
        *self.world.borrow()
    }

    pub fn update(&mut self, event: CreateEvent, services: &Services) -> Task<CreateEvent> {
        match self.flow.apply(event) {
            Some(effect) => run_effect(effect, services),
            None => Task::none(),
        }
    }
}

// A capture still running belongs to this mount only
impl Drop for CreateScreen {
    fn drop(&mut self) {
        if self.flow.is_recording() {
            tracing::debug!("⏹️  create screen {} torn down while recording", self.mount_id);
            self.recorder.stop();
        }
    }
}

fn run_effect(effect: Effect, services: &Services) -> Task<CreateEvent> {
    match effect {
        Effect::PickFile => {
            // Show the native file picker dialog
            let mut dialog = FileDialog::new()
                .set_title("Choose a video")
                .add_filter("Video", VIDEO_EXTENSIONS);
            if let Some(videos) = dirs::video_dir() {
                dialog = dialog.set_directory(videos);
            }

            match dialog.pick_file() {
                Some(path) => Task::perform(
                    async move { MediaBlob::from_path(&path).await.map(Some).map_err(Arc::new) },
                    CreateEvent::FilePicked,
                ),
                None => Task::done(CreateEvent::FilePicked(Ok(None))),
            }
        }
        Effect::Record(request) => {
            let recorder = Arc::clone(&services.recorder);
            Task::perform(
                async move { recorder.record(request).await.map_err(Arc::new) },
                CreateEvent::RecordingFinished,
            )
        }
        Effect::StopRecording => {
            services.recorder.stop();
            Task::none()
        }
        Effect::Submit(plan) => {
            let backend = services.backend.clone();
            let function = services.config.analysis_function.clone();
            tracing::info!("🚀 submitting {} take(s)", if plan.is_duet() { 2 } else { 1 });
            Task::perform(
                async move { submit(&backend, plan, &function).await.map_err(Arc::new) },
                CreateEvent::SubmitFinished,
            )
        }
    }
}
