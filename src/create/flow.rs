/// Create screen state machine
///
/// `CreateFlow::apply` is the only way the draft changes. It never performs
/// I/O: anything that needs the outside world comes back as an `Effect` for
/// the caller to run, and the result is fed back in as another event.

use std::sync::Arc;

use super::draft::{
    correlation_token, CameraMode, CaptureMode, Category, DraftClip, DuetStep, RecordDuration,
};
use super::error::SubmitError;
use super::mission::PersonalMission;
use super::submit::{SubmissionPlan, SubmitOutcome};
use crate::media::{MediaBlob, PreviewHandle, PreviewRegistry, RecordRequest, RecorderError};

pub const FIRST_TAKE_READY: &str =
    "First take ready. Now record the response (part two of the duet).";
pub const SECOND_TAKE_READY: &str = "Second take ready. This clip will be part two of the duet.";
pub const CLIP_READY: &str = "Clip ready to upload.";

/// Everything that can happen on the Create screen
#[derive(Debug, Clone)]
pub enum CreateEvent {
    TitleChanged(String),
    DescriptionChanged(String),
    NotesChanged(String),
    CategorySelected(Category),
    CameraModeSelected(CameraMode),
    DurationSelected(RecordDuration),
    CaptureModeSelected(CaptureMode),
    /// User asked for the file picker
    PickFile,
    /// Picker closed; `None` when cancelled
    FilePicked(Result<Option<MediaBlob>, Arc<std::io::Error>>),
    /// "Record again / choose another"
    ClearFile,
    StartRecording,
    StopRecording,
    RecordingFinished(Result<MediaBlob, Arc<RecorderError>>),
    Submit,
    SubmitFinished(Result<SubmitOutcome, Arc<SubmitError>>),
    MissionLoaded(Option<PersonalMission>),
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    PickFile,
    Record(RecordRequest),
    StopRecording,
    Submit(SubmissionPlan),
}

#[derive(Debug)]
pub struct CreateFlow {
    draft: DraftClip,
    registry: PreviewRegistry,
    preview: Option<PreviewHandle>,
    status: String,
    error: Option<String>,
    loading: bool,
    recording: bool,
    mission: Option<PersonalMission>,
}

impl CreateFlow {
    pub fn new(registry: PreviewRegistry) -> Self {
        Self {
            draft: DraftClip::default(),
            registry,
            preview: None,
            status: String::new(),
            error: None,
            loading: false,
            recording: false,
            mission: None,
        }
    }

    pub fn draft(&self) -> &DraftClip {
        &self.draft
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn mission(&self) -> Option<&PersonalMission> {
        self.mission.as_ref()
    }

    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }

    /// Step text shown under the camera modes while in duet mode
    pub fn duet_hint(&self) -> Option<String> {
        if self.draft.camera_mode != CameraMode::Duet {
            return None;
        }
        let step = self.draft.duet.step;
        let action = match step {
            DuetStep::First => "record the 'past' version.",
            DuetStep::Second => "now record the 'future' response.",
        };
        Some(format!("Duet, step {} of 2 · {}", step.number(), action))
    }

    /// Apply one event and return the effect to run, if any
    pub fn apply(&mut self, event: CreateEvent) -> Option<Effect> {
        match event {
            CreateEvent::TitleChanged(title) => {
                self.draft.title = title;
                None
            }
            CreateEvent::DescriptionChanged(description) => {
                self.draft.description = description;
                None
            }
            CreateEvent::NotesChanged(notes) => {
                self.draft.script_notes = notes;
                None
            }
            CreateEvent::CategorySelected(category) => {
                self.draft.category = category;
                None
            }
            CreateEvent::CameraModeSelected(mode) => {
                self.draft.camera_mode = mode;
                self.draft.duet.reset();
                None
            }
            CreateEvent::DurationSelected(duration) => {
                self.draft.duration = duration;
                None
            }
            CreateEvent::CaptureModeSelected(mode) => {
                self.draft.capture_mode = mode;
                self.status.clear();
                self.error = None;
                None
            }
            CreateEvent::PickFile => Some(Effect::PickFile),
            CreateEvent::FilePicked(Ok(blob)) => {
                self.set_primary(blob);
                self.draft.duet.reset();
                None
            }
            CreateEvent::FilePicked(Err(e)) => {
                tracing::warn!("⚠️  could not read picked file: {}", e);
                self.error = Some(format!("Could not read the selected file: {}", e));
                None
            }
            CreateEvent::ClearFile => {
                self.set_primary(None);
                self.draft.duet.reset();
                None
            }
            CreateEvent::StartRecording => {
                if self.recording {
                    return None;
                }
                self.recording = true;
                self.error = None;
                Some(Effect::Record(RecordRequest {
                    max_duration_secs: self.draft.duration.secs(),
                    theme: self.draft.camera_mode,
                }))
            }
            CreateEvent::StopRecording => {
                if self.recording {
                    Some(Effect::StopRecording)
                } else {
                    None
                }
            }
            CreateEvent::RecordingFinished(Ok(blob)) => {
                self.recording = false;
                self.capture_complete(blob);
                None
            }
            CreateEvent::RecordingFinished(Err(e)) => {
                self.recording = false;
                tracing::warn!("⚠️  recording failed: {}", e);
                self.error = Some(format!("Recording failed: {}", e));
                None
            }
            CreateEvent::Submit => self.submit(),
            CreateEvent::SubmitFinished(Ok(outcome)) => {
                self.loading = false;
                self.set_primary(None);
                self.draft = DraftClip::default();
                self.status = outcome.status_message();
                None
            }
            CreateEvent::SubmitFinished(Err(e)) => {
                self.loading = false;
                tracing::warn!("⚠️  submission failed: {}", e);
                self.error = Some(e.to_string());
                None
            }
            CreateEvent::MissionLoaded(mission) => {
                self.mission = mission;
                None
            }
        }
    }

    fn capture_complete(&mut self, blob: MediaBlob) {
        if self.draft.camera_mode != CameraMode::Duet {
            self.draft.duet.reset();
            self.set_primary(Some(blob));
            self.status = CLIP_READY.to_string();
            return;
        }

        match self.draft.duet.step {
            DuetStep::First => {
                let duet = &mut self.draft.duet;
                duet.group_id.get_or_insert_with(correlation_token);
                duet.first_take = Some(blob.clone());
                duet.step = DuetStep::Second;
                self.set_primary(Some(blob));
                self.status = FIRST_TAKE_READY.to_string();
            }
            DuetStep::Second => {
                self.set_primary(Some(blob));
                self.status = SECOND_TAKE_READY.to_string();
            }
        }
    }

    fn submit(&mut self) -> Option<Effect> {
        if self.loading {
            return None;
        }
        self.status.clear();
        self.error = None;

        match SubmissionPlan::from_draft(&self.draft) {
            Ok(plan) => {
                self.loading = true;
                Some(Effect::Submit(plan))
            }
            Err(e) => {
                tracing::debug!("submission rejected: {}", e.code());
                self.error = Some(e.to_string());
                None
            }
        }
    }

    /// Replace the primary blob, swapping its preview handle
    fn set_primary(&mut self, blob: Option<MediaBlob>) {
        self.preview = blob.as_ref().map(|b| self.registry.acquire(b));
        self.draft.primary = blob;
    }
}
