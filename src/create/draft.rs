/// The clip being prepared on the Create screen
///
/// `DraftClip` holds every form field plus the duet sub-session. It has no
/// I/O of its own; `CreateFlow` mutates it in response to events.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ValidationError;
use crate::media::MediaBlob;

/// Content category of a clip
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Kids,
    Learning,
    Wellbeing,
    Music,
    Creativity,
    #[default]
    Other,
}

impl Category {
    pub const ALL: &'static [Category] = &[
        Category::Kids,
        Category::Learning,
        Category::Wellbeing,
        Category::Music,
        Category::Creativity,
        Category::Other,
    ];

    /// Value stored in the `category` column
    pub fn id(self) -> &'static str {
        match self {
            Category::Kids => "kids",
            Category::Learning => "learning",
            Category::Wellbeing => "wellbeing",
            Category::Music => "music",
            Category::Creativity => "creativity",
            Category::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Kids => "Kids",
            Category::Learning => "Learning",
            Category::Wellbeing => "Wellbeing",
            Category::Music => "Music",
            Category::Creativity => "Creativity",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Creative camera mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMode {
    #[default]
    Normal,
    KidsStory,
    Mindful,
    Learning,
    /// Two-take recording: a first clip plus its response
    Duet,
}

impl CameraMode {
    pub const ALL: &'static [CameraMode] = &[
        CameraMode::Normal,
        CameraMode::KidsStory,
        CameraMode::Mindful,
        CameraMode::Learning,
        CameraMode::Duet,
    ];

    /// Value stored in the `camera_mode` column
    pub fn id(self) -> &'static str {
        match self {
            CameraMode::Normal => "normal",
            CameraMode::KidsStory => "kids_story",
            CameraMode::Mindful => "mindful",
            CameraMode::Learning => "learning",
            CameraMode::Duet => "duet",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CameraMode::Normal => "Normal",
            CameraMode::KidsStory => "Kids story",
            CameraMode::Mindful => "Mindful",
            CameraMode::Learning => "Learning",
            CameraMode::Duet => "Emotional duet",
        }
    }
}

impl fmt::Display for CameraMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where the primary clip comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaptureMode {
    #[default]
    Upload,
    Record,
}

/// Recording length cap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordDuration {
    Micro,
    #[default]
    Short,
    Long,
    Unlimited,
}

impl RecordDuration {
    pub const ALL: &'static [RecordDuration] = &[
        RecordDuration::Micro,
        RecordDuration::Short,
        RecordDuration::Long,
        RecordDuration::Unlimited,
    ];

    /// Cap in seconds, 0 meaning unlimited
    pub fn secs(self) -> u32 {
        match self {
            RecordDuration::Micro => 15,
            RecordDuration::Short => 60,
            RecordDuration::Long => 180,
            RecordDuration::Unlimited => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RecordDuration::Micro => "Micro (15s)",
            RecordDuration::Short => "Short (60s)",
            RecordDuration::Long => "Long (3min)",
            RecordDuration::Unlimited => "Unlimited*",
        }
    }
}

/// Which take of a duet is recorded next
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuetStep {
    #[default]
    First,
    Second,
}

impl DuetStep {
    pub fn number(self) -> u8 {
        match self {
            DuetStep::First => 1,
            DuetStep::Second => 2,
        }
    }
}

/// State of the two-take duet protocol
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuetSession {
    pub step: DuetStep,
    pub first_take: Option<MediaBlob>,
    /// Correlates both takes; assigned on the first capture
    pub group_id: Option<String>,
}

impl DuetSession {
    /// Back to step one with no first take and no group
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Where the user is in the creation flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProgressStep {
    Details,
    Media,
    Review,
}

impl ProgressStep {
    pub const ALL: &'static [ProgressStep] =
        &[ProgressStep::Details, ProgressStep::Media, ProgressStep::Review];

    pub fn number(self) -> u8 {
        match self {
            ProgressStep::Details => 1,
            ProgressStep::Media => 2,
            ProgressStep::Review => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProgressStep::Details => "Idea and details",
            ProgressStep::Media => "Video and format",
            ProgressStep::Review => "Review and publish",
        }
    }
}

/// Every field of the clip being created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftClip {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub camera_mode: CameraMode,
    pub capture_mode: CaptureMode,
    pub duration: RecordDuration,
    /// Only editable in learning mode, but kept across mode switches
    pub script_notes: String,
    /// The clip currently slated for preview and upload
    pub primary: Option<MediaBlob>,
    pub duet: DuetSession,
}

impl DraftClip {
    pub fn progress_step(&self) -> ProgressStep {
        if self.title.trim().is_empty() {
            ProgressStep::Details
        } else if self.primary.is_none() {
            ProgressStep::Media
        } else {
            ProgressStep::Review
        }
    }

    /// Check the draft can be submitted
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.primary.is_none() {
            return Err(ValidationError::MissingMedia);
        }
        if self.camera_mode == CameraMode::Duet && self.duet.first_take.is_none() {
            return Err(ValidationError::MissingFirstTake);
        }
        Ok(())
    }

    /// One-line readiness summary for the clip card
    pub fn readiness(&self) -> &'static str {
        if self.title.trim().is_empty() {
            "Fill in the title and category."
        } else if self.primary.is_none() {
            "Choose or record the video."
        } else {
            "Ready to publish."
        }
    }

    /// Empty strings become `None`
    pub fn title_field(&self) -> Option<String> {
        non_empty(&self.title)
    }

    pub fn description_field(&self) -> Option<String> {
        non_empty(&self.description)
    }

    pub fn notes_field(&self) -> Option<String> {
        non_empty(&self.script_notes)
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `<unix-ms>-<6 base36 chars>`, used for duet groups and upload names
pub fn correlation_token() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(name: &str) -> MediaBlob {
        MediaBlob::new(name, format!("/tmp/{}", name), 1024)
    }

    #[test]
    fn test_defaults() {
        let draft = DraftClip::default();
        assert_eq!(draft.category, Category::Other);
        assert_eq!(draft.camera_mode, CameraMode::Normal);
        assert_eq!(draft.capture_mode, CaptureMode::Upload);
        assert_eq!(draft.duration.secs(), 60);
        assert_eq!(draft.duet.step, DuetStep::First);
        assert!(draft.primary.is_none());
    }

    #[test]
    fn test_progress_step() {
        let mut draft = DraftClip::default();
        assert_eq!(draft.progress_step(), ProgressStep::Details);

        draft.title = "   ".to_string();
        assert_eq!(draft.progress_step(), ProgressStep::Details);

        draft.title = "My first clip".to_string();
        assert_eq!(draft.progress_step(), ProgressStep::Media);

        draft.primary = Some(blob("a.mp4"));
        assert_eq!(draft.progress_step(), ProgressStep::Review);
        assert_eq!(draft.readiness(), "Ready to publish.");
    }

    #[test]
    fn test_validate() {
        let mut draft = DraftClip::default();
        assert_eq!(draft.validate(), Err(ValidationError::MissingMedia));

        draft.primary = Some(blob("a.mp4"));
        assert_eq!(draft.validate(), Ok(()));

        draft.camera_mode = CameraMode::Duet;
        assert_eq!(draft.validate(), Err(ValidationError::MissingFirstTake));

        draft.duet.first_take = Some(blob("a.mp4"));
        assert_eq!(draft.validate(), Ok(()));
    }

    #[test]
    fn test_empty_fields_become_none() {
        let mut draft = DraftClip::default();
        assert_eq!(draft.title_field(), None);
        assert_eq!(draft.notes_field(), None);

        draft.title = "Hello".to_string();
        assert_eq!(draft.title_field(), Some("Hello".to_string()));
    }

    #[test]
    fn test_correlation_token_shape() {
        let token = correlation_token();
        let (millis, suffix) = token.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 6);
        assert!(suffix.bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn test_mode_ids() {
        assert_eq!(CameraMode::KidsStory.id(), "kids_story");
        assert_eq!(Category::Wellbeing.id(), "wellbeing");
        assert_eq!(RecordDuration::Unlimited.secs(), 0);
    }
}
