/// Submission pipeline: upload each take, insert its row, trigger analysis.
///
/// Steps run strictly in order and are not transactional. A failure aborts
/// the remaining steps but leaves anything already stored in place.

use serde::Serialize;

use super::draft::{correlation_token, CameraMode, Category, DraftClip};
use super::error::{SubmitError, ValidationError};
use crate::backend::{Backend, RecordId, User};
use crate::media::MediaBlob;

/// Table receiving one row per uploaded take
pub const VIDEOS_TABLE: &str = "videos";

/// Form fields shared by every take of a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Category,
    pub camera_mode: CameraMode,
    pub notes: Option<String>,
}

/// Media to upload, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Takes {
    Single(MediaBlob),
    Duet {
        first: MediaBlob,
        second: MediaBlob,
        group_id: String,
    },
}

/// A validated submission; holding one means the draft passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPlan {
    pub fields: ClipFields,
    pub takes: Takes,
}

impl SubmissionPlan {
    pub fn from_draft(draft: &DraftClip) -> Result<Self, ValidationError> {
        draft.validate()?;
        let primary = draft.primary.clone().ok_or(ValidationError::MissingMedia)?;

        let takes = if draft.camera_mode == CameraMode::Duet {
            let first = draft
                .duet
                .first_take
                .clone()
                .ok_or(ValidationError::MissingFirstTake)?;
            Takes::Duet {
                first,
                second: primary,
                group_id: draft.duet.group_id.clone().unwrap_or_else(correlation_token),
            }
        } else {
            Takes::Single(primary)
        };

        Ok(Self {
            fields: ClipFields {
                title: draft.title_field(),
                description: draft.description_field(),
                category: draft.category,
                camera_mode: draft.camera_mode,
                notes: draft.notes_field(),
            },
            takes,
        })
    }

    pub fn is_duet(&self) -> bool {
        matches!(self.takes, Takes::Duet { .. })
    }
}

/// Row written to the `videos` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedVideoRecord {
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_url: String,
    pub user_id: String,
    pub category: Category,
    pub camera_mode: CameraMode,
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duet_step: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duet_group_id: Option<String>,
}

/// What a successful submission produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Inserted ids, in upload order
    pub record_ids: Vec<RecordId>,
    pub duet: bool,
}

impl SubmitOutcome {
    /// The record the analysis runs on (the last one inserted)
    pub fn primary_id(&self) -> Option<&RecordId> {
        self.record_ids.last()
    }

    pub fn status_message(&self) -> String {
        let uploaded = if self.duet {
            "Duet uploaded to AUREVI."
        } else {
            "Video uploaded to AUREVI."
        };
        format!("{} Analyzing your video with the creative mentor...", uploaded)
    }
}

/// `<user_id>/<unix-ms>-<6 base36>.<ext>`
pub fn upload_path(user_id: &str, blob: &MediaBlob) -> String {
    format!("{}/{}.{}", user_id, correlation_token(), blob.extension())
}

/// Run the whole pipeline for one plan
pub async fn submit(
    backend: &Backend,
    plan: SubmissionPlan,
    analysis_function: &str,
) -> Result<SubmitOutcome, SubmitError> {
    let user = match backend.identity.current_user().await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(SubmitError::AuthRequired),
        Err(e) => {
            tracing::warn!("⚠️  could not resolve identity: {}", e);
            return Err(SubmitError::AuthRequired);
        }
    };

    let duet = plan.is_duet();
    let mut record_ids = Vec::with_capacity(2);

    match &plan.takes {
        Takes::Single(blob) => {
            record_ids.push(upload_and_insert(backend, &user, &plan.fields, blob, None).await?);
        }
        Takes::Duet {
            first,
            second,
            group_id,
        } => {
            for (step, blob) in [(1u8, first), (2u8, second)] {
                let id = upload_and_insert(
                    backend,
                    &user,
                    &plan.fields,
                    blob,
                    Some((step, group_id.as_str())),
                )
                .await?;
                record_ids.push(id);
            }
        }
    }

    let outcome = SubmitOutcome { record_ids, duet };

    if let Some(video_id) = outcome.primary_id() {
        match backend.analysis.invoke(analysis_function, video_id).await {
            Ok(result) => {
                tracing::info!("🧠 analysis started for {}", result.video_id);
                tracing::debug!("analysis answered {}", result.payload);
            }
            Err(e) => tracing::warn!("⚠️  analysis for {} failed: {}", video_id, e),
        }
    }

    Ok(outcome)
}

/// Upload one take and insert its row
async fn upload_and_insert(
    backend: &Backend,
    user: &User,
    fields: &ClipFields,
    blob: &MediaBlob,
    duet: Option<(u8, &str)>,
) -> Result<RecordId, SubmitError> {
    let path = upload_path(&user.id, blob);
    tracing::debug!(
        category = fields.category.id(),
        camera_mode = fields.camera_mode.id(),
        "⬆️  uploading {} ({}) to {}",
        blob.file_name,
        blob.display_size(),
        path
    );
    backend.blobs.upload(&path, blob).await?;

    let record = SubmittedVideoRecord {
        title: fields.title.clone(),
        description: fields.description.clone(),
        video_url: backend.blobs.public_url(&path),
        user_id: user.id.clone(),
        category: fields.category,
        camera_mode: fields.camera_mode,
        notes: fields.notes.clone(),
        duet_step: duet.map(|(step, _)| step),
        duet_group_id: duet.map(|(_, group)| group.to_string()),
    };

    let value = serde_json::to_value(&record).map_err(crate::backend::PersistError::Json)?;
    let id = backend.records.insert(VIDEOS_TABLE, value).await?;
    tracing::info!("💾 saved video {}", id);
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{Call, MemoryBackend};
    use assert_matches::assert_matches;
    use serde_json::json;
    use std::sync::Arc;

    fn blob(name: &str) -> MediaBlob {
        MediaBlob::new(name, format!("/tmp/{}", name), 2048)
    }

    fn fields() -> ClipFields {
        ClipFields {
            title: Some("Hello".to_string()),
            description: None,
            category: Category::Music,
            camera_mode: CameraMode::Normal,
            notes: None,
        }
    }

    fn duet_plan() -> SubmissionPlan {
        SubmissionPlan {
            fields: ClipFields {
                camera_mode: CameraMode::Duet,
                ..fields()
            },
            takes: Takes::Duet {
                first: blob("a.webm"),
                second: blob("b.webm"),
                group_id: "G".to_string(),
            },
        }
    }

    fn setup(user: Option<&str>) -> (Arc<MemoryBackend>, Backend) {
        let memory = Arc::new(match user {
            Some(id) => MemoryBackend::signed_in(id),
            None => MemoryBackend::signed_out(),
        });
        let backend = Backend::from_shared(memory.clone());
        (memory, backend)
    }

    #[test]
    fn test_upload_path_shape() {
        let path = upload_path("user-1", &blob("holiday.final.mp4"));
        let (user, name) = path.split_once('/').unwrap();
        assert_eq!(user, "user-1");
        assert!(name.ends_with(".mp4"));
        assert_eq!(name.trim_end_matches(".mp4").split('-').count(), 2);

        let bare = upload_path("u", &blob("clip"));
        assert!(bare.ends_with(".clip"));
    }

    #[test]
    fn test_record_serialization() {
        let record = SubmittedVideoRecord {
            title: None,
            description: None,
            video_url: "https://x/v.mp4".to_string(),
            user_id: "u".to_string(),
            category: Category::Kids,
            camera_mode: CameraMode::KidsStory,
            notes: None,
            duet_step: None,
            duet_group_id: None,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["title"], json!(null));
        assert_eq!(value["category"], json!("kids"));
        assert_eq!(value["camera_mode"], json!("kids_story"));
        assert!(value.get("duet_step").is_none());
        assert!(value.get("duet_group_id").is_none());
    }

    #[tokio::test]
    async fn test_single_clip_inserts_one_record() {
        let (memory, backend) = setup(Some("u1"));
        let plan = SubmissionPlan {
            fields: fields(),
            takes: Takes::Single(blob("clip.mp4")),
        };

        let outcome = submit(&backend, plan, "analyze-video").await.unwrap();

        let records = memory.records(VIDEOS_TABLE);
        assert_eq!(records.len(), 1);
        let (id, row) = &records[0];
        assert_eq!(row["category"], json!("music"));
        assert_eq!(row["user_id"], json!("u1"));
        assert!(row.get("duet_step").is_none());
        assert!(row["video_url"].as_str().unwrap().starts_with("memory://u1/"));

        assert_eq!(outcome.primary_id(), Some(id));
        assert!(outcome.status_message().starts_with("Video uploaded to AUREVI."));
        assert!(memory.calls().contains(&Call::Invoke {
            function: "analyze-video".to_string(),
            video_id: id.clone(),
        }));
    }

    #[tokio::test]
    async fn test_duet_inserts_two_records_sharing_group() {
        let (memory, backend) = setup(Some("u1"));

        let outcome = submit(&backend, duet_plan(), "analyze-video").await.unwrap();

        let records = memory.records(VIDEOS_TABLE);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].1["duet_step"], json!(1));
        assert_eq!(records[1].1["duet_step"], json!(2));
        assert_eq!(records[0].1["duet_group_id"], json!("G"));
        assert_eq!(records[1].1["duet_group_id"], json!("G"));

        let second_id = records[1].0.clone();
        assert_eq!(outcome.primary_id(), Some(&second_id));
        assert!(outcome.status_message().starts_with("Duet uploaded to AUREVI."));

        let invocations: Vec<_> = memory
            .calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Invoke { .. }))
            .collect();
        assert_eq!(
            invocations,
            vec![Call::Invoke {
                function: "analyze-video".to_string(),
                video_id: second_id,
            }]
        );
    }

    #[tokio::test]
    async fn test_second_upload_failure_keeps_first_record() {
        let (memory, backend) = setup(Some("u1"));
        memory.fail_upload_at(2);

        let result = submit(&backend, duet_plan(), "analyze-video").await;

        assert_matches!(result, Err(SubmitError::Upload(_)));
        let records = memory.records(VIDEOS_TABLE);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1["duet_step"], json!(1));
        assert!(!memory.calls().iter().any(|call| matches!(call, Call::Invoke { .. })));
    }

    #[tokio::test]
    async fn test_insert_failure_reports_persist() {
        let (memory, backend) = setup(Some("u1"));
        memory.fail_insert_at(1);

        let plan = SubmissionPlan {
            fields: fields(),
            takes: Takes::Single(blob("clip.mp4")),
        };
        let result = submit(&backend, plan, "analyze-video").await;

        assert_matches!(result, Err(SubmitError::Persist(_)));
        // the blob stays uploaded
        assert_eq!(
            memory
                .calls()
                .iter()
                .filter(|call| matches!(call, Call::Upload { .. }))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_requires_signed_in_user() {
        let (memory, backend) = setup(None);

        let result = submit(&backend, duet_plan(), "analyze-video").await;

        assert_matches!(result, Err(SubmitError::AuthRequired));
        assert!(memory.network_calls().is_empty());
    }

    #[tokio::test]
    async fn test_identity_error_counts_as_signed_out() {
        let (memory, backend) = setup(Some("u1"));
        memory.fail_identity();

        let plan = SubmissionPlan {
            fields: fields(),
            takes: Takes::Single(blob("clip.mp4")),
        };
        let result = submit(&backend, plan, "analyze-video").await;

        assert_matches!(result, Err(SubmitError::AuthRequired));
    }

    #[tokio::test]
    async fn test_analysis_failure_is_swallowed() {
        let (memory, backend) = setup(Some("u1"));
        memory.fail_invoke();

        let plan = SubmissionPlan {
            fields: fields(),
            takes: Takes::Single(blob("clip.mp4")),
        };
        let outcome = submit(&backend, plan, "analyze-video").await.unwrap();

        assert_eq!(outcome.record_ids.len(), 1);
    }

    #[tokio::test]
    async fn test_music_clip_from_form_to_reset() {
        use crate::create::flow::{CreateEvent, CreateFlow, Effect};
        use crate::media::PreviewRegistry;

        let (memory, backend) = setup(Some("u1"));
        let registry = PreviewRegistry::new();
        let mut flow = CreateFlow::new(registry.clone());

        flow.apply(CreateEvent::TitleChanged("Hello".to_string()));
        flow.apply(CreateEvent::CategorySelected(Category::Music));
        flow.apply(CreateEvent::FilePicked(Ok(Some(blob("file.mp4")))));

        let plan = match flow.apply(CreateEvent::Submit) {
            Some(Effect::Submit(plan)) => plan,
            other => panic!("expected a submit effect, got {:?}", other),
        };
        let result = submit(&backend, plan, "analyze-video").await.map_err(Arc::new);
        assert_eq!(flow.apply(CreateEvent::SubmitFinished(result)), None);

        let records = memory.records(VIDEOS_TABLE);
        assert_eq!(records.len(), 1);
        let (_, row) = &records[0];
        assert_eq!(row["title"], json!("Hello"));
        assert_eq!(row["category"], json!("music"));
        assert_eq!(row["user_id"], json!("u1"));
        assert!(row.get("duet_step").is_none());

        assert!(flow.status().starts_with("Video uploaded to AUREVI."));
        assert!(flow.error().is_none());
        assert_eq!(flow.draft(), &DraftClip::default());
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_plan_from_duet_draft() {
        let mut draft = DraftClip::default();
        draft.camera_mode = CameraMode::Duet;
        draft.primary = Some(blob("b.webm"));
        assert_eq!(
            SubmissionPlan::from_draft(&draft),
            Err(ValidationError::MissingFirstTake)
        );

        draft.duet.first_take = Some(blob("a.webm"));
        draft.duet.group_id = Some("G".to_string());
        let plan = SubmissionPlan::from_draft(&draft).unwrap();
        assert_eq!(
            plan.takes,
            Takes::Duet {
                first: blob("a.webm"),
                second: blob("b.webm"),
                group_id: "G".to_string(),
            }
        );
    }

    #[test]
    fn test_plan_assigns_group_when_missing() {
        let mut draft = DraftClip::default();
        draft.camera_mode = CameraMode::Duet;
        draft.primary = Some(blob("b.webm"));
        draft.duet.first_take = Some(blob("a.webm"));

        let plan = SubmissionPlan::from_draft(&draft).unwrap();
        assert_matches!(plan.takes, Takes::Duet { group_id, .. } if !group_id.is_empty());
    }
}
