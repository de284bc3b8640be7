/// Personal mission: a tip derived from the user's most recent analysis.
///
/// Fetched once when the Create screen mounts. Best effort: every failure is
/// logged and simply yields no mission.

use serde::Deserialize;
use serde_json::Value;

use crate::backend::{Backend, RecordQuery};

pub const ANALYSIS_TABLE: &str = "video_analysis";
pub const MISSION_PROJECTION: &str = "mood_detected, advice, created_at, video:video_id(user_id)";

/// The latest analysis owned by the current user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalMission {
    pub mood: Option<String>,
    pub advice: Option<String>,
    pub created_at: Option<String>,
}

impl PersonalMission {
    pub fn mood_label(&self) -> String {
        mood_label(self.mood.as_deref())
    }
}

/// Display label for a detected mood tag
pub fn mood_label(tag: Option<&str>) -> String {
    match tag {
        None => "Not detected".to_string(),
        Some("suave") => "Soft / calm".to_string(),
        Some("intenso") => "Intense".to_string(),
        Some("introspectivo") => "Introspective".to_string(),
        Some("jugueton") => "Playful".to_string(),
        Some("terapeutico") => "Therapeutic".to_string(),
        Some(other) => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct AnalysisRow {
    mood_detected: Option<String>,
    advice: Option<String>,
    created_at: Option<String>,
    video: Option<VideoOwner>,
}

#[derive(Debug, Deserialize)]
struct VideoOwner {
    user_id: Option<String>,
}

/// First row whose joined video belongs to `user_id`
pub fn select_mission(rows: &[Value], user_id: &str) -> Option<PersonalMission> {
    rows.iter()
        .filter_map(|row| serde_json::from_value::<AnalysisRow>(row.clone()).ok())
        .find(|row| {
            row.video
                .as_ref()
                .and_then(|video| video.user_id.as_deref())
                == Some(user_id)
        })
        .map(|row| PersonalMission {
            mood: row.mood_detected,
            advice: row.advice,
            created_at: row.created_at,
        })
}

/// Scan the `limit` most recent analyses for one owned by the signed-in user
pub async fn load_personal_mission(backend: &Backend, limit: usize) -> Option<PersonalMission> {
    let user = match backend.identity.current_user().await {
        Ok(Some(user)) => user,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!("⚠️  could not resolve identity for mission: {}", e);
            return None;
        }
    };

    let query = RecordQuery::new(ANALYSIS_TABLE)
        .select(MISSION_PROJECTION)
        .order_by("created_at", false)
        .limit(limit);

    match backend.records.query(&query).await {
        Ok(rows) => {
            let mission = select_mission(&rows, &user.id);
            tracing::debug!(
                "🎯 scanned {} analyses, mission found: {}",
                rows.len(),
                mission.is_some()
            );
            mission
        }
        Err(e) => {
            tracing::warn!("⚠️  could not load personal mission: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{Call, MemoryBackend};
    use serde_json::json;
    use std::sync::Arc;

    fn feed() -> Vec<Value> {
        vec![
            json!({"mood_detected": "intenso", "advice": "not yours", "created_at": "3", "video": {"user_id": "other"}}),
            json!({"mood_detected": null, "advice": "orphan", "created_at": "2", "video": null}),
            json!({"mood_detected": "suave", "advice": "breathe", "created_at": "1", "video": {"user_id": "u1"}}),
            json!({"mood_detected": "jugueton", "advice": "older", "created_at": "0", "video": {"user_id": "u1"}}),
        ]
    }

    #[test]
    fn test_mood_labels() {
        assert_eq!(mood_label(Some("suave")), "Soft / calm");
        assert_eq!(mood_label(Some("terapeutico")), "Therapeutic");
        assert_eq!(mood_label(Some("euforico")), "euforico");
        assert_eq!(mood_label(None), "Not detected");
    }

    #[test]
    fn test_select_first_owned_row() {
        let mission = select_mission(&feed(), "u1").unwrap();
        assert_eq!(mission.advice.as_deref(), Some("breathe"));
        assert_eq!(mission.mood_label(), "Soft / calm");

        assert!(select_mission(&feed(), "nobody").is_none());
    }

    #[tokio::test]
    async fn test_load_mission() {
        let memory = Arc::new(MemoryBackend::signed_in("u1"));
        memory.set_feed(feed());
        let backend = Backend::from_shared(memory.clone());

        let mission = load_personal_mission(&backend, 30).await.unwrap();
        assert_eq!(mission.advice.as_deref(), Some("breathe"));
        assert!(memory.calls().contains(&Call::Query {
            table: ANALYSIS_TABLE.to_string()
        }));
    }

    #[tokio::test]
    async fn test_mission_outside_window_is_missed() {
        let memory = Arc::new(MemoryBackend::signed_in("u1"));
        memory.set_feed(feed());
        let backend = Backend::from_shared(memory);

        assert!(load_personal_mission(&backend, 2).await.is_none());
    }

    #[tokio::test]
    async fn test_signed_out_skips_query() {
        let memory = Arc::new(MemoryBackend::signed_out());
        let backend = Backend::from_shared(memory.clone());

        assert!(load_personal_mission(&backend, 30).await.is_none());
        assert!(memory.network_calls().is_empty());
    }

    #[tokio::test]
    async fn test_query_error_yields_none() {
        let memory = Arc::new(MemoryBackend::signed_in("u1"));
        memory.fail_query();
        let backend = Backend::from_shared(memory);

        assert!(load_personal_mission(&backend, 30).await.is_none());
    }
}
