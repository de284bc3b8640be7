/// In-memory backend double for tests.
///
/// Records every call so tests can assert on what was uploaded, inserted and
/// invoked, and can be told to fail the n-th upload or insert.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use tokio::sync::watch;

use super::{
    AnalysisResult, AnalysisTrigger, AuthError, BlobStore, IdentityProvider, InvokeError,
    PersistError, QueryError, RecordId, RecordQuery, RecordStore, SessionSubscription, UploadError,
    User,
};
use crate::media::MediaBlob;

/// One call made against the backend, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CurrentUser,
    Upload { path: String, file_name: String },
    Insert { table: String, id: RecordId },
    Query { table: String },
    Invoke { function: String, video_id: RecordId },
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    records: Vec<(String, RecordId, Value)>,
    feed: Vec<Value>,
    uploads_seen: usize,
    inserts_seen: usize,
    fail_upload_at: Option<usize>,
    fail_insert_at: Option<usize>,
    fail_query: bool,
    fail_invoke: bool,
    fail_identity: bool,
}

pub struct MemoryBackend {
    state: Mutex<State>,
    session: watch::Sender<Option<User>>,
}

impl MemoryBackend {
    pub fn signed_in(user_id: &str) -> Self {
        let backend = Self::signed_out();
        backend.session.send_replace(Some(User {
            id: user_id.to_string(),
            email: None,
        }));
        backend
    }

    pub fn signed_out() -> Self {
        let (session, _rx) = watch::channel(None);
        Self {
            state: Mutex::new(State::default()),
            session,
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Fail the n-th upload (1-based)
    pub fn fail_upload_at(&self, n: usize) {
        self.state().fail_upload_at = Some(n);
    }

    /// Fail the n-th insert (1-based)
    pub fn fail_insert_at(&self, n: usize) {
        self.state().fail_insert_at = Some(n);
    }

    pub fn fail_query(&self) {
        self.state().fail_query = true;
    }

    pub fn fail_invoke(&self) {
        self.state().fail_invoke = true;
    }

    pub fn fail_identity(&self) {
        self.state().fail_identity = true;
    }

    /// Rows returned by every query, already projected
    pub fn set_feed(&self, rows: Vec<Value>) {
        self.state().feed = rows;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Calls other than identity lookups
    pub fn network_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| *call != Call::CurrentUser)
            .collect()
    }

    /// Inserted rows of `table`, in insertion order
    pub fn records(&self, table: &str) -> Vec<(RecordId, Value)> {
        self.state()
            .records
            .iter()
            .filter(|(t, _, _)| t == table)
            .map(|(_, id, value)| (id.clone(), value.clone()))
            .collect()
    }
}

#[async_trait]
impl IdentityProvider for MemoryBackend {
    async fn current_user(&self) -> Result<Option<User>, AuthError> {
        let fail = {
            let mut state = self.state();
            state.calls.push(Call::CurrentUser);
            state.fail_identity
        };
        if fail {
            return Err(AuthError::Storage("identity offline".to_string()));
        }
        Ok(self.session.borrow().clone())
    }

    fn on_session_change(&self) -> SessionSubscription {
        SessionSubscription::new(self.session.subscribe())
    }

    async fn sign_in(&self, email: &str, _password: &str) -> Result<User, AuthError> {
        let user = User {
            id: email.to_string(),
            email: Some(email.to_string()),
        };
        self.session.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.session.send_replace(None);
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBackend {
    async fn upload(&self, path: &str, blob: &MediaBlob) -> Result<(), UploadError> {
        let mut state = self.state();
        state.uploads_seen += 1;
        if state.fail_upload_at == Some(state.uploads_seen) {
            return Err(UploadError::Status {
                status: 503,
                body: "storage unavailable".to_string(),
            });
        }
        state.calls.push(Call::Upload {
            path: path.to_string(),
            file_name: blob.file_name.clone(),
        });
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://{}", path)
    }
}

#[async_trait]
impl RecordStore for MemoryBackend {
    async fn insert(&self, table: &str, record: Value) -> Result<RecordId, PersistError> {
        let mut state = self.state();
        state.inserts_seen += 1;
        if state.fail_insert_at == Some(state.inserts_seen) {
            return Err(PersistError::Status {
                status: 409,
                body: "constraint violation".to_string(),
            });
        }
        let id = format!("rec-{}", state.inserts_seen);
        state.calls.push(Call::Insert {
            table: table.to_string(),
            id: id.clone(),
        });
        state.records.push((table.to_string(), id.clone(), record));
        Ok(id)
    }

    async fn query(&self, query: &RecordQuery) -> Result<Vec<Value>, QueryError> {
        let mut state = self.state();
        state.calls.push(Call::Query {
            table: query.table.clone(),
        });
        if state.fail_query {
            return Err(QueryError::Status {
                status: 500,
                body: "boom".to_string(),
            });
        }
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(state.feed.iter().take(limit).cloned().collect())
    }
}

#[async_trait]
impl AnalysisTrigger for MemoryBackend {
    async fn invoke(&self, function: &str, video_id: &RecordId) -> Result<AnalysisResult, InvokeError> {
        let mut state = self.state();
        state.calls.push(Call::Invoke {
            function: function.to_string(),
            video_id: video_id.clone(),
        });
        if state.fail_invoke {
            return Err(InvokeError::Status {
                status: 500,
                body: "model overloaded".to_string(),
            });
        }
        Ok(AnalysisResult {
            video_id: video_id.clone(),
            payload: Value::Null,
        })
    }
}
