/// Backend collaborators
///
/// The client talks to a backend-as-a-service through four contracts:
/// - `IdentityProvider`: who is signed in, and session change notifications
/// - `BlobStore`: media uploads and their public URLs
/// - `RecordStore`: relational rows with nested projections
/// - `AnalysisTrigger`: serverless function invocation
///
/// Two implementations exist: `remote` speaks the service's REST dialect,
/// `local` keeps everything on disk (SQLite + files) for offline use.

pub mod error;
pub mod local;
pub mod remote;
pub mod session;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{AppConfig, BackendKind};
use crate::media::MediaBlob;

pub use error::{AuthError, BackendError, InvokeError, PersistError, QueryError, UploadError};
pub use session::SessionSubscription;

/// Identifier of an inserted record
pub type RecordId = String;

/// An authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Sort order for a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A relational-style query: table, projection, order, limit.
///
/// Projections are comma separated column names, plus embedded relations
/// written `alias:fk_column(col, ...)` (e.g. `video:video_id(user_id)`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    pub table: String,
    pub projection: String,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl RecordQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            projection: "*".to_string(),
            order: None,
            limit: None,
        }
    }

    pub fn select(mut self, projection: impl Into<String>) -> Self {
        self.projection = projection.into();
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Whatever the analysis function answered
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub video_id: RecordId,
    pub payload: serde_json::Value,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, if any
    async fn current_user(&self) -> Result<Option<User>, AuthError>;

    /// Subscribe to sign-in/sign-out; dropping the subscription unsubscribes
    fn on_session_change(&self) -> SessionSubscription;

    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, path: &str, blob: &MediaBlob) -> Result<(), UploadError>;

    /// Publicly resolvable URL of an uploaded object
    fn public_url(&self, path: &str) -> String;
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert one row and return its identifier
    async fn insert(&self, table: &str, record: serde_json::Value) -> Result<RecordId, PersistError>;

    async fn query(&self, query: &RecordQuery) -> Result<Vec<serde_json::Value>, QueryError>;
}

#[async_trait]
pub trait AnalysisTrigger: Send + Sync {
    async fn invoke(&self, function: &str, video_id: &RecordId) -> Result<AnalysisResult, InvokeError>;
}

/// The set of collaborators handed to screens
#[derive(Clone)]
pub struct Backend {
    pub identity: Arc<dyn IdentityProvider>,
    pub blobs: Arc<dyn BlobStore>,
    pub records: Arc<dyn RecordStore>,
    pub analysis: Arc<dyn AnalysisTrigger>,
}

impl Backend {
    /// Build every collaborator from one implementation
    pub fn from_shared<T>(inner: Arc<T>) -> Self
    where
        T: IdentityProvider + BlobStore + RecordStore + AnalysisTrigger + 'static,
    {
        Self {
            identity: inner.clone(),
            blobs: inner.clone(),
            records: inner.clone(),
            analysis: inner,
        }
    }

    /// Connect the backend selected in the configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, BackendError> {
        match config.backend {
            BackendKind::Local => {
                let local = local::LocalBackend::open(config.data_dir.clone())?;
                tracing::info!("📁 local backend at {}", config.data_dir.display());
                Ok(Self::from_shared(Arc::new(local)))
            }
            BackendKind::Remote => {
                let remote = remote::RemoteBackend::from_config(config)?;
                tracing::info!("☁️  remote backend at {}", remote.base_url());
                Ok(Self::from_shared(Arc::new(remote)))
            }
        }
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").finish_non_exhaustive()
    }
}
