/// REST client for the hosted backend.
///
/// Wraps the service's HTTP API using [`reqwest`]:
/// - `/auth/v1` for password sign-in and the current user
/// - `/storage/v1` for media objects
/// - `/rest/v1` for table rows (PostgREST-style `select`/`order`/`limit`)
/// - `/functions/v1` for serverless functions

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;

use super::{
    AnalysisResult, AnalysisTrigger, AuthError, BackendError, BlobStore, IdentityProvider,
    InvokeError, PersistError, QueryError, RecordId, RecordQuery, RecordStore, SessionSubscription,
    UploadError, User,
};
use crate::config::AppConfig;
use crate::media::MediaBlob;

/// Timeout for non-upload requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Analysis functions get longer than plain requests
const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(90);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for one backend project
pub struct RemoteBackend {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    bucket: String,
    analysis_timeout: Duration,
    access_token: Mutex<Option<String>>,
    session: watch::Sender<Option<User>>,
}

/// Response of the password grant
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: User,
}

impl RemoteBackend {
    pub fn new(base_url: String, anon_key: String, bucket: String) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        let (session, _rx) = watch::channel(None);
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            bucket,
            analysis_timeout: ANALYSIS_TIMEOUT,
            access_token: Mutex::new(None),
            session,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, BackendError> {
        let url = config.url.clone().ok_or(BackendError::MissingSetting("AUREVI_URL"))?;
        let anon_key = config
            .anon_key
            .clone()
            .ok_or(BackendError::MissingSetting("AUREVI_ANON_KEY"))?;

        let backend = Self::new(url, anon_key, config.bucket.clone())?
            .with_analysis_timeout(Duration::from_secs(config.analysis_timeout_secs));
        if let Some(token) = &config.access_token {
            backend.set_token(Some(token.clone()));
        }
        Ok(backend)
    }

    pub fn with_analysis_timeout(mut self, timeout: Duration) -> Self {
        self.analysis_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn token(&self) -> Option<String> {
        self.access_token
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn set_token(&self, token: Option<String>) {
        *self.access_token.lock().unwrap_or_else(|e| e.into_inner()) = token;
    }

    /// Bearer for data requests: the user's token, or the anon key
    fn bearer(&self) -> String {
        self.token().unwrap_or_else(|| self.anon_key.clone())
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
    }

    /// Object URL inside the configured bucket
    fn object_url(&self, path: &str) -> String {
        format!("/storage/v1/object/{}/{}", self.bucket, path)
    }
}

/// Split a response into its status and body when it is not 2xx
async fn error_body(response: reqwest::Response) -> Result<reqwest::Response, (u16, String)> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err((status.as_u16(), body))
}

/// Content type from the file extension
fn content_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

/// Inserted ids come back as strings or numbers depending on the column type
fn id_from_row(row: &Value) -> Option<RecordId> {
    match row.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl IdentityProvider for RemoteBackend {
    async fn current_user(&self) -> Result<Option<User>, AuthError> {
        let Some(token) = self.token() else {
            return Ok(None);
        };

        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        // An expired or revoked token simply means nobody is signed in
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            self.set_token(None);
            self.session.send_replace(None);
            return Ok(None);
        }

        let response = error_body(response)
            .await
            .map_err(|(status, body)| AuthError::Status { status, body })?;
        let user: User = response.json().await?;
        self.session.send_replace(Some(user.clone()));
        Ok(Some(user))
    }

    fn on_session_change(&self) -> SessionSubscription {
        SessionSubscription::new(self.session.subscribe())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let response = self
            .client
            .post(format!("{}/auth/v1/token", self.base_url))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AuthError::InvalidCredentials);
        }
        let response = error_body(response)
            .await
            .map_err(|(status, body)| AuthError::Status { status, body })?;

        let token: TokenResponse = response.json().await?;
        self.set_token(Some(token.access_token));
        tracing::info!(user = %token.user.id, "🔑 signed in");
        self.session.send_replace(Some(token.user.clone()));
        Ok(token.user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(token) = self.token() {
            let result = self
                .client
                .post(format!("{}/auth/v1/logout", self.base_url))
                .header("apikey", &self.anon_key)
                .bearer_auth(token)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await;
            if let Err(e) = result {
                tracing::warn!("logout request failed, clearing session anyway: {}", e);
            }
        }
        self.set_token(None);
        self.session.send_replace(None);
        Ok(())
    }
}

#[async_trait]
impl BlobStore for RemoteBackend {
    async fn upload(&self, path: &str, blob: &MediaBlob) -> Result<(), UploadError> {
        let bytes = blob.read().await?;
        tracing::debug!("⬆️  uploading {} ({} bytes) to {}", blob.file_name, bytes.len(), path);

        let response = self
            .request(reqwest::Method::POST, &self.object_url(path))
            .header(reqwest::header::CONTENT_TYPE, content_type_for(blob.extension()))
            .body(bytes)
            .send()
            .await?;

        error_body(response)
            .await
            .map_err(|(status, body)| UploadError::Status { status, body })?;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, self.bucket, path)
    }
}

#[async_trait]
impl RecordStore for RemoteBackend {
    async fn insert(&self, table: &str, record: Value) -> Result<RecordId, PersistError> {
        let response = self
            .request(reqwest::Method::POST, &format!("/rest/v1/{}", table))
            .query(&[("select", "id")])
            .header("Prefer", "return=representation")
            .json(&record)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let response = error_body(response)
            .await
            .map_err(|(status, body)| PersistError::Status { status, body })?;

        let rows: Vec<Value> = response.json().await?;
        rows.first().and_then(id_from_row).ok_or(PersistError::MissingId)
    }

    async fn query(&self, query: &RecordQuery) -> Result<Vec<Value>, QueryError> {
        let mut params: Vec<(&str, String)> = vec![("select", query.projection.replace(' ', ""))];
        if let Some(order) = &query.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order", format!("{}.{}", order.column, direction)));
        }
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }

        let response = self
            .request(reqwest::Method::GET, &format!("/rest/v1/{}", query.table))
            .query(&params)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let response = error_body(response)
            .await
            .map_err(|(status, body)| QueryError::Status { status, body })?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl AnalysisTrigger for RemoteBackend {
    async fn invoke(&self, function: &str, video_id: &RecordId) -> Result<AnalysisResult, InvokeError> {
        let response = self
            .request(reqwest::Method::POST, &format!("/functions/v1/{}", function))
            .json(&serde_json::json!({ "video_id": video_id }))
            .timeout(self.analysis_timeout)
            .send()
            .await?;

        let response = error_body(response)
            .await
            .map_err(|(status, body)| InvokeError::Status { status, body })?;

        // Functions may answer with an empty body
        let text = response.text().await?;
        let payload = serde_json::from_str(&text).unwrap_or(Value::String(text));

        Ok(AnalysisResult {
            video_id: video_id.clone(),
            payload,
        })
    }
}
