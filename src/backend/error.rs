/// Error types for the backend collaborators.

/// Errors from the identity provider
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The auth service returned a non-2xx status code
    #[error("auth service error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("session storage error: {0}")]
    Storage(String),
}

/// Errors from the blob store
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("storage returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid object path: {0}")]
    InvalidPath(String),
}

/// Errors inserting a record
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("database returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record must be a JSON object")]
    NotAnObject,

    #[error("insert did not return an id")]
    MissingId,

    #[error("background task failed: {0}")]
    Worker(String),
}

/// Errors running a query
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("database returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid projection: {0}")]
    InvalidProjection(String),

    #[error("invalid column name: {0}")]
    InvalidColumn(String),

    #[error("background task failed: {0}")]
    Worker(String),
}

/// Errors invoking a serverless function
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("function returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("function {0:?} is not available on this backend")]
    Unavailable(String),
}

/// Errors connecting a backend at startup
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("missing setting: {0}")]
    MissingSetting(&'static str),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
