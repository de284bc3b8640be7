/// Offline backend: blobs on disk, records in SQLite.
///
/// Records are stored as JSON documents in a single `records` table keyed by
/// table name. Embedded projections resolve a foreign key `x_id` against the
/// table `xs` (so `video:video_id(user_id)` reads from `videos`).

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};
use tokio::sync::watch;
use uuid::Uuid;

use super::{
    AnalysisResult, AnalysisTrigger, AuthError, BackendError, BlobStore, IdentityProvider,
    InvokeError, PersistError, QueryError, RecordId, RecordQuery, RecordStore, SessionSubscription,
    UploadError, User,
};
use crate::media::MediaBlob;

/// Local, single-user backend rooted in the app data directory
pub struct LocalBackend {
    db_path: PathBuf,
    blob_dir: PathBuf,
    session: watch::Sender<Option<User>>,
}

impl LocalBackend {
    /// Open (or create) the local store under `root`
    pub fn open(root: PathBuf) -> Result<Self, BackendError> {
        let blob_dir = root.join("blobs");
        std::fs::create_dir_all(&blob_dir)?;

        let db_path = root.join("aurevi.db");
        let conn = Connection::open(&db_path)?;
        init_schema(&conn)?;

        // The last signed-in user stays signed in across restarts
        let user = conn
            .query_row(
                "SELECT user_id, email FROM session WHERE slot = 1",
                [],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        email: row.get(1)?,
                    })
                },
            )
            .optional()?;

        let (session, _rx) = watch::channel(user);

        Ok(Self {
            db_path,
            blob_dir,
            session,
        })
    }

    fn object_path(&self, path: &str) -> Result<PathBuf, UploadError> {
        let relative = Path::new(path);
        let clean = !path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !clean {
            return Err(UploadError::InvalidPath(path.to_string()));
        }
        Ok(self.blob_dir.join(relative))
    }
}

/// Create all tables and indexes if they don't exist
fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS records (
            id          TEXT PRIMARY KEY,
            table_name  TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            body        TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_records_table_created
            ON records(table_name, created_at DESC);
        CREATE TABLE IF NOT EXISTS session (
            slot        INTEGER PRIMARY KEY CHECK (slot = 1),
            user_id     TEXT NOT NULL,
            email       TEXT
        );",
    )
}

#[async_trait]
impl IdentityProvider for LocalBackend {
    async fn current_user(&self) -> Result<Option<User>, AuthError> {
        Ok(self.session.borrow().clone())
    }

    fn on_session_change(&self) -> SessionSubscription {
        SessionSubscription::new(self.session.subscribe())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = email.trim().to_lowercase();
        if !email.contains('@') || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let user = User {
            id: email.clone(),
            email: Some(email),
        };

        let db_path = self.db_path.clone();
        let stored = user.clone();
        tokio::task::spawn_blocking(move || -> rusqlite::Result<()> {
            let conn = Connection::open(&db_path)?;
            conn.execute(
                "INSERT INTO session (slot, user_id, email) VALUES (1, ?1, ?2)
                 ON CONFLICT(slot) DO UPDATE SET user_id = excluded.user_id, email = excluded.email",
                params![stored.id, stored.email],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AuthError::Storage(format!("task join error: {}", e)))?
        .map_err(|e| AuthError::Storage(e.to_string()))?;

        tracing::info!(user = %user.id, "🔑 signed in (local)");
        self.session.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> rusqlite::Result<()> {
            let conn = Connection::open(&db_path)?;
            conn.execute("DELETE FROM session WHERE slot = 1", [])?;
            Ok(())
        })
        .await
        .map_err(|e| AuthError::Storage(format!("task join error: {}", e)))?
        .map_err(|e| AuthError::Storage(e.to_string()))?;

        self.session.send_replace(None);
        Ok(())
    }
}

#[async_trait]
impl BlobStore for LocalBackend {
    async fn upload(&self, path: &str, blob: &MediaBlob) -> Result<(), UploadError> {
        let dest = self.object_path(path)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&blob.path, &dest).await?;
        tracing::debug!("📦 stored {} → {}", blob.file_name, dest.display());
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("file://{}", self.blob_dir.join(path).display())
    }
}

#[async_trait]
impl RecordStore for LocalBackend {
    async fn insert(&self, table: &str, record: Value) -> Result<RecordId, PersistError> {
        if !is_identifier(table) {
            return Err(PersistError::Worker(format!("invalid table name: {}", table)));
        }

        let db_path = self.db_path.clone();
        let table = table.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&db_path)?;
            insert_blocking(&conn, &table, record)
        })
        .await
        .map_err(|e| PersistError::Worker(format!("task join error: {}", e)))?
    }

    async fn query(&self, query: &RecordQuery) -> Result<Vec<Value>, QueryError> {
        let db_path = self.db_path.clone();
        let query = query.clone();
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&db_path)?;
            query_blocking(&conn, &query)
        })
        .await
        .map_err(|e| QueryError::Worker(format!("task join error: {}", e)))?
    }
}

#[async_trait]
impl AnalysisTrigger for LocalBackend {
    async fn invoke(&self, function: &str, video_id: &RecordId) -> Result<AnalysisResult, InvokeError> {
        tracing::debug!(function, video_id = %video_id, "no serverless functions offline");
        Err(InvokeError::Unavailable(function.to_string()))
    }
}

fn insert_blocking(conn: &Connection, table: &str, record: Value) -> Result<RecordId, PersistError> {
    let Value::Object(mut body) = record else {
        return Err(PersistError::NotAnObject);
    };

    let id = Uuid::new_v4().to_string();
    let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
    body.insert("id".to_string(), Value::String(id.clone()));
    let created_at = match body.get("created_at") {
        Some(Value::String(existing)) => existing.clone(),
        _ => {
            body.insert("created_at".to_string(), Value::String(created_at.clone()));
            created_at
        }
    };

    conn.execute(
        "INSERT INTO records (id, table_name, created_at, body) VALUES (?1, ?2, ?3, ?4)",
        params![id, table, created_at, serde_json::to_string(&Value::Object(body))?],
    )?;

    Ok(id)
}

fn query_blocking(conn: &Connection, query: &RecordQuery) -> Result<Vec<Value>, QueryError> {
    if !is_identifier(&query.table) {
        return Err(QueryError::InvalidColumn(query.table.clone()));
    }
    let fields = parse_projection(&query.projection)?;

    let (column, direction) = match &query.order {
        Some(order) => (order.column.as_str(), if order.ascending { "ASC" } else { "DESC" }),
        None => ("created_at", "ASC"),
    };
    if !is_identifier(column) {
        return Err(QueryError::InvalidColumn(column.to_string()));
    }
    // SQLite treats a negative LIMIT as "no limit"
    let limit: i64 = query.limit.map(|l| l as i64).unwrap_or(-1);

    let sql = format!(
        "SELECT body FROM records WHERE table_name = ?1
         ORDER BY json_extract(body, ?2) {dir}, rowid {dir} LIMIT ?3",
        dir = direction
    );
    let mut stmt = conn.prepare(&sql)?;
    let bodies = stmt.query_map(params![query.table, format!("$.{}", column), limit], |row| {
        row.get::<_, String>(0)
    })?;

    let mut rows = Vec::new();
    for body in bodies {
        let row: Value = serde_json::from_str(&body?)?;
        rows.push(project(conn, &row, &fields)?);
    }
    Ok(rows)
}

/// One entry of a projection
#[derive(Debug, Clone, PartialEq, Eq)]
enum Field {
    All,
    Column(String),
    Embed {
        alias: String,
        foreign_key: String,
        fields: Vec<Field>,
    },
}

fn parse_projection(input: &str) -> Result<Vec<Field>, QueryError> {
    split_top_level(input)?
        .into_iter()
        .map(parse_field)
        .collect()
}

/// Split on commas that are not inside parentheses
fn split_top_level(input: &str) -> Result<Vec<&str>, QueryError> {
    let invalid = || QueryError::InvalidProjection(input.to_string());

    let mut parts = Vec::new();
    let mut depth: i32 = 0;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(invalid());
                }
            }
            ',' if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(invalid());
    }
    parts.push(&input[start..]);

    if parts.iter().any(|part| part.trim().is_empty()) {
        return Err(invalid());
    }
    Ok(parts)
}

fn parse_field(segment: &str) -> Result<Field, QueryError> {
    let segment = segment.trim();
    if segment == "*" {
        return Ok(Field::All);
    }

    let Some(open) = segment.find('(') else {
        return if is_identifier(segment) {
            Ok(Field::Column(segment.to_string()))
        } else {
            Err(QueryError::InvalidColumn(segment.to_string()))
        };
    };

    if !segment.ends_with(')') {
        return Err(QueryError::InvalidProjection(segment.to_string()));
    }
    let head = &segment[..open];
    let inner = &segment[open + 1..segment.len() - 1];
    let (alias, foreign_key) = match head.split_once(':') {
        Some((alias, key)) => (alias.trim(), key.trim()),
        None => (head.trim(), head.trim()),
    };
    if !is_identifier(alias) || !is_identifier(foreign_key) {
        return Err(QueryError::InvalidProjection(segment.to_string()));
    }

    Ok(Field::Embed {
        alias: alias.to_string(),
        foreign_key: foreign_key.to_string(),
        fields: parse_projection(inner)?,
    })
}

fn project(conn: &Connection, row: &Value, fields: &[Field]) -> Result<Value, QueryError> {
    let mut out = Map::new();
    for field in fields {
        match field {
            Field::All => {
                if let Value::Object(map) = row {
                    for (key, value) in map {
                        out.insert(key.clone(), value.clone());
                    }
                }
            }
            Field::Column(name) => {
                out.insert(name.clone(), row.get(name).cloned().unwrap_or(Value::Null));
            }
            Field::Embed {
                alias,
                foreign_key,
                fields,
            } => {
                let id = match row.get(foreign_key) {
                    Some(Value::String(id)) => Some(id.clone()),
                    Some(Value::Number(n)) => Some(n.to_string()),
                    _ => None,
                };
                let related = match id {
                    Some(id) => fetch_by_id(conn, &related_table(foreign_key), &id)?,
                    None => None,
                };
                let value = match related {
                    Some(related) => project(conn, &related, fields)?,
                    None => Value::Null,
                };
                out.insert(alias.clone(), value);
            }
        }
    }
    Ok(Value::Object(out))
}

fn fetch_by_id(conn: &Connection, table: &str, id: &str) -> Result<Option<Value>, QueryError> {
    let body = conn
        .query_row(
            "SELECT body FROM records WHERE table_name = ?1 AND id = ?2",
            params![table, id],
            |row| row.get::<_, String>(0),
        )
        .optional()?;

    match body {
        Some(body) => Ok(Some(serde_json::from_str(&body)?)),
        None => Ok(None),
    }
}

/// `video_id` → `videos`
fn related_table(foreign_key: &str) -> String {
    let stem = foreign_key.strip_suffix("_id").unwrap_or(foreign_key);
    format!("{}s", stem)
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit())
}
