/// Preview handles for the clip currently on screen.
///
/// A `PreviewRegistry` plays the role of an object-URL table: acquiring a
/// handle registers the blob under a fresh `preview://` URL, and dropping the
/// handle removes it again. Whoever owns the handle therefore cannot leak it,
/// whether the preview is replaced, the draft is reset, or the screen goes away.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::blob::MediaBlob;

type Entries = Arc<Mutex<HashMap<Uuid, PathBuf>>>;

/// Table of live preview URLs
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    entries: Entries,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `blob` and return a handle owning its preview URL
    pub fn acquire(&self, blob: &MediaBlob) -> PreviewHandle {
        let id = Uuid::new_v4();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(id, blob.path.clone());

        tracing::trace!(%id, file = %blob.file_name, "preview acquired");

        PreviewHandle {
            id,
            url: format!("preview://{}", id),
            file_name: blob.file_name.clone(),
            entries: Arc::clone(&self.entries),
        }
    }

    /// Resolve a preview URL back to the file it points at
    #[cfg(test)]
    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        let id = url.strip_prefix("preview://")?.parse::<Uuid>().ok()?;
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(&id).cloned()
    }

    /// Number of handles not yet released
    #[cfg(test)]
    pub fn live_count(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// An acquired preview URL, released on drop
#[derive(Debug)]
pub struct PreviewHandle {
    id: Uuid,
    url: String,
    file_name: String,
    entries: Entries,
}

impl PreviewHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(&self.id);
        tracing::trace!(id = %self.id, "preview released");
    }
}
