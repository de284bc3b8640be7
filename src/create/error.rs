use crate::backend::{PersistError, UploadError};

/// Draft problems caught before any network call
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Select a video file (or record one).")]
    MissingMedia,

    #[error("In duet mode you need to record part one first.")]
    MissingFirstTake,
}

impl ValidationError {
    /// Stable machine-readable code
    pub fn code(self) -> &'static str {
        match self {
            ValidationError::MissingMedia => "missing_media",
            ValidationError::MissingFirstTake => "missing_first_take",
        }
    }
}

/// Error type for the submission pipeline
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("You need to sign in to upload videos to AUREVI.")]
    AuthRequired,

    #[error("Upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error("Saving the video failed: {0}")]
    Persist(#[from] PersistError),
}
