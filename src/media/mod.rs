/// Media handling module
///
/// This module handles:
/// - Media files picked from disk or captured by the camera (blob.rs)
/// - Preview handles with guaranteed release (preview.rs)
/// - Camera capture through an ffmpeg subprocess (recorder.rs)

pub mod blob;
pub mod preview;
pub mod recorder;

pub use blob::MediaBlob;
pub use preview::{PreviewHandle, PreviewRegistry};
pub use recorder::{CameraRecorder, FfmpegRecorder, RecordRequest, RecorderError};
