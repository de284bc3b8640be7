/// Application configuration
///
/// Settings come from the environment (a `.env` file is loaded first in
/// `main`). Everything has a default except the remote backend's URL and key.

use std::path::PathBuf;

/// Which backend implementation to connect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// SQLite + files under the data directory
    Local,
    /// Hosted backend over HTTP
    Remote,
}

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("AUREVI_BACKEND must be \"local\" or \"remote\", got {0:?}")]
    InvalidBackend(String),

    #[error("{key} must be set when AUREVI_BACKEND=remote")]
    Missing { key: &'static str },

    #[error("{key} must be a positive number, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("could not determine the user data directory")]
    NoDataDir,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: BackendKind,
    /// Base URL of the hosted backend
    pub url: Option<String>,
    /// Public (anon) API key of the hosted backend
    pub anon_key: Option<String>,
    /// Pre-existing session token, if any
    pub access_token: Option<String>,
    /// Storage bucket for uploaded clips
    pub bucket: String,
    /// How many recent analyses to scan for the personal mission
    pub mission_feed_limit: usize,
    /// Serverless function triggered after each submission
    pub analysis_function: String,
    /// How long to wait for the analysis function before giving up
    pub analysis_timeout_secs: u64,
    /// ffmpeg binary used by the camera recorder
    pub ffmpeg: String,
    /// Camera device passed to ffmpeg (platform default when unset)
    pub camera_device: Option<String>,
    /// Root of the local backend
    pub data_dir: PathBuf,
    /// Where camera captures are written
    pub capture_dir: PathBuf,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key/value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let backend = match get("AUREVI_BACKEND").as_deref() {
            None | Some("local") => BackendKind::Local,
            Some("remote") => BackendKind::Remote,
            Some(other) => return Err(ConfigError::InvalidBackend(other.to_string())),
        };

        let url = get("AUREVI_URL");
        let anon_key = get("AUREVI_ANON_KEY");
        if backend == BackendKind::Remote {
            if url.is_none() {
                return Err(ConfigError::Missing { key: "AUREVI_URL" });
            }
            if anon_key.is_none() {
                return Err(ConfigError::Missing { key: "AUREVI_ANON_KEY" });
            }
        }

        let positive = |key: &'static str, default: usize| match get(key) {
            None => Ok(default),
            Some(value) => match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(ConfigError::InvalidNumber { key, value }),
            },
        };
        let mission_feed_limit = positive("AUREVI_MISSION_FEED_LIMIT", 30)?;
        let analysis_timeout_secs = positive("AUREVI_ANALYSIS_TIMEOUT_SECS", 90)? as u64;

        let data_dir = match get("AUREVI_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => {
                let mut path = dirs::data_dir()
                    .or_else(dirs::home_dir)
                    .ok_or(ConfigError::NoDataDir)?;
                path.push("aurevi");
                path
            }
        };

        let capture_dir = match dirs::cache_dir() {
            Some(mut path) => {
                path.push("aurevi");
                path.push("captures");
                path
            }
            None => data_dir.join("captures"),
        };

        Ok(Self {
            backend,
            url,
            anon_key,
            access_token: get("AUREVI_ACCESS_TOKEN"),
            bucket: get("AUREVI_BUCKET").unwrap_or_else(|| "aurevi-videos".to_string()),
            mission_feed_limit,
            analysis_function: get("AUREVI_ANALYSIS_FUNCTION")
                .unwrap_or_else(|| "analyze-video".to_string()),
            analysis_timeout_secs,
            ffmpeg: get("AUREVI_FFMPEG").unwrap_or_else(|| "ffmpeg".to_string()),
            camera_device: get("AUREVI_CAMERA_DEVICE"),
            data_dir,
            capture_dir,
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            backend: BackendKind::Remote,
            url: Some("https://project.example.co".to_string()),
            anon_key: Some("anon".to_string()),
            access_token: None,
            bucket: "aurevi-videos".to_string(),
            mission_feed_limit: 30,
            analysis_function: "analyze-video".to_string(),
            analysis_timeout_secs: 90,
            ffmpeg: "ffmpeg".to_string(),
            camera_device: None,
            data_dir: PathBuf::from("/tmp/aurevi-test"),
            capture_dir: PathBuf::from("/tmp/aurevi-test/captures"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("AUREVI_DATA_DIR", "/data/aurevi")]).unwrap();
        assert_eq!(config.backend, BackendKind::Local);
        assert_eq!(config.bucket, "aurevi-videos");
        assert_eq!(config.mission_feed_limit, 30);
        assert_eq!(config.analysis_function, "analyze-video");
        assert_eq!(config.analysis_timeout_secs, 90);
        assert_eq!(config.ffmpeg, "ffmpeg");
        assert_eq!(config.data_dir, PathBuf::from("/data/aurevi"));
    }

    #[test]
    fn test_remote_requires_url_and_key() {
        assert_matches!(
            load(&[("AUREVI_BACKEND", "remote"), ("AUREVI_ANON_KEY", "k")]),
            Err(ConfigError::Missing { key: "AUREVI_URL" })
        );
        assert_matches!(
            load(&[("AUREVI_BACKEND", "remote"), ("AUREVI_URL", "https://x")]),
            Err(ConfigError::Missing { key: "AUREVI_ANON_KEY" })
        );

        let config = load(&[
            ("AUREVI_BACKEND", "remote"),
            ("AUREVI_URL", "https://x"),
            ("AUREVI_ANON_KEY", "k"),
            ("AUREVI_DATA_DIR", "/d"),
        ])
        .unwrap();
        assert_eq!(config.backend, BackendKind::Remote);
    }

    #[test]
    fn test_rejects_unknown_backend_and_bad_numbers() {
        assert_matches!(load(&[("AUREVI_BACKEND", "cloud")]), Err(ConfigError::InvalidBackend(_)));
        assert_matches!(
            load(&[("AUREVI_MISSION_FEED_LIMIT", "0"), ("AUREVI_DATA_DIR", "/d")]),
            Err(ConfigError::InvalidNumber { .. })
        );
        assert_matches!(
            load(&[("AUREVI_MISSION_FEED_LIMIT", "lots"), ("AUREVI_DATA_DIR", "/d")]),
            Err(ConfigError::InvalidNumber { .. })
        );
        assert_matches!(
            load(&[("AUREVI_ANALYSIS_TIMEOUT_SECS", "-5"), ("AUREVI_DATA_DIR", "/d")]),
            Err(ConfigError::InvalidNumber { key: "AUREVI_ANALYSIS_TIMEOUT_SECS", .. })
        );
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = load(&[("AUREVI_BUCKET", "  "), ("AUREVI_DATA_DIR", "/d")]).unwrap();
        assert_eq!(config.bucket, "aurevi-videos");
    }
}
