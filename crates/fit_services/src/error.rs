//! Errors raised while loading `EngineSettings` from disk.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServicesError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
