use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a session (settings, URDF, checkpoints).
///
/// The solver itself has no recoverable failure modes: malformed indices or
/// configurations are caller bugs and panic.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("[Settings] cannot read {path:?}: {source}")]
    SettingsIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("[Settings] parsing failed: {0}")]
    SettingsParse(#[from] toml::de::Error),
    #[error("[Settings] {0}")]
    InvalidSettings(String),
    #[error("[Robot] URDF error: {0}")]
    Urdf(#[from] urdf_rs::UrdfError),
    #[error("[Robot] link \"{0}\" was not found in robot urdf")]
    UnknownLink(String),
    #[error("[Robot] chain has {chain} movable joints but {mapped} coordinates are mapped")]
    DofMismatch { chain: usize, mapped: usize },
    #[error("[IK] configuration has {found} coordinates, expected {expected}")]
    ConfigurationSize { expected: usize, found: usize },
    #[error("[IK] checkpoint {path:?}: {reason}")]
    Checkpoint { path: PathBuf, reason: String },
}
