use crate::api::{ContentType, ProviderId};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    NoConfigDir,

    #[error("Data directory not found")]
    NoDataDir,

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response from provider: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Provider rejected the request: {0}")]
    UpstreamRejected(String),

    #[error("Unexpected response from provider: {0}")]
    SchemaMismatch(String),

    #[error("{provider} does not support {content}")]
    CapabilityUnavailable {
        provider: ProviderId,
        content: ContentType,
    },

    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("Failed to launch player: {0}")]
    PlayerLaunch(String),

    #[error("No image viewer found (tried: {0})")]
    ViewerNotFound(String),
}

impl Error {
    /// True when the provider never offered the operation, as opposed to the
    /// operation failing.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::CapabilityUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
