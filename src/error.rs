use serde::Serialize;

/// All errors that can occur while generating and packaging a project.
#[derive(Debug, thiserror::Error)]
pub enum ArchitectError {
    /// The model answered, but the answer is empty, not JSON, or does not
    /// match the declared output schema. Never retried.
    #[error("Provider error: {0}")]
    Provider(String),

    /// The provider reported rate limiting or an exhausted quota.
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Empty manifest, or the zip writer failed.
    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Build cancelled")]
    Cancelled,

    #[error("A build is already in progress")]
    BuildInProgress,

    #[error("{0}")]
    Custom(String),
}

impl ArchitectError {
    /// True for the transient rate-limit class, the only one worth retrying.
    pub fn is_quota(&self) -> bool {
        matches!(self, ArchitectError::QuotaExceeded(_))
    }
}

// Errors travel inside JSON build reports as plain strings.
impl Serialize for ArchitectError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ArchitectError>;
