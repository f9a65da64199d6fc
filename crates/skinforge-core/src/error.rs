use thiserror::Error;

/// The stable error taxonomy the engine can raise. Each variant maps to
/// exactly one `ErrorKind` / HTTP status pair via [`EngineError::kind`] and
/// [`EngineError::http_status`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to allocate a catalog id after {tries} tries")]
    FailedToCreateId { tries: u32 },

    #[error("no eligible account available")]
    NoAccountAvailable,

    #[error("upstream skin-change request failed: {0}")]
    SkinChangeFailed(String),

    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("invalid image url: {0}")]
    InvalidImageUrl(String),

    #[error("upstream profile missing a SKIN texture")]
    InvalidSkinData,

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("stored credential could not be decrypted")]
    CredentialUnreadable,

    #[error("catalog storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("upstream request error: {0}")]
    Upstream(String),
}

/// Machine-readable error kind, mirrored 1:1 onto `EngineError` variants —
/// this is what the outer response envelope's `errorType` field carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FailedToCreateId,
    NoAccountAvailable,
    SkinChangeFailed,
    InvalidImage,
    InvalidImageUrl,
    InvalidSkinData,
    Auth,
    CredentialUnreadable,
    Storage,
    Serialization,
    Upstream,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::FailedToCreateId => "FAILED_TO_CREATE_ID",
            ErrorKind::NoAccountAvailable => "NO_ACCOUNT_AVAILABLE",
            ErrorKind::SkinChangeFailed => "SKIN_CHANGE_FAILED",
            ErrorKind::InvalidImage => "INVALID_IMAGE",
            ErrorKind::InvalidImageUrl => "INVALID_IMAGE_URL",
            ErrorKind::InvalidSkinData => "INVALID_SKIN_DATA",
            ErrorKind::Auth => "AUTH",
            ErrorKind::CredentialUnreadable => "CREDENTIAL_UNREADABLE",
            ErrorKind::Storage => "STORAGE_ERROR",
            ErrorKind::Serialization => "SERIALIZATION_ERROR",
            ErrorKind::Upstream => "UPSTREAM_ERROR",
        }
    }
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::FailedToCreateId { .. } => ErrorKind::FailedToCreateId,
            EngineError::NoAccountAvailable => ErrorKind::NoAccountAvailable,
            EngineError::SkinChangeFailed(_) => ErrorKind::SkinChangeFailed,
            EngineError::InvalidImage(_) => ErrorKind::InvalidImage,
            EngineError::InvalidImageUrl(_) => ErrorKind::InvalidImageUrl,
            EngineError::InvalidSkinData => ErrorKind::InvalidSkinData,
            EngineError::Auth(_) => ErrorKind::Auth,
            EngineError::CredentialUnreadable => ErrorKind::CredentialUnreadable,
            EngineError::Storage(_) => ErrorKind::Storage,
            EngineError::Serialization(_) => ErrorKind::Serialization,
            EngineError::Upstream(_) => ErrorKind::Upstream,
        }
    }

    /// HTTP status the ingress layer should report for this error.
    pub fn http_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidImage | ErrorKind::InvalidImageUrl => 400,
            ErrorKind::NoAccountAvailable => 503,
            ErrorKind::FailedToCreateId
            | ErrorKind::SkinChangeFailed
            | ErrorKind::InvalidSkinData
            | ErrorKind::Auth
            | ErrorKind::CredentialUnreadable
            | ErrorKind::Storage
            | ErrorKind::Serialization
            | ErrorKind::Upstream => 500,
        }
    }

    /// True when this failure, observed while an account was leased, should
    /// be recorded against the account as an `AUTH` failure kind rather than
    /// a generic one (spec.md §4.9: auth failures additionally force a
    /// scheduler timeout on the account).
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, EngineError::Auth(_))
    }
}
