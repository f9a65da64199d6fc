use serde::{Deserialize, Serialize};

use crate::skin::{Variant, Visibility};

/// User-provided metadata that, together, form part of a skin's identity —
/// two uploads of identical pixels under different names are not duplicates.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerateOptions {
    pub name: Option<String>,
    #[serde(default)]
    pub variant: Variant,
    #[serde(default)]
    pub visibility: Visibility,
}

impl Default for Variant {
    fn default() -> Self {
        Variant::Unknown
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Public
    }
}

/// The shape of a single generation attempt, already validated by the
/// ingress layer — the core never parses raw HTTP bodies.
#[derive(Clone, Debug)]
pub struct GenerateRequest {
    pub options: GenerateOptions,
    pub input: InputKind,
    pub via: String,
    pub user_agent: Option<String>,
    pub source: Option<String>,
    /// Forwarded to the upstream as `X-Forwarded-For` during authentication.
    pub client_ip: Option<String>,
}

#[derive(Clone, Debug)]
pub enum InputKind {
    Url(String),
    Upload(Vec<u8>),
    User(String),
}
