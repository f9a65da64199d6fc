//! The catalog entry produced by a successful (or deduplicated) generation.
//!
//! See the data model invariants: `id` is catalog-unique, `phash` is
//! deterministic over pixel content, `textureHash` is non-empty whenever
//! `textureUrl` matches the canonical texture URL pattern, and once
//! persisted `value`/`signature`/`textureUrl` never change — only the
//! counters (`duplicateCount`, `viewCount`) mutate.

use serde::{Deserialize, Serialize};

/// Model geometry. `Unknown` only ever appears as an *input* — the validator
/// always resolves it to `Classic` or `Slim` before a record is persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Classic,
    Slim,
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

/// Observability tag for which duplicate-detector probe produced a hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateSource {
    MineskinUrl,
    TextureUrl,
    UserUuid,
    ImageHash,
}

impl DuplicateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicateSource::MineskinUrl => "mineskin_url",
            DuplicateSource::TextureUrl => "texture_url",
            DuplicateSource::UserUuid => "user_uuid",
            DuplicateSource::ImageHash => "image_hash",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Skin {
    pub id: u64,
    pub phash: String,
    pub uuid: String,
    pub name: Option<String>,
    pub variant: Variant,
    pub visibility: Visibility,
    pub value: String,
    pub signature: String,
    pub texture_url: String,
    pub texture_hash: String,
    pub timestamp: i64,
    pub generate_duration_ms: u64,
    pub account_id: u64,
    pub duplicate_count: u64,
    pub view_count: u64,
    pub via: String,
    pub user_agent: Option<String>,
    pub source: Option<String>,
}

impl Skin {
    /// Increment the duplicate counter; called by the detector on every hit.
    pub fn mark_duplicate(&mut self) {
        self.duplicate_count += 1;
    }
}
