//! Read/update abstraction the engine consumes (spec §4.6). Storage is
//! plug-replaceable — [`crate::SledCatalog`] is the implementation shipped
//! in-tree, but any transactional store can implement this trait.

use thiserror::Error;

use skinforge_core::account::Account;
use skinforge_core::skin::{Skin, Variant, Visibility};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// The `(name, variant, visibility)` tuple is part of a skin's identity —
/// every lookup in the duplicate detector is filtered by it (spec §4.7).
#[derive(Clone, Debug)]
pub struct SkinFilter {
    pub name: Option<String>,
    pub variant: Variant,
    pub visibility: Visibility,
}

impl SkinFilter {
    pub fn matches(&self, skin: &Skin) -> bool {
        skin.name == self.name && skin.variant == self.variant && skin.visibility == self.visibility
    }
}

pub trait Catalog: Send + Sync {
    fn find_skin_by_url_pattern(
        &self,
        canonical_url: &str,
        filter: &SkinFilter,
    ) -> Result<Option<Skin>, CatalogError>;

    fn find_skin_by_uuid(
        &self,
        uuid: &str,
        filter: &SkinFilter,
    ) -> Result<Option<Skin>, CatalogError>;

    fn find_skin_by_hash(
        &self,
        phash: &str,
        filter: &SkinFilter,
    ) -> Result<Option<Skin>, CatalogError>;

    fn insert_skin(&self, skin: Skin) -> Result<Skin, CatalogError>;

    fn exists_skin_id(&self, id: u64) -> Result<bool, CatalogError>;

    fn increment_duplicate(&self, skin: &Skin) -> Result<Skin, CatalogError>;

    /// Returns eligible accounts ordered by `(lastUsedSec, lastSelectedSec,
    /// sameTextureCounter)` ascending, excluding anything in `locked`. The
    /// scheduler applies the eligibility predicate itself; the catalog only
    /// needs to return candidates for it to filter and order — but for a
    /// store capable of pushing the predicate down, that's an optimization,
    /// not a contract change.
    fn candidate_accounts(&self) -> Result<Vec<Account>, CatalogError>;

    fn update_account(&self, account: Account) -> Result<Account, CatalogError>;

    fn get_account(&self, id: u64) -> Result<Option<Account>, CatalogError>;
}
