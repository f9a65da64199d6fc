//! sled-backed implementation of [`Catalog`]. Named trees:
//!
//!   skins    — id (big-endian u64 bytes) → bincode(Skin)
//!   accounts — id (big-endian u64 bytes) → bincode(Account)
//!
//! Lookups by url/uuid/hash scan the `skins` tree and filter in memory —
//! acceptable at the catalog scale this engine targets; fields with no
//! secondary index go through the same iterate-and-filter path.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use skinforge_core::account::Account;
use skinforge_core::skin::Skin;

use crate::catalog::{Catalog, CatalogError, SkinFilter};

/// Internal catalog URL pattern: `…/[0-9]+`.
static CATALOG_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d+)$").unwrap());
/// Canonical upstream texture URL pattern: `…/texture/[0-9a-z]+`.
static TEXTURE_URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/texture/([0-9a-z]+)$").unwrap());

pub struct SledCatalog {
    _db: sled::Db,
    skins: sled::Tree,
    accounts: sled::Tree,
}

impl SledCatalog {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let db = sled::open(path).map_err(|e| CatalogError::Storage(e.to_string()))?;
        let skins = db
            .open_tree("skins")
            .map_err(|e| CatalogError::Storage(e.to_string()))?;
        let accounts = db
            .open_tree("accounts")
            .map_err(|e| CatalogError::Storage(e.to_string()))?;
        Ok(Self {
            _db: db,
            skins,
            accounts,
        })
    }

    fn get_skin(&self, id: u64) -> Result<Option<Skin>, CatalogError> {
        match self
            .skins
            .get(id.to_be_bytes())
            .map_err(|e| CatalogError::Storage(e.to_string()))?
        {
            Some(bytes) => {
                let skin = bincode::deserialize(&bytes)
                    .map_err(|e| CatalogError::Serialization(e.to_string()))?;
                Ok(Some(skin))
            }
            None => Ok(None),
        }
    }

    fn put_skin(&self, skin: &Skin) -> Result<(), CatalogError> {
        let bytes =
            bincode::serialize(skin).map_err(|e| CatalogError::Serialization(e.to_string()))?;
        self.skins
            .insert(skin.id.to_be_bytes(), bytes)
            .map_err(|e| CatalogError::Storage(e.to_string()))?;
        Ok(())
    }

    fn iter_skins(&self) -> Result<Vec<Skin>, CatalogError> {
        let mut out = Vec::new();
        for item in self.skins.iter() {
            let (_, bytes) = item.map_err(|e| CatalogError::Storage(e.to_string()))?;
            out.push(
                bincode::deserialize(&bytes).map_err(|e| CatalogError::Serialization(e.to_string()))?,
            );
        }
        Ok(out)
    }
}

impl Catalog for SledCatalog {
    fn find_skin_by_url_pattern(
        &self,
        canonical_url: &str,
        filter: &SkinFilter,
    ) -> Result<Option<Skin>, CatalogError> {
        if let Some(caps) = CATALOG_ID_RE.captures(canonical_url) {
            if let Ok(id) = caps[1].parse::<u64>() {
                if let Some(skin) = self.get_skin(id)? {
                    if filter.matches(&skin) {
                        return Ok(Some(skin));
                    }
                }
            }
        }

        if let Some(caps) = TEXTURE_URL_RE.captures(canonical_url) {
            let hash = &caps[1];
            for skin in self.iter_skins()? {
                if (skin.texture_url == canonical_url || skin.texture_hash == hash)
                    && filter.matches(&skin)
                {
                    return Ok(Some(skin));
                }
            }
        }

        Ok(None)
    }

    fn find_skin_by_uuid(
        &self,
        uuid: &str,
        filter: &SkinFilter,
    ) -> Result<Option<Skin>, CatalogError> {
        for skin in self.iter_skins()? {
            if skin.uuid == uuid && filter.matches(&skin) {
                return Ok(Some(skin));
            }
        }
        Ok(None)
    }

    fn find_skin_by_hash(
        &self,
        phash: &str,
        filter: &SkinFilter,
    ) -> Result<Option<Skin>, CatalogError> {
        for skin in self.iter_skins()? {
            if skin.phash == phash && filter.matches(&skin) {
                return Ok(Some(skin));
            }
        }
        Ok(None)
    }

    fn insert_skin(&self, skin: Skin) -> Result<Skin, CatalogError> {
        self.put_skin(&skin)?;
        Ok(skin)
    }

    fn exists_skin_id(&self, id: u64) -> Result<bool, CatalogError> {
        self.skins
            .contains_key(id.to_be_bytes())
            .map_err(|e| CatalogError::Storage(e.to_string()))
    }

    fn increment_duplicate(&self, skin: &Skin) -> Result<Skin, CatalogError> {
        let mut updated = skin.clone();
        updated.mark_duplicate();
        self.put_skin(&updated)?;
        Ok(updated)
    }

    fn candidate_accounts(&self) -> Result<Vec<Account>, CatalogError> {
        let mut out = Vec::new();
        for item in self.accounts.iter() {
            let (_, bytes) = item.map_err(|e| CatalogError::Storage(e.to_string()))?;
            out.push(
                bincode::deserialize(&bytes).map_err(|e| CatalogError::Serialization(e.to_string()))?,
            );
        }
        Ok(out)
    }

    fn update_account(&self, account: Account) -> Result<Account, CatalogError> {
        let bytes =
            bincode::serialize(&account).map_err(|e| CatalogError::Serialization(e.to_string()))?;
        self.accounts
            .insert(account.id.to_be_bytes(), bytes)
            .map_err(|e| CatalogError::Storage(e.to_string()))?;
        Ok(account)
    }

    fn get_account(&self, id: u64) -> Result<Option<Account>, CatalogError> {
        match self
            .accounts
            .get(id.to_be_bytes())
            .map_err(|e| CatalogError::Storage(e.to_string()))?
        {
            Some(bytes) => {
                let account = bincode::deserialize(&bytes)
                    .map_err(|e| CatalogError::Serialization(e.to_string()))?;
                Ok(Some(account))
            }
            None => Ok(None),
        }
    }
}
