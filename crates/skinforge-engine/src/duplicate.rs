//! Duplicate detector (spec §4.7). Three deterministic probes, each run at
//! the earliest point its input becomes available. A hit increments the
//! matched record's `duplicateCount` and short-circuits the orchestrator —
//! no upstream call is ever made for a duplicate.

use once_cell::sync::Lazy;
use regex::Regex;

use skinforge_catalog::{Catalog, CatalogError, SkinFilter};
use skinforge_core::skin::{DuplicateSource, Skin};

static CATALOG_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d+)$").unwrap());
static TEXTURE_URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/texture/([0-9a-z]+)$").unwrap());

/// Extracts the last path segment of `url` when it matches the canonical
/// upstream texture URL shape, per the `Skin.textureHash` field contract.
pub fn texture_hash_from_url(url: &str) -> String {
    TEXTURE_URL_RE
        .captures(url)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default()
}

pub struct DuplicateHit {
    pub skin: Skin,
    pub source: DuplicateSource,
}

pub struct DuplicateDetector<'a> {
    catalog: &'a dyn Catalog,
}

impl<'a> DuplicateDetector<'a> {
    pub fn new(catalog: &'a dyn Catalog) -> Self {
        Self { catalog }
    }

    /// Source-URL probe — URL input only, run before download.
    pub fn probe_source_url(
        &self,
        url: &str,
        filter: &SkinFilter,
    ) -> Result<Option<DuplicateHit>, CatalogError> {
        let found = match self.catalog.find_skin_by_url_pattern(url, filter)? {
            Some(skin) => skin,
            None => return Ok(None),
        };

        let source = if CATALOG_ID_RE.is_match(url) {
            DuplicateSource::MineskinUrl
        } else if TEXTURE_URL_RE.is_match(url) {
            DuplicateSource::TextureUrl
        } else {
            DuplicateSource::TextureUrl
        };

        Ok(Some(self.hit(found, source)?))
    }

    /// User-UUID probe — user input only, matched against the long form.
    pub fn probe_user_uuid(
        &self,
        long_uuid: &str,
        filter: &SkinFilter,
    ) -> Result<Option<DuplicateHit>, CatalogError> {
        match self.catalog.find_skin_by_uuid(long_uuid, filter)? {
            Some(skin) => Ok(Some(self.hit(skin, DuplicateSource::UserUuid)?)),
            None => Ok(None),
        }
    }

    /// Perceptual-hash probe — URL and upload inputs, after validation.
    pub fn probe_hash(
        &self,
        phash: &str,
        filter: &SkinFilter,
    ) -> Result<Option<DuplicateHit>, CatalogError> {
        match self.catalog.find_skin_by_hash(phash, filter)? {
            Some(skin) => Ok(Some(self.hit(skin, DuplicateSource::ImageHash)?)),
            None => Ok(None),
        }
    }

    fn hit(&self, skin: Skin, source: DuplicateSource) -> Result<DuplicateHit, CatalogError> {
        let updated = self.catalog.increment_duplicate(&skin)?;
        tracing::debug!(id = updated.id, source = source.as_str(), "duplicate hit");
        Ok(DuplicateHit {
            skin: updated,
            source,
        })
    }
}
