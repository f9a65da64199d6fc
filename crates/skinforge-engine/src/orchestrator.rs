//! Generation orchestrator (spec §4.10). Three entry points share a common
//! tail: change the skin upstream, re-read the result, persist, and release
//! every resource acquired along the way. `url`/`upload` input additionally
//! validates and hashes the pixels before that tail; `user` input resolves
//! straight to a texture URL and skips validation entirely.
//!
//! Temp handles and leased accounts are owned by local variables, so every
//! exit path — including the early returns on a duplicate hit — releases
//! them via `Drop`/`AccountScheduler::release` without needing a dedicated
//! cleanup stage in the code itself.

use std::sync::Arc;
use std::time::Instant;

use base64::Engine;

use skinforge_catalog::{Catalog, CatalogError, IdAllocator, IdAllocatorError, SkinFilter};
use skinforge_core::error::EngineError;
use skinforge_core::request::{GenerateOptions, GenerateRequest, InputKind};
use skinforge_core::skin::{DuplicateSource, Skin, Variant};
use skinforge_core::types::LongUuid;
use skinforge_crypto::SecretCodec;
use skinforge_image::validator::ValidationError;
use skinforge_image::{validate, TempDirKind, TempFileManager};
use skinforge_scheduler::{AccountScheduler, SchedulerError, UseOutcome};
use skinforge_upstream::{
    ensure_authenticated, satisfy_security_challenge, AuthError, DecodedTextures, ProfileResponse,
    SkinChangeBody, Upstream, UpstreamError,
};

use crate::duplicate::{texture_hash_from_url, DuplicateDetector};
use crate::fetch::{FetchError, UrlFetcher};

#[derive(Debug)]
pub enum GenerationOutcome {
    Created(Skin),
    Duplicate { skin: Skin, source: DuplicateSource },
}

pub struct GenerationOrchestrator {
    catalog: Arc<dyn Catalog>,
    scheduler: Arc<AccountScheduler>,
    upstream: Arc<dyn Upstream>,
    fetcher: Arc<dyn UrlFetcher>,
    temp_files: TempFileManager,
    id_allocator: IdAllocator,
    secret_codec: Arc<SecretCodec>,
}

impl GenerationOrchestrator {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        scheduler: Arc<AccountScheduler>,
        upstream: Arc<dyn Upstream>,
        fetcher: Arc<dyn UrlFetcher>,
        temp_files: TempFileManager,
        id_allocator: IdAllocator,
        secret_codec: Arc<SecretCodec>,
    ) -> Self {
        Self {
            catalog,
            scheduler,
            upstream,
            fetcher,
            temp_files,
            id_allocator,
            secret_codec,
        }
    }

    pub async fn from_url(
        &self,
        url: String,
        options: GenerateOptions,
        via: String,
        user_agent: Option<String>,
        source: Option<String>,
        client_ip: Option<String>,
    ) -> Result<GenerationOutcome, EngineError> {
        self.generate(GenerateRequest {
            options,
            input: InputKind::Url(url),
            via,
            user_agent,
            source,
            client_ip,
        })
        .await
    }

    pub async fn from_upload(
        &self,
        bytes: Vec<u8>,
        options: GenerateOptions,
        via: String,
        user_agent: Option<String>,
        source: Option<String>,
        client_ip: Option<String>,
    ) -> Result<GenerationOutcome, EngineError> {
        self.generate(GenerateRequest {
            options,
            input: InputKind::Upload(bytes),
            via,
            user_agent,
            source,
            client_ip,
        })
        .await
    }

    pub async fn from_user(
        &self,
        user_uuid: String,
        options: GenerateOptions,
        via: String,
        user_agent: Option<String>,
        source: Option<String>,
        client_ip: Option<String>,
    ) -> Result<GenerationOutcome, EngineError> {
        self.generate(GenerateRequest {
            options,
            input: InputKind::User(user_uuid),
            via,
            user_agent,
            source,
            client_ip,
        })
        .await
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerationOutcome, EngineError> {
        let start = Instant::now();
        let filter = SkinFilter {
            name: request.options.name.clone(),
            variant: request.options.variant,
            visibility: request.options.visibility,
        };
        let detector = DuplicateDetector::new(self.catalog.as_ref());

        match &request.input {
            InputKind::Url(url) => {
                // The URL-pattern probe runs on the literal input URL, before
                // any network call — a duplicate hit here costs nothing.
                if let Some(hit) = detector.probe_source_url(url, &filter).map_err(catalog_err)? {
                    return Ok(GenerationOutcome::Duplicate {
                        skin: hit.skin,
                        source: hit.source,
                    });
                }

                let bytes = self.fetcher.fetch(url).await.map_err(fetch_err)?;
                self.stage_and_release_temp(TempDirKind::UrlDownload, &bytes)?;

                // Stage C: validate, hash, and probe by perceptual hash.
                let validated = validate(bytes, request.options.variant).map_err(validation_err)?;
                let phash = skinforge_crypto::perceptual_hash(&validated.bytes)
                    .map_err(|e| EngineError::InvalidImage(e.to_string()))?;

                if let Some(hit) = detector.probe_hash(&phash, &filter).map_err(catalog_err)? {
                    return Ok(GenerationOutcome::Duplicate {
                        skin: hit.skin,
                        source: hit.source,
                    });
                }

                let body = SkinChangeBody::Url {
                    variant: variant_str(validated.variant).to_string(),
                    url: url.clone(),
                };

                self.finish_generation(request, start, validated.variant, body, Some(phash), None)
                    .await
            }
            InputKind::Upload(bytes) => {
                self.stage_and_release_temp(TempDirKind::Upload, bytes)?;

                // Stage C: validate, hash, and probe by perceptual hash.
                let validated =
                    validate(bytes.clone(), request.options.variant).map_err(validation_err)?;
                let phash = skinforge_crypto::perceptual_hash(&validated.bytes)
                    .map_err(|e| EngineError::InvalidImage(e.to_string()))?;

                if let Some(hit) = detector.probe_hash(&phash, &filter).map_err(catalog_err)? {
                    return Ok(GenerationOutcome::Duplicate {
                        skin: hit.skin,
                        source: hit.source,
                    });
                }

                let body = SkinChangeBody::File {
                    variant: variant_str(validated.variant).to_string(),
                    bytes: validated.bytes.clone(),
                };

                self.finish_generation(request, start, validated.variant, body, Some(phash), None)
                    .await
            }
            InputKind::User(user_uuid) => {
                // Stage A: just translate to the long/short uuid forms —
                // no download, so Stage C never runs for this input kind.
                let long_uuid =
                    LongUuid::parse(user_uuid).map_err(|_| EngineError::InvalidSkinData)?;

                if let Some(hit) = detector
                    .probe_user_uuid(&long_uuid.to_string(), &filter)
                    .map_err(catalog_err)?
                {
                    return Ok(GenerationOutcome::Duplicate {
                        skin: hit.skin,
                        source: hit.source,
                    });
                }

                let profile = self
                    .upstream
                    .fetch_public_profile(&long_uuid.to_short().to_string())
                    .await
                    .map_err(upstream_err)?;
                let (_, _, texture_url) = decode_textures_property(&profile)?;

                let variant = request.options.variant;
                let body = SkinChangeBody::Url {
                    variant: variant_str(variant).to_string(),
                    url: texture_url,
                };

                self.finish_generation(
                    request,
                    start,
                    variant,
                    body,
                    None,
                    Some(long_uuid.to_string()),
                )
                .await
            }
        }
    }

    /// Stage D onward, shared by every input kind: acquire an account,
    /// authenticate, change the skin, re-read the result, and persist.
    /// `local_phash` is the perceptual hash computed in Stage C, absent for
    /// the `fromUser` path which never downloads or validates pixels — in
    /// that case the hash of the upstream-confirmed texture (Stage E) is
    /// stored instead.
    async fn finish_generation(
        &self,
        request: GenerateRequest,
        start: Instant,
        variant: Variant,
        body: SkinChangeBody,
        local_phash: Option<String>,
        uuid_override: Option<String>,
    ) -> Result<GenerationOutcome, EngineError> {
        let now = chrono::Utc::now().timestamp();
        let mut account = self.scheduler.acquire(now).map_err(scheduler_err)?;

        if let Err(e) = ensure_authenticated(
            &mut account,
            self.upstream.as_ref(),
            &self.secret_codec,
            request.client_ip.as_deref(),
        )
        .await
        {
            let _ = self.scheduler.release(account, UseOutcome::AuthFailure, now);
            return Err(auth_err(e));
        }

        if let Err(e) =
            satisfy_security_challenge(&account, self.upstream.as_ref(), &self.secret_codec).await
        {
            let _ = self.scheduler.release(account, UseOutcome::AuthFailure, now);
            return Err(auth_err(e));
        }

        let access_token = account
            .access_token
            .clone()
            .expect("ensure_authenticated guarantees an access token on success");

        if let Err(e) = self.upstream.change_skin(&access_token, body).await {
            let _ = self.scheduler.release(account, UseOutcome::Error, now);
            return Err(EngineError::SkinChangeFailed(e.to_string()));
        }

        // Stage E: re-read the profile for the newly signed texture.
        let profile = match self.upstream.fetch_profile(&access_token).await {
            Ok(p) => p,
            Err(e) => {
                let _ = self.scheduler.release(account, UseOutcome::Error, now);
                return Err(upstream_err(e));
            }
        };

        let (value, signature, texture_url) = match decode_textures_property(&profile) {
            Ok(t) => t,
            Err(e) => {
                let _ = self.scheduler.release(account, UseOutcome::Error, now);
                return Err(e);
            }
        };

        let mojang_hash = match self.upstream.download(&texture_url).await {
            Ok(texture_bytes) => skinforge_crypto::perceptual_hash(&texture_bytes).ok(),
            Err(_) => None,
        };

        if let (Some(local), Some(remote)) = (local_phash.as_deref(), mojang_hash.as_deref()) {
            if local != remote {
                tracing::warn!(
                    skin_phash = %local,
                    mojang_hash = %remote,
                    "upstream-stored texture hash does not match the locally computed perceptual hash"
                );
            }
        }

        let phash = local_phash.or(mojang_hash).unwrap_or_default();

        // Stage F: allocate an id and persist.
        let id = match self.id_allocator.new_id(self.catalog.as_ref()) {
            Ok(id) => id,
            Err(e) => {
                let _ = self.scheduler.release(account, UseOutcome::Error, now);
                return Err(id_allocator_err(e));
            }
        };

        let skin = Skin {
            id,
            phash,
            uuid: uuid_override.unwrap_or_default(),
            name: request.options.name.clone(),
            variant,
            visibility: request.options.visibility,
            value,
            signature,
            texture_hash: texture_hash_from_url(&texture_url),
            texture_url,
            timestamp: now,
            generate_duration_ms: start.elapsed().as_millis() as u64,
            account_id: account.id,
            duplicate_count: 0,
            view_count: 0,
            via: request.via.clone(),
            user_agent: request.user_agent.clone(),
            source: request.source.clone(),
        };

        let inserted = self.catalog.insert_skin(skin).map_err(catalog_err)?;
        self.scheduler
            .release(account, UseOutcome::Success, now)
            .map_err(scheduler_err)?;

        Ok(GenerationOutcome::Created(inserted))
    }

    /// Writes `bytes` into a fresh temp handle under `kind` and releases it
    /// immediately — Stage A only needs the bytes staged on disk briefly for
    /// provenance; nothing downstream reads the file back.
    fn stage_and_release_temp(&self, kind: TempDirKind, bytes: &[u8]) -> Result<(), EngineError> {
        let mut handle = self
            .temp_files
            .acquire(kind)
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        self.temp_files
            .write(&mut handle, bytes)
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        handle.release();
        Ok(())
    }
}

fn variant_str(variant: Variant) -> &'static str {
    match variant {
        Variant::Classic => "classic",
        Variant::Slim => "slim",
        Variant::Unknown => "classic",
    }
}

/// Decodes the base64 `textures` property on a profile response into
/// `(value, signature, skinUrl)`.
fn decode_textures_property(
    profile: &ProfileResponse,
) -> Result<(String, String, String), EngineError> {
    let property = profile
        .properties
        .iter()
        .find(|p| p.name == "textures")
        .ok_or(EngineError::InvalidSkinData)?;

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(&property.value)
        .map_err(|_| EngineError::InvalidSkinData)?;
    let textures: DecodedTextures =
        serde_json::from_slice(&decoded).map_err(|_| EngineError::InvalidSkinData)?;
    let skin_url = textures
        .textures
        .skin
        .map(|t| t.url)
        .ok_or(EngineError::InvalidSkinData)?;

    Ok((
        property.value.clone(),
        property.signature.clone().unwrap_or_default(),
        skin_url,
    ))
}

fn catalog_err(e: CatalogError) -> EngineError {
    match e {
        CatalogError::Storage(s) => EngineError::Storage(s),
        CatalogError::Serialization(s) => EngineError::Serialization(s),
    }
}

fn scheduler_err(e: SchedulerError) -> EngineError {
    match e {
        SchedulerError::NoAccountAvailable => EngineError::NoAccountAvailable,
        SchedulerError::Catalog(e) => catalog_err(e),
    }
}

fn validation_err(e: ValidationError) -> EngineError {
    EngineError::InvalidImage(e.to_string())
}

fn fetch_err(e: FetchError) -> EngineError {
    EngineError::InvalidImageUrl(e.to_string())
}

fn upstream_err(e: UpstreamError) -> EngineError {
    EngineError::Upstream(e.to_string())
}

fn auth_err(e: AuthError) -> EngineError {
    match e {
        AuthError::Decrypt(_) => EngineError::CredentialUnreadable,
        other => EngineError::Auth(other.to_string()),
    }
}

fn id_allocator_err(e: IdAllocatorError) -> EngineError {
    match e {
        IdAllocatorError::Exhausted { tries } => EngineError::FailedToCreateId { tries },
        IdAllocatorError::Catalog(e) => catalog_err(e),
    }
}
