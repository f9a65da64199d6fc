//! ─── Generation Engine constants ────────────────────────────────────────────
//!
//! Tunables referenced throughout the core. Values mirror the production
//! defaults described by the engine's design document; operators override
//! the handful that are exposed as configuration (see `skinforge-node`'s CLI
//! args) rather than editing these.

// ── Account eligibility windows (seconds) ────────────────────────────────────

/// An account's `errorCounter` must stay below this for it to remain eligible.
pub const ERROR_THRESHOLD: u32 = 10;

/// Minimum age of an account before it is eligible for selection.
pub const ACCOUNT_MIN_AGE_SECS: i64 = 60;

/// Minimum idle time since an account was last used for a successful change.
pub const ACCOUNT_USE_COOLDOWN_SECS: i64 = 100;

/// Minimum idle time since an account was last handed to any orchestrator.
pub const ACCOUNT_SELECT_COOLDOWN_SECS: i64 = 50;

/// Minimum time since a forced (auth-failure) timeout before re-eligibility.
pub const ACCOUNT_FORCED_TIMEOUT_SECS: i64 = 500;

/// Base per-request cooldown hint, divided by the usable account count.
pub const MIN_ACCOUNT_DELAY_SECS: i64 = 2;

// ── Image validation ─────────────────────────────────────────────────────────

pub const MIN_IMAGE_BYTES: usize = 100;
pub const MAX_IMAGE_BYTES: usize = 20_000;

pub const SKIN_WIDTH: u32 = 64;
pub const SKIN_HEIGHT_CLASSIC: u32 = 32;
pub const SKIN_HEIGHT_MODERN: u32 = 64;

/// Rectangle inspected for slim/classic arm-width inference: x in [54,56), y in [20,32).
pub const VARIANT_RECT_X: (u32, u32) = (54, 56);
pub const VARIANT_RECT_Y: (u32, u32) = (20, 32);

// ── ID allocator ─────────────────────────────────────────────────────────────

/// Retries before `newId` gives up and raises `FAILED_TO_CREATE_ID`.
pub const MAX_ID_TRIES: u32 = 10;

/// Default bijection parameters. Treated as a stable catalog schema — see
/// the design notes on why these must never change once the catalog is live.
pub const DEFAULT_OPTIMUS_PRIME: u64 = 216_323_925;
pub const DEFAULT_OPTIMUS_INVERSE: u64 = 128_864_405;
pub const DEFAULT_OPTIMUS_SALT: u64 = 1_968_460_473;

/// The bijection operates mod 2^31.
pub const OPTIMUS_MODULUS: u64 = 1 << 31;

// ── HTTP / network ───────────────────────────────────────────────────────────

/// Default outbound HTTP timeout for upstream calls (seconds).
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Max HEAD/GET redirects followed while resolving a source URL.
pub const MAX_FOLLOW_REDIRECTS: usize = 5;

/// Default allowlisted hosts a source URL is permitted to resolve through.
pub const DEFAULT_FOLLOW_HOSTS: &[&str] = &["novask.in", "imgur.com"];

// ── Upstream agent identity ──────────────────────────────────────────────────

pub const UPSTREAM_USER_AGENT: &str = "SkinForge/1.0";
pub const UPSTREAM_AGENT_NAME: &str = "Minecraft";
pub const UPSTREAM_AGENT_VERSION: u8 = 1;
