//! skinforge-node — the generation service binary.
//!
//! Startup sequence:
//!   1. Open the catalog (sled-backed)
//!   2. Build the account scheduler, upstream client, URL fetcher and temp
//!      file manager
//!   3. Wire the generation orchestrator
//!   4. Start the JSON-RPC 2.0 server and block until it is stopped

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use tracing::{info, warn};

use skinforge_catalog::{Catalog, IdAllocator, OptimusParams, SledCatalog};
use skinforge_core::account::Account;
use skinforge_core::constants::{
    DEFAULT_FOLLOW_HOSTS, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_OPTIMUS_INVERSE,
    DEFAULT_OPTIMUS_PRIME, DEFAULT_OPTIMUS_SALT, ERROR_THRESHOLD, MIN_ACCOUNT_DELAY_SECS,
};
use skinforge_crypto::SecretCodec;
use skinforge_engine::{GenerationOrchestrator, HttpUrlFetcher};
use skinforge_image::TempFileManager;
use skinforge_rpc::server::RpcServerState;
use skinforge_rpc::RpcServer;
use skinforge_scheduler::AccountScheduler;
use skinforge_upstream::HttpUpstreamClient;

#[derive(Parser, Debug)]
#[command(
    name = "skinforge-node",
    version,
    about = "SkinForge generation service — skin uploads, duplicate detection and account rotation"
)]
struct Args {
    /// Directory for the persistent catalog database.
    #[arg(long, default_value = "~/.skinforge/data")]
    data_dir: PathBuf,

    /// Directory temporary download/upload bytes are staged under before validation.
    #[arg(long, default_value = "~/.skinforge/tmp")]
    temp_dir: PathBuf,

    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:8645")]
    rpc_addr: SocketAddr,

    /// Base URL of the upstream account/profile service.
    #[arg(long, default_value = "https://authserver.example.com")]
    upstream_base_url: String,

    /// Hex-encoded 32-byte key used to decrypt stored account credentials.
    #[arg(long, env = "SKINFORGE_SECRET_KEY")]
    secret_key: String,

    /// Outbound HTTP timeout, in seconds, for upstream requests.
    #[arg(long, default_value_t = DEFAULT_HTTP_TIMEOUT_SECS)]
    upstream_timeout_secs: u64,

    /// Path to a JSON file of account credentials, loaded into the catalog
    /// on startup (existing usernames are left untouched). Only required to
    /// seed a fresh catalog.
    #[arg(long)]
    credentials_file: Option<PathBuf>,

    /// Identity this node presents to the scheduler's `requestServer` binding.
    #[arg(long, default_value = "default")]
    server_id: String,

    /// An account's error counter must stay below this to remain eligible.
    #[arg(long, default_value_t = ERROR_THRESHOLD)]
    error_threshold: u32,

    /// Base per-request account delay, in seconds, divided by the usable account count.
    #[arg(long, default_value_t = MIN_ACCOUNT_DELAY_SECS)]
    min_account_delay_secs: i64,

    /// Catalog id-bijection prime. Must never change once the catalog is live.
    #[arg(long, default_value_t = DEFAULT_OPTIMUS_PRIME)]
    optimus_prime: u64,

    /// Modular inverse of `--optimus-prime` mod 2^31. Must never change once the catalog is live.
    #[arg(long, default_value_t = DEFAULT_OPTIMUS_INVERSE)]
    optimus_inverse: u64,

    /// Catalog id-bijection salt. Must never change once the catalog is live.
    #[arg(long, default_value_t = DEFAULT_OPTIMUS_SALT)]
    optimus_salt: u64,

    /// Hosts a source URL is permitted to resolve through (repeatable).
    #[arg(long = "follow-host")]
    follow_hosts: Vec<String>,
}

/// One entry in a `--credentials-file` pool, pre-encryption.
#[derive(Debug, Deserialize)]
struct CredentialEntry {
    username: String,
    password: String,
    security_answer: Option<String>,
}

/// Seeds `catalog` with every credential in `path` whose username isn't
/// already present — an upsert-by-username over the existing pool, mirroring
/// the "apply genesis if the DB is fresh" startup check, except run on every
/// boot since the credential pool may grow over the node's lifetime.
fn load_credentials(
    path: &std::path::Path,
    catalog: &dyn Catalog,
    codec: &SecretCodec,
    now: i64,
) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading credentials file {}", path.display()))?;
    let entries: Vec<CredentialEntry> =
        serde_json::from_str(&json).context("parsing credentials file JSON")?;

    let existing = catalog
        .candidate_accounts()
        .context("loading existing accounts")?;
    let mut next_id = existing.iter().map(|a| a.id).max().unwrap_or(0) + 1;

    let mut added = 0u32;
    for entry in entries {
        if existing.iter().any(|a| a.username == entry.username) {
            continue;
        }

        let account = Account {
            id: next_id,
            username: entry.username,
            encrypted_password: codec.encrypt(&entry.password),
            encrypted_security_answer: entry.security_answer.map(|a| codec.encrypt(&a)),
            enabled: true,
            time_added_sec: now,
            ..Default::default()
        };
        catalog
            .update_account(account)
            .context("inserting seeded account")?;
        next_id += 1;
        added += 1;
    }

    if added > 0 {
        info!(added, "seeded new accounts from --credentials-file");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,skinforge=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    info!("skinforge-node starting");

    // ── Catalog ───────────────────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;
    let catalog = Arc::new(SledCatalog::open(&data_dir).context("opening catalog database")?);

    // ── Temp file staging ─────────────────────────────────────────────────────
    let temp_dir = expand_tilde(&args.temp_dir);
    std::fs::create_dir_all(&temp_dir)
        .with_context(|| format!("creating temp dir {}", temp_dir.display()))?;
    let temp_files = TempFileManager::new(temp_dir);

    // ── Credential codec ──────────────────────────────────────────────────────
    let secret_codec = Arc::new(
        SecretCodec::from_hex(&args.secret_key).context("parsing --secret-key as 32-byte hex")?,
    );

    // ── Credential pool seeding ────────────────────────────────────────────────
    if let Some(path) = &args.credentials_file {
        let now = chrono::Utc::now().timestamp();
        load_credentials(path, catalog.as_ref(), &secret_codec, now)?;
    } else if catalog.candidate_accounts()?.is_empty() {
        warn!("no accounts in the catalog and no --credentials-file given — every generation request will fail to acquire an account");
    }

    // ── Account scheduler ─────────────────────────────────────────────────────
    let scheduler = Arc::new(AccountScheduler::new(
        Arc::clone(&catalog) as _,
        args.error_threshold,
        args.min_account_delay_secs,
        args.server_id.clone(),
    ));

    // ── Upstream client and URL fetcher ───────────────────────────────────────
    let upstream = Arc::new(HttpUpstreamClient::new(
        args.upstream_base_url.clone(),
        Duration::from_secs(args.upstream_timeout_secs),
    ));
    let follow_hosts = if args.follow_hosts.is_empty() {
        DEFAULT_FOLLOW_HOSTS.iter().map(|h| h.to_string()).collect()
    } else {
        args.follow_hosts.clone()
    };
    let fetcher = Arc::new(HttpUrlFetcher::with_follow_hosts(follow_hosts));

    // ── ID allocator ──────────────────────────────────────────────────────────
    let id_allocator = IdAllocator::new(OptimusParams {
        prime: args.optimus_prime,
        inverse: args.optimus_inverse,
        salt: args.optimus_salt,
    });

    // ── Orchestrator ──────────────────────────────────────────────────────────
    let orchestrator = Arc::new(GenerationOrchestrator::new(
        Arc::clone(&catalog) as _,
        Arc::clone(&scheduler),
        upstream,
        fetcher,
        temp_files,
        id_allocator,
        secret_codec,
    ));

    // ── RPC server ────────────────────────────────────────────────────────────
    let rpc_state = Arc::new(RpcServerState {
        orchestrator,
        scheduler,
        catalog: Arc::clone(&catalog) as _,
    });
    let rpc_handle = RpcServer::new(rpc_state)
        .start(args.rpc_addr)
        .await
        .context("starting RPC server")?;

    info!(addr = %args.rpc_addr, "node ready");
    rpc_handle.stopped().await;

    Ok(())
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &std::path::Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
