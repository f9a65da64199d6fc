//! A pool member: an upstream-service credential pair the scheduler leases
//! out to orchestrators. See the eligibility predicate in
//! `skinforge-scheduler` — this module only defines the record shape and the
//! bookkeeping fields the scheduler and authentication engine mutate.

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub username: String,
    /// Ciphertext produced by the secret codec (`skinforge-crypto::secret`).
    pub encrypted_password: String,
    pub encrypted_security_answer: Option<String>,

    /// Stable per-account token, generated once (UUIDv4) on first use.
    pub client_token: Option<String>,
    /// Mutable bearer token from the authentication engine.
    pub access_token: Option<String>,

    pub last_used_sec: i64,
    pub last_selected_sec: i64,
    pub forced_timeout_at_sec: i64,

    /// Resets to 0 on success; `successCounter` resets to 0 on error.
    pub error_counter: u32,
    pub success_counter: u32,
    pub total_error_counter: u64,
    pub total_success_counter: u64,

    /// Used to spread load across otherwise-tied accounts (scheduler order key).
    pub same_texture_counter: u64,

    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Binds the account to a specific serving node, or `None`/"default".
    pub request_server: Option<String>,
    pub time_added_sec: i64,
}

impl Account {
    /// Returns true once this account has existed long enough to be used —
    /// independent of the cooldown windows the scheduler also enforces.
    pub fn is_seasoned(&self, now: i64, min_age_secs: i64) -> bool {
        self.time_added_sec < now - min_age_secs
    }
}
