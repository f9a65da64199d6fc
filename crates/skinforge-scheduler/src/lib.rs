//! Account scheduler (spec §4.8). Leases out eligible accounts to
//! orchestrators and records the outcome of each use. The lock set is kept
//! in-memory only — a restart releases every lease, which is acceptable
//! because the underlying cooldown fields are durable in the catalog.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use skinforge_catalog::{Catalog, CatalogError};
use skinforge_core::account::Account;
use skinforge_core::constants::{
    ACCOUNT_FORCED_TIMEOUT_SECS, ACCOUNT_MIN_AGE_SECS, ACCOUNT_SELECT_COOLDOWN_SECS,
    ACCOUNT_USE_COOLDOWN_SECS,
};

/// An account bound to some other node is excluded; unbound (`None`) and
/// `"default"` both mean "any node may use this account".
fn request_server_matches(account: &Account, server_id: &str) -> bool {
    match account.request_server.as_deref() {
        None => true,
        Some("default") => true,
        Some(bound) => bound == server_id,
    }
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("no eligible account available")]
    NoAccountAvailable,
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// Outcome an orchestrator reports back through [`AccountScheduler::release`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UseOutcome {
    Success,
    Error,
    /// An authentication failure, which in addition to the generic error
    /// bookkeeping forces a cooldown window before the account is retried.
    AuthFailure,
}

/// True when `account` may be handed out right now. Pure function of the
/// account's own fields, `now`, and the scheduler's own configuration — the
/// caller is responsible for also checking the lock set.
pub fn is_eligible(account: &Account, now: i64, error_threshold: u32, server_id: &str) -> bool {
    account.enabled
        && account.error_counter < error_threshold
        && account.is_seasoned(now, ACCOUNT_MIN_AGE_SECS)
        && now - account.last_used_sec >= ACCOUNT_USE_COOLDOWN_SECS
        && now - account.last_selected_sec >= ACCOUNT_SELECT_COOLDOWN_SECS
        && now >= account.forced_timeout_at_sec
        && request_server_matches(account, server_id)
}

pub struct AccountScheduler {
    catalog: Arc<dyn Catalog>,
    locked: Mutex<HashSet<u64>>,
    error_threshold: u32,
    min_account_delay_secs: i64,
    server_id: String,
}

impl AccountScheduler {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        error_threshold: u32,
        min_account_delay_secs: i64,
        server_id: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            locked: Mutex::new(HashSet::new()),
            error_threshold,
            min_account_delay_secs,
            server_id: server_id.into(),
        }
    }

    /// Picks the best eligible, unlocked account, locks it exclusively, and
    /// stamps `lastSelectedSec`. Candidates are already ordered by the
    /// catalog; the first eligible, unlocked one wins.
    pub fn acquire(&self, now: i64) -> Result<Account, SchedulerError> {
        let candidates = self.catalog.candidate_accounts()?;
        let mut locked = self.locked.lock().expect("scheduler lock poisoned");

        for account in candidates {
            if locked.contains(&account.id)
                || !is_eligible(&account, now, self.error_threshold, &self.server_id)
            {
                continue;
            }

            locked.insert(account.id);
            drop(locked);

            let mut updated = account;
            updated.last_selected_sec = now;
            return Ok(self.catalog.update_account(updated)?);
        }

        Err(SchedulerError::NoAccountAvailable)
    }

    /// Releases a previously-acquired account, persisting the bookkeeping
    /// mutation described by `outcome` and unlocking it for re-selection.
    pub fn release(
        &self,
        mut account: Account,
        outcome: UseOutcome,
        now: i64,
    ) -> Result<Account, SchedulerError> {
        match outcome {
            UseOutcome::Success => {
                account.last_used_sec = now;
                account.error_counter = 0;
                account.success_counter += 1;
                account.total_success_counter += 1;
            }
            UseOutcome::Error => {
                account.error_counter += 1;
                account.success_counter = 0;
                account.total_error_counter += 1;
            }
            UseOutcome::AuthFailure => {
                account.error_counter += 1;
                account.success_counter = 0;
                account.total_error_counter += 1;
                account.forced_timeout_at_sec = now + ACCOUNT_FORCED_TIMEOUT_SECS;
                account.request_server = None;
            }
        }

        let updated = self.catalog.update_account(account)?;
        self.locked.lock().expect("scheduler lock poisoned").remove(&updated.id);
        Ok(updated)
    }

    /// Releases a lock without mutating the account — used when acquisition
    /// succeeded but the caller bailed out before doing any upstream work.
    pub fn abandon(&self, account_id: u64) {
        self.locked.lock().expect("scheduler lock poisoned").remove(&account_id);
    }

    /// Suggested delay, in seconds, before the caller should request another
    /// account, scaled by how many accounts are currently usable at all.
    pub fn next_request_delay(&self, usable_account_count: u64) -> i64 {
        self.min_account_delay_secs / (usable_account_count.max(1) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    use skinforge_core::constants::{ERROR_THRESHOLD, MIN_ACCOUNT_DELAY_SECS};

    fn scheduler(catalog: FakeCatalog) -> AccountScheduler {
        AccountScheduler::new(Arc::new(catalog), ERROR_THRESHOLD, MIN_ACCOUNT_DELAY_SECS, "default")
    }

    #[derive(Default)]
    struct FakeCatalog {
        accounts: StdMutex<Vec<Account>>,
    }

    impl Catalog for FakeCatalog {
        fn find_skin_by_url_pattern(
            &self,
            _canonical_url: &str,
            _filter: &skinforge_catalog::SkinFilter,
        ) -> Result<Option<skinforge_core::skin::Skin>, CatalogError> {
            unimplemented!()
        }

        fn find_skin_by_uuid(
            &self,
            _uuid: &str,
            _filter: &skinforge_catalog::SkinFilter,
        ) -> Result<Option<skinforge_core::skin::Skin>, CatalogError> {
            unimplemented!()
        }

        fn find_skin_by_hash(
            &self,
            _phash: &str,
            _filter: &skinforge_catalog::SkinFilter,
        ) -> Result<Option<skinforge_core::skin::Skin>, CatalogError> {
            unimplemented!()
        }

        fn insert_skin(
            &self,
            _skin: skinforge_core::skin::Skin,
        ) -> Result<skinforge_core::skin::Skin, CatalogError> {
            unimplemented!()
        }

        fn exists_skin_id(&self, _id: u64) -> Result<bool, CatalogError> {
            unimplemented!()
        }

        fn increment_duplicate(
            &self,
            _skin: &skinforge_core::skin::Skin,
        ) -> Result<skinforge_core::skin::Skin, CatalogError> {
            unimplemented!()
        }

        fn candidate_accounts(&self) -> Result<Vec<Account>, CatalogError> {
            Ok(self.accounts.lock().unwrap().clone())
        }

        fn update_account(&self, account: Account) -> Result<Account, CatalogError> {
            let mut accounts = self.accounts.lock().unwrap();
            if let Some(existing) = accounts.iter_mut().find(|a| a.id == account.id) {
                *existing = account.clone();
            }
            Ok(account)
        }

        fn get_account(&self, id: u64) -> Result<Option<Account>, CatalogError> {
            Ok(self
                .accounts
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.id == id)
                .cloned())
        }
    }

    fn eligible_account(id: u64, now: i64) -> Account {
        Account {
            id,
            enabled: true,
            time_added_sec: now - ACCOUNT_MIN_AGE_SECS - 1,
            last_used_sec: now - ACCOUNT_USE_COOLDOWN_SECS - 1,
            last_selected_sec: now - ACCOUNT_SELECT_COOLDOWN_SECS - 1,
            forced_timeout_at_sec: 0,
            ..Default::default()
        }
    }

    #[test]
    fn acquires_the_only_eligible_account() {
        let now = 1_000_000;
        let catalog = FakeCatalog {
            accounts: StdMutex::new(vec![eligible_account(1, now)]),
        };
        let scheduler = scheduler(catalog);
        let account = scheduler.acquire(now).unwrap();
        assert_eq!(account.id, 1);
    }

    #[test]
    fn locked_accounts_are_skipped() {
        let now = 1_000_000;
        let catalog = FakeCatalog {
            accounts: StdMutex::new(vec![eligible_account(1, now), eligible_account(2, now)]),
        };
        let scheduler = scheduler(catalog);
        let first = scheduler.acquire(now).unwrap();
        let second = scheduler.acquire(now).unwrap();
        assert_ne!(first.id, second.id);
        assert!(scheduler.acquire(now).is_err());
    }

    #[test]
    fn released_account_is_selectable_again_once_cooldowns_pass() {
        let now = 1_000_000;
        let catalog = FakeCatalog {
            accounts: StdMutex::new(vec![eligible_account(1, now)]),
        };
        let scheduler = scheduler(catalog);
        let account = scheduler.acquire(now).unwrap();
        let released = scheduler.release(account, UseOutcome::Success, now).unwrap();
        assert_eq!(released.success_counter, 1);
        assert_eq!(released.error_counter, 0);

        let later = now + ACCOUNT_USE_COOLDOWN_SECS + ACCOUNT_SELECT_COOLDOWN_SECS + 1;
        assert!(scheduler.acquire(later).is_ok());
    }

    #[test]
    fn auth_failure_forces_a_timeout() {
        let now = 1_000_000;
        let catalog = FakeCatalog {
            accounts: StdMutex::new(vec![eligible_account(1, now)]),
        };
        let scheduler = scheduler(catalog);
        let account = scheduler.acquire(now).unwrap();
        let released = scheduler
            .release(account, UseOutcome::AuthFailure, now)
            .unwrap();
        assert_eq!(released.forced_timeout_at_sec, now + ACCOUNT_FORCED_TIMEOUT_SECS);

        let too_soon = now + ACCOUNT_USE_COOLDOWN_SECS + ACCOUNT_SELECT_COOLDOWN_SECS + 1;
        assert!(scheduler.acquire(too_soon).is_err());
    }

    #[test]
    fn ineligible_error_counter_excludes_the_account() {
        let now = 1_000_000;
        let mut account = eligible_account(1, now);
        account.error_counter = ERROR_THRESHOLD;
        let catalog = FakeCatalog {
            accounts: StdMutex::new(vec![account]),
        };
        let scheduler = scheduler(catalog);
        assert!(scheduler.acquire(now).is_err());
    }

    #[test]
    fn next_request_delay_scales_with_usable_count() {
        let catalog = FakeCatalog::default();
        let scheduler = scheduler(catalog);
        assert_eq!(scheduler.next_request_delay(1), MIN_ACCOUNT_DELAY_SECS);
        assert_eq!(scheduler.next_request_delay(2), MIN_ACCOUNT_DELAY_SECS / 2);
    }

    #[test]
    fn account_bound_to_another_server_is_excluded() {
        let now = 1_000_000;
        let mut account = eligible_account(1, now);
        account.request_server = Some("other-node".to_string());
        let catalog = FakeCatalog {
            accounts: StdMutex::new(vec![account]),
        };
        let scheduler = scheduler(catalog);
        assert!(scheduler.acquire(now).is_err());
    }

    #[test]
    fn unbound_and_default_request_server_are_eligible() {
        let now = 1_000_000;
        let mut unbound = eligible_account(1, now);
        unbound.request_server = None;
        let mut defaulted = eligible_account(2, now);
        defaulted.request_server = Some("default".to_string());
        let catalog = FakeCatalog {
            accounts: StdMutex::new(vec![unbound, defaulted]),
        };
        let scheduler = scheduler(catalog);
        assert!(scheduler.acquire(now).is_ok());
        assert!(scheduler.acquire(now).is_ok());
    }

    #[test]
    fn auth_failure_clears_request_server() {
        let now = 1_000_000;
        let mut account = eligible_account(1, now);
        account.request_server = Some("default".to_string());
        let catalog = FakeCatalog {
            accounts: StdMutex::new(vec![account]),
        };
        let scheduler = scheduler(catalog);
        let account = scheduler.acquire(now).unwrap();
        let released = scheduler
            .release(account, UseOutcome::AuthFailure, now)
            .unwrap();
        assert_eq!(released.request_server, None);
    }
}
