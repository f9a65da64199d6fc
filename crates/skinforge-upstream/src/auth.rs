//! Authentication state machine (spec §4.9). An account moves through
//! EMPTY → HAS_ACCESS → VALID; a stale access token falls back to
//! HAS_REFRESH before a full login is attempted. Security-question
//! challenges are completed on demand, never pre-emptively.

use thiserror::Error;
use uuid::Uuid;

use skinforge_core::account::Account;
use skinforge_crypto::SecretCodec;

use crate::client::Upstream;
use crate::types::ChallengeAnswer;
use crate::UpstreamError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password could not be decrypted: {0}")]
    Decrypt(#[from] skinforge_crypto::secret::SecretError),
    #[error("login failed: {0}")]
    Login(UpstreamError),
    #[error("security challenge failed: {0}")]
    Challenge(UpstreamError),
}

/// Brings `account` to a state where its `access_token` is known good,
/// mutating it in place.
///
/// Order of attempts: validate the existing token, then refresh it, then
/// fall back to a full login with the decrypted password. The client
/// token is generated once (first login) and then reused for the life of
/// the account, per the upstream contract. `client_ip` is forwarded as
/// `X-Forwarded-For` on a login attempt only.
pub async fn ensure_authenticated(
    account: &mut Account,
    upstream: &dyn Upstream,
    codec: &SecretCodec,
    client_ip: Option<&str>,
) -> Result<(), AuthError> {
    if account.client_token.is_none() {
        account.client_token = Some(Uuid::new_v4().to_string());
    }
    let client_token = account.client_token.clone().expect("set above");

    if let Some(access_token) = account.access_token.clone() {
        if upstream.validate(&access_token, &client_token).await.is_ok() {
            return Ok(());
        }

        if let Ok(refreshed) = upstream.refresh(&access_token, &client_token).await {
            account.access_token = Some(refreshed);
            return Ok(());
        }
    }

    login(account, upstream, codec, &client_token, client_ip).await
}

async fn login(
    account: &mut Account,
    upstream: &dyn Upstream,
    codec: &SecretCodec,
    client_token: &str,
    client_ip: Option<&str>,
) -> Result<(), AuthError> {
    let password = codec.decrypt(&account.encrypted_password)?;

    let access_token = upstream
        .authenticate(&account.username, &password, client_token, client_ip)
        .await
        .map_err(AuthError::Login)?;

    account.access_token = Some(access_token);
    Ok(())
}

/// Completes the security-question flow if, and only if, the upstream
/// demands it before the next skin change. A no-op when the profile has
/// no outstanding challenge, or when the account carries no stored answer.
pub async fn satisfy_security_challenge(
    account: &Account,
    upstream: &dyn Upstream,
    codec: &SecretCodec,
) -> Result<(), AuthError> {
    let access_token = match account.access_token.as_deref() {
        Some(token) => token,
        None => return Ok(()),
    };

    if upstream
        .challenge_location(access_token)
        .await
        .map_err(AuthError::Challenge)?
    {
        return Ok(());
    }

    let encrypted_answer = match account.encrypted_security_answer.as_deref() {
        Some(answer) => answer,
        None => return Ok(()),
    };
    let answer = codec.decrypt(encrypted_answer)?;

    let questions = upstream
        .challenge_questions(access_token)
        .await
        .map_err(AuthError::Challenge)?;

    let answers: Vec<ChallengeAnswer> = questions
        .questions
        .into_iter()
        .map(|q| ChallengeAnswer {
            id: q.id,
            answer: answer.clone(),
        })
        .collect();

    upstream
        .submit_challenge_answers(access_token, &answers)
        .await
        .map_err(AuthError::Challenge)?;

    let satisfied = upstream
        .challenge_location(access_token)
        .await
        .map_err(AuthError::Challenge)?;

    if !satisfied {
        return Err(AuthError::Challenge(UpstreamError::Status(403)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::types::{ChallengeQuestion, ChallengeQuestions, ProfileResponse};
    use crate::SkinChangeBody;

    #[derive(Default)]
    struct StubUpstream {
        validate_ok: bool,
        refresh_ok: bool,
        authenticate_calls: AtomicUsize,
        challenge_satisfied: Mutex<bool>,
    }

    #[async_trait]
    impl Upstream for StubUpstream {
        async fn authenticate(
            &self,
            _username: &str,
            _password: &str,
            _client_token: &str,
            _client_ip: Option<&str>,
        ) -> Result<String, UpstreamError> {
            self.authenticate_calls.fetch_add(1, Ordering::SeqCst);
            Ok("fresh-access-token".to_string())
        }

        async fn validate(&self, _access_token: &str, _client_token: &str) -> Result<(), UpstreamError> {
            if self.validate_ok {
                Ok(())
            } else {
                Err(UpstreamError::Status(403))
            }
        }

        async fn refresh(&self, _access_token: &str, _client_token: &str) -> Result<String, UpstreamError> {
            if self.refresh_ok {
                Ok("refreshed-access-token".to_string())
            } else {
                Err(UpstreamError::Status(403))
            }
        }

        async fn change_skin(&self, _access_token: &str, _body: SkinChangeBody) -> Result<(), UpstreamError> {
            Ok(())
        }

        async fn fetch_profile(&self, _access_token: &str) -> Result<ProfileResponse, UpstreamError> {
            unimplemented!()
        }

        async fn fetch_public_profile(&self, _uuid: &str) -> Result<ProfileResponse, UpstreamError> {
            unimplemented!()
        }

        async fn challenge_location(&self, _access_token: &str) -> Result<bool, UpstreamError> {
            Ok(*self.challenge_satisfied.lock().unwrap())
        }

        async fn challenge_questions(&self, _access_token: &str) -> Result<ChallengeQuestions, UpstreamError> {
            Ok(ChallengeQuestions {
                questions: vec![ChallengeQuestion { id: 1 }],
            })
        }

        async fn submit_challenge_answers(
            &self,
            _access_token: &str,
            _answers: &[ChallengeAnswer],
        ) -> Result<(), UpstreamError> {
            *self.challenge_satisfied.lock().unwrap() = true;
            Ok(())
        }

        async fn download(&self, _url: &str) -> Result<Vec<u8>, UpstreamError> {
            unimplemented!()
        }
    }

    fn codec() -> SecretCodec {
        SecretCodec::new([7u8; 32])
    }

    fn account_with_password() -> Account {
        Account {
            username: "player@example.com".to_string(),
            encrypted_password: codec().encrypt("hunter2"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn valid_access_token_short_circuits() {
        let mut account = account_with_password();
        account.access_token = Some("still-good".to_string());
        let upstream = StubUpstream {
            validate_ok: true,
            ..Default::default()
        };
        ensure_authenticated(&mut account, &upstream, &codec(), None)
            .await
            .unwrap();
        assert_eq!(account.access_token.as_deref(), Some("still-good"));
        assert_eq!(upstream.authenticate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stale_token_falls_back_to_refresh() {
        let mut account = account_with_password();
        account.access_token = Some("stale".to_string());
        let upstream = StubUpstream {
            validate_ok: false,
            refresh_ok: true,
            ..Default::default()
        };
        ensure_authenticated(&mut account, &upstream, &codec(), None)
            .await
            .unwrap();
        assert_eq!(account.access_token.as_deref(), Some("refreshed-access-token"));
        assert_eq!(upstream.authenticate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn refresh_failure_falls_back_to_login() {
        let mut account = account_with_password();
        account.access_token = Some("stale".to_string());
        let upstream = StubUpstream {
            validate_ok: false,
            refresh_ok: false,
            ..Default::default()
        };
        ensure_authenticated(&mut account, &upstream, &codec(), Some("203.0.113.4"))
            .await
            .unwrap();
        assert_eq!(account.access_token.as_deref(), Some("fresh-access-token"));
        assert_eq!(upstream.authenticate_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn client_token_is_generated_once() {
        let mut account = account_with_password();
        let upstream = StubUpstream::default();
        ensure_authenticated(&mut account, &upstream, &codec(), None)
            .await
            .unwrap();
        let first = account.client_token.clone();
        ensure_authenticated(&mut account, &upstream, &codec(), None)
            .await
            .unwrap();
        assert_eq!(account.client_token, first);
    }

    #[tokio::test]
    async fn challenge_is_satisfied_when_outstanding() {
        let mut account = account_with_password();
        account.encrypted_security_answer = Some(codec().encrypt("blue"));
        let upstream = StubUpstream::default();
        ensure_authenticated(&mut account, &upstream, &codec(), None)
            .await
            .unwrap();
        satisfy_security_challenge(&account, &upstream, &codec())
            .await
            .unwrap();
        assert!(*upstream.challenge_satisfied.lock().unwrap());
    }
}
