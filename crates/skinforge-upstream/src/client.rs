//! Egress HTTP client for the upstream profile service (spec §6). The
//! trait lets the engine depend on an interface rather than a concrete
//! `reqwest::Client` — tests substitute a hand-rolled stub, production
//! wires up [`HttpUpstreamClient`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use skinforge_core::constants::{UPSTREAM_AGENT_NAME, UPSTREAM_AGENT_VERSION, UPSTREAM_USER_AGENT};

use crate::types::{
    AuthenticateRequest, Agent, ChallengeAnswer, ChallengeQuestions, ProfileResponse,
    RefreshRequest, TokenResponse, ValidateRequest,
};

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Request(String),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("upstream response could not be decoded: {0}")]
    Decode(String),
}

pub enum SkinChangeBody {
    Url { variant: String, url: String },
    File { variant: String, bytes: Vec<u8> },
}

/// Everything the authentication engine and orchestrator need from the
/// upstream profile service.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
        client_token: &str,
        client_ip: Option<&str>,
    ) -> Result<String, UpstreamError>;

    async fn validate(&self, access_token: &str, client_token: &str) -> Result<(), UpstreamError>;

    async fn refresh(
        &self,
        access_token: &str,
        client_token: &str,
    ) -> Result<String, UpstreamError>;

    async fn change_skin(
        &self,
        access_token: &str,
        body: SkinChangeBody,
    ) -> Result<(), UpstreamError>;

    async fn fetch_profile(&self, access_token: &str) -> Result<ProfileResponse, UpstreamError>;

    /// Unauthenticated lookup of another user's public profile, used by
    /// `fromUser` generation to resolve their currently-worn skin.
    async fn fetch_public_profile(&self, uuid: &str) -> Result<ProfileResponse, UpstreamError>;

    async fn challenge_location(&self, access_token: &str) -> Result<bool, UpstreamError>;

    async fn challenge_questions(
        &self,
        access_token: &str,
    ) -> Result<ChallengeQuestions, UpstreamError>;

    async fn submit_challenge_answers(
        &self,
        access_token: &str,
        answers: &[ChallengeAnswer],
    ) -> Result<(), UpstreamError>;

    /// Downloads arbitrary bytes (used to re-fetch the signed texture for
    /// its independent `mojangHash`).
    async fn download(&self, url: &str) -> Result<Vec<u8>, UpstreamError>;
}

pub struct HttpUpstreamClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUpstreamClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(UPSTREAM_USER_AGENT)
            .build()
            .expect("building the upstream HTTP client cannot fail with static config");
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Upstream for HttpUpstreamClient {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
        client_token: &str,
        client_ip: Option<&str>,
    ) -> Result<String, UpstreamError> {
        let body = AuthenticateRequest {
            agent: Agent {
                name: UPSTREAM_AGENT_NAME,
                version: UPSTREAM_AGENT_VERSION,
            },
            username,
            password,
            client_token,
            request_user: true,
        };

        let mut req = self.client.post(self.url("/authenticate")).json(&body);
        if let Some(ip) = client_ip {
            req = req.header("X-Forwarded-For", ip).header("REMOTE_ADDR", ip);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| UpstreamError::Request(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(UpstreamError::Status(resp.status().as_u16()));
        }
        let parsed: TokenResponse = resp
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;
        Ok(parsed.access_token)
    }

    async fn validate(&self, access_token: &str, client_token: &str) -> Result<(), UpstreamError> {
        let body = ValidateRequest {
            access_token,
            client_token,
            request_user: true,
        };
        let resp = self
            .client
            .post(self.url("/validate"))
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::Request(e.to_string()))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(UpstreamError::Status(resp.status().as_u16()))
        }
    }

    async fn refresh(
        &self,
        access_token: &str,
        client_token: &str,
    ) -> Result<String, UpstreamError> {
        let body = RefreshRequest {
            access_token,
            client_token,
            request_user: true,
        };
        let resp = self
            .client
            .post(self.url("/refresh"))
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::Request(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(UpstreamError::Status(resp.status().as_u16()));
        }
        let parsed: TokenResponse = resp
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;
        Ok(parsed.access_token)
    }

    async fn change_skin(
        &self,
        access_token: &str,
        body: SkinChangeBody,
    ) -> Result<(), UpstreamError> {
        let req = match body {
            SkinChangeBody::Url { variant, url } => self
                .client
                .post(self.url("/minecraft/profile/skins"))
                .bearer_auth(access_token)
                .json(&serde_json::json!({ "variant": variant, "url": url })),
            SkinChangeBody::File { variant, bytes } => {
                let part = reqwest::multipart::Part::bytes(bytes)
                    .file_name("skin.png")
                    .mime_str("image/png")
                    .map_err(|e| UpstreamError::Request(e.to_string()))?;
                let form = reqwest::multipart::Form::new()
                    .text("variant", variant)
                    .part("file", part);
                self.client
                    .post(self.url("/minecraft/profile/skins"))
                    .bearer_auth(access_token)
                    .multipart(form)
            }
        };

        let resp = req
            .send()
            .await
            .map_err(|e| UpstreamError::Request(e.to_string()))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(UpstreamError::Status(resp.status().as_u16()))
        }
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ProfileResponse, UpstreamError> {
        let resp = self
            .client
            .get(self.url("/minecraft/profile"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| UpstreamError::Request(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(UpstreamError::Status(resp.status().as_u16()));
        }
        resp.json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))
    }

    async fn fetch_public_profile(&self, uuid: &str) -> Result<ProfileResponse, UpstreamError> {
        let resp = self
            .client
            .get(self.url(&format!("/session/minecraft/profile/{uuid}")))
            .send()
            .await
            .map_err(|e| UpstreamError::Request(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(UpstreamError::Status(resp.status().as_u16()));
        }
        resp.json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))
    }

    async fn challenge_location(&self, access_token: &str) -> Result<bool, UpstreamError> {
        let resp = self
            .client
            .get(self.url("/user/security/location"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| UpstreamError::Request(e.to_string()))?;
        Ok(resp.status().is_success())
    }

    async fn challenge_questions(
        &self,
        access_token: &str,
    ) -> Result<ChallengeQuestions, UpstreamError> {
        let resp = self
            .client
            .get(self.url("/user/security/challenges"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| UpstreamError::Request(e.to_string()))?;
        if resp.status() != StatusCode::OK {
            return Err(UpstreamError::Status(resp.status().as_u16()));
        }
        resp.json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))
    }

    async fn submit_challenge_answers(
        &self,
        access_token: &str,
        answers: &[ChallengeAnswer],
    ) -> Result<(), UpstreamError> {
        let resp = self
            .client
            .post(self.url("/user/security/location"))
            .bearer_auth(access_token)
            .json(answers)
            .send()
            .await
            .map_err(|e| UpstreamError::Request(e.to_string()))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(UpstreamError::Status(resp.status().as_u16()))
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, UpstreamError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpstreamError::Request(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(UpstreamError::Status(resp.status().as_u16()));
        }
        resp.bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}
