//! Wire types for the upstream profile service (spec §6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateRequest<'a> {
    pub agent: Agent<'a>,
    pub username: &'a str,
    pub password: &'a str,
    pub client_token: &'a str,
    pub request_user: bool,
}

#[derive(Debug, Serialize)]
pub struct Agent<'a> {
    pub name: &'a str,
    pub version: u8,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest<'a> {
    pub access_token: &'a str,
    pub client_token: &'a str,
    pub request_user: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub access_token: &'a str,
    pub client_token: &'a str,
    pub request_user: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
}

/// A single property on the upstream profile response (e.g. the `textures`
/// property whose `value` is a base64-encoded JSON blob).
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileProperty {
    pub name: String,
    pub value: String,
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    pub id: String,
    pub name: String,
    pub properties: Vec<ProfileProperty>,
}

/// Decoded shape of the base64 `value` blob's `textures.SKIN.url`.
#[derive(Debug, Deserialize)]
pub struct DecodedTextures {
    pub textures: TextureSet,
}

#[derive(Debug, Deserialize)]
pub struct TextureSet {
    #[serde(rename = "SKIN")]
    pub skin: Option<TextureEntry>,
}

#[derive(Debug, Deserialize)]
pub struct TextureEntry {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ChallengeQuestions {
    pub questions: Vec<ChallengeQuestion>,
}

#[derive(Debug, Deserialize)]
pub struct ChallengeQuestion {
    pub id: u32,
}

#[derive(Debug, Serialize)]
pub struct ChallengeAnswer {
    pub id: u32,
    pub answer: String,
}
