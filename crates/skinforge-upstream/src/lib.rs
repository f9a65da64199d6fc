pub mod auth;
pub mod client;
pub mod types;

pub use auth::{ensure_authenticated, satisfy_security_challenge, AuthError};
pub use client::{HttpUpstreamClient, SkinChangeBody, Upstream, UpstreamError};
pub use types::*;
