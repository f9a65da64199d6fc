//! skinforge-rpc
//!
//! JSON-RPC 2.0 ingress for the generation engine.
//!
//! Namespace: "skinforge"
//! Methods:
//!   skinforge_generateFromUrl    — generate from a source image URL
//!   skinforge_generateFromUpload — generate from a base64-encoded upload
//!   skinforge_generateFromUser   — generate from another user's current skin

pub mod api;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerState};
pub use types::{RpcErrorData, RpcGenerateResponse};
