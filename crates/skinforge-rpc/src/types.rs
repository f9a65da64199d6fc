use serde::Serialize;

/// JSON-serializable response for a successful generation, returned by all
/// three `skinforge_generateFrom*` methods.
#[derive(Debug, Clone, Serialize)]
pub struct RpcGenerateResponse {
    pub success: bool,
    pub id: u64,
    pub name: Option<String>,
    pub variant: String,
    pub visibility: String,
    pub texture_url: String,
    pub texture_hash: String,
    pub account_id: u64,
    pub duplicate: bool,
    pub duplicate_source: Option<String>,
    pub duplicate_count: u64,
    pub view_count: u64,
    pub generate_duration_ms: u64,
}

/// `data` payload attached to the JSON-RPC error object — the fields spec.md
/// §7 calls for beyond the envelope's own `error` (the JSON-RPC `message`).
#[derive(Debug, Clone, Serialize)]
pub struct RpcErrorData {
    pub error_type: String,
    pub error_code: u16,
    pub next_request: i64,
}
