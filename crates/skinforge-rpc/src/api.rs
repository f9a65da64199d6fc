use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::RpcGenerateResponse;

/// Generation-engine JSON-RPC 2.0 API definition.
///
/// All method names are prefixed with "skinforge_" via `namespace = "skinforge"`.
#[rpc(server, namespace = "skinforge")]
pub trait SkinforgeApi {
    /// Generate a skin from a source image URL.
    #[method(name = "generateFromUrl")]
    async fn generate_from_url(
        &self,
        url: String,
        name: Option<String>,
        variant: Option<String>,
        visibility: Option<String>,
        user_agent: Option<String>,
        source: Option<String>,
        client_ip: Option<String>,
    ) -> RpcResult<RpcGenerateResponse>;

    /// Generate a skin from a base64-encoded PNG upload.
    #[method(name = "generateFromUpload")]
    async fn generate_from_upload(
        &self,
        image_base64: String,
        name: Option<String>,
        variant: Option<String>,
        visibility: Option<String>,
        user_agent: Option<String>,
        source: Option<String>,
        client_ip: Option<String>,
    ) -> RpcResult<RpcGenerateResponse>;

    /// Generate a skin by copying another user's currently-worn texture.
    #[method(name = "generateFromUser")]
    async fn generate_from_user(
        &self,
        user_uuid: String,
        name: Option<String>,
        variant: Option<String>,
        visibility: Option<String>,
        user_agent: Option<String>,
        source: Option<String>,
        client_ip: Option<String>,
    ) -> RpcResult<RpcGenerateResponse>;
}
