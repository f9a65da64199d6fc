use std::net::SocketAddr;
use std::sync::Arc;

use base64::Engine;
use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use skinforge_catalog::Catalog;
use skinforge_core::error::EngineError;
use skinforge_core::request::GenerateOptions;
use skinforge_core::skin::{Skin, Variant, Visibility};
use skinforge_engine::{GenerationOrchestrator, GenerationOutcome};
use skinforge_scheduler::AccountScheduler;

use crate::api::SkinforgeApiServer;
use crate::types::{RpcErrorData, RpcGenerateResponse};

/// Shared state passed to the RPC server.
pub struct RpcServerState {
    pub orchestrator: Arc<GenerationOrchestrator>,
    pub scheduler: Arc<AccountScheduler>,
    pub catalog: Arc<dyn Catalog>,
}

/// The RPC server implementation.
pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    /// Start the JSON-RPC server on `addr` with permissive CORS headers. Returns a handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
        let cors = CorsLayer::new()
            .allow_methods(Any)
            .allow_origin(Any)
            .allow_headers(Any);

        let server = Server::builder()
            .set_http_middleware(tower::ServiceBuilder::new().layer(cors))
            .build(addr)
            .await?;

        let module = self.into_rpc();
        let handle = server.start(module);
        info!(%addr, "RPC server started");
        Ok(handle)
    }
}

fn parse_variant(variant: Option<String>) -> Result<Variant, ErrorObject<'static>> {
    match variant.as_deref() {
        None => Ok(Variant::Unknown),
        Some("classic") => Ok(Variant::Classic),
        Some("slim") => Ok(Variant::Slim),
        Some("unknown") => Ok(Variant::Unknown),
        Some(other) => Err(bad_request(format!("unknown variant: {other}"))),
    }
}

fn parse_visibility(visibility: Option<String>) -> Result<Visibility, ErrorObject<'static>> {
    match visibility.as_deref() {
        None | Some("public") => Ok(Visibility::Public),
        Some("private") => Ok(Visibility::Private),
        Some(other) => Err(bad_request(format!("unknown visibility: {other}"))),
    }
}

fn bad_request(msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(400, msg.into(), None::<()>)
}

fn skin_response(skin: Skin, duplicate: bool, duplicate_source: Option<String>) -> RpcGenerateResponse {
    RpcGenerateResponse {
        success: true,
        id: skin.id,
        name: skin.name,
        variant: variant_str(skin.variant).to_string(),
        visibility: visibility_str(skin.visibility).to_string(),
        texture_url: skin.texture_url,
        texture_hash: skin.texture_hash,
        account_id: skin.account_id,
        duplicate,
        duplicate_source,
        duplicate_count: skin.duplicate_count,
        view_count: skin.view_count,
        generate_duration_ms: skin.generate_duration_ms,
    }
}

fn variant_str(variant: Variant) -> &'static str {
    match variant {
        Variant::Classic => "classic",
        Variant::Slim => "slim",
        Variant::Unknown => "unknown",
    }
}

fn visibility_str(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Public => "public",
        Visibility::Private => "private",
    }
}

impl RpcServerState {
    /// `errorType`/`errorCode`/`nextRequest` envelope per spec.md §7, carried
    /// as the JSON-RPC error object's `data` field.
    fn engine_err(&self, err: EngineError) -> jsonrpsee::types::ErrorObjectOwned {
        let now = chrono::Utc::now().timestamp();
        let usable = self.catalog.candidate_accounts().map(|a| a.len() as u64).unwrap_or(0);
        let delay = self.scheduler.next_request_delay(usable);

        let data = RpcErrorData {
            error_type: err.kind().as_str().to_string(),
            error_code: err.http_status(),
            next_request: now + delay,
        };
        ErrorObject::owned(err.http_status() as i32, err.to_string(), Some(data))
    }

    fn outcome_response(&self, outcome: GenerationOutcome) -> RpcGenerateResponse {
        match outcome {
            GenerationOutcome::Created(skin) => skin_response(skin, false, None),
            GenerationOutcome::Duplicate { skin, source } => {
                skin_response(skin, true, Some(source.as_str().to_string()))
            }
        }
    }
}

#[async_trait]
impl SkinforgeApiServer for RpcServer {
    async fn generate_from_url(
        &self,
        url: String,
        name: Option<String>,
        variant: Option<String>,
        visibility: Option<String>,
        user_agent: Option<String>,
        source: Option<String>,
        client_ip: Option<String>,
    ) -> RpcResult<RpcGenerateResponse> {
        let options = GenerateOptions {
            name,
            variant: parse_variant(variant)?,
            visibility: parse_visibility(visibility)?,
        };
        let outcome = self
            .state
            .orchestrator
            .from_url(url, options, "url".to_string(), user_agent, source, client_ip)
            .await
            .map_err(|e| self.state.engine_err(e))?;
        Ok(self.state.outcome_response(outcome))
    }

    async fn generate_from_upload(
        &self,
        image_base64: String,
        name: Option<String>,
        variant: Option<String>,
        visibility: Option<String>,
        user_agent: Option<String>,
        source: Option<String>,
        client_ip: Option<String>,
    ) -> RpcResult<RpcGenerateResponse> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(image_base64)
            .map_err(|e| bad_request(format!("invalid base64 image: {e}")))?;
        let options = GenerateOptions {
            name,
            variant: parse_variant(variant)?,
            visibility: parse_visibility(visibility)?,
        };
        let outcome = self
            .state
            .orchestrator
            .from_upload(bytes, options, "upload".to_string(), user_agent, source, client_ip)
            .await
            .map_err(|e| self.state.engine_err(e))?;
        Ok(self.state.outcome_response(outcome))
    }

    async fn generate_from_user(
        &self,
        user_uuid: String,
        name: Option<String>,
        variant: Option<String>,
        visibility: Option<String>,
        user_agent: Option<String>,
        source: Option<String>,
        client_ip: Option<String>,
    ) -> RpcResult<RpcGenerateResponse> {
        let options = GenerateOptions {
            name,
            variant: parse_variant(variant)?,
            visibility: parse_visibility(visibility)?,
        };
        let outcome = self
            .state
            .orchestrator
            .from_user(user_uuid, options, "user".to_string(), user_agent, source, client_ip)
            .await
            .map_err(|e| self.state.engine_err(e))?;
        Ok(self.state.outcome_response(outcome))
    }
}
