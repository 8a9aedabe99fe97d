use async_trait::async_trait;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, info};

use aistudio_protocol::{CreateResponseBody, GenerationRequest};
use aistudio_provider_core::{
    CallContext, Credential, Provider, StreamBody, UpstreamPassthroughError,
};

use crate::upstream::{handle_response, network_failure, EVENT_STREAM};

pub const PROVIDER_NAME: &str = "openai";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const RESPONSES_PATH: &str = "/v1/responses";

#[derive(Clone)]
pub struct OpenAIProvider {
    client: wreq::Client,
    endpoint: String,
}

impl OpenAIProvider {
    /// `proxy` routes every provider call through the given proxy URL.
    pub fn new(base_url: &str, proxy: Option<&str>) -> Result<Self, wreq::Error> {
        let mut builder = wreq::Client::builder();
        if let Some(proxy) = proxy.filter(|value| !value.trim().is_empty()) {
            builder = builder.proxy(wreq::Proxy::all(proxy)?);
        }
        let client = builder.build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: wreq::Client, base_url: &str) -> Self {
        let endpoint = format!("{}{}", base_url.trim_end_matches('/'), RESPONSES_PATH);
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn open_stream(
        &self,
        credential: &Credential,
        req: &GenerationRequest,
        ctx: CallContext,
    ) -> Result<StreamBody, UpstreamPassthroughError> {
        let body = serde_json::to_vec(&CreateResponseBody::from(req))
            .map_err(|err| UpstreamPassthroughError::internal(err.to_string()))?;
        debug!(
            request_id = ctx.request_id.as_deref().unwrap_or(""),
            model = %req.model,
            system_chars = req.system_text.chars().count(),
            body_len = body.len(),
            "opening upstream stream"
        );

        let response = self
            .client
            .post(self.endpoint.as_str())
            .header(AUTHORIZATION, credential.authorization())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, EVENT_STREAM)
            .body(body)
            .send()
            .await
            .map_err(network_failure)?;

        let stream = handle_response(response).await?;
        info!(
            request_id = ctx.request_id.as_deref().unwrap_or(""),
            status = %stream.status,
            "upstream stream open"
        );
        Ok(stream)
    }
}
