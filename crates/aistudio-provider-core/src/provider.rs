use async_trait::async_trait;

use aistudio_protocol::GenerationRequest;

use crate::credential::Credential;
use crate::response::{StreamBody, UpstreamPassthroughError};

#[derive(Debug, Clone, Default)]
pub struct CallContext {
    pub request_id: Option<String>,
}

#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// Open one streaming generation call. Every failure here happens before
    /// any byte reaches the caller, so it carries a status and body.
    async fn open_stream(
        &self,
        credential: &Credential,
        req: &GenerationRequest,
        ctx: CallContext,
    ) -> Result<StreamBody, UpstreamPassthroughError>;
}
