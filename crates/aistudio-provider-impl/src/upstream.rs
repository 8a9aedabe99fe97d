use std::io;

use futures_util::StreamExt;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};
use tracing::warn;

use aistudio_provider_core::{StreamBody, UpstreamPassthroughError};

pub const EVENT_STREAM: &str = "text/event-stream";

pub fn network_failure(err: wreq::Error) -> UpstreamPassthroughError {
    warn!(error = %err, "upstream request failed");
    UpstreamPassthroughError::internal(err.to_string())
}

/// Turn the provider's response into either a byte stream or a verbatim
/// rejection. Nothing is read from a successful body here.
pub async fn handle_response(
    response: wreq::Response,
) -> Result<StreamBody, UpstreamPassthroughError> {
    let status = response.status();
    let headers = passthrough_headers(response.headers());

    if !status.is_success() {
        let body = response.bytes().await.map_err(network_failure)?;
        warn!(status = %status, body_len = body.len(), "upstream rejected request");
        return Err(UpstreamPassthroughError::new(status, headers, body));
    }

    // a success without a body has nothing to stream
    if status == StatusCode::NO_CONTENT {
        return Err(UpstreamPassthroughError::new(status, headers, Default::default()));
    }

    let stream = response
        .bytes_stream()
        .map(|item| item.map_err(|err| io::Error::other(err.to_string())));
    Ok(StreamBody::new(status, EVENT_STREAM, stream))
}

/// Framing headers (length, transfer and content encoding) describe the
/// upstream connection, not the relayed body.
fn passthrough_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::new();
    if let Some(value) = headers.get(CONTENT_TYPE) {
        out.insert(CONTENT_TYPE, value.clone());
    }
    out
}
