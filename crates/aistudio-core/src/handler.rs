use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use aistudio_protocol::GenerationRequest;
use aistudio_provider_core::{CallContext, Credential};

use crate::core::CoreState;
use crate::error::ApiError;
use crate::relay::{RelaySession, RELAY_CHANNEL_CAPACITY};
use crate::session::{require_credential, session_id, short_id};

const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

#[derive(Debug, Default, Deserialize)]
struct LoginBody {
    #[serde(default)]
    api_key: Option<String>,
}

pub async fn login_handler(
    State(state): State<Arc<CoreState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let login: LoginBody = serde_json::from_slice(&body).unwrap_or_default();
    let credential = Credential::parse(login.api_key.as_deref().unwrap_or_default())?;

    if let Some(previous) = session_id(&headers) {
        state.sessions.clear(&previous);
    }
    let id = state.sessions.attach(credential);
    info!(session = short_id(&id), "session attached");

    let mut resp = Json(json!({ "ok": true })).into_response();
    set_cookie(&mut resp, state.cookie.issue(&id));
    Ok(resp)
}

pub async fn logout_handler(State(state): State<Arc<CoreState>>, headers: HeaderMap) -> Response {
    if let Some(id) = session_id(&headers) {
        state.sessions.clear(&id);
        info!(session = short_id(&id), "session cleared");
    }
    let mut resp = Json(json!({ "ok": true })).into_response();
    set_cookie(&mut resp, state.cookie.expire());
    resp
}

pub async fn session_handler(
    State(state): State<Arc<CoreState>>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    let logged_in = session_id(&headers).is_some_and(|id| state.sessions.is_attached(&id));
    Json(json!({ "logged_in": logged_in }))
}

pub async fn ai_handler(
    State(state): State<Arc<CoreState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let credential = require_credential(state.sessions.as_ref(), &headers)?;
    let request = GenerationRequest::build(&body, &state.defaults)?;
    let ctx = CallContext {
        request_id: Some(request_id(&headers)),
    };

    let session =
        RelaySession::open(state.provider.as_ref(), &credential, &request, ctx).await?;

    // From here on the response is committed; failures only end the body.
    let (tx, rx) = mpsc::channel::<Bytes>(RELAY_CHANNEL_CAPACITY);
    tokio::spawn(session.run(tx));

    let stream = ReceiverStream::new(rx).map(Ok::<_, Infallible>);
    let mut resp = Response::new(Body::from_stream(stream));
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(PLAIN_TEXT));
    Ok(resp)
}

fn set_cookie(resp: &mut Response, cookie: String) {
    match HeaderValue::try_from(cookie) {
        Ok(value) => {
            resp.headers_mut().insert(SET_COOKIE, value);
        }
        Err(err) => warn!(error = %err, "invalid session cookie"),
    }
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .or_else(|| headers.get("request-id"))
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
