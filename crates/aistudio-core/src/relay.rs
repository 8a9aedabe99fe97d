//! Stream relay engine.
//!
//! A relay has two phases. [`RelaySession::open`] performs the upstream call;
//! every failure there still has a status and body for the caller. Once it
//! returns, the caller response is committed and [`RelaySession::run`] only
//! moves deltas from the provider to the outbound writer until one side ends.

use std::io;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, trace, warn};

use aistudio_protocol::{DeltaDecoder, GenerationRequest};
use aistudio_provider_core::{
    ByteStream, CallContext, Credential, Provider, StreamBody, UpstreamPassthroughError,
};

/// Bounded so a slow caller throttles upstream reads instead of buffering them.
pub const RELAY_CHANNEL_CAPACITY: usize = 64;

/// Terminal state of a session whose response was already committed.
/// Failures before that point are an [`UpstreamPassthroughError`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Provider signalled end of data; the writer is closed cleanly.
    Completed,
    /// Upstream read failed mid-stream. The caller sees a truncated body
    /// with no marker since status and headers are already sent.
    FailedDuringStream,
    /// The outbound writer went away; the upstream connection was released.
    CallerGone,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    pub chunks: usize,
    pub deltas: usize,
    pub bytes_out: usize,
}

pub struct RelaySession<S = ByteStream> {
    upstream: S,
    decoder: DeltaDecoder,
    stats: RelayStats,
    request_id: Option<String>,
}

impl RelaySession<ByteStream> {
    pub async fn open(
        provider: &dyn Provider,
        credential: &Credential,
        request: &GenerationRequest,
        ctx: CallContext,
    ) -> Result<Self, UpstreamPassthroughError> {
        let request_id = ctx.request_id.clone();
        let StreamBody { stream, .. } = provider.open_stream(credential, request, ctx).await?;
        Ok(Self::new(stream).with_request_id(request_id))
    }
}

impl<S> RelaySession<S>
where
    S: Stream<Item = Result<Bytes, io::Error>> + Unpin,
{
    pub fn new(upstream: S) -> Self {
        Self {
            upstream,
            decoder: DeltaDecoder::new(),
            stats: RelayStats::default(),
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    /// Consume the session. The upstream handle is dropped on every return
    /// path, which closes the provider connection.
    pub async fn run(mut self, writer: mpsc::Sender<Bytes>) -> RelayOutcome {
        let outcome = self.pump(&writer).await;
        let dropped = self.decoder.finish();
        let request_id = self.request_id.as_deref().unwrap_or("");
        match outcome {
            RelayOutcome::Completed => info!(
                request_id,
                chunks = self.stats.chunks,
                deltas = self.stats.deltas,
                bytes_out = self.stats.bytes_out,
                discarded = self.decoder.discarded(),
                trailing_bytes = dropped,
                "relay completed"
            ),
            RelayOutcome::FailedDuringStream => warn!(
                request_id,
                deltas = self.stats.deltas,
                "relay truncated by upstream failure"
            ),
            RelayOutcome::CallerGone => info!(
                request_id,
                deltas = self.stats.deltas,
                "caller disconnected, upstream released"
            ),
        }
        outcome
    }

    async fn pump(&mut self, writer: &mpsc::Sender<Bytes>) -> RelayOutcome {
        loop {
            let item = tokio::select! {
                biased;
                _ = writer.closed() => return RelayOutcome::CallerGone,
                item = self.upstream.next() => item,
            };

            let chunk = match item {
                Some(Ok(chunk)) => chunk,
                Some(Err(err)) => {
                    warn!(error = %err, "upstream read failed");
                    return RelayOutcome::FailedDuringStream;
                }
                None => return RelayOutcome::Completed,
            };
            self.stats.chunks += 1;
            trace!(len = chunk.len(), "upstream chunk");

            for delta in self.decoder.push(&chunk) {
                let len = delta.len();
                if writer.send(Bytes::from(delta)).await.is_err() {
                    return RelayOutcome::CallerGone;
                }
                self.stats.deltas += 1;
                self.stats.bytes_out += len;
            }
        }
    }
}

/// Open the upstream stream and relay it into `writer` until it ends.
pub async fn relay(
    provider: &dyn Provider,
    credential: &Credential,
    request: &GenerationRequest,
    ctx: CallContext,
    writer: mpsc::Sender<Bytes>,
) -> Result<RelayOutcome, UpstreamPassthroughError> {
    let session = RelaySession::open(provider, credential, request, ctx).await?;
    Ok(session.run(writer).await)
}
