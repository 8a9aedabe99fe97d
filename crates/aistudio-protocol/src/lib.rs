pub mod delta;
pub mod request;
pub mod responses;
pub mod sse;

pub use delta::DeltaDecoder;
pub use request::{BuildError, GenerationRequest, RawGenerationInput, RequestDefaults};
pub use responses::{extract_text_delta, CreateResponseBody};
pub use sse::{EventRecord, SseDecoder};
