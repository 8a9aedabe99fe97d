pub mod credential;
pub mod provider;
pub mod response;

pub use credential::{Credential, CredentialError};
pub use provider::{CallContext, Provider};
pub use response::{ByteStream, StreamBody, UpstreamPassthroughError};
