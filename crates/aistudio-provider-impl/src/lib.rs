pub mod provider;
pub mod upstream;

pub use provider::OpenAIProvider;
