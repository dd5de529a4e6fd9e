// Adapters layer: concrete implementations of the remote relationship ports.

pub mod github;
pub mod memory;

pub use github::{GitHubClient, DEFAULT_API_BASE_URL};
pub use memory::{InMemoryRemote, InjectedFailure};
