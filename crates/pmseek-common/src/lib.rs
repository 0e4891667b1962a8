//! pmseek-common — Shared error types and the outbound HTTP client used across all pmseek crates.

pub mod error;
pub mod sandbox;

// Re-export commonly used types
pub use error::{ApiError, PmseekError, Result};
pub use sandbox::SandboxClient;
