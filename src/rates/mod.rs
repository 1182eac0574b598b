pub(crate) mod rate_service;
pub(crate) mod rate_stream;

// Re-export the public interface
pub use rate_service::{RateService, DEFAULT_LOCALE};
pub use rate_stream::{rate_stream, RateSource};
