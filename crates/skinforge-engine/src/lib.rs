pub mod duplicate;
pub mod fetch;
pub mod orchestrator;

pub use duplicate::{texture_hash_from_url, DuplicateDetector, DuplicateHit};
pub use fetch::{FetchError, HttpUrlFetcher, UrlFetcher};
pub use orchestrator::{GenerationOrchestrator, GenerationOutcome};
