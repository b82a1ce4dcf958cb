//! Remote content-distribution API: wire models, the `ContentApi` capability
//! trait, and the HTTP client implementation.

pub mod client;
pub mod models;
pub mod traits;
