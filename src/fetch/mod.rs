//! Fetching module: the rendering-service client and the fetch gate
//!
//! All page retrieval goes through [`FetchGate::fetch`], which bounds
//! concurrency, applies the politeness delay, and enforces the per-request
//! deadline around the external rendering service.

mod backend;
mod gate;

pub use backend::RenderClient;
pub use gate::{FetchGate, FetchOutcome};
