//! Text generation against the Gemini API.
//!
//! - Fixed prompt templates per task
//! - Two interchangeable adapters (wrapped rig client, raw REST)
//! - Advisory API key check
//! - Typed failures separating user errors from transient ones

pub mod backend;
pub mod client;
pub mod error;
pub mod key_check;
#[cfg(test)]
pub(crate) mod mock_server;
pub mod rest;
#[cfg(feature = "rig")]
pub mod rig_adapter;
pub mod task;
pub mod templates;

pub use backend::{BackendKind, Backends, ModelCatalog, ModelDescriptor, TextGenerator};
pub use client::GenerationClient;
pub use error::{ErrorKind, GenerationError, GenerationResult};
pub use rest::{GeminiRestClient, RawResponse};
pub use task::{GenerationRequest, Lifestyle, SamplingParams, Task};
