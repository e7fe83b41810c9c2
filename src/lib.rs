//! Gemini-backed health assistant: article summaries, health answers and
//! wellness tips behind a small HTTP API.

// Strict baseline for the whole crate
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(unused_must_use)]
#![deny(nonstandard_style)]
#![forbid(unsafe_op_in_unsafe_fn)]
// Clippy discipline
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::print_stdout)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::redundant_clone)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used))]

/// Environment-driven configuration.
pub mod config;
/// Prompt templates, backends and the generation client.
#[allow(clippy::missing_errors_doc)]
pub mod generation;
/// HTTP server and API routes.
#[allow(clippy::missing_errors_doc, clippy::unused_async)]
pub mod server;
/// Per-user ephemeral session state.
pub mod session;
/// Entry helpers to start the health assistant.
pub mod start_health_assistant;
