//! Ephemeral per-user session state.

pub mod ids;
pub mod state;
pub mod store;
pub mod sweeper;

pub use ids::SessionId;
pub use state::{Session, SummaryRecord};
pub use store::SessionStore;
pub use sweeper::SessionSweeper;
