//! hub-core library.
//!
//! Client-side model and cache reconciliation for the project hub:
//! organizations → projects → tasks → comments, fetched once as a tree and
//! kept current by patching it with mutation results.
//!
//! # Conventions
//!
//! - **Errors**: `HubError` for request failures, `anyhow::Result` at the
//!   configuration edge.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod dispatch;
pub mod error;
pub mod graphql;
pub mod load;
pub mod model;
pub mod mutation;
pub mod notice;
pub mod patch;
pub mod snapshot;
pub mod store;
pub mod timing;
pub mod transport;

pub use dispatch::{Dispatcher, Settled};
pub use error::{ErrorCode, HubError};
pub use mutation::Mutation;
pub use patch::{Patch, PatchOutcome};
pub use snapshot::Snapshot;
pub use store::{LoadState, RequestId, Store};
pub use transport::Transport;
