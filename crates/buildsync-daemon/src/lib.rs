//! buildsync daemon library
//!
//! Components of the `buildsyncd` process:
//! - REST API for triggering passes and inspecting scheduled projects
//! - Timer driving periodic passes
//! - Configuration and server lifecycle

pub mod api;
pub mod config;
pub mod error;
pub mod server;
pub mod trigger;

pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError, DaemonResult, TriggerError};
pub use server::Server;
pub use trigger::SyncTrigger;
