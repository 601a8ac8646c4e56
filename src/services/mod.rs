//! Services - business logic and lifecycle management
//!
//! This module contains the core services of the tracking gateway:
//! - `commands` - register/unregister command handlers and worker
//! - `registry` - entity registry and host interface
//! - `poller` - periodic refresh of registered entities

pub mod commands;
pub mod poller;
pub mod registry;

// Re-export commonly used types
pub use commands::{run_command_worker, CommandHandler, TrackingCommand};
pub use poller::Poller;
pub use registry::{EntityHost, ParcelRegistry};
