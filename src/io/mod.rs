//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `carrier` - HTTP client for the remote tracking endpoint
//! - `registrations` - JSON-file-backed registration store
//! - `command_listener` - TCP listener for register/unregister commands

pub mod carrier;
pub mod command_listener;
pub mod registrations;

// Re-export commonly used types
pub use carrier::CarrierClient;
pub use command_listener::{start_command_listener, CommandListenerConfig};
pub use registrations::{RegistrationError, RegistrationStore};
