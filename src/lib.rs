//! FTP server with pluggable storage drivers, credential checks, listing
//! permissions and event notifiers.

pub mod config;
pub mod context;
pub mod core_auth;
pub mod core_cli;
pub mod core_driver;
pub mod core_ftpcommand;
pub mod core_network;
pub mod core_notifier;
pub mod core_perm;
pub mod helpers;
pub mod server;
pub mod session;

pub use config::Config;
pub use context::Context;
pub use server::{Server, ServerOptions, ShutdownHandle};
