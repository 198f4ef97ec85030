//! Task persistence for the task manager.
//!
//! This crate provides one asynchronous facade, [`TaskService`], over two
//! interchangeable storage backends: SQLite (for packaged native hosts) and a
//! flat JSON collection in key-value storage (for web hosts). The backend is
//! chosen once from the host platform and initialized in the background; every
//! operation waits for that initialization before running.

mod config;
mod date;
mod error;
mod flat;
mod platform;
mod service;
mod sqlite;
mod storage;
mod traits;

pub use config::*;
pub use date::*;
pub use error::*;
pub use flat::*;
pub use platform::*;
pub use service::*;
pub use sqlite::*;
pub use storage::*;
pub use traits::*;
