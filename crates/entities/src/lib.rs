//! Core entity definitions for the task manager.
//!
//! This crate defines the task record shared by every storage backend and the
//! input type used to create one.

mod task;

pub use task::*;
