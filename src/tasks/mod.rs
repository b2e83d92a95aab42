//! Background Tasks Module
//!
//! Periodic work that keeps query sessions fresh while nobody navigates.
//!
//! # Tasks
//! - Stale check: refetches a session's page once it outlives its stale time

mod stale_check;

pub use stale_check::spawn_stale_check_task;
