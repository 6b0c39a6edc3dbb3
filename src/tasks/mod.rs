//! Background Tasks Module
//!
//! Contains the tasks that run alongside caller operations.
//!
//! # Tasks
//! - Expiry sweeper: removes expired cache entries at a fixed interval

mod sweeper;

pub use sweeper::{spawn_sweep_task, SharedStore, Sweeper, SweeperState};
