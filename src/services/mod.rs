//! Background services.
//!
//! - [`sweeper`]: periodic reconciliation of temporary channels

pub mod sweeper;

pub use sweeper::{SweepReport, Sweeper, spawn_sweeper_task};
