//! Conflict resolution and integrity enforcement
//!
//! Both passes run after synthesis and after refine, in that order.

mod config;
mod core;
mod integrity;
mod time;

pub use config::SchedulerConfig;
pub use core::{ConflictScheduler, Resolution};
pub use integrity::{IntegrityReport, enforce_integrity};
pub use time::parse_local;
