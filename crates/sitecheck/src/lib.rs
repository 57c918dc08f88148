//! `sitecheck` - shift inspections and visitor permits for data-center sites
//!
//! This library provides the record model, the `SQLite` store, the checklist
//! catalog and the HTTP surface used by the `sitecheck` binary.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod form;
pub mod logging;
pub mod record;
pub mod service;
pub mod storage;
pub mod web;

pub use catalog::Catalog;
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use record::{Inspection, Permit, Shift};
pub use service::{DayStatus, RecordService};
pub use storage::{Storage, StorageStats};
