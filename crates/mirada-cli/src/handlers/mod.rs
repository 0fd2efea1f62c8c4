//! Command handlers - extracted from main.rs for testability
//!
//! Each handler module contains the execution logic for one CLI command and
//! its tests.

pub mod compare;
pub mod config;
pub mod run;

pub use compare::{execute_compare, CompareOutput};
pub use config::{execute_config, load_config};
pub use run::{apply_overrides, execute_run};
