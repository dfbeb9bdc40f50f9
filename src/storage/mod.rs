//! Storage layer
//!
//! This module handles everything that touches the data directory:
//! - Test and result persistence (JSON files)
//! - Question-bank parsing for imports
//! - Bundled default tests seeded on first run

pub mod defaults;
pub mod parser;
pub mod store;

pub use store::{is_test_configured, Storage};
