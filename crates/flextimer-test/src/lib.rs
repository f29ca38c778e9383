//! FlexTimer Test Harness - timing engine validation
//!
//! This crate provides:
//! - Jittery host scheduler simulation over a manual clock
//! - Predefined load scenarios (busy host, throttled background tab)
//! - End-to-end recorded runs through the tokio driver

pub mod integration;
pub mod simulator;

pub use integration::*;
pub use simulator::*;
