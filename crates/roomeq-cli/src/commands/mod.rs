//! CLI command implementations.

pub mod calibration;
pub mod common;
pub mod config;
pub mod correct;
pub mod delay;
pub mod devices;
pub mod measure;
