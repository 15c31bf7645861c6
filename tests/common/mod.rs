//! Common test utilities for savant-dl integration tests

#[allow(dead_code)]
pub mod config;
#[allow(dead_code)]
pub mod site;

pub use config::*;
#[allow(unused_imports)]
pub use site::*;
