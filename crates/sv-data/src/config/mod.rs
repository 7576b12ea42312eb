//! Sampling configuration module

pub mod null_handling;
pub mod sample_config;

pub use null_handling::*;
pub use sample_config::*;
