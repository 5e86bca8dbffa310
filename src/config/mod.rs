//! Configuration module for aerostart-rs
//!
//! Handles loading and validating settings from YAML files and environment
//! variables. Components take the section they need by reference; there is
//! no global settings instance.

mod settings;

pub use settings::*;
