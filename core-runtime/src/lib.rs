//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the reconciliation engine:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the engine crates depend on.
//! It establishes the logging conventions, configuration wiring, and event
//! broadcasting mechanisms used throughout the system.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::CoreConfig;
pub use error::{Error, Result};
