//! Shared errors and configuration for Syncgate.
//!
//! This crate provides the types used across all other crates:
//! - Application-wide error type with HTTP status mapping
//! - Configuration management (storage backend, delta policy, logging)

pub mod config;
pub mod error;

pub use config::{AppConfig, DeltaSettings, LogSettings, StorageProvider, StorageSettings};
pub use error::{AppError, AppResult};
