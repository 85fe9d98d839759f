//! Packrat - an interactive front-end for 7-Zip.
//!
//! Plans archive creation and extraction, gates them on available memory,
//! CPU load and disk space, and drives the external `7zz`/`7z` executable:
//! - Path resolution for dragged-in or typed paths
//! - Resource estimation per compression level
//! - Persisted user preferences
//! - Smart archive naming and output planning
//! - Multi-archive extraction with conflict policies

pub mod app;
pub mod awake;
pub mod config;
pub mod error;
pub mod extract;
pub mod file;
pub mod gateway;
pub mod interactive;
pub mod naming;
pub mod planner;
pub mod preferences;
pub mod resource;
pub mod secret;
pub mod types;
pub mod ui;
