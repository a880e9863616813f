//! Core building blocks shared by every release-rail command
//!
//! - **config**: release.toml discovery, parsing and resolved run settings
//! - **context**: Release context built once in main.rs
//! - **credentials**: Layered registry credential resolution
//! - **error**: Error taxonomy with exit codes and contextual help
//! - **process**: Synchronous external command execution
//! - **vcs**: Source-control abstraction (SystemGit)

pub mod config;
pub mod context;
pub mod credentials;
pub mod error;
pub mod process;
pub mod vcs;
