//! Kit fetcher library.
//!
//! This crate downloads a KitOps release for the current platform, verifies
//! its SHA-256 digest against the release's checksum manifest, and extracts
//! it only once verification succeeds. It also drives the fetched `kit`
//! binary for registry and ModelKit operations. It is used by the
//! `kit-fetcher` CLI binary and can be consumed programmatically.
//!
//! # Modules
//!
//! - [`checksum`] - SHA-256 digests and checksum manifest verification
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - TOML configuration with command-line overrides
//! - [`error`] - Semantic error types for fetching and running kit
//! - [`extraction`] - Gzip-compressed tar extraction
//! - [`fetch`] - Verified fetch orchestration
//! - [`kit`] - Kit command assembly and execution
//! - [`output`] - User-facing progress output
//! - [`release`] - Release metadata, asset selection, and HTTP download

pub mod checksum;
pub mod cli;
pub mod config;
pub mod error;
pub mod extraction;
pub mod fetch;
pub mod kit;
pub mod output;
pub mod release;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
