//! Release resolution: metadata model, asset selection, and HTTP access.
//!
//! # Sub-modules
//!
//! - [`model`] - `Release`, `Asset`, and `VersionSelector`.
//! - [`assets`] - Platform archive and checksum manifest selection.
//! - [`client`] - Release client trait and `ureq` implementation.

pub mod assets;
pub mod client;
pub mod model;
