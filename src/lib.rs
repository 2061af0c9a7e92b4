//! SMBX2 tileset cutter
//!
//! Turns a single tileset image into the per-tile images, property files and
//! PGE tileset files SMBX2 expects, resolving a unique ID for every tile.
//!
//! ## Modules
//!
//! - [`tile`]: tile records and their persisted property maps
//! - [`ids`]: range specs, ID pools and allocation
//! - [`export`]: image cutting, layouts and descriptor files
//! - [`project`]: project files tying settings and tiles together
//! - [`config`]: per-user defaults

pub mod config;
pub mod export;
pub mod ids;
pub mod project;
pub mod tile;

/// Crate version, shown by the CLI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
