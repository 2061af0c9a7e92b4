//! Tile records
//!
//! A tile is one rectangular region of the tileset image that becomes a single
//! SMBX2 block or BGO on export.
//!
//! ## Overview
//!
//! - **TileRecord**: geometry, category payload, manual and resolved IDs
//! - **TileKind**: the category-specific half (`Block` or `Bgo`)
//! - **properties**: conversion to and from the minimal property maps stored in
//!   project files

mod attributes;
mod category;
mod properties;
mod record;

pub use attributes::{
    BgoAttributes, BlockAttributes, CollisionType, CommonAttributes, Contents, Light, LightColor,
    TileKind,
};
pub use category::{Category, MAX_BGO_ID, MAX_BLOCK_ID, MAX_NPC_ID, USER_SLOT_IDS};
pub use properties::{from_property_map, to_property_map, PropertyMap};
pub use record::{GridGeometry, TileBounds, TileRecord};

use thiserror::Error;

/// Error type for invalid tile data
#[derive(Debug, Error)]
pub enum TileError {
    #[error("tile bounds {0} are empty")]
    EmptyBounds(TileBounds),
    #[error("grid cell size must be positive (got {cell_size}, padding {padding})")]
    InvalidGrid { cell_size: u32, padding: u32 },
    #[error("tile bounds {bounds} are not aligned to a {cell_size}px grid with {padding}px padding")]
    Misaligned {
        bounds: TileBounds,
        cell_size: u32,
        padding: u32,
    },
    #[error("{id} is not a valid {category} ID")]
    InvalidManualId { category: Category, id: u32 },
    #[error("invalid value {value} for {field}")]
    InvalidAttribute { field: &'static str, value: String },
    #[error("invalid value {value} for property '{key}'")]
    InvalidProperty { key: String, value: String },
    #[error("missing property '{0}'")]
    MissingProperty(&'static str),
}
