//! Tile categories and their ID limits

use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest built-in block ID in SMBX2
pub const MAX_BLOCK_ID: u32 = 1291;

/// Highest built-in BGO ID in SMBX2
pub const MAX_BGO_ID: u32 = 303;

/// Highest built-in NPC ID in SMBX2 (used for block contents)
pub const MAX_NPC_ID: u32 = 674;

/// The user-defined slot range shared by BGOs and NPCs
pub const USER_SLOT_IDS: std::ops::RangeInclusive<u32> = 751..=1000;

/// The two kinds of tile exported to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Block,
    #[serde(rename = "BGO")]
    Bgo,
}

impl Category {
    pub const ALL: &'static [Category] = &[Category::Block, Category::Bgo];

    /// Filename prefix for exported images and property files
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Category::Block => "block-",
            Category::Bgo => "background-",
        }
    }

    /// Name used in project files
    pub fn label(&self) -> &'static str {
        match self {
            Category::Block => "Block",
            Category::Bgo => "BGO",
        }
    }

    pub fn from_label(label: &str) -> Option<Category> {
        match label {
            "Block" => Some(Category::Block),
            "BGO" => Some(Category::Bgo),
            _ => None,
        }
    }

    /// Check whether `id` may be used as a manual ID for this category
    pub fn accepts_manual_id(&self, id: u32) -> bool {
        match self {
            Category::Block => (1..=MAX_BLOCK_ID).contains(&id),
            Category::Bgo => (1..=MAX_BGO_ID).contains(&id) || USER_SLOT_IDS.contains(&id),
        }
    }

    /// Value of the `type` key in a PGE tileset file
    pub fn pge_type(&self) -> u8 {
        match self {
            Category::Block => 0,
            Category::Bgo => 1,
        }
    }

    /// Suffix for the PGE tileset filename
    pub fn pge_suffix(&self) -> &'static str {
        match self {
            Category::Block => "blocks",
            Category::Bgo => "bgos",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
