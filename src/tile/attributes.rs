//! Behavior attributes attached to a tile
//!
//! Attributes that apply to every tile live in [`CommonAttributes`]. Everything
//! else hangs off [`TileKind`], so a BGO can never carry a collision type and a
//! block can never carry a render priority.

use std::fmt;

use super::category::{Category, MAX_NPC_ID, USER_SLOT_IDS};
use super::TileError;

/// 24-bit light color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl LightColor {
    pub const WHITE: LightColor = LightColor { r: 0xff, g: 0xff, b: 0xff };

    /// Parse `#rrggbb` (the leading `#` is optional)
    pub fn parse(text: &str) -> Option<LightColor> {
        let hex = text.strip_prefix('#').unwrap_or(text);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(LightColor {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    /// Hex notation used by SMBX2 config files
    pub fn to_config_hex(&self) -> String {
        format!("0x{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for LightColor {
    fn default() -> Self {
        LightColor::WHITE
    }
}

impl fmt::Display for LightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Light emitted by a tile
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Horizontal offset from the tile's center
    pub offset_x: i32,
    /// Vertical offset from the tile's center
    pub offset_y: i32,
    pub radius: u32,
    pub brightness: f32,
    pub color: LightColor,
    pub flicker: bool,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            offset_x: 0,
            offset_y: 0,
            radius: 128,
            brightness: 1.0,
            color: LightColor::WHITE,
            flicker: false,
        }
    }
}

/// Attributes shared by blocks and BGOs
#[derive(Debug, Clone, PartialEq)]
pub struct CommonAttributes {
    /// Number of animation frames
    pub frames: u32,
    /// Game ticks per animation frame
    pub framespeed: u32,
    pub no_shadows: bool,
    /// Present only when the tile is a light source
    pub light: Option<Light>,
}

impl CommonAttributes {
    pub const DEFAULT_FRAMES: u32 = 1;
    pub const DEFAULT_FRAMESPEED: u32 = 8;

    pub fn validate(&self) -> Result<(), TileError> {
        check_range("frames", self.frames as i64, 1, 1000)?;
        check_range("framespeed", self.framespeed as i64, 1, 100)?;
        if let Some(light) = &self.light {
            if !light.brightness.is_finite() || light.brightness < 0.0 {
                return Err(TileError::InvalidAttribute {
                    field: "lightbrightness",
                    value: light.brightness.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Default for CommonAttributes {
    fn default() -> Self {
        Self {
            frames: Self::DEFAULT_FRAMES,
            framespeed: Self::DEFAULT_FRAMESPEED,
            no_shadows: false,
            light: None,
        }
    }
}

/// How a block collides with players and NPCs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionType {
    #[default]
    Solid,
    Semisolid,
    Passthrough,
    /// Floor slope rising to the right (◢)
    FloorSlopeRight,
    /// Floor slope rising to the left (◣)
    FloorSlopeLeft,
    /// Ceiling slope hanging down on the right (◥)
    CeilingSlopeRight,
    /// Ceiling slope hanging down on the left (◤)
    CeilingSlopeLeft,
}

impl CollisionType {
    pub const ALL: &'static [CollisionType] = &[
        CollisionType::Solid,
        CollisionType::Semisolid,
        CollisionType::Passthrough,
        CollisionType::FloorSlopeRight,
        CollisionType::FloorSlopeLeft,
        CollisionType::CeilingSlopeRight,
        CollisionType::CeilingSlopeLeft,
    ];

    /// Name used in project files
    pub fn label(&self) -> &'static str {
        match self {
            CollisionType::Solid => "Solid",
            CollisionType::Semisolid => "Semisolid",
            CollisionType::Passthrough => "Passthrough",
            CollisionType::FloorSlopeRight => "Slope ◢",
            CollisionType::FloorSlopeLeft => "Slope ◣",
            CollisionType::CeilingSlopeRight => "Slope ◥",
            CollisionType::CeilingSlopeLeft => "Slope ◤",
        }
    }

    pub fn from_label(label: &str) -> Option<CollisionType> {
        CollisionType::ALL.iter().copied().find(|c| c.label() == label)
    }

    /// The SMBX2 config key/value pair describing this collision, if any
    pub fn config_entry(&self) -> Option<(&'static str, &'static str)> {
        match self {
            CollisionType::Solid => None,
            CollisionType::Semisolid => Some(("semisolid", "true")),
            CollisionType::Passthrough => Some(("passthrough", "true")),
            CollisionType::FloorSlopeRight => Some(("floorslope", "-1")),
            CollisionType::FloorSlopeLeft => Some(("floorslope", "1")),
            CollisionType::CeilingSlopeRight => Some(("ceilingslope", "1")),
            CollisionType::CeilingSlopeLeft => Some(("ceilingslope", "-1")),
        }
    }
}

/// What a block releases when hit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Contents {
    #[default]
    Empty,
    Coins(u32),
    Npc(u32),
}

impl Contents {
    pub fn type_label(&self) -> &'static str {
        match self {
            Contents::Empty => "Empty",
            Contents::Coins(_) => "Coins",
            Contents::Npc(_) => "NPC",
        }
    }

    /// Rebuild contents from the project-file type label and id
    pub fn from_parts(type_label: &str, id: u32) -> Option<Contents> {
        match type_label {
            "Empty" => Some(Contents::Empty),
            "Coins" => Some(Contents::Coins(id)),
            "NPC" => Some(Contents::Npc(id)),
            _ => None,
        }
    }

    pub fn id(&self) -> u32 {
        match self {
            Contents::Empty => 0,
            Contents::Coins(n) | Contents::Npc(n) => *n,
        }
    }

    pub fn validate(&self) -> Result<(), TileError> {
        let valid = match *self {
            Contents::Empty => true,
            Contents::Coins(n) => (1..=99).contains(&n),
            Contents::Npc(n) => (1..=MAX_NPC_ID).contains(&n) || USER_SLOT_IDS.contains(&n),
        };
        if valid {
            Ok(())
        } else {
            Err(TileError::InvalidAttribute {
                field: "content_id",
                value: self.id().to_string(),
            })
        }
    }
}

/// Block-only behavior
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockAttributes {
    pub collision: CollisionType,
    pub contents: Contents,
    /// Durability against NPCs: 0 = none, 1 = hit, 2 = broken, 3 = effortlessly broken
    pub smashable: u8,
    /// Character allowed to pass through; -1 means all
    pub player_filter: i32,
    /// NPC allowed to pass through; -1 means all
    pub npc_filter: i32,
    pub sizable: bool,
    pub pswitchable: bool,
    pub slippery: bool,
    pub lava: bool,
    pub bumpable: bool,
    pub custom_hurt: bool,
    pub edible_by_vine: bool,
}

impl BlockAttributes {
    pub fn validate(&self) -> Result<(), TileError> {
        self.contents.validate()?;
        check_range("smashable", self.smashable as i64, 0, 3)?;
        check_range("playerfilter", self.player_filter as i64, -1, 16)?;
        check_range("npcfilter", self.npc_filter as i64, -1, 16)?;
        Ok(())
    }
}

/// BGO-only behavior
#[derive(Debug, Clone, PartialEq)]
pub struct BgoAttributes {
    pub priority: i32,
}

impl BgoAttributes {
    pub const DEFAULT_PRIORITY: i32 = -85;

    pub fn validate(&self) -> Result<(), TileError> {
        check_range("priority", self.priority as i64, -100, 10)
    }
}

impl Default for BgoAttributes {
    fn default() -> Self {
        Self {
            priority: Self::DEFAULT_PRIORITY,
        }
    }
}

/// Category-specific payload of a tile
#[derive(Debug, Clone, PartialEq)]
pub enum TileKind {
    Block(BlockAttributes),
    Bgo(BgoAttributes),
}

impl TileKind {
    pub fn category(&self) -> Category {
        match self {
            TileKind::Block(_) => Category::Block,
            TileKind::Bgo(_) => Category::Bgo,
        }
    }

    /// Default payload for `category`
    pub fn default_for(category: Category) -> TileKind {
        match category {
            Category::Block => TileKind::Block(BlockAttributes::default()),
            Category::Bgo => TileKind::Bgo(BgoAttributes::default()),
        }
    }

    pub fn validate(&self) -> Result<(), TileError> {
        match self {
            TileKind::Block(block) => block.validate(),
            TileKind::Bgo(bgo) => bgo.validate(),
        }
    }
}

fn check_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<(), TileError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(TileError::InvalidAttribute {
            field,
            value: value.to_string(),
        })
    }
}
