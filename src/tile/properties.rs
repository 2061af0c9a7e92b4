//! Persisted form of a tile
//!
//! A tile is stored as a flat property map holding only the fields that differ
//! from their defaults, plus the geometry and the resolved ID. Keys match the
//! ones the tileset editor has always written. Older files stored numbers as
//! strings, so readers accept both.

use serde_json::{Map, Value};

use super::attributes::{
    BgoAttributes, BlockAttributes, CollisionType, CommonAttributes, Contents, Light, LightColor,
    TileKind,
};
use super::category::Category;
use super::record::{GridGeometry, TileBounds, TileRecord};
use super::TileError;

pub type PropertyMap = Map<String, Value>;

/// Convert a tile into its minimal property map
///
/// `project_grid` is the grid recorded at project level; the tile's own grid is
/// written only when it differs.
pub fn to_property_map(tile: &TileRecord, project_grid: GridGeometry) -> PropertyMap {
    let mut map = PropertyMap::new();
    let b = &tile.bounds;
    map.insert("x1".into(), b.left.into());
    map.insert("y1".into(), b.top.into());
    map.insert("x2".into(), b.right.into());
    map.insert("y2".into(), b.bottom.into());

    if tile.grid != project_grid {
        map.insert("cell_size".into(), tile.grid.cell_size.into());
        map.insert("cell_padding".into(), tile.grid.padding.into());
    }

    if tile.category() != Category::Block {
        map.insert("tile_type".into(), tile.category().label().into());
    }
    if let Some(id) = tile.manual_id() {
        map.insert("tile_id".into(), id.into());
    }
    if let Some(id) = tile.assigned_id() {
        map.insert("assigned_id".into(), id.into());
    }

    let common = &tile.common;
    put_if(&mut map, "frames", common.frames, CommonAttributes::DEFAULT_FRAMES);
    put_if(&mut map, "framespeed", common.framespeed, CommonAttributes::DEFAULT_FRAMESPEED);
    put_if(&mut map, "no_shadows", common.no_shadows, false);

    if let Some(light) = &common.light {
        let default = Light::default();
        map.insert("light_source".into(), true.into());
        put_if(&mut map, "lightoffsetx", light.offset_x, default.offset_x);
        put_if(&mut map, "lightoffsety", light.offset_y, default.offset_y);
        put_if(&mut map, "lightradius", light.radius, default.radius);
        if light.brightness != default.brightness {
            map.insert("lightbrightness".into(), f64::from(light.brightness).into());
        }
        if light.color != default.color {
            map.insert("lightcolor".into(), light.color.to_string().into());
        }
        put_if(&mut map, "lightflicker", light.flicker, default.flicker);
    }

    match &tile.kind {
        TileKind::Bgo(bgo) => {
            put_if(&mut map, "priority", bgo.priority, BgoAttributes::DEFAULT_PRIORITY);
        }
        TileKind::Block(block) => {
            if block.collision != CollisionType::Solid {
                map.insert("collision_type".into(), block.collision.label().into());
            }
            if block.contents != Contents::Empty {
                map.insert("content_type".into(), block.contents.type_label().into());
                map.insert("content_id".into(), block.contents.id().into());
            }
            put_if(&mut map, "smashable", block.smashable, 0);
            put_if(&mut map, "playerfilter", block.player_filter, 0);
            put_if(&mut map, "npcfilter", block.npc_filter, 0);
            put_if(&mut map, "sizable", block.sizable, false);
            put_if(&mut map, "pswitchable", block.pswitchable, false);
            put_if(&mut map, "slippery", block.slippery, false);
            put_if(&mut map, "lava", block.lava, false);
            put_if(&mut map, "bumpable", block.bumpable, false);
            put_if(&mut map, "customhurt", block.custom_hurt, false);
            put_if(&mut map, "ediblebyvine", block.edible_by_vine, false);
        }
    }

    map
}

/// Rebuild a tile from a property map, filling in defaults
pub fn from_property_map(map: &PropertyMap, project_grid: GridGeometry) -> Result<TileRecord, TileError> {
    let bounds = TileBounds::new(
        require(map, "x1", read_u32)?,
        require(map, "y1", read_u32)?,
        require(map, "x2", read_u32)?,
        require(map, "y2", read_u32)?,
    )?;

    let grid = match read_u32(map, "cell_size")? {
        Some(cell_size) => GridGeometry::new(cell_size, read_u32(map, "cell_padding")?.unwrap_or(0))?,
        None => project_grid,
    };

    let category = match read_str(map, "tile_type")? {
        Some(label) => Category::from_label(label).ok_or_else(|| invalid("tile_type", label))?,
        None => Category::Block,
    };

    let mut tile = TileRecord::new(category, bounds, grid);
    let manual_id = read_u32(map, "tile_id")?;
    tile.set_manual_id(manual_id);
    // A stale resolved ID that contradicts the manual one is dropped
    if let Some(id) = read_u32(map, "assigned_id")? {
        if manual_id.is_none() || manual_id == Some(id) {
            tile.set_assigned_id(id);
        }
    }

    let common = &mut tile.common;
    common.frames = read_u32(map, "frames")?.unwrap_or(CommonAttributes::DEFAULT_FRAMES);
    common.framespeed = read_u32(map, "framespeed")?.unwrap_or(CommonAttributes::DEFAULT_FRAMESPEED);
    common.no_shadows = read_bool(map, "no_shadows")?.unwrap_or(false);

    if read_bool(map, "light_source")?.unwrap_or(false) {
        let default = Light::default();
        let color = match read_str(map, "lightcolor")? {
            Some(text) => LightColor::parse(text).ok_or_else(|| invalid("lightcolor", text))?,
            None => default.color,
        };
        common.light = Some(Light {
            offset_x: read_i32(map, "lightoffsetx")?.unwrap_or(default.offset_x),
            offset_y: read_i32(map, "lightoffsety")?.unwrap_or(default.offset_y),
            radius: read_u32(map, "lightradius")?.unwrap_or(default.radius),
            brightness: read_f32(map, "lightbrightness")?.unwrap_or(default.brightness),
            color,
            flicker: read_bool(map, "lightflicker")?.unwrap_or(default.flicker),
        });
    }

    tile.kind = match category {
        Category::Bgo => TileKind::Bgo(BgoAttributes {
            priority: read_i32(map, "priority")?.unwrap_or(BgoAttributes::DEFAULT_PRIORITY),
        }),
        Category::Block => {
            let collision = match read_str(map, "collision_type")? {
                Some(label) => CollisionType::from_label(label)
                    .ok_or_else(|| invalid("collision_type", label))?,
                None => CollisionType::Solid,
            };
            let content_id = read_u32(map, "content_id")?.unwrap_or(0);
            let contents = match read_str(map, "content_type")? {
                Some(label) => Contents::from_parts(label, content_id)
                    .ok_or_else(|| invalid("content_type", label))?,
                None => Contents::Empty,
            };
            let smashable = read_u32(map, "smashable")?.unwrap_or(0);
            TileKind::Block(BlockAttributes {
                collision,
                contents,
                smashable: u8::try_from(smashable)
                    .map_err(|_| invalid("smashable", &smashable.to_string()))?,
                player_filter: read_i32(map, "playerfilter")?.unwrap_or(0),
                npc_filter: read_i32(map, "npcfilter")?.unwrap_or(0),
                sizable: read_bool(map, "sizable")?.unwrap_or(false),
                pswitchable: read_bool(map, "pswitchable")?.unwrap_or(false),
                slippery: read_bool(map, "slippery")?.unwrap_or(false),
                lava: read_bool(map, "lava")?.unwrap_or(false),
                bumpable: read_bool(map, "bumpable")?.unwrap_or(false),
                custom_hurt: read_bool(map, "customhurt")?.unwrap_or(false),
                edible_by_vine: read_bool(map, "ediblebyvine")?.unwrap_or(false),
            })
        }
    };

    Ok(tile)
}

fn put_if<T>(map: &mut PropertyMap, key: &str, value: T, default: T)
where
    T: PartialEq + Into<Value>,
{
    if value != default {
        map.insert(key.to_string(), value.into());
    }
}

fn invalid(key: &str, value: &str) -> TileError {
    TileError::InvalidProperty {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn require<T>(
    map: &PropertyMap,
    key: &'static str,
    read: fn(&PropertyMap, &str) -> Result<Option<T>, TileError>,
) -> Result<T, TileError> {
    read(map, key)?.ok_or(TileError::MissingProperty(key))
}

fn read_str<'a>(map: &'a PropertyMap, key: &str) -> Result<Option<&'a str>, TileError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(invalid(key, &other.to_string())),
    }
}

/// Read a number stored either as a JSON number or as a decimal string
fn read_f64(map: &PropertyMap, key: &str) -> Result<Option<f64>, TileError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| invalid(key, &n.to_string())),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| invalid(key, s)),
        Some(other) => Err(invalid(key, &other.to_string())),
    }
}

fn read_integer(map: &PropertyMap, key: &str) -> Result<Option<i64>, TileError> {
    match read_f64(map, key)? {
        None => Ok(None),
        Some(v) if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 => {
            Ok(Some(v as i64))
        }
        Some(v) => Err(invalid(key, &v.to_string())),
    }
}

fn read_u32(map: &PropertyMap, key: &str) -> Result<Option<u32>, TileError> {
    read_integer(map, key)?
        .map(|v| u32::try_from(v).map_err(|_| invalid(key, &v.to_string())))
        .transpose()
}

fn read_i32(map: &PropertyMap, key: &str) -> Result<Option<i32>, TileError> {
    read_integer(map, key)?
        .map(|v| i32::try_from(v).map_err(|_| invalid(key, &v.to_string())))
        .transpose()
}

fn read_f32(map: &PropertyMap, key: &str) -> Result<Option<f32>, TileError> {
    Ok(read_f64(map, key)?.map(|v| v as f32))
}

fn read_bool(map: &PropertyMap, key: &str) -> Result<Option<bool>, TileError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::Number(n)) if n.as_u64() == Some(0) => Ok(Some(false)),
        Some(Value::Number(n)) if n.as_u64() == Some(1) => Ok(Some(true)),
        Some(Value::String(s)) => match s.as_str() {
            "true" | "True" | "1" => Ok(Some(true)),
            "false" | "False" | "0" => Ok(Some(false)),
            _ => Err(invalid(key, s)),
        },
        Some(other) => Err(invalid(key, &other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn grid() -> GridGeometry {
        GridGeometry::new(32, 0).unwrap()
    }

    fn as_map(value: Value) -> PropertyMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_default_tile_is_minimal() {
        let tile = TileRecord::new(Category::Block, TileBounds::new(0, 32, 32, 64).unwrap(), grid());
        let map = to_property_map(&tile, grid());
        assert_eq!(Value::Object(map), json!({ "x1": 0, "y1": 32, "x2": 32, "y2": 64 }));
    }

    #[test]
    fn test_non_default_fields_survive() {
        let mut tile = TileRecord::new(Category::Block, TileBounds::new(0, 0, 64, 32).unwrap(), grid());
        tile.set_manual_id(Some(42));
        tile.common.frames = 4;
        tile.common.light = Some(Light {
            radius: 64,
            color: LightColor { r: 0xff, g: 0x80, b: 0x40 },
            ..Light::default()
        });
        tile.kind = TileKind::Block(BlockAttributes {
            collision: CollisionType::FloorSlopeLeft,
            contents: Contents::Coins(5),
            lava: true,
            ..BlockAttributes::default()
        });

        let map = to_property_map(&tile, grid());
        assert_eq!(map.get("tile_id"), Some(&json!(42)));
        assert_eq!(map.get("collision_type"), Some(&json!("Slope ◣")));
        assert_eq!(map.get("lightcolor"), Some(&json!("#ff8040")));
        assert!(!map.contains_key("lightoffsetx"));
        assert!(!map.contains_key("framespeed"));

        let loaded = from_property_map(&map, grid()).unwrap();
        assert_eq!(loaded, tile);
    }

    #[test]
    fn test_legacy_string_values() {
        let map = as_map(json!({
            "x1": 0.0, "y1": 0.0, "x2": 32.0, "y2": 32.0,
            "tile_type": "BGO",
            "tile_id": "",
            "frames": "2",
            "priority": -20,
            "light_source": false,
            "lightradius": "300"
        }));
        let tile = from_property_map(&map, grid()).unwrap();
        assert_eq!(tile.category(), Category::Bgo);
        assert_eq!(tile.manual_id(), None);
        assert_eq!(tile.common.frames, 2);
        assert_eq!(tile.common.light, None);
        assert_eq!(tile.kind, TileKind::Bgo(BgoAttributes { priority: -20 }));
    }

    #[test]
    fn test_own_grid_is_kept() {
        let own = GridGeometry::new(16, 2).unwrap();
        let tile = TileRecord::new(Category::Bgo, TileBounds::new(0, 0, 16, 16).unwrap(), own);
        let map = to_property_map(&tile, grid());
        assert_eq!(map.get("cell_size"), Some(&json!(16)));
        assert_eq!(from_property_map(&map, grid()).unwrap().grid, own);
    }

    #[test]
    fn test_bad_values_are_rejected() {
        let missing = as_map(json!({ "x1": 0, "y1": 0, "x2": 32 }));
        assert!(matches!(
            from_property_map(&missing, grid()),
            Err(TileError::MissingProperty("y2"))
        ));

        let bad_type = as_map(json!({ "x1": 0, "y1": 0, "x2": 32, "y2": 32, "tile_type": "NPC" }));
        assert!(matches!(
            from_property_map(&bad_type, grid()),
            Err(TileError::InvalidProperty { .. })
        ));

        let negative = as_map(json!({ "x1": -32, "y1": 0, "x2": 32, "y2": 32 }));
        assert!(from_property_map(&negative, grid()).is_err());
    }
}
