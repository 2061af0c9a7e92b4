//! Text descriptors written next to the exported images
//!
//! Every tile gets a `key=value` property file in SMBX2 config style, and each
//! category gets a PGE tileset file describing where its tiles sit.

use crate::tile::{BgoAttributes, CommonAttributes, Contents, Light, TileKind, TileRecord};

use super::layout::TileLayout;

/// Ordered `(key, value)` pairs for a tile's property file
///
/// Universal fields come first, then light fields for light sources, then the
/// category-specific ones. Values equal to the engine default are left out.
/// `lightradius` is kept for every light source since the engine treats a
/// missing radius as no light.
pub fn tile_properties(tile: &TileRecord) -> Vec<(&'static str, String)> {
    let mut props = Vec::new();
    let common = &tile.common;

    if common.frames != CommonAttributes::DEFAULT_FRAMES {
        props.push(("frames", common.frames.to_string()));
    }
    if common.framespeed != CommonAttributes::DEFAULT_FRAMESPEED {
        props.push(("framespeed", common.framespeed.to_string()));
    }
    if common.no_shadows {
        props.push(("noshadows", "true".to_string()));
    }

    if let Some(light) = &common.light {
        let default = Light::default();
        if light.offset_x != default.offset_x {
            props.push(("lightoffsetx", light.offset_x.to_string()));
        }
        if light.offset_y != default.offset_y {
            props.push(("lightoffsety", light.offset_y.to_string()));
        }
        props.push(("lightradius", light.radius.to_string()));
        if light.brightness != default.brightness {
            props.push(("lightbrightness", light.brightness.to_string()));
        }
        if light.color != default.color {
            props.push(("lightcolor", light.color.to_config_hex()));
        }
        if light.flicker {
            props.push(("lightflicker", "true".to_string()));
        }
    }

    match &tile.kind {
        TileKind::Bgo(bgo) => {
            if bgo.priority != BgoAttributes::DEFAULT_PRIORITY {
                props.push(("priority", bgo.priority.to_string()));
            }
        }
        TileKind::Block(block) => {
            if let Some((key, value)) = block.collision.config_entry() {
                props.push((key, value.to_string()));
            }
            match block.contents {
                Contents::Empty => {}
                Contents::Coins(n) => {
                    props.push(("contenttype", "coins".to_string()));
                    props.push(("contentid", n.to_string()));
                }
                Contents::Npc(id) => {
                    props.push(("contenttype", "npc".to_string()));
                    props.push(("contentid", id.to_string()));
                }
            }
            if block.smashable != 0 {
                props.push(("smashable", block.smashable.to_string()));
            }
            if block.player_filter != 0 {
                props.push(("playerfilter", block.player_filter.to_string()));
            }
            if block.npc_filter != 0 {
                props.push(("npcfilter", block.npc_filter.to_string()));
            }
            let flags = [
                ("sizable", block.sizable),
                ("pswitchable", block.pswitchable),
                ("slippery", block.slippery),
                ("lava", block.lava),
                ("bumpable", block.bumpable),
                ("customhurt", block.custom_hurt),
                ("ediblebyvine", block.edible_by_vine),
            ];
            for (key, set) in flags {
                if set {
                    props.push((key, "true".to_string()));
                }
            }
        }
    }
    props
}

/// Render the property file body for a tile
pub fn render_properties(tile: &TileRecord) -> String {
    tile_properties(tile)
        .into_iter()
        .map(|(key, value)| format!("{}={}\n", key, value))
        .collect()
}

/// Render a PGE tileset file for one category's layout
pub fn render_pge_tileset(layout: &TileLayout, name: &str) -> String {
    let mut out = format!(
        "[tileset]\nname={}\ntype={}\nrows={}\ncols={}\n",
        name,
        layout.category.pge_type(),
        layout.row_count(),
        layout.column_count()
    );
    for (row, column, id) in layout.cells() {
        out.push_str(&format!("item-{}-{}={}\n", column, row, id));
    }
    out
}
