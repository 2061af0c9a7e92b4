//! Tileset Project
//!
//! A project is the tileset-wide export settings plus every tile marked on the
//! image. It is stored as `<image stem>.json` beside the tileset image and is
//! the single input to allocation and export.

use std::fs;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use log::{debug, info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::export::{scale_master, ExportError, ExportSummary, Exporter, LayoutBuilder};
use crate::ids::{
    parse_id_list, AllocationError, AllocationPlan, Direction, IdAllocator, IdPool, ParseMode,
    RangeCache, RangeError, AVOID_SPECIAL,
};
use crate::tile::{
    from_property_map, to_property_map, Category, GridGeometry, PropertyMap, TileBounds,
    TileError, TileRecord,
};

/// Error type for project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid project file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tile {index}: {source}")]
    Tile { index: usize, source: TileError },
    #[error("invalid {category} ID range: {source}")]
    Range {
        category: Category,
        source: RangeError,
    },
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error("tile at {new} overlaps the tile at {existing}")]
    Overlap {
        new: TileBounds,
        existing: TileBounds,
    },
    #[error("invalid value {value} for setting '{field}'")]
    InvalidSetting { field: &'static str, value: u32 },
    #[error("tile at {bounds} does not land on whole pixels when rescaled from {from}x to {to}x")]
    UnevenScale {
        bounds: TileBounds,
        from: u32,
        to: u32,
    },
}

/// Tileset-wide settings saved with the project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Grid cell size in source pixels
    #[serde(deserialize_with = "number_or_string")]
    pub grid_size: u32,
    /// Gap between grid cells in source pixels
    #[serde(deserialize_with = "number_or_string")]
    pub padding: u32,
    /// Integer upscale applied to the image before cutting
    #[serde(deserialize_with = "number_or_string")]
    pub pixel_scale: u32,
    /// Range spec or preset name for block IDs
    pub block_ids: String,
    /// Range spec or preset name for BGO IDs
    pub bgo_ids: String,
    /// Draw automatic IDs from the top of the range down
    pub start_high: bool,
    pub create_pge_tileset: bool,
}

impl ExportSettings {
    pub const GRID_SIZES: std::ops::RangeInclusive<u32> = 8..=128;
    pub const PIXEL_SCALES: std::ops::RangeInclusive<u32> = 1..=8;

    /// Range spec text for `category`
    pub fn id_spec(&self, category: Category) -> &str {
        match category {
            Category::Block => &self.block_ids,
            Category::Bgo => &self.bgo_ids,
        }
    }

    pub fn direction(&self) -> Direction {
        Direction::from_start_high(self.start_high)
    }

    /// Grid in scaled pixels, the space tile bounds are stored in
    pub fn scaled_grid(&self) -> Result<GridGeometry, ProjectError> {
        if !Self::GRID_SIZES.contains(&self.grid_size) {
            return Err(ProjectError::InvalidSetting {
                field: "grid_size",
                value: self.grid_size,
            });
        }
        if !Self::PIXEL_SCALES.contains(&self.pixel_scale) {
            return Err(ProjectError::InvalidSetting {
                field: "pixel_scale",
                value: self.pixel_scale,
            });
        }
        if self.padding > self.grid_size {
            return Err(ProjectError::InvalidSetting {
                field: "padding",
                value: self.padding,
            });
        }
        GridGeometry::new(self.grid_size * self.pixel_scale, self.padding * self.pixel_scale)
            .map_err(|_| ProjectError::InvalidSetting {
                field: "grid_size",
                value: self.grid_size,
            })
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            grid_size: 16,
            padding: 0,
            pixel_scale: 2,
            block_ids: AVOID_SPECIAL.to_string(),
            bgo_ids: AVOID_SPECIAL.to_string(),
            start_high: false,
            create_pge_tileset: true,
        }
    }
}

/// Older project files stored numeric settings as strings
fn number_or_string<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// On-disk layout of a project file
#[derive(Serialize, Deserialize)]
struct ProjectFile {
    #[serde(flatten)]
    settings: ExportSettings,
    #[serde(default)]
    tiles: Vec<PropertyMap>,
}

/// A tileset image's settings and tiles
#[derive(Debug, Clone, Default)]
pub struct Project {
    pub settings: ExportSettings,
    /// Tiles in authoring order
    pub tiles: Vec<TileRecord>,
    ranges: RangeCache,
}

impl Project {
    /// Create an empty project
    pub fn new(settings: ExportSettings) -> Self {
        Self {
            settings,
            tiles: Vec::new(),
            ranges: RangeCache::new(),
        }
    }

    /// Project file belonging to a tileset image
    pub fn path_for_image(image: &Path) -> PathBuf {
        image.with_extension("json")
    }

    /// Load a project file
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let text = fs::read_to_string(path).map_err(|source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let project = Self::from_json(&text)?;
        info!("Loaded {} tiles from {}", project.tiles.len(), path.display());
        Ok(project)
    }

    /// Load a project file, or start a new project from `defaults` if it doesn't exist
    pub fn load_or_new(path: &Path, defaults: &ExportSettings) -> Result<Self, ProjectError> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!("No project at {}, starting fresh", path.display());
            Ok(Self::new(defaults.clone()))
        }
    }

    /// Parse a project from its JSON form
    pub fn from_json(text: &str) -> Result<Self, ProjectError> {
        let file: ProjectFile = serde_json::from_str(text)?;
        let grid = file.settings.scaled_grid()?;
        let tiles = file
            .tiles
            .iter()
            .enumerate()
            .map(|(index, map)| {
                from_property_map(map, grid).map_err(|source| ProjectError::Tile { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            settings: file.settings,
            tiles,
            ranges: RangeCache::new(),
        })
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, ProjectError> {
        let grid = self.settings.scaled_grid()?;
        let file = ProjectFile {
            settings: self.settings.clone(),
            tiles: self.tiles.iter().map(|t| to_property_map(t, grid)).collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Save to a project file
    pub fn save(&self, path: &Path) -> Result<(), ProjectError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Saved {} tiles to {}", self.tiles.len(), path.display());
        Ok(())
    }

    /// Add a tile, returning its index
    ///
    /// The tile must be valid and must not share pixels with an existing tile.
    pub fn add_tile(&mut self, tile: TileRecord) -> Result<usize, ProjectError> {
        let index = self.tiles.len();
        tile.validate()
            .map_err(|source| ProjectError::Tile { index, source })?;
        if let Some(existing) = self.tiles.iter().find(|t| t.bounds.overlaps(&tile.bounds)) {
            return Err(ProjectError::Overlap {
                new: tile.bounds,
                existing: existing.bounds,
            });
        }
        self.tiles.push(tile);
        Ok(index)
    }

    pub fn remove_tile(&mut self, index: usize) -> Option<TileRecord> {
        (index < self.tiles.len()).then(|| self.tiles.remove(index))
    }

    /// Index of the tile covering the scaled pixel `(x, y)`
    pub fn tile_at(&self, x: u32, y: u32) -> Option<usize> {
        self.tiles.iter().position(|t| {
            let b = &t.bounds;
            x >= b.left && x < b.right && y >= b.top && y < b.bottom
        })
    }

    /// Change the pixel scale, moving every tile to the new scaled space
    ///
    /// Tile bounds and grids are multiplied by `scale / current`. Nothing
    /// changes if any tile would end up on a fractional pixel.
    pub fn set_pixel_scale(&mut self, scale: u32) -> Result<(), ProjectError> {
        if !ExportSettings::PIXEL_SCALES.contains(&scale) {
            return Err(ProjectError::InvalidSetting {
                field: "pixel_scale",
                value: scale,
            });
        }
        let from = self.settings.pixel_scale;
        if scale == from {
            return Ok(());
        }
        if from == 0 {
            return Err(ProjectError::InvalidSetting {
                field: "pixel_scale",
                value: from,
            });
        }

        let rescale = |value: u32| -> Option<u32> {
            let scaled = u64::from(value) * u64::from(scale);
            if scaled % u64::from(from) != 0 {
                return None;
            }
            u32::try_from(scaled / u64::from(from)).ok()
        };
        let mut moved = Vec::with_capacity(self.tiles.len());
        for tile in &self.tiles {
            let uneven = || ProjectError::UnevenScale {
                bounds: tile.bounds,
                from,
                to: scale,
            };
            let b = &tile.bounds;
            let bounds = match (rescale(b.left), rescale(b.top), rescale(b.right), rescale(b.bottom)) {
                (Some(left), Some(top), Some(right), Some(bottom)) => {
                    TileBounds::new(left, top, right, bottom).map_err(|_| uneven())?
                }
                _ => return Err(uneven()),
            };
            let grid = match (rescale(tile.grid.cell_size), rescale(tile.grid.padding)) {
                (Some(cell_size), Some(padding)) => {
                    GridGeometry::new(cell_size, padding).map_err(|_| uneven())?
                }
                _ => return Err(uneven()),
            };
            moved.push((bounds, grid));
        }

        for (tile, (bounds, grid)) in self.tiles.iter_mut().zip(moved) {
            tile.bounds = bounds;
            tile.grid = grid;
        }
        self.settings.pixel_scale = scale;
        info!("Rescaled {} tiles from {}x to {}x", self.tiles.len(), from, scale);
        Ok(())
    }

    /// Number of tiles in `category`
    pub fn count(&self, category: Category) -> usize {
        self.tiles.iter().filter(|t| t.category() == category).count()
    }

    /// Check settings, ID ranges and every tile
    pub fn validate(&self) -> Result<(), ProjectError> {
        self.settings.scaled_grid()?;
        for &category in Category::ALL {
            parse_id_list(self.settings.id_spec(category), category, ParseMode::ValidateOnly)
                .map_err(|source| ProjectError::Range { category, source })?;
        }
        for (index, tile) in self.tiles.iter().enumerate() {
            tile.validate()
                .map_err(|source| ProjectError::Tile { index, source })?;
        }
        for (i, a) in self.tiles.iter().enumerate() {
            if let Some(b) = self.tiles[i + 1..].iter().find(|b| a.bounds.overlaps(&b.bounds)) {
                return Err(ProjectError::Overlap {
                    new: b.bounds,
                    existing: a.bounds,
                });
            }
        }
        Ok(())
    }

    /// Work out IDs for both categories without touching any tile
    pub fn plan_allocation(&mut self) -> Result<Vec<AllocationPlan>, ProjectError> {
        self.validate()?;
        let direction = self.settings.direction();
        let mut plans = Vec::new();
        for &category in Category::ALL {
            let spec = self
                .ranges
                .get(self.settings.id_spec(category), category)
                .map_err(|source| ProjectError::Range { category, source })?;
            let mut pool = IdPool::from_spec(spec);
            let batch = self.tiles.iter().filter(|t| t.category() == category);
            let plan = IdAllocator::new(category, direction).plan(batch, &mut pool)?;
            for tile in self.tiles.iter().filter(|t| t.category() == category) {
                if let Some(id) = tile.manual_id() {
                    if !spec.ranges().iter().any(|r| r.contains(&id)) {
                        warn!("{} ID {} at {} is outside the configured range", category, id, tile.bounds);
                    }
                }
            }
            plans.push(plan);
        }
        Ok(plans)
    }

    /// Resolve an ID for every tile
    ///
    /// Both categories are planned before anything is written, so a failure in
    /// either leaves every tile as it was.
    pub fn allocate(&mut self) -> Result<(), ProjectError> {
        let plans = self.plan_allocation()?;
        for plan in &plans {
            let mut batch: Vec<&mut TileRecord> = self
                .tiles
                .iter_mut()
                .filter(|t| t.category() == plan.category)
                .collect();
            plan.apply(&mut batch);
            info!("Allocated {} {} IDs", plan.ids.len(), plan.category);
        }
        Ok(())
    }

    /// Allocate IDs and export every tile cut from the unscaled `image`
    pub fn export(
        &mut self,
        image: &RgbaImage,
        out_dir: &Path,
        name: &str,
    ) -> Result<ExportSummary, ExportError> {
        self.allocate()?;
        let grid = self.settings.scaled_grid()?;
        let layout = LayoutBuilder::for_grid(grid).ok_or(ProjectError::InvalidSetting {
            field: "grid_size",
            value: self.settings.grid_size,
        })?;
        let master = scale_master(image, self.settings.pixel_scale);
        Exporter::new(out_dir, name, layout)
            .with_pge_tileset(self.settings.create_pge_tileset)
            .export(&master, &self.tiles)
    }
}
