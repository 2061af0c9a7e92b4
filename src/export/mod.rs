//! Tileset export
//!
//! Writes one image and one property file per allocated tile, plus a PGE
//! tileset file per category:
//!
//! ```text
//! out/
//!   block-1001.png
//!   block-1001.txt
//!   background-751.png
//!   background-751.txt
//!   castle-blocks.tileset.ini
//!   castle-bgos.tileset.ini
//! ```
//!
//! Export only runs on fully allocated tiles. A failure part way through can
//! leave some files behind; re-running overwrites them.

mod descriptor;
mod image_cut;
mod layout;

pub use descriptor::{render_pge_tileset, render_properties, tile_properties};
pub use image_cut::{crop_region, cut_tile, scale_master, strip_padding};
pub use layout::{LayoutBuilder, TileLayout};

use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use log::{debug, info};
use thiserror::Error;

use crate::project::ProjectError;
use crate::tile::{Category, TileBounds, TileRecord};

/// Error type for export operations
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode {path}: {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("tile at {bounds} lies outside the {width}x{height} tileset image")]
    OutOfBounds {
        bounds: TileBounds,
        width: u32,
        height: u32,
    },
    #[error("tile at {bounds} has no resolved ID")]
    Unassigned { bounds: TileBounds },
    #[error(transparent)]
    Project(#[from] ProjectError),
}

/// What an export run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub blocks: usize,
    pub bgos: usize,
    /// PGE tileset files written, one per non-empty category
    pub layout_files: Vec<PathBuf>,
}

impl ExportSummary {
    pub fn count(&self, category: Category) -> usize {
        match category {
            Category::Block => self.blocks,
            Category::Bgo => self.bgos,
        }
    }

    fn count_mut(&mut self, category: Category) -> &mut usize {
        match category {
            Category::Block => &mut self.blocks,
            Category::Bgo => &mut self.bgos,
        }
    }
}

/// Writes allocated tiles into an output directory
#[derive(Debug, Clone)]
pub struct Exporter {
    out_dir: PathBuf,
    /// Tileset name used for the PGE files
    name: String,
    layout: LayoutBuilder,
    write_pge_tileset: bool,
}

impl Exporter {
    pub fn new(out_dir: impl Into<PathBuf>, name: impl Into<String>, layout: LayoutBuilder) -> Self {
        Self {
            out_dir: out_dir.into(),
            name: name.into(),
            layout,
            write_pge_tileset: true,
        }
    }

    /// Enable or disable the per-category PGE tileset files
    pub fn with_pge_tileset(mut self, enabled: bool) -> Self {
        self.write_pge_tileset = enabled;
        self
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Path of the PGE tileset file for `category`
    pub fn layout_path(&self, category: Category) -> PathBuf {
        self.out_dir
            .join(format!("{}-{}.tileset.ini", self.name, category.pge_suffix()))
    }

    /// Export every tile cut from `master`, which must already be scaled
    pub fn export(&self, master: &RgbaImage, tiles: &[TileRecord]) -> Result<ExportSummary, ExportError> {
        if let Some(tile) = tiles.iter().find(|t| t.assigned_id().is_none()) {
            return Err(ExportError::Unassigned { bounds: tile.bounds });
        }

        fs::create_dir_all(&self.out_dir).map_err(|source| ExportError::Io {
            path: self.out_dir.clone(),
            source,
        })?;

        let mut summary = ExportSummary::default();
        for &category in Category::ALL {
            let mut batch: Vec<&TileRecord> =
                tiles.iter().filter(|t| t.category() == category).collect();
            if batch.is_empty() {
                continue;
            }
            batch.sort_by_key(|t| t.bounds.left);

            info!("Exporting {} {} tiles to {}", batch.len(), category, self.out_dir.display());
            for tile in &batch {
                self.export_tile(master, tile)?;
            }
            *summary.count_mut(category) = batch.len();

            if self.write_pge_tileset {
                let layout = self.layout.build(category, batch.iter().copied())?;
                let path = self.layout_path(category);
                write_text(&path, &render_pge_tileset(&layout, &self.name))?;
                info!(
                    "Wrote {} ({} rows, {} columns)",
                    path.display(),
                    layout.row_count(),
                    layout.column_count()
                );
                summary.layout_files.push(path);
            }
        }
        Ok(summary)
    }

    /// Write the image and property file for one tile
    pub fn export_tile(&self, master: &RgbaImage, tile: &TileRecord) -> Result<(), ExportError> {
        let id = tile
            .assigned_id()
            .ok_or(ExportError::Unassigned { bounds: tile.bounds })?;
        let stem = format!("{}{}", tile.category().file_prefix(), id);

        let image = cut_tile(master, tile)?;
        let image_path = self.out_dir.join(format!("{}.png", stem));
        image
            .save_with_format(&image_path, ImageFormat::Png)
            .map_err(|source| ExportError::Image {
                path: image_path.clone(),
                source,
            })?;

        let text_path = self.out_dir.join(format!("{}.txt", stem));
        write_text(&text_path, &render_properties(tile))?;

        debug!("Exported {} {} from {}", tile.category(), id, tile.bounds);
        Ok(())
    }
}

fn write_text(path: &Path, contents: &str) -> Result<(), ExportError> {
    fs::write(path, contents).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{BgoAttributes, GridGeometry, TileKind};
    use image::Rgba;
    use tempfile::TempDir;

    const CELL: u32 = 8;

    fn setup_test_dir() -> TempDir {
        TempDir::new().unwrap()
    }

    fn grid() -> GridGeometry {
        GridGeometry::new(CELL, 0).unwrap()
    }

    fn tile(category: Category, column: u32, row: u32, id: u32) -> TileRecord {
        let bounds = TileBounds::new(column * CELL, row * CELL, (column + 1) * CELL, (row + 1) * CELL)
            .unwrap();
        let mut tile = TileRecord::new(category, bounds, grid());
        tile.assign(id);
        tile
    }

    fn master() -> RgbaImage {
        RgbaImage::from_fn(4 * CELL, 4 * CELL, |x, y| Rgba([(x / CELL * 60) as u8, (y / CELL * 60) as u8, 0, 255]))
    }

    fn exporter(dir: &TempDir) -> Exporter {
        Exporter::new(dir.path().join("out"), "castle", LayoutBuilder::for_grid(grid()).unwrap())
    }

    #[test]
    fn test_export_writes_every_artifact() {
        let temp = setup_test_dir();
        let mut bgo = tile(Category::Bgo, 1, 2, 751);
        bgo.kind = TileKind::Bgo(BgoAttributes { priority: -10 });
        let tiles = vec![tile(Category::Block, 2, 0, 1001), tile(Category::Block, 0, 3, 1002), bgo];

        let summary = exporter(&temp).export(&master(), &tiles).unwrap();
        assert_eq!(summary.count(Category::Block), 2);
        assert_eq!(summary.count(Category::Bgo), 1);
        assert_eq!(summary.layout_files.len(), 2);

        let out = temp.path().join("out");
        for name in ["block-1001.png", "block-1001.txt", "block-1002.png", "background-751.png"] {
            assert!(out.join(name).exists(), "{} missing", name);
        }
        assert_eq!(fs::read_to_string(out.join("background-751.txt")).unwrap(), "priority=-10\n");
        assert_eq!(fs::read_to_string(out.join("block-1001.txt")).unwrap(), "");

        let png = image::open(out.join("block-1001.png")).unwrap().to_rgba8();
        assert_eq!(png.dimensions(), (CELL, CELL));
        assert_eq!(*png.get_pixel(0, 0), Rgba([120, 0, 0, 255]));

        let blocks = fs::read_to_string(out.join("castle-blocks.tileset.ini")).unwrap();
        assert!(blocks.contains("type=0\nrows=2\ncols=1\n"));
        assert!(blocks.contains("item-0-0=1001\n"));
        assert!(blocks.contains("item-0-1=1002\n"));
    }

    #[test]
    fn test_empty_category_writes_nothing() {
        let temp = setup_test_dir();
        let tiles = vec![tile(Category::Block, 0, 0, 5)];
        let summary = exporter(&temp).export(&master(), &tiles).unwrap();
        assert_eq!(summary.bgos, 0);
        assert!(!temp.path().join("out/castle-bgos.tileset.ini").exists());
        assert!(temp.path().join("out/castle-blocks.tileset.ini").exists());
    }

    #[test]
    fn test_pge_tileset_can_be_disabled() {
        let temp = setup_test_dir();
        let tiles = vec![tile(Category::Block, 0, 0, 5)];
        let summary = exporter(&temp).with_pge_tileset(false).export(&master(), &tiles).unwrap();
        assert!(summary.layout_files.is_empty());
        assert!(!temp.path().join("out/castle-blocks.tileset.ini").exists());
    }

    #[test]
    fn test_unassigned_tile_blocks_export() {
        let temp = setup_test_dir();
        let unassigned = TileRecord::new(Category::Bgo, TileBounds::new(0, 0, CELL, CELL).unwrap(), grid());
        let tiles = vec![tile(Category::Block, 0, 0, 5), unassigned];
        assert!(matches!(
            exporter(&temp).export(&master(), &tiles),
            Err(ExportError::Unassigned { .. })
        ));
        assert!(!temp.path().join("out").exists());
    }

    #[test]
    fn test_tile_outside_image() {
        let temp = setup_test_dir();
        let tiles = vec![tile(Category::Block, 5, 0, 5)];
        assert!(matches!(
            exporter(&temp).export(&master(), &tiles),
            Err(ExportError::OutOfBounds { .. })
        ));
    }
}
