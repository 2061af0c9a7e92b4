//! Row/column placement of exported tiles
//!
//! Tiles are grouped by the grid row their top edge falls in. Rows without any
//! tile are dropped, so the emitted rows are always numbered `0..R` without
//! gaps even when the tileset image leaves whole rows empty.

use std::collections::BTreeMap;
use std::num::NonZeroU32;

use crate::tile::{Category, GridGeometry, TileRecord};

use super::ExportError;

/// Compacted grid of tile IDs for one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayout {
    pub category: Category,
    rows: Vec<Vec<u32>>,
    columns: usize,
}

impl TileLayout {
    /// Rows in top-to-bottom order, each holding IDs left to right
    pub fn rows(&self) -> &[Vec<u32>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row
    pub fn column_count(&self) -> usize {
        self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every populated cell as `(row, column, id)`
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, u32)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, ids)| {
            ids.iter()
                .enumerate()
                .map(move |(column, &id)| (row, column, id))
        })
    }
}

/// Builds a [`TileLayout`] from allocated tiles
#[derive(Debug, Clone, Copy)]
pub struct LayoutBuilder {
    /// Vertical distance between grid rows in scaled pixels
    row_pitch: NonZeroU32,
}

impl LayoutBuilder {
    pub fn new(row_pitch: NonZeroU32) -> Self {
        Self { row_pitch }
    }

    /// Use the cell height plus padding of `grid` as the row pitch
    pub fn for_grid(grid: GridGeometry) -> Option<Self> {
        NonZeroU32::new(grid.pitch()).map(Self::new)
    }

    /// Grid row a top edge falls in
    pub fn raw_row(&self, top: u32) -> u32 {
        top / self.row_pitch.get()
    }

    /// Lay out the tiles of `category`
    ///
    /// Tiles must already carry an assigned ID and be sorted by their left
    /// edge; that order is kept within each row.
    pub fn build<'a>(
        &self,
        category: Category,
        tiles: impl IntoIterator<Item = &'a TileRecord>,
    ) -> Result<TileLayout, ExportError> {
        let mut by_row: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
        for tile in tiles {
            let id = tile
                .assigned_id()
                .ok_or(ExportError::Unassigned { bounds: tile.bounds })?;
            by_row.entry(self.raw_row(tile.bounds.top)).or_default().push(id);
        }

        let rows: Vec<Vec<u32>> = by_row.into_values().collect();
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        Ok(TileLayout {
            category,
            rows,
            columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileBounds;

    const CELL: u32 = 32;

    fn placed(column: u32, row: u32, id: u32) -> TileRecord {
        let bounds = TileBounds::new(column * CELL, row * CELL, (column + 1) * CELL, (row + 1) * CELL)
            .unwrap();
        let mut tile = TileRecord::new(Category::Block, bounds, GridGeometry::new(CELL, 0).unwrap());
        tile.assign(id);
        tile
    }

    fn builder() -> LayoutBuilder {
        LayoutBuilder::for_grid(GridGeometry::new(CELL, 0).unwrap()).unwrap()
    }

    #[test]
    fn test_rows_follow_top_edge() {
        let tiles = vec![placed(0, 0, 1), placed(0, 1, 2), placed(1, 0, 3), placed(2, 1, 4)];
        let layout = builder().build(Category::Block, &tiles).unwrap();
        assert_eq!(layout.rows(), &[vec![1, 3], vec![2, 4]]);
        assert_eq!(layout.column_count(), 2);
    }

    #[test]
    fn test_consecutive_empty_rows_are_compacted() {
        // Populated raw rows 0, 3 and 7
        let tiles = vec![placed(0, 3, 10), placed(0, 7, 11), placed(1, 0, 12), placed(2, 3, 13), placed(4, 3, 14)];
        let layout = builder().build(Category::Block, &tiles).unwrap();
        assert_eq!(layout.row_count(), 3);
        assert_eq!(layout.rows(), &[vec![12], vec![10, 13, 14], vec![11]]);
        assert_eq!(layout.column_count(), 3);

        let rows: Vec<usize> = layout.cells().map(|(row, _, _)| row).collect();
        assert_eq!(rows, vec![0, 1, 1, 1, 2]);
    }

    #[test]
    fn test_tall_tile_uses_its_top_row() {
        let bounds = TileBounds::new(0, 2 * CELL, CELL, 5 * CELL).unwrap();
        let mut tall = TileRecord::new(Category::Block, bounds, GridGeometry::new(CELL, 0).unwrap());
        tall.assign(5);
        let tiles = vec![tall, placed(1, 4, 6)];
        let layout = builder().build(Category::Block, &tiles).unwrap();
        assert_eq!(layout.rows(), &[vec![5], vec![6]]);
    }

    #[test]
    fn test_padded_grid_rows() {
        let grid = GridGeometry::new(16, 2).unwrap();
        let builder = LayoutBuilder::for_grid(grid).unwrap();
        assert_eq!(builder.raw_row(0), 0);
        assert_eq!(builder.raw_row(18), 1);
        assert_eq!(builder.raw_row(54), 3);
    }

    #[test]
    fn test_empty_and_unassigned() {
        let layout = builder().build(Category::Bgo, &Vec::<TileRecord>::new()).unwrap();
        assert!(layout.is_empty());
        assert_eq!(layout.column_count(), 0);

        let bounds = TileBounds::new(0, 0, CELL, CELL).unwrap();
        let tile = TileRecord::new(Category::Block, bounds, GridGeometry::new(CELL, 0).unwrap());
        assert!(matches!(
            builder().build(Category::Block, [&tile]),
            Err(ExportError::Unassigned { .. })
        ));
    }
}
