//! Tile records - one exportable region of the tileset

use std::fmt;

use super::attributes::{CommonAttributes, TileKind};
use super::category::Category;
use super::TileError;

/// Pixel rectangle in the tileset's scaled pixel space
///
/// `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileBounds {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl TileBounds {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Result<Self, TileError> {
        let bounds = Self { left, top, right, bottom };
        if right <= left || bottom <= top {
            return Err(TileError::EmptyBounds(bounds));
        }
        Ok(bounds)
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Check whether two rectangles share any pixel
    pub fn overlaps(&self, other: &TileBounds) -> bool {
        self.right > other.left
            && self.left < other.right
            && self.bottom > other.top
            && self.top < other.bottom
    }
}

impl fmt::Display for TileBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})-({}, {})", self.left, self.top, self.right, self.bottom)
    }
}

/// Grid in effect when a tile was drawn, in scaled pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    /// Edge length of one grid cell
    pub cell_size: u32,
    /// Gap between neighbouring cells
    pub padding: u32,
}

impl GridGeometry {
    pub fn new(cell_size: u32, padding: u32) -> Result<Self, TileError> {
        if cell_size == 0 {
            return Err(TileError::InvalidGrid { cell_size, padding });
        }
        Ok(Self { cell_size, padding })
    }

    /// Distance between the origins of neighbouring cells
    pub fn pitch(&self) -> u32 {
        self.cell_size + self.padding
    }

    /// Number of whole cells covered by a span of `extent` pixels
    ///
    /// Accepts spans that include or exclude the trailing padding.
    pub fn cells_in(&self, extent: u32) -> u32 {
        (extent + self.padding) / self.pitch()
    }

    fn span_aligned(&self, extent: u32) -> bool {
        let pitch = self.pitch();
        self.cells_in(extent) >= 1
            && ((extent + self.padding) % pitch == 0 || extent % pitch == 0)
    }

    /// Check that `bounds` starts on a cell origin and spans whole cells
    pub fn is_aligned(&self, bounds: &TileBounds) -> bool {
        let pitch = self.pitch();
        bounds.left % pitch == 0
            && bounds.top % pitch == 0
            && self.span_aligned(bounds.width())
            && self.span_aligned(bounds.height())
    }
}

/// One marked region of the tileset and everything needed to export it
#[derive(Debug, Clone, PartialEq)]
pub struct TileRecord {
    pub bounds: TileBounds,
    pub grid: GridGeometry,
    /// ID chosen by the author, bypassing the pool
    manual_id: Option<u32>,
    /// ID resolved by the allocator
    assigned_id: Option<u32>,
    pub common: CommonAttributes,
    pub kind: TileKind,
}

impl TileRecord {
    /// Create a tile with default attributes for `category`
    pub fn new(category: Category, bounds: TileBounds, grid: GridGeometry) -> Self {
        Self {
            bounds,
            grid,
            manual_id: None,
            assigned_id: None,
            common: CommonAttributes::default(),
            kind: TileKind::default_for(category),
        }
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }

    pub fn manual_id(&self) -> Option<u32> {
        self.manual_id
    }

    pub fn assigned_id(&self) -> Option<u32> {
        self.assigned_id
    }

    /// Set or clear the author-supplied ID
    ///
    /// A previously resolved ID that no longer matches is dropped so the next
    /// allocation pass resolves it again.
    pub fn set_manual_id(&mut self, manual_id: Option<u32>) {
        if manual_id.is_some() && self.assigned_id != manual_id {
            self.assigned_id = None;
        } else if manual_id.is_none() && self.manual_id.is_some() {
            self.assigned_id = None;
        }
        self.manual_id = manual_id;
    }

    /// Switch the tile to another category
    ///
    /// Category-specific attributes reset to their defaults and the resolved ID
    /// is dropped.
    pub fn set_category(&mut self, category: Category) {
        if category != self.category() {
            self.kind = TileKind::default_for(category);
            self.assigned_id = None;
        }
    }

    /// Record the allocator's decision. Only the first assignment sticks.
    pub(crate) fn assign(&mut self, id: u32) {
        if self.assigned_id.is_none() {
            self.assigned_id = Some(id);
        }
    }

    /// Overwrite the resolved ID (project loading, allocation redraws)
    pub(crate) fn set_assigned_id(&mut self, id: u32) {
        self.assigned_id = Some(id);
    }

    /// Check geometry, manual ID and attribute values
    pub fn validate(&self) -> Result<(), TileError> {
        if !self.grid.is_aligned(&self.bounds) {
            return Err(TileError::Misaligned {
                bounds: self.bounds,
                cell_size: self.grid.cell_size,
                padding: self.grid.padding,
            });
        }
        if let Some(id) = self.manual_id {
            if !self.category().accepts_manual_id(id) {
                return Err(TileError::InvalidManualId {
                    category: self.category(),
                    id,
                });
            }
        }
        self.common.validate()?;
        self.kind.validate()
    }
}
