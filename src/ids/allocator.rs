//! ID allocation for one category of tiles

use std::collections::HashSet;

use log::{debug, warn};
use thiserror::Error;

use super::pool::{Direction, IdPool};
use crate::tile::{Category, TileBounds, TileRecord};

/// Error type for failed allocation passes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("not enough {category} IDs: {needed} tiles need an automatic ID but only {available} are free")]
    InsufficientIds {
        category: Category,
        needed: usize,
        available: usize,
    },
    #[error("{category} ID {id} is claimed by more than one tile")]
    DuplicateId { category: Category, id: u32 },
    #[error("{id} is not a valid {category} ID")]
    InvalidManualId { category: Category, id: u32 },
    #[error("tile at {bounds} is a {actual}, not a {expected}")]
    WrongCategory {
        bounds: TileBounds,
        expected: Category,
        actual: Category,
    },
}

/// IDs chosen for a batch, not yet written to the tiles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationPlan {
    pub category: Category,
    /// One ID per tile, in batch order
    pub ids: Vec<u32>,
}

impl AllocationPlan {
    /// Write the planned IDs into the batch the plan was made for
    ///
    /// Replaces any earlier resolution the plan chose to redraw.
    pub fn apply(&self, tiles: &mut [&mut TileRecord]) {
        debug_assert_eq!(tiles.len(), self.ids.len());
        for (tile, &id) in tiles.iter_mut().zip(&self.ids) {
            tile.set_assigned_id(id);
        }
    }
}

/// Assigns unique IDs to the tiles of one category
///
/// Tiles with a manual ID keep it and have it removed from the pool first.
/// Tiles resolved by an earlier pass keep their ID when it is still free; the
/// rest draw from the pool in authoring order.
#[derive(Debug, Clone, Copy)]
pub struct IdAllocator {
    category: Category,
    direction: Direction,
}

impl IdAllocator {
    pub fn new(category: Category, direction: Direction) -> Self {
        Self { category, direction }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Work out an ID for every tile without modifying any of them
    ///
    /// All manual IDs are reserved before anything else. A tile keeps an ID
    /// resolved by an earlier pass unless a manual ID (or an earlier kept ID)
    /// now claims it, in which case it draws a new one. `pool` is consumed by
    /// the pass; build a fresh one for every call.
    pub fn plan<'a>(
        &self,
        tiles: impl IntoIterator<Item = &'a TileRecord>,
        pool: &mut IdPool,
    ) -> Result<AllocationPlan, AllocationError> {
        let category = self.category;
        let tiles: Vec<&TileRecord> = tiles.into_iter().collect();
        let mut ids: Vec<Option<u32>> = vec![None; tiles.len()];
        let mut claimed: HashSet<u32> = HashSet::new();

        for (slot, tile) in ids.iter_mut().zip(&tiles) {
            if tile.category() != category {
                return Err(AllocationError::WrongCategory {
                    bounds: tile.bounds,
                    expected: category,
                    actual: tile.category(),
                });
            }
            if let Some(id) = tile.manual_id() {
                if !category.accepts_manual_id(id) {
                    return Err(AllocationError::InvalidManualId { category, id });
                }
                if !claimed.insert(id) {
                    return Err(AllocationError::DuplicateId { category, id });
                }
                if !pool.discard(id) {
                    debug!("{} ID {} kept outside the pool", category, id);
                }
                *slot = Some(id);
            }
        }

        for (slot, tile) in ids.iter_mut().zip(&tiles) {
            if slot.is_some() {
                continue;
            }
            if let Some(id) = tile.assigned_id() {
                if claimed.insert(id) {
                    pool.discard(id);
                    *slot = Some(id);
                } else {
                    warn!(
                        "{} ID {} at {} is now claimed by another tile, assigning a new one",
                        category, id, tile.bounds
                    );
                }
            }
        }

        let needed = ids.iter().filter(|id| id.is_none()).count();
        let available = pool.len();
        for slot in ids.iter_mut().filter(|id| id.is_none()) {
            match pool.pop(self.direction) {
                Some(id) => *slot = Some(id),
                None => {
                    return Err(AllocationError::InsufficientIds {
                        category,
                        needed,
                        available,
                    })
                }
            }
        }

        let ids: Vec<u32> = ids.into_iter().flatten().collect();
        debug!(
            "planned {} {} IDs ({} drawn from the pool)",
            ids.len(),
            category,
            needed
        );
        Ok(AllocationPlan { category, ids })
    }

    /// Plan and apply in one step
    ///
    /// On error no tile is modified.
    pub fn allocate(
        &self,
        tiles: &mut [&mut TileRecord],
        pool: &mut IdPool,
    ) -> Result<(), AllocationError> {
        let plan = self.plan(tiles.iter().map(|t| &**t), pool)?;
        plan.apply(tiles);
        Ok(())
    }
}
