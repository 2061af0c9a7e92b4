//! ID resolution
//!
//! Range specs are parsed into pools, and the allocator draws from a pool to
//! give every tile of a category its own ID.
//!
//! ## Pipeline
//!
//! 1. [`RangeSpec::parse`] turns the user's text (or a preset name) into ranges
//! 2. [`IdPool::from_spec`] materializes them for one allocation pass
//! 3. [`IdAllocator::plan`] picks the IDs, [`AllocationPlan::apply`] commits them

mod allocator;
mod pool;
mod range_spec;

pub use allocator::{AllocationError, AllocationPlan, IdAllocator};
pub use pool::{Direction, IdPool};
pub use range_spec::{
    parse_id_list, resolve_preset, ParseMode, RangeCache, RangeError, RangeSpec, AVOID_SPECIAL,
    MAX_SPEC_IDS, PRESETS, USER_SLOTS,
};
