//! Cache of recently computed slices.

mod slice_cache;

pub use slice_cache::{SliceCache, SliceKey};
