//! Grid slicing and coordinate transforms for gridded atmospheric fields.
//!
//! This crate cuts 2-D and 3-D gridded fields with geometric primitives
//! (points, great-circle lines, levels, polygons) and converts between grid
//! indices, earth locations and a display's normalized box. It provides:
//!
//! - **Slicing**: cross-sections, plan views, point probes and polygon subsets
//! - **Level handling**: level sets, level resolution, level <-> altitude
//! - **Coordinate bridge**: grid index <-> earth <-> display box
//! - **Filters**: smoothing kernels and skip subsetting with memoization
//! - **Trajectories**: parcel paths through wind fields as cancellable jobs
//!
//! # Architecture
//!
//! ```text
//! GriddedField + CuttingPrimitive
//!      │
//!      ▼
//! GridSlicer::slice()
//!      │
//!      ├─► SliceCache lookup (field fingerprint, primitive, mode, smoothing)
//!      │         │
//!      │         ├─► hit: return cached slice
//!      │         │
//!      │         └─► miss: SliceExtractor::extract()
//!      │                   │
//!      │                   ├─► CoordinateBridge (earth <-> grid index)
//!      │                   ├─► TransectAxisBuilder (distance along path)
//!      │                   └─► sample_layer (nearest / bilinear)
//!      │
//!      ├─► apply_smoothing (Ready slices only)
//!      │
//!      └─► Checked<SliceResult>  (Ready | Retained | Missing, + conditions)
//! ```
//!
//! Recoverable problems (unit mismatches, degenerate geometry, missing
//! data) never fail a call. They come back as [`Condition`]s next to the
//! value in a [`Checked`]. Errors ([`SliceError`]) are reserved for invalid
//! indices, malformed domains and similar caller mistakes.
//!
//! # Example
//!
//! ```ignore
//! use grid_slicer::{CuttingPrimitive, FieldDescriptor, GridSlicer, SlicerConfig};
//! use geo_common::EarthLocation;
//!
//! let field = FieldDescriptor::from_file("tmp.json")?.into_field()?;
//! let slicer = GridSlicer::new(SlicerConfig::default())?;
//!
//! let line = CuttingPrimitive::line(
//!     EarthLocation::surface(39.0, -105.0),
//!     EarthLocation::surface(39.0, -94.5),
//! );
//! let result = slicer.slice(&field, &line, None, None)?;
//! ```

pub mod bridge;
pub mod cache;
pub mod config;
pub mod descriptor;
pub mod domain;
pub mod error;
pub mod extract;
pub mod field;
pub mod filter;
pub mod levels;
pub mod primitive;
pub mod sampling;
pub mod service;
pub mod slice;
pub mod trajectory;
pub mod transect;
pub mod types;

// Re-export commonly used types at crate root
pub use bridge::{
    earth_to_display_box, BoxCoord, CoordinateBridge, DisplayProjection, GridIndex, LinearDisplayProjection,
};
pub use cache::{SliceCache, SliceKey};
pub use config::SlicerConfig;
pub use descriptor::{DomainDescriptor, FieldDescriptor, VerticalDescriptor};
pub use domain::{HorizontalDomain, SpatialDomain, VerticalAxis, VerticalKind};
pub use error::{Result, SliceError};
pub use extract::{default_transect, slice_fingerprint, SliceExtractor};
pub use field::GriddedField;
pub use filter::{apply_skip, apply_smoothing, KernelSmoother, Smoother, SmoothingMemo};
pub use levels::{
    all_levels, altitude_for_level, level_for_altitude, mask_below_terrain, resolve_level, DataChoice, DataSelection,
    Level, LevelRequest, LevelSet, ResolvedLevel,
};
pub use primitive::{point_in_polygon, CuttingPrimitive};
pub use projection::{height_to_pressure, pressure_to_height};
pub use sampling::{bilinear_interpolate, nearest_interpolate, sample_layer};
pub use service::GridSlicer;
pub use slice::{ProbeSample, Slice, SliceGeometry, SliceResult};
pub use trajectory::{
    integrate_trajectories, seed_points, seeds_from_indices, CancelToken, Trajectory, TrajectoryHandle,
    TrajectoryRequest, TrajectoryRunner,
};
pub use transect::{TransectAxis, TransectAxisBuilder};
pub use types::{CacheStats, Checked, Condition, SamplingMode, SmoothingKind};
