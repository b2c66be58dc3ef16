//! Parcel trajectories through gridded wind fields.
//!
//! ```text
//! polygons / grid indices
//!          │
//!          ▼
//!     seed_points()  ──►  Vec<EarthLocation>
//!                                │
//!                                ▼
//!     TrajectoryRunner::submit(TrajectoryRequest)
//!                                │  spawn_blocking + rayon over seeds
//!                                ▼
//!     TrajectoryHandle::wait()  ──►  Vec<Trajectory>  (or Cancelled)
//! ```

mod integrate;
mod runner;
mod seed;

pub use integrate::{integrate_trajectories, Trajectory, TrajectoryRequest};
pub use runner::{CancelToken, TrajectoryHandle, TrajectoryRunner};
pub use seed::{seed_points, seeds_from_indices};
