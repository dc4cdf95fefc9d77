//! # nearfield-broadphase
//!
//! GPU-style broad-phase proximity queries over large point and
//! triangle sets.
//!
//! Two spatial indices produce fixed-width, distance-sorted candidate
//! lists suitable for a narrow-phase pass:
//! 1. [`PointSpatialGrid`] — up to K nearest neighbours within a search
//!    diameter, for a same-set or external query set
//! 2. [`TriangleSpatialGrid`] — up to K nearest triangles by unsigned
//!    squared point-triangle distance
//!
//! Candidate rows are seed-and-output: a row's previous contents prime
//! the next search (fill rows with [`constants::EMPTY`] before first
//! use), and the reuse passes ([`PointSpatialGrid::refine`],
//! [`TriangleSpatialGrid::refine`]) refresh rows from
//! neighbour-of-neighbour data without re-scanning cells.
//!
//! All kernels dispatch through a
//! [`ComputeBackend`](nearfield_compute::ComputeBackend). The indices
//! own their internal buffers, sized once at construction; caller
//! buffers are borrowed per call and never retained.

pub mod bitonic;
pub mod candidates;
pub mod config;
pub mod distance;
pub mod hashing;
pub mod point_grid;
pub mod refine;
pub mod triangle_grid;

pub use candidates::CandidateRegister;
pub use config::{PointGridConfig, TriangleGridConfig};
pub use point_grid::{HashEntry, PointSpatialGrid};
pub use triangle_grid::TriangleSpatialGrid;

pub use nearfield_types::constants;
