//! Grid configuration.
//!
//! Parameters that fix an index's capacities and search geometry at
//! construction. Capacities never resize; build a new grid to grow.

use serde::{Deserialize, Serialize};

use nearfield_types::{NearfieldError, NearfieldResult};

/// Configuration for a [`PointSpatialGrid`](crate::PointSpatialGrid).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointGridConfig {
    /// Grid cell edge length. Must cover the search radius.
    pub cell_size: f32,

    /// Search radius. Candidates are kept within a *diameter* of
    /// `2 * radius` of the query, matching the conservative cell
    /// pruning; pass `r / 2` for a strict "within r" search.
    pub radius: f32,

    /// Maximum number of points a build may submit.
    pub capacity: usize,
}

impl PointGridConfig {
    /// Creates a point grid configuration.
    pub fn new(cell_size: f32, radius: f32, capacity: usize) -> Self {
        Self {
            cell_size,
            radius,
            capacity,
        }
    }

    /// Validates ranges: positive sizes, radius within one cell.
    pub fn validate(&self) -> NearfieldResult<()> {
        if !(self.cell_size > 0.0) {
            return Err(NearfieldError::InvalidConfig(format!(
                "cell_size must be positive, got {}",
                self.cell_size
            )));
        }
        if !(self.radius > 0.0) {
            return Err(NearfieldError::InvalidConfig(format!(
                "radius must be positive, got {}",
                self.radius
            )));
        }
        if self.radius > self.cell_size {
            return Err(NearfieldError::InvalidConfig(format!(
                "radius {} exceeds cell_size {}",
                self.radius, self.cell_size
            )));
        }
        if self.capacity == 0 {
            return Err(NearfieldError::InvalidConfig(
                "capacity must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration for a [`TriangleSpatialGrid`](crate::TriangleSpatialGrid).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriangleGridConfig {
    /// Grid cell edge length.
    pub cell_size: f32,

    /// Slots per cell bucket. Insertions beyond the bucket are dropped;
    /// the build's frame rotation spreads that loss across frames.
    pub bucket_size: usize,

    /// Maximum number of triangles a build may submit.
    pub capacity: usize,
}

impl TriangleGridConfig {
    /// Creates a triangle grid configuration with the default bucket width.
    pub fn new(cell_size: f32, capacity: usize) -> Self {
        Self {
            cell_size,
            bucket_size: nearfield_types::constants::DEFAULT_BUCKET_SIZE,
            capacity,
        }
    }

    /// Sets the bucket width (8 or 16).
    pub fn with_bucket_size(mut self, bucket_size: usize) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    /// Validates ranges: positive cell size, supported bucket width.
    pub fn validate(&self) -> NearfieldResult<()> {
        if !(self.cell_size > 0.0) {
            return Err(NearfieldError::InvalidConfig(format!(
                "cell_size must be positive, got {}",
                self.cell_size
            )));
        }
        if !matches!(self.bucket_size, 8 | 16) {
            return Err(NearfieldError::InvalidConfig(format!(
                "bucket_size must be 8 or 16, got {}",
                self.bucket_size
            )));
        }
        if self.capacity == 0 {
            return Err(NearfieldError::InvalidConfig(
                "capacity must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
