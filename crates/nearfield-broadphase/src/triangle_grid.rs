//! Triangle spatial grid: bucketed cell table over triangle AABBs and
//! nearest-K-triangle candidate queries.

use std::mem;

use glam::IVec3;

use nearfield_compute::{
    BufferAllocator, ComputeBackend, ComputeBuffer, PositionView, StorageMode, TriangleView,
};
use nearfield_types::constants::{EMPTY, MAX_CONNECTED};
use nearfield_types::{NearfieldError, NearfieldResult};

use crate::candidates::{candidate_width, row_width, CandidateRegister};
use crate::config::TriangleGridConfig;
use crate::distance::usd_triangle;
use crate::hashing::{cell_coord, hash_slot};

/// Bucketed spatial hash over a triangle mesh.
///
/// The hash modulus is the *current* triangle count, not the capacity;
/// each cell owns a fixed bucket of `bucket_size` slots. Insertions
/// beyond a full bucket are dropped — the per-build frame rotation
/// spreads that loss across frames so no triangle is starved forever.
///
/// The index owns only the bucket table and counters. Collider
/// positions and triangle indices stay with the caller and are passed
/// to every build and find; triangle vertex indices must reference the
/// collider buffer.
pub struct TriangleSpatialGrid {
    pub(crate) config: TriangleGridConfig,
    /// Bucketed cell table, `bucket_size` slots per hash.
    pub(crate) hash_table: ComputeBuffer<u32>,
    /// Per-cell insertion counters; count every attempt, including
    /// dropped ones.
    pub(crate) counters: ComputeBuffer<u32>,
    /// Frame counter rotating bucket-drop loss across builds.
    pub(crate) step: u32,
    /// Triangles in the last build (also the hash modulus).
    pub(crate) count: usize,
}

impl TriangleSpatialGrid {
    /// Total bytes of internal storage for a grid of `capacity`
    /// triangles with the given bucket width.
    pub fn sizeof_buffers(capacity: usize, bucket_size: usize) -> usize {
        capacity * bucket_size * mem::size_of::<u32>() + capacity * mem::size_of::<u32>()
    }

    /// Allocates a grid for up to `config.capacity` triangles.
    pub fn new(
        config: TriangleGridConfig,
        allocator: &mut dyn BufferAllocator,
    ) -> NearfieldResult<Self> {
        config.validate()?;
        let hash_table = ComputeBuffer::alloc(
            allocator,
            config.capacity * config.bucket_size,
            StorageMode::Private,
            EMPTY,
        )?;
        let counters = ComputeBuffer::alloc(allocator, config.capacity, StorageMode::Private, 0)?;

        tracing::debug!(
            capacity = config.capacity,
            bucket = config.bucket_size,
            allocator = allocator.name(),
            "triangle grid allocated"
        );
        Ok(Self {
            config,
            hash_table,
            counters,
            step: 0,
            count: 0,
        })
    }

    /// Number of triangles in the last build.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The grid's configuration.
    pub fn config(&self) -> &TriangleGridConfig {
        &self.config
    }

    /// Builds the bucket table for `triangles` over `collider`
    /// positions, advancing the frame counter by one.
    ///
    /// Every cell covered by a triangle's AABB (floored minimum to
    /// ceiled maximum cell) receives the triangle's rotated id.
    pub fn build(
        &mut self,
        backend: &dyn ComputeBackend,
        collider: &PositionView<'_>,
        triangles: &TriangleView<'_>,
    ) -> NearfieldResult<()> {
        let m = triangles.count();
        if m > self.config.capacity {
            return Err(NearfieldError::CapacityExceeded {
                requested: m,
                capacity: self.config.capacity,
            });
        }

        let width = backend.max_threadgroup_width();

        // reset
        {
            let counters = self.counters.as_mut_slice();
            backend.dispatch_1d(counters.len(), width, &mut |i| counters[i] = 0);
            let table = self.hash_table.as_mut_slice();
            backend.dispatch_1d(table.len(), width, &mut |i| table[i] = EMPTY);
        }

        if m > 0 {
            let cell_size = self.config.cell_size;
            let bucket = self.config.bucket_size;
            let step = self.step as usize;
            let table = self.hash_table.as_mut_slice();
            let counters = self.counters.as_mut_slice();

            backend.dispatch_1d(m, width, &mut |g| {
                let rotated = (step + g) % m;
                let [ia, ib, ic] = triangles.get(rotated);
                let a = collider.get(ia as usize);
                let b = collider.get(ib as usize);
                let c = collider.get(ic as usize);

                let lo = a.min(b).min(c);
                let hi = a.max(b).max(c);
                let min_cell = (lo / cell_size).floor().as_ivec3();
                let max_cell = (hi / cell_size).ceil().as_ivec3();

                for z in min_cell.z..=max_cell.z {
                    for y in min_cell.y..=max_cell.y {
                        for x in min_cell.x..=max_cell.x {
                            let slot = hash_slot(IVec3::new(x, y, z), m as u32) as usize;
                            // fetch-add; the sequential reference backend
                            // realizes one legal schedule of the atomic
                            let index = counters[slot] as usize;
                            counters[slot] += 1;
                            if index < bucket {
                                table[slot * bucket + index] = rotated as u32;
                            }
                        }
                    }
                }
            });
        }

        self.step = self.step.wrapping_add(1);
        self.count = m;
        tracing::debug!(
            triangles = m,
            step = self.step,
            backend = backend.name(),
            "triangle grid built"
        );
        Ok(())
    }

    /// Fills per-query candidate rows with up to K nearest triangles by
    /// unsigned squared point-triangle distance.
    ///
    /// Only the query's own cell is searched: build-time AABB expansion
    /// already hashed any nearby triangle into it. A very thin triangle
    /// whose AABB stops short of the query's cell can be missed; that is
    /// the index's documented trade for single-cell lookups.
    ///
    /// Without `external_queries` every collider vertex queries, and
    /// triangles containing the querying vertex are skipped. `connected`
    /// rows exclude triangles touching any listed vertex.
    pub fn find_candidates(
        &self,
        backend: &dyn ComputeBackend,
        collider: &PositionView<'_>,
        triangles: &TriangleView<'_>,
        external_queries: Option<&PositionView<'_>>,
        candidates: &mut [u32],
        connected: Option<&[u32]>,
    ) -> NearfieldResult<()> {
        let m = self.count;
        if triangles.count() != m {
            return Err(NearfieldError::BufferShapeMismatch(format!(
                "triangle buffer holds {} triangles, the built table holds {m}",
                triangles.count()
            )));
        }
        let n_query = match external_queries {
            Some(queries) => queries.count(),
            None => collider.count(),
        };
        if n_query == 0 {
            return Ok(());
        }
        let k = candidate_width(candidates.len(), n_query)?;
        let v = match connected {
            Some(rows) => {
                let v = row_width(rows.len(), n_query, "connected-vertices")?;
                if v > MAX_CONNECTED {
                    return Err(NearfieldError::BufferShapeMismatch(format!(
                        "connected-vertices rows of {v} entries exceed {MAX_CONNECTED}"
                    )));
                }
                v
            }
            None => 0,
        };
        if m == 0 {
            return Ok(());
        }

        let cell_size = self.config.cell_size;
        let bucket = self.config.bucket_size;
        let table = self.hash_table.as_slice();
        let width = backend.max_threadgroup_width();

        backend.dispatch_1d(n_query, width, &mut |q| {
            let query = match external_queries {
                Some(queries) => queries.get(q),
                None => collider.get(q),
            };
            let row = q * k..(q + 1) * k;
            let excluded = connected.map(|rows| &rows[q * v..q * v + v]);

            let usd_to = |t: u32| {
                let [ia, ib, ic] = triangles.get(t as usize);
                usd_triangle(
                    query,
                    collider.get(ia as usize),
                    collider.get(ib as usize),
                    collider.get(ic as usize),
                )
            };
            let mut register = CandidateRegister::seed(&candidates[row.clone()], |t| {
                if (t as usize) < m {
                    usd_to(t)
                } else {
                    f32::MAX
                }
            });

            let slot = hash_slot(cell_coord(query, cell_size), m as u32) as usize;
            for s in 0..bucket {
                let t = table[slot * bucket + s];
                if t == EMPTY {
                    break;
                }
                let [ia, ib, ic] = triangles.get(t as usize);
                if external_queries.is_none()
                    && (ia == q as u32 || ib == q as u32 || ic == q as u32)
                {
                    continue;
                }
                if let Some(excluded) = excluded {
                    if excluded.contains(&ia) || excluded.contains(&ib) || excluded.contains(&ic) {
                        continue;
                    }
                }
                register.insert(t, usd_to(t));
            }
            register.store(&mut candidates[row]);
        });

        tracing::debug!(
            queries = n_query,
            k,
            backend = backend.name(),
            "triangle candidates found"
        );
        Ok(())
    }
}
