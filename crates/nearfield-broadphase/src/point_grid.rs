//! Point spatial grid: sorted cell table over a point set and
//! K-nearest-within-radius candidate queries.
//!
//! The build pipeline runs six passes in strict order — reset, convert
//! to the half-precision mirror, hash, bitonic sort, reorder, cell
//! boundary sweep — each dispatched through the compute backend. Finds
//! may then be issued any number of times against the same build,
//! independently.

use std::mem;

use glam::{IVec3, Vec3};

use nearfield_compute::{
    BufferAllocator, ComputeBackend, ComputeBuffer, GroupScope, HalfVec3, PositionEncoding,
    PositionView, StorageMode,
};
use nearfield_types::constants::{EMPTY, MAX_CELL_SCAN, MAX_CONNECTED};
use nearfield_types::{NearfieldError, NearfieldResult};

use crate::bitonic::{self, SortKey};
use crate::candidates::{candidate_width, row_width, CandidateRegister};
use crate::config::PointGridConfig;
use crate::distance::sds_box;
use crate::hashing::{cell_coord, hash_slot};

/// One `(hash, payload)` entry of the sorted cell table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashEntry {
    /// Table slot of the point's cell.
    pub hash: u32,
    /// Index of the point in the source position buffer.
    pub index: u32,
}

impl HashEntry {
    /// Sentinel entry filling unused table slots; sorts to the end.
    pub const EMPTY: HashEntry = HashEntry {
        hash: EMPTY,
        index: EMPTY,
    };
}

impl SortKey for HashEntry {
    #[inline]
    fn sort_key(&self) -> u64 {
        ((self.hash as u64) << 32) | self.index as u64
    }
}

/// Spatial hash over a point set.
///
/// Owns its internal buffers; all capacities derive from
/// [`PointGridConfig::capacity`] at construction and never resize.
/// Hash capacity is twice the point capacity, keeping the table's load
/// factor at or below one half.
///
/// Candidate rows are seed-and-output: fill them with
/// [`EMPTY`](nearfield_types::constants::EMPTY) before the first find
/// and leave them alone afterwards — the previous contents prime the
/// next search.
pub struct PointSpatialGrid {
    pub(crate) config: PointGridConfig,
    /// Sorted `(hash, payload)` table.
    pub(crate) hash_table: ComputeBuffer<HashEntry>,
    /// First run index per hash slot, [`EMPTY`] for absent hashes.
    pub(crate) cell_start: ComputeBuffer<u32>,
    /// One-past-last run index per hash slot.
    pub(crate) cell_end: ComputeBuffer<u32>,
    /// Half-precision mirror in source order; read when seeding rows.
    pub(crate) half_positions: ComputeBuffer<HalfVec3>,
    /// Half-precision mirror in table order; read by candidate search.
    pub(crate) sorted_half_positions: ComputeBuffer<HalfVec3>,
    /// Points in the last build.
    pub(crate) count: usize,
}

impl PointSpatialGrid {
    /// Total bytes of internal storage for a grid of `capacity` points:
    /// two cell-boundary arrays, the padded hash table, and the two
    /// half-precision mirrors. Size a
    /// [`HeapAllocator`](nearfield_compute::HeapAllocator) with this to
    /// back the grid from a pre-sized region.
    pub fn sizeof_buffers(capacity: usize) -> usize {
        let slots = capacity * 2;
        let table_len = capacity.next_power_of_two();
        2 * slots * mem::size_of::<u32>()
            + table_len * mem::size_of::<HashEntry>()
            + 2 * capacity * mem::size_of::<HalfVec3>()
    }

    /// Allocates a grid for up to `config.capacity` points.
    pub fn new(
        config: PointGridConfig,
        allocator: &mut dyn BufferAllocator,
    ) -> NearfieldResult<Self> {
        config.validate()?;
        let slots = config.capacity * 2;
        let table_len = config.capacity.next_power_of_two();

        let hash_table =
            ComputeBuffer::alloc(allocator, table_len, StorageMode::Private, HashEntry::EMPTY)?;
        let cell_start = ComputeBuffer::alloc(allocator, slots, StorageMode::Private, EMPTY)?;
        let cell_end = ComputeBuffer::alloc(allocator, slots, StorageMode::Private, EMPTY)?;
        let half_positions = ComputeBuffer::alloc(
            allocator,
            config.capacity,
            StorageMode::Private,
            HalfVec3::default(),
        )?;
        let sorted_half_positions = ComputeBuffer::alloc(
            allocator,
            config.capacity,
            StorageMode::Private,
            HalfVec3::default(),
        )?;

        tracing::debug!(
            capacity = config.capacity,
            slots,
            allocator = allocator.name(),
            "point grid allocated"
        );
        Ok(Self {
            config,
            hash_table,
            cell_start,
            cell_end,
            half_positions,
            sorted_half_positions,
            count: 0,
        })
    }

    /// Number of points in the last build.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The grid's configuration.
    pub fn config(&self) -> &PointGridConfig {
        &self.config
    }

    /// The sorted cell table of the last build (first `count` entries
    /// are populated, the rest are sentinels).
    pub fn hash_table(&self) -> &[HashEntry] {
        self.hash_table.as_slice()
    }

    /// Builds the cell table for `positions`.
    ///
    /// Positions may be packed or aligned f32x3; the conversion kernel
    /// exists per layout and is chosen here, never branched on inside a
    /// kernel.
    pub fn build(
        &mut self,
        backend: &dyn ComputeBackend,
        positions: &PositionView<'_>,
    ) -> NearfieldResult<()> {
        let n = positions.count();
        if n > self.config.capacity {
            return Err(NearfieldError::CapacityExceeded {
                requested: n,
                capacity: self.config.capacity,
            });
        }
        if positions.encoding() == PositionEncoding::PaddedF32x4 {
            return Err(NearfieldError::EncodingUnsupported(
                "point grids accept packed or aligned f32x3 positions".into(),
            ));
        }

        let width = backend.max_threadgroup_width();
        let slots = self.cell_start.len() as u32;
        let cell_size = self.config.cell_size;

        // reset
        {
            let table = self.hash_table.as_mut_slice();
            backend.dispatch_1d(table.len(), width, &mut |i| table[i] = HashEntry::EMPTY);
            let start = self.cell_start.as_mut_slice();
            backend.dispatch_1d(start.len(), width, &mut |i| start[i] = EMPTY);
            let end = self.cell_end.as_mut_slice();
            backend.dispatch_1d(end.len(), width, &mut |i| end[i] = EMPTY);
        }

        // convert to the half-precision mirror
        {
            let half = self.half_positions.as_mut_slice();
            backend.dispatch_1d(n, width, &mut |i| {
                half[i] = HalfVec3::from_vec3(positions.get(i));
            });
        }

        // hash each point's cell into its own table slot
        {
            let table = self.hash_table.as_mut_slice();
            backend.dispatch_1d(n, width, &mut |i| {
                let coord = cell_coord(positions.get(i), cell_size);
                table[i] = HashEntry {
                    hash: hash_slot(coord, slots),
                    index: i as u32,
                };
            });
        }

        // sort the populated power-of-two prefix; sentinels pad the tail
        let n_pad = n.next_power_of_two();
        bitonic::sort(backend, &mut self.hash_table.as_mut_slice()[..n_pad])?;

        // reorder the mirror into table order
        {
            let table = self.hash_table.as_slice();
            let half = self.half_positions.as_slice();
            let sorted = self.sorted_half_positions.as_mut_slice();
            backend.dispatch_1d(n, width, &mut |i| {
                sorted[i] = half[table[i].index as usize];
            });
        }

        // cell boundary sweep over the sorted hashes
        {
            let table = self.hash_table.as_slice();
            let start = self.cell_start.as_mut_slice();
            let end = self.cell_end.as_mut_slice();
            backend.dispatch_groups(n.div_ceil(width), width, &mut |scope: GroupScope| {
                let base = scope.group_id * scope.width;
                // window of width + 1 hashes; slot 0 is the predecessor
                // of the group's first entry
                let mut shared = vec![EMPTY; scope.width + 1];
                shared[0] = if base > 0 { table[base - 1].hash } else { EMPTY };
                for lane in 0..scope.width {
                    if base + lane < n {
                        shared[lane + 1] = table[base + lane].hash;
                    }
                }
                for lane in 0..scope.width {
                    let gid = base + lane;
                    if gid >= n {
                        continue;
                    }
                    let hash = shared[lane + 1];
                    let previous = shared[lane];
                    if gid == 0 || hash != previous {
                        start[hash as usize] = gid as u32;
                        if gid > 0 {
                            end[previous as usize] = gid as u32;
                        }
                    }
                    if gid == n - 1 {
                        end[hash as usize] = gid as u32 + 1;
                    }
                }
            });
        }

        self.count = n;
        tracing::debug!(
            points = n,
            padded = n_pad,
            backend = backend.name(),
            "point grid built"
        );
        Ok(())
    }

    /// Fills per-query candidate rows with up to K nearest neighbours
    /// within the search diameter `2 * radius`.
    ///
    /// Without `external_queries` the grid queries itself: one row per
    /// built point, addressed by the point's index, with the point
    /// excluded from its own row. With external queries, one row per
    /// query in query order and no self exclusion.
    ///
    /// `K` is `candidates.len() / n_query` and must not exceed 32. The
    /// rows' existing contents seed the search; `connected` rows list
    /// indices to exclude, one fixed-width row per query.
    pub fn find_candidates(
        &self,
        backend: &dyn ComputeBackend,
        external_queries: Option<&PositionView<'_>>,
        candidates: &mut [u32],
        connected: Option<&[u32]>,
    ) -> NearfieldResult<()> {
        if let Some(queries) = external_queries {
            if queries.encoding() == PositionEncoding::PaddedF32x4 {
                return Err(NearfieldError::EncodingUnsupported(
                    "point grids accept packed or aligned f32x3 queries".into(),
                ));
            }
        }
        let n_query = match external_queries {
            Some(queries) => queries.count(),
            None => self.count,
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

        let cell_size = self.config.cell_size;
        let half_extent = Vec3::splat(cell_size * 0.5);
        let reach = (2.0 * self.config.radius).powi(2);
        let slots = self.cell_start.len() as u32;
        let table = self.hash_table.as_slice();
        let sorted = self.sorted_half_positions.as_slice();
        let half = self.half_positions.as_slice();
        let cell_start = self.cell_start.as_slice();
        let cell_end = self.cell_end.as_slice();
        let width = backend.max_threadgroup_width();

        backend.dispatch_1d(n_query, width, &mut |q| {
            let (query, row_index, self_index) = match external_queries {
                Some(queries) => (queries.get(q), q, EMPTY),
                None => {
                    let entry = table[q];
                    (sorted[q].to_vec3(), entry.index as usize, entry.index)
                }
            };
            let row = row_index * k..(row_index + 1) * k;
            let excluded = connected.map(|rows| &rows[row_index * v..row_index * v + v]);

            let mut register = CandidateRegister::seed(&candidates[row.clone()], |index| {
                match half.get(index as usize) {
                    Some(h) => (query - h.to_vec3()).length_squared(),
                    None => f32::MAX,
                }
            });

            let home = cell_coord(query, cell_size);
            for dz in -1..=1 {
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        let cell = home + IVec3::new(dx, dy, dz);
                        let centre = (cell.as_vec3() + 0.5) * cell_size;
                        if sds_box(centre - query, half_extent) > reach {
                            continue;
                        }
                        let slot = hash_slot(cell, slots) as usize;
                        let run_start = cell_start[slot];
                        if run_start == EMPTY {
                            continue;
                        }
                        let run_end = cell_end[slot].min(run_start + MAX_CELL_SCAN as u32);
                        for i in run_start..run_end {
                            let entry = table[i as usize];
                            if entry.index == self_index {
                                continue;
                            }
                            let distance =
                                (query - sorted[i as usize].to_vec3()).length_squared();
                            if distance > register.worst() || distance > reach {
                                continue;
                            }
                            if let Some(excluded) = excluded {
                                if excluded.contains(&entry.index) {
                                    continue;
                                }
                            }
                            register.insert(entry.index, distance);
                        }
                    }
                }
            }
            register.store(&mut candidates[row]);
        });

        tracing::debug!(
            queries = n_query,
            k,
            backend = backend.name(),
            "point candidates found"
        );
        Ok(())
    }
}
