//! Constants the spatial hashing scheme is built around.

/// Sentinel marking an empty table slot, candidate entry, or absent
/// neighbour. All-ones in 32 bits, universally.
pub const EMPTY: u32 = u32::MAX;

/// First hash prime, multiplies the x cell coordinate.
///
/// The three primes are load-bearing: changing any of them changes
/// every table layout and the bit-exact expectations in the tests.
pub const HASH_PRIME_X: i32 = 92837111;

/// Second hash prime, multiplies the y cell coordinate.
pub const HASH_PRIME_Y: i32 = 689287499;

/// Third hash prime, multiplies the z cell coordinate.
pub const HASH_PRIME_Z: i32 = 283923481;

/// Maximum candidates per query row. Candidate registers are fixed-width;
/// the per-row K is inferred from buffer sizes and must not exceed this.
pub const MAX_CANDIDATES: usize = 32;

/// Maximum entries walked in a single cell run during candidate search.
pub const MAX_CELL_SCAN: usize = 32;

/// Maximum width of a per-query connected-vertices row.
pub const MAX_CONNECTED: usize = 32;

/// Default bucket width of the triangle grid.
pub const DEFAULT_BUCKET_SIZE: usize = 8;

/// Per-query fan-out of the reuse passes: how many of a row's leading
/// candidates (and of each candidate's own row) are revisited.
pub const REUSE_FANOUT: usize = 4;

/// Default threadgroup width for 1D kernel dispatch.
pub const DEFAULT_THREADGROUP_WIDTH: usize = 256;
