//! Cell hashing for the uniform grids.
//!
//! Positions map to integer cells by flooring against the cell size;
//! cells map to table slots by an XOR of three odd-prime multiplies.
//! Negative coordinates are supported; no shift is applied.

use glam::{IVec3, Vec3};
use nearfield_types::constants::{HASH_PRIME_X, HASH_PRIME_Y, HASH_PRIME_Z};

/// Integer cell coordinate containing `position`.
#[inline]
pub fn cell_coord(position: Vec3, cell_size: f32) -> IVec3 {
    (position / cell_size).floor().as_ivec3()
}

/// Raw cell hash. Multiplies wrap on overflow, as they do in device code.
#[inline]
pub fn cell_hash(coord: IVec3) -> i32 {
    coord.x.wrapping_mul(HASH_PRIME_X)
        ^ coord.y.wrapping_mul(HASH_PRIME_Y)
        ^ coord.z.wrapping_mul(HASH_PRIME_Z)
}

/// Table slot for `coord` in a table of `capacity` slots.
#[inline]
pub fn hash_slot(coord: IVec3, capacity: u32) -> u32 {
    (cell_hash(coord) % capacity as i32).unsigned_abs()
}
