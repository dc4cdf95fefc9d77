//! In-place bitonic sort dispatched through the compute backend.
//!
//! Sorts power-of-two-length buffers of fixed-width records keyed by a
//! `u64`. Three kernels cooperate in the standard pyramid: a first pass
//! runs every stage whose compare distance fits in one threadgroup's
//! shared window, a general pass performs single global
//! compare-exchanges while the distance exceeds the window, and a final
//! pass collapses the remaining stages back inside the window.

use nearfield_compute::{ComputeBackend, GroupScope};
use nearfield_types::{NearfieldError, NearfieldResult};

/// Record sortable by a 64-bit key.
///
/// Ties never swap; keys are unique by construction for hash-table
/// entries, whose low lane is the source index.
pub trait SortKey: Copy {
    fn sort_key(&self) -> u64;
}

/// Left element of the comparator owned by `thread` at compare
/// distance `block`.
#[inline]
fn left_index(thread: usize, block: usize) -> usize {
    ((thread & !(block - 1)) << 1) | (thread & (block - 1))
}

/// Comparator direction for `thread` within the merge stage of `unit`.
#[inline]
fn ascending(thread: usize, unit: usize) -> bool {
    thread & unit == 0
}

#[inline]
fn compare_exchange<T: SortKey>(data: &mut [T], left: usize, right: usize, ascending: bool) {
    let a = data[left].sort_key();
    let b = data[right].sort_key();
    let swap = if ascending { a > b } else { a < b };
    if swap {
        data.swap(left, right);
    }
}

/// Sorts `data` in place by ascending key.
///
/// The length must be zero or a power of two; callers pad with sentinel
/// records whose keys sort to the end.
pub fn sort<T: SortKey>(backend: &dyn ComputeBackend, data: &mut [T]) -> NearfieldResult<()> {
    let n = data.len();
    if n < 2 {
        return Ok(());
    }
    if !n.is_power_of_two() {
        return Err(NearfieldError::BufferShapeMismatch(format!(
            "bitonic sort requires a power-of-two length, got {n}"
        )));
    }

    let threads = n / 2;
    let width = backend.max_threadgroup_width().min(threads);
    let width = if width.is_power_of_two() {
        width
    } else {
        width.next_power_of_two() >> 1
    };

    first_pass(backend, data, threads, width);

    let mut unit = width * 2;
    while unit <= threads {
        let mut block = unit;
        while block > width {
            general_pass(backend, data, threads, width, unit, block);
            block /= 2;
        }
        final_pass(backend, data, threads, width, unit);
        unit *= 2;
    }
    Ok(())
}

/// All stages with compare distances inside one threadgroup window.
///
/// Each group owns a window of `2 * width` elements and runs the
/// stages for unit sizes up to `width` over it, lanes in lockstep per
/// compare distance.
fn first_pass<T: SortKey>(
    backend: &dyn ComputeBackend,
    data: &mut [T],
    threads: usize,
    width: usize,
) {
    backend.dispatch_groups(threads / width, width, &mut |scope: GroupScope| {
        let base = scope.group_id * scope.width * 2;
        let shared = &mut data[base..base + scope.width * 2];
        let mut unit = 1;
        while unit <= scope.width {
            let mut block = unit;
            while block >= 1 {
                for lane in 0..scope.width {
                    let thread = scope.group_id * scope.width + lane;
                    let left = left_index(lane, block);
                    compare_exchange(shared, left, left | block, ascending(thread, unit));
                }
                block /= 2;
            }
            unit *= 2;
        }
    });
}

/// One global compare-exchange per thread, for distances beyond the
/// threadgroup window.
fn general_pass<T: SortKey>(
    backend: &dyn ComputeBackend,
    data: &mut [T],
    threads: usize,
    width: usize,
    unit: usize,
    block: usize,
) {
    backend.dispatch_1d(threads, width, &mut |thread| {
        let left = left_index(thread, block);
        compare_exchange(data, left, left | block, ascending(thread, unit));
    });
}

/// Collapses the remaining stages of `unit` once the compare distance
/// fits back inside the threadgroup window.
fn final_pass<T: SortKey>(
    backend: &dyn ComputeBackend,
    data: &mut [T],
    threads: usize,
    width: usize,
    unit: usize,
) {
    backend.dispatch_groups(threads / width, width, &mut |scope: GroupScope| {
        let base = scope.group_id * scope.width * 2;
        let shared = &mut data[base..base + scope.width * 2];
        let mut block = scope.width;
        while block >= 1 {
            for lane in 0..scope.width {
                let thread = scope.group_id * scope.width + lane;
                let left = left_index(lane, block);
                compare_exchange(shared, left, left | block, ascending(thread, unit));
            }
            block /= 2;
        }
    });
}
