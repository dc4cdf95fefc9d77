//! Per-query candidate register file.
//!
//! During one find or reuse call each query thread keeps its best K
//! candidates in a sorted register, seeded from the caller's candidate
//! row and written back at the end. The row doubles as previous-frame
//! seed and output, which is what makes the reuse passes free.

use nearfield_types::constants::{EMPTY, MAX_CANDIDATES};
use nearfield_types::{NearfieldError, NearfieldResult};

#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: u32,
    distance: f32,
}

/// Sorted fixed-width candidate register for one query.
///
/// Entries are ordered by non-decreasing distance; empty slots carry
/// [`EMPTY`] with `f32::MAX` distance and therefore sit at the tail.
#[derive(Debug)]
pub struct CandidateRegister {
    entries: [Candidate; MAX_CANDIDATES],
    k: usize,
}

impl CandidateRegister {
    /// Register of width `row.len()` seeded from an existing candidate
    /// row, recomputing each seeded entry's distance with `seed_distance`.
    pub fn seed(row: &[u32], mut seed_distance: impl FnMut(u32) -> f32) -> Self {
        debug_assert!((1..=MAX_CANDIDATES).contains(&row.len()));
        let mut entries = [Candidate {
            index: EMPTY,
            distance: f32::MAX,
        }; MAX_CANDIDATES];
        for (slot, &index) in entries.iter_mut().zip(row) {
            slot.index = index;
            if index != EMPTY {
                slot.distance = seed_distance(index);
            }
        }
        Self {
            entries,
            k: row.len(),
        }
    }

    /// Distance of the worst kept candidate.
    #[inline]
    pub fn worst(&self) -> f32 {
        self.entries[self.k - 1].distance
    }

    /// Index of the current best candidate ([`EMPTY`] when unseeded).
    #[inline]
    pub fn best(&self) -> u32 {
        self.entries[0].index
    }

    /// Sorted insert of `{index, distance}`, dropping the worst entry.
    ///
    /// The insert position is the first slot whose distance is not
    /// better; a duplicate of `index` already in the register is
    /// consumed by the shift, so an index appears at most once.
    pub fn insert(&mut self, index: u32, distance: f32) {
        let mut insert_at = None;
        let mut duplicate = None;
        for i in 0..self.k {
            if insert_at.is_none() && distance <= self.entries[i].distance {
                insert_at = Some(i);
            }
            if self.entries[i].index == index {
                duplicate = Some(i);
                break;
            }
        }

        let Some(at) = insert_at else { return };
        let mut j = duplicate.unwrap_or(self.k - 1);
        while j > at {
            self.entries[j] = self.entries[j - 1];
            j -= 1;
        }
        self.entries[at] = Candidate { index, distance };
    }

    /// Writes the sorted indices back into the caller's row.
    pub fn store(&self, row: &mut [u32]) {
        for (dst, entry) in row.iter_mut().zip(&self.entries) {
            *dst = entry.index;
        }
    }
}

/// Width of a per-query row in a buffer laid out as `rows × width`.
pub(crate) fn row_width(len: usize, rows: usize, label: &str) -> NearfieldResult<usize> {
    if rows == 0 || len % rows != 0 {
        return Err(NearfieldError::BufferShapeMismatch(format!(
            "{label} buffer of {len} entries does not divide into rows for {rows} queries"
        )));
    }
    Ok(len / rows)
}

/// Row width for candidate buffers: at least one entry, at most
/// [`MAX_CANDIDATES`].
pub(crate) fn candidate_width(len: usize, rows: usize) -> NearfieldResult<usize> {
    let k = row_width(len, rows, "candidate")?;
    if k == 0 || k > MAX_CANDIDATES {
        return Err(NearfieldError::BufferShapeMismatch(format!(
            "candidate rows of {k} entries are outside 1..={MAX_CANDIDATES}"
        )));
    }
    Ok(k)
}
