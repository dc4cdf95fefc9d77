//! Reuse passes: refresh candidate rows from neighbour data computed
//! in a prior frame, without re-scanning cells.
//!
//! Both passes exploit coherence — a neighbour of my neighbour is
//! likely to be my neighbour — so O(K²) probes per query recover most
//! list changes between frames at a fraction of a full find.

use nearfield_compute::{ComputeBackend, PositionView, TriangleView};
use nearfield_types::constants::{EMPTY, REUSE_FANOUT};
use nearfield_types::{NearfieldError, NearfieldResult};

use crate::candidates::{candidate_width, row_width, CandidateRegister};
use crate::distance::usd_triangle;
use crate::point_grid::PointSpatialGrid;
use crate::triangle_grid::TriangleSpatialGrid;

impl PointSpatialGrid {
    /// Temporal reuse pass over self-mode candidate rows.
    ///
    /// For each of a row's first few candidates, the candidate's own
    /// row is probed; any point within `cell_size * spacing_scale`
    /// that beats the worst kept entry is inserted. The previous list's
    /// worst distance acts as the implicit search bound.
    pub fn refine(
        &self,
        backend: &dyn ComputeBackend,
        candidates: &mut [u32],
        spacing_scale: f32,
    ) -> NearfieldResult<()> {
        let n = self.count;
        if n == 0 {
            return Ok(());
        }
        let k = candidate_width(candidates.len(), n)?;
        let reach = (self.config.cell_size * spacing_scale).powi(2);
        let half = self.half_positions.as_slice();
        let fan = REUSE_FANOUT.min(k);
        let width = backend.max_threadgroup_width();

        backend.dispatch_1d(n, width, &mut |q| {
            let row = q * k..(q + 1) * k;
            let query = half[q].to_vec3();
            let mut register = CandidateRegister::seed(&candidates[row.clone()], |index| {
                match half.get(index as usize) {
                    Some(h) => (query - h.to_vec3()).length_squared(),
                    None => f32::MAX,
                }
            });

            for i in 0..fan {
                let c = candidates[q * k + i];
                if c == EMPTY || c as usize >= n {
                    continue;
                }
                for j in 0..fan {
                    let other = candidates[c as usize * k + j];
                    if other == EMPTY || other as usize >= n || other as usize == q {
                        continue;
                    }
                    let distance = (query - half[other as usize].to_vec3()).length_squared();
                    if distance <= reach && distance < register.worst() {
                        register.insert(other, distance);
                    }
                }
            }
            register.store(&mut candidates[row]);
        });

        tracing::debug!(queries = n, k, "point rows refined");
        Ok(())
    }
}

impl TriangleSpatialGrid {
    /// Structural reuse pass over triangle candidate rows.
    ///
    /// Each query probes the best triangle of up to four of its vertex
    /// neighbours' rows; when a triangle adjacency table (`m × 3`,
    /// sentinel-padded) is supplied, the three neighbours of the
    /// query's current best triangle are probed too.
    pub fn refine(
        &self,
        backend: &dyn ComputeBackend,
        collider: &PositionView<'_>,
        triangles: &TriangleView<'_>,
        external_queries: Option<&PositionView<'_>>,
        candidates: &mut [u32],
        vertex_neighbours: &[u32],
        triangle_neighbours: Option<&[u32]>,
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
        if n_query == 0 || m == 0 {
            return Ok(());
        }
        let k = candidate_width(candidates.len(), n_query)?;
        let nn = row_width(vertex_neighbours.len(), n_query, "vertex-neighbour")?;
        if let Some(adjacency) = triangle_neighbours {
            if adjacency.len() != m * 3 {
                return Err(NearfieldError::BufferShapeMismatch(format!(
                    "triangle adjacency of {} entries does not cover {m} triangles",
                    adjacency.len()
                )));
            }
        }
        let fan = REUSE_FANOUT.min(nn);
        let width = backend.max_threadgroup_width();

        backend.dispatch_1d(n_query, width, &mut |q| {
            let query = match external_queries {
                Some(queries) => queries.get(q),
                None => collider.get(q),
            };
            let row = q * k..(q + 1) * k;

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

            for i in 0..fan {
                let neighbour = vertex_neighbours[q * nn + i];
                if neighbour == EMPTY || neighbour as usize >= n_query {
                    continue;
                }
                // best triangle of the neighbour's row
                let t = candidates[neighbour as usize * k];
                if t == EMPTY || t as usize >= m {
                    continue;
                }
                register.insert(t, usd_to(t));
            }

            if let Some(adjacency) = triangle_neighbours {
                let best = register.best();
                if best != EMPTY && (best as usize) < m {
                    for edge in 0..3 {
                        let t = adjacency[best as usize * 3 + edge];
                        if t == EMPTY || t as usize >= m {
                            continue;
                        }
                        register.insert(t, usd_to(t));
                    }
                }
            }
            register.store(&mut candidates[row]);
        });

        tracing::debug!(queries = n_query, k, "triangle rows refined");
        Ok(())
    }
}
