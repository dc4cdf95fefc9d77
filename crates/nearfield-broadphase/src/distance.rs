//! Squared-distance primitives shared by the candidate kernels.

use glam::Vec3;

/// Device-style sign: zero maps to zero.
#[inline]
fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[inline]
fn saturate(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Unsigned squared distance from `p` to triangle `abc`.
///
/// Inigo Quilez's formulation: when the projection of `p` falls outside
/// the face, the result is the nearest of the three clamped edge
/// projections; otherwise the squared distance to the plane.
pub fn usd_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> f32 {
    let ba = b - a;
    let pa = p - a;
    let cb = c - b;
    let pb = p - b;
    let ac = a - c;
    let pc = p - c;
    let nor = ba.cross(ac);

    let outside = sign(ba.cross(nor).dot(pa))
        + sign(cb.cross(nor).dot(pb))
        + sign(ac.cross(nor).dot(pc))
        < 2.0;

    if outside {
        let d_ab = (ba * saturate(ba.dot(pa) / ba.length_squared()) - pa).length_squared();
        let d_bc = (cb * saturate(cb.dot(pb) / cb.length_squared()) - pb).length_squared();
        let d_ca = (ac * saturate(ac.dot(pc) / ac.length_squared()) - pc).length_squared();
        d_ab.min(d_bc).min(d_ca)
    } else {
        nor.dot(pa) * nor.dot(pa) / nor.length_squared()
    }
}

/// Squared-distance box test used for cell pruning.
///
/// For `p` relative to a box of the given half extent, returns
/// `|max(q, 0)|² + min(max(qx, qy, qz), 0)` with `q = |p| − half_extent`:
/// positive squared distance outside, non-positive inside. The mixed
/// units inside the box are fine for a conservative compare against a
/// squared threshold.
pub fn sds_box(p: Vec3, half_extent: Vec3) -> f32 {
    let q = p.abs() - half_extent;
    q.max(Vec3::ZERO).length_squared() + q.max_element().min(0.0)
}
