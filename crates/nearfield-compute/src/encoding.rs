//! Caller-buffer views with element-encoding tags.
//!
//! Callers keep ownership of position and index buffers and pass them
//! in at each call; a view is a plain record of data, encoding tag, and
//! element count. The host selects the kernel variant per encoding —
//! kernels never branch on layout.

use glam::Vec3;
use nearfield_types::{NearfieldError, NearfieldResult};

/// Element layout of a position buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionEncoding {
    /// Three consecutive f32 lanes per element.
    PackedF32x3,
    /// f32x3 with one lane of alignment padding (stride 4).
    AlignedF32x3,
    /// Four f32 lanes per element; the w lane is ignored (stride 4).
    PaddedF32x4,
}

impl PositionEncoding {
    /// Number of f32 lanes per element.
    pub fn stride(self) -> usize {
        match self {
            PositionEncoding::PackedF32x3 => 3,
            PositionEncoding::AlignedF32x3 => 4,
            PositionEncoding::PaddedF32x4 => 4,
        }
    }
}

/// Borrowed view over a caller-owned position buffer.
#[derive(Debug, Clone, Copy)]
pub struct PositionView<'a> {
    data: &'a [f32],
    encoding: PositionEncoding,
    count: usize,
}

impl<'a> PositionView<'a> {
    /// Wraps `data` with the given encoding.
    ///
    /// The buffer length must be a whole number of elements.
    pub fn new(data: &'a [f32], encoding: PositionEncoding) -> NearfieldResult<Self> {
        let stride = encoding.stride();
        if data.len() % stride != 0 {
            return Err(NearfieldError::BufferShapeMismatch(format!(
                "position buffer of {} floats is not a multiple of the element stride {}",
                data.len(),
                stride
            )));
        }
        Ok(Self {
            data,
            encoding,
            count: data.len() / stride,
        })
    }

    /// Number of position elements.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Element layout of the underlying buffer.
    pub fn encoding(&self) -> PositionEncoding {
        self.encoding
    }

    /// Fetches element `i`; only the x, y, z lanes are read.
    #[inline]
    pub fn get(&self, i: usize) -> Vec3 {
        let base = i * self.encoding.stride();
        Vec3::new(self.data[base], self.data[base + 1], self.data[base + 2])
    }
}

/// Element layout of a triangle index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexEncoding {
    /// Three consecutive u32 lanes per triangle.
    Packed,
    /// u32x3 with one lane of alignment padding (stride 4).
    Aligned,
}

impl IndexEncoding {
    /// Number of u32 lanes per triangle.
    pub fn stride(self) -> usize {
        match self {
            IndexEncoding::Packed => 3,
            IndexEncoding::Aligned => 4,
        }
    }
}

/// Borrowed view over a caller-owned triangle index buffer.
#[derive(Debug, Clone, Copy)]
pub struct TriangleView<'a> {
    data: &'a [u32],
    encoding: IndexEncoding,
    count: usize,
}

impl<'a> TriangleView<'a> {
    /// Wraps `data` with the given encoding.
    ///
    /// The buffer length must be a whole number of triangles.
    pub fn new(data: &'a [u32], encoding: IndexEncoding) -> NearfieldResult<Self> {
        let stride = encoding.stride();
        if data.len() % stride != 0 {
            return Err(NearfieldError::BufferShapeMismatch(format!(
                "triangle buffer of {} indices is not a multiple of the element stride {}",
                data.len(),
                stride
            )));
        }
        Ok(Self {
            data,
            encoding,
            count: data.len() / stride,
        })
    }

    /// Number of triangles.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Element layout of the underlying buffer.
    pub fn encoding(&self) -> IndexEncoding {
        self.encoding
    }

    /// Fetches the three vertex indices of triangle `i`.
    #[inline]
    pub fn get(&self, i: usize) -> [u32; 3] {
        let base = i * self.encoding.stride();
        [self.data[base], self.data[base + 1], self.data[base + 2]]
    }
}
