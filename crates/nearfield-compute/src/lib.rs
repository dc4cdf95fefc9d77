//! # nearfield-compute
//!
//! Compute-runtime abstraction for the nearfield broad-phase library.
//!
//! Provides the interface the spatial indices dispatch their kernels
//! through:
//! - [`ComputeBackend`] — kernel dispatch trait with a sequential CPU
//!   reference implementation ([`CpuDispatch`])
//! - [`ComputeBuffer`] — typed linear buffers for index-owned storage
//! - [`PositionView`] / [`TriangleView`] — borrowed views over
//!   caller-owned buffers, tagged with their element encoding
//! - [`BufferAllocator`] — allocation seam with device-backed and
//!   pre-sized heap implementations
//!
//! The abstraction enables running the same index pipelines on GPU or
//! CPU without changing the core.

pub mod alloc;
pub mod backend;
pub mod buffers;
pub mod encoding;

pub use alloc::{Allocation, BufferAllocator, DeviceAllocator, HeapAllocator, StorageMode};
pub use backend::{ComputeBackend, CpuDispatch, GroupScope};
pub use buffers::{ComputeBuffer, HalfVec3};
pub use encoding::{IndexEncoding, PositionEncoding, PositionView, TriangleView};
