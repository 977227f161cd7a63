//! `tb-foreach` - Batched multi-tensor apply engine for tensor-backend.
//!
//! This crate provides:
//! - A `multi_tensor_apply` dispatcher that packs many independently-sized
//!   tensors into per-tensor address descriptors, partitions the combined
//!   workload into fixed-size chunks and processes the whole batch in a
//!   single data-parallel launch
//! - Elementwise chunk functors (unary, binary-with-scalar, pointwise-with-
//!   scalar, zero-fill) with vectorized and guarded scalar loop variants
//! - Fast/slow routing predicates and the `foreach_*` operation surface
//! - A sequential per-tensor slow path used when the batched path's
//!   structural preconditions fail
//! - A tensor copy kernel

pub mod apply;
pub mod context;
pub mod copy;
pub mod descriptor;
pub mod error;
pub mod fallback;
pub mod functors;
pub mod ops;
pub mod plan;
pub mod route;

// Re-export primary types at the crate root for convenience.
pub use apply::{multi_tensor_apply, multi_tensor_apply_chunked, ChunkFunctor, CHUNK_SIZE};
pub use context::ExecContext;
pub use descriptor::{SlotSpan, TensorMeta, VEC_WIDTH};
pub use error::{ForeachError, Result};
pub use functors::{BinaryOpKind, PointwiseOpKind, UnaryOpKind};
pub use plan::{plan_work_groups, WorkGroup};
