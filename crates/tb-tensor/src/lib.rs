//! `tb-tensor` - Host tensor core types for tensor-backend.
//!
//! This crate provides:
//! - A `Tensor` type backed by host-visible storage
//! - Data type definitions (F32, F16, BF16, I32, I64) and a runtime
//!   dtype-to-generic dispatch macro
//! - The `Element` trait bridging storage types to their widened
//!   intermediate arithmetic types
//! - Shape and stride utilities
//! - `Scalar` and `Device` tags used by kernel routing decisions

pub mod device;
pub mod dtype;
pub mod element;
pub mod error;
pub mod scalar;
pub mod shape;
pub mod storage;
pub mod tensor;

// Re-export primary types at the crate root for convenience.
pub use device::Device;
pub use dtype::DType;
pub use element::{AccType, Element};
pub use error::{Result, TensorError};
pub use scalar::Scalar;
pub use shape::Shape;
pub use storage::Storage;
pub use tensor::Tensor;
