//! The bridge between runtime dtype tags and monomorphized generic kernels.
//!
//! `Element` is implemented once per storage dtype and carries the widened
//! intermediate type (`Acc`) used for arithmetic: half-width floats compute
//! in f32 to avoid precision loss from repeated narrow arithmetic, then
//! narrow back on store. The `dispatch_dtype!` macro selects the concrete
//! `Element` instantiation from a runtime `DType` value.

use crate::dtype::DType;
use crate::error::{Result, TensorError};
use crate::scalar::Scalar;
use crate::storage::Storage;
use half::{bf16, f16};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Widened intermediate arithmetic type.
///
/// The arithmetic surface kernels need: the four binary operators plus the
/// unary math functions, and conversion from a caller-supplied `Scalar`.
pub trait AccType:
    Copy
    + Send
    + Sync
    + PartialEq
    + std::fmt::Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    fn from_scalar(scalar: &Scalar) -> Self;
    fn abs(self) -> Self;
    fn sqrt(self) -> Self;
    fn exp(self) -> Self;
}

impl AccType for f32 {
    fn from_scalar(scalar: &Scalar) -> Self {
        scalar.to_f64() as f32
    }

    fn abs(self) -> Self {
        f32::abs(self)
    }

    fn sqrt(self) -> Self {
        f32::sqrt(self)
    }

    fn exp(self) -> Self {
        f32::exp(self)
    }
}

impl AccType for f64 {
    fn from_scalar(scalar: &Scalar) -> Self {
        scalar.to_f64()
    }

    fn abs(self) -> Self {
        f64::abs(self)
    }

    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn exp(self) -> Self {
        f64::exp(self)
    }
}

impl AccType for i32 {
    // Integer scalars must not round-trip through f64: values above 2^53
    // lose their low bits there.
    fn from_scalar(scalar: &Scalar) -> Self {
        match scalar {
            Scalar::I64(v) => *v as i32,
            other => other.to_f64() as i32,
        }
    }

    fn abs(self) -> Self {
        i32::abs(self)
    }

    // sqrt/exp on integer accumulators go through f64; integer tensors
    // never reach the float-only kernels.
    fn sqrt(self) -> Self {
        (self as f64).sqrt() as i32
    }

    fn exp(self) -> Self {
        (self as f64).exp() as i32
    }
}

impl AccType for i64 {
    fn from_scalar(scalar: &Scalar) -> Self {
        match scalar {
            Scalar::I64(v) => *v,
            other => other.to_f64() as i64,
        }
    }

    fn abs(self) -> Self {
        i64::abs(self)
    }

    fn sqrt(self) -> Self {
        (self as f64).sqrt() as i64
    }

    fn exp(self) -> Self {
        (self as f64).exp() as i64
    }
}

/// A concrete storage element type.
///
/// Implementations tie together the dtype tag, the storage enum variant,
/// and the widened arithmetic type.
pub trait Element: Copy + Send + Sync + PartialEq + std::fmt::Debug + 'static {
    /// Widened type used for intermediate arithmetic.
    type Acc: AccType;

    const DTYPE: DType;
    const ZERO: Self;

    fn to_acc(self) -> Self::Acc;
    fn from_acc(acc: Self::Acc) -> Self;

    fn slice(storage: &Storage) -> Result<&[Self]>;
    fn slice_mut(storage: &mut Storage) -> Result<&mut [Self]>;
    fn into_storage(data: Vec<Self>) -> Storage;
}

macro_rules! mismatch {
    ($storage:expr, $dtype:expr) => {
        Err(TensorError::DTypeMismatch {
            expected: $dtype,
            got: $storage.dtype(),
        })
    };
}

impl Element for f32 {
    type Acc = f32;

    const DTYPE: DType = DType::F32;
    const ZERO: Self = 0.0;

    fn to_acc(self) -> f32 {
        self
    }

    fn from_acc(acc: f32) -> Self {
        acc
    }

    fn slice(storage: &Storage) -> Result<&[Self]> {
        match storage {
            Storage::F32(v) => Ok(v.as_slice()),
            other => mismatch!(other, Self::DTYPE),
        }
    }

    fn slice_mut(storage: &mut Storage) -> Result<&mut [Self]> {
        match storage {
            Storage::F32(v) => Ok(v.as_mut_slice()),
            other => mismatch!(other, Self::DTYPE),
        }
    }

    fn into_storage(data: Vec<Self>) -> Storage {
        Storage::F32(data)
    }
}

impl Element for f16 {
    type Acc = f32;

    const DTYPE: DType = DType::F16;
    const ZERO: Self = f16::ZERO;

    fn to_acc(self) -> f32 {
        self.to_f32()
    }

    fn from_acc(acc: f32) -> Self {
        f16::from_f32(acc)
    }

    fn slice(storage: &Storage) -> Result<&[Self]> {
        match storage {
            Storage::F16(v) => Ok(v.as_slice()),
            other => mismatch!(other, Self::DTYPE),
        }
    }

    fn slice_mut(storage: &mut Storage) -> Result<&mut [Self]> {
        match storage {
            Storage::F16(v) => Ok(v.as_mut_slice()),
            other => mismatch!(other, Self::DTYPE),
        }
    }

    fn into_storage(data: Vec<Self>) -> Storage {
        Storage::F16(data)
    }
}

impl Element for bf16 {
    type Acc = f32;

    const DTYPE: DType = DType::BF16;
    const ZERO: Self = bf16::ZERO;

    fn to_acc(self) -> f32 {
        self.to_f32()
    }

    fn from_acc(acc: f32) -> Self {
        bf16::from_f32(acc)
    }

    fn slice(storage: &Storage) -> Result<&[Self]> {
        match storage {
            Storage::BF16(v) => Ok(v.as_slice()),
            other => mismatch!(other, Self::DTYPE),
        }
    }

    fn slice_mut(storage: &mut Storage) -> Result<&mut [Self]> {
        match storage {
            Storage::BF16(v) => Ok(v.as_mut_slice()),
            other => mismatch!(other, Self::DTYPE),
        }
    }

    fn into_storage(data: Vec<Self>) -> Storage {
        Storage::BF16(data)
    }
}

impl Element for i32 {
    type Acc = i32;

    const DTYPE: DType = DType::I32;
    const ZERO: Self = 0;

    fn to_acc(self) -> i32 {
        self
    }

    fn from_acc(acc: i32) -> Self {
        acc
    }

    fn slice(storage: &Storage) -> Result<&[Self]> {
        match storage {
            Storage::I32(v) => Ok(v.as_slice()),
            other => mismatch!(other, Self::DTYPE),
        }
    }

    fn slice_mut(storage: &mut Storage) -> Result<&mut [Self]> {
        match storage {
            Storage::I32(v) => Ok(v.as_mut_slice()),
            other => mismatch!(other, Self::DTYPE),
        }
    }

    fn into_storage(data: Vec<Self>) -> Storage {
        Storage::I32(data)
    }
}

impl Element for i64 {
    type Acc = i64;

    const DTYPE: DType = DType::I64;
    const ZERO: Self = 0;

    fn to_acc(self) -> i64 {
        self
    }

    fn from_acc(acc: i64) -> Self {
        acc
    }

    fn slice(storage: &Storage) -> Result<&[Self]> {
        match storage {
            Storage::I64(v) => Ok(v.as_slice()),
            other => mismatch!(other, Self::DTYPE),
        }
    }

    fn slice_mut(storage: &mut Storage) -> Result<&mut [Self]> {
        match storage {
            Storage::I64(v) => Ok(v.as_mut_slice()),
            other => mismatch!(other, Self::DTYPE),
        }
    }

    fn into_storage(data: Vec<Self>) -> Storage {
        Storage::I64(data)
    }
}

/// Dispatches a runtime `DType` to a monomorphized generic code path.
///
/// Binds `$T` to the concrete `Element` type for `$dtype` and evaluates
/// `$body`; every arm must produce the same result type.
///
/// ```ignore
/// dispatch_dtype!(tensor.dtype(), T => {
///     kernel_impl::<T>(ctx, tensors)
/// })
/// ```
#[macro_export]
macro_rules! dispatch_dtype {
    ($dtype:expr, $T:ident => $body:block) => {
        match $dtype {
            $crate::DType::F32 => {
                type $T = f32;
                $body
            }
            $crate::DType::F16 => {
                type $T = ::half::f16;
                $body
            }
            $crate::DType::BF16 => {
                type $T = ::half::bf16;
                $body
            }
            $crate::DType::I32 => {
                type $T = i32;
                $body
            }
            $crate::DType::I64 => {
                type $T = i64;
                $body
            }
        }
    };
}
