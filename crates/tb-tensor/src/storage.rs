use crate::dtype::DType;
use half::{bf16, f16};

/// Host-visible tensor storage, one variant per supported dtype.
#[derive(Debug, Clone, PartialEq)]
pub enum Storage {
    F32(Vec<f32>),
    F16(Vec<f16>),
    BF16(Vec<bf16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
}

impl Storage {
    /// Number of elements in this storage.
    pub fn len(&self) -> usize {
        match self {
            Storage::F32(v) => v.len(),
            Storage::F16(v) => v.len(),
            Storage::BF16(v) => v.len(),
            Storage::I32(v) => v.len(),
            Storage::I64(v) => v.len(),
        }
    }

    /// Returns true if the storage contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the dtype of this storage.
    pub fn dtype(&self) -> DType {
        match self {
            Storage::F32(_) => DType::F32,
            Storage::F16(_) => DType::F16,
            Storage::BF16(_) => DType::BF16,
            Storage::I32(_) => DType::I32,
            Storage::I64(_) => DType::I64,
        }
    }

    /// Create zero-filled storage for the given dtype and element count.
    pub fn zeros(dtype: DType, n: usize) -> Self {
        match dtype {
            DType::F32 => Storage::F32(vec![0.0; n]),
            DType::F16 => Storage::F16(vec![f16::ZERO; n]),
            DType::BF16 => Storage::BF16(vec![bf16::ZERO; n]),
            DType::I32 => Storage::I32(vec![0; n]),
            DType::I64 => Storage::I64(vec![0; n]),
        }
    }

    /// Reads the element at `i`, widened to f64.
    ///
    /// # Panics
    /// Panics if `i >= len()`.
    pub fn get_f64(&self, i: usize) -> f64 {
        match self {
            Storage::F32(v) => v[i] as f64,
            Storage::F16(v) => v[i].to_f64(),
            Storage::BF16(v) => v[i].to_f64(),
            Storage::I32(v) => v[i] as f64,
            Storage::I64(v) => v[i] as f64,
        }
    }

    /// Writes `value` at `i`, narrowing from f64 to the storage dtype.
    /// Float-to-integer narrowing truncates toward zero.
    ///
    /// # Panics
    /// Panics if `i >= len()`.
    pub fn set_f64(&mut self, i: usize, value: f64) {
        match self {
            Storage::F32(v) => v[i] = value as f32,
            Storage::F16(v) => v[i] = f16::from_f64(value),
            Storage::BF16(v) => v[i] = bf16::from_f64(value),
            Storage::I32(v) => v[i] = value as i32,
            Storage::I64(v) => v[i] = value as i64,
        }
    }
}
