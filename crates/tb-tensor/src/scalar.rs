use std::fmt;

/// A scalar operand supplied alongside a tensor-list operation.
///
/// Carries the caller's scalar without committing to a storage dtype;
/// kernels convert it to their widened intermediate type at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    F64(f64),
    I64(i64),
    Bool(bool),
}

impl Scalar {
    pub fn is_floating(&self) -> bool {
        matches!(self, Scalar::F64(_))
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, Scalar::I64(_))
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Scalar::Bool(_))
    }

    /// Lossless widening to f64 (booleans become 0.0 / 1.0).
    pub fn to_f64(&self) -> f64 {
        match self {
            Scalar::F64(v) => *v,
            Scalar::I64(v) => *v as f64,
            Scalar::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::F64(v)
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::F64(v as f64)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::I64(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::I64(v as i64)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::F64(v) => write!(f, "{}", v),
            Scalar::I64(v) => write!(f, "{}", v),
            Scalar::Bool(b) => write!(f, "{}", b),
        }
    }
}
