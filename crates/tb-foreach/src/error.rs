use tb_tensor::{DType, TensorError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForeachError {
    #[error("tensor list must be non-empty")]
    EmptyTensorList,
    #[error("tensor lists must have the same length: expected {expected}, got {got}")]
    ListLengthMismatch { expected: usize, got: usize },
    #[error("tensors at position {index} must have the same number of elements: expected {expected}, got {got}")]
    NumelMismatch {
        index: usize,
        expected: usize,
        got: usize,
    },
    #[error("subtraction with a boolean scalar is not supported on {dtype} tensors")]
    BoolScalarSub { dtype: DType },
    #[error("result dtype {required} cannot be written in place into {dtype} storage")]
    CastError { required: DType, dtype: DType },
    #[error("{0}")]
    Unsupported(String),
    #[error("tensor error: {0}")]
    Tensor(#[from] TensorError),
}

pub type Result<T> = std::result::Result<T, ForeachError>;
