//! Tensor copy kernel.
//!
//! Copies element values from `src` into `dst`, converting dtype when the
//! two differ. Same-dtype contiguous pairs take a bulk slice copy; every
//! other combination walks both tensors' logical orders with per-element
//! conversion.

use crate::error::{ForeachError, Result};
use crate::fallback::logical_offsets;
use tb_tensor::{dispatch_dtype, Tensor, TensorError};

/// Copies `src` into `dst` in place.
///
/// Element counts and devices must match; dtypes may differ (values convert
/// through f64, truncating toward zero on float-to-integer narrowing).
pub fn copy_(dst: &mut Tensor, src: &Tensor) -> Result<()> {
    if dst.numel() != src.numel() {
        return Err(ForeachError::Tensor(TensorError::ShapeMismatch {
            expected: dst.shape().dims().to_vec(),
            got: src.shape().dims().to_vec(),
        }));
    }
    if dst.device() != src.device() {
        return Err(ForeachError::Tensor(TensorError::DeviceMismatch {
            expected: dst.device(),
            got: src.device(),
        }));
    }

    if dst.dtype() == src.dtype() && dst.is_contiguous() && src.is_contiguous() {
        return dispatch_dtype!(dst.dtype(), T => {
            dst.data_mut::<T>()?.copy_from_slice(src.data::<T>()?);
            Ok(())
        });
    }

    let src_offsets = logical_offsets(src);
    for (w, off) in logical_offsets(dst).into_iter().enumerate() {
        let v = src.storage().get_f64(src_offsets[w]);
        dst.storage_mut().set_f64(off, v);
    }
    Ok(())
}

/// Copy into a destination whose writes overlap in storage.
///
/// The winning writer for an overlapped element is undefined, so this path
/// is explicitly unsupported rather than given guessed semantics.
pub fn copy_ignoring_overlaps(_dst: &mut Tensor, _src: &Tensor) -> Result<()> {
    Err(ForeachError::Unsupported(
        "copy ignoring write overlaps is not implemented: overlapping writes have no defined winner"
            .to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb_tensor::{DType, Device};

    #[test]
    fn test_same_dtype_contiguous() {
        let src = Tensor::from_vec(vec![1.0f32, 2.0, 3.0], vec![3]);
        let mut dst = Tensor::zeros(vec![3], DType::F32, Device::Cpu);
        copy_(&mut dst, &src).unwrap();
        assert_eq!(dst.data::<f32>().unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_converting_copy() {
        let src = Tensor::from_vec(vec![1.9f32, -2.9, 3.0], vec![3]);
        let mut dst = Tensor::zeros(vec![3], DType::I64, Device::Cpu);
        copy_(&mut dst, &src).unwrap();
        // float-to-integer narrowing truncates toward zero
        assert_eq!(dst.data::<i64>().unwrap(), &[1, -2, 3]);
    }

    #[test]
    fn test_strided_source() {
        let src = Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0], vec![2, 2])
            .permuted(&[1, 0])
            .unwrap();
        let mut dst = Tensor::zeros(vec![2, 2], DType::F32, Device::Cpu);
        copy_(&mut dst, &src).unwrap();
        // transposed logical order
        assert_eq!(dst.data::<f32>().unwrap(), &[1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn test_numel_mismatch() {
        let src = Tensor::from_vec(vec![1.0f32, 2.0], vec![2]);
        let mut dst = Tensor::zeros(vec![3], DType::F32, Device::Cpu);
        assert!(copy_(&mut dst, &src).is_err());
    }

    #[test]
    fn test_device_mismatch() {
        let src = Tensor::from_vec_on(vec![1.0f32], vec![1], Device::Accel(0));
        let mut dst = Tensor::zeros(vec![1], DType::F32, Device::Cpu);
        assert!(copy_(&mut dst, &src).is_err());
    }

    #[test]
    fn test_overlapping_copy_unsupported() {
        let src = Tensor::from_vec(vec![1.0f32], vec![1]);
        let mut dst = Tensor::zeros(vec![1], DType::F32, Device::Cpu);
        let err = copy_ignoring_overlaps(&mut dst, &src).unwrap_err();
        assert!(matches!(err, ForeachError::Unsupported(_)));
    }
}
