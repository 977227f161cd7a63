//! Per-tensor slow path.
//!
//! One sequential reference entry point per operation, with the same
//! signatures as the batched path. Handles everything the fast route
//! rejects: non-contiguous layouts via strided logical iteration, mixed
//! devices, and dtype promotion (integer division and float-only unary ops
//! produce F32 results out-of-place and are cast errors in-place).
//! Arithmetic runs in f64, which also makes this module the oracle for
//! batched-vs-slow equivalence tests.

use crate::error::{ForeachError, Result};
use crate::functors::{BinaryOpKind, PointwiseOpKind, UnaryOpKind};
use tb_tensor::{DType, Scalar, Tensor};

/// Storage offsets of a tensor's elements in logical row-major order.
/// Shared by the slow path and the strided copy kernel.
pub(crate) fn logical_offsets(t: &Tensor) -> Vec<usize> {
    let dims = t.shape().dims();
    let strides = t.strides();
    let numel = t.numel();
    let mut offsets = Vec::with_capacity(numel);
    if numel == 0 {
        return offsets;
    }
    let mut index = vec![0usize; dims.len()];
    loop {
        let off: usize = index.iter().zip(strides).map(|(i, s)| i * s).sum();
        offsets.push(off);
        // odometer increment, last dimension fastest
        let mut d = dims.len();
        loop {
            if d == 0 {
                return offsets;
            }
            d -= 1;
            index[d] += 1;
            if index[d] < dims[d] {
                break;
            }
            index[d] = 0;
        }
    }
}

fn promoted_dtype(dtype: DType, needs_float: bool) -> DType {
    if needs_float && dtype.is_integral() {
        DType::F32
    } else {
        dtype
    }
}

fn in_place_dtype_check(t: &Tensor, needs_float: bool) -> Result<()> {
    let required = promoted_dtype(t.dtype(), needs_float);
    if required != t.dtype() {
        return Err(ForeachError::CastError {
            required,
            dtype: t.dtype(),
        });
    }
    Ok(())
}

pub fn foreach_binary_scalar_slow(
    tensors: &[Tensor],
    scalar: &Scalar,
    kind: BinaryOpKind,
) -> Result<Vec<Tensor>> {
    let needs_float = kind.is_division() || scalar.is_floating();
    let s = scalar.to_f64();
    let mut results = Vec::with_capacity(tensors.len());
    for t in tensors {
        let mut r = Tensor::zeros(
            t.shape().clone(),
            promoted_dtype(t.dtype(), needs_float),
            t.device(),
        );
        for (w, off) in logical_offsets(t).into_iter().enumerate() {
            r.storage_mut()
                .set_f64(w, kind.apply(t.storage().get_f64(off), s));
        }
        results.push(r);
    }
    Ok(results)
}

pub fn foreach_binary_scalar_slow_(
    tensors: &mut [Tensor],
    scalar: &Scalar,
    kind: BinaryOpKind,
) -> Result<()> {
    let needs_float = kind.is_division() || scalar.is_floating();
    for t in tensors.iter() {
        in_place_dtype_check(t, needs_float)?;
    }
    let s = scalar.to_f64();
    for t in tensors {
        for off in logical_offsets(t) {
            let v = kind.apply(t.storage().get_f64(off), s);
            t.storage_mut().set_f64(off, v);
        }
    }
    Ok(())
}

pub fn foreach_pointwise_scalar_slow(
    input: &[Tensor],
    tensors1: &[Tensor],
    tensors2: &[Tensor],
    scalar: &Scalar,
    kind: PointwiseOpKind,
) -> Result<Vec<Tensor>> {
    let needs_float = kind.is_division() || scalar.is_floating();
    let s = scalar.to_f64();
    let mut results = Vec::with_capacity(input.len());
    for ((t, a), b) in input.iter().zip(tensors1).zip(tensors2) {
        let mut r = Tensor::zeros(
            t.shape().clone(),
            promoted_dtype(t.dtype(), needs_float),
            t.device(),
        );
        let off_a = logical_offsets(a);
        let off_b = logical_offsets(b);
        for (w, off) in logical_offsets(t).into_iter().enumerate() {
            let v = t.storage().get_f64(off)
                + s * kind.apply(a.storage().get_f64(off_a[w]), b.storage().get_f64(off_b[w]));
            r.storage_mut().set_f64(w, v);
        }
        results.push(r);
    }
    Ok(results)
}

pub fn foreach_pointwise_scalar_slow_(
    input: &mut [Tensor],
    tensors1: &[Tensor],
    tensors2: &[Tensor],
    scalar: &Scalar,
    kind: PointwiseOpKind,
) -> Result<()> {
    let needs_float = kind.is_division() || scalar.is_floating();
    for t in input.iter() {
        in_place_dtype_check(t, needs_float)?;
    }
    let s = scalar.to_f64();
    for ((t, a), b) in input.iter_mut().zip(tensors1).zip(tensors2) {
        let off_a = logical_offsets(a);
        let off_b = logical_offsets(b);
        for (w, off) in logical_offsets(t).into_iter().enumerate() {
            let v = t.storage().get_f64(off)
                + s * kind.apply(a.storage().get_f64(off_a[w]), b.storage().get_f64(off_b[w]));
            t.storage_mut().set_f64(off, v);
        }
    }
    Ok(())
}

pub fn foreach_unary_slow(tensors: &[Tensor], kind: UnaryOpKind) -> Result<Vec<Tensor>> {
    let mut results = Vec::with_capacity(tensors.len());
    for t in tensors {
        let mut r = Tensor::zeros(
            t.shape().clone(),
            promoted_dtype(t.dtype(), kind.float_only()),
            t.device(),
        );
        for (w, off) in logical_offsets(t).into_iter().enumerate() {
            r.storage_mut()
                .set_f64(w, kind.apply(t.storage().get_f64(off)));
        }
        results.push(r);
    }
    Ok(results)
}

pub fn foreach_unary_slow_(tensors: &mut [Tensor], kind: UnaryOpKind) -> Result<()> {
    for t in tensors.iter() {
        in_place_dtype_check(t, kind.float_only())?;
    }
    for t in tensors {
        for off in logical_offsets(t) {
            let v = kind.apply(t.storage().get_f64(off));
            t.storage_mut().set_f64(off, v);
        }
    }
    Ok(())
}

pub fn foreach_zero_slow_(tensors: &mut [Tensor]) -> Result<()> {
    for t in tensors {
        for off in logical_offsets(t) {
            t.storage_mut().set_f64(off, 0.0);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_logical_offsets_contiguous() {
        let t = Tensor::from_vec(vec![0.0f32; 6], vec![2, 3]);
        assert_eq!(logical_offsets(&t), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_logical_offsets_permuted() {
        let t = Tensor::from_vec(vec![0.0f32; 6], vec![2, 3])
            .permuted(&[1, 0])
            .unwrap();
        // shape [3, 2], strides [1, 3]
        assert_eq!(logical_offsets(&t), vec![0, 3, 1, 4, 2, 5]);
    }

    #[test]
    fn test_logical_offsets_scalar_tensor() {
        let t = Tensor::from_vec(vec![5.0f32], Vec::<usize>::new());
        assert_eq!(logical_offsets(&t), vec![0]);
    }

    #[test]
    fn test_integer_division_promotes_to_f32() {
        let tensors = vec![Tensor::from_vec(vec![7i32, 8, 9], vec![3])];
        let out =
            foreach_binary_scalar_slow(&tensors, &Scalar::from(2i64), BinaryOpKind::Div).unwrap();
        assert_eq!(out[0].dtype(), DType::F32);
        let data = out[0].data::<f32>().unwrap();
        assert_relative_eq!(data[0], 3.5);
        assert_relative_eq!(data[2], 4.5);
    }

    #[test]
    fn test_in_place_integer_division_is_cast_error() {
        let mut tensors = vec![Tensor::from_vec(vec![7i32, 8], vec![2])];
        let err = foreach_binary_scalar_slow_(&mut tensors, &Scalar::from(2i64), BinaryOpKind::Div)
            .unwrap_err();
        assert!(matches!(err, ForeachError::CastError { .. }));
        // rejected call leaves inputs untouched
        assert_eq!(tensors[0].data::<i32>().unwrap(), &[7, 8]);
    }

    #[test]
    fn test_non_contiguous_in_place_add() {
        let mut tensors = vec![Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0], vec![2, 2])
            .permuted(&[1, 0])
            .unwrap()];
        foreach_binary_scalar_slow_(&mut tensors, &Scalar::from(10.0), BinaryOpKind::Add).unwrap();
        // every storage element visited exactly once
        assert_eq!(
            tensors[0].data::<f32>().unwrap(),
            &[11.0, 12.0, 13.0, 14.0]
        );
    }

    #[test]
    fn test_unary_sqrt_on_integers_promotes() {
        let tensors = vec![Tensor::from_vec(vec![4i64, 9], vec![2])];
        let out = foreach_unary_slow(&tensors, UnaryOpKind::Sqrt).unwrap();
        assert_eq!(out[0].dtype(), DType::F32);
        assert_eq!(out[0].data::<f32>().unwrap(), &[2.0, 3.0]);
    }

    #[test]
    fn test_addcmul_integer_stays_integer() {
        let input = vec![Tensor::from_vec(vec![1i32, 2], vec![2])];
        let t1 = vec![Tensor::from_vec(vec![3i32, 4], vec![2])];
        let t2 = vec![Tensor::from_vec(vec![5i32, 6], vec![2])];
        let out = foreach_pointwise_scalar_slow(
            &input,
            &t1,
            &t2,
            &Scalar::from(2i64),
            PointwiseOpKind::Mul,
        )
        .unwrap();
        assert_eq!(out[0].dtype(), DType::I32);
        assert_eq!(out[0].data::<i32>().unwrap(), &[31, 50]);
    }

    #[test]
    fn test_zero_slow() {
        let mut tensors = vec![Tensor::from_vec(vec![1.0f32, 2.0], vec![2])];
        foreach_zero_slow_(&mut tensors).unwrap();
        assert_eq!(tensors[0].data::<f32>().unwrap(), &[0.0, 0.0]);
    }
}
