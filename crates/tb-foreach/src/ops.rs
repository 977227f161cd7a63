//! The `foreach_*` operation surface.
//!
//! Each entry point validates API restrictions, applies any op-specific
//! pre-checks, routes between the batched fast path and the per-tensor
//! slow path, and dispatches the runtime dtype to a monomorphized generic
//! implementation. One generic implementation exists per functor family;
//! the named wrappers below are thin per-operation registrations.

use crate::apply::multi_tensor_apply;
use crate::context::ExecContext;
use crate::descriptor::{SlotSpan, TensorMeta};
use crate::error::Result;
use crate::fallback;
use crate::functors::{
    BinaryOpKind, BinaryScalarFunctor, PointwiseOpKind, PointwiseScalarFunctor, UnaryFunctor,
    UnaryOpKind, ZeroFunctor,
};
use crate::route::{can_use_fast_route, check_api_restrictions, has_integral_tensor, sub_check};
use tb_tensor::{dispatch_dtype, AccType, Element, Scalar, Tensor};

// ---------------------------------------------------------------------------
// binary scalar: out[i] = op(t[i], scalar)
// ---------------------------------------------------------------------------

pub fn foreach_binary_scalar(
    ctx: &ExecContext,
    tensors: &[Tensor],
    scalar: &Scalar,
    kind: BinaryOpKind,
) -> Result<Vec<Tensor>> {
    check_api_restrictions(&[tensors])?;
    if kind == BinaryOpKind::Sub {
        sub_check(&tensors[0], scalar)?;
    }
    if !can_use_fast_route(&[tensors], Some(scalar), kind.is_division()) {
        return fallback::foreach_binary_scalar_slow(tensors, scalar, kind);
    }
    dispatch_dtype!(tensors[0].dtype(), T => {
        binary_scalar_fast::<T>(ctx, tensors, scalar, kind)
    })
}

pub fn foreach_binary_scalar_(
    ctx: &ExecContext,
    tensors: &mut [Tensor],
    scalar: &Scalar,
    kind: BinaryOpKind,
) -> Result<()> {
    check_api_restrictions(&[&*tensors])?;
    if kind == BinaryOpKind::Sub {
        sub_check(&tensors[0], scalar)?;
    }
    if !can_use_fast_route(&[&*tensors], Some(scalar), kind.is_division()) {
        return fallback::foreach_binary_scalar_slow_(tensors, scalar, kind);
    }
    dispatch_dtype!(tensors[0].dtype(), T => {
        binary_scalar_fast_::<T>(ctx, tensors, scalar, kind)
    })
}

fn binary_scalar_fast<T: Element>(
    ctx: &ExecContext,
    tensors: &[Tensor],
    scalar: &Scalar,
    kind: BinaryOpKind,
) -> Result<Vec<Tensor>> {
    // Result allocation precedes descriptor building: descriptors need the
    // result base addresses.
    let mut results: Vec<Tensor> = tensors.iter().map(Tensor::empty_like).collect();
    let mut metas = Vec::with_capacity(tensors.len());
    for (t, r) in tensors.iter().zip(results.iter_mut()) {
        let numel = t.numel();
        metas.push(TensorMeta::new(
            [
                SlotSpan::from_ref(t.data::<T>()?),
                SlotSpan::from_mut(r.data_mut::<T>()?),
            ],
            numel,
        ));
    }
    let functor = BinaryScalarFunctor::<T> {
        kind,
        scalar: T::Acc::from_scalar(scalar),
        res_slot: 1,
    };
    multi_tensor_apply(ctx, &metas, &functor);
    Ok(results)
}

fn binary_scalar_fast_<T: Element>(
    ctx: &ExecContext,
    tensors: &mut [Tensor],
    scalar: &Scalar,
    kind: BinaryOpKind,
) -> Result<()> {
    let mut metas = Vec::with_capacity(tensors.len());
    for t in tensors.iter_mut() {
        let numel = t.numel();
        metas.push(TensorMeta::new(
            [SlotSpan::from_mut(t.data_mut::<T>()?)],
            numel,
        ));
    }
    let functor = BinaryScalarFunctor::<T> {
        kind,
        scalar: T::Acc::from_scalar(scalar),
        res_slot: 0,
    };
    multi_tensor_apply(ctx, &metas, &functor);
    Ok(())
}

// ---------------------------------------------------------------------------
// pointwise scalar: out[i] = input[i] + scalar * op(t1[i], t2[i])
// ---------------------------------------------------------------------------

pub fn foreach_pointwise_scalar(
    ctx: &ExecContext,
    input: &[Tensor],
    tensors1: &[Tensor],
    tensors2: &[Tensor],
    scalar: &Scalar,
    kind: PointwiseOpKind,
) -> Result<Vec<Tensor>> {
    check_api_restrictions(&[input, tensors1, tensors2])?;
    // Integer batches always take the slow path: its exact promotion
    // semantics differ from the widened in-place arithmetic here.
    if !can_use_fast_route(&[input, tensors1, tensors2], Some(scalar), kind.is_division())
        || has_integral_tensor(input)
    {
        return fallback::foreach_pointwise_scalar_slow(input, tensors1, tensors2, scalar, kind);
    }
    dispatch_dtype!(input[0].dtype(), T => {
        pointwise_fast::<T>(ctx, input, tensors1, tensors2, scalar, kind)
    })
}

pub fn foreach_pointwise_scalar_(
    ctx: &ExecContext,
    input: &mut [Tensor],
    tensors1: &[Tensor],
    tensors2: &[Tensor],
    scalar: &Scalar,
    kind: PointwiseOpKind,
) -> Result<()> {
    check_api_restrictions(&[&*input, tensors1, tensors2])?;
    if !can_use_fast_route(&[&*input, tensors1, tensors2], Some(scalar), kind.is_division())
        || has_integral_tensor(input)
    {
        return fallback::foreach_pointwise_scalar_slow_(input, tensors1, tensors2, scalar, kind);
    }
    dispatch_dtype!(input[0].dtype(), T => {
        pointwise_fast_::<T>(ctx, input, tensors1, tensors2, scalar, kind)
    })
}

fn pointwise_fast<T: Element>(
    ctx: &ExecContext,
    input: &[Tensor],
    tensors1: &[Tensor],
    tensors2: &[Tensor],
    scalar: &Scalar,
    kind: PointwiseOpKind,
) -> Result<Vec<Tensor>> {
    let mut results: Vec<Tensor> = input.iter().map(Tensor::empty_like).collect();
    let mut metas = Vec::with_capacity(input.len());
    for (((t, a), b), r) in input
        .iter()
        .zip(tensors1)
        .zip(tensors2)
        .zip(results.iter_mut())
    {
        let numel = t.numel();
        metas.push(TensorMeta::new(
            [
                SlotSpan::from_ref(t.data::<T>()?),
                SlotSpan::from_ref(a.data::<T>()?),
                SlotSpan::from_ref(b.data::<T>()?),
                SlotSpan::from_mut(r.data_mut::<T>()?),
            ],
            numel,
        ));
    }
    let functor = PointwiseScalarFunctor::<T> {
        kind,
        scalar: T::Acc::from_scalar(scalar),
        res_slot: 3,
    };
    multi_tensor_apply(ctx, &metas, &functor);
    Ok(results)
}

fn pointwise_fast_<T: Element>(
    ctx: &ExecContext,
    input: &mut [Tensor],
    tensors1: &[Tensor],
    tensors2: &[Tensor],
    scalar: &Scalar,
    kind: PointwiseOpKind,
) -> Result<()> {
    let mut metas = Vec::with_capacity(input.len());
    for ((t, a), b) in input.iter_mut().zip(tensors1).zip(tensors2) {
        let numel = t.numel();
        metas.push(TensorMeta::new(
            [
                SlotSpan::from_mut(t.data_mut::<T>()?),
                SlotSpan::from_ref(a.data::<T>()?),
                SlotSpan::from_ref(b.data::<T>()?),
            ],
            numel,
        ));
    }
    let functor = PointwiseScalarFunctor::<T> {
        kind,
        scalar: T::Acc::from_scalar(scalar),
        res_slot: 0,
    };
    multi_tensor_apply(ctx, &metas, &functor);
    Ok(())
}

// ---------------------------------------------------------------------------
// unary: out[i] = f(t[i])
// ---------------------------------------------------------------------------

pub fn foreach_unary(
    ctx: &ExecContext,
    tensors: &[Tensor],
    kind: UnaryOpKind,
) -> Result<Vec<Tensor>> {
    check_api_restrictions(&[tensors])?;
    if !can_use_fast_route(&[tensors], None, false)
        || (kind.float_only() && has_integral_tensor(tensors))
    {
        return fallback::foreach_unary_slow(tensors, kind);
    }
    dispatch_dtype!(tensors[0].dtype(), T => {
        unary_fast::<T>(ctx, tensors, kind)
    })
}

pub fn foreach_unary_(ctx: &ExecContext, tensors: &mut [Tensor], kind: UnaryOpKind) -> Result<()> {
    check_api_restrictions(&[&*tensors])?;
    if !can_use_fast_route(&[&*tensors], None, false)
        || (kind.float_only() && has_integral_tensor(tensors))
    {
        return fallback::foreach_unary_slow_(tensors, kind);
    }
    dispatch_dtype!(tensors[0].dtype(), T => {
        unary_fast_::<T>(ctx, tensors, kind)
    })
}

fn unary_fast<T: Element>(
    ctx: &ExecContext,
    tensors: &[Tensor],
    kind: UnaryOpKind,
) -> Result<Vec<Tensor>> {
    let mut results: Vec<Tensor> = tensors.iter().map(Tensor::empty_like).collect();
    let mut metas = Vec::with_capacity(tensors.len());
    for (t, r) in tensors.iter().zip(results.iter_mut()) {
        let numel = t.numel();
        metas.push(TensorMeta::new(
            [
                SlotSpan::from_ref(t.data::<T>()?),
                SlotSpan::from_mut(r.data_mut::<T>()?),
            ],
            numel,
        ));
    }
    let functor = UnaryFunctor { kind, res_slot: 1 };
    multi_tensor_apply(ctx, &metas, &functor);
    Ok(results)
}

fn unary_fast_<T: Element>(ctx: &ExecContext, tensors: &mut [Tensor], kind: UnaryOpKind) -> Result<()> {
    let mut metas = Vec::with_capacity(tensors.len());
    for t in tensors.iter_mut() {
        let numel = t.numel();
        metas.push(TensorMeta::new(
            [SlotSpan::from_mut(t.data_mut::<T>()?)],
            numel,
        ));
    }
    let functor = UnaryFunctor { kind, res_slot: 0 };
    multi_tensor_apply(ctx, &metas, &functor);
    Ok(())
}

// ---------------------------------------------------------------------------
// zero fill
// ---------------------------------------------------------------------------

/// Writes zero into every element of every tensor (gradient-reset pattern).
pub fn foreach_zero_(ctx: &ExecContext, tensors: &mut [Tensor]) -> Result<()> {
    check_api_restrictions(&[&*tensors])?;
    if !can_use_fast_route(&[&*tensors], None, false) {
        return fallback::foreach_zero_slow_(tensors);
    }
    dispatch_dtype!(tensors[0].dtype(), T => {
        zero_fast_::<T>(ctx, tensors)
    })
}

fn zero_fast_<T: Element>(ctx: &ExecContext, tensors: &mut [Tensor]) -> Result<()> {
    let mut metas = Vec::with_capacity(tensors.len());
    for t in tensors.iter_mut() {
        let numel = t.numel();
        metas.push(TensorMeta::new(
            [SlotSpan::from_mut(t.data_mut::<T>()?)],
            numel,
        ));
    }
    multi_tensor_apply(ctx, &metas, &ZeroFunctor);
    Ok(())
}

// ---------------------------------------------------------------------------
// per-operation registrations
// ---------------------------------------------------------------------------

pub fn foreach_add_scalar(ctx: &ExecContext, tensors: &[Tensor], scalar: &Scalar) -> Result<Vec<Tensor>> {
    foreach_binary_scalar(ctx, tensors, scalar, BinaryOpKind::Add)
}

pub fn foreach_add_scalar_(ctx: &ExecContext, tensors: &mut [Tensor], scalar: &Scalar) -> Result<()> {
    foreach_binary_scalar_(ctx, tensors, scalar, BinaryOpKind::Add)
}

pub fn foreach_sub_scalar(ctx: &ExecContext, tensors: &[Tensor], scalar: &Scalar) -> Result<Vec<Tensor>> {
    foreach_binary_scalar(ctx, tensors, scalar, BinaryOpKind::Sub)
}

pub fn foreach_sub_scalar_(ctx: &ExecContext, tensors: &mut [Tensor], scalar: &Scalar) -> Result<()> {
    foreach_binary_scalar_(ctx, tensors, scalar, BinaryOpKind::Sub)
}

pub fn foreach_mul_scalar(ctx: &ExecContext, tensors: &[Tensor], scalar: &Scalar) -> Result<Vec<Tensor>> {
    foreach_binary_scalar(ctx, tensors, scalar, BinaryOpKind::Mul)
}

pub fn foreach_mul_scalar_(ctx: &ExecContext, tensors: &mut [Tensor], scalar: &Scalar) -> Result<()> {
    foreach_binary_scalar_(ctx, tensors, scalar, BinaryOpKind::Mul)
}

pub fn foreach_div_scalar(ctx: &ExecContext, tensors: &[Tensor], scalar: &Scalar) -> Result<Vec<Tensor>> {
    foreach_binary_scalar(ctx, tensors, scalar, BinaryOpKind::Div)
}

pub fn foreach_div_scalar_(ctx: &ExecContext, tensors: &mut [Tensor], scalar: &Scalar) -> Result<()> {
    foreach_binary_scalar_(ctx, tensors, scalar, BinaryOpKind::Div)
}

pub fn foreach_addcmul(
    ctx: &ExecContext,
    input: &[Tensor],
    tensors1: &[Tensor],
    tensors2: &[Tensor],
    scalar: &Scalar,
) -> Result<Vec<Tensor>> {
    foreach_pointwise_scalar(ctx, input, tensors1, tensors2, scalar, PointwiseOpKind::Mul)
}

pub fn foreach_addcmul_(
    ctx: &ExecContext,
    input: &mut [Tensor],
    tensors1: &[Tensor],
    tensors2: &[Tensor],
    scalar: &Scalar,
) -> Result<()> {
    foreach_pointwise_scalar_(ctx, input, tensors1, tensors2, scalar, PointwiseOpKind::Mul)
}

pub fn foreach_addcdiv(
    ctx: &ExecContext,
    input: &[Tensor],
    tensors1: &[Tensor],
    tensors2: &[Tensor],
    scalar: &Scalar,
) -> Result<Vec<Tensor>> {
    foreach_pointwise_scalar(ctx, input, tensors1, tensors2, scalar, PointwiseOpKind::Div)
}

pub fn foreach_addcdiv_(
    ctx: &ExecContext,
    input: &mut [Tensor],
    tensors1: &[Tensor],
    tensors2: &[Tensor],
    scalar: &Scalar,
) -> Result<()> {
    foreach_pointwise_scalar_(ctx, input, tensors1, tensors2, scalar, PointwiseOpKind::Div)
}

pub fn foreach_neg(ctx: &ExecContext, tensors: &[Tensor]) -> Result<Vec<Tensor>> {
    foreach_unary(ctx, tensors, UnaryOpKind::Neg)
}

pub fn foreach_neg_(ctx: &ExecContext, tensors: &mut [Tensor]) -> Result<()> {
    foreach_unary_(ctx, tensors, UnaryOpKind::Neg)
}

pub fn foreach_abs(ctx: &ExecContext, tensors: &[Tensor]) -> Result<Vec<Tensor>> {
    foreach_unary(ctx, tensors, UnaryOpKind::Abs)
}

pub fn foreach_abs_(ctx: &ExecContext, tensors: &mut [Tensor]) -> Result<()> {
    foreach_unary_(ctx, tensors, UnaryOpKind::Abs)
}

pub fn foreach_sqrt(ctx: &ExecContext, tensors: &[Tensor]) -> Result<Vec<Tensor>> {
    foreach_unary(ctx, tensors, UnaryOpKind::Sqrt)
}

pub fn foreach_sqrt_(ctx: &ExecContext, tensors: &mut [Tensor]) -> Result<()> {
    foreach_unary_(ctx, tensors, UnaryOpKind::Sqrt)
}

pub fn foreach_exp(ctx: &ExecContext, tensors: &[Tensor]) -> Result<Vec<Tensor>> {
    foreach_unary(ctx, tensors, UnaryOpKind::Exp)
}

pub fn foreach_exp_(ctx: &ExecContext, tensors: &mut [Tensor]) -> Result<()> {
    foreach_unary_(ctx, tensors, UnaryOpKind::Exp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForeachError;
    use approx::assert_relative_eq;
    use half::f16;
    use tb_tensor::DType;

    fn ctx() -> ExecContext {
        ExecContext::default()
    }

    fn f32_batch(sizes: &[usize]) -> Vec<Tensor> {
        sizes
            .iter()
            .map(|&n| {
                let data: Vec<f32> = (0..n).map(|i| (i % 17) as f32 * 0.5 - 3.0).collect();
                Tensor::from_vec(data, vec![n])
            })
            .collect()
    }

    #[test]
    fn test_add_scalar_mixed_size_batch() {
        // 3 contiguous f32 tensors of [5, 4096, 10000] elements, scalar 2.0:
        // fast route, output equals input + 2.0 per tensor.
        let tensors = f32_batch(&[5, 4096, 10000]);
        let out = foreach_add_scalar(&ctx(), &tensors, &Scalar::from(2.0)).unwrap();
        assert_eq!(out.len(), 3);
        for (t, r) in tensors.iter().zip(&out) {
            let a = t.data::<f32>().unwrap();
            let b = r.data::<f32>().unwrap();
            assert_eq!(a.len(), b.len());
            for i in 0..a.len() {
                assert_eq!(b[i], a[i] + 2.0);
            }
        }
    }

    #[test]
    fn test_batched_matches_slow_path() {
        let tensors = f32_batch(&[7, 130, 1000]);
        for kind in [
            BinaryOpKind::Add,
            BinaryOpKind::Sub,
            BinaryOpKind::Mul,
            BinaryOpKind::Div,
        ] {
            let fast = foreach_binary_scalar(&ctx(), &tensors, &Scalar::from(1.5), kind).unwrap();
            let slow =
                fallback::foreach_binary_scalar_slow(&tensors, &Scalar::from(1.5), kind).unwrap();
            for (f, s) in fast.iter().zip(&slow) {
                let f = f.data::<f32>().unwrap();
                let s = s.data::<f32>().unwrap();
                for i in 0..f.len() {
                    assert_relative_eq!(f[i], s[i], max_relative = 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_in_place_inverse_round_trip() {
        let original = f32_batch(&[64, 100]);
        let mut tensors = original.clone();
        foreach_add_scalar_(&ctx(), &mut tensors, &Scalar::from(5.5)).unwrap();
        foreach_sub_scalar_(&ctx(), &mut tensors, &Scalar::from(5.5)).unwrap();
        foreach_mul_scalar_(&ctx(), &mut tensors, &Scalar::from(3.0)).unwrap();
        foreach_div_scalar_(&ctx(), &mut tensors, &Scalar::from(3.0)).unwrap();
        for (t, o) in tensors.iter().zip(&original) {
            let t = t.data::<f32>().unwrap();
            let o = o.data::<f32>().unwrap();
            for i in 0..t.len() {
                assert_relative_eq!(t[i], o[i], epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_zero_fill_idempotent() {
        let mut tensors = f32_batch(&[9, 300]);
        foreach_zero_(&ctx(), &mut tensors).unwrap();
        let first: Vec<Vec<f32>> = tensors
            .iter()
            .map(|t| t.data::<f32>().unwrap().to_vec())
            .collect();
        foreach_zero_(&ctx(), &mut tensors).unwrap();
        for (t, f) in tensors.iter().zip(&first) {
            assert_eq!(t.data::<f32>().unwrap(), f.as_slice());
            assert!(f.iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_mismatched_lengths_precondition_error() {
        let input = f32_batch(&[4, 4]);
        let t1 = f32_batch(&[4]);
        let t2 = f32_batch(&[4, 4]);
        let err =
            foreach_addcmul(&ctx(), &input, &t1, &t2, &Scalar::from(1.0)).unwrap_err();
        assert!(matches!(err, ForeachError::ListLengthMismatch { .. }));
        // the rejected call must not have touched the inputs
        assert_eq!(input[0].data::<f32>().unwrap(), f32_batch(&[4])[0].data::<f32>().unwrap());
    }

    #[test]
    fn test_sub_bool_scalar_rejected_before_routing() {
        let tensors = f32_batch(&[4]);
        let err = foreach_sub_scalar(&ctx(), &tensors, &Scalar::from(true)).unwrap_err();
        assert!(matches!(err, ForeachError::BoolScalarSub { .. }));
    }

    #[test]
    fn test_integral_division_takes_slow_path() {
        // Slow-path proof: the promoted F32 result is something the
        // in-place-typed batched path cannot produce.
        let tensors = vec![
            Tensor::from_vec(vec![1i64, 2, 3], vec![3]),
            Tensor::from_vec(vec![10i64, 20, 30], vec![3]),
        ];
        let out = foreach_div_scalar(&ctx(), &tensors, &Scalar::from(4i64)).unwrap();
        assert_eq!(out[0].dtype(), DType::F32);
        assert_relative_eq!(out[0].data::<f32>().unwrap()[1], 0.5);
        assert_relative_eq!(out[1].data::<f32>().unwrap()[2], 7.5);
    }

    #[test]
    fn test_integral_add_stays_fast_and_exact() {
        let tensors = vec![Tensor::from_vec(vec![1i32, -5, 100], vec![3])];
        let out = foreach_add_scalar(&ctx(), &tensors, &Scalar::from(7i64)).unwrap();
        assert_eq!(out[0].dtype(), DType::I32);
        assert_eq!(out[0].data::<i32>().unwrap(), &[8, 2, 107]);
    }

    #[test]
    fn test_integral_add_exact_above_f64_mantissa() {
        // A scalar of 2^53 + 1 has no exact f64 representation; the fast
        // path must add it without dropping the low bit.
        let s = (1i64 << 53) + 1;
        let tensors = vec![Tensor::from_vec(vec![0i64, 10], vec![2])];
        let out = foreach_add_scalar(&ctx(), &tensors, &Scalar::from(s)).unwrap();
        assert_eq!(out[0].data::<i64>().unwrap(), &[s, s + 10]);
    }

    #[test]
    fn test_non_contiguous_routes_to_slow_path() {
        let base = Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]);
        let nc = base.permuted(&[1, 0]).unwrap();
        let out = foreach_add_scalar(&ctx(), &[nc], &Scalar::from(1.0)).unwrap();
        // result is contiguous in the permuted logical order
        assert_eq!(out[0].shape().dims(), &[3, 2]);
        assert_eq!(
            out[0].data::<f32>().unwrap(),
            &[2.0, 5.0, 3.0, 6.0, 4.0, 7.0]
        );
    }

    #[test]
    fn test_addcmul_matches_manual() {
        let input = f32_batch(&[33]);
        let t1 = f32_batch(&[33]);
        let t2 = f32_batch(&[33]);
        let out = foreach_addcmul(&ctx(), &input, &t1, &t2, &Scalar::from(0.5)).unwrap();
        let i = input[0].data::<f32>().unwrap();
        let a = t1[0].data::<f32>().unwrap();
        let b = t2[0].data::<f32>().unwrap();
        let r = out[0].data::<f32>().unwrap();
        for k in 0..33 {
            assert_relative_eq!(r[k], i[k] + 0.5 * a[k] * b[k], max_relative = 1e-6);
        }
    }

    #[test]
    fn test_addcdiv_in_place() {
        let mut input = vec![Tensor::from_vec(vec![1.0f32, 2.0], vec![2])];
        let t1 = vec![Tensor::from_vec(vec![6.0f32, 9.0], vec![2])];
        let t2 = vec![Tensor::from_vec(vec![2.0f32, 3.0], vec![2])];
        foreach_addcdiv_(&ctx(), &mut input, &t1, &t2, &Scalar::from(2.0)).unwrap();
        assert_eq!(input[0].data::<f32>().unwrap(), &[7.0, 8.0]);
    }

    #[test]
    fn test_f16_widened_equivalence() {
        let data: Vec<f16> = (0..100).map(|i| f16::from_f32(i as f32 * 0.01)).collect();
        let tensors = vec![Tensor::from_vec(data, vec![100])];
        let fast = foreach_mul_scalar(&ctx(), &tensors, &Scalar::from(1.5)).unwrap();
        let slow =
            fallback::foreach_binary_scalar_slow(&tensors, &Scalar::from(1.5), BinaryOpKind::Mul)
                .unwrap();
        let f = fast[0].data::<f16>().unwrap();
        let s = slow[0].data::<f16>().unwrap();
        for i in 0..100 {
            assert_relative_eq!(f[i].to_f32(), s[i].to_f32(), epsilon = 2e-3);
        }
    }

    #[test]
    fn test_unary_neg_and_sqrt() {
        let tensors = vec![Tensor::from_vec(vec![4.0f32, 9.0, 16.0], vec![3])];
        let neg = foreach_neg(&ctx(), &tensors).unwrap();
        assert_eq!(neg[0].data::<f32>().unwrap(), &[-4.0, -9.0, -16.0]);
        let sqrt = foreach_sqrt(&ctx(), &tensors).unwrap();
        assert_eq!(sqrt[0].data::<f32>().unwrap(), &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_unary_sqrt_integral_promotes_via_slow_path() {
        let tensors = vec![Tensor::from_vec(vec![4i32, 9], vec![2])];
        let out = foreach_sqrt(&ctx(), &tensors).unwrap();
        assert_eq!(out[0].dtype(), DType::F32);
        assert_eq!(out[0].data::<f32>().unwrap(), &[2.0, 3.0]);
    }

    #[test]
    fn test_empty_tensor_in_batch_is_skipped() {
        let tensors = vec![
            Tensor::from_vec(Vec::<f32>::new(), vec![0]),
            Tensor::from_vec(vec![1.0f32, 2.0], vec![2]),
        ];
        let out = foreach_add_scalar(&ctx(), &tensors, &Scalar::from(1.0)).unwrap();
        assert_eq!(out[0].numel(), 0);
        assert_eq!(out[1].data::<f32>().unwrap(), &[2.0, 3.0]);
    }

    #[test]
    fn test_empty_list_rejected() {
        let tensors: Vec<Tensor> = vec![];
        let err = foreach_add_scalar(&ctx(), &tensors, &Scalar::from(1.0)).unwrap_err();
        assert!(matches!(err, ForeachError::EmptyTensorList));
    }
}
