//! Fast/slow route selection.
//!
//! Pure predicates over the tensor lists and scalar, evaluated before any
//! allocation or dispatch. A failed API restriction is a caller error; a
//! failed fast-route check silently delegates the whole call to the
//! per-tensor slow path.

use crate::error::{ForeachError, Result};
use tb_tensor::{Scalar, Tensor};

/// Structural preconditions every foreach call must satisfy: at least one
/// tensor, matching list lengths, and matching element counts per position.
///
/// Violations are synchronous caller errors; a rejected call performs no
/// allocation and schedules no work.
pub fn check_api_restrictions(lists: &[&[Tensor]]) -> Result<()> {
    let first = lists[0];
    if first.is_empty() {
        return Err(ForeachError::EmptyTensorList);
    }
    for list in &lists[1..] {
        if list.len() != first.len() {
            return Err(ForeachError::ListLengthMismatch {
                expected: first.len(),
                got: list.len(),
            });
        }
    }
    for (index, t0) in first.iter().enumerate() {
        for list in &lists[1..] {
            if list[index].numel() != t0.numel() {
                return Err(ForeachError::NumelMismatch {
                    index,
                    expected: t0.numel(),
                    got: list[index].numel(),
                });
            }
        }
    }
    Ok(())
}

/// True if the scalar's type, combined with the operation, would force a
/// result dtype the in-place batched path cannot produce. Integral inputs
/// promote under a floating scalar or under division.
fn scalar_forces_promotion(t: &Tensor, scalar: Option<&Scalar>, division_op: bool) -> bool {
    if !t.dtype().is_integral() {
        return false;
    }
    if division_op {
        return true;
    }
    matches!(scalar, Some(s) if s.is_floating())
}

/// Whether the batched fast path's structural preconditions hold: every
/// tensor in every list shares one dtype, one device and a contiguous
/// layout, and the scalar does not force dtype promotion.
///
/// Call only after `check_api_restrictions` has passed. Returning false is
/// a correctness routing decision, not an error.
pub fn can_use_fast_route(
    lists: &[&[Tensor]],
    scalar: Option<&Scalar>,
    division_op: bool,
) -> bool {
    let anchor = &lists[0][0];
    for list in lists {
        for t in *list {
            if t.dtype() != anchor.dtype() || t.device() != anchor.device() || !t.is_contiguous()
            {
                return false;
            }
        }
    }
    !scalar_forces_promotion(anchor, scalar, division_op)
}

/// True if any tensor in the list has an integral dtype. Operations whose
/// slow-path semantics differ on integers (exact promotion for
/// addcmul/addcdiv, float results for sqrt/exp) use this to bypass the
/// batched path.
pub fn has_integral_tensor(list: &[Tensor]) -> bool {
    list.iter().any(|t| t.dtype().is_integral())
}

/// Subtraction pre-check, independent of routing: a boolean scalar is
/// rejected before any route decision is made.
pub fn sub_check(t: &Tensor, scalar: &Scalar) -> Result<()> {
    if scalar.is_boolean() {
        return Err(ForeachError::BoolScalarSub { dtype: t.dtype() });
    }
    Ok(())
}
