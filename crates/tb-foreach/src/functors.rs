//! Elementwise chunk functors.
//!
//! All functors share the same chunk mechanics: rebase every slot span onto
//! the assigned chunk, compute the tensor's remaining element count, then
//! run either the vectorized loop (when the remaining count and the chunk
//! size are both multiples of `VEC_WIDTH` and every slot base is aligned)
//! or the guarded scalar loop. The two variants cover identical element
//! ranges and differ only in access width. Math happens in the widened
//! `Acc` type and narrows back to storage width on store.

use crate::apply::ChunkFunctor;
use crate::descriptor::{SlotSpan, TensorMeta, VEC_WIDTH};
use tb_tensor::{AccType, Element};

/// Binary math between a tensor element and the call's scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOpKind {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOpKind {
    pub fn apply<A: AccType>(self, a: A, b: A) -> A {
        match self {
            BinaryOpKind::Add => a + b,
            BinaryOpKind::Sub => a - b,
            BinaryOpKind::Mul => a * b,
            BinaryOpKind::Div => a / b,
        }
    }

    /// Division forces integral inputs to promote to floating point, which
    /// the in-place batched path cannot produce.
    pub fn is_division(self) -> bool {
        matches!(self, BinaryOpKind::Div)
    }
}

/// The inner op of the `input + scalar * op(t1, t2)` pointwise family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointwiseOpKind {
    Mul,
    Div,
}

impl PointwiseOpKind {
    pub fn apply<A: AccType>(self, a: A, b: A) -> A {
        match self {
            PointwiseOpKind::Mul => a * b,
            PointwiseOpKind::Div => a / b,
        }
    }

    pub fn is_division(self) -> bool {
        matches!(self, PointwiseOpKind::Div)
    }
}

/// Single-argument math applied per element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpKind {
    Neg,
    Abs,
    Sqrt,
    Exp,
}

impl UnaryOpKind {
    pub fn apply<A: AccType>(self, a: A) -> A {
        match self {
            UnaryOpKind::Neg => -a,
            UnaryOpKind::Abs => a.abs(),
            UnaryOpKind::Sqrt => a.sqrt(),
            UnaryOpKind::Exp => a.exp(),
        }
    }

    /// Ops whose result is floating point regardless of input dtype;
    /// integral batches take the slow path for these.
    pub fn float_only(self) -> bool {
        matches!(self, UnaryOpKind::Sqrt | UnaryOpKind::Exp)
    }
}

/// Chunk prologue shared by every functor: rebased slots, remaining element
/// count from the chunk start, and the vectorization decision.
struct ChunkArgs<T, const DEPTH: usize> {
    slots: [SlotSpan<T>; DEPTH],
    /// Elements this chunk actually covers.
    count: usize,
    vectorize: bool,
}

fn init_chunk<T: Element, const DEPTH: usize>(
    chunk_size: usize,
    meta: &TensorMeta<T, DEPTH>,
    chunk_idx: usize,
) -> ChunkArgs<T, DEPTH> {
    let offset = chunk_idx * chunk_size;
    let slots = meta.slots.map(|s| s.offset_by(offset));
    let remaining = meta.numel - offset;
    let aligned = slots.iter().all(SlotSpan::is_vec_aligned);
    ChunkArgs {
        slots,
        count: remaining.min(chunk_size),
        vectorize: remaining % VEC_WIDTH == 0 && chunk_size % VEC_WIDTH == 0 && aligned,
    }
}

/// Applies `f(x)` from slot 0 into `res_slot` (0 for in-place, 1 for a
/// separate output).
pub struct UnaryFunctor {
    pub kind: UnaryOpKind,
    pub res_slot: usize,
}

impl<T: Element, const DEPTH: usize> ChunkFunctor<T, DEPTH> for UnaryFunctor {
    fn process_chunk(&self, chunk_size: usize, meta: &TensorMeta<T, DEPTH>, chunk_idx: usize) {
        let args = init_chunk(chunk_size, meta, chunk_idx);
        let src = args.slots[0];
        let dst = args.slots[self.res_slot];
        if args.vectorize {
            let mut i = 0;
            while i < args.count {
                let run = src.load_run(i);
                let mut out = [T::ZERO; VEC_WIDTH];
                for l in 0..VEC_WIDTH {
                    out[l] = T::from_acc(self.kind.apply(run[l].to_acc()));
                }
                dst.store_run(i, out);
                i += VEC_WIDTH;
            }
        } else {
            for i in 0..args.count {
                dst.set(i, T::from_acc(self.kind.apply(src.get(i).to_acc())));
            }
        }
    }
}

/// Applies `op(x, scalar)` from slot 0 into `res_slot`.
pub struct BinaryScalarFunctor<T: Element> {
    pub kind: BinaryOpKind,
    pub scalar: T::Acc,
    pub res_slot: usize,
}

impl<T: Element, const DEPTH: usize> ChunkFunctor<T, DEPTH> for BinaryScalarFunctor<T> {
    fn process_chunk(&self, chunk_size: usize, meta: &TensorMeta<T, DEPTH>, chunk_idx: usize) {
        let args = init_chunk(chunk_size, meta, chunk_idx);
        let src = args.slots[0];
        let dst = args.slots[self.res_slot];
        if args.vectorize {
            let mut i = 0;
            while i < args.count {
                let run = src.load_run(i);
                let mut out = [T::ZERO; VEC_WIDTH];
                for l in 0..VEC_WIDTH {
                    out[l] = T::from_acc(self.kind.apply(run[l].to_acc(), self.scalar));
                }
                dst.store_run(i, out);
                i += VEC_WIDTH;
            }
        } else {
            for i in 0..args.count {
                let acc = self.kind.apply(src.get(i).to_acc(), self.scalar);
                dst.set(i, T::from_acc(acc));
            }
        }
    }
}

/// Applies `input + scalar * op(t1, t2)` with input/t1/t2 in slots 0/1/2
/// and the result in `res_slot` (0 for in-place, 3 for a separate output).
pub struct PointwiseScalarFunctor<T: Element> {
    pub kind: PointwiseOpKind,
    pub scalar: T::Acc,
    pub res_slot: usize,
}

impl<T: Element, const DEPTH: usize> ChunkFunctor<T, DEPTH> for PointwiseScalarFunctor<T> {
    fn process_chunk(&self, chunk_size: usize, meta: &TensorMeta<T, DEPTH>, chunk_idx: usize) {
        let args = init_chunk(chunk_size, meta, chunk_idx);
        let dst = args.slots[self.res_slot];
        if args.vectorize {
            let mut i = 0;
            while i < args.count {
                let r0 = args.slots[0].load_run(i);
                let r1 = args.slots[1].load_run(i);
                let r2 = args.slots[2].load_run(i);
                let mut out = [T::ZERO; VEC_WIDTH];
                for l in 0..VEC_WIDTH {
                    let acc = r0[l].to_acc()
                        + self.scalar * self.kind.apply(r1[l].to_acc(), r2[l].to_acc());
                    out[l] = T::from_acc(acc);
                }
                dst.store_run(i, out);
                i += VEC_WIDTH;
            }
        } else {
            for i in 0..args.count {
                let acc = args.slots[0].get(i).to_acc()
                    + self.scalar
                        * self
                            .kind
                            .apply(args.slots[1].get(i).to_acc(), args.slots[2].get(i).to_acc());
                dst.set(i, T::from_acc(acc));
            }
        }
    }
}

/// Writes zero to every element of slot 0; never reads source data.
pub struct ZeroFunctor;

impl<T: Element> ChunkFunctor<T, 1> for ZeroFunctor {
    fn process_chunk(&self, chunk_size: usize, meta: &TensorMeta<T, 1>, chunk_idx: usize) {
        let args = init_chunk(chunk_size, meta, chunk_idx);
        let dst = args.slots[0];
        if args.vectorize {
            let mut i = 0;
            while i < args.count {
                dst.store_run(i, [T::ZERO; VEC_WIDTH]);
                i += VEC_WIDTH;
            }
        } else {
            for i in 0..args.count {
                dst.set(i, T::ZERO);
            }
        }
    }
}
