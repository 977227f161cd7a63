//! The batched dispatcher: one data-parallel launch covering every chunk of
//! every tensor in the batch.

use crate::context::ExecContext;
use crate::descriptor::TensorMeta;
use crate::plan::plan_work_groups;
use tb_tensor::Element;

/// Elements per work chunk. A multiple of `VEC_WIDTH` so full chunks always
/// satisfy the vectorized-loop divisibility requirement.
pub const CHUNK_SIZE: usize = 65536;

/// Per-chunk kernel logic. Implementations own the math; the dispatcher
/// owns planning and launch.
pub trait ChunkFunctor<T: Element, const DEPTH: usize>: Sync {
    /// Process chunk `chunk_idx` of the tensor described by `meta`.
    ///
    /// The chunk covers elements `chunk_idx * chunk_size ..` up to the
    /// chunk boundary or the tensor end, whichever comes first.
    fn process_chunk(&self, chunk_size: usize, meta: &TensorMeta<T, DEPTH>, chunk_idx: usize);
}

/// Applies `functor` across a batch described by `metas` in exactly one
/// parallel launch of `CHUNK_SIZE`-element chunks.
pub fn multi_tensor_apply<T, const DEPTH: usize, F>(
    ctx: &ExecContext,
    metas: &[TensorMeta<T, DEPTH>],
    functor: &F,
) where
    T: Element,
    F: ChunkFunctor<T, DEPTH>,
{
    multi_tensor_apply_chunked(ctx, metas, functor, CHUNK_SIZE);
}

/// `multi_tensor_apply` with an explicit chunk size. The dispatch width is
/// the work-group count the planner derives from the descriptor table; each
/// work-group recovers its (tensor, chunk) assignment and processes exactly
/// that range.
pub fn multi_tensor_apply_chunked<T, const DEPTH: usize, F>(
    ctx: &ExecContext,
    metas: &[TensorMeta<T, DEPTH>],
    functor: &F,
    chunk_size: usize,
) where
    T: Element,
    F: ChunkFunctor<T, DEPTH>,
{
    let numels: Vec<usize> = metas.iter().map(|m| m.numel).collect();
    let groups = plan_work_groups(&numels, chunk_size);
    ctx.launch(groups.len(), |g| {
        let wg = groups[g];
        functor.process_chunk(chunk_size, &metas[wg.tensor], wg.chunk);
    });
}
