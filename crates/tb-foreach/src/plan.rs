//! Chunk planning: decomposes each tensor in a batch into fixed-size work
//! chunks and flattens the result into one work-group assignment table.

/// One scheduled unit of parallel work: which tensor of the batch and which
/// chunk within that tensor a work-group processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkGroup {
    pub tensor: usize,
    pub chunk: usize,
}

/// Number of chunks a tensor of `numel` elements decomposes into.
pub(crate) fn chunks_for(numel: usize, chunk_size: usize) -> usize {
    numel.div_ceil(chunk_size)
}

/// Builds the flat work-group table for a batch.
///
/// Assignments are emitted tensor-major, chunk-minor: all chunks of tensor
/// 0, then all chunks of tensor 1, and so on. The ordering is deterministic,
/// not load-balance optimal. Zero-element tensors contribute no assignments.
/// The table length is the dispatch width of the batched launch.
///
/// # Panics
/// Panics if `chunk_size` is zero.
pub fn plan_work_groups(numels: &[usize], chunk_size: usize) -> Vec<WorkGroup> {
    assert!(chunk_size > 0, "chunk size must be positive");
    let total: usize = numels.iter().map(|&n| chunks_for(n, chunk_size)).sum();
    let mut groups = Vec::with_capacity(total);
    for (tensor, &numel) in numels.iter().enumerate() {
        for chunk in 0..chunks_for(numel, chunk_size) {
            groups.push(WorkGroup { tensor, chunk });
        }
    }
    groups
}
