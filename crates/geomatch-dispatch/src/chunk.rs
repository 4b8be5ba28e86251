//! Work partitioning

/// Split `items` into consecutive chunks of at most `size` elements
pub fn chunker<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    items.chunks(size.max(1)).map(<[T]>::to_vec).collect()
}

/// Chunk size and job count for `total` items.
///
/// Chunks hold at least `min_chunk` items and there are roughly at most
/// `max_jobs` of them.
pub fn partition(total: usize, max_jobs: usize, min_chunk: usize) -> (usize, usize) {
    let chunk_size = min_chunk.max(total / max_jobs.max(1)).max(1);
    (chunk_size, total.div_ceil(chunk_size))
}
