//! Chunk planning: how a file of a given size splits into fixed-size chunks

/// Largest chunk size a coordinator accepts. Chunkservers accept chunks of
/// this size by default.
pub const MAX_CHUNK_SIZE: u64 = 64 * 1024 * 1024;

/// Number of chunks a file of `file_size` bytes splits into.
///
/// `chunk_size` must be non-zero; that is validated once at startup.
pub fn number_of_chunks(file_size: u64, chunk_size: u64) -> u64 {
    debug_assert!(chunk_size > 0, "chunk size must be positive");
    file_size.div_ceil(chunk_size)
}

/// Length in bytes of the chunk at `index`. Every chunk is `chunk_size` long
/// except the last, which holds the remainder.
pub fn chunk_len(file_size: u64, chunk_size: u64, index: u64) -> u64 {
    let offset = index.saturating_mul(chunk_size);
    chunk_size.min(file_size.saturating_sub(offset))
}

/// Byte offset of the chunk at `index` inside the file
pub fn chunk_offset(chunk_size: u64, index: u64) -> u64 {
    index * chunk_size
}
