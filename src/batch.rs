//! Splitting the symbol universe into provider-sized request groups.

use std::slice::Chunks;

use crate::error::ValidationError;

/// Largest group the quote provider accepts in one request.
pub const MAX_BATCH_SIZE: usize = 100;

pub fn validate_batch_size(batch_size: usize) -> Result<usize, ValidationError> {
    match batch_size {
        0 => Err(ValidationError::ZeroBatchSize),
        size if size > MAX_BATCH_SIZE => Err(ValidationError::BatchSizeTooLarge {
            size,
            max: MAX_BATCH_SIZE,
        }),
        size => Ok(size),
    }
}

/// Lazily split `items` into contiguous, order-preserving groups of at most
/// `batch_size`. The returned iterator is `Clone`, so a batching can be
/// replayed without touching the input.
pub fn batches<T>(items: &[T], batch_size: usize) -> Result<Chunks<'_, T>, ValidationError> {
    let size = validate_batch_size(batch_size)?;
    Ok(items.chunks(size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batches_reassemble_to_the_input() {
        let items: Vec<u32> = (0..257).collect();
        for size in [1, 2, 7, 50, 99, 100] {
            let groups: Vec<&[u32]> = batches(&items, size).expect("valid size").collect();
            assert!(groups.iter().all(|g| !g.is_empty() && g.len() <= size));
            let rebuilt: Vec<u32> = groups.concat();
            assert_eq!(rebuilt, items, "size {size}");
        }
    }

    #[test]
    fn empty_input_yields_no_batches() {
        let items: Vec<u32> = Vec::new();
        assert_eq!(batches(&items, 10).expect("valid size").count(), 0);
    }

    #[test]
    fn oversized_batch_yields_a_single_group() {
        let items = ["A", "B", "C"];
        let groups: Vec<&[&str]> = batches(&items, 100).expect("valid size").collect();
        assert_eq!(groups, vec![&items[..]]);
    }

    #[test]
    fn batching_is_restartable() {
        let items: Vec<u32> = (0..10).collect();
        let first = batches(&items, 3).expect("valid size");
        let replay = first.clone();
        assert_eq!(first.collect::<Vec<_>>(), replay.collect::<Vec<_>>());
    }

    #[test]
    fn invalid_sizes_are_rejected() {
        let items = [1, 2, 3];
        assert_eq!(batches(&items, 0).unwrap_err(), ValidationError::ZeroBatchSize);
        assert_eq!(
            batches(&items, 101).unwrap_err(),
            ValidationError::BatchSizeTooLarge { size: 101, max: 100 }
        );
    }
}
