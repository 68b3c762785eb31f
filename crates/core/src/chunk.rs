//! Pure helpers for splitting batch requests.

/// Maximum number of write requests accepted by a single batch write.
pub const BATCH_WRITE_LIMIT: usize = 25;

/// Maximum number of keys accepted by a single batch get.
pub const BATCH_GET_LIMIT: usize = 100;

/// Splits `items` into groups of at most `size` elements, preserving order.
///
/// The last group may be shorter. A `size` of zero yields every item in a
/// single group. Empty input yields no groups.
pub fn chunk<T: Clone>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return Vec::new();
    }
    if size == 0 {
        return vec![items];
    }

    items.chunks(size).map(<[T]>::to_vec).collect()
}

/// Number of batch requests needed to send `len` items.
pub fn chunk_count(len: usize, size: usize) -> usize {
    match (len, size) {
        (0, _) => 0,
        (_, 0) => 1,
        (len, size) => len.div_ceil(size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_exact_multiple() {
        let chunks = chunk((0..50).collect::<Vec<_>>(), 25);

        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() == 25));
    }

    #[test]
    fn test_chunk_last_group_shorter() {
        let chunks = chunk(vec![1, 2, 3, 4, 5], 2);
        assert_eq!(chunks, vec![vec![1, 2], vec![3, 4], vec![5]]);
    }

    #[test]
    fn test_chunk_preserves_order() {
        let chunks = chunk((0..60).collect::<Vec<_>>(), BATCH_WRITE_LIMIT);
        let flattened: Vec<i32> = chunks.into_iter().flatten().collect();
        assert_eq!(flattened, (0..60).collect::<Vec<_>>());
    }

    #[test]
    fn test_chunk_empty_input() {
        let chunks: Vec<Vec<u8>> = chunk(Vec::new(), 25);
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_chunk_zero_size() {
        assert_eq!(chunk(vec![1, 2, 3], 0), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn test_chunk_count_matches_chunk() {
        for len in [0, 1, 24, 25, 26, 49, 50, 51, 101] {
            let items: Vec<usize> = (0..len).collect();
            assert_eq!(
                chunk(items, BATCH_WRITE_LIMIT).len(),
                chunk_count(len, BATCH_WRITE_LIMIT),
                "len = {len}"
            );
        }
    }
}
