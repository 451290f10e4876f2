/// A contiguous byte range of a file scheduled for transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    /// Position of this chunk within its file, starting at 0.
    pub index: u32,

    /// First byte of the range, inclusive.
    pub start: u64,

    /// End of the range, exclusive.
    pub end: u64,
}

impl ChunkRange {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Partitions `n_bytes` into fixed-size chunks of `chunk_size` bytes each,
/// covering `[0, n_bytes)` with no gaps or overlaps, in ascending index order.
/// The final chunk carries the remainder.
///
/// A zero-byte length yields a single empty range, so every file produces at
/// least one transfer call and the backend positively confirms the data path.
pub fn chunk_ranges(n_bytes: u64, chunk_size: usize) -> Vec<ChunkRange> {
    assert!(chunk_size > 0);

    if n_bytes == 0 {
        return vec![ChunkRange { index: 0, start: 0, end: 0 }];
    }

    let chunk_size = chunk_size as u64;
    let n_chunks = n_bytes.div_ceil(chunk_size);

    let mut ranges = Vec::with_capacity(n_chunks as usize);
    let mut start = 0;

    for index in 0..n_chunks {
        let end = (start + chunk_size).min(n_bytes);
        ranges.push(ChunkRange { index: index as u32, start, end });
        start = end;
    }

    ranges
}

#[cfg(test)]
mod tests {
    use rand::prelude::*;

    use super::*;

    /// Checks that `ranges` partitions `[0, n_bytes)` exactly once, in
    /// ascending index order.
    fn check_partition(n_bytes: u64, chunk_size: usize, ranges: &[ChunkRange]) {
        assert_eq!(ranges.len() as u64, n_bytes.div_ceil(chunk_size as u64).max(1));

        let mut expected_start = 0;
        for (i, range) in ranges.iter().enumerate() {
            assert_eq!(range.index as usize, i);
            assert_eq!(range.start, expected_start);
            assert!(range.end >= range.start);
            expected_start = range.end;
        }
        assert_eq!(expected_start, n_bytes);

        // Every chunk except the last is exactly chunk_size bytes.
        for range in &ranges[..ranges.len().saturating_sub(1)] {
            assert_eq!(range.len(), chunk_size as u64);
        }
    }

    #[test]
    fn test_exact_multiple() {
        let ranges = chunk_ranges(40, 10);
        assert_eq!(ranges.len(), 4);
        check_partition(40, 10, &ranges);
        assert_eq!(ranges[3], ChunkRange { index: 3, start: 30, end: 40 });
    }

    #[test]
    fn test_remainder_chunk() {
        let ranges = chunk_ranges(41, 10);
        assert_eq!(ranges.len(), 5);
        check_partition(41, 10, &ranges);
        assert_eq!(ranges[4].len(), 1);
    }

    #[test]
    fn test_single_chunk() {
        let ranges = chunk_ranges(9, 10);
        assert_eq!(ranges.len(), 1);
        check_partition(9, 10, &ranges);
    }

    #[test]
    fn test_empty_file_yields_one_empty_chunk() {
        let ranges = chunk_ranges(0, 10);
        assert_eq!(ranges, vec![ChunkRange { index: 0, start: 0, end: 0 }]);
        assert!(ranges[0].is_empty());
    }

    #[test]
    fn test_five_mib_scenario() {
        const MIB: u64 = 1024 * 1024;
        let chunk_size = (5 * MIB) as usize;

        // Sizes [0, 5 MiB + 1, 12 MiB] split at 5 MiB give chunk counts [1, 2, 3].
        let cases = [(0, 1), (5 * MIB + 1, 2), (12 * MIB, 3)];

        for (n_bytes, expected_chunks) in cases {
            let ranges = chunk_ranges(n_bytes, chunk_size);
            assert_eq!(ranges.len(), expected_chunks, "size {n_bytes}");
            check_partition(n_bytes, chunk_size, &ranges);
        }
    }

    #[test]
    fn test_random_sizes_partition() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..500 {
            let chunk_size = rng.random_range(1..4096usize);
            let n_bytes = rng.random_range(0..1_000_000u64);

            check_partition(n_bytes, chunk_size, &chunk_ranges(n_bytes, chunk_size));
        }
    }
}
