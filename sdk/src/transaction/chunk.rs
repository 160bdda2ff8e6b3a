//! # Chunking
//!
//! Splits a payload that is too large for one transaction into sibling
//! transactions. Every sibling carries a contiguous slice of the payload and
//! its own identity, derived from the first chunk's by stepping the
//! valid-start forward one nanosecond per chunk:
//!
//! ```text
//! payload:  [━━━━━━━━━━ 1024 ━━━━━━━━━━|━━━━━━━━━━ 1024 ━━━━━━━━━━|━━ 452 ━━]
//! chunk:              1/3                          2/3                3/3
//! tx id:         payer@T                      payer@T+1ns        payer@T+2ns
//! ```
//!
//! Receivers stitch chunks back together with
//! [`ChunkCollector`](crate::topic_message::ChunkCollector).

use std::ops::Range;

use crate::config::{CHUNK_VALID_START_STEP, DEFAULT_MAX_CHUNKS};
use crate::error::{Error, Result};
use crate::transaction_id::TransactionId;

/// The payload of a chunkable transaction kind plus its chunking limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkData {
    pub data: Vec<u8>,
    pub chunk_size: usize,
    pub max_chunks: usize,
}

impl ChunkData {
    /// An empty payload with the given slice size.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            data: Vec::new(),
            chunk_size,
            max_chunks: DEFAULT_MAX_CHUNKS,
        }
    }

    /// Rebuilds chunk data from the slices carried by serialized siblings.
    ///
    /// With several slices the first one's length is the chunk size;
    /// otherwise `default_chunk_size` is kept.
    pub(crate) fn from_slices<'a>(
        slices: impl IntoIterator<Item = &'a [u8]>,
        default_chunk_size: usize,
    ) -> Self {
        let mut data = Vec::new();
        let mut first_len = None;
        let mut count = 0;
        for slice in slices {
            first_len.get_or_insert(slice.len());
            data.extend_from_slice(slice);
            count += 1;
        }

        let chunk_size = match (count, first_len) {
            (n, Some(len)) if n > 1 => len,
            _ => default_chunk_size,
        };

        Self {
            data,
            chunk_size,
            max_chunks: DEFAULT_MAX_CHUNKS.max(count),
        }
    }

    /// Number of chunks the payload needs at the current chunk size.
    pub fn required_chunks(&self) -> usize {
        chunk_count(self.data.len(), self.chunk_size)
    }
}

/// One sibling of a chunk series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 1-based position.
    pub number: u32,
    /// Size of the series.
    pub total: u32,
    /// Identity of this sibling.
    pub transaction_id: TransactionId,
    /// Byte range of the payload this sibling carries.
    pub range: Range<usize>,
}

impl Chunk {
    /// The slice of `payload` carried by this chunk.
    pub fn slice<'a>(&self, payload: &'a [u8]) -> &'a [u8] {
        payload.get(self.range.clone()).unwrap_or_default()
    }
}

/// The ordered siblings produced by [`split`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSeries {
    chunks: Vec<Chunk>,
}

impl ChunkSeries {
    /// Identity of chunk 1.
    pub fn initial_transaction_id(&self) -> Option<TransactionId> {
        self.chunks.first().map(|chunk| chunk.transaction_id)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn get(&self, index: usize) -> Option<&Chunk> {
        self.chunks.get(index)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn transaction_ids(&self) -> Vec<TransactionId> {
        self.chunks.iter().map(|chunk| chunk.transaction_id).collect()
    }
}

/// `ceil(len / chunk_size)`, with an empty payload still needing one chunk.
pub fn chunk_count(len: usize, chunk_size: usize) -> usize {
    if chunk_size == 0 {
        return usize::MAX;
    }
    len.div_ceil(chunk_size).max(1)
}

/// Splits a payload of `len` bytes into siblings of at most `chunk_size`
/// bytes each.
///
/// Fails with [`Error::ChunkLimitExceeded`] when more than `max_chunks`
/// would be needed. Chunk 1 keeps `initial_transaction_id`; chunk `i`
/// starts `i - 1` nanoseconds later.
pub fn split(
    len: usize,
    chunk_size: usize,
    max_chunks: usize,
    initial_transaction_id: TransactionId,
) -> Result<ChunkSeries> {
    if chunk_size == 0 {
        return Err(Error::configuration("chunk size must be greater than zero"));
    }

    let chunks = chunk_count(len, chunk_size);
    if chunks > max_chunks {
        return Err(Error::ChunkLimitExceeded { chunks, max_chunks });
    }
    let total = u32::try_from(chunks)
        .map_err(|_| Error::ChunkLimitExceeded { chunks, max_chunks })?;

    let chunks = (0..total)
        .map(|i| {
            let start = (i as usize * chunk_size).min(len);
            let end = (start + chunk_size).min(len);
            Chunk {
                number: i + 1,
                total,
                transaction_id: initial_transaction_id.offset_by(CHUNK_VALID_START_STEP * i),
                range: start..end,
            }
        })
        .collect();

    Ok(ChunkSeries { chunks })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::AccountId;
    use crate::timestamp::Timestamp;
    use std::time::Duration;

    fn initial() -> TransactionId {
        TransactionId::with_valid_start(AccountId::from(2), Timestamp::new(1_700_000_000, 999_999_999))
    }

    #[test]
    fn splits_2500_bytes_into_three_chunks() {
        let series = split(2500, 1024, 20, initial()).unwrap();
        let ranges: Vec<_> = series.chunks().iter().map(|c| c.range.clone()).collect();
        assert_eq!(ranges, vec![0..1024, 1024..2048, 2048..2500]);

        for (i, chunk) in series.chunks().iter().enumerate() {
            assert_eq!(chunk.number as usize, i + 1);
            assert_eq!(chunk.total, 3);
            assert_eq!(
                chunk.transaction_id,
                initial().offset_by(Duration::from_nanos(i as u64))
            );
        }
        assert_eq!(series.initial_transaction_id(), Some(initial()));
    }

    #[test]
    fn sibling_ids_carry_nanos_into_seconds() {
        let series = split(3, 1, 20, initial()).unwrap();
        assert_eq!(
            series.get(1).unwrap().transaction_id.valid_start,
            Timestamp::new(1_700_000_001, 0)
        );
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        let series = split(2048, 1024, 20, initial()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.get(1).unwrap().range, 1024..2048);
    }

    #[test]
    fn empty_payload_is_one_chunk() {
        let series = split(0, 1024, 20, initial()).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.get(0).unwrap().range, 0..0);
    }

    #[test]
    fn too_many_chunks_is_rejected() {
        let err = split(21 * 1024, 1024, 20, initial()).unwrap_err();
        assert!(matches!(
            err,
            Error::ChunkLimitExceeded {
                chunks: 21,
                max_chunks: 20
            }
        ));
    }

    #[test]
    fn zero_chunk_size_is_a_configuration_error() {
        assert!(split(10, 0, 20, initial()).unwrap_err().is_configuration());
    }

    #[test]
    fn slices_rebuild_chunk_data() {
        let payload: Vec<u8> = (0..=255u8).cycle().take(2500).collect();
        let series = split(payload.len(), 1024, 20, initial()).unwrap();
        let rebuilt = ChunkData::from_slices(
            series.chunks().iter().map(|c| c.slice(&payload)),
            4096,
        );
        assert_eq!(rebuilt.data, payload);
        assert_eq!(rebuilt.chunk_size, 1024);
        assert_eq!(rebuilt.required_chunks(), 3);
    }

    #[test]
    fn single_slice_keeps_default_chunk_size() {
        let rebuilt = ChunkData::from_slices([&[7u8; 5000][..]], 1024);
        assert_eq!(rebuilt.chunk_size, 1024);
        assert_eq!(rebuilt.data.len(), 5000);
        assert_eq!(rebuilt.max_chunks, DEFAULT_MAX_CHUNKS);
    }
}
