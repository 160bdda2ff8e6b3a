//! Appending to a file, 4 KiB at a time by default.

use crate::config::DEFAULT_FILE_APPEND_CHUNK_SIZE;
use crate::error::{Error, Result};
use crate::hbar::Hbar;
use crate::ids::FileId;
use crate::transaction::chunk::ChunkData;
use crate::transaction::data::{chunk_payload, unexpected_body};
use crate::transaction::{ChunkContext, Schedulable, Transaction, TransactionData};
use crate::wire::{FileAppendBody, SchedulableBodyData, TransactionBodyData};

/// Appends contents to a file.
pub type FileAppendTransaction = Transaction<FileAppendData>;

/// File appends cost more than the generic default.
const FILE_APPEND_DEFAULT_MAX_FEE: Hbar = Hbar::new(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAppendData {
    file_id: Option<FileId>,
    chunk: ChunkData,
}

impl Default for FileAppendData {
    fn default() -> Self {
        Self {
            file_id: None,
            chunk: ChunkData::with_chunk_size(DEFAULT_FILE_APPEND_CHUNK_SIZE),
        }
    }
}

impl FileAppendData {
    fn body(&self, chunk: Option<&ChunkContext>) -> FileAppendBody {
        FileAppendBody {
            file_id: self.file_id,
            contents: chunk_payload(&self.chunk, chunk).to_vec(),
        }
    }
}

impl TransactionData for FileAppendData {
    fn default_max_transaction_fee(&self) -> Hbar {
        FILE_APPEND_DEFAULT_MAX_FEE
    }

    fn chunk_data(&self) -> Option<&ChunkData> {
        Some(&self.chunk)
    }

    fn chunk_data_mut(&mut self) -> Option<&mut ChunkData> {
        Some(&mut self.chunk)
    }

    fn validate(&self) -> Result<()> {
        if self.file_id.is_none() {
            return Err(Error::configuration("file id is required"));
        }
        Ok(())
    }

    fn to_body_data(&self, chunk: Option<&ChunkContext>) -> TransactionBodyData {
        TransactionBodyData::FileAppend(self.body(chunk))
    }

    fn from_body_data(chunks: &[TransactionBodyData]) -> Result<Self> {
        let mut file_id = None;
        let mut slices = Vec::with_capacity(chunks.len());
        for data in chunks {
            let TransactionBodyData::FileAppend(body) = data else {
                return Err(unexpected_body("FileAppend", data));
            };
            file_id = file_id.or(body.file_id);
            slices.push(body.contents.as_slice());
        }

        Ok(Self {
            file_id,
            chunk: ChunkData::from_slices(slices, DEFAULT_FILE_APPEND_CHUNK_SIZE),
        })
    }
}

impl Schedulable for FileAppendData {
    fn to_schedulable_body_data(&self) -> SchedulableBodyData {
        SchedulableBodyData::FileAppend(self.body(None))
    }
}

impl Transaction<FileAppendData> {
    pub fn file_id(&self) -> Option<FileId> {
        self.data().file_id
    }

    pub fn set_file_id(&mut self, file_id: FileId) -> Result<&mut Self> {
        self.data_mut("file_id")?.file_id = Some(file_id);
        Ok(self)
    }

    pub fn contents(&self) -> &[u8] {
        &self.data().chunk.data
    }

    pub fn set_contents(&mut self, contents: impl Into<Vec<u8>>) -> Result<&mut Self> {
        self.data_mut("contents")?.chunk.data = contents.into();
        Ok(self)
    }

    pub fn set_chunk_size(&mut self, chunk_size: usize) -> Result<&mut Self> {
        self.data_mut("chunk_size")?.chunk.chunk_size = chunk_size;
        Ok(self)
    }

    pub fn set_max_chunks(&mut self, max_chunks: usize) -> Result<&mut Self> {
        self.data_mut("max_chunks")?.chunk.max_chunks = max_chunks;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_chunk_size_is_4k() {
        let tx = FileAppendTransaction::new();
        assert_eq!(tx.data().chunk.chunk_size, 4096);
        assert_eq!(tx.data().default_max_transaction_fee(), Hbar::new(5));
    }

    #[test]
    fn draft_body_carries_whole_contents() {
        let mut tx = FileAppendTransaction::new();
        tx.set_file_id(FileId::from(150)).unwrap();
        tx.set_contents(vec![1u8; 10_000]).unwrap();

        let TransactionBodyData::FileAppend(body) = tx.draft_body().data else {
            panic!("wrong body kind");
        };
        assert_eq!(body.contents.len(), 10_000);
        assert_eq!(body.file_id, Some(FileId::from(150)));
    }
}
