//! Journal record framing.
//!
//! Each committed transaction is appended as one record:
//!
//! ```text
//! | magic (4) | version (2) | kind (1) | length (4) | CBOR batch | crc32 (4) |
//! ```
//!
//! Integers are little-endian. The CRC covers every byte before it. A record
//! cut short at the end of the file is a torn write and is dropped on open; a
//! complete record that fails its checks is corruption.

use super::state::CommitBatch;
use super::transaction::CommitSink;
use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// Magic bytes identifying a journal record.
pub const JOURNAL_MAGIC: [u8; 4] = *b"DLOG";

/// Current journal format version.
pub const JOURNAL_VERSION: u16 = 1;

/// magic (4) + version (2) + kind (1) + length (4)
const HEADER_SIZE: usize = 11;

const CRC_SIZE: usize = 4;

/// Kind of journal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum RecordKind {
    /// A committed transaction.
    Commit = 1,
}

impl RecordKind {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Commit),
            _ => None,
        }
    }
}

/// Frames a commit batch as a journal record.
pub(crate) fn encode_record(batch: &CommitBatch) -> CoreResult<Vec<u8>> {
    let mut payload = Vec::new();
    ciborium::into_writer(batch, &mut payload).map_err(|e| CoreError::cbor(e.to_string()))?;

    let len = u32::try_from(payload.len())
        .map_err(|_| CoreError::invalid_operation("journal record payload too large"))?;

    let mut data = Vec::with_capacity(HEADER_SIZE + payload.len() + CRC_SIZE);
    data.extend_from_slice(&JOURNAL_MAGIC);
    data.extend_from_slice(&JOURNAL_VERSION.to_le_bytes());
    data.push(RecordKind::Commit as u8);
    data.extend_from_slice(&len.to_le_bytes());
    data.extend_from_slice(&payload);

    let crc = compute_crc32(&data);
    data.extend_from_slice(&crc.to_le_bytes());
    Ok(data)
}

/// Result of scanning journal bytes.
#[derive(Debug)]
pub(crate) struct Scan {
    pub batches: Vec<CommitBatch>,
    /// Length of the valid prefix.
    pub valid_len: u64,
    /// Bytes of an incomplete trailing record.
    pub torn_bytes: u64,
}

/// Decodes every complete record in `bytes`.
pub(crate) fn scan(bytes: &[u8]) -> CoreResult<Scan> {
    let mut batches = Vec::new();
    let mut pos = 0usize;

    while pos < bytes.len() {
        let offset = pos as u64;
        let rest = &bytes[pos..];
        if rest.len() < HEADER_SIZE {
            break;
        }

        if rest[0..4] != JOURNAL_MAGIC {
            return Err(CoreError::journal_corruption(format!(
                "invalid magic at offset {offset}"
            )));
        }

        let version = u16::from_le_bytes([rest[4], rest[5]]);
        if version > JOURNAL_VERSION {
            return Err(CoreError::journal_corruption(format!(
                "unsupported version {version} at offset {offset}"
            )));
        }

        let kind = rest[6];
        if RecordKind::from_byte(kind).is_none() {
            return Err(CoreError::journal_corruption(format!(
                "unknown record kind {kind} at offset {offset}"
            )));
        }

        let payload_len = u32::from_le_bytes([rest[7], rest[8], rest[9], rest[10]]) as usize;
        let total_len = HEADER_SIZE + payload_len + CRC_SIZE;
        if rest.len() < total_len {
            break;
        }

        let payload_end = HEADER_SIZE + payload_len;
        let stored = u32::from_le_bytes([
            rest[payload_end],
            rest[payload_end + 1],
            rest[payload_end + 2],
            rest[payload_end + 3],
        ]);
        let computed = compute_crc32(&rest[..payload_end]);
        if stored != computed {
            return Err(CoreError::ChecksumMismatch {
                offset,
                expected: stored,
                actual: computed,
            });
        }

        let batch: CommitBatch = ciborium::from_reader(&rest[HEADER_SIZE..payload_end])
            .map_err(|e| {
                CoreError::journal_corruption(format!("undecodable record at offset {offset}: {e}"))
            })?;
        batches.push(batch);
        pos += total_len;
    }

    Ok(Scan {
        batches,
        valid_len: pos as u64,
        torn_bytes: (bytes.len() - pos) as u64,
    })
}

/// Summary of a journal file, as reported by [`inspect_journal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalReport {
    /// Number of complete commit records.
    pub records: usize,
    /// Documents across all records.
    pub documents: usize,
    /// Size of the valid prefix in bytes.
    pub valid_bytes: u64,
    /// Size of an incomplete trailing record, if any.
    pub torn_bytes: u64,
}

/// Checks every record of a journal file without opening the store.
///
/// # Errors
///
/// Returns an error if the file cannot be read, or if a complete record has a
/// bad header, checksum or payload.
pub fn inspect_journal(path: &Path) -> CoreResult<JournalReport> {
    let bytes = fs::read(path)?;
    let scan = scan(&bytes)?;
    Ok(JournalReport {
        records: scan.batches.len(),
        documents: scan.batches.iter().map(|b| b.documents.len()).sum(),
        valid_bytes: scan.valid_len,
        torn_bytes: scan.torn_bytes,
    })
}

/// Reads every committed document from a journal file, in commit order.
///
/// Unlike opening the store, this never modifies the file, so a torn tail is
/// left in place.
///
/// # Errors
///
/// Same as [`inspect_journal`].
pub fn read_journal_documents(path: &Path) -> CoreResult<Vec<Document>> {
    let bytes = fs::read(path)?;
    let scan = scan(&bytes)?;
    Ok(scan
        .batches
        .into_iter()
        .flat_map(|batch| batch.documents)
        .collect())
}

/// The file operations an append needs, so a failed append can be undone.
pub(crate) trait JournalFile: Write + Seek + Send {
    fn sync_data(&mut self) -> io::Result<()>;
    fn set_len(&mut self, len: u64) -> io::Result<()>;
}

impl JournalFile for File {
    fn sync_data(&mut self) -> io::Result<()> {
        File::sync_data(self)
    }

    fn set_len(&mut self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }
}

/// Write end of the journal.
///
/// `len` is the length of the committed prefix. An append that fails is cut
/// back to it; if that also fails the writer is poisoned and refuses further
/// appends.
struct Writer {
    file: Box<dyn JournalFile>,
    len: u64,
    poisoned: bool,
}

impl Writer {
    fn append(&mut self, data: &[u8], sync: bool) -> CoreResult<()> {
        if self.poisoned {
            return Err(CoreError::invalid_operation(
                "journal holds an unreverted partial append; reopen the store",
            ));
        }
        match self.write_record(data, sync) {
            Ok(()) => {
                self.len += data.len() as u64;
                Ok(())
            }
            Err(e) => {
                self.revert();
                Err(e.into())
            }
        }
    }

    fn write_record(&mut self, data: &[u8], sync: bool) -> io::Result<()> {
        self.file.write_all(data)?;
        if sync {
            self.file.sync_data()
        } else {
            self.file.flush()
        }
    }

    fn revert(&mut self) {
        let len = self.len;
        let reverted = self
            .file
            .set_len(len)
            .and_then(|()| self.file.seek(SeekFrom::Start(len)).map(|_| ()));
        match reverted {
            Ok(()) => warn!(len, "failed journal append reverted"),
            Err(e) => {
                error!(len, error = %e, "could not revert failed journal append");
                self.poisoned = true;
            }
        }
    }
}

/// Append-only journal file.
pub(crate) struct Journal {
    path: PathBuf,
    writer: Mutex<Writer>,
    sync_on_commit: bool,
}

impl Journal {
    /// Opens the journal and replays it, dropping a torn tail.
    pub fn open(path: &Path, sync_on_commit: bool) -> CoreResult<(Self, Vec<CommitBatch>)> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        let scan = scan(&bytes)?;

        if scan.torn_bytes > 0 {
            warn!(
                path = %path.display(),
                torn_bytes = scan.torn_bytes,
                "discarding incomplete journal record"
            );
            file.set_len(scan.valid_len)?;
            file.sync_all()?;
        }
        file.seek(SeekFrom::End(0))?;

        debug!(
            path = %path.display(),
            records = scan.batches.len(),
            bytes = scan.valid_len,
            "journal replayed"
        );

        let journal = Self::with_file(path, Box::new(file), scan.valid_len, sync_on_commit);
        Ok((journal, scan.batches))
    }

    fn with_file(
        path: &Path,
        file: Box<dyn JournalFile>,
        len: u64,
        sync_on_commit: bool,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            writer: Mutex::new(Writer {
                file,
                len,
                poisoned: false,
            }),
            sync_on_commit,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CommitSink for Journal {
    fn persist(&self, batch: &CommitBatch) -> CoreResult<()> {
        let data = encode_record(batch)?;
        self.writer.lock().append(&data, self.sync_on_commit)
    }
}

/// Computes the IEEE CRC32 of `data`.
pub(crate) fn compute_crc32(data: &[u8]) -> u32 {
    const CRC32_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    !crc
}
