use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vl_types::{DigestAlgorithm, Hash, HASH_LEN};

use crate::error::{StoreError, StoreResult};
use crate::traits::HashStore;

const MAGIC: &[u8; 4] = b"VLHS";
const FORMAT_VERSION: u8 = 1;

/// Header: magic, version, algorithm id, hash width, reserved padding.
const HEADER_SIZE: u64 = 16;
/// Record: hash followed by a CRC32 of the hash.
const RECORD_SIZE: u64 = HASH_LEN as u64 + 4;

/// Flush/sync strategy for the hash file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every append (safest, highest latency).
    EveryWrite,
    /// Rely on OS page-cache buffering (fastest, least durable).
    OsDefault,
}

impl Default for SyncMode {
    fn default() -> Self {
        Self::EveryWrite
    }
}

struct FileState {
    file: File,
    /// Number of complete records.
    size: u64,
}

/// Append-only file of fixed-stride hash records.
///
/// On-disk format:
/// ```text
/// [16 bytes: header = "VLHS" | version | algorithm id | hash width | 9 reserved]
/// [36 bytes per record: 32-byte hash | CRC32 of hash (little-endian u32)]
/// ```
/// Records are addressed by index, so reads are a single seek. A trailing
/// partial record left by a crash is truncated on open.
///
/// The file is held under an exclusive advisory lock for the life of the
/// store; a second open of the same path fails with [`StoreError::Locked`].
pub struct FileHashStore {
    path: PathBuf,
    algorithm: DigestAlgorithm,
    sync_mode: SyncMode,
    state: Mutex<FileState>,
}

impl FileHashStore {
    /// Open (or create) a hash file for trees built with `algorithm`.
    pub fn open(path: &Path, algorithm: DigestAlgorithm, sync_mode: SyncMode) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;
        lock_exclusive(&file, path)?;

        let len = file.metadata()?.len();
        if len == 0 {
            file.write_all(&encode_header(algorithm))?;
            file.sync_all()?;
            debug!(path = %path.display(), %algorithm, "created hash store");
        } else {
            let found = read_header(&mut file, len)?;
            if found != algorithm {
                return Err(StoreError::AlgorithmMismatch {
                    expected: algorithm,
                    found,
                });
            }
        }

        let body = file.metadata()?.len() - HEADER_SIZE;
        let size = body / RECORD_SIZE;
        let torn = body % RECORD_SIZE;
        if torn != 0 {
            warn!(
                path = %path.display(),
                size,
                torn_bytes = torn,
                "truncating partial trailing record"
            );
            file.set_len(HEADER_SIZE + size * RECORD_SIZE)?;
            file.sync_all()?;
        }

        debug!(path = %path.display(), size, "hash store opened");
        Ok(Self {
            path: path.to_path_buf(),
            algorithm,
            sync_mode,
            state: Mutex::new(FileState { file, size }),
        })
    }

    /// Path to the hash file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn offset(index: u64) -> u64 {
        HEADER_SIZE + index * RECORD_SIZE
    }
}

impl HashStore for FileHashStore {
    fn append(&self, hash: &Hash) -> StoreResult<u64> {
        let mut record = [0u8; RECORD_SIZE as usize];
        record[..HASH_LEN].copy_from_slice(hash.as_bytes());
        record[HASH_LEN..].copy_from_slice(&crc32fast::hash(hash.as_bytes()).to_le_bytes());

        let mut state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        let index = state.size;

        let sync = self.sync_mode == SyncMode::EveryWrite;
        append_record(&mut state.file, Self::offset(index), &record, sync)?;
        state.size += 1;

        debug!(index, "hash appended");
        Ok(index)
    }

    fn read(&self, index: u64) -> StoreResult<Option<Hash>> {
        let mut state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        if index >= state.size {
            return Ok(None);
        }

        let mut record = [0u8; RECORD_SIZE as usize];
        state.file.seek(SeekFrom::Start(Self::offset(index)))?;
        state.file.read_exact(&mut record)?;
        decode_record(index, &record).map(Some)
    }

    fn size(&self) -> StoreResult<u64> {
        let state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(state.size)
    }

    fn algorithm(&self) -> Option<DigestAlgorithm> {
        Some(self.algorithm)
    }

    fn read_range(&self, lo: u64, hi: u64) -> StoreResult<Vec<Hash>> {
        let mut state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        let hi = hi.min(state.size);
        if lo >= hi {
            return Ok(vec![]);
        }

        let mut buf = vec![0u8; ((hi - lo) * RECORD_SIZE) as usize];
        state.file.seek(SeekFrom::Start(Self::offset(lo)))?;
        state.file.read_exact(&mut buf)?;
        buf.chunks_exact(RECORD_SIZE as usize)
            .zip(lo..hi)
            .map(|(record, index)| decode_record(index, record))
            .collect()
    }

    fn sync(&self) -> StoreResult<()> {
        let state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        state.file.sync_all()?;
        Ok(())
    }
}

fn lock_exclusive(file: &File, path: &Path) -> StoreResult<()> {
    fs2::FileExt::try_lock_exclusive(file).map_err(|err| {
        if err.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
            StoreError::Locked(path.display().to_string())
        } else {
            StoreError::Io(err)
        }
    })
}

/// Byte sink for hash records.
trait RecordFile {
    fn write_at(&mut self, offset: u64, data: &[u8]) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl RecordFile for File {
    fn write_at(&mut self, offset: u64, data: &[u8]) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.write_all(data)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Write `record` at `offset`, optionally syncing it.
///
/// On failure the file is cut back to `offset` so a record that was written
/// but never made durable is not picked up by a later reopen.
fn append_record<F: RecordFile>(
    file: &mut F,
    offset: u64,
    record: &[u8],
    sync: bool,
) -> io::Result<()> {
    let written = file
        .write_at(offset, record)
        .and_then(|()| if sync { file.sync() } else { Ok(()) });
    if let Err(err) = written {
        if let Err(undo) = file.truncate(offset) {
            warn!(offset, error = %undo, "could not roll back failed append");
        }
        return Err(err);
    }
    Ok(())
}

fn encode_header(algorithm: DigestAlgorithm) -> [u8; HEADER_SIZE as usize] {
    let mut header = [0u8; HEADER_SIZE as usize];
    header[..4].copy_from_slice(MAGIC);
    header[4] = FORMAT_VERSION;
    header[5] = algorithm.id();
    header[6] = HASH_LEN as u8;
    header
}

fn read_header(file: &mut File, len: u64) -> StoreResult<DigestAlgorithm> {
    if len < HEADER_SIZE {
        return Err(StoreError::Format(format!(
            "file is {len} bytes, shorter than the {HEADER_SIZE}-byte header"
        )));
    }
    let mut header = [0u8; HEADER_SIZE as usize];
    file.seek(SeekFrom::Start(0))?;
    file.read_exact(&mut header)?;

    if &header[..4] != MAGIC {
        return Err(StoreError::Format("bad magic".into()));
    }
    if header[4] != FORMAT_VERSION {
        return Err(StoreError::Format(format!(
            "unsupported format version {}",
            header[4]
        )));
    }
    if header[6] as usize != HASH_LEN {
        return Err(StoreError::Format(format!(
            "hash width {} does not match {HASH_LEN}",
            header[6]
        )));
    }
    DigestAlgorithm::from_id(header[5]).map_err(|e| StoreError::Format(e.to_string()))
}

fn decode_record(index: u64, record: &[u8]) -> StoreResult<Hash> {
    let (hash, crc) = record.split_at(HASH_LEN);
    let expected = u32::from_le_bytes([crc[0], crc[1], crc[2], crc[3]]);
    let actual = crc32fast::hash(hash);
    if actual != expected {
        warn!(index, expected, actual, "CRC mismatch in hash store");
        return Err(StoreError::Corrupt {
            index,
            reason: format!("CRC mismatch: expected {expected:#010x}, got {actual:#010x}"),
        });
    }
    Hash::from_slice(hash).map_err(|e| StoreError::Corrupt {
        index,
        reason: e.to_string(),
    })
}
