//! Binary record store for exported prediction records.
//!
//! Records are length-prefixed frames: a little-endian u64 payload length
//! followed by a JSON-serialized `PredictionRecord`. The store is read
//! twice per run: one dedicated pass purely for the record count, then the
//! streaming pass the renderer consumes. Each pass opens the file fresh so
//! the two never interfere.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::record::PredictionRecord;

/// Handle to a record file on disk. Opening is deferred to the read passes.
#[derive(Debug, Clone)]
pub struct RecordFile {
    path: PathBuf,
}

impl RecordFile {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Count frames with a dedicated scan. Payloads are skipped, not parsed.
    pub fn count(&self) -> Result<usize> {
        let file = File::open(&self.path)
            .with_context(|| format!("opening record file {}", self.path.display()))?;
        let mut reader = BufReader::new(file);
        let mut offset = 0u64;
        let mut count = 0usize;
        loop {
            let len = match reader.read_u64::<LittleEndian>() {
                Ok(len) => len,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("reading frame length at byte {offset}"))
                }
            };
            offset += 8;
            let skipped = io::copy(&mut reader.by_ref().take(len), &mut io::sink())
                .with_context(|| format!("skipping frame payload at byte {offset}"))?;
            anyhow::ensure!(
                skipped == len,
                "record payload truncated at byte {} in {}",
                offset + skipped,
                self.path.display()
            );
            offset += len;
            count += 1;
        }
        Ok(count)
    }

    /// Start the streaming pass. Single-pass and non-restartable; call
    /// again for a fresh stream from the start of the file.
    pub fn stream(&self) -> Result<RecordStream> {
        let file = File::open(&self.path)
            .with_context(|| format!("opening record file {}", self.path.display()))?;
        Ok(RecordStream {
            reader: BufReader::new(file),
            offset: 0,
            path: self.path.clone(),
        })
    }
}

/// Lazy iterator over the frames of a `RecordFile`.
pub struct RecordStream {
    reader: BufReader<File>,
    offset: u64,
    path: PathBuf,
}

impl RecordStream {
    fn read_next(&mut self) -> Result<Option<PredictionRecord>> {
        let len = match self.reader.read_u64::<LittleEndian>() {
            Ok(len) => len,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("reading frame length at byte {}", self.offset))
            }
        };
        self.offset += 8;
        let mut payload = vec![0u8; len as usize];
        self.reader.read_exact(&mut payload).with_context(|| {
            format!(
                "record payload truncated at byte {} in {}",
                self.offset,
                self.path.display()
            )
        })?;
        self.offset += len;
        let record = serde_json::from_slice(&payload).with_context(|| {
            format!(
                "malformed record ending at byte {} in {}",
                self.offset,
                self.path.display()
            )
        })?;
        Ok(Some(record))
    }
}

impl Iterator for RecordStream {
    type Item = Result<PredictionRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}

/// Frame writer, used by the training-side export and by tests.
pub struct RecordWriter<W: Write> {
    out: W,
}

impl RecordWriter<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("creating record file {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> RecordWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write(&mut self, record: &PredictionRecord) -> Result<()> {
        let payload = serde_json::to_vec(record).context("serializing record")?;
        self.out.write_u64::<LittleEndian>(payload.len() as u64)?;
        self.out.write_all(&payload)?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
