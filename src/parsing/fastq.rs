//! Chunked FASTQ reading and writing.
//!
//! A sequencing run holds hundreds of millions of reads, so records are
//! pulled in bounded chunks and matched batch by batch rather than loaded
//! whole. Gzip is detected by the `.gz` suffix on both ends.

use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use seq_io::fastq::Record as _;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FastqError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid FASTQ record: {0}")]
    InvalidRecord(String),

    #[error("input FASTQ files yielded unequal record counts: {counts:?}")]
    UnequalRecords { counts: Vec<usize> },
}

/// One FASTQ record, name without the leading `@`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastqRecord {
    pub name: Vec<u8>,
    pub sequence: Vec<u8>,
    pub quality: Vec<u8>,
}

impl FastqRecord {
    /// Copy of this record with `label` appended to the read name.
    #[must_use]
    pub fn annotated(&self, label: &str, delimiter: char) -> Self {
        let mut name = self.name.clone();
        let mut buf = [0u8; 4];
        name.extend_from_slice(delimiter.encode_utf8(&mut buf).as_bytes());
        name.extend_from_slice(label.as_bytes());
        Self {
            name,
            sequence: self.sequence.clone(),
            quality: self.quality.clone(),
        }
    }
}

/// Check if the path names a gzip file
fn is_gzipped(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// Reads FASTQ records in bounded chunks from a plain or gzip file.
pub struct FastqChunkReader {
    inner: seq_io::fastq::Reader<Box<dyn Read>>,
}

impl FastqChunkReader {
    /// Open a FASTQ file, transparently decompressing `.gz`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self, FastqError> {
        let file = File::open(path)?;
        let read: Box<dyn Read> = if is_gzipped(path) {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(Self {
            inner: seq_io::fastq::Reader::new(read),
        })
    }

    /// Read up to `max_records` records. Returns fewer only at end of input;
    /// an empty vec means the file is exhausted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecord` on malformed input, `Io` otherwise.
    pub fn read_chunk(&mut self, max_records: usize) -> Result<Vec<FastqRecord>, FastqError> {
        let mut records = Vec::with_capacity(max_records);

        while records.len() < max_records {
            let Some(result) = self.inner.next() else {
                break;
            };
            let record = result.map_err(|e| match e {
                seq_io::fastq::Error::Io(e) => FastqError::Io(e),
                other => FastqError::InvalidRecord(other.to_string()),
            })?;
            records.push(FastqRecord {
                name: record.head().to_vec(),
                sequence: record.seq().to_vec(),
                quality: record.qual().to_vec(),
            });
        }

        Ok(records)
    }
}

/// Reads several FASTQ files in lockstep.
///
/// Paired sequencing output ships as parallel files (R1/R2/I1/I2) whose
/// records correspond line for line. A chunk pulled here holds the same
/// record count from every file, so column *i* of every per-file chunk is
/// the same fragment.
pub struct FastqSet {
    readers: Vec<FastqChunkReader>,
}

impl FastqSet {
    #[must_use]
    pub fn new(readers: Vec<FastqChunkReader>) -> Self {
        Self { readers }
    }

    /// Open one reader per path, transparently decompressing `.gz`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if any file cannot be opened.
    pub fn open<P: AsRef<Path>>(paths: &[P]) -> Result<Self, FastqError> {
        let readers = paths
            .iter()
            .map(|path| FastqChunkReader::open(path.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(Self { readers })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.readers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    /// Read up to `max_records` records from every file. Chunks come back in
    /// the order the readers were opened; all empty means every file is
    /// exhausted.
    ///
    /// # Errors
    ///
    /// Returns `UnequalRecords` when the files disagree on record count
    /// (truncated or mismatched inputs), otherwise any per-file error.
    pub fn read_chunk(&mut self, max_records: usize) -> Result<Vec<Vec<FastqRecord>>, FastqError> {
        let chunks = self
            .readers
            .iter_mut()
            .map(|reader| reader.read_chunk(max_records))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(first) = chunks.first() {
            if chunks.iter().any(|chunk| chunk.len() != first.len()) {
                return Err(FastqError::UnequalRecords {
                    counts: chunks.iter().map(Vec::len).collect(),
                });
            }
        }

        Ok(chunks)
    }
}

/// Writes FASTQ records to a plain or gzip file.
pub struct FastqWriter {
    inner: Box<dyn Write>,
}

impl FastqWriter {
    /// Create an output FASTQ file, gzip-compressed when the path ends in
    /// `.gz`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be created.
    pub fn create(path: &Path) -> Result<Self, FastqError> {
        let file = File::create(path)?;
        let inner: Box<dyn Write> = if is_gzipped(path) {
            Box::new(BufWriter::new(GzEncoder::new(file, Compression::default())))
        } else {
            Box::new(BufWriter::new(file))
        };
        Ok(Self { inner })
    }

    /// # Errors
    ///
    /// Returns `Io` on a failed write.
    pub fn write_record(&mut self, record: &FastqRecord) -> Result<(), FastqError> {
        self.inner.write_all(b"@")?;
        self.inner.write_all(&record.name)?;
        self.inner.write_all(b"\n")?;
        self.inner.write_all(&record.sequence)?;
        self.inner.write_all(b"\n+\n")?;
        self.inner.write_all(&record.quality)?;
        self.inner.write_all(b"\n")?;
        Ok(())
    }

    /// Flush buffered output. The gzip trailer is written when the writer
    /// drops.
    ///
    /// # Errors
    ///
    /// Returns `Io` on a failed flush.
    pub fn finish(mut self) -> Result<(), FastqError> {
        self.inner.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, seq: &str) -> FastqRecord {
        FastqRecord {
            name: name.as_bytes().to_vec(),
            sequence: seq.as_bytes().to_vec(),
            quality: vec![b'I'; seq.len()],
        }
    }

    #[test]
    fn test_round_trip_plain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reads.fastq");

        let mut writer = FastqWriter::create(&path).unwrap();
        writer.write_record(&record("read1", "ACGT")).unwrap();
        writer.write_record(&record("read2", "TTTT")).unwrap();
        writer.finish().unwrap();

        let mut reader = FastqChunkReader::open(&path).unwrap();
        let records = reader.read_chunk(10).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, b"read1");
        assert_eq!(records[0].sequence, b"ACGT");
        assert_eq!(records[1].sequence, b"TTTT");
        assert!(reader.read_chunk(10).unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reads.fastq.gz");

        {
            let mut writer = FastqWriter::create(&path).unwrap();
            writer.write_record(&record("read1", "GATTACA")).unwrap();
            writer.finish().unwrap();
        }

        let mut reader = FastqChunkReader::open(&path).unwrap();
        let records = reader.read_chunk(10).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sequence, b"GATTACA");
    }

    #[test]
    fn test_chunk_boundaries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reads.fastq");

        let mut writer = FastqWriter::create(&path).unwrap();
        for i in 0..5 {
            writer.write_record(&record(&format!("read{i}"), "ACGT")).unwrap();
        }
        writer.finish().unwrap();

        let mut reader = FastqChunkReader::open(&path).unwrap();
        assert_eq!(reader.read_chunk(2).unwrap().len(), 2);
        assert_eq!(reader.read_chunk(2).unwrap().len(), 2);
        assert_eq!(reader.read_chunk(2).unwrap().len(), 1);
        assert!(reader.read_chunk(2).unwrap().is_empty());
    }

    #[test]
    fn test_truncated_record_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reads.fastq");
        std::fs::write(&path, "@read1\nACGT\n+\n").unwrap();

        let mut reader = FastqChunkReader::open(&path).unwrap();
        assert!(matches!(
            reader.read_chunk(10),
            Err(FastqError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_synchronized_reading() {
        let dir = tempfile::tempdir().unwrap();
        let r1 = dir.path().join("r1.fastq");
        let i1 = dir.path().join("i1.fastq.gz");

        let mut writer = FastqWriter::create(&r1).unwrap();
        for i in 0..3 {
            writer.write_record(&record(&format!("read{i}"), "ACGTACGT")).unwrap();
        }
        writer.finish().unwrap();

        let mut writer = FastqWriter::create(&i1).unwrap();
        for i in 0..3 {
            writer.write_record(&record(&format!("read{i}"), "TTTT")).unwrap();
        }
        writer.finish().unwrap();

        let mut set = FastqSet::open(&[&r1, &i1]).unwrap();
        assert_eq!(set.len(), 2);

        let chunks = set.read_chunk(2).unwrap();
        assert_eq!(chunks[0].len(), 2);
        assert_eq!(chunks[1].len(), 2);
        assert_eq!(chunks[0][1].name, chunks[1][1].name);
        assert_eq!(chunks[0][0].sequence, b"ACGTACGT");
        assert_eq!(chunks[1][0].sequence, b"TTTT");

        let chunks = set.read_chunk(2).unwrap();
        assert_eq!(chunks[0].len(), 1);
        assert!(set.read_chunk(2).unwrap().iter().all(Vec::is_empty));
    }

    #[test]
    fn test_unequal_record_counts_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let r1 = dir.path().join("r1.fastq");
        let i1 = dir.path().join("i1.fastq");

        let mut writer = FastqWriter::create(&r1).unwrap();
        writer.write_record(&record("read0", "ACGT")).unwrap();
        writer.write_record(&record("read1", "ACGT")).unwrap();
        writer.finish().unwrap();

        let mut writer = FastqWriter::create(&i1).unwrap();
        writer.write_record(&record("read0", "TTTT")).unwrap();
        writer.finish().unwrap();

        let mut set = FastqSet::open(&[&r1, &i1]).unwrap();
        assert!(matches!(
            set.read_chunk(10),
            Err(FastqError::UnequalRecords { .. })
        ));
    }

    #[test]
    fn test_annotated_name() {
        let annotated = record("read1", "ACGT").annotated("sample_7", ':');
        assert_eq!(annotated.name, b"read1:sample_7");
        assert_eq!(annotated.sequence, b"ACGT");
    }
}
