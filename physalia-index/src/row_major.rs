//! Row-major fingerprint archives.
//!
//! Layout: N fingerprints of W little-endian words each, back to back,
//! followed by a UTF-8 JSON trailer with no length prefix. The trailer makes
//! the archive self-describing: the reader finds it by scanning the file tail
//! for a JSON document whose `num_fingerprints` and `num_bits` place its own
//! start exactly at the end of the fingerprint region.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use physalia_chem::Fingerprint;
use physalia_core::bitvec::{Word, BITS_PER_WORD};
use physalia_core::{PhysaliaError, Result};

/// Largest trailer the reader will look for, in bytes.
const MAX_TRAILER_LEN: u64 = 64 * 1024;

/// How the fingerprints in an archive were generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub k: usize,
    pub prime: usize,
}

/// Bit-count statistics over an archive's fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitCountStats {
    pub average_count: u32,
    pub min_count: u32,
    pub max_count: u32,
}

impl BitCountStats {
    /// Integer mean / min / max; all zero for an empty archive.
    pub fn from_counts(counts: &[u32]) -> Self {
        if counts.is_empty() {
            return BitCountStats {
                average_count: 0,
                min_count: 0,
                max_count: 0,
            };
        }
        let sum: u64 = counts.iter().map(|&c| c as u64).sum();
        BitCountStats {
            average_count: (sum / counts.len() as u64) as u32,
            min_count: *counts.iter().min().unwrap(),
            max_count: *counts.iter().max().unwrap(),
        }
    }
}

/// The archive's JSON trailer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveInfo {
    pub filetype: String,
    pub order: String,
    pub num_bits: usize,
    pub num_fingerprints: usize,
    pub fingerprint: GeneratorInfo,
    pub statistics: BitCountStats,
}

/// Sequential archive writer.
///
/// Write fingerprints with [`write`](Self::write), then call
/// [`finish`](Self::finish) to append the trailer; `finish` consumes the
/// writer, so writing after close is a compile error rather than a runtime
/// one.
pub struct RowMajorWriter {
    writer: BufWriter<File>,
    nbits: usize,
    count: usize,
}

impl RowMajorWriter {
    /// Create (or truncate) an archive for fingerprints of width `nbits`.
    pub fn create(path: impl AsRef<Path>, nbits: usize) -> Result<Self> {
        if nbits == 0 || nbits % BITS_PER_WORD != 0 {
            return Err(PhysaliaError::InvalidInput(format!(
                "fingerprint width {nbits} is not a positive multiple of {BITS_PER_WORD}"
            )));
        }
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            PhysaliaError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;
        Ok(RowMajorWriter {
            writer: BufWriter::new(file),
            nbits,
            count: 0,
        })
    }

    /// Append one fingerprint.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the fingerprint width differs from the archive's.
    pub fn write(&mut self, fp: &Fingerprint) -> Result<()> {
        if fp.nbits() != self.nbits {
            return Err(PhysaliaError::InvalidInput(format!(
                "fingerprint has {} bits, archive expects {}",
                fp.nbits(),
                self.nbits
            )));
        }
        for word in fp.words() {
            self.writer.write_all(&word.to_le_bytes())?;
        }
        self.count += 1;
        Ok(())
    }

    /// Number of fingerprints written so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Append the JSON trailer and flush. Returns the trailer that was
    /// written.
    pub fn finish(
        mut self,
        generator: GeneratorInfo,
        statistics: BitCountStats,
    ) -> Result<ArchiveInfo> {
        let info = ArchiveInfo {
            filetype: "fingerprints".into(),
            order: "row-major".into(),
            num_bits: self.nbits,
            num_fingerprints: self.count,
            fingerprint: generator,
            statistics,
        };
        let json = serde_json::to_string_pretty(&info)
            .map_err(|e| PhysaliaError::Parse(e.to_string()))?;
        self.writer.write_all(json.as_bytes())?;
        self.writer.flush()?;
        Ok(info)
    }
}

/// Streaming archive reader.
///
/// The trailer is parsed eagerly at open; fingerprints are then yielded in
/// insertion order. There is no random access.
pub struct RowMajorReader {
    reader: BufReader<File>,
    info: ArchiveInfo,
    num_words: usize,
    current: usize,
}

impl RowMajorReader {
    /// Open an archive and parse its trailer.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| {
            PhysaliaError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;

        let file_len = file.metadata()?.len();
        let info = Self::locate_trailer(&mut file, file_len)?;
        let num_words = info.num_bits / BITS_PER_WORD;

        file.seek(SeekFrom::Start(0))?;
        Ok(RowMajorReader {
            reader: BufReader::new(file),
            info,
            num_words,
            current: 0,
        })
    }

    /// Find and validate the trailer in the file tail.
    ///
    /// Fingerprint words can contain `{` bytes, so every candidate position
    /// is checked two ways: the suffix must parse as the trailer, and the
    /// parsed counts must place the trailer exactly after
    /// `num_fingerprints · W · 8` bytes of fingerprint data.
    fn locate_trailer(file: &mut File, file_len: u64) -> Result<ArchiveInfo> {
        let tail_len = file_len.min(MAX_TRAILER_LEN);
        file.seek(SeekFrom::End(-(tail_len as i64)))?;
        let mut tail = vec![0u8; tail_len as usize];
        file.read_exact(&mut tail)?;

        let tail_start = file_len - tail_len;
        for (pos, &byte) in tail.iter().enumerate() {
            if byte != b'{' {
                continue;
            }
            let Ok(info) = serde_json::from_slice::<ArchiveInfo>(&tail[pos..]) else {
                continue;
            };
            if info.num_bits == 0 || info.num_bits % BITS_PER_WORD != 0 {
                continue;
            }
            let region = info.num_fingerprints as u64
                * (info.num_bits / BITS_PER_WORD) as u64
                * 8;
            if tail_start + pos as u64 == region {
                return Ok(info);
            }
        }

        Err(PhysaliaError::Parse(
            "row-major archive trailer is missing or corrupt".into(),
        ))
    }

    /// The parsed trailer.
    pub fn info(&self) -> &ArchiveInfo {
        &self.info
    }

    /// Number of fingerprints in the archive.
    pub fn num_fingerprints(&self) -> usize {
        self.info.num_fingerprints
    }

    /// Number of fingerprints read so far.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Read the next fingerprint, or `None` past the end of the region.
    ///
    /// A truncated fingerprint region surfaces as an `Io` error.
    pub fn next_fingerprint(&mut self) -> Result<Option<Fingerprint>> {
        if self.current == self.info.num_fingerprints {
            return Ok(None);
        }
        let mut words: Vec<Word> = vec![0; self.num_words];
        let mut buf = [0u8; 8];
        for word in words.iter_mut() {
            self.reader.read_exact(&mut buf)?;
            *word = Word::from_le_bytes(buf);
        }
        self.current += 1;
        Ok(Some(Fingerprint::from_words(words, self.info.num_bits)))
    }
}

impl Iterator for RowMajorReader {
    type Item = Result<Fingerprint>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_fingerprint().transpose()
    }
}
