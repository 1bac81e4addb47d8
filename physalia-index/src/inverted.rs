//! Bit-transposed (inverted) fingerprint archives.
//!
//! The matrix stores one row per fingerprint bit: row i, bit m is bit i of
//! fingerprint m. A substructure screen — "which stored fingerprints contain
//! every bit of the query?" — then reduces to ANDing the rows of the query's
//! set bits. [`InvertedFile`] reads rows from disk per query;
//! [`InvertedFileCached`] memory-maps the whole matrix and is freely
//! shareable across threads.

use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use physalia_chem::Fingerprint;
use physalia_core::bitvec::{self, Word, BITS_PER_WORD};
use physalia_core::mmap::MappedFile;
use physalia_core::{PhysaliaError, Result};

/// File magic for inverted fingerprint archives.
pub const MAGIC: u32 = 0x4865_0001;

/// Encoded header length in bytes.
pub const HEADER_LEN: usize = 24;

/// The 24-byte archive header: magic plus five u32 fields, little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvertedHeader {
    pub bits_per_word: u32,
    pub bits_per_fingerprint: u32,
    pub words_per_fingerprint: u32,
    pub words_per_fpbit: u32,
    pub num_fingerprints: u32,
}

impl InvertedHeader {
    /// Header for an archive of `num_fingerprints` fingerprints of
    /// `bits_per_fingerprint` bits.
    ///
    /// `words_per_fpbit` is the true ceiling of `num_fingerprints / 64`;
    /// each row carries that many words with padding bits zero.
    pub fn new(bits_per_fingerprint: u32, num_fingerprints: u32) -> Self {
        InvertedHeader {
            bits_per_word: BITS_PER_WORD as u32,
            bits_per_fingerprint,
            words_per_fingerprint: bits_per_fingerprint / BITS_PER_WORD as u32,
            words_per_fpbit: num_fingerprints.div_ceil(BITS_PER_WORD as u32),
            num_fingerprints,
        }
    }

    /// Encode as 24 little-endian bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        let fields = [
            MAGIC,
            self.bits_per_word,
            self.bits_per_fingerprint,
            self.words_per_fingerprint,
            self.words_per_fpbit,
            self.num_fingerprints,
        ];
        for (i, field) in fields.iter().enumerate() {
            bytes[i * 4..i * 4 + 4].copy_from_slice(&field.to_le_bytes());
        }
        bytes
    }

    /// Decode and validate 24 header bytes.
    ///
    /// # Errors
    ///
    /// `Header` if the magic does not match.
    pub fn from_bytes(bytes: &[u8; HEADER_LEN]) -> Result<Self> {
        let field = |i: usize| u32::from_le_bytes(bytes[i * 4..i * 4 + 4].try_into().unwrap());
        if field(0) != MAGIC {
            return Err(PhysaliaError::Header(format!(
                "bad magic 0x{:08x}, not an inverted fingerprint archive",
                field(0)
            )));
        }
        Ok(InvertedHeader {
            bits_per_word: field(1),
            bits_per_fingerprint: field(2),
            words_per_fingerprint: field(3),
            words_per_fpbit: field(4),
            num_fingerprints: field(5),
        })
    }

    /// Total words in the bit matrix.
    pub fn matrix_words(&self) -> usize {
        self.bits_per_fingerprint as usize * self.words_per_fpbit as usize
    }

    /// Absolute file offset of the row for fingerprint bit `bit`.
    ///
    /// 64-bit arithmetic throughout; the product can exceed u32 range for
    /// large archives.
    fn row_offset(&self, bit: usize) -> u64 {
        HEADER_LEN as u64 + bit as u64 * self.words_per_fpbit as u64 * 8
    }
}

/// Writer for inverted archives.
///
/// Holds the whole transposed matrix in memory; fingerprints must arrive in
/// index order, and exactly `num_fingerprints` of them must be written before
/// [`finish`](Self::finish).
pub struct InvertedWriter {
    writer: BufWriter<File>,
    header: InvertedHeader,
    matrix: Vec<Word>,
    current: u32,
}

impl InvertedWriter {
    /// Create an inverted archive; the header is written immediately, the
    /// matrix on `finish`.
    pub fn create(
        path: impl AsRef<Path>,
        bits_per_fingerprint: usize,
        num_fingerprints: usize,
    ) -> Result<Self> {
        if bits_per_fingerprint == 0 || bits_per_fingerprint % BITS_PER_WORD != 0 {
            return Err(PhysaliaError::InvalidInput(format!(
                "fingerprint width {bits_per_fingerprint} is not a positive multiple of {BITS_PER_WORD}"
            )));
        }
        if num_fingerprints > u32::MAX as usize {
            return Err(PhysaliaError::InvalidInput(format!(
                "{num_fingerprints} fingerprints exceed the archive's u32 capacity"
            )));
        }

        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            PhysaliaError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;

        let header = InvertedHeader::new(bits_per_fingerprint as u32, num_fingerprints as u32);
        let mut writer = BufWriter::new(file);
        writer.write_all(&header.to_bytes())?;

        Ok(InvertedWriter {
            writer,
            matrix: vec![0; header.matrix_words()],
            header,
            current: 0,
        })
    }

    /// Scatter fingerprint `m` (the next index) into the matrix.
    ///
    /// # Errors
    ///
    /// `InvalidInput` on width mismatch or when more fingerprints arrive
    /// than the archive was created for.
    pub fn write(&mut self, fp: &Fingerprint) -> Result<()> {
        if self.current >= self.header.num_fingerprints {
            return Err(PhysaliaError::InvalidInput(format!(
                "archive holds {} fingerprints, cannot write more",
                self.header.num_fingerprints
            )));
        }
        if fp.nbits() != self.header.bits_per_fingerprint as usize {
            return Err(PhysaliaError::InvalidInput(format!(
                "fingerprint has {} bits, archive expects {}",
                fp.nbits(),
                self.header.bits_per_fingerprint
            )));
        }

        let wpf = self.header.words_per_fpbit as usize;
        let m = self.current as usize;
        for i in 0..self.header.bits_per_fingerprint as usize {
            if fp.get_bit(i) {
                bitvec::set_bit(m, &mut self.matrix[i * wpf..(i + 1) * wpf]);
            }
        }
        self.current += 1;
        Ok(())
    }

    /// Write the matrix and flush.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if fewer fingerprints were written than declared: a
    /// partially filled matrix would silently read as all-zero columns.
    pub fn finish(mut self) -> Result<InvertedHeader> {
        if self.current != self.header.num_fingerprints {
            return Err(PhysaliaError::InvalidInput(format!(
                "archive declared {} fingerprints but only {} were written",
                self.header.num_fingerprints, self.current
            )));
        }
        for word in &self.matrix {
            self.writer.write_all(&word.to_le_bytes())?;
        }
        self.writer.flush()?;
        Ok(self.header)
    }
}

/// Random-access reader: rows stay on disk and are fetched per query.
///
/// Holds its own descriptor and seeks during `search`, so each thread opens
/// its own reader.
pub struct InvertedFile {
    file: File,
    header: InvertedHeader,
    row: Vec<Word>,
}

impl InvertedFile {
    /// Open an archive, validating the header eagerly.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| {
            PhysaliaError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;

        let mut bytes = [0u8; HEADER_LEN];
        file.read_exact(&mut bytes).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                PhysaliaError::Header("truncated inverted archive header".into())
            } else {
                PhysaliaError::Io(e)
            }
        })?;
        let header = InvertedHeader::from_bytes(&bytes)?;

        Ok(InvertedFile {
            file,
            row: vec![0; header.words_per_fpbit as usize],
            header,
        })
    }

    /// The validated header.
    pub fn header(&self) -> &InvertedHeader {
        &self.header
    }

    /// Number of fingerprints in the archive.
    pub fn num_fingerprints(&self) -> usize {
        self.header.num_fingerprints as usize
    }

    /// A zeroed result bitmap of the right width.
    pub fn allocate_result(&self) -> Vec<Word> {
        vec![0; self.header.words_per_fpbit as usize]
    }

    /// Substructure screen: after return, bit m of `result` is set iff every
    /// bit of `query` is set in stored fingerprint m.
    ///
    /// An empty query selects nothing: the result is all zeros.
    pub fn search(&mut self, query: &Fingerprint, result: &mut [Word]) -> Result<()> {
        check_query(&self.header, query, result)?;
        bitvec::zero(result);

        let mut first = true;
        for i in 0..self.header.bits_per_fingerprint as usize {
            if !query.get_bit(i) {
                continue;
            }
            self.read_row(i)?;
            if first {
                result.copy_from_slice(&self.row);
                first = false;
            } else {
                for (r, w) in result.iter_mut().zip(self.row.iter()) {
                    *r &= w;
                }
            }
        }
        Ok(())
    }

    fn read_row(&mut self, bit: usize) -> Result<()> {
        self.file.seek(SeekFrom::Start(self.header.row_offset(bit)))?;
        let mut buf = [0u8; 8];
        for word in self.row.iter_mut() {
            self.file.read_exact(&mut buf)?;
            *word = Word::from_le_bytes(buf);
        }
        Ok(())
    }
}

/// Cached reader: the whole archive is memory-mapped at open and queries are
/// served from the mapping.
///
/// `search` takes `&self`; the mapping is immutable after construction, so a
/// single instance can be shared across threads.
pub struct InvertedFileCached {
    map: MappedFile,
    header: InvertedHeader,
}

impl InvertedFileCached {
    /// Map an archive, validating the header and the matrix length eagerly.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let map = MappedFile::open(path)?;
        if map.len() < HEADER_LEN {
            return Err(PhysaliaError::Header(
                "truncated inverted archive header".into(),
            ));
        }
        let bytes: [u8; HEADER_LEN] = map.as_bytes()[..HEADER_LEN].try_into().unwrap();
        let header = InvertedHeader::from_bytes(&bytes)?;

        if map.len() < HEADER_LEN + header.matrix_words() * 8 {
            return Err(PhysaliaError::Header(
                "inverted archive matrix is truncated".into(),
            ));
        }
        Ok(InvertedFileCached { map, header })
    }

    /// The validated header.
    pub fn header(&self) -> &InvertedHeader {
        &self.header
    }

    /// Number of fingerprints in the archive.
    pub fn num_fingerprints(&self) -> usize {
        self.header.num_fingerprints as usize
    }

    /// A zeroed result bitmap of the right width.
    pub fn allocate_result(&self) -> Vec<Word> {
        vec![0; self.header.words_per_fpbit as usize]
    }

    /// Substructure screen; same contract as [`InvertedFile::search`], served
    /// with pointer arithmetic instead of seeks.
    pub fn search(&self, query: &Fingerprint, result: &mut [Word]) -> Result<()> {
        check_query(&self.header, query, result)?;
        bitvec::zero(result);

        let wpf = self.header.words_per_fpbit as usize;
        let mut first = true;
        for i in 0..self.header.bits_per_fingerprint as usize {
            if !query.get_bit(i) {
                continue;
            }
            let start = self.header.row_offset(i) as usize;
            let row = &self.map.as_bytes()[start..start + wpf * 8];
            for (j, r) in result.iter_mut().enumerate() {
                let word = Word::from_le_bytes(row[j * 8..j * 8 + 8].try_into().unwrap());
                if first {
                    *r = word;
                } else {
                    *r &= word;
                }
            }
            first = false;
        }
        Ok(())
    }
}

fn check_query(header: &InvertedHeader, query: &Fingerprint, result: &[Word]) -> Result<()> {
    if query.nbits() != header.bits_per_fingerprint as usize {
        return Err(PhysaliaError::InvalidInput(format!(
            "query has {} bits, archive expects {}",
            query.nbits(),
            header.bits_per_fingerprint
        )));
    }
    if result.len() != header.words_per_fpbit as usize {
        return Err(PhysaliaError::InvalidInput(format!(
            "result buffer has {} words, archive needs {}",
            result.len(),
            header.words_per_fpbit
        )));
    }
    Ok(())
}
