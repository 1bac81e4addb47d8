//! The indexing driver: molecules in, archives out.
//!
//! [`run`] fingerprints a stream of molecules into a row-major archive;
//! [`invert_archive`] transposes an existing row-major archive into the
//! inverted layout. Molecule file parsing and command-line handling are the
//! caller's business — the molecule iterator is the interface.

use std::path::Path;

use physalia_chem::{Fingerprint, Method, MolGraph};
use physalia_core::bitvec::BITS_PER_WORD;
use physalia_core::prime::previous_prime;
use physalia_core::{PhysaliaError, Result};

use crate::inverted::{InvertedHeader, InvertedWriter};
use crate::row_major::{ArchiveInfo, BitCountStats, GeneratorInfo, RowMajorReader, RowMajorWriter};

/// Fingerprint every molecule into a row-major archive at `out_path`.
///
/// `bits` must be a positive multiple of the word size and `k ≥ 1`; the hash
/// prime is the largest prime ≤ `bits`. Fingerprints are written in input
/// order (the archive's index-to-molecule identity depends on it), and the
/// trailer records the generator parameters plus bit-count statistics.
/// Returns the trailer that was written.
pub fn run<M, I>(
    method: Method,
    molecules: I,
    out_path: impl AsRef<Path>,
    k: usize,
    bits: usize,
) -> Result<ArchiveInfo>
where
    M: MolGraph,
    I: IntoIterator<Item = M>,
{
    if bits == 0 || bits % BITS_PER_WORD != 0 {
        return Err(PhysaliaError::InvalidInput(format!(
            "fingerprint width {bits} is not a positive multiple of {BITS_PER_WORD}"
        )));
    }
    if k < 1 {
        return Err(PhysaliaError::InvalidInput(
            "substructure size k must be at least 1".into(),
        ));
    }
    let prime = previous_prime(bits as u64)? as usize;

    let mut writer = RowMajorWriter::create(out_path, bits)?;
    let mut bit_counts: Vec<u32> = Vec::new();

    for mol in molecules {
        let fp = method.fingerprint(&mol, k, bits, prime)?;
        bit_counts.push(fp.count_ones());
        writer.write(&fp)?;
    }

    let generator = GeneratorInfo {
        name: format!("physalia::{method}_fingerprint (k = {k}, bits = {bits})"),
        kind: format!("physalia::{method}_fingerprint"),
        k,
        prime,
    };
    writer.finish(generator, BitCountStats::from_counts(&bit_counts))
}

/// Transpose a row-major archive into an inverted archive.
///
/// The row-major trailer supplies the fingerprint count and width, so a
/// single streaming pass suffices.
pub fn invert_archive(
    row_major_path: impl AsRef<Path>,
    inverted_path: impl AsRef<Path>,
) -> Result<InvertedHeader> {
    let mut reader = RowMajorReader::open(row_major_path)?;
    let mut writer = InvertedWriter::create(
        inverted_path,
        reader.info().num_bits,
        reader.num_fingerprints(),
    )?;

    while let Some(fp) = reader.next_fingerprint()? {
        writer.write(&fp)?;
    }
    writer.finish()
}

/// Convenience: the linear-scan reference screen over a row-major archive.
///
/// Streams the archive and reports each fingerprint containing every bit of
/// `query`. This is the ground truth the inverted archive's `search`
/// accelerates.
pub fn linear_screen(
    row_major_path: impl AsRef<Path>,
    query: &Fingerprint,
) -> Result<Vec<usize>> {
    let reader = RowMajorReader::open(row_major_path)?;
    let mut hits = Vec::new();
    for (m, fp) in reader.enumerate() {
        if fp?.contains(query) {
            hits.push(m);
        }
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inverted::InvertedFileCached;
    use physalia_chem::{Bond, BondOrder, MolAtom, Molecule};
    use physalia_core::bitvec;

    /// Deterministic molecule generator: chains and rings of varying length
    /// with a sprinkle of double bonds and heteroatoms.
    fn generated_molecules(n: usize) -> Vec<Molecule> {
        let mut state: u64 = 0x853c49e6748fea9b;
        let mut next = move || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 33) as usize
        };

        (0..n)
            .map(|i| {
                let size = 2 + next() % 7;
                let cyclic = size >= 3 && next() % 3 == 0;
                let atoms: Vec<MolAtom> = (0..size)
                    .map(|_| match next() % 5 {
                        0 => MolAtom::new(8),
                        1 => MolAtom::new(7),
                        _ => MolAtom::carbon(2),
                    })
                    .collect();
                let mut bonds: Vec<Bond> = (1..size)
                    .map(|j| {
                        if next() % 4 == 0 {
                            Bond::new(j - 1, j, BondOrder::Double)
                        } else {
                            Bond::single(j - 1, j)
                        }
                    })
                    .collect();
                if cyclic {
                    bonds.push(Bond::single(size - 1, 0));
                }
                Molecule::new(format!("mol{i}"), atoms, bonds)
            })
            .collect()
    }

    #[test]
    fn run_writes_consistent_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fps.bin");
        let mols = generated_molecules(40);

        let info = run(Method::Paths, mols.clone(), &path, 4, 256).unwrap();
        assert_eq!(info.num_fingerprints, 40);
        assert_eq!(info.num_bits, 256);
        assert_eq!(info.fingerprint.prime, 251);
        assert!(info.statistics.max_count >= info.statistics.min_count);

        let reader = RowMajorReader::open(&path).unwrap();
        let restored: Result<Vec<_>> = reader.collect();
        let restored = restored.unwrap();
        for (mol, fp) in mols.iter().zip(&restored) {
            assert_eq!(
                fp,
                &Method::Paths.fingerprint(mol, 4, 256, 251).unwrap(),
                "archive order must match input order"
            );
        }
    }

    #[test]
    fn run_rejects_bad_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fps.bin");
        let mols = generated_molecules(2);
        assert!(run(Method::Paths, mols.clone(), &path, 4, 100).is_err());
        assert!(run(Method::Paths, mols, &path, 0, 256).is_err());
    }

    #[test]
    fn inverted_screen_agrees_with_linear_scan() {
        let dir = tempfile::tempdir().unwrap();
        let row_path = dir.path().join("fps.bin");
        let inv_path = dir.path().join("fps.inv");
        let mols = generated_molecules(1000);

        run(Method::Paths, mols.clone(), &row_path, 4, 256).unwrap();
        let header = invert_archive(&row_path, &inv_path).unwrap();
        assert_eq!(header.num_fingerprints, 1000);
        assert_eq!(header.words_per_fpbit, 16); // ceil(1000 / 64)

        let cached = InvertedFileCached::open(&inv_path).unwrap();
        let query = Method::Paths.fingerprint(&mols[42], 4, 256, 251).unwrap();

        let mut result = cached.allocate_result();
        cached.search(&query, &mut result).unwrap();
        assert!(bitvec::get_bit(42, &result), "molecule 42 must match itself");

        let hits = linear_screen(&row_path, &query).unwrap();
        for m in 0..1000 {
            assert_eq!(
                bitvec::get_bit(m, &result),
                hits.contains(&m),
                "screen disagreement at molecule {m}"
            );
        }
    }

    #[test]
    fn empty_input_yields_empty_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fps.bin");
        let info = run(Method::Trees, Vec::<Molecule>::new(), &path, 4, 128).unwrap();
        assert_eq!(info.num_fingerprints, 0);
        assert_eq!(info.statistics.average_count, 0);
    }
}
