//! Hashed substructure fingerprints.
//!
//! A fingerprint is a fixed-width bitset: every enumerated substructure is
//! canonicalized, its code is hashed with the pinned FNV-1a-64 fold, and bit
//! `hash mod prime` is set. Using the largest prime ≤ the bit width avoids
//! clustering at power-of-two positions; bits at index ≥ prime stay zero.

use std::fmt;
use std::str::FromStr;

use physalia_core::bitvec::{self, Word};
use physalia_core::hash::{fnv1a_words, sha256};
use physalia_core::{ContentAddressable, PhysaliaError, Result};

use crate::canon::{canonical_path_code, canonicalize};
use crate::enumerate::{enumerate_paths, enumerate_subgraphs};
use crate::molecule::MolGraph;
use crate::morgan::extended_connectivities;
use crate::subgraph::SubgraphView;

/// A fixed-width bit vector fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    words: Vec<Word>,
    nbits: usize,
}

impl Fingerprint {
    /// Create an all-zero fingerprint of the given width.
    ///
    /// # Panics
    ///
    /// Panics if `nbits` is not a positive multiple of the word size.
    pub fn new(nbits: usize) -> Self {
        assert!(
            nbits > 0 && nbits % bitvec::BITS_PER_WORD == 0,
            "fingerprint width must be a positive multiple of {}",
            bitvec::BITS_PER_WORD
        );
        Fingerprint {
            words: vec![0; bitvec::words_for_bits(nbits)],
            nbits,
        }
    }

    /// Rebuild a fingerprint from raw words (archive readers).
    ///
    /// # Panics
    ///
    /// Panics if the word count does not match `nbits`.
    pub fn from_words(words: Vec<Word>, nbits: usize) -> Self {
        assert_eq!(words.len(), bitvec::words_for_bits(nbits), "word count mismatch");
        Fingerprint { words, nbits }
    }

    /// Set the bit at `pos`.
    pub fn set_bit(&mut self, pos: usize) {
        debug_assert!(pos < self.nbits);
        bitvec::set_bit(pos, &mut self.words);
    }

    /// Get the bit at `pos`.
    pub fn get_bit(&self, pos: usize) -> bool {
        debug_assert!(pos < self.nbits);
        bitvec::get_bit(pos, &self.words)
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> u32 {
        bitvec::count_ones(&self.words)
    }

    /// Width in bits.
    pub fn nbits(&self) -> usize {
        self.nbits
    }

    /// The backing words.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Does this fingerprint have every bit of `query` set?
    ///
    /// This is the substructure screen a linear scan performs; the inverted
    /// archive answers the same predicate column-wise.
    pub fn contains(&self, query: &Fingerprint) -> bool {
        debug_assert_eq!(self.nbits, query.nbits);
        self.words
            .iter()
            .zip(query.words.iter())
            .all(|(w, q)| q & !w == 0)
    }
}

impl ContentAddressable for Fingerprint {
    fn content_hash(&self) -> String {
        let mut bytes = Vec::with_capacity(self.words.len() * 8);
        for word in &self.words {
            bytes.extend(word.to_le_bytes());
        }
        sha256(&bytes)
    }
}

/// Fingerprint generation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Paths,
    Trees,
    Subgraphs,
}

impl Method {
    /// Compute the fingerprint of `mol` with this method.
    pub fn fingerprint<M: MolGraph>(
        self,
        mol: &M,
        k: usize,
        nbits: usize,
        prime: usize,
    ) -> Result<Fingerprint> {
        match self {
            Method::Paths => path_fingerprint(mol, k, nbits, prime),
            Method::Trees => tree_fingerprint(mol, k, nbits, prime),
            Method::Subgraphs => subgraph_fingerprint(mol, k, nbits, prime),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::Paths => "paths",
            Method::Trees => "trees",
            Method::Subgraphs => "subgraphs",
        };
        f.write_str(s)
    }
}

impl FromStr for Method {
    type Err = PhysaliaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "paths" => Ok(Method::Paths),
            "trees" => Ok(Method::Trees),
            "subgraphs" => Ok(Method::Subgraphs),
            other => Err(PhysaliaError::InvalidInput(format!(
                "unknown fingerprint method \"{other}\" (expected paths, trees, or subgraphs)"
            ))),
        }
    }
}

/// Reject parameter combinations the generators cannot honour.
fn validate_params(k: usize, nbits: usize, prime: usize) -> Result<()> {
    if k < 1 {
        return Err(PhysaliaError::InvalidInput(
            "substructure size k must be at least 1".into(),
        ));
    }
    if nbits == 0 || nbits % bitvec::BITS_PER_WORD != 0 {
        return Err(PhysaliaError::InvalidInput(format!(
            "fingerprint width {nbits} is not a positive multiple of {}",
            bitvec::BITS_PER_WORD
        )));
    }
    if prime < 2 || prime > nbits {
        return Err(PhysaliaError::InvalidInput(format!(
            "hash prime {prime} must lie in [2, {nbits}]"
        )));
    }
    Ok(())
}

/// Path-based fingerprint: all simple paths with up to `k` atoms.
pub fn path_fingerprint<M: MolGraph>(
    mol: &M,
    k: usize,
    nbits: usize,
    prime: usize,
) -> Result<Fingerprint> {
    validate_params(k, nbits, prime)?;
    let mut fp = Fingerprint::new(nbits);
    for path in enumerate_paths(mol, k) {
        let code = canonical_path_code(mol, &path);
        fp.set_bit((fnv1a_words(&code) % prime as u64) as usize);
    }
    Ok(fp)
}

/// Tree-based fingerprint: spanning trees of every connected atom set with
/// up to `k` atoms.
pub fn tree_fingerprint<M: MolGraph>(
    mol: &M,
    k: usize,
    nbits: usize,
    prime: usize,
) -> Result<Fingerprint> {
    subgraphs_fingerprint(mol, k, nbits, prime, true)
}

/// Subgraph-based fingerprint: every connected induced subgraph with up to
/// `k` atoms.
pub fn subgraph_fingerprint<M: MolGraph>(
    mol: &M,
    k: usize,
    nbits: usize,
    prime: usize,
) -> Result<Fingerprint> {
    subgraphs_fingerprint(mol, k, nbits, prime, false)
}

fn subgraphs_fingerprint<M: MolGraph>(
    mol: &M,
    k: usize,
    nbits: usize,
    prime: usize,
    trees: bool,
) -> Result<Fingerprint> {
    validate_params(k, nbits, prime)?;
    let mut fp = Fingerprint::new(nbits);
    enumerate_subgraphs(mol, k, trees, |sub| {
        let view = SubgraphView::new(mol, sub);
        let symmetry = extended_connectivities(&view);
        let (_, code) = canonicalize(&view, &symmetry);
        fp.set_bit((fnv1a_words(&code) % prime as u64) as usize);
    });
    Ok(fp)
}

/// Fingerprint a slice of molecules, preserving input order.
///
/// With the `parallel` feature the work is distributed with rayon; the
/// result order still matches the input order.
pub fn fingerprint_batch<M>(
    mols: &[M],
    method: Method,
    k: usize,
    nbits: usize,
    prime: usize,
) -> Result<Vec<Fingerprint>>
where
    M: MolGraph + Sync,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        mols.par_iter()
            .map(|mol| method.fingerprint(mol, k, nbits, prime))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        mols.iter()
            .map(|mol| method.fingerprint(mol, k, nbits, prime))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::{Bond, MolAtom, Molecule};

    fn make_ethane() -> Molecule {
        Molecule::new(
            "ethane".into(),
            vec![MolAtom::carbon(3), MolAtom::carbon(3)],
            vec![Bond::single(0, 1)],
        )
    }

    fn make_benzene() -> Molecule {
        let atoms = vec![MolAtom::aromatic_carbon(1); 6];
        let bonds = (0..6).map(|i| Bond::aromatic(i, (i + 1) % 6)).collect();
        Molecule::new("benzene".into(), atoms, bonds)
    }

    fn make_cyclohexane() -> Molecule {
        let atoms = vec![MolAtom::carbon(2); 6];
        let bonds = (0..6).map(|i| Bond::single(i, (i + 1) % 6)).collect();
        Molecule::new("cyclohexane".into(), atoms, bonds)
    }

    #[test]
    fn bit_operations() {
        let mut fp = Fingerprint::new(128);
        assert!(!fp.get_bit(42));
        fp.set_bit(42);
        assert!(fp.get_bit(42));
        assert_eq!(fp.count_ones(), 1);
        fp.set_bit(100);
        assert_eq!(fp.count_ones(), 2);
    }

    #[test]
    fn ethane_path_bits() {
        // Both atom paths collapse to one code; the C-C path is the other.
        let mol = make_ethane();
        let fp = path_fingerprint(&mol, 2, 64, 61).unwrap();
        assert_eq!(fp.count_ones(), 2);

        let again = path_fingerprint(&mol, 2, 64, 61).unwrap();
        assert_eq!(fp, again);
    }

    #[test]
    fn relabelled_molecule_same_fingerprint() {
        let mol = make_benzene();
        let relabelled = mol.relabel(&[4, 2, 0, 5, 1, 3]);
        for method in [Method::Paths, Method::Trees, Method::Subgraphs] {
            let fp1 = method.fingerprint(&mol, 6, 1024, 1021).unwrap();
            let fp2 = method.fingerprint(&relabelled, 6, 1024, 1021).unwrap();
            assert_eq!(fp1, fp2, "method {method} not invariant under relabelling");
        }
    }

    #[test]
    fn benzene_differs_from_cyclohexane() {
        let fp1 = subgraph_fingerprint(&make_benzene(), 6, 1024, 1021).unwrap();
        let fp2 = subgraph_fingerprint(&make_cyclohexane(), 6, 1024, 1021).unwrap();
        assert_ne!(fp1, fp2);
    }

    #[test]
    fn bits_above_prime_stay_zero() {
        let fp = subgraph_fingerprint(&make_benzene(), 6, 128, 61).unwrap();
        for i in 61..128 {
            assert!(!fp.get_bit(i), "bit {i} above the prime is set");
        }
        assert!(fp.count_ones() > 0);
    }

    #[test]
    fn path_bits_grow_with_k() {
        let mol = make_benzene();
        let small = path_fingerprint(&mol, 2, 1024, 1021).unwrap();
        let large = path_fingerprint(&mol, 5, 1024, 1021).unwrap();
        assert!(large.contains(&small), "k=2 bits must be a subset of k=5 bits");
    }

    #[test]
    fn bit_count_bounded_by_substructures() {
        let mol = make_ethane();
        // Three paths enumerated, two distinct codes.
        let fp = path_fingerprint(&mol, 2, 64, 61).unwrap();
        assert!(fp.count_ones() <= 3);
        assert!(fp.count_ones() <= 61);
    }

    #[test]
    fn rejects_bad_parameters() {
        let mol = make_ethane();
        assert!(path_fingerprint(&mol, 0, 64, 61).is_err());
        assert!(path_fingerprint(&mol, 2, 100, 61).is_err());
        assert!(path_fingerprint(&mol, 2, 128, 131).is_err());
        assert!(path_fingerprint(&mol, 2, 64, 1).is_err());
    }

    #[test]
    fn method_parsing() {
        assert_eq!("paths".parse::<Method>().unwrap(), Method::Paths);
        assert_eq!("trees".parse::<Method>().unwrap(), Method::Trees);
        assert_eq!("subgraphs".parse::<Method>().unwrap(), Method::Subgraphs);
        assert!("rings".parse::<Method>().is_err());
        assert_eq!(Method::Trees.to_string(), "trees");
    }

    #[test]
    fn batch_preserves_order() {
        let mols = vec![make_ethane(), make_benzene(), make_cyclohexane()];
        let fps = fingerprint_batch(&mols, Method::Paths, 3, 256, 251).unwrap();
        assert_eq!(fps.len(), 3);
        for (mol, fp) in mols.iter().zip(&fps) {
            assert_eq!(fp, &path_fingerprint(mol, 3, 256, 251).unwrap());
        }
    }

    #[test]
    fn content_hash_deterministic() {
        let fp = path_fingerprint(&make_benzene(), 4, 512, 509).unwrap();
        assert_eq!(fp.content_hash(), fp.content_hash());
        assert_eq!(fp.content_hash().len(), 64);
    }
}
