//! Molecular fingerprint generation for the Physalia ecosystem.
//!
//! Provides the molecular graph model, enumeration of paths / trees /
//! connected subgraphs up to a bounded size, extended-connectivity vertex
//! invariants, canonical substructure codes, and the hashed fingerprints
//! built from them.
//!
//! # Example
//!
//! ```
//! use physalia_chem::{path_fingerprint, Bond, MolAtom, Molecule};
//!
//! // Ethane: two carbons, one single bond
//! let mol = Molecule::new(
//!     "ethane".into(),
//!     vec![MolAtom::carbon(3), MolAtom::carbon(3)],
//!     vec![Bond::single(0, 1)],
//! );
//!
//! let fp = path_fingerprint(&mol, 2, 64, 61).unwrap();
//! assert_eq!(fp.count_ones(), 2);
//! ```

pub mod canon;
pub mod enumerate;
pub mod fingerprint;
pub mod molecule;
pub mod morgan;
pub mod subgraph;

pub use canon::{canonical_path_code, canonicalize};
pub use enumerate::{enumerate_paths, enumerate_subgraphs};
pub use fingerprint::{
    fingerprint_batch, path_fingerprint, subgraph_fingerprint, tree_fingerprint, Fingerprint,
    Method,
};
pub use molecule::{Bond, BondInfo, BondOrder, MolAtom, MolGraph, Molecule};
pub use morgan::extended_connectivities;
pub use subgraph::{Subgraph, SubgraphView};
