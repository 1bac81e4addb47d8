//! Molecular graph representation.
//!
//! [`Molecule`] is the concrete graph type; [`MolGraph`] is the read-only
//! capability set the fingerprint generators are written against, so any
//! graph-shaped type (including [`SubgraphView`](crate::subgraph::SubgraphView))
//! can be fingerprinted without copying into a `Molecule`.

use physalia_core::hash::sha256;
use physalia_core::{Annotated, ContentAddressable, Summarizable};

/// Bond order classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Numeric bond order used in invariants and canonical codes.
    pub fn as_u8(self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Aromatic => 4,
        }
    }
}

/// An atom in a molecular graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MolAtom {
    pub atomic_number: u8,
    pub formal_charge: i8,
    pub implicit_hydrogens: u8,
    pub is_aromatic: bool,
}

impl MolAtom {
    /// A neutral, non-aromatic atom of the given element.
    pub fn new(atomic_number: u8) -> Self {
        MolAtom {
            atomic_number,
            formal_charge: 0,
            implicit_hydrogens: 0,
            is_aromatic: false,
        }
    }

    /// A neutral carbon with the given implicit hydrogen count.
    pub fn carbon(implicit_hydrogens: u8) -> Self {
        MolAtom {
            atomic_number: 6,
            formal_charge: 0,
            implicit_hydrogens,
            is_aromatic: false,
        }
    }

    /// An aromatic carbon with the given implicit hydrogen count.
    pub fn aromatic_carbon(implicit_hydrogens: u8) -> Self {
        MolAtom {
            atomic_number: 6,
            formal_charge: 0,
            implicit_hydrogens,
            is_aromatic: true,
        }
    }
}

/// A bond between two atoms.
///
/// `in_ring` is recomputed by [`Molecule::new`]; the value passed in by the
/// caller is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom1: usize,
    pub atom2: usize,
    pub order: BondOrder,
    pub is_aromatic: bool,
    pub in_ring: bool,
}

impl Bond {
    /// A bond of the given order between two atoms.
    pub fn new(atom1: usize, atom2: usize, order: BondOrder) -> Self {
        Bond {
            atom1,
            atom2,
            order,
            is_aromatic: matches!(order, BondOrder::Aromatic),
            in_ring: false,
        }
    }

    /// A single bond between two atoms.
    pub fn single(atom1: usize, atom2: usize) -> Self {
        Bond::new(atom1, atom2, BondOrder::Single)
    }

    /// An aromatic bond between two atoms.
    pub fn aromatic(atom1: usize, atom2: usize) -> Self {
        Bond::new(atom1, atom2, BondOrder::Aromatic)
    }
}

/// Read-only bond attributes with endpoints in the owning graph's index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BondInfo {
    pub atom1: usize,
    pub atom2: usize,
    pub order: BondOrder,
    pub is_aromatic: bool,
    pub in_ring: bool,
}

/// Read-only graph capabilities required by the fingerprint generators.
///
/// Vertex indices are dense in `[0, atom_count())`, bond indices in
/// `[0, bond_count())`. Implementations never need mutation.
pub trait MolGraph {
    /// Number of atoms.
    fn atom_count(&self) -> usize;

    /// Number of bonds.
    fn bond_count(&self) -> usize;

    /// `(neighbor_atom, bond_idx)` pairs for a given atom.
    fn neighbors(&self, atom: usize) -> &[(usize, usize)];

    /// Attributes of a given atom.
    fn atom(&self, atom: usize) -> &MolAtom;

    /// Attributes and endpoints of a given bond.
    fn bond(&self, bond: usize) -> BondInfo;

    /// Graph degree of an atom.
    fn degree(&self, atom: usize) -> usize {
        self.neighbors(atom).len()
    }
}

/// A molecular graph with atoms, bonds, and adjacency information.
#[derive(Debug, Clone)]
pub struct Molecule {
    pub name: String,
    pub atoms: Vec<MolAtom>,
    pub bonds: Vec<Bond>,
    /// adjacency[atom_idx] = Vec<(neighbor_atom_idx, bond_idx)>
    pub adjacency: Vec<Vec<(usize, usize)>>,
}

impl Molecule {
    /// Create a new molecule, building the adjacency list and marking
    /// ring bonds (bonds that lie on a cycle).
    pub fn new(name: String, atoms: Vec<MolAtom>, mut bonds: Vec<Bond>) -> Self {
        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (bi, bond) in bonds.iter().enumerate() {
            adjacency[bond.atom1].push((bond.atom2, bi));
            adjacency[bond.atom2].push((bond.atom1, bi));
        }
        mark_ring_bonds(atoms.len(), &adjacency, &mut bonds);
        Molecule {
            name,
            atoms,
            bonds,
            adjacency,
        }
    }

    /// Number of non-hydrogen atoms.
    pub fn heavy_atom_count(&self) -> usize {
        self.atoms.iter().filter(|a| a.atomic_number != 1).count()
    }

    /// Find the bond between two atoms, if any.
    pub fn bond_between(&self, a1: usize, a2: usize) -> Option<usize> {
        self.adjacency[a1]
            .iter()
            .find(|&&(n, _)| n == a2)
            .map(|&(_, bi)| bi)
    }

    /// Return a copy with atoms relabelled by `perm`: atom `i` becomes atom
    /// `perm[i]`. Useful for isomorphism-invariance checks.
    ///
    /// # Panics
    ///
    /// Panics if `perm` is not a permutation of `0..atom_count()`.
    pub fn relabel(&self, perm: &[usize]) -> Molecule {
        assert_eq!(perm.len(), self.atoms.len(), "permutation length mismatch");
        let mut atoms = vec![MolAtom::new(0); self.atoms.len()];
        for (i, atom) in self.atoms.iter().enumerate() {
            atoms[perm[i]] = atom.clone();
        }
        let bonds = self
            .bonds
            .iter()
            .map(|b| Bond {
                atom1: perm[b.atom1],
                atom2: perm[b.atom2],
                ..b.clone()
            })
            .collect();
        Molecule::new(self.name.clone(), atoms, bonds)
    }
}

impl MolGraph for Molecule {
    fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    fn neighbors(&self, atom: usize) -> &[(usize, usize)] {
        &self.adjacency[atom]
    }

    fn atom(&self, atom: usize) -> &MolAtom {
        &self.atoms[atom]
    }

    fn bond(&self, bond: usize) -> BondInfo {
        let b = &self.bonds[bond];
        BondInfo {
            atom1: b.atom1,
            atom2: b.atom2,
            order: b.order,
            is_aromatic: b.is_aromatic,
            in_ring: b.in_ring,
        }
    }
}

/// Mark each bond's `in_ring` flag: a bond lies on a cycle iff it is not a
/// bridge. Bridges are found with one DFS over discovery/low-link times.
fn mark_ring_bonds(n: usize, adjacency: &[Vec<(usize, usize)>], bonds: &mut [Bond]) {
    for bond in bonds.iter_mut() {
        bond.in_ring = true;
    }
    let mut disc = vec![usize::MAX; n];
    let mut low = vec![0usize; n];
    let mut timer = 0usize;

    // Iterative DFS; frames are (atom, parent_bond, neighbor cursor).
    let mut stack: Vec<(usize, usize, usize)> = Vec::new();
    for start in 0..n {
        if disc[start] != usize::MAX {
            continue;
        }
        disc[start] = timer;
        low[start] = timer;
        timer += 1;
        stack.push((start, usize::MAX, 0));

        while let Some(frame) = stack.last_mut() {
            let (u, parent_bond) = (frame.0, frame.1);
            if frame.2 < adjacency[u].len() {
                let (v, bi) = adjacency[u][frame.2];
                frame.2 += 1;
                if bi == parent_bond {
                    continue;
                }
                if disc[v] == usize::MAX {
                    disc[v] = timer;
                    low[v] = timer;
                    timer += 1;
                    stack.push((v, bi, 0));
                } else {
                    low[u] = low[u].min(disc[v]);
                }
            } else {
                stack.pop();
                if let Some(&(p, _, _)) = stack.last() {
                    low[p] = low[p].min(low[u]);
                    if low[u] > disc[p] {
                        bonds[parent_bond].in_ring = false;
                    }
                }
            }
        }
    }
}

impl Annotated for Molecule {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Summarizable for Molecule {
    fn summary(&self) -> String {
        format!(
            "{}: {} atoms, {} bonds",
            if self.name.is_empty() { "Molecule" } else { &self.name },
            self.atom_count(),
            self.bond_count()
        )
    }
}

impl ContentAddressable for Molecule {
    fn content_hash(&self) -> String {
        let mut bytes = Vec::new();
        for atom in &self.atoms {
            bytes.push(atom.atomic_number);
            bytes.extend(atom.formal_charge.to_le_bytes());
            bytes.push(atom.implicit_hydrogens);
            bytes.push(atom.is_aromatic as u8);
        }
        for bond in &self.bonds {
            let (a, b) = if bond.atom1 <= bond.atom2 {
                (bond.atom1, bond.atom2)
            } else {
                (bond.atom2, bond.atom1)
            };
            bytes.extend(a.to_le_bytes());
            bytes.extend(b.to_le_bytes());
            bytes.push(bond.order.as_u8());
        }
        sha256(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_ethane() -> Molecule {
        Molecule::new(
            "ethane".into(),
            vec![MolAtom::carbon(3), MolAtom::carbon(3)],
            vec![Bond::single(0, 1)],
        )
    }

    fn make_cyclopropane() -> Molecule {
        Molecule::new(
            "cyclopropane".into(),
            vec![MolAtom::carbon(2), MolAtom::carbon(2), MolAtom::carbon(2)],
            vec![Bond::single(0, 1), Bond::single(1, 2), Bond::single(2, 0)],
        )
    }

    #[test]
    fn construction_and_adjacency() {
        let mol = make_ethane();
        assert_eq!(mol.atom_count(), 2);
        assert_eq!(mol.bond_count(), 1);
        assert_eq!(mol.neighbors(0), &[(1, 0)]);
        assert_eq!(mol.degree(1), 1);
    }

    #[test]
    fn ring_bonds_marked() {
        let mol = make_cyclopropane();
        assert!(mol.bonds.iter().all(|b| b.in_ring));

        let mol = make_ethane();
        assert!(!mol.bonds[0].in_ring);
    }

    #[test]
    fn bridge_between_rings_not_marked() {
        // Two triangles joined by a bridge bond 2-3.
        let atoms = vec![MolAtom::carbon(1); 6];
        let bonds = vec![
            Bond::single(0, 1),
            Bond::single(1, 2),
            Bond::single(2, 0),
            Bond::single(2, 3),
            Bond::single(3, 4),
            Bond::single(4, 5),
            Bond::single(5, 3),
        ];
        let mol = Molecule::new("bitriangle".into(), atoms, bonds);
        let bridge = mol.bond_between(2, 3).unwrap();
        assert!(!mol.bonds[bridge].in_ring);
        for bi in 0..mol.bond_count() {
            if bi != bridge {
                assert!(mol.bonds[bi].in_ring, "bond {bi} should be cyclic");
            }
        }
    }

    #[test]
    fn relabel_preserves_structure() {
        let mol = make_cyclopropane();
        let relabelled = mol.relabel(&[2, 0, 1]);
        assert_eq!(relabelled.atom_count(), 3);
        assert_eq!(relabelled.bond_count(), 3);
        assert!(relabelled.bond_between(2, 0).is_some());
    }

    #[test]
    fn summarizable_and_content_addressable() {
        let mol = make_ethane();
        assert!(mol.summary().contains("2 atoms"));
        let hash = mol.content_hash();
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, mol.content_hash());
    }
}
