//! Substructure views: non-owning projections of a parent graph.
//!
//! A [`Subgraph`] names atoms and bonds of a parent molecule by index; a
//! [`SubgraphView`] re-exposes that selection as a dense graph of its own so
//! the invariant and canonical-code machinery can run on it unchanged. The
//! view borrows the parent and lives only as long as the enclosing
//! enumeration frame.

use crate::molecule::{BondInfo, MolAtom, MolGraph};

/// A selection of atoms and bonds within a parent graph.
///
/// Invariant: every bond's endpoints are in `atoms`, and the selected
/// structure is connected. Violations are programmer errors; construction of
/// a [`SubgraphView`] aborts on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subgraph {
    pub atoms: Vec<usize>,
    pub bonds: Vec<usize>,
}

/// A borrowed, dense-index projection of a [`Subgraph`].
///
/// Local atom `i` corresponds to parent atom `atoms[i]`; local bond `j` to
/// parent bond `bonds[j]`. Bond attributes (order, aromaticity, ring
/// membership) are read from the parent.
pub struct SubgraphView<'a, M: MolGraph> {
    parent: &'a M,
    atoms: Vec<usize>,
    bonds: Vec<usize>,
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl<'a, M: MolGraph> SubgraphView<'a, M> {
    /// Project `subgraph` out of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if any selected bond has an endpoint outside the atom
    /// selection. Connectivity is checked in debug builds.
    pub fn new(parent: &'a M, subgraph: &Subgraph) -> Self {
        let mut local = vec![usize::MAX; parent.atom_count()];
        for (i, &a) in subgraph.atoms.iter().enumerate() {
            local[a] = i;
        }

        let mut adjacency = vec![Vec::new(); subgraph.atoms.len()];
        for (j, &b) in subgraph.bonds.iter().enumerate() {
            let info = parent.bond(b);
            let (u, v) = (local[info.atom1], local[info.atom2]);
            assert!(
                u != usize::MAX && v != usize::MAX,
                "subgraph bond {b} has an endpoint outside the atom selection"
            );
            adjacency[u].push((v, j));
            adjacency[v].push((u, j));
        }

        let view = SubgraphView {
            parent,
            atoms: subgraph.atoms.clone(),
            bonds: subgraph.bonds.clone(),
            adjacency,
        };
        debug_assert!(view.is_connected(), "subgraph is not connected");
        view
    }

    /// Parent atom index for a local atom.
    pub fn parent_atom(&self, local: usize) -> usize {
        self.atoms[local]
    }

    fn is_connected(&self) -> bool {
        let n = self.atoms.len();
        if n == 0 {
            return true;
        }
        let mut seen = vec![false; n];
        let mut stack = vec![0usize];
        seen[0] = true;
        let mut count = 1;
        while let Some(u) = stack.pop() {
            for &(v, _) in &self.adjacency[u] {
                if !seen[v] {
                    seen[v] = true;
                    count += 1;
                    stack.push(v);
                }
            }
        }
        count == n
    }
}

impl<M: MolGraph> MolGraph for SubgraphView<'_, M> {
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
        self.parent.atom(self.atoms[atom])
    }

    fn bond(&self, bond: usize) -> BondInfo {
        let info = self.parent.bond(self.bonds[bond]);
        let local = |p: usize| self.atoms.iter().position(|&a| a == p).unwrap();
        BondInfo {
            atom1: local(info.atom1),
            atom2: local(info.atom2),
            ..info
        }
    }
}
