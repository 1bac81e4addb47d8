//! Canonical substructure codes.
//!
//! [`canonicalize`] assigns ranks to the atoms of a connected graph so that
//! the resulting code — the rank-ordered invariants followed by the sorted
//! edge closures — is the lexicographic minimum over every connected
//! ordering rooted in the minimum-invariant class. Two isomorphic graphs with
//! matching invariants therefore produce identical codes, which is what makes
//! fingerprint bits line up across atom relabellings.

use crate::molecule::MolGraph;
use crate::morgan::{bond_label, seed_from_parts};

/// Compute the canonical labelling and minimum code for a connected graph.
///
/// `invariants` is one value per atom, typically from
/// [`extended_connectivities`](crate::morgan::extended_connectivities).
/// Returns `(labels, code)` where `labels[atom]` is the rank realising the
/// code.
///
/// # Panics
///
/// Panics if the graph is not connected or `invariants` has the wrong length
/// (programmer errors).
pub fn canonicalize<M: MolGraph>(mol: &M, invariants: &[u64]) -> (Vec<usize>, Vec<u64>) {
    let n = mol.atom_count();
    assert_eq!(invariants.len(), n, "one invariant per atom required");
    if n == 0 {
        return (Vec::new(), Vec::new());
    }

    let min_inv = *invariants.iter().min().unwrap();
    let mut search = Search {
        mol,
        invariants,
        order: Vec::with_capacity(n),
        in_order: vec![false; n],
        best_code: None,
        best_order: Vec::new(),
    };

    for root in 0..n {
        if invariants[root] != min_inv {
            continue;
        }
        search.in_order[root] = true;
        search.order.push(root);
        search.extend(true);
        search.order.pop();
        search.in_order[root] = false;
    }

    let code = search.best_code.expect("graph is not connected");
    let mut labels = vec![0usize; n];
    for (rank, &atom) in search.best_order.iter().enumerate() {
        labels[atom] = rank;
    }
    (labels, code)
}

struct Search<'a, M: MolGraph> {
    mol: &'a M,
    invariants: &'a [u64],
    order: Vec<usize>,
    in_order: Vec<bool>,
    best_code: Option<Vec<u64>>,
    best_order: Vec<usize>,
}

impl<M: MolGraph> Search<'_, M> {
    /// Grow the ordering by one atom adjacent to the current prefix,
    /// branch-and-bounding against the best complete code.
    ///
    /// `tight` is true while the invariant prefix equals the best code's
    /// prefix; only then can a larger invariant prune the branch.
    fn extend(&mut self, tight: bool) {
        let n = self.mol.atom_count();
        if self.order.len() == n {
            self.finish();
            return;
        }

        let mut candidates: Vec<usize> = (0..n)
            .filter(|&v| {
                !self.in_order[v]
                    && self.mol.neighbors(v).iter().any(|&(u, _)| self.in_order[u])
            })
            .collect();
        candidates.sort_unstable_by_key(|&v| (self.invariants[v], v));

        let pos = self.order.len();
        for c in candidates {
            let mut still_tight = tight;
            if tight {
                if let Some(best) = &self.best_code {
                    match self.invariants[c].cmp(&best[pos]) {
                        std::cmp::Ordering::Greater => continue,
                        std::cmp::Ordering::Less => still_tight = false,
                        std::cmp::Ordering::Equal => {}
                    }
                }
            }
            self.in_order[c] = true;
            self.order.push(c);
            self.extend(still_tight);
            self.order.pop();
            self.in_order[c] = false;
        }
    }

    /// A complete ordering: build its code and keep it if it is the new
    /// minimum.
    fn finish(&mut self) {
        let code = self.build_code();
        let better = match &self.best_code {
            None => true,
            Some(best) => code < *best,
        };
        if better {
            self.best_code = Some(code);
            self.best_order = self.order.clone();
        }
    }

    fn build_code(&self) -> Vec<u64> {
        let n = self.order.len();
        let mut rank = vec![0usize; n];
        for (r, &atom) in self.order.iter().enumerate() {
            rank[atom] = r;
        }

        let mut code: Vec<u64> = self.order.iter().map(|&a| self.invariants[a]).collect();

        let mut closures: Vec<(u64, u64, u64)> = (0..self.mol.bond_count())
            .map(|bi| {
                let info = self.mol.bond(bi);
                let (ru, rv) = (rank[info.atom1], rank[info.atom2]);
                (ru.min(rv) as u64, ru.max(rv) as u64, bond_label(&info))
            })
            .collect();
        closures.sort_unstable();

        for (lo, hi, label) in closures {
            code.push(lo);
            code.push(hi);
            code.push(label);
        }
        code
    }
}

/// Canonical code for a simple path, without the full ordering search.
///
/// The code interleaves atom seeds (with within-path degrees) and bond
/// labels along the path; the lexicographically smaller of the two
/// end-to-end directions is returned, so the enumeration direction never
/// shows in the fingerprint.
///
/// # Panics
///
/// Panics if consecutive path atoms are not bonded (programmer error).
pub fn canonical_path_code<M: MolGraph>(mol: &M, path: &[usize]) -> Vec<u64> {
    let m = path.len();
    let seed = |i: usize| {
        let degree = if m == 1 {
            0
        } else if i == 0 || i == m - 1 {
            1
        } else {
            2
        };
        seed_from_parts(mol.atom(path[i]), degree)
    };
    let label = |i: usize, j: usize| {
        let bi = mol.neighbors(path[i])
            .iter()
            .find(|&&(v, _)| v == path[j])
            .map(|&(_, bi)| bi)
            .expect("consecutive path atoms are not bonded");
        bond_label(&mol.bond(bi))
    };

    let mut forward = Vec::with_capacity(2 * m - 1);
    forward.push(seed(0));
    for i in 1..m {
        forward.push(label(i - 1, i));
        forward.push(seed(i));
    }

    let mut reverse = Vec::with_capacity(2 * m - 1);
    reverse.push(seed(m - 1));
    for i in (0..m - 1).rev() {
        reverse.push(label(i + 1, i));
        reverse.push(seed(i));
    }

    forward.min(reverse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::{Bond, BondOrder, MolAtom, Molecule};
    use crate::morgan::extended_connectivities;
    use crate::subgraph::{Subgraph, SubgraphView};

    fn make_benzene() -> Molecule {
        let atoms = vec![MolAtom::aromatic_carbon(1); 6];
        let bonds = (0..6).map(|i| Bond::aromatic(i, (i + 1) % 6)).collect();
        Molecule::new("benzene".into(), atoms, bonds)
    }

    fn full_subgraph(mol: &Molecule) -> Subgraph {
        Subgraph {
            atoms: (0..mol.atom_count()).collect(),
            bonds: (0..mol.bond_count()).collect(),
        }
    }

    #[test]
    fn code_covers_atoms_and_bonds() {
        let mol = make_benzene();
        let inv = extended_connectivities(&mol);
        let (labels, code) = canonicalize(&mol, &inv);
        // 6 invariants + 3 values per closure for 6 bonds.
        assert_eq!(code.len(), 6 + 3 * 6);
        let mut sorted = labels.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn isomorphic_graphs_share_codes() {
        let mol = make_benzene();
        let relabelled = mol.relabel(&[3, 5, 1, 0, 4, 2]);

        let (_, code1) = canonicalize(&mol, &extended_connectivities(&mol));
        let (_, code2) = canonicalize(&relabelled, &extended_connectivities(&relabelled));
        assert_eq!(code1, code2);
    }

    #[test]
    fn isomorphic_views_share_codes() {
        // Asymmetric molecule: 2-methylbutane carbon skeleton.
        let atoms = vec![MolAtom::carbon(3); 5];
        let bonds = vec![
            Bond::single(0, 1),
            Bond::single(1, 2),
            Bond::single(2, 3),
            Bond::single(1, 4),
        ];
        let mol = Molecule::new("isopentane".into(), atoms, bonds);

        // Two different 3-atom star fragments around atom 1: {0,1,2} and {2,1,4}
        // are isomorphic (CH3-CH-CH3 vs the same with the other methyl).
        let sub_a = Subgraph { atoms: vec![0, 1, 2], bonds: vec![0, 1] };
        let sub_b = Subgraph { atoms: vec![1, 2, 4], bonds: vec![1, 3] };
        let view_a = SubgraphView::new(&mol, &sub_a);
        let view_b = SubgraphView::new(&mol, &sub_b);

        let (_, code_a) = canonicalize(&view_a, &extended_connectivities(&view_a));
        let (_, code_b) = canonicalize(&view_b, &extended_connectivities(&view_b));
        assert_eq!(code_a, code_b);
    }

    #[test]
    fn bond_order_changes_code() {
        let single = Molecule::new(
            "".into(),
            vec![MolAtom::carbon(3), MolAtom::carbon(3)],
            vec![Bond::single(0, 1)],
        );
        let double = Molecule::new(
            "".into(),
            vec![MolAtom::carbon(2), MolAtom::carbon(2)],
            vec![Bond::new(0, 1, BondOrder::Double)],
        );
        let (_, c1) = canonicalize(&single, &extended_connectivities(&single));
        let (_, c2) = canonicalize(&double, &extended_connectivities(&double));
        assert_ne!(c1, c2);
    }

    #[test]
    fn single_atom_code() {
        let mol = Molecule::new("methane".into(), vec![MolAtom::carbon(4)], vec![]);
        let inv = extended_connectivities(&mol);
        let (labels, code) = canonicalize(&mol, &inv);
        assert_eq!(labels, vec![0]);
        assert_eq!(code, vec![inv[0]]);
    }

    #[test]
    fn path_code_direction_invariant() {
        let atoms = vec![MolAtom::new(8), MolAtom::carbon(2), MolAtom::carbon(3)];
        let bonds = vec![Bond::single(0, 1), Bond::single(1, 2)];
        let mol = Molecule::new("ethanol-heavy".into(), atoms, bonds);

        let code_fwd = canonical_path_code(&mol, &[0, 1, 2]);
        let code_rev = canonical_path_code(&mol, &[2, 1, 0]);
        assert_eq!(code_fwd, code_rev);
    }

    #[test]
    fn path_code_sees_bond_order() {
        let single = Molecule::new(
            "".into(),
            vec![MolAtom::carbon(3), MolAtom::carbon(3)],
            vec![Bond::single(0, 1)],
        );
        let aromatic = Molecule::new(
            "".into(),
            vec![MolAtom::carbon(3), MolAtom::carbon(3)],
            vec![Bond::aromatic(0, 1)],
        );
        assert_ne!(
            canonical_path_code(&single, &[0, 1]),
            canonical_path_code(&aromatic, &[0, 1])
        );
    }
}
