//! Extended-connectivity vertex invariants.
//!
//! Morgan-style iterative refinement: each atom starts from a seed derived
//! from its own attributes and repeatedly absorbs the sorted multiset of its
//! neighbours' invariants (with bond labels) until the partition into
//! invariant classes stops growing. The values are stable and
//! class-preserving, not minimal.

use physalia_core::hash::fnv1a_words;

use crate::molecule::{BondInfo, MolAtom, MolGraph};

/// Per-atom invariant seed from (element, charge, degree, aromaticity).
///
/// Degree is measured in the graph the seed is computed over, so a
/// substructure view contributes within-view degrees.
pub(crate) fn seed_from_parts(atom: &MolAtom, degree: usize) -> u64 {
    fnv1a_words(&[
        atom.atomic_number as u64,
        (atom.formal_charge as i64 + 128) as u64,
        degree as u64,
        atom.is_aromatic as u64,
    ])
}

/// Bond attributes folded into one label value.
pub(crate) fn bond_label(info: &BondInfo) -> u64 {
    info.order.as_u8() as u64
        | (info.is_aromatic as u64) << 4
        | (info.in_ring as u64) << 5
}

/// Compute the stabilised extended-connectivity invariant for every atom.
pub fn extended_connectivities<M: MolGraph>(mol: &M) -> Vec<u64> {
    let n = mol.atom_count();
    let mut invariants: Vec<u64> = (0..n)
        .map(|i| seed_from_parts(mol.atom(i), mol.degree(i)))
        .collect();

    let mut prev_distinct = count_distinct(&invariants);

    // The partition can refine at most n - 1 times.
    for _ in 0..n {
        let next: Vec<u64> = (0..n)
            .map(|i| {
                let mut neighbor_invs: Vec<u64> = mol
                    .neighbors(i)
                    .iter()
                    .map(|&(v, bi)| {
                        fnv1a_words(&[invariants[v], bond_label(&mol.bond(bi))])
                    })
                    .collect();
                neighbor_invs.sort_unstable();

                let mut combined = Vec::with_capacity(1 + neighbor_invs.len());
                combined.push(invariants[i]);
                combined.extend(neighbor_invs);
                fnv1a_words(&combined)
            })
            .collect();

        let distinct = count_distinct(&next);
        invariants = next;

        if distinct <= prev_distinct {
            break; // Convergence: no more discrimination
        }
        prev_distinct = distinct;
    }

    invariants
}

/// Count distinct values in a slice.
fn count_distinct(values: &[u64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}
