//! Enumeration of simple paths and connected subgraphs up to a bounded size.
//!
//! Paths are collected into vectors; subgraph enumeration drives a
//! caller-supplied sink so the per-substructure work (canonicalization,
//! hash folding) happens without materialising the full result set. Both
//! orders are deterministic for a given graph.

use itertools::Itertools;

use crate::molecule::MolGraph;
use crate::subgraph::Subgraph;

/// All simple paths with 1..=k vertices, each emitted exactly once.
///
/// Multi-vertex paths are emitted in their forward direction only: the one
/// starting at the smaller-index endpoint. The canonical path code makes
/// direction immaterial, so emitting both directions would only double-count
/// bits.
pub fn enumerate_paths<M: MolGraph>(mol: &M, k: usize) -> Vec<Vec<usize>> {
    let mut paths = Vec::new();
    if k == 0 {
        return paths;
    }
    let n = mol.atom_count();
    let mut visited = vec![false; n];

    for start in 0..n {
        paths.push(vec![start]);
        if k < 2 {
            continue;
        }
        let mut path = vec![start];
        visited[start] = true;
        extend_path(mol, k, &mut path, &mut visited, &mut paths);
        visited[start] = false;
    }

    paths
}

fn extend_path<M: MolGraph>(
    mol: &M,
    k: usize,
    path: &mut Vec<usize>,
    visited: &mut Vec<bool>,
    out: &mut Vec<Vec<usize>>,
) {
    if path.len() == k {
        return;
    }
    let tip = *path.last().unwrap();
    for &(next, _) in mol.neighbors(tip) {
        if visited[next] {
            continue;
        }
        visited[next] = true;
        path.push(next);
        if path[0] < next {
            out.push(path.clone());
        }
        extend_path(mol, k, path, visited, out);
        path.pop();
        visited[next] = false;
    }
}

/// Enumerate all connected subgraphs with ≤ k atoms, invoking `sink` once per
/// distinct (atom set, bond set) pair.
///
/// In subgraph mode the bond set is the full induced edge set. In tree mode
/// (`trees = true`) every spanning-tree edge subset of each atom set is
/// emitted instead, so cyclic vertex sets contribute one subgraph per
/// spanning tree.
///
/// Atom sets are enumerated exactly once via rooted extension: the root is the
/// smallest atom of the set and extensions are restricted to larger indices
/// outside the current set's neighborhood.
pub fn enumerate_subgraphs<M, F>(mol: &M, k: usize, trees: bool, mut sink: F)
where
    M: MolGraph,
    F: FnMut(&Subgraph),
{
    if k == 0 {
        return;
    }
    let n = mol.atom_count();
    let mut marked = vec![false; n];
    let mut subset = Vec::with_capacity(k);

    for root in 0..n {
        marked[root] = true;
        let mut extension = Vec::new();
        for &(v, _) in mol.neighbors(root) {
            if v > root && !marked[v] {
                marked[v] = true;
                extension.push(v);
            }
        }

        subset.push(root);
        extend_subset(mol, k, root, &mut subset, extension.clone(), &mut marked, trees, &mut sink);
        subset.pop();

        for v in extension {
            marked[v] = false;
        }
        marked[root] = false;
    }
}

#[allow(clippy::too_many_arguments)]
fn extend_subset<M, F>(
    mol: &M,
    k: usize,
    root: usize,
    subset: &mut Vec<usize>,
    mut extension: Vec<usize>,
    marked: &mut Vec<bool>,
    trees: bool,
    sink: &mut F,
) where
    M: MolGraph,
    F: FnMut(&Subgraph),
{
    emit_subset(mol, subset, trees, sink);
    if subset.len() == k {
        return;
    }

    while let Some(w) = extension.pop() {
        let mut child_extension = extension.clone();
        let mut newly_marked = Vec::new();
        for &(u, _) in mol.neighbors(w) {
            if u > root && !marked[u] {
                marked[u] = true;
                newly_marked.push(u);
                child_extension.push(u);
            }
        }

        subset.push(w);
        extend_subset(mol, k, root, subset, child_extension, marked, trees, sink);
        subset.pop();

        for u in newly_marked {
            marked[u] = false;
        }
    }
}

/// Emit the subgraph(s) for one connected atom set.
fn emit_subset<M, F>(mol: &M, subset: &[usize], trees: bool, sink: &mut F)
where
    M: MolGraph,
    F: FnMut(&Subgraph),
{
    let mut atoms: Vec<usize> = subset.to_vec();
    atoms.sort_unstable();

    // Induced bonds, each collected once from its smaller endpoint.
    let mut bonds = Vec::new();
    for &a in &atoms {
        for &(v, bi) in mol.neighbors(a) {
            if a < v && atoms.binary_search(&v).is_ok() {
                bonds.push(bi);
            }
        }
    }
    bonds.sort_unstable();

    if !trees || bonds.len() == atoms.len() - 1 {
        // Induced subgraph; in tree mode an acyclic induced edge set already
        // is the unique spanning tree.
        sink(&Subgraph { atoms, bonds });
        return;
    }

    for combo in bonds.iter().copied().combinations(atoms.len() - 1) {
        if is_spanning_tree(mol, &atoms, &combo) {
            sink(&Subgraph {
                atoms: atoms.clone(),
                bonds: combo,
            });
        }
    }
}

/// Do the given bonds connect every atom of the set without a cycle?
///
/// Callers pass exactly |atoms| - 1 bonds, so acyclicity and spanning
/// connectivity coincide; union-find detects the cycle case.
fn is_spanning_tree<M: MolGraph>(mol: &M, atoms: &[usize], bonds: &[usize]) -> bool {
    let mut parent: Vec<usize> = (0..atoms.len()).collect();

    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }

    for &bi in bonds {
        let info = mol.bond(bi);
        let u = atoms.binary_search(&info.atom1).unwrap();
        let v = atoms.binary_search(&info.atom2).unwrap();
        let (ru, rv) = (find(&mut parent, u), find(&mut parent, v));
        if ru == rv {
            return false;
        }
        parent[ru] = rv;
    }
    true
}
