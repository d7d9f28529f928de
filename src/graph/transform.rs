//! Relabeling and cleanup passes. Each returns a fresh graph.

use super::{prefix_sum, split_rows_mut, Graph};
use crate::types::{VId, UNVISITED};
use log::info;
use rayon::prelude::*;

/// Rebuilds one adjacency direction under a new id space.
///
/// Row `u` of the result holds the neighbors of `new_to_old[u]`, each
/// mapped through `old_to_new` and sorted ascending.
fn relabel<'a, F>(new_to_old: &[VId], old_to_new: &[VId], neighbors: F) -> (Vec<usize>, Vec<VId>)
where
    F: Fn(VId) -> &'a [VId] + Sync,
{
    let offset = prefix_sum(new_to_old.iter().map(|&old| neighbors(old).len()));
    let mut neigh = vec![0; offset[new_to_old.len()]];
    split_rows_mut(&offset, &mut neigh)
        .into_par_iter()
        .zip(new_to_old.par_iter())
        .for_each(|(row, &old)| {
            for (slot, &n) in row.iter_mut().zip(neighbors(old)) {
                *slot = old_to_new[n as usize];
            }
            row.sort_unstable();
        });
    (offset, neigh)
}

fn rebuild(g: &Graph, new_to_old: &[VId], old_to_new: &[VId]) -> Graph {
    let vertex_number = new_to_old.len();
    let (out_offset, out_neigh) = relabel(new_to_old, old_to_new, |v| g.out_neighbors(v));
    if !g.is_directed() {
        return Graph::undirected(vertex_number, out_offset, out_neigh);
    }
    let (in_offset, in_neigh) = relabel(new_to_old, old_to_new, |v| g.in_neighbors(v));
    Graph::directed(vertex_number, out_offset, out_neigh, in_offset, in_neigh)
}

/// Relabels vertices by descending out-degree, ties broken by ascending id.
///
/// Returns the relabeled graph, `new_ids` (`new_ids[old] == new`) and
/// `new_ids_remap` (`new_ids_remap[new] == old`).
pub fn reorder_by_degree(g: &Graph) -> (Graph, Vec<VId>, Vec<VId>) {
    info!("reordering by degree...");
    let mut new_ids_remap: Vec<VId> = g.vertices().collect();
    new_ids_remap.par_sort_by_key(|&v| (std::cmp::Reverse(g.out_degree(v)), v));
    let mut new_ids = vec![0; g.vertex_number()];
    for (new, &old) in new_ids_remap.iter().enumerate() {
        new_ids[old as usize] = new as VId;
    }
    let reordered = rebuild(g, &new_ids_remap, &new_ids);
    (reordered, new_ids, new_ids_remap)
}

/// Drops isolated vertices, keeping the survivors in their original order.
///
/// Returns the squeezed graph, `vertex_map` (`vertex_map[old] == new`, or
/// [`UNVISITED`] for a dropped vertex) and `vertex_remap`
/// (`vertex_remap[new] == old`).
pub fn squeeze_graph(g: &Graph) -> (Graph, Vec<VId>, Vec<VId>) {
    info!("squeezing isolated vertices...");
    let mut vertex_map = vec![UNVISITED; g.vertex_number()];
    let mut vertex_remap = Vec::with_capacity(g.vertex_number());
    for u in g.vertices().filter(|&u| !g.is_isolated(u)) {
        vertex_map[u as usize] = vertex_remap.len() as VId;
        vertex_remap.push(u);
    }
    info!(
        "{} of {} vertices kept",
        vertex_remap.len(),
        g.vertex_number()
    );
    let squeezed = rebuild(g, &vertex_remap, &vertex_map);
    (squeezed, vertex_map, vertex_remap)
}

/// Moves the distinct values of a sorted row to its front and returns how
/// many there are.
fn dedup_sorted(row: &mut [VId]) -> usize {
    if row.is_empty() {
        return 0;
    }
    let mut len = 1;
    for i in 1..row.len() {
        if row[i] != row[len - 1] {
            row[len] = row[i];
            len += 1;
        }
    }
    len
}

fn compact(rows: Vec<&mut [VId]>) -> Vec<usize> {
    rows.into_par_iter().map(|row| dedup_sorted(row)).collect()
}

fn copy_prefixes<'a, F>(neighbors: F, lens: &[usize]) -> (Vec<usize>, Vec<VId>)
where
    F: Fn(VId) -> &'a [VId],
{
    let offset = prefix_sum(lens.iter().copied());
    let mut neigh = Vec::with_capacity(offset[lens.len()]);
    for (v, &len) in lens.iter().enumerate() {
        neigh.extend_from_slice(&neighbors(v as VId)[..len]);
    }
    (offset, neigh)
}

/// Removes parallel edges.
///
/// The input is consumed: its rows are deduplicated in place, which
/// scrambles their tails, before the distinct prefixes are copied into the
/// returned graph.
pub fn simplify_graph(mut raw: Graph) -> Graph {
    info!("simplifying...");
    let vertex_number = raw.vertex_number();
    let (out_lens, in_lens) = {
        let (out_rows, in_rows) = raw.rows_mut();
        (compact(out_rows), in_rows.map(compact))
    };
    let (out_offset, out_neigh) = copy_prefixes(|v| raw.out_neighbors(v), &out_lens);
    match in_lens {
        None => Graph::undirected(vertex_number, out_offset, out_neigh),
        Some(in_lens) => {
            let (in_offset, in_neigh) = copy_prefixes(|v| raw.in_neighbors(v), &in_lens);
            Graph::directed(vertex_number, out_offset, out_neigh, in_offset, in_neigh)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_csr_from_edges;

    fn create_directed() -> Graph {
        // vertex 2 and 5 isolated, 4 has the largest out-degree
        build_csr_from_edges(
            &[(0, 1), (4, 0), (4, 1), (4, 3), (3, 4), (1, 3), (6, 4)],
            false,
        )
    }

    fn create_multi() -> Graph {
        build_csr_from_edges(&[(0, 1), (0, 1), (1, 2), (0, 1), (2, 0), (1, 2)], false)
    }

    #[test]
    fn test_reorder_by_degree() {
        let g = create_directed();
        let (reordered, new_ids, new_ids_remap) = reorder_by_degree(&g);
        reordered.validate();
        assert_eq!(new_ids_remap, [4, 0, 1, 3, 6, 2, 5]);
        assert_eq!(reordered.vertex_number(), g.vertex_number());
        assert_eq!(reordered.edge_number(), g.edge_number());
        assert_eq!(reordered.is_directed(), g.is_directed());
        for old in g.vertices() {
            assert_eq!(new_ids_remap[new_ids[old as usize] as usize], old);
            let new = new_ids[old as usize];
            assert_eq!(reordered.out_degree(new), g.out_degree(old));
            assert_eq!(reordered.in_degree(new), g.in_degree(old));
            let mut mapped: Vec<_> = g
                .out_neighbors(old)
                .iter()
                .map(|&n| new_ids[n as usize])
                .collect();
            mapped.sort();
            assert_eq!(reordered.out_neighbors(new), &mapped[..]);
        }
        assert!(reordered
            .vertices()
            .collect::<Vec<_>>()
            .windows(2)
            .all(|w| reordered.out_degree(w[0]) >= reordered.out_degree(w[1])));
    }

    #[test]
    fn test_reorder_undirected() {
        let g = build_csr_from_edges(&[(0, 1), (1, 0), (1, 2), (2, 1)], true);
        let (reordered, new_ids, _) = reorder_by_degree(&g);
        reordered.validate();
        assert!(!reordered.is_directed());
        assert_eq!(new_ids, [1, 0, 2]);
        assert_eq!(reordered.out_neighbors(0), [1, 2]);
    }

    #[test]
    fn test_squeeze_graph() {
        let g = create_directed();
        let (squeezed, vertex_map, vertex_remap) = squeeze_graph(&g);
        squeezed.validate();
        assert_eq!(vertex_remap, [0, 1, 3, 4, 6]);
        assert_eq!(vertex_map, [0, 1, UNVISITED, 2, 3, UNVISITED, 4]);
        assert_eq!(squeezed.vertex_number(), 5);
        assert_eq!(squeezed.edge_number(), g.edge_number());
        assert!(squeezed.vertices().all(|v| !squeezed.is_isolated(v)));
        for new in squeezed.vertices() {
            let old = vertex_remap[new as usize];
            let back: Vec<_> = squeezed
                .out_neighbors(new)
                .iter()
                .map(|&n| vertex_remap[n as usize])
                .collect();
            assert_eq!(back, g.out_neighbors(old));
        }
    }

    #[test]
    fn test_squeeze_empty() {
        let (squeezed, vertex_map, vertex_remap) = squeeze_graph(&Graph::default());
        squeezed.validate();
        assert_eq!(squeezed.vertex_number(), 0);
        assert!(vertex_map.is_empty() && vertex_remap.is_empty());
    }

    #[test]
    fn test_simplify_graph() {
        let simplified = simplify_graph(create_multi());
        simplified.validate();
        assert_eq!(simplified.edge_number(), 3);
        assert_eq!(simplified.out_neighbors(0), [1]);
        assert_eq!(simplified.in_neighbors(2), [1]);
        let again = simplify_graph(simplified);
        assert_eq!(again.edge_number(), 3);
        for v in again.vertices() {
            let row = again.out_neighbors(v);
            assert!(row.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_simplify_undirected() {
        let g = build_csr_from_edges(&[(0, 1), (1, 0), (0, 1), (1, 0), (2, 2)], true);
        assert_eq!(g.out_entries(), 5);
        let simplified = simplify_graph(g);
        simplified.validate();
        assert!(!simplified.is_directed());
        assert_eq!(simplified.out_entries(), 3);
        assert_eq!(simplified.out_neighbors(1), [0]);
    }

    #[test]
    fn test_dedup_sorted() {
        let mut row = [1, 1, 2, 5, 5, 5, 7];
        let len = dedup_sorted(&mut row);
        assert_eq!(&row[..len], [1, 2, 5, 7]);
        assert_eq!(dedup_sorted(&mut []), 0);
    }
}
