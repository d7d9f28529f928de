//! Parallel drivers over many BFS roots.
//!
//! Every worker owns a private [`Memory`]; partial results are summed once
//! the workers finish.

use crate::{
    bfs::{do_bfs, do_cacheline_bfs, ProbePolicy},
    graph::{reorder_by_degree, Graph},
    memory::{Memory, MemoryConfig},
    record::reduce_backup,
    types::{is_unvisited, VId},
};
use derive_more::{Add, AddAssign};
use log::info;
use rayon::prelude::*;
use std::{fmt, ops::Range, path::Path, time::Instant};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Add, AddAssign)]
pub struct VisitTotals {
    pub edge_visits: u64,
    pub cacheline_visits: u64,
}

/// Runs a cacheline BFS from every source and sums the costs.
pub fn cacheline_visit(
    graph: &Graph,
    sources: &[VId],
    config: MemoryConfig,
    policy: ProbePolicy,
) -> VisitTotals {
    sources
        .par_iter()
        .map_init(
            || Memory::with_config(graph, config),
            |memory, &root| {
                let result = do_cacheline_bfs(graph, root, memory, policy);
                VisitTotals {
                    edge_visits: result.edge_visits,
                    cacheline_visits: result.cacheline_visits,
                }
            },
        )
        .reduce(VisitTotals::default, |a, b| a + b)
}

/// Costs of the same roots on a graph and on its degree-ordered relabeling.
#[derive(Debug)]
pub struct VisitReport {
    pub vertex_number: usize,
    /// Vertices with at least one out-edge, the only ones a root can be.
    pub non_isolated: usize,
    pub sources: usize,
    pub original: VisitTotals,
    pub reordered: VisitTotals,
}

impl VisitReport {
    fn per(&self, total: u64, vertices: usize) -> f64 {
        total as f64 / self.sources as f64 / vertices as f64
    }
}

impl fmt::Display for VisitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (prefix, totals) in &[("", self.original), ("Reorder ", self.reordered)] {
            writeln!(
                f,
                "{}Vertex-Avg Edge Visit: {:.2}",
                prefix,
                self.per(totals.edge_visits, self.vertex_number)
            )?;
            writeln!(
                f,
                "{}Non-Iso-Vertex-Avg Edge Visit: {:.2}",
                prefix,
                self.per(totals.edge_visits, self.non_isolated)
            )?;
            writeln!(
                f,
                "{}Vertex-Avg Edge Visit Cacheline: {:.2}",
                prefix,
                self.per(totals.cacheline_visits, self.vertex_number)
            )?;
            writeln!(
                f,
                "{}Non-Iso-Vertex-Avg Edge Visit Cacheline: {:.2}",
                prefix,
                self.per(totals.cacheline_visits, self.non_isolated)
            )?;
        }
        Ok(())
    }
}

/// Runs [`cacheline_visit`] on `graph` and on `reorder_by_degree(graph)`,
/// mapping `sources` into the relabeled id space.
pub fn compare_reordered(
    graph: &Graph,
    sources: &[VId],
    config: MemoryConfig,
    policy: ProbePolicy,
) -> VisitReport {
    let time_now = Instant::now();
    let (reordered_graph, new_ids, _) = reorder_by_degree(graph);
    info!("graph reorder: {} ms", time_now.elapsed().as_millis());
    let time_now = Instant::now();
    let original = cacheline_visit(graph, sources, config, policy);
    info!("processing: {} ms", time_now.elapsed().as_millis());
    let reordered_sources: Vec<VId> = sources.iter().map(|&s| new_ids[s as usize]).collect();
    let time_now = Instant::now();
    let reordered = cacheline_visit(&reordered_graph, &reordered_sources, config, policy);
    info!("processing reordered: {} ms", time_now.elapsed().as_millis());
    VisitReport {
        vertex_number: graph.vertex_number(),
        non_isolated: graph.vertices().filter(|&v| graph.out_degree(v) > 0).count(),
        sources: sources.len(),
        original,
        reordered,
    }
}

/// Length of the id prefix that holds `fraction * V` vertices with
/// out-edges, or `V` if there are not that many or the target rounds to
/// zero.
pub fn roots_to_go(graph: &Graph, fraction: f64) -> VId {
    let target = (graph.vertex_number() as f64 * fraction) as usize;
    let mut found = 0;
    for v in graph.vertices() {
        if graph.out_degree(v) > 0 {
            found += 1;
            if found == target {
                return v + 1;
            }
        }
    }
    graph.vertex_number() as VId
}

/// Counts, for every vertex `u`, how often it is a BFS parent: over every
/// root in `roots` with out-edges, each reached `v` credits each in-neighbor
/// `u` one level closer to the root.
pub fn parent_counts(graph: &Graph, roots: Range<VId>) -> Vec<f64> {
    let vertex_number = graph.vertex_number();
    roots
        .into_par_iter()
        .filter(|&root| graph.out_degree(root) > 0)
        .fold(
            || vec![0.0; vertex_number],
            |mut parent_cnt, root| {
                let depth = do_bfs(graph, root);
                for v in graph.vertices() {
                    let d = depth[v as usize];
                    if is_unvisited(d) {
                        continue;
                    }
                    for &u in graph.in_neighbors(v) {
                        let du = depth[u as usize];
                        if !is_unvisited(du) && du == d - 1 {
                            parent_cnt[u as usize] += 1.0;
                        }
                    }
                }
                parent_cnt
            },
        )
        .reduce(
            || vec![0.0; vertex_number],
            |mut a, b| {
                a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                a
            },
        )
}

/// Runs [`parent_counts`] over `0..roots` in blocks of `block_size`,
/// folding every finished block into the record at `path`.
pub fn parent_stats<P: AsRef<Path>>(
    graph: &Graph,
    roots: VId,
    block_size: VId,
    path: P,
) -> std::io::Result<()> {
    let block_size = block_size.max(1);
    let block_number = (roots + block_size - 1) / block_size;
    for block_id in 0..block_number {
        let vid_beg = block_id * block_size;
        let vid_end = ((block_id + 1) * block_size).min(roots);
        info!(
            "start to process block {} ({}-{})",
            block_id,
            vid_beg,
            vid_end - 1
        );
        let time_now = Instant::now();
        let parent_cnt = parent_counts(graph, vid_beg..vid_end);
        info!(
            "block {} finished in {} s",
            block_id,
            time_now.elapsed().as_secs()
        );
        reduce_backup(&parent_cnt, path.as_ref(), |a, b| a + b)?;
        info!("backup finished");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bfs::pick_sources,
        graph::build_csr_from_edges,
        memory::MISS_COST,
        record::load_record,
    };
    use rand::{rngs::StdRng, SeedableRng};

    fn create_star() -> Graph {
        // undirected star centred on 0, vertex 5 isolated
        let mut el = vec![];
        for v in 1..5 {
            el.push((0, v));
            el.push((v, 0));
        }
        el.push((6, 6));
        build_csr_from_edges(&el, true)
    }

    #[test]
    fn test_cacheline_visit_sums_roots() {
        let graph = create_star();
        let sources = [1, 2, 0, 1];
        let totals = cacheline_visit(
            &graph,
            &sources,
            MemoryConfig::default(),
            ProbePolicy::DiscoveredOnly,
        );
        let mut expected = VisitTotals::default();
        let mut memory = Memory::new(&graph);
        for &root in &sources {
            let result = do_cacheline_bfs(&graph, root, &mut memory, ProbePolicy::DiscoveredOnly);
            expected += VisitTotals {
                edge_visits: result.edge_visits,
                cacheline_visits: result.cacheline_visits,
            };
        }
        assert_eq!(totals, expected);
        assert!(totals.cacheline_visits >= MISS_COST);
    }

    #[test]
    fn test_compare_reordered() {
        let graph = create_star();
        let mut rng = StdRng::seed_from_u64(5);
        let sources = pick_sources(&graph, 8, &mut rng);
        let report = compare_reordered(
            &graph,
            &sources,
            MemoryConfig::default(),
            ProbePolicy::EarlyBreak,
        );
        assert_eq!(report.vertex_number, 7);
        assert_eq!(report.non_isolated, 6);
        assert_eq!(report.sources, 8);
        assert!(report.original.cacheline_visits >= MISS_COST);
        assert!(report.reordered.cacheline_visits >= MISS_COST);
        let text = report.to_string();
        assert!(text.contains("Vertex-Avg Edge Visit: "));
        assert!(text.contains("Reorder Non-Iso-Vertex-Avg Edge Visit Cacheline: "));
    }

    #[test]
    fn test_report_counts_vertices_with_out_edges() {
        // 2 is a sink, 3 only has a self-loop
        let graph = build_csr_from_edges(&[(0, 1), (1, 2), (3, 3)], false);
        let report = compare_reordered(
            &graph,
            &[0, 1],
            MemoryConfig::default(),
            ProbePolicy::EarlyBreak,
        );
        assert_eq!(graph.non_isolated_count(), 4);
        assert_eq!(report.non_isolated, 3);
    }

    #[test]
    fn test_roots_to_go() {
        let graph = build_csr_from_edges(&[(0, 1), (3, 1), (4, 1), (6, 1)], false);
        assert_eq!(roots_to_go(&graph, 0.3), 4);
        assert_eq!(roots_to_go(&graph, 1.0), 7);
        assert_eq!(roots_to_go(&graph, 0.01), 7);
    }

    #[test]
    fn test_parent_counts() {
        // diamond 0 -> {1, 2} -> 3, both directions
        let mut el = vec![];
        for &(u, v) in &[(0, 1), (0, 2), (1, 3), (2, 3)] {
            el.push((u, v));
            el.push((v, u));
        }
        let graph = build_csr_from_edges(&el, true);
        assert_eq!(parent_counts(&graph, 0..1), [2.0, 1.0, 1.0, 0.0]);
        assert_eq!(parent_counts(&graph, 0..4), [4.0, 4.0, 4.0, 4.0]);
    }

    #[test]
    fn test_parent_stats() {
        let graph = create_star();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("star-parent_cnt.bin");
        parent_stats(&graph, 7, 3, &path).unwrap();
        assert_eq!(
            load_record(&path, graph.vertex_number()).unwrap(),
            parent_counts(&graph, 0..7)
        );
    }
}
