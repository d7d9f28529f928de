//! Breadth-first traversals.

use crate::{
    bitmap::Bitmap,
    graph::Graph,
    memory::Memory,
    types::{is_unvisited, Prop, VId, UNVISITED},
};
use derive_more::Display;
use log::debug;
use rand::Rng;
use std::collections::VecDeque;

/// Picks `n` roots, with replacement, among vertices with out-edges.
pub fn pick_sources<R: Rng>(graph: &Graph, n: usize, rng: &mut R) -> Vec<VId> {
    if graph.vertices().all(|v| graph.out_degree(v) == 0) {
        return vec![];
    }
    let vertex_number = graph.vertex_number() as VId;
    (0..n)
        .map(|_| loop {
            let v = rng.gen_range(0..vertex_number);
            if graph.out_degree(v) > 0 {
                break v;
            }
        })
        .collect()
}

/// Push-based BFS with a FIFO frontier.
pub fn do_bfs(graph: &Graph, root: VId) -> Vec<Prop> {
    let mut depth = vec![UNVISITED; graph.vertex_number()];
    let mut frontier = VecDeque::new();
    depth[root as usize] = 0;
    frontier.push_back(root);
    while let Some(u) = frontier.pop_front() {
        for &v in graph.out_neighbors(u) {
            if is_unvisited(depth[v as usize]) {
                depth[v as usize] = depth[u as usize] + 1;
                frontier.push_back(v);
            }
        }
    }
    depth
}

/// Which in-edges a pull traversal charges to the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbePolicy {
    /// Probe in-neighbors in order and stop at the first parent.
    EarlyBreak,
    /// Probe every in-edge of every unvisited vertex.
    Exhaustive,
    /// Charge probes only for vertices that have a parent in the current
    /// frontier, stopping at that parent.
    DiscoveredOnly,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        ProbePolicy::EarlyBreak
    }
}

#[derive(Debug)]
pub struct CachelineBfs {
    pub depth: Vec<Prop>,
    /// In-edges probed.
    pub edge_visits: u64,
    /// Simulated cost of those probes.
    pub cacheline_visits: u64,
    pub iterations: usize,
}

/// Level-synchronous pull BFS that scores every in-edge probe against
/// `memory`. The cache is reset at the start of each level.
pub fn do_cacheline_bfs(
    graph: &Graph,
    root: VId,
    memory: &mut Memory,
    policy: ProbePolicy,
) -> CachelineBfs {
    let mut depth = vec![UNVISITED; graph.vertex_number()];
    depth[root as usize] = 0;
    let (mut edge_visits, mut cacheline_visits) = (0, 0);
    let mut iter: Prop = 0;
    let mut sum = 1;
    while sum > 0 {
        sum = 0;
        memory.reset();
        for v in graph.vertices() {
            if !is_unvisited(depth[v as usize]) {
                continue;
            }
            let in_neigh = graph.in_neighbors(v);
            if policy == ProbePolicy::DiscoveredOnly
                && !in_neigh.iter().any(|&u| depth[u as usize] == iter)
            {
                continue;
            }
            let mut found = false;
            for (offset, &u) in in_neigh.iter().enumerate() {
                edge_visits += 1;
                cacheline_visits += memory.access(v, offset);
                if !found && depth[u as usize] == iter {
                    found = true;
                    if policy != ProbePolicy::Exhaustive {
                        break;
                    }
                }
            }
            if found {
                depth[v as usize] = iter + 1;
                sum += 1;
            }
        }
        debug!("iter={} discovered={}", iter, sum);
        iter += 1;
    }
    CachelineBfs {
        depth,
        edge_visits,
        cacheline_visits,
        iterations: iter as usize,
    }
}

/// Activity of one BFS level.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[display(fmt = "{} {:<10} {:<15}", iter, active_vertices, active_edges)]
pub struct LevelStat {
    pub iter: usize,
    pub active_vertices: u64,
    pub active_edges: u64,
}

/// Push BFS reporting, per level, the vertices reached from the previous
/// frontier and the sum of their out-degrees. With `repeat` a vertex is
/// counted once per frontier edge that reaches it. The last entry is the
/// empty level that ends the traversal.
pub fn push_level_profile(
    graph: &Graph,
    root: VId,
    repeat: bool,
) -> (Vec<Prop>, Vec<LevelStat>) {
    let mut depth = vec![UNVISITED; graph.vertex_number()];
    depth[root as usize] = 0;
    let mut frontier = vec![root];
    let mut stats = vec![LevelStat {
        iter: 0,
        active_vertices: 1,
        active_edges: graph.out_degree(root) as u64,
    }];
    while !frontier.is_empty() {
        let (mut active_vertices, mut active_edges) = (0, 0);
        if repeat {
            for &u in &frontier {
                for &v in graph.out_neighbors(u) {
                    if is_unvisited(depth[v as usize]) {
                        active_vertices += 1;
                        active_edges += graph.out_degree(v) as u64;
                    }
                }
            }
        }
        let mut next = vec![];
        for &u in &frontier {
            for &v in graph.out_neighbors(u) {
                if is_unvisited(depth[v as usize]) {
                    depth[v as usize] = depth[u as usize] + 1;
                    if !repeat {
                        active_vertices += 1;
                        active_edges += graph.out_degree(v) as u64;
                    }
                    next.push(v);
                }
            }
        }
        stats.push(LevelStat {
            iter: stats.len(),
            active_vertices,
            active_edges,
        });
        frontier = next;
    }
    (depth, stats)
}

/// Pull BFS over a bitmap frontier reporting, per level, the unvisited
/// vertices scanned and the in-edges they probed.
pub fn do_pull_bfs(graph: &Graph, root: VId, early_break: bool) -> (Vec<Prop>, Vec<LevelStat>) {
    let mut depth = vec![UNVISITED; graph.vertex_number()];
    depth[root as usize] = 0;
    let mut front = Bitmap::new(graph.vertex_number());
    let mut next = Bitmap::new(graph.vertex_number());
    front.set_bit(root as usize);
    let mut stats = vec![];
    let mut sum = 1;
    while sum > 0 {
        sum = 0;
        let (mut active_vertices, mut active_edges) = (0, 0);
        for v in graph.vertices() {
            if !is_unvisited(depth[v as usize]) {
                continue;
            }
            active_vertices += 1;
            for &u in graph.in_neighbors(v) {
                active_edges += 1;
                if front.get_bit(u as usize) {
                    if is_unvisited(depth[v as usize]) {
                        depth[v as usize] = depth[u as usize] + 1;
                        next.set_bit(v as usize);
                        sum += 1;
                    }
                    if early_break {
                        break;
                    }
                }
            }
        }
        stats.push(LevelStat {
            iter: stats.len(),
            active_vertices,
            active_edges,
        });
        front.swap(&mut next);
        next.reset();
    }
    (depth, stats)
}
