//! The CSR graph.

pub use builder::{build_csr_from_edges, parse_edge_list, Builder, EdgeList};
pub use info::GraphInfo;
pub use transform::{reorder_by_degree, simplify_graph, squeeze_graph};
pub use view::GraphView;

use crate::types::VId;
use itertools::Itertools;
use std::io::Write;

mod builder;
mod info;
mod transform;
mod view;

/// One adjacency direction: a row-offset array of length `V + 1` and the
/// flattened neighbor array it indexes.
#[derive(Debug, Default)]
pub(crate) struct Csr {
    offset: Vec<usize>,
    neigh: Vec<VId>,
}

impl Csr {
    fn new(vertex_number: usize, offset: Vec<usize>, neigh: Vec<VId>) -> Self {
        assert_eq!(offset.len(), vertex_number + 1, "offset length mismatch");
        assert_eq!(offset[vertex_number], neigh.len(), "neighbor length mismatch");
        Self { offset, neigh }
    }

    fn empty(vertex_number: usize) -> Self {
        Self {
            offset: vec![0; vertex_number + 1],
            neigh: vec![],
        }
    }

    #[inline]
    fn degree(&self, v: VId) -> usize {
        let v = v as usize;
        self.offset[v + 1] - self.offset[v]
    }

    #[inline]
    fn neighbors(&self, v: VId) -> &[VId] {
        let v = v as usize;
        &self.neigh[self.offset[v]..self.offset[v + 1]]
    }

    fn entries(&self) -> usize {
        self.neigh.len()
    }

    fn rows_mut(&mut self) -> Vec<&mut [VId]> {
        split_rows_mut(&self.offset, &mut self.neigh)
    }

    fn validate(&self, vertex_number: usize, name: &str) {
        assert_eq!(self.offset.len(), vertex_number + 1, "{}_offset length", name);
        assert_eq!(self.offset[0], 0, "{}_offset[0] must be 0", name);
        assert_eq!(
            self.offset[vertex_number],
            self.neigh.len(),
            "{}_offset[V] must equal the number of entries",
            name
        );
        assert!(
            self.offset.iter().tuple_windows().all(|(a, b)| a <= b),
            "{}_offset must be non-decreasing",
            name
        );
        for v in 0..vertex_number {
            let row = self.neighbors(v as VId);
            assert!(
                row.iter().all(|&n| n >= 0 && (n as usize) < vertex_number),
                "{}_neigh of {} holds an out-of-range id",
                name,
                v
            );
            assert!(
                row.iter().tuple_windows().all(|(a, b)| a <= b),
                "{}_neigh of {} is not sorted",
                name,
                v
            );
        }
    }
}

#[derive(Debug)]
enum Adjacency {
    /// Reverse adjacency is the forward adjacency.
    Undirected(Csr),
    Directed { out: Csr, inc: Csr },
}

/// An immutable compressed-sparse-row graph.
///
/// The graph owns its arrays and is move-only. An undirected graph keeps a
/// single adjacency shared by both directions, so `in_neighbors` and
/// `out_neighbors` read the same rows.
#[derive(Debug)]
pub struct Graph {
    vertex_number: usize,
    edge_number: usize,
    adj: Adjacency,
}

impl Default for Graph {
    fn default() -> Self {
        Self {
            vertex_number: 0,
            edge_number: 0,
            adj: Adjacency::Undirected(Csr::empty(0)),
        }
    }
}

impl Graph {
    /// Creates an undirected graph whose reverse adjacency aliases the
    /// forward one. `edge_number` is half the number of stored entries.
    pub fn undirected(vertex_number: usize, out_offset: Vec<usize>, out_neigh: Vec<VId>) -> Self {
        let out = Csr::new(vertex_number, out_offset, out_neigh);
        Self {
            vertex_number,
            edge_number: out.entries() / 2,
            adj: Adjacency::Undirected(out),
        }
    }

    /// Creates a directed graph with distinct forward and reverse adjacency.
    pub fn directed(
        vertex_number: usize,
        out_offset: Vec<usize>,
        out_neigh: Vec<VId>,
        in_offset: Vec<usize>,
        in_neigh: Vec<VId>,
    ) -> Self {
        let out = Csr::new(vertex_number, out_offset, out_neigh);
        let inc = Csr::new(vertex_number, in_offset, in_neigh);
        assert_eq!(
            out.entries(),
            inc.entries(),
            "directed graph has mismatched in/out entry counts"
        );
        Self {
            vertex_number,
            edge_number: out.entries(),
            adj: Adjacency::Directed { out, inc },
        }
    }

    pub fn vertex_number(&self) -> usize {
        self.vertex_number
    }

    pub fn edge_number(&self) -> usize {
        self.edge_number
    }

    pub fn is_directed(&self) -> bool {
        matches!(self.adj, Adjacency::Directed { .. })
    }

    fn out_csr(&self) -> &Csr {
        match &self.adj {
            Adjacency::Undirected(out) => out,
            Adjacency::Directed { out, .. } => out,
        }
    }

    fn in_csr(&self) -> &Csr {
        match &self.adj {
            Adjacency::Undirected(out) => out,
            Adjacency::Directed { inc, .. } => inc,
        }
    }

    #[inline]
    pub fn out_degree(&self, v: VId) -> usize {
        self.out_csr().degree(v)
    }

    #[inline]
    pub fn in_degree(&self, v: VId) -> usize {
        self.in_csr().degree(v)
    }

    /// Out-neighbors of `v` in ascending order.
    #[inline]
    pub fn out_neighbors(&self, v: VId) -> &[VId] {
        self.out_csr().neighbors(v)
    }

    /// In-neighbors of `v` in ascending order.
    #[inline]
    pub fn in_neighbors(&self, v: VId) -> &[VId] {
        self.in_csr().neighbors(v)
    }

    pub fn out_offsets(&self) -> &[usize] {
        &self.out_csr().offset
    }

    pub fn in_offsets(&self) -> &[usize] {
        &self.in_csr().offset
    }

    /// Number of stored forward entries.
    pub fn out_entries(&self) -> usize {
        self.out_csr().entries()
    }

    pub fn in_entries(&self) -> usize {
        self.in_csr().entries()
    }

    pub fn vertices(&self) -> impl Iterator<Item = VId> {
        0..self.vertex_number as VId
    }

    pub fn is_isolated(&self, v: VId) -> bool {
        self.out_degree(v) == 0 && self.in_degree(v) == 0
    }

    pub fn non_isolated_count(&self) -> usize {
        self.vertices().filter(|&v| !self.is_isolated(v)).count()
    }

    /// Hands out every neighbor row for in-place mutation: the forward rows
    /// and, for a directed graph, the reverse rows. Row boundaries stay
    /// fixed, so callers that need to shrink a row must rebuild the graph.
    pub fn rows_mut(&mut self) -> (Vec<&mut [VId]>, Option<Vec<&mut [VId]>>) {
        match &mut self.adj {
            Adjacency::Undirected(out) => (out.rows_mut(), None),
            Adjacency::Directed { out, inc } => (out.rows_mut(), Some(inc.rows_mut())),
        }
    }

    /// Panics unless both adjacency halves are well-formed CSR arrays.
    pub fn validate(&self) {
        self.out_csr().validate(self.vertex_number, "out");
        if let Adjacency::Directed { out, inc } = &self.adj {
            inc.validate(self.vertex_number, "in");
            assert_eq!(out.entries(), inc.entries(), "in/out entry counts differ");
            assert_eq!(self.edge_number, out.entries());
        } else {
            assert_eq!(self.edge_number, self.out_entries() / 2);
        }
    }

    pub fn info(&self) -> GraphInfo {
        GraphInfo::new(
            self.vertex_number,
            self.edge_number,
            self.is_directed(),
            self.vertex_number - self.non_isolated_count(),
            self.vertices().map(|v| self.out_degree(v)).max().unwrap_or(0),
        )
    }

    pub fn view(&self) -> GraphView {
        GraphView::new(
            self.vertex_number,
            self.is_directed(),
            self.vertices()
                .flat_map(|u| self.out_neighbors(u).iter().map(move |&v| (u, v)))
                .collect(),
        )
    }

    /// Writes every forward entry as a `u v` line.
    pub fn write_edge_list<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        for u in self.vertices() {
            for &v in self.out_neighbors(u) {
                writeln!(out, "{} {}", u, v)?;
            }
        }
        out.flush()
    }
}

/// Exclusive prefix sum of `degrees`, followed by the total.
pub(crate) fn prefix_sum<I: IntoIterator<Item = usize>>(degrees: I) -> Vec<usize> {
    let degrees = degrees.into_iter();
    let mut offset = Vec::with_capacity(degrees.size_hint().0 + 1);
    let mut curr = 0;
    offset.push(curr);
    for degree in degrees {
        curr += degree;
        offset.push(curr);
    }
    offset
}

/// Splits `neigh` into the disjoint rows delimited by `offset`.
pub(crate) fn split_rows_mut<'a>(offset: &[usize], mut neigh: &'a mut [VId]) -> Vec<&'a mut [VId]> {
    let mut rows = Vec::with_capacity(offset.len().saturating_sub(1));
    for (beg, end) in offset.iter().tuple_windows() {
        let (row, rest) = std::mem::take(&mut neigh).split_at_mut(end - beg);
        rows.push(row);
        neigh = rest;
    }
    rows
}
