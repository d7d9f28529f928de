//! A cacheline simulator over the in-edges of a graph.
//!
//! The simulated memory holds two regions of edge records:
//!
//! ```text
//! +--------------------------------+---------------------------------+
//! | region 1: first in-edge of v   | region 2: overflow in-edges     |
//! | one slot per vertex            | in_degree(v) - 1 slots per v    |
//! +--------------------------------+---------------------------------+
//! ^ mem_block_1_st                 ^ mem_block_2_st (line aligned)
//! ```
//!
//! Every access touches one record. The first touch of a cacheline costs a
//! full line fetch; later touches hit until [`Memory::reset`].

use crate::{bitmap::Bitmap, graph::Graph, types::VId};
use std::ops::Range;

/// Number of edge records per cacheline.
pub const CACHELINE_EDGE_NUM: usize = 16;

/// Cost of fetching a cold cacheline.
pub const MISS_COST: u64 = CACHELINE_EDGE_NUM as u64;

/// Rounds `sz` up to a multiple of `align`. An empty region still takes one
/// unit.
pub const fn get_aligned_size(sz: usize, align: usize) -> usize {
    if sz == 0 {
        align
    } else {
        ((sz - 1) / align + 1) * align
    }
}

/// Placement of the first in-edge slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Region 1 is indexed by vertex id.
    Plain,
    /// Region 1 skips vertices without in-edges.
    SkipIsolated,
}

impl Default for Layout {
    fn default() -> Self {
        Layout::Plain
    }
}

/// Cost charged for an access that hits a warm cacheline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitCost {
    Zero,
    One,
}

impl HitCost {
    pub fn cost(self) -> u64 {
        match self {
            HitCost::Zero => 0,
            HitCost::One => 1,
        }
    }
}

impl Default for HitCost {
    fn default() -> Self {
        HitCost::Zero
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryConfig {
    pub layout: Layout,
    pub hit_cost: HitCost,
}

fn region_sizes(graph: &Graph, layout: Layout) -> (usize, usize) {
    let first = match layout {
        Layout::Plain => graph.vertex_number(),
        Layout::SkipIsolated => graph
            .vertices()
            .filter(|&v| graph.in_degree(v) > 0)
            .count(),
    };
    let overflow = graph
        .vertices()
        .map(|v| graph.in_degree(v).saturating_sub(1))
        .sum();
    (first, overflow)
}

/// Number of records the simulated memory spans for `graph`.
pub fn cal_mem_size(graph: &Graph, layout: Layout) -> usize {
    let (first, overflow) = region_sizes(graph, layout);
    get_aligned_size(first, CACHELINE_EDGE_NUM) + get_aligned_size(overflow, CACHELINE_EDGE_NUM)
}

/// A single-level, fully associative cache with no eviction.
pub struct Memory {
    bmp: Bitmap,
    /// Base of each vertex's overflow in-edges within region 2.
    accum_edge_off: Vec<usize>,
    /// Vertices without in-edges before each vertex, for `Layout::SkipIsolated`.
    accum_iso_v_num: Option<Vec<usize>>,
    mem_block_1_st: usize,
    mem_block_2_st: usize,
    mem_size: usize,
    hit_cost: u64,
}

impl Memory {
    pub fn new(graph: &Graph) -> Self {
        Self::with_config(graph, MemoryConfig::default())
    }

    pub fn with_config(graph: &Graph, config: MemoryConfig) -> Self {
        let (first, _) = region_sizes(graph, config.layout);
        let mem_size = cal_mem_size(graph, config.layout);
        let mut accum = 0;
        let accum_edge_off = graph
            .vertices()
            .map(|v| {
                let base = accum;
                accum += graph.in_degree(v).saturating_sub(1);
                base
            })
            .collect();
        let accum_iso_v_num = match config.layout {
            Layout::Plain => None,
            Layout::SkipIsolated => {
                let mut iso = 0;
                Some(
                    graph
                        .vertices()
                        .map(|v| {
                            let before = iso;
                            if graph.in_degree(v) == 0 {
                                iso += 1;
                            }
                            before
                        })
                        .collect(),
                )
            }
        };
        Self {
            bmp: Bitmap::new(mem_size / CACHELINE_EDGE_NUM),
            accum_edge_off,
            accum_iso_v_num,
            mem_block_1_st: 0,
            mem_block_2_st: get_aligned_size(first, CACHELINE_EDGE_NUM),
            mem_size,
            hit_cost: config.hit_cost.cost(),
        }
    }

    /// The simulated address of the `offset`-th in-edge of `vid`.
    #[inline]
    pub fn get_addr(&self, vid: VId, offset: usize) -> usize {
        let v = vid as usize;
        if offset == 0 {
            let skipped = self.accum_iso_v_num.as_ref().map_or(0, |iso| iso[v]);
            self.mem_block_1_st + v - skipped
        } else {
            self.mem_block_2_st + self.accum_edge_off[v] + offset - 1
        }
    }

    /// Touches the `offset`-th in-edge of `vid` and returns its cost:
    /// [`MISS_COST`] if its cacheline was cold, the hit cost otherwise.
    #[inline]
    pub fn access(&mut self, vid: VId, offset: usize) -> u64 {
        let cacheline_id = self.get_addr(vid, offset) / CACHELINE_EDGE_NUM;
        if self.bmp.test_and_set(cacheline_id) {
            self.hit_cost
        } else {
            MISS_COST
        }
    }

    /// Evicts every cacheline.
    pub fn reset(&mut self) {
        self.bmp.reset();
    }

    pub fn cacheline_number(&self) -> usize {
        self.bmp.len()
    }

    /// Address ranges of region 1 and region 2.
    pub fn region_bounds(&self) -> (Range<usize>, Range<usize>) {
        (
            self.mem_block_1_st..self.mem_block_2_st,
            self.mem_block_2_st..self.mem_size,
        )
    }

    /// Walks the in-edges of `graph` in layout order and asserts that every
    /// address agrees with [`Memory::get_addr`].
    pub fn check(&self, graph: &Graph) {
        let (mut next_1, mut next_2) = (self.mem_block_1_st, self.mem_block_2_st);
        for v in graph.vertices() {
            let in_degree = graph.in_degree(v);
            if in_degree > 0 || self.accum_iso_v_num.is_none() {
                if in_degree > 0 {
                    assert_eq!(self.get_addr(v, 0), next_1, "region 1 address of {}", v);
                }
                next_1 += 1;
            }
            for offset in 1..in_degree {
                assert_eq!(
                    self.get_addr(v, offset),
                    next_2,
                    "region 2 address of ({}, {})",
                    v,
                    offset
                );
                next_2 += 1;
            }
        }
        assert!(next_1 <= self.mem_block_2_st, "region 1 overflows");
        assert!(next_2 <= self.mem_size, "region 2 overflows");
    }
}
