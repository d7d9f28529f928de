use crate::types::VId;

/// A structural snapshot of a graph: every forward entry in row order.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct GraphView {
    vertex_number: usize,
    directed: bool,
    edges: Vec<(VId, VId)>,
}

impl GraphView {
    pub fn new(vertex_number: usize, directed: bool, edges: Vec<(VId, VId)>) -> Self {
        Self {
            vertex_number,
            directed,
            edges,
        }
    }
}
