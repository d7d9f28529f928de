use derive_more::Display;

#[derive(Debug, Display, PartialEq)]
#[display(
    fmt = "{} {} {} {} {}",
    vertex_number,
    edge_number,
    "if *directed { \"directed\" } else { \"undirected\" }",
    isolated,
    max_out_degree
)]
pub struct GraphInfo {
    vertex_number: usize,
    edge_number: usize,
    directed: bool,
    isolated: usize,
    max_out_degree: usize,
}

impl GraphInfo {
    pub fn new(
        vertex_number: usize,
        edge_number: usize,
        directed: bool,
        isolated: usize,
        max_out_degree: usize,
    ) -> Self {
        Self {
            vertex_number,
            edge_number,
            directed,
            isolated,
            max_out_degree,
        }
    }
}
