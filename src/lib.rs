//! CSR graph layouts and the simulated cacheline cost of breadth-first
//! search over them.

pub mod bfs;
pub mod bitmap;
pub mod error;
pub mod experiment;
pub mod graph;
pub mod memory;
pub mod record;
pub mod types;

pub use error::{Error, Result};
