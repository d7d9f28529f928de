use super::{prefix_sum, split_rows_mut, Graph};
use crate::{
    error::{Error, Result},
    types::VId,
};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    sync::atomic::{AtomicI32, AtomicUsize, Ordering},
};

/// Ordered `(source, destination)` pairs.
pub type EdgeList = Vec<(VId, VId)>;

/// Builds a [`Graph`] from a whitespace-separated edge-list file.
///
/// Every non-comment line holds `u v`, read as the arc `u -> v`. Lines
/// starting with `#` and blank lines are skipped. With `symmetric` set,
/// every arc with `u != v` is also inserted as `v -> u` and the result is
/// an undirected graph. A malformed line aborts the read unless
/// `skip_malformed` is set, in which case it is logged and dropped.
pub struct Builder {
    graph_file: PathBuf,
    symmetric: bool,
    skip_malformed: bool,
}

impl Builder {
    pub fn new<P: AsRef<Path>>(graph_file: P) -> Self {
        Self {
            graph_file: graph_file.as_ref().to_path_buf(),
            symmetric: false,
            skip_malformed: false,
        }
    }

    pub fn symmetric(mut self, symmetric: bool) -> Self {
        self.symmetric = symmetric;
        self
    }

    pub fn skip_malformed(mut self, skip_malformed: bool) -> Self {
        self.skip_malformed = skip_malformed;
        self
    }

    pub fn read_edge_list(&self) -> Result<EdgeList> {
        info!("reading {}...", self.graph_file.display());
        let file = File::open(&self.graph_file)?;
        let el = parse_edge_list(BufReader::new(file), self.symmetric, self.skip_malformed)?;
        info!("read {} entries", el.len());
        Ok(el)
    }

    pub fn build_csr(&self) -> Result<Graph> {
        let el = self.read_edge_list()?;
        Ok(build_csr_from_edges(&el, self.symmetric))
    }
}

/// Parses an edge list. The first malformed line is an [`Error::Parse`],
/// or with `skip_malformed` a warning, and parsing goes on.
pub fn parse_edge_list<R: BufRead>(
    reader: R,
    symmetric: bool,
    skip_malformed: bool,
) -> Result<EdgeList> {
    let mut el = EdgeList::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let (u, v) = match parse_edge(trimmed) {
            Some(edge) => edge,
            None if skip_malformed => {
                warn!("line {}: skipping malformed edge {:?}", i + 1, line);
                continue;
            }
            None => {
                return Err(Error::Parse {
                    line: i + 1,
                    content: line,
                })
            }
        };
        el.push((u, v));
        if symmetric && u != v {
            el.push((v, u));
        }
    }
    Ok(el)
}

fn parse_edge(line: &str) -> Option<(VId, VId)> {
    let mut tokens = line.split_whitespace();
    let u: VId = tokens.next()?.parse().ok()?;
    let v: VId = tokens.next()?.parse().ok()?;
    if u < 0 || v < 0 {
        None
    } else {
        Some((u, v))
    }
}

/// Builds a graph from `el` with two counting-sort passes per direction.
///
/// `vertex_number` is one past the largest endpoint. With `symmetric` the
/// list is expected to already hold both directions of every edge, and the
/// reverse adjacency aliases the forward one.
pub fn build_csr_from_edges(el: &[(VId, VId)], symmetric: bool) -> Graph {
    let vertex_number = el
        .par_iter()
        .map(|&(u, v)| u.max(v) as usize + 1)
        .max()
        .unwrap_or(0);
    debug!("vertex_number={}", vertex_number);
    let (out_offset, out_neigh) = count_sort(el, vertex_number, |&(u, v)| (u, v));
    if symmetric {
        return Graph::undirected(vertex_number, out_offset, out_neigh);
    }
    let (in_offset, in_neigh) = count_sort(el, vertex_number, |&(u, v)| (v, u));
    Graph::directed(vertex_number, out_offset, out_neigh, in_offset, in_neigh)
}

/// Groups `el` by `key(e).0`, storing `key(e).1` in every row, rows sorted.
fn count_sort<F>(el: &[(VId, VId)], vertex_number: usize, key: F) -> (Vec<usize>, Vec<VId>)
where
    F: Fn(&(VId, VId)) -> (VId, VId) + Sync,
{
    info!("counting degrees...");
    let degrees: Vec<AtomicUsize> = (0..vertex_number).map(|_| AtomicUsize::new(0)).collect();
    el.par_iter().for_each(|e| {
        degrees[key(e).0 as usize].fetch_add(1, Ordering::Relaxed);
    });
    let offset = prefix_sum(degrees.into_iter().map(AtomicUsize::into_inner));
    info!("scattering...");
    let cursor: Vec<AtomicUsize> = offset[..vertex_number]
        .iter()
        .map(|&pos| AtomicUsize::new(pos))
        .collect();
    let neigh: Vec<AtomicI32> = (0..offset[vertex_number])
        .map(|_| AtomicI32::new(0))
        .collect();
    el.par_iter().for_each(|e| {
        let (src, dst) = key(e);
        let pos = cursor[src as usize].fetch_add(1, Ordering::Relaxed);
        neigh[pos].store(dst, Ordering::Relaxed);
    });
    let mut neigh: Vec<VId> = neigh.into_iter().map(AtomicI32::into_inner).collect();
    info!("sorting neighbors...");
    split_rows_mut(&offset, &mut neigh)
        .into_par_iter()
        .for_each(|row| row.sort_unstable());
    (offset, neigh)
}
