//! Per-vertex counter records.
//!
//! A record is a flat dump of native-endian `f64`, one per vertex, with no
//! header. Readers must know the vertex count.

use memmap::{Mmap, MmapMut};
use std::{
    fs::{File, OpenOptions},
    io::{Error, ErrorKind, Result},
    mem::size_of,
    path::{Path, PathBuf},
};

/// `<dir>/<graph_name>-<task>.bin`
pub fn record_path<P: AsRef<Path>>(dir: P, graph_name: &str, task: &str) -> PathBuf {
    dir.as_ref().join(format!("{}-{}.bin", graph_name, task))
}

fn as_f64_slice(mmap: &Mmap, len: usize) -> &[f64] {
    unsafe { std::slice::from_raw_parts(mmap.as_ptr() as *const f64, len) }
}

fn as_f64_slice_mut(mmap: &mut MmapMut, len: usize) -> &mut [f64] {
    unsafe { std::slice::from_raw_parts_mut(mmap.as_mut_ptr() as *mut f64, len) }
}

fn byte_len(len: usize) -> u64 {
    (len * size_of::<f64>()) as u64
}

/// Folds `values` into the record at `path`.
///
/// A missing record is created holding `values`. Otherwise every stored
/// counter `x` is replaced by `op(x, value)` in place.
pub fn reduce_backup<P, F>(values: &[f64], path: P, op: F) -> Result<()>
where
    P: AsRef<Path>,
    F: Fn(f64, f64) -> f64,
{
    let path = path.as_ref();
    let exists = path.exists();
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(path)?;
    if exists {
        let len = file.metadata()?.len();
        if len != byte_len(values.len()) {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!(
                    "{} holds {} bytes, expected {}",
                    path.display(),
                    len,
                    byte_len(values.len())
                ),
            ));
        }
    } else {
        file.set_len(byte_len(values.len()))?;
    }
    if values.is_empty() {
        return Ok(());
    }
    let mut mmap = unsafe { MmapMut::map_mut(&file)? };
    let stored = as_f64_slice_mut(&mut mmap, values.len());
    if exists {
        for (x, &value) in stored.iter_mut().zip(values) {
            *x = op(*x, value);
        }
    } else {
        stored.copy_from_slice(values);
    }
    mmap.flush()
}

/// Reads the first `vertex_number` counters of the record at `path`.
pub fn load_record<P: AsRef<Path>>(path: P, vertex_number: usize) -> Result<Vec<f64>> {
    let file = File::open(path.as_ref())?;
    if file.metadata()?.len() < byte_len(vertex_number) {
        return Err(Error::new(
            ErrorKind::UnexpectedEof,
            format!(
                "{} holds fewer than {} counters",
                path.as_ref().display(),
                vertex_number
            ),
        ));
    }
    if vertex_number == 0 {
        return Ok(vec![]);
    }
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(as_f64_slice(&mmap, vertex_number).to_vec())
}

/// Sum of `values` averaged over all `V * V` (root, vertex) pairs.
pub fn average(values: &[f64], vertex_number: usize) -> f64 {
    let sum: f64 = values.iter().sum();
    sum / (vertex_number as f64 * vertex_number as f64)
}
