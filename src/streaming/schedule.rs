//! Per-depth chunk enumeration.
//!
//! Exporters walk the index one depth at a time and hand each chunk to a
//! worker. Chunks are identified by their sequential number, so a depth is
//! just the range `[first_chunk_num_at_depth(d), + num_chunks_at_depth(d))`.
//! That only holds for depths whose chunks start and end on the depth's
//! boundaries; enumerating any other depth is an error.
//!
//! All functions take the structure by reference. Callers that want a
//! bounded pool wrap the call in `rayon::ThreadPool::install`.

use std::ops::Range;

use num_traits::ToPrimitive;
use rayon::prelude::*;

use crate::core::{Error, Id, Result};
use crate::math::calc_level_index;
use crate::structure::{ChunkInfo, Region, Structure};

/// Chunk summary for one depth.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepthLayout {
    pub depth: u64,
    pub region: Region,
    /// Sequential number of the first chunk at this depth.
    pub first_chunk_num: Id,
    /// Chunks holding any node at this depth, shared ones included.
    pub num_chunks: Id,
    pub points_per_chunk: Id,
    /// True if a chunk here also holds nodes of a neighbouring depth.
    pub shared: bool,
}

/// Sequential iterator over the chunks at one depth.
pub struct DepthChunks<'a> {
    structure: &'a Structure,
    next: Id,
    end: Id,
}

impl Iterator for DepthChunks<'_> {
    type Item = ChunkInfo;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let info = self.structure.get_info_from_num(&self.next);
        self.next += 1u32;
        Some(info)
    }
}

/// Iterate the chunks holding the nodes at `depth`, in chunk number order.
///
/// Fails unless `depth` is chunked and aligned to chunk boundaries.
pub fn chunks_at_depth(structure: &Structure, depth: u64) -> Result<DepthChunks<'_>> {
    check_depth(structure, depth)?;
    let next = structure.first_chunk_num_at_depth(depth);
    let end = &next + structure.num_chunks_at_depth(depth);
    Ok(DepthChunks { structure, next, end })
}

fn check_depth(structure: &Structure, depth: u64) -> Result<()> {
    if !structure.has_cold() {
        return Err(Error::Streaming("structure has no cold region".to_string()));
    }
    if depth < structure.cold_depth_begin() {
        return Err(Error::Streaming(format!(
            "depth {} is above the cold depth begin {}",
            depth,
            structure.cold_depth_begin()
        )));
    }
    if !structure.is_depth_aligned(depth) {
        return Err(Error::Streaming(format!(
            "depth {} shares chunks with neighbouring depths",
            depth
        )));
    }
    Ok(())
}

/// Chunk count at `depth` as a machine-sized work range.
fn depth_range(structure: &Structure, depth: u64) -> Result<(Id, u64)> {
    check_depth(structure, depth)?;
    let num_chunks = structure.num_chunks_at_depth(depth);
    let count = num_chunks.to_u64().ok_or_else(|| {
        Error::Streaming(format!("{} chunks at depth {} exceed u64", num_chunks, depth))
    })?;
    Ok((structure.first_chunk_num_at_depth(depth), count))
}

/// Run `f` on every chunk at `depth` in parallel.
pub fn par_for_each_chunk<F>(structure: &Structure, depth: u64, f: F) -> Result<()>
where
    F: Fn(ChunkInfo) + Sync + Send,
{
    let (first, count) = depth_range(structure, depth)?;
    log::debug!("Visiting {} chunks at depth {}", count, depth);

    (0..count).into_par_iter().for_each(|i| {
        f(structure.get_info_from_num(&(&first + i)));
    });

    Ok(())
}

/// Map every chunk at `depth` in parallel, keeping chunk number order.
pub fn par_map_chunks<T, F>(structure: &Structure, depth: u64, f: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(ChunkInfo) -> T + Sync + Send,
{
    let (first, count) = depth_range(structure, depth)?;
    log::debug!("Mapping {} chunks at depth {}", count, depth);

    Ok((0..count)
        .into_par_iter()
        .map(|i| f(structure.get_info_from_num(&(&first + i))))
        .collect())
}

/// Chunk layout of every chunked depth in `depths`.
///
/// Depths above the cold region are skipped since they are not chunked.
pub fn depth_layout(structure: &Structure, depths: Range<u64>) -> Vec<DepthLayout> {
    if !structure.has_cold() {
        return Vec::new();
    }

    depths
        .filter(|&depth| depth >= structure.cold_depth_begin())
        .map(|depth| {
            let first = structure.chunk_info(&calc_level_index(structure.dimensions(), depth));
            let range = structure.chunk_range_at_depth(depth);
            log::trace!("Depth {}: chunks [{}, {})", depth, range.start, range.end);

            DepthLayout {
                depth,
                region: structure.region_of_depth(depth),
                num_chunks: &range.end - &range.start,
                first_chunk_num: range.start,
                points_per_chunk: first.points_per_chunk().clone(),
                shared: !structure.is_depth_aligned(depth),
            }
        })
        .collect()
}
