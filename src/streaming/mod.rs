//! Chunk enumeration for parallel tile export

pub mod schedule;

pub use schedule::{
    DepthChunks, DepthLayout,
    chunks_at_depth, depth_layout,
    par_for_each_chunk, par_map_chunks,
};
