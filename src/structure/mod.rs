//! Chunked tree geometry and node addressing

pub mod config;
pub mod chunk_info;
#[allow(clippy::module_inception)]
pub mod structure;

pub use config::StructureConfig;
pub use chunk_info::ChunkInfo;
pub use structure::{Region, Structure, MIN_BASE_DEPTH, SPARSE_DEPTH_BUMP_PERCENT};
