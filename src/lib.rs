//! Cloudtile - chunk addressing for hierarchical point cloud indexes

pub mod core;
pub mod math;
pub mod structure;
pub mod streaming;

pub use crate::core::{ConfigError, Error, Id, Result};
pub use crate::structure::{ChunkInfo, Region, Structure, StructureConfig};
