//! Structure - global geometry of a chunked index tree.
//!
//! Depths are split into consecutive half-open regions:
//! - null `[0, nullEnd)`: never stored
//! - base `[nullEnd, baseEnd)`: stored contiguously, not chunked
//! - cold `[baseEnd, coldEnd)`: stored in fixed-capacity chunks
//! - sparse `[sparseBegin, ...)`: inside the cold region, where dynamic
//!   chunking (if enabled) grows chunk capacity by one factor per depth.
//!   With dynamic chunking and no explicit sparse depth it begins at the
//!   cold begin.
//!
//! A structure is immutable once built, so lookups are plain arithmetic and
//! can run from any number of threads at once.

use std::ops::Range;
use std::path::Path;

use num_traits::{One, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use crate::core::{ConfigError, Id, Result};
use crate::math::{
    binary_pow, calc_depth, calc_level_index, ceil_log_n, div_mod, factor,
    is_perfect_log_n, log_n, points_at_depth,
};
use crate::structure::{ChunkInfo, StructureConfig};

/// Shallowest allowed base depth end.
pub const MIN_BASE_DEPTH: u64 = 4;

/// Headroom applied to a hint-derived sparse depth, in percent.
pub const SPARSE_DEPTH_BUMP_PERCENT: u64 = 115;

/// Depth region a node falls in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Region {
    Null,
    Base,
    Cold,
    Sparse,
    /// Past the last stored depth.
    OutOfRange,
}

/// Tree geometry and chunking policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StructureConfig", into = "StructureConfig")]
pub struct Structure {
    // Depths
    null_depth_begin: u64,
    null_depth_end: u64,
    base_depth_begin: u64,
    base_depth_end: u64,
    cold_depth_begin: u64,
    cold_depth_end: u64,
    sparse_depth_begin: u64,
    start_depth: u64,

    // Indices
    null_index_begin: Id,
    null_index_end: Id,
    base_index_begin: Id,
    base_index_end: Id,
    cold_index_begin: Id,
    cold_index_end: Id,
    sparse_index_begin: Id,

    // Flags
    tubular: bool,
    dynamic_chunks: bool,
    prefix_ids: bool,
    has_sparse: bool,

    dimensions: u64,
    factor: u64,
    num_points_hint: u64,

    // Chunking
    points_per_chunk: u64,
    nominal_chunk_depth: u64,
    nominal_chunk_index: Id,
    max_chunks_per_depth: Id,
}

impl Structure {
    /// Build and validate a structure from its parameters.
    pub fn new(config: &StructureConfig) -> std::result::Result<Self, ConfigError> {
        let dimensions = config.resolved_dimensions();
        if dimensions != 2 && dimensions != 3 {
            return Err(ConfigError::InvalidDimensions(dimensions));
        }
        let factor = factor(dimensions);

        let null_depth_begin = 0;
        let null_depth_end = config.null_depth;
        let base_depth_begin = null_depth_end;
        let base_depth_end = base_depth_begin.max(config.base_depth);
        let cold_depth_begin = base_depth_end;
        let cold_depth_end = if config.cold_depth != 0 {
            cold_depth_begin.max(config.cold_depth)
        } else {
            0
        };

        if base_depth_end < MIN_BASE_DEPTH {
            return Err(ConfigError::BaseDepthTooSmall { base_depth: base_depth_end });
        }

        let points_per_chunk = config.points_per_chunk;
        let has_cold = cold_depth_end > cold_depth_begin;

        let mut sparse_depth_begin = config.sparse_depth.max(cold_depth_begin);
        let mut has_sparse = config.sparse_depth != 0;

        if config.num_points_hint != 0 && config.sparse_depth == 0 {
            // Switch to dynamic chunks only once a flat layout would hold
            // more nodes than the expected point count.
            let hinted = ceil_log_n(config.num_points_hint, factor).max(cold_depth_begin);
            sparse_depth_begin =
                (hinted * SPARSE_DEPTH_BUMP_PERCENT).div_ceil(100);
            has_sparse = true;

            log::debug!(
                "Derived sparse depth {} from {} point hint",
                sparse_depth_begin,
                config.num_points_hint
            );
        }

        // Dynamic chunks without an explicit sparse depth grow right after
        // the cold begin.
        let dynamic_active = config.dynamic_chunks;
        has_sparse |= dynamic_active;

        if has_cold || dynamic_active {
            if points_per_chunk == 0 {
                return Err(ConfigError::MissingPointsPerChunk);
            }
            if !is_perfect_log_n(points_per_chunk, factor) {
                return Err(ConfigError::InvalidPointsPerChunk { points_per_chunk, factor });
            }
        }

        let nominal_chunk_depth = log_n(points_per_chunk, factor);

        let max_chunks_per_depth = if dynamic_active {
            if sparse_depth_begin < nominal_chunk_depth {
                return Err(ConfigError::SparseDepthTooShallow {
                    sparse_depth: sparse_depth_begin,
                    nominal_depth: nominal_chunk_depth,
                });
            }
            binary_pow(dimensions, sparse_depth_begin - nominal_chunk_depth)
        } else {
            Id::one()
        };

        let null_index_end = calc_level_index(dimensions, null_depth_end);
        let base_index_end = calc_level_index(dimensions, base_depth_end);
        let cold_index_end = if cold_depth_end != 0 {
            calc_level_index(dimensions, cold_depth_end)
        } else {
            Id::zero()
        };

        let structure = Self {
            null_depth_begin,
            null_depth_end,
            base_depth_begin,
            base_depth_end,
            cold_depth_begin,
            cold_depth_end,
            sparse_depth_begin,
            start_depth: config.start_depth,

            null_index_begin: Id::zero(),
            base_index_begin: null_index_end.clone(),
            null_index_end,
            cold_index_begin: base_index_end.clone(),
            base_index_end,
            cold_index_end,
            sparse_index_begin: calc_level_index(dimensions, sparse_depth_begin),

            tubular: config.resolved_tubular(),
            dynamic_chunks: config.dynamic_chunks,
            prefix_ids: config.prefix_ids,
            has_sparse,

            dimensions,
            factor,
            num_points_hint: config.num_points_hint,

            points_per_chunk,
            nominal_chunk_depth,
            nominal_chunk_index: calc_level_index(dimensions, nominal_chunk_depth),
            max_chunks_per_depth,
        };

        log::debug!(
            "Structure: null [{}, {}), base [{}, {}), cold [{}, {}), sparse {}{}, {} points per chunk",
            structure.null_depth_begin,
            structure.null_depth_end,
            structure.base_depth_begin,
            structure.base_depth_end,
            structure.cold_depth_begin,
            structure.cold_depth_end,
            structure.sparse_depth_begin,
            if dynamic_active { " (dynamic)" } else { "" },
            structure.points_per_chunk,
        );

        Ok(structure)
    }

    /// Locate the node at `index`. See [`ChunkInfo::new`] for preconditions.
    pub fn chunk_info(&self, index: &Id) -> ChunkInfo {
        ChunkInfo::new(self, index)
    }

    /// Reconstruct the chunk with sequential number `chunk_num`.
    ///
    /// Inverse of [`ChunkInfo::chunk_num`]: the returned info describes the
    /// first node of that chunk. The structure must have a cold region and
    /// `chunk_num` must map to a depth representable as `u64`.
    pub fn get_info_from_num(&self, chunk_num: &Id) -> ChunkInfo {
        let points_per_chunk = Id::from(self.points_per_chunk);

        let chunk_id = if self.dynamic_chunks_active() {
            // The sparse begin depth itself still uses base-size chunks.
            let end_fixed = calc_level_index(self.dimensions, self.sparse_depth_begin + 1);
            let fixed_num = (end_fixed - &self.cold_index_begin) / &points_per_chunk;

            if chunk_num < &fixed_num {
                &self.cold_index_begin + chunk_num * &points_per_chunk
            } else {
                let leftover = chunk_num - &fixed_num;
                let chunks_per_sparse_depth = &self.max_chunks_per_depth;

                let (depth_offset, chunk_num_in_depth) =
                    div_mod(&leftover, chunks_per_sparse_depth);
                debug_assert!(depth_offset.bits() <= 64, "chunk {} is past u64 depths", chunk_num);
                let depth = (self.sparse_depth_begin + 1)
                    .saturating_add(depth_offset.to_u64().unwrap_or(u64::MAX));

                let depth_index_begin = calc_level_index(self.dimensions, depth);
                let depth_chunk_size =
                    points_at_depth(self.dimensions, depth) / chunks_per_sparse_depth;

                depth_index_begin + chunk_num_in_depth * depth_chunk_size
            }
        } else {
            &self.cold_index_begin + chunk_num * &points_per_chunk
        };

        ChunkInfo::new(self, &chunk_id)
    }

    /// Number of chunks holding the nodes at `depth`.
    ///
    /// Fixed-size depths shallower than the nominal chunk depth share chunks
    /// and report zero.
    pub fn num_chunks_at_depth(&self, depth: u64) -> Id {
        if self.points_per_chunk == 0 {
            return Id::zero();
        }

        if !self.dynamic_chunks_active() || depth <= self.sparse_depth_begin {
            let depth_span = calc_level_index(self.dimensions, depth + 1)
                - calc_level_index(self.dimensions, depth);
            depth_span / self.points_per_chunk
        } else {
            // Capacity and span grow together past the sparse depth.
            points_at_depth(self.dimensions, self.sparse_depth_begin) / self.points_per_chunk
        }
    }

    /// Chunk number of the first node at `depth`.
    ///
    /// `depth` must be at or past the cold depth begin.
    pub fn first_chunk_num_at_depth(&self, depth: u64) -> Id {
        let index = calc_level_index(self.dimensions, depth);
        self.chunk_info(&index).chunk_num().clone()
    }

    /// Chunk numbers holding any node at `depth`, as a half-open range.
    ///
    /// Unlike [`Self::num_chunks_at_depth`] this also counts chunks shared
    /// with the neighbouring depths. `depth` must be at or past the cold
    /// depth begin.
    pub fn chunk_range_at_depth(&self, depth: u64) -> Range<Id> {
        let first = calc_level_index(self.dimensions, depth);
        let last = calc_level_index(self.dimensions, depth + 1) - 1u32;

        let begin = self.chunk_info(&first).chunk_num().clone();
        let end = self.chunk_info(&last).chunk_num() + 1u32;
        begin..end
    }

    /// True if the chunks at `depth` hold nodes of that depth only.
    ///
    /// Fixed chunks cross depth boundaries when the cold region begins
    /// shallower than the nominal chunk depth. `depth` must be at or past
    /// the cold depth begin.
    pub fn is_depth_aligned(&self, depth: u64) -> bool {
        self.chunk_info(&calc_level_index(self.dimensions, depth)).is_chunk_start()
            && self.chunk_info(&calc_level_index(self.dimensions, depth + 1)).is_chunk_start()
    }

    // --- Classification ---

    /// Region containing `depth`.
    pub fn region_of_depth(&self, depth: u64) -> Region {
        if depth < self.null_depth_end {
            Region::Null
        } else if depth < self.base_depth_end {
            Region::Base
        } else if self.has_cold() && depth < self.cold_depth_end {
            if self.has_sparse && depth >= self.sparse_depth_begin {
                Region::Sparse
            } else {
                Region::Cold
            }
        } else {
            Region::OutOfRange
        }
    }

    /// Region containing the node at `index`.
    pub fn region_of_index(&self, index: &Id) -> Region {
        self.region_of_depth(calc_depth(self.factor, index))
    }

    /// True if nodes at `depth` are stored anywhere: the base, cold or sparse
    /// regions. Without a cold region nothing past the base end is stored.
    pub fn in_range(&self, depth: u64) -> bool {
        !matches!(self.region_of_depth(depth), Region::Null | Region::OutOfRange)
    }

    pub fn is_within_null(&self, index: &Id) -> bool {
        index >= &self.null_index_begin && index < &self.null_index_end
    }

    pub fn is_within_base(&self, index: &Id) -> bool {
        index >= &self.base_index_begin && index < &self.base_index_end
    }

    pub fn is_within_cold(&self, index: &Id) -> bool {
        self.has_cold() && index >= &self.cold_index_begin && index < &self.cold_index_end
    }

    // --- Serialization ---

    /// Parameters that rebuild this structure.
    pub fn to_config(&self) -> StructureConfig {
        StructureConfig {
            null_depth: self.null_depth_end,
            base_depth: self.base_depth_end,
            cold_depth: self.cold_depth_end,
            points_per_chunk: self.points_per_chunk,
            dimensions: Some(self.dimensions),
            num_points_hint: self.num_points_hint,
            tubular: Some(self.tubular),
            dynamic_chunks: self.dynamic_chunks,
            prefix_ids: self.prefix_ids,
            sparse_depth: if self.has_sparse { self.sparse_depth_begin } else { 0 },
            start_depth: self.start_depth,
            tree_type: None,
        }
    }

    /// Build from a parameter document.
    pub fn from_config(config: StructureConfig) -> Result<Self> {
        Ok(Self::new(&config)?)
    }

    /// Configuration document as JSON.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self.to_config())?)
    }

    /// Configuration document as a JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_config())?)
    }

    /// Build from a JSON configuration document.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        Self::from_config(StructureConfig::deserialize(json)?)
    }

    /// Build from a JSON configuration string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_config(serde_json::from_str(json)?)
    }

    /// Load a configuration document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_config(StructureConfig::load(path)?)
    }

    /// Write the configuration document to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        Ok(self.to_config().save(path)?)
    }

    // --- Accessors ---

    pub fn null_depth_begin(&self) -> u64 { self.null_depth_begin }
    pub fn null_depth_end(&self) -> u64 { self.null_depth_end }
    pub fn base_depth_begin(&self) -> u64 { self.base_depth_begin }
    pub fn base_depth_end(&self) -> u64 { self.base_depth_end }
    pub fn cold_depth_begin(&self) -> u64 { self.cold_depth_begin }
    pub fn cold_depth_end(&self) -> u64 { self.cold_depth_end }
    pub fn sparse_depth_begin(&self) -> u64 { self.sparse_depth_begin }
    pub fn start_depth(&self) -> u64 { self.start_depth }

    pub fn null_index_begin(&self) -> &Id { &self.null_index_begin }
    pub fn null_index_end(&self) -> &Id { &self.null_index_end }
    pub fn base_index_begin(&self) -> &Id { &self.base_index_begin }
    pub fn base_index_end(&self) -> &Id { &self.base_index_end }
    pub fn cold_index_begin(&self) -> &Id { &self.cold_index_begin }
    pub fn cold_index_end(&self) -> &Id { &self.cold_index_end }
    pub fn sparse_index_begin(&self) -> &Id { &self.sparse_index_begin }

    pub fn has_null(&self) -> bool { self.null_depth_end > self.null_depth_begin }
    pub fn has_base(&self) -> bool { self.base_depth_end > self.base_depth_begin }
    pub fn has_cold(&self) -> bool { self.cold_depth_end > self.cold_depth_begin }
    pub fn has_sparse(&self) -> bool { self.has_sparse }

    pub fn tubular(&self) -> bool { self.tubular }
    pub fn dynamic_chunks(&self) -> bool { self.dynamic_chunks }
    pub fn prefix_ids(&self) -> bool { self.prefix_ids }

    /// True when chunk capacity grows past the sparse depth.
    pub fn dynamic_chunks_active(&self) -> bool {
        self.dynamic_chunks
    }

    pub fn dimensions(&self) -> u64 { self.dimensions }
    pub fn factor(&self) -> u64 { self.factor }
    pub fn num_points_hint(&self) -> u64 { self.num_points_hint }
    pub fn base_points_per_chunk(&self) -> u64 { self.points_per_chunk }

    /// Depth whose node count equals one base chunk.
    pub fn nominal_chunk_depth(&self) -> u64 { self.nominal_chunk_depth }
    pub fn nominal_chunk_index(&self) -> &Id { &self.nominal_chunk_index }

    /// Chunks per depth in the dynamic sparse region.
    pub fn max_chunks_per_depth(&self) -> &Id { &self.max_chunks_per_depth }
}

impl TryFrom<StructureConfig> for Structure {
    type Error = ConfigError;

    fn try_from(config: StructureConfig) -> std::result::Result<Self, Self::Error> {
        Self::new(&config)
    }
}

impl From<Structure> for StructureConfig {
    fn from(structure: Structure) -> Self {
        structure.to_config()
    }
}
