//! Structure parameter document.
//!
//! Only the parameters are persisted, never derived geometry. Reloading a
//! document yields the same [`Structure`](super::Structure) that wrote it,
//! which is what lets an index be reopened against its on-disk hierarchy.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Tree shape names accepted in place of an explicit `dimensions`.
const OCTREE_TYPE: &str = "octree";
const HYBRID_TYPE: &str = "hybrid";

/// Named structure parameters as they appear in the configuration document.
///
/// Missing numbers default to 0 and missing flags to false.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StructureConfig {
    /// End of the null depth range.
    pub null_depth: u64,
    /// End of the base depth range (at least 4).
    pub base_depth: u64,
    /// End of the cold depth range. 0 means no cold region.
    pub cold_depth: u64,
    /// Base chunk capacity, a power of the branching factor.
    pub points_per_chunk: u64,
    /// 2 for a quadtree, 3 for an octree. Derived from `type` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<u64>,
    /// Expected total point count, used to place the sparse depth.
    pub num_points_hint: u64,
    /// Tubular tree flag. Defaults to `type == "hybrid"` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tubular: Option<bool>,
    /// Grow chunk capacity with depth past the sparse depth.
    pub dynamic_chunks: bool,
    /// Prefix chunk names with their ids.
    pub prefix_ids: bool,
    /// Explicit sparse begin depth. 0 lets the hint decide.
    pub sparse_depth: u64,
    /// First depth written by exporters.
    #[serde(skip_serializing_if = "is_zero")]
    pub start_depth: u64,
    /// Legacy tree shape name ("quadtree", "octree" or "hybrid").
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub tree_type: Option<String>,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

impl StructureConfig {
    /// Octree parameters with the given depth ranges and chunk capacity.
    pub fn octree(base_depth: u64, cold_depth: u64, points_per_chunk: u64) -> Self {
        Self {
            base_depth,
            cold_depth,
            points_per_chunk,
            dimensions: Some(3),
            ..Default::default()
        }
    }

    /// Quadtree parameters with the given depth ranges and chunk capacity.
    pub fn quadtree(base_depth: u64, cold_depth: u64, points_per_chunk: u64) -> Self {
        Self {
            dimensions: Some(2),
            ..Self::octree(base_depth, cold_depth, points_per_chunk)
        }
    }

    /// Set the sparse begin depth.
    pub fn with_sparse_depth(mut self, sparse_depth: u64) -> Self {
        self.sparse_depth = sparse_depth;
        self
    }

    /// Set the expected point count.
    pub fn with_num_points_hint(mut self, num_points_hint: u64) -> Self {
        self.num_points_hint = num_points_hint;
        self
    }

    /// Enable or disable dynamic chunk sizing.
    pub fn with_dynamic_chunks(mut self, dynamic_chunks: bool) -> Self {
        self.dynamic_chunks = dynamic_chunks;
        self
    }

    /// Set the null depth end.
    pub fn with_null_depth(mut self, null_depth: u64) -> Self {
        self.null_depth = null_depth;
        self
    }

    /// Resolved dimensionality.
    pub fn resolved_dimensions(&self) -> u64 {
        match self.dimensions {
            Some(dimensions) => dimensions,
            None if self.tree_type.as_deref() == Some(OCTREE_TYPE) => 3,
            None => 2,
        }
    }

    /// Resolved tubular flag.
    pub fn resolved_tubular(&self) -> bool {
        self.tubular
            .unwrap_or_else(|| self.tree_type.as_deref() == Some(HYBRID_TYPE))
    }

    /// Save to file as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), io::Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, json)
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self, io::Error> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
    }
}
