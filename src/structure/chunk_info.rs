//! ChunkInfo - where a single node lives in chunked storage.

use num_traits::Zero;

use crate::core::Id;
use crate::math::{binary_pow, calc_depth, calc_level_index, div_mod};
use crate::structure::Structure;

/// Storage location of one node.
///
/// Built per query from a [`Structure`] and a global node index. Holds no
/// reference to the structure, so it can be sent freely between workers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChunkInfo {
    index: Id,
    depth: u64,
    level_index: Id,
    chunk_id: Id,
    chunk_offset: Id,
    points_per_chunk: Id,
    chunk_num: Id,
}

impl ChunkInfo {
    /// Locate the node at `index`.
    ///
    /// The structure must have a cold region and `index` must be at or past
    /// its cold index begin. Nodes shallower than that live in the base
    /// region, which is not chunked.
    pub fn new(structure: &Structure, index: &Id) -> Self {
        debug_assert!(structure.has_cold(), "chunk lookup without a cold region");
        debug_assert!(index >= structure.cold_index_begin(), "index {} is not chunked", index);

        let dimensions = structure.dimensions();
        let depth = calc_depth(structure.factor(), index);
        let level_index = calc_level_index(dimensions, depth);

        let base_points_per_chunk = Id::from(structure.base_points_per_chunk());
        let cold_index_begin = structure.cold_index_begin();
        let sparse_index_begin = structure.sparse_index_begin();

        if !structure.dynamic_chunks_active() || &level_index <= sparse_index_begin {
            let (chunk_num, chunk_offset) =
                div_mod(&(index - cold_index_begin), &base_points_per_chunk);
            let chunk_id = cold_index_begin + &chunk_num * &base_points_per_chunk;

            Self {
                index: index.clone(),
                depth,
                level_index,
                chunk_id,
                chunk_offset,
                points_per_chunk: base_points_per_chunk,
                chunk_num,
            }
        } else {
            // Chunks grow by one factor per depth while the number of chunks
            // per depth stays fixed, so numbering past the sparse begin only
            // needs the depth count.
            let sparse_depth_count = depth - structure.sparse_depth_begin();
            let points_per_chunk =
                &base_points_per_chunk * binary_pow(dimensions, sparse_depth_count);

            let num_cold_chunks =
                (sparse_index_begin - cold_index_begin) / &base_points_per_chunk;
            let prev_levels_chunk_count =
                num_cold_chunks + structure.max_chunks_per_depth() * sparse_depth_count;

            let (local_chunk_num, chunk_offset) =
                div_mod(&(index - &level_index), &points_per_chunk);

            let chunk_num = prev_levels_chunk_count + &local_chunk_num;
            let chunk_id = &level_index + local_chunk_num * &points_per_chunk;

            Self {
                index: index.clone(),
                depth,
                level_index,
                chunk_id,
                chunk_offset,
                points_per_chunk,
                chunk_num,
            }
        }
    }

    /// Global index this info was computed for.
    pub fn index(&self) -> &Id {
        &self.index
    }

    /// Depth of the node.
    pub fn depth(&self) -> u64 {
        self.depth
    }

    /// First global index at the node's depth.
    pub fn level_index(&self) -> &Id {
        &self.level_index
    }

    /// Global index of the first node in the node's chunk.
    pub fn chunk_id(&self) -> &Id {
        &self.chunk_id
    }

    /// Position of the node within its chunk.
    pub fn chunk_offset(&self) -> &Id {
        &self.chunk_offset
    }

    /// Capacity of the node's chunk.
    pub fn points_per_chunk(&self) -> &Id {
        &self.points_per_chunk
    }

    /// Sequential ordinal of the chunk among all chunks.
    pub fn chunk_num(&self) -> &Id {
        &self.chunk_num
    }

    /// True if the node is the first one in its chunk.
    pub fn is_chunk_start(&self) -> bool {
        self.chunk_offset.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::StructureConfig;

    fn octree_fixed() -> Structure {
        Structure::new(&StructureConfig::octree(6, 10, 64)).unwrap()
    }

    /// Quadtree with 16-point base chunks and dynamic chunks past depth 5.
    fn quadtree_dynamic() -> Structure {
        let config = StructureConfig::quadtree(4, 12, 16)
            .with_sparse_depth(5)
            .with_dynamic_chunks(true);
        Structure::new(&config).unwrap()
    }

    #[test]
    fn test_first_cold_index() {
        let structure = octree_fixed();
        let index = calc_level_index(3, 6);
        let info = structure.chunk_info(&index);

        assert_eq!(info.depth(), 6);
        assert!(info.chunk_offset().is_zero());
        assert!(info.chunk_num().is_zero());
        assert_eq!(info.chunk_id(), &index);
        assert_eq!(info.points_per_chunk(), &Id::from(64u32));
        assert!(info.is_chunk_start());
    }

    #[test]
    fn test_fixed_chunk_layout() {
        let structure = octree_fixed();
        let begin = calc_level_index(3, 6);

        let info = structure.chunk_info(&(&begin + 130u32));
        assert_eq!(info.chunk_num(), &Id::from(2u32));
        assert_eq!(info.chunk_offset(), &Id::from(2u32));
        assert_eq!(info.chunk_id(), &(&begin + 128u32));
        assert_eq!(info.level_index(), &begin);
    }

    #[test]
    fn test_offset_below_capacity() {
        let structure = quadtree_dynamic();
        let begin = structure.cold_index_begin().clone();
        let end = calc_level_index(2, 9);

        let mut index = begin;
        while index < end {
            let info = structure.chunk_info(&index);
            assert!(info.chunk_offset() < info.points_per_chunk(), "index {}", index);
            assert_eq!(info.chunk_id() + info.chunk_offset(), index);
            index += 7u32;
        }
    }

    #[test]
    fn test_monotonic_chunk_numbers() {
        let structure = quadtree_dynamic();
        let begin = structure.cold_index_begin().clone();
        let end = calc_level_index(2, 8);

        let mut prev = structure.chunk_info(&begin);
        let mut index = &begin + 1u32;
        while index < end {
            let info = structure.chunk_info(&index);
            if info.is_chunk_start() {
                assert_eq!(info.chunk_num(), &(prev.chunk_num() + 1u32), "index {}", index);
            } else {
                assert_eq!(info.chunk_num(), prev.chunk_num(), "index {}", index);
                assert_eq!(info.chunk_offset(), &(prev.chunk_offset() + 1u32));
            }
            prev = info;
            index += 1u32;
        }
    }

    #[test]
    fn test_dynamic_capacity_grows_per_depth() {
        let structure = quadtree_dynamic();

        for (depth, expected) in [(5u64, 16u32), (6, 64), (7, 256), (8, 1024)] {
            let info = structure.chunk_info(&calc_level_index(2, depth));
            assert_eq!(info.depth(), depth);
            assert_eq!(info.points_per_chunk(), &Id::from(expected), "depth {}", depth);
            assert!(info.is_chunk_start());
        }
    }

    #[test]
    fn test_dynamic_numbering_is_gap_free() {
        let structure = quadtree_dynamic();

        // Depths 4 and 5 are fixed: (256 + 1024) / 16 chunks.
        let last_fixed = calc_level_index(2, 6) - 1u32;
        let info = structure.chunk_info(&last_fixed);
        assert_eq!(info.chunk_num(), &Id::from(79u32));

        let first_dynamic = structure.chunk_info(&calc_level_index(2, 6));
        assert_eq!(first_dynamic.chunk_num(), &Id::from(80u32));

        // 64 chunks per sparse depth.
        let next_depth = structure.chunk_info(&calc_level_index(2, 7));
        assert_eq!(next_depth.chunk_num(), &Id::from(144u32));
    }

    #[test]
    fn test_huge_index() {
        let config = StructureConfig::octree(6, 200, 4096)
            .with_sparse_depth(8)
            .with_dynamic_chunks(true);
        let structure = Structure::new(&config).unwrap();

        let index = calc_level_index(3, 90) + Id::from(123_456_789u64) * 1_000_003u64;
        let info = structure.chunk_info(&index);

        assert_eq!(info.depth(), 90);
        assert!(info.chunk_offset() < info.points_per_chunk());
        assert_eq!(info.chunk_id() + info.chunk_offset(), index);
        assert_eq!(info.points_per_chunk(), &(Id::from(4096u32) * binary_pow(3, 82)));

        let back = structure.get_info_from_num(info.chunk_num());
        assert_eq!(back.chunk_id(), info.chunk_id());
    }
}
