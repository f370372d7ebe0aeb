// Copyright 2023 drey7925
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory view over a box of the world's voxels.

use calcite_core::content_id::special_contents::CONTENT_IGNORE;
use calcite_core::content_id::ContentId;
use calcite_core::coordinates::{BlockCoordinate, ChunkCoordinate};
use rustc_hash::FxHashSet;
use thiserror::Error;

/// The cell was never loaded from the map.
pub const VOXELFLAG_NO_DATA: u8 = 1 << 1;
/// The cell was emptied by a small cave.
pub const VMANIP_FLAG_CAVE: u8 = 1 << 2;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum VoxelError {
    #[error("Area {0:?}..={1:?} is inverted")]
    InvertedArea(BlockCoordinate, BlockCoordinate),
    #[error("Area {0:?}..={1:?} is too large")]
    AreaTooLarge(BlockCoordinate, BlockCoordinate),
    #[error("Heightmap needs {expected} entries, got {actual}")]
    HeightmapSize { expected: usize, actual: usize },
}

/// An inclusive axis-aligned box of voxels, with a dense z-major index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoxelArea {
    min_edge: BlockCoordinate,
    max_edge: BlockCoordinate,
}
impl VoxelArea {
    /// Largest number of cells an area may hold.
    pub const MAX_VOLUME: usize = 1 << 28;

    pub fn new(min_edge: BlockCoordinate, max_edge: BlockCoordinate) -> Result<Self, VoxelError> {
        if min_edge.x > max_edge.x || min_edge.y > max_edge.y || min_edge.z > max_edge.z {
            return Err(VoxelError::InvertedArea(min_edge, max_edge));
        }
        let volume = (max_edge.x as i64 - min_edge.x as i64 + 1)
            * (max_edge.y as i64 - min_edge.y as i64 + 1)
            * (max_edge.z as i64 - min_edge.z as i64 + 1);
        if volume > Self::MAX_VOLUME as i64 {
            return Err(VoxelError::AreaTooLarge(min_edge, max_edge));
        }
        Ok(Self { min_edge, max_edge })
    }

    #[inline]
    pub fn min_edge(&self) -> BlockCoordinate {
        self.min_edge
    }
    #[inline]
    pub fn max_edge(&self) -> BlockCoordinate {
        self.max_edge
    }
    /// Number of cells along each axis
    #[inline]
    pub fn extent(&self) -> BlockCoordinate {
        self.max_edge - self.min_edge + BlockCoordinate::splat(1)
    }
    #[inline]
    pub fn volume(&self) -> usize {
        let e = self.extent();
        e.x as usize * e.y as usize * e.z as usize
    }

    #[inline]
    pub fn contains(&self, p: BlockCoordinate) -> bool {
        p.x >= self.min_edge.x
            && p.y >= self.min_edge.y
            && p.z >= self.min_edge.z
            && p.x <= self.max_edge.x
            && p.y <= self.max_edge.y
            && p.z <= self.max_edge.z
    }

    /// Index of `p` in the dense storage. `p` must be inside the area.
    #[inline]
    pub fn index(&self, p: BlockCoordinate) -> usize {
        debug_assert!(self.contains(p), "{p:?} outside {self:?}");
        let e = self.extent();
        let d = p - self.min_edge;
        (d.z as usize * e.y as usize + d.y as usize) * e.x as usize + d.x as usize
    }

    /// Inverse of [VoxelArea::index]
    pub fn position(&self, index: usize) -> BlockCoordinate {
        let e = self.extent();
        let x = (index % e.x as usize) as i32;
        let y = ((index / e.x as usize) % e.y as usize) as i32;
        let z = (index / (e.x as usize * e.y as usize)) as i32;
        self.min_edge + BlockCoordinate::new(x, y, z)
    }

    /// Grows the area by `by` cells in each direction, on both sides.
    pub fn pad(&self, by: BlockCoordinate) -> Result<VoxelArea, VoxelError> {
        VoxelArea::new(self.min_edge - by, self.max_edge + by)
    }

    /// Map chunks that overlap this area, in x, z, y order.
    pub fn chunks(&self) -> impl Iterator<Item = ChunkCoordinate> {
        let lo = self.min_edge.chunk();
        let hi = self.max_edge.chunk();
        (lo.x..=hi.x).flat_map(move |x| {
            (lo.z..=hi.z).flat_map(move |z| (lo.y..=hi.y).map(move |y| ChunkCoordinate::new(x, y, z)))
        })
    }

    pub fn overlaps_chunk(&self, chunk: ChunkCoordinate) -> bool {
        let lo = chunk.min_block();
        let hi = chunk.max_block();
        lo.x <= self.max_edge.x
            && lo.y <= self.max_edge.y
            && lo.z <= self.max_edge.z
            && hi.x >= self.min_edge.x
            && hi.y >= self.min_edge.y
            && hi.z >= self.min_edge.z
    }
}

/// A single cell of the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MapNode {
    pub content: ContentId,
    /// Sunlight in the upper nibble, light from sources in the lower nibble.
    pub light: u8,
}
impl MapNode {
    pub const fn new(content: ContentId) -> Self {
        Self { content, light: 0 }
    }
}

/// Owns the cells and flags of a [VoxelArea] while the map generator works on it.
///
/// Every content write records the map chunk it landed in, so that lighting can be repaired
/// for exactly those chunks afterwards.
pub struct VoxelManipulator {
    area: VoxelArea,
    nodes: Vec<MapNode>,
    flags: Vec<u8>,
    modified_chunks: FxHashSet<ChunkCoordinate>,
}
impl VoxelManipulator {
    /// A manipulator whose every cell holds `content`.
    pub fn new_filled(area: VoxelArea, content: ContentId) -> Self {
        Self {
            area,
            nodes: vec![MapNode::new(content); area.volume()],
            flags: vec![0; area.volume()],
            modified_chunks: FxHashSet::default(),
        }
    }
    /// A manipulator of ignore cells flagged as having no data.
    pub fn new_unloaded(area: VoxelArea) -> Self {
        let mut vm = Self::new_filled(area, CONTENT_IGNORE);
        vm.flags.fill(VOXELFLAG_NO_DATA);
        vm
    }

    #[inline]
    pub fn area(&self) -> &VoxelArea {
        &self.area
    }

    pub fn get(&self, p: BlockCoordinate) -> Option<MapNode> {
        self.area.contains(p).then(|| self.nodes[self.area.index(p)])
    }

    /// Writes a content at `p`, if it is inside the area. Returns whether anything was written.
    pub fn set_content(&mut self, p: BlockCoordinate, content: ContentId) -> bool {
        if !self.area.contains(p) {
            return false;
        }
        let i = self.area.index(p);
        self.set_content_at(i, content);
        true
    }

    #[inline]
    pub fn content_at(&self, index: usize) -> ContentId {
        self.nodes[index].content
    }
    #[inline]
    pub fn set_content_at(&mut self, index: usize, content: ContentId) {
        self.nodes[index].content = content;
        self.flags[index] &= !VOXELFLAG_NO_DATA;
        self.modified_chunks.insert(self.area.position(index).chunk());
    }
    #[inline]
    pub fn flags_at(&self, index: usize) -> u8 {
        self.flags[index]
    }
    #[inline]
    pub fn set_flags_at(&mut self, index: usize, flags: u8) {
        self.flags[index] |= flags;
    }
    #[inline]
    pub fn light_at(&self, index: usize) -> u8 {
        self.nodes[index].light
    }
    /// Lighting writes do not count as modifications.
    #[inline]
    pub fn set_light_at(&mut self, index: usize, light: u8) {
        self.nodes[index].light = light;
    }

    /// Returns the chunks written since the last call, sorted.
    pub fn take_modified_chunks(&mut self) -> Vec<ChunkCoordinate> {
        let mut chunks: Vec<_> = self.modified_chunks.drain().collect();
        chunks.sort();
        chunks
    }

    pub fn count_content(&self, content: ContentId) -> usize {
        self.nodes.iter().filter(|n| n.content == content).count()
    }
    pub fn count_flag(&self, flag: u8) -> usize {
        self.flags.iter().filter(|f| **f & flag != 0).count()
    }
    pub fn nodes(&self) -> &[MapNode] {
        &self.nodes
    }
}
