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

//! Recomputes lighting after caves have been carved.
//!
//! Sunlight is tracked per column of chunks: a chunk's occlusion marks the columns where some
//! cell blocks light, and the topmost chunk of the manipulator is open to the sky. Each chunk
//! being repaired is then flood-filled together with its 26 neighbors, and the light of its own
//! cells is written back into the manipulator. The result only depends on the contents of the
//! manipulator, so repairing twice changes nothing.

use std::sync::Arc;

use calcite_core::content_id::special_contents::{CONTENT_AIR, CONTENT_IGNORE};
use calcite_core::content_id::ContentId;
use calcite_core::coordinates::{BlockCoordinate, ChunkCoordinate, ChunkOffset};
use calcite_core::lighting::{
    propagate_light, ChunkBuffer, ChunkColumn, LightScratchpad, Lightfield, NeighborBuffer,
};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::node_def::NodeDefManager;
use crate::voxel::{VoxelArea, VoxelManipulator};

/// Contents of one chunk, in [ChunkOffset::as_index] order.
struct ChunkContents(Box<[ContentId; 4096]>);

#[derive(Clone, Copy)]
struct ChunkSlice<'a>(&'a [ContentId; 4096]);
impl ChunkBuffer for ChunkSlice<'_> {
    fn get(&self, offset: ChunkOffset) -> ContentId {
        self.0[offset.as_index()]
    }

    fn vertical_slice(&self, x: u8, z: u8) -> &[ContentId; 16] {
        let min_offset = ChunkOffset::new(x, 0, z).as_index();
        let slice = &self.0[min_offset..min_offset + 16];
        // Always 16 long
        slice.try_into().unwrap()
    }
}

struct Neighborhood<'a> {
    center: ChunkCoordinate,
    chunks: &'a FxHashMap<ChunkCoordinate, ChunkContents>,
    columns: &'a FxHashMap<(i32, i32), ChunkColumn>,
}
impl<'a> Neighborhood<'a> {
    fn coord(&self, dx: i32, dy: i32, dz: i32) -> Option<ChunkCoordinate> {
        self.center.try_delta(dx, dy, dz)
    }
}
impl<'a> NeighborBuffer for Neighborhood<'a> {
    type Chunk<'b>
        = ChunkSlice<'b>
    where
        Self: 'b;

    fn get(&self, dx: i32, dy: i32, dz: i32) -> Option<Self::Chunk<'_>> {
        let coord = self.coord(dx, dy, dz)?;
        self.chunks.get(&coord).map(|c| ChunkSlice(&c.0))
    }

    fn inbound_light(&self, dx: i32, dy: i32, dz: i32) -> Lightfield {
        self.coord(dx, dy, dz)
            .and_then(|c| self.columns.get(&(c.x, c.z))?.get_incoming_light(c.y))
            .unwrap_or(Lightfield::zero())
    }
}

/// Expands a set of modified chunks to the chunks whose light may have changed: the chunks
/// themselves and their immediate neighbors, limited to those overlapping `area`. Sorted.
pub fn chunks_to_relight(
    modified: impl IntoIterator<Item = ChunkCoordinate>,
    area: &VoxelArea,
) -> Vec<ChunkCoordinate> {
    let mut result: Vec<ChunkCoordinate> = modified
        .into_iter()
        .flat_map(|c| c.with_neighbors().collect::<Vec<_>>())
        .filter(|c| area.overlaps_chunk(*c))
        .collect();
    result.sort();
    result.dedup();
    result
}

/// Relights chunks of a voxel manipulator.
pub struct LightRepair {
    ndef: Arc<NodeDefManager>,
    scratchpads: Mutex<Vec<LightScratchpad>>,
}
impl LightRepair {
    pub fn new(ndef: Arc<NodeDefManager>) -> Self {
        Self {
            ndef,
            scratchpads: Mutex::new(Vec::new()),
        }
    }

    /// Recomputes the light of every cell of `vm` that lies in one of `chunks`. Chunks not
    /// overlapping the manipulator are ignored. Returns the number of chunks relit.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn repair(
        &self,
        vm: &mut VoxelManipulator,
        chunks: impl IntoIterator<Item = ChunkCoordinate>,
    ) -> usize {
        let area = *vm.area();
        let targets: Vec<ChunkCoordinate> = chunks
            .into_iter()
            .filter(|c| area.overlaps_chunk(*c))
            .collect();
        if targets.is_empty() {
            return 0;
        }

        let contents: FxHashMap<ChunkCoordinate, ChunkContents> = area
            .chunks()
            .map(|c| (c, copy_chunk(vm, c)))
            .collect();
        let columns = self.build_columns(&area, &contents);

        let mut scratchpad = self.scratchpads.lock().pop().unwrap_or_default();
        for &center in &targets {
            let neighborhood = Neighborhood {
                center,
                chunks: &contents,
                columns: &columns,
            };
            propagate_light(
                neighborhood,
                &mut scratchpad,
                |id| self.ndef.allows_light_propagation(id),
                |id| self.ndef.light_source(id),
            );
            write_back(vm, center, &scratchpad);
        }
        self.scratchpads.lock().push(scratchpad);
        debug!(relit = targets.len(), "repaired lighting");
        targets.len()
    }

    fn build_columns(
        &self,
        area: &VoxelArea,
        contents: &FxHashMap<ChunkCoordinate, ChunkContents>,
    ) -> FxHashMap<(i32, i32), ChunkColumn> {
        let mut columns: FxHashMap<(i32, i32), ChunkColumn> = FxHashMap::default();
        // x, z, then y upward
        for coord in area.chunks() {
            columns
                .entry((coord.x, coord.z))
                .or_insert_with(ChunkColumn::empty)
                .insert_empty(coord.y);
        }
        for (&(x, z), column) in columns.iter_mut() {
            for y in column.copy_keys().into_iter().rev() {
                let coord = ChunkCoordinate::new(x, y, z);
                if let Some(chunk) = contents.get(&coord) {
                    column.set_occlusion(y, self.occlusion(ChunkSlice(&chunk.0)));
                }
            }
        }
        columns
    }

    fn occlusion(&self, chunk: ChunkSlice<'_>) -> Lightfield {
        let mut occlusion = Lightfield::zero();
        for x in 0..16 {
            for z in 0..16 {
                let blocked = chunk
                    .vertical_slice(x, z)
                    .iter()
                    .any(|&id| !self.ndef.allows_light_propagation(id));
                occlusion.set(x, z, blocked);
            }
        }
        occlusion
    }
}

/// Cells of the chunk outside the manipulator are open sky directly above it, and ignore
/// everywhere else.
fn copy_chunk(vm: &VoxelManipulator, coord: ChunkCoordinate) -> ChunkContents {
    let area = vm.area();
    let min = area.min_edge();
    let max = area.max_edge();
    let mut data = Box::new([CONTENT_IGNORE; 4096]);
    for (index, slot) in data.iter_mut().enumerate() {
        let p = coord.with_offset(ChunkOffset::from_index(index));
        *slot = if area.contains(p) {
            vm.content_at(area.index(p))
        } else if p.y > max.y && (min.x..=max.x).contains(&p.x) && (min.z..=max.z).contains(&p.z)
        {
            CONTENT_AIR
        } else {
            CONTENT_IGNORE
        };
    }
    ChunkContents(data)
}

fn write_back(vm: &mut VoxelManipulator, coord: ChunkCoordinate, scratchpad: &LightScratchpad) {
    let area = *vm.area();
    let lo = coord.min_block().max(area.min_edge());
    let hi = coord.max_block().min(area.max_edge());
    for z in lo.z..=hi.z {
        for y in lo.y..=hi.y {
            for x in lo.x..=hi.x {
                let p = BlockCoordinate::new(x, y, z);
                let offset = p.offset();
                let light = scratchpad.get_packed_u4_u4(
                    offset.x as i32,
                    offset.y as i32,
                    offset.z as i32,
                );
                vm.set_light_at(area.index(p), light);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_def::ContentFeatures;

    fn setup() -> (Arc<NodeDefManager>, ContentId, ContentId) {
        let mut ndef = NodeDefManager::new();
        let stone = ndef
            .register(ContentFeatures::ground("default:stone"))
            .unwrap();
        let lava = ndef
            .register(ContentFeatures::liquid("default:lava_source", 13))
            .unwrap();
        (Arc::new(ndef), stone, lava)
    }

    fn light_at(vm: &VoxelManipulator, p: BlockCoordinate) -> u8 {
        vm.get(p).unwrap().light
    }

    #[test]
    fn open_shaft_gets_sunlight() {
        let (ndef, stone, _) = setup();
        let area =
            VoxelArea::new(BlockCoordinate::splat(-16), BlockCoordinate::splat(15)).unwrap();
        let mut vm = VoxelManipulator::new_filled(area, stone);
        // A vertical shaft all the way up, and a side tunnel off its bottom
        for y in -10..=15 {
            vm.set_content(BlockCoordinate::new(2, y, 2), CONTENT_AIR);
        }
        for x in 3..=8 {
            vm.set_content(BlockCoordinate::new(x, -10, 2), CONTENT_AIR);
        }
        let modified = vm.take_modified_chunks();
        let relight = chunks_to_relight(modified, &area);
        assert_eq!(relight.len(), 8);

        let repair = LightRepair::new(ndef);
        assert_eq!(repair.repair(&mut vm, relight.clone()), 8);

        assert_eq!(light_at(&vm, BlockCoordinate::new(2, 15, 2)) >> 4, 15);
        assert_eq!(light_at(&vm, BlockCoordinate::new(2, -10, 2)) >> 4, 15);
        assert_eq!(light_at(&vm, BlockCoordinate::new(5, -10, 2)) >> 4, 12);
        assert_eq!(light_at(&vm, BlockCoordinate::new(8, -10, 2)) >> 4, 9);
        assert_eq!(light_at(&vm, BlockCoordinate::new(0, 0, 0)), 0);

        let before: Vec<_> = vm.nodes().to_vec();
        repair.repair(&mut vm, relight);
        assert!(before == vm.nodes());
        // Lighting does not count as a modification
        assert!(vm.take_modified_chunks().is_empty());
    }

    #[test]
    fn sealed_caves_are_lit_by_sources_only() {
        let (ndef, stone, lava) = setup();
        let area =
            VoxelArea::new(BlockCoordinate::splat(0), BlockCoordinate::splat(31)).unwrap();
        let mut vm = VoxelManipulator::new_filled(area, stone);
        for x in 10..=20 {
            vm.set_content(BlockCoordinate::new(x, 5, 5), CONTENT_AIR);
        }
        vm.set_content(BlockCoordinate::new(10, 5, 5), lava);
        let relight = chunks_to_relight(vm.take_modified_chunks(), &area);
        LightRepair::new(ndef).repair(&mut vm, relight);

        assert_eq!(light_at(&vm, BlockCoordinate::new(10, 5, 5)), 13);
        assert_eq!(light_at(&vm, BlockCoordinate::new(15, 5, 5)), 8);
        // Crosses into the next chunk
        assert_eq!(light_at(&vm, BlockCoordinate::new(17, 5, 5)), 6);
        assert_eq!(light_at(&vm, BlockCoordinate::new(15, 6, 5)), 0);
    }

    #[test]
    fn unaligned_areas_see_the_sky() {
        let (ndef, stone, _) = setup();
        let area = VoxelArea::new(BlockCoordinate::new(0, -3, 0), BlockCoordinate::new(5, 4, 5))
            .unwrap();
        let mut vm = VoxelManipulator::new_filled(area, stone);
        for y in -3..=4 {
            vm.set_content(BlockCoordinate::new(1, y, 1), CONTENT_AIR);
        }
        let relight = chunks_to_relight(vm.take_modified_chunks(), &area);
        assert_eq!(relight, vec![ChunkCoordinate::new(0, -1, 0), ChunkCoordinate::new(0, 0, 0)]);
        LightRepair::new(ndef).repair(&mut vm, relight);
        assert_eq!(light_at(&vm, BlockCoordinate::new(1, -3, 1)) >> 4, 15);
        assert_eq!(light_at(&vm, BlockCoordinate::new(2, -3, 1)), 0);
    }
}
