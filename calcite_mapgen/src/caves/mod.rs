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

//! Random-walk cave carvers.
//!
//! A carver is handed a voxel manipulator covering a chunk plus a margin, and digs one cave into
//! it per call: a walk of straight segments, each carved as a string of tapered cross-sections.
//! Two carvers are provided. [CavesRandomWalk] is the current one. [CavesLegacy] reproduces an
//! older algorithm exactly, so that worlds generated with it keep generating the same caves.

pub(crate) mod geometry;
mod legacy;
mod random_walk;

#[cfg(test)]
mod tests;

pub use legacy::CavesLegacy;
pub use random_walk::CavesRandomWalk;

use calcite_core::constants::mapgen_aliases::{LAVA_SOURCE, WATER_SOURCE};
use calcite_core::content_id::special_contents::CONTENT_AIR;
use calcite_core::content_id::ContentId;
use calcite_core::coordinates::BlockCoordinate;

use crate::gennotify::GenerateNotifier;
use crate::heightmap::Heightmap;
use crate::node_def::NodeDefManager;
use crate::voxel::VoxelManipulator;

/// Below this height, random-walk caves may flood with lava instead of water.
pub const DEFAULT_LAVA_DEPTH: i32 = -256;

/// Parameters of a single cave.
#[derive(Clone, Copy, Debug)]
pub struct CaveRequest<'a> {
    /// Lowest node of the chunk being generated.
    pub node_min: BlockCoordinate,
    /// Highest node of the chunk being generated.
    pub node_max: BlockCoordinate,
    pub is_large_cave: bool,
    /// Highest stone in the chunk. Caves wander up to a little above this.
    pub max_stone_height: i32,
    /// Surface height of each column of the chunk. Without one, the water level stands in
    /// for the surface.
    pub heightmap: Option<&'a Heightmap>,
}

/// A cave carver.
///
/// Carvers are immutable and may be shared between workers; all the state of a cave lives in
/// the call. The random streams are the only thing that carries over from one call to the next,
/// and callers rely on exactly how far each call advances them.
pub trait TunnelCarver: Send + Sync {
    /// The random streams a call draws from.
    type Streams<'r>;

    /// Carves one cave into `vm`.
    ///
    /// The manipulator should cover the chunk with some margin; writes outside it are dropped.
    /// If `gennotify` is given, the cave's start and end are reported to it.
    fn make_cave(
        &self,
        vm: &mut VoxelManipulator,
        request: &CaveRequest<'_>,
        streams: Self::Streams<'_>,
        gennotify: Option<&mut GenerateNotifier>,
    );
}

/// The contents that flooded caves fill with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaveLiquids {
    pub water: ContentId,
    pub lava: ContentId,
}
impl CaveLiquids {
    /// Uses the given contents if set, else the `mapgen_*_source` aliases, else air.
    pub fn resolve(ndef: &NodeDefManager, water: Option<ContentId>, lava: Option<ContentId>) -> Self {
        let pick = |explicit: Option<ContentId>, alias: &str| {
            explicit
                .filter(|c| !c.is_ignore())
                .or_else(|| ndef.get_id(alias))
                .unwrap_or(CONTENT_AIR)
        };
        Self {
            water: pick(water, WATER_SOURCE),
            lava: pick(lava, LAVA_SOURCE),
        }
    }
}
