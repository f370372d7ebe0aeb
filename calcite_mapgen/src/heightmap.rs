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

use calcite_core::coordinates::BlockCoordinate;

use crate::voxel::VoxelError;

/// Terrain surface height of each (x, z) column of a chunk being generated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heightmap {
    min_x: i32,
    min_z: i32,
    size_x: usize,
    size_z: usize,
    heights: Vec<i32>,
}
impl Heightmap {
    /// Builds a heightmap over the columns `node_min.x..=node_max.x`, `node_min.z..=node_max.z`,
    /// with `heights` in z-major order.
    pub fn new(
        node_min: BlockCoordinate,
        node_max: BlockCoordinate,
        heights: Vec<i32>,
    ) -> Result<Self, VoxelError> {
        if node_min.x > node_max.x || node_min.z > node_max.z {
            return Err(VoxelError::InvertedArea(node_min, node_max));
        }
        let size_x = (node_max.x - node_min.x + 1) as usize;
        let size_z = (node_max.z - node_min.z + 1) as usize;
        if heights.len() != size_x * size_z {
            return Err(VoxelError::HeightmapSize {
                expected: size_x * size_z,
                actual: heights.len(),
            });
        }
        Ok(Self {
            min_x: node_min.x,
            min_z: node_min.z,
            size_x,
            size_z,
            heights,
        })
    }

    /// Builds a heightmap by evaluating `f(x, z)` for each column.
    pub fn from_fn(
        node_min: BlockCoordinate,
        node_max: BlockCoordinate,
        f: impl Fn(i32, i32) -> i32,
    ) -> Result<Self, VoxelError> {
        let mut heights = Vec::new();
        for z in node_min.z..=node_max.z {
            for x in node_min.x..=node_max.x {
                heights.push(f(x, z));
            }
        }
        Self::new(node_min, node_max, heights)
    }

    pub fn flat(
        node_min: BlockCoordinate,
        node_max: BlockCoordinate,
        height: i32,
    ) -> Result<Self, VoxelError> {
        Self::from_fn(node_min, node_max, |_, _| height)
    }

    /// Surface height of the column, or None if the column is not covered.
    #[inline]
    pub fn get(&self, x: i32, z: i32) -> Option<i32> {
        let dx = x.checked_sub(self.min_x)?;
        let dz = z.checked_sub(self.min_z)?;
        if dx < 0 || dz < 0 || dx as usize >= self.size_x || dz as usize >= self.size_z {
            return None;
        }
        Some(self.heights[dz as usize * self.size_x + dx as usize])
    }

    /// Highest surface in the map, if it has any columns.
    pub fn max_height(&self) -> Option<i32> {
        self.heights.iter().copied().max()
    }
}
