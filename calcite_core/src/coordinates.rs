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

use std::cmp::Ordering;
use std::str::FromStr;
use std::{
    fmt::Debug,
    ops::{Add, AddAssign, Sub},
    ops::RangeInclusive,
};

use anyhow::bail;
use cgmath::Vector3;

use crate::constants::CHUNK_SIZE;

/// A 3D coordinate of a single voxel in the world.
///
/// Note that the impls of PartialOrd and Ord are meant for tiebreaking (e.g. for sorted data structures) and don't
/// have a lot of semantic meaning on their own.
#[derive(PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord, Default)]
pub struct BlockCoordinate {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Debug for BlockCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("[{}, {}, {}]", self.x, self.y, self.z))
    }
}
impl BlockCoordinate {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
    /// All three components set to `v`
    pub const fn splat(v: i32) -> Self {
        Self { x: v, y: v, z: v }
    }
    #[inline]
    pub const fn offset(&self) -> ChunkOffset {
        // rem_euclid(16) result should always fit into u8.
        ChunkOffset {
            x: self.x.rem_euclid(CHUNK_SIZE) as u8,
            y: self.y.rem_euclid(CHUNK_SIZE) as u8,
            z: self.z.rem_euclid(CHUNK_SIZE) as u8,
        }
    }
    #[inline]
    pub const fn chunk(&self) -> ChunkCoordinate {
        ChunkCoordinate {
            x: self.x.div_euclid(CHUNK_SIZE),
            y: self.y.div_euclid(CHUNK_SIZE),
            z: self.z.div_euclid(CHUNK_SIZE),
        }
    }

    pub fn try_delta(&self, x: i32, y: i32, z: i32) -> Option<BlockCoordinate> {
        let x = self.x.checked_add(x)?;
        let y = self.y.checked_add(y)?;
        let z = self.z.checked_add(z)?;

        Some(BlockCoordinate { x, y, z })
    }

    /// Truncates each component toward zero, the way a float-to-integer cast does.
    #[inline]
    pub fn from_vector_trunc(v: Vector3<f32>) -> BlockCoordinate {
        BlockCoordinate {
            x: v.x as i32,
            y: v.y as i32,
            z: v.z as i32,
        }
    }

    /// Componentwise minimum
    pub fn min(&self, other: BlockCoordinate) -> BlockCoordinate {
        BlockCoordinate {
            x: self.x.min(other.x),
            y: self.y.min(other.y),
            z: self.z.min(other.z),
        }
    }
    /// Componentwise maximum
    pub fn max(&self, other: BlockCoordinate) -> BlockCoordinate {
        BlockCoordinate {
            x: self.x.max(other.x),
            y: self.y.max(other.y),
            z: self.z.max(other.z),
        }
    }
}
impl Add for BlockCoordinate {
    type Output = BlockCoordinate;
    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        BlockCoordinate {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}
impl AddAssign for BlockCoordinate {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
impl Sub for BlockCoordinate {
    type Output = BlockCoordinate;
    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        BlockCoordinate {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}
impl ToString for BlockCoordinate {
    fn to_string(&self) -> String {
        let mut result = String::new();
        result += self.x.to_string().as_str();
        result += ",";
        result += self.y.to_string().as_str();
        result += ",";
        result += self.z.to_string().as_str();
        result
    }
}
impl FromStr for BlockCoordinate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let pieces: Vec<_> = s.split(',').map(str::trim).collect();
        if pieces.len() != 3 {
            bail!("Wrong number of components");
        };
        Ok(BlockCoordinate::new(
            pieces[0].parse()?,
            pieces[1].parse()?,
            pieces[2].parse()?,
        ))
    }
}

/// Represents an offset of a voxel within a chunk.
///
/// The most cache-friendly iteration order has x in the outer loop, z in the middle loop, and y in the innermost loop
#[derive(PartialEq, Eq, Hash, Clone, Copy)]
pub struct ChunkOffset {
    pub x: u8,
    pub y: u8,
    pub z: u8,
}
impl ChunkOffset {
    pub const fn new(x: u8, y: u8, z: u8) -> Self {
        Self { x, y, z }
    }

    #[cfg(debug_assertions)]
    #[inline(always)]
    fn debug_check(&self) {
        debug_assert!(self.x < 16);
        debug_assert!(self.y < 16);
        debug_assert!(self.z < 16);
    }

    #[cfg(not(debug_assertions))]
    #[inline(always)]
    fn debug_check(&self) {}

    #[inline]
    pub fn as_index(&self) -> usize {
        self.debug_check();
        // The unusual order here is to provide a cache-friendly iteration order
        // for innermost loops that traverse vertically (since that is a common pattern for
        // lighting calculations).
        256 * (self.x as usize) + 16 * (self.z as usize) + (self.y as usize)
    }
    #[inline]
    pub fn from_index(index: usize) -> ChunkOffset {
        assert!(index < 4096);
        ChunkOffset {
            y: (index % 16) as u8,
            z: ((index / 16) % 16) as u8,
            x: ((index / 256) % 16) as u8,
        }
    }
}
impl Debug for ChunkOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("Δ({}, {}, {})", self.x, self.y, self.z))
    }
}
impl PartialOrd<Self> for ChunkOffset {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ChunkOffset {
    fn cmp(&self, other: &Self) -> Ordering {
        self.x
            .cmp(&other.x)
            .then(self.z.cmp(&other.z))
            .then(self.y.cmp(&other.y))
    }
}

/// Represents the location of a map chunk, the 16x16x16 unit in which the map is generated,
/// stored and relit.
///
/// Each coordinate spans 16 voxels, covering the range [chunk_coord.x * 16, chunk_coord.x * 16 + 15].
/// e.g. chunk 0,1,2 covers x:[0, 15], y:[16, 31], z:[32, 47]
#[derive(PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub struct ChunkCoordinate {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}
impl ChunkCoordinate {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        let result = Self { x, y, z };
        debug_assert!(result.is_in_bounds());
        result
    }

    /// Returns a new block coordinate with the given offset within this chunk.
    #[inline]
    pub fn with_offset(&self, offset: ChunkOffset) -> BlockCoordinate {
        offset.debug_check();
        BlockCoordinate {
            x: self.x * CHUNK_SIZE + (offset.x as i32),
            y: self.y * CHUNK_SIZE + (offset.y as i32),
            z: self.z * CHUNK_SIZE + (offset.z as i32),
        }
    }
    /// The lowest-coordinate voxel of this chunk
    #[inline]
    pub fn min_block(&self) -> BlockCoordinate {
        self.with_offset(ChunkOffset::new(0, 0, 0))
    }
    /// The highest-coordinate voxel of this chunk
    #[inline]
    pub fn max_block(&self) -> BlockCoordinate {
        self.with_offset(ChunkOffset::new(15, 15, 15))
    }
    /// Returns the L-infinity (max distance along all three dimensions) norm between the two coordinates
    pub fn l_infinity_norm_distance(&self, other: ChunkCoordinate) -> u32 {
        self.x
            .abs_diff(other.x)
            .max(self.y.abs_diff(other.y))
            .max(self.z.abs_diff(other.z))
    }
    /// Returns true if the coordinate is in-bounds. Because *block* coordinates need to
    /// fit into an i32, not every possible chunk coordinate is actually in-bounds.
    pub fn is_in_bounds(&self) -> bool {
        const BOUNDS_RANGE: RangeInclusive<i32> = (i32::MIN / 16)..=(i32::MAX / 16);
        BOUNDS_RANGE.contains(&self.x)
            && BOUNDS_RANGE.contains(&self.y)
            && BOUNDS_RANGE.contains(&self.z)
    }
    /// Adds the given offset to the coordinate, and returns it, if it is in-bounds.
    pub fn try_delta(&self, x: i32, y: i32, z: i32) -> Option<ChunkCoordinate> {
        let x = self.x.checked_add(x)?;
        let y = self.y.checked_add(y)?;
        let z = self.z.checked_add(z)?;
        let candidate = ChunkCoordinate { x, y, z };
        if candidate.is_in_bounds() {
            Some(candidate)
        } else {
            None
        }
    }
    /// Iterates over this chunk and the 26 chunks surrounding it.
    pub fn with_neighbors(&self) -> impl Iterator<Item = ChunkCoordinate> + '_ {
        (-1..=1).flat_map(move |dx| {
            (-1..=1).flat_map(move |dy| (-1..=1).filter_map(move |dz| self.try_delta(dx, dy, dz)))
        })
    }
}
impl Debug for ChunkCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("chunk[{}, {}, {}]", self.x, self.y, self.z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_coordinates_map_to_chunks() {
        let coord = BlockCoordinate::new(-1, -16, -17);
        assert_eq!(coord.chunk(), ChunkCoordinate::new(-1, -1, -2));
        assert_eq!(coord.offset(), ChunkOffset::new(15, 0, 15));
        assert_eq!(coord.chunk().with_offset(coord.offset()), coord);
    }

    #[test]
    fn truncation_matches_float_casts() {
        let v = Vector3::new(-0.5f32, 1.99, -3.01);
        assert_eq!(
            BlockCoordinate::from_vector_trunc(v),
            BlockCoordinate::new(0, 1, -3)
        );
    }

    #[test]
    fn parse_roundtrip() {
        let coord: BlockCoordinate = "-16, 3,42".parse().unwrap();
        assert_eq!(coord, BlockCoordinate::new(-16, 3, 42));
        assert_eq!(coord.to_string(), "-16,3,42");
        assert!("1,2".parse::<BlockCoordinate>().is_err());
    }

    #[test]
    fn neighbors_include_center() {
        let center = ChunkCoordinate::new(0, -1, 2);
        let neighbors: Vec<_> = center.with_neighbors().collect();
        assert_eq!(neighbors.len(), 27);
        assert!(neighbors.contains(&center));
        assert!(neighbors
            .iter()
            .all(|n| n.l_infinity_norm_distance(center) <= 1));
    }
}
