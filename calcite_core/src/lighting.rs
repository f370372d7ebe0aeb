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

//! Light propagation primitives: per-column sunlight tracking and the flood fill over a chunk
//! and its neighbors. The map generator drives these after carving to repair lighting.


use std::collections::BTreeMap;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not};

use bitvec::prelude as bv;

use crate::constants::light::{LIGHT_MAX, LIGHT_SUN};
use crate::content_id::ContentId;
use crate::coordinates::ChunkOffset;

/// A 256-bit bitfield over the XZ positions within a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lightfield {
    data: bitvec::array::BitArray<[u32; 8], bitvec::order::Lsb0>,
}

impl Lightfield {
    #[inline]
    pub const fn zero() -> Self {
        Lightfield {
            data: bv::BitArray::ZERO,
        }
    }
    #[inline]
    pub fn all_on() -> Self {
        !Lightfield {
            data: bv::BitArray::ZERO,
        }
    }
    #[inline]
    pub fn any_set(&self) -> bool {
        self.data.any()
    }
    #[inline(always)]
    pub fn set(&mut self, x: u8, z: u8, arg: bool) {
        self.data.set((x as usize) * 16 + (z as usize), arg);
    }
    #[inline(always)]
    pub fn get(&self, x: u8, z: u8) -> bool {
        self.data[(x as usize) * 16 + (z as usize)]
    }
}

macro_rules! delegate_bin_op {
    ($trait:ident, $method:ident) => {
        impl $trait for Lightfield {
            type Output = Self;
            #[inline]
            fn $method(self, rhs: Self) -> Self::Output {
                Lightfield {
                    data: self.data.$method(rhs.data),
                }
            }
        }
    };
}
macro_rules! delegate_bin_op_assign {
    ($trait:ident, $method:ident) => {
        impl $trait for Lightfield {
            #[inline]
            fn $method(&mut self, rhs: Self) {
                self.data.$method(rhs.data);
            }
        }
    };
}
delegate_bin_op!(BitOr, bitor);
delegate_bin_op!(BitAnd, bitand);
delegate_bin_op!(BitXor, bitxor);
delegate_bin_op_assign!(BitOrAssign, bitor_assign);
delegate_bin_op_assign!(BitAndAssign, bitand_assign);
delegate_bin_op_assign!(BitXorAssign, bitxor_assign);

impl Not for Lightfield {
    type Output = Self;
    #[inline]
    fn not(self) -> Self::Output {
        Lightfield { data: !self.data }
    }
}

/// Representation of the sunlight reaching each chunk of a vertical column of chunks.
///
/// The topmost chunk present receives full sunlight. Every chunk below receives whatever
/// light leaves the chunk directly above it (gaps in the column are skipped over).
#[derive(Default)]
pub struct ChunkColumn {
    // *Chunk* coordinate y-values that are present.
    present: BTreeMap<i32, ChunkLightingState>,
}
impl ChunkColumn {
    pub fn empty() -> Self {
        Self {
            present: BTreeMap::new(),
        }
    }
    /// Inserts an empty chunk lighting state for the given chunk, and computes its incoming light.
    /// Panics if the chunk is already present.
    pub fn insert_empty(&mut self, chunk_y: i32) {
        assert!(self
            .present
            .insert(chunk_y, ChunkLightingState::empty())
            .is_none());
        let incoming = self.outgoing_above(chunk_y);
        if let Some(state) = self.present.get_mut(&chunk_y) {
            state.incoming = incoming;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }

    /// Removes an entry and relights the chunks below it. Panics if the chunk is not present.
    pub fn remove(&mut self, chunk_y: i32) {
        assert!(self.present.remove(&chunk_y).is_some());
        if let Some(successor) = self.present.range(..chunk_y).next_back().map(|x| *x.0) {
            self.propagate_from(successor);
        }
    }

    /// Replaces the occlusion of the given chunk and pushes the change down the column.
    /// Returns the number of chunks below it whose incoming light was recomputed.
    ///
    /// Panics if the chunk is not present.
    pub fn set_occlusion(&mut self, chunk_y: i32, occlusion: Lightfield) -> usize {
        let state = self
            .present
            .get_mut(&chunk_y)
            .expect("set_occlusion on a chunk that is not in the column");
        state.occlusion = occlusion;
        state.valid = true;
        self.propagate_from(chunk_y)
    }

    /// Recomputes incoming light starting at the given chunk and walking downward, stopping
    /// once a chunk's outgoing light is unchanged. Returns the number of chunks visited
    /// after the first one.
    pub fn propagate_from(&mut self, chunk_y: i32) -> usize {
        let mut prev_outgoing = self.outgoing_above(chunk_y);
        let mut counter = 0;
        for (idx, (_, state)) in self.present.range_mut(..=chunk_y).rev().enumerate() {
            counter = idx;
            let old_outgoing = state.outgoing();
            state.incoming = prev_outgoing;
            let new_outgoing = state.outgoing();
            // The first chunk is a special case: its inbound light may be unchanged but its
            // occlusion was just updated.
            if idx > 0 && !(new_outgoing ^ old_outgoing).any_set() {
                break;
            }
            prev_outgoing = new_outgoing;
        }
        counter
    }

    /// Returns the incoming light for the given chunk.
    pub fn get_incoming_light(&self, chunk_y: i32) -> Option<Lightfield> {
        self.present.get(&chunk_y).map(|x| x.incoming)
    }

    /// Whether an occlusion has been set for the given chunk since it was inserted.
    pub fn is_valid(&self, chunk_y: i32) -> bool {
        self.present.get(&chunk_y).is_some_and(|x| x.valid)
    }

    pub fn copy_keys(&self) -> Vec<i32> {
        self.present.keys().copied().collect()
    }

    fn outgoing_above(&self, chunk_y: i32) -> Lightfield {
        self.present
            .range((chunk_y + 1)..)
            .next()
            .map_or(Lightfield::all_on(), |x| x.1.outgoing())
    }
}

/// The lighting state of a chunk
struct ChunkLightingState {
    valid: bool,
    /// xz coordinates that have light coming from above
    incoming: Lightfield,
    /// xz coordinates where some block in the chunk stops light from passing
    occlusion: Lightfield,
}
impl ChunkLightingState {
    fn empty() -> Self {
        Self {
            valid: false,
            incoming: Lightfield::zero(),
            occlusion: Lightfield::zero(),
        }
    }
    fn outgoing(&self) -> Lightfield {
        self.incoming & !self.occlusion
    }
}

/// Holds state of a light propagation calculation. Exposed to callers so they can keep a
/// scratchpad around instead of constantly making new allocations.
pub struct LightScratchpad {
    light_buffer: Box<[u8; 48 * 48 * 48]>,
    visit_queue: Vec<(i32, i32, i32, u8)>,
    propagation_cache: Box<bitvec::BitArr!(for 48*48*48)>,
}
impl LightScratchpad {
    pub fn clear(&mut self) {
        self.light_buffer.fill(0);
        self.visit_queue.clear();
        self.propagation_cache.fill(false);
    }
    /// Returns the light at the given coordinate, packed with sunlight in the upper 4 bits and
    /// light from sources in the lower 4 bits.
    ///
    /// Coordinates are relative to the center chunk and range over [-16, 32).
    #[inline(always)]
    pub fn get_packed_u4_u4(&self, x: i32, y: i32, z: i32) -> u8 {
        self.light_buffer[(x + 16) as usize * 48 * 48 + (z + 16) as usize * 48 + (y + 16) as usize]
    }

    #[inline(always)]
    pub fn get_global_light(&self, x: i32, y: i32, z: i32) -> u8 {
        self.get_packed_u4_u4(x, y, z) >> 4
    }

    #[inline(always)]
    pub fn get_local_light(&self, x: i32, y: i32, z: i32) -> u8 {
        self.get_packed_u4_u4(x, y, z) & 0xf
    }
}
impl Default for LightScratchpad {
    fn default() -> Self {
        Self {
            light_buffer: Box::new([0; 48 * 48 * 48]),
            visit_queue: Vec::new(),
            propagation_cache: Box::new(bitvec::array::BitArray::ZERO),
        }
    }
}

#[inline]
fn check_propagation_and_push<F>(
    queue: &mut Vec<(i32, i32, i32, u8)>,
    light_buffer: &mut [u8; 48 * 48 * 48],
    i: i32,
    j: i32,
    k: i32,
    light_level: u8,
    light_propagation: F,
) where
    F: Fn(i32, i32, i32) -> bool,
{
    if i < -16 || j < -16 || k < -16 || i >= 32 || j >= 32 || k >= 32 {
        return;
    }
    if !light_propagation(i, j, k) {
        return;
    }
    let old_level =
        light_buffer[(i + 16) as usize * 48 * 48 + (k + 16) as usize * 48 + (j + 16) as usize];
    // Take the maximum value of the upper and lower nibbles independently
    let max_level =
        ((old_level & 0xf).max(light_level & 0xf)) | (old_level & 0xf0).max(light_level & 0xf0);
    if max_level == old_level {
        return;
    }

    light_buffer[(i + 16) as usize * 48 * 48 + (k + 16) as usize * 48 + (j + 16) as usize] =
        max_level;
    let i_dist = (-1 - i).max(i - 16);
    let j_dist = (-1 - j).max(j - 16);
    let k_dist = (-1 - k).max(k - 16);
    let dist = i_dist + j_dist + k_dist;
    let max_level = (light_level >> 4).max(light_level & 0xf);
    if dist < (max_level as i32) {
        queue.push((i, j, k, light_level));
    }
}

pub trait ChunkBuffer {
    /// Returns a single cell at the given offset
    fn get(&self, offset: ChunkOffset) -> ContentId;
    /// Returns a slice of (x, 0, z), (x, 1, z), ..., (x, 15, z)
    fn vertical_slice(&self, x: u8, z: u8) -> &[ContentId; 16];
}

/// A type that holds a chunk and the immediately adjacent chunks
pub trait NeighborBuffer {
    /// The underlying chunk that this buffer holds.
    type Chunk<'a>: ChunkBuffer
    where
        Self: 'a;
    /// Returns this chunk if available. If not, None is returned.
    fn get(&self, dx: i32, dy: i32, dz: i32) -> Option<Self::Chunk<'_>>;
    /// Returns the sunlight entering the top of this chunk.
    fn inbound_light(&self, dx: i32, dy: i32, dz: i32) -> Lightfield;
}

/// Fills in scratchpad with light in the center chunk of the neighbor buffer.
pub fn propagate_light(
    neighbors: impl NeighborBuffer,
    scratchpad: &mut LightScratchpad,
    propagates_light: impl Fn(ContentId) -> bool,
    light_emission: impl Fn(ContentId) -> u8,
) {
    scratchpad.clear();

    // First, scan through the neighborhood looking for light sources.
    // x is the major index, z is intermediate, and y is the minor index
    for x_coarse in -1i32..=1 {
        for z_coarse in -1i32..=1 {
            for y_coarse in -1i32..=1 {
                let Some(chunk) = neighbors.get(x_coarse, y_coarse, z_coarse) else {
                    continue;
                };
                let global_inbound_lights = neighbors.inbound_light(x_coarse, y_coarse, z_coarse);
                for x_fine in 0i32..16 {
                    for z_fine in 0i32..16 {
                        let x = x_coarse * 16 + x_fine;
                        let z = z_coarse * 16 + z_fine;

                        let subslice = chunk.vertical_slice(x_fine as u8, z_fine as u8);
                        let mut global_light =
                            global_inbound_lights.get(x_fine as u8, z_fine as u8);
                        for (y_fine, &content) in subslice.iter().enumerate().rev() {
                            let y = y_coarse * 16 + y_fine as i32;
                            let propagates_light = propagates_light(content);
                            scratchpad.propagation_cache.set(
                                ((x + 16) * 48 * 48 + (z + 16) * 48 + (y + 16)) as usize,
                                propagates_light,
                            );
                            let light_emission = light_emission(content).min(LIGHT_MAX);
                            if !propagates_light {
                                global_light = false;
                            }
                            let global_bits = if global_light { LIGHT_SUN << 4 } else { 0 };
                            let effective_emission = light_emission | global_bits;
                            if effective_emission > 0 {
                                check_propagation_and_push(
                                    &mut scratchpad.visit_queue,
                                    &mut scratchpad.light_buffer,
                                    x,
                                    y,
                                    z,
                                    effective_emission,
                                    |_, _, _| true,
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    let propagates_light_check = |x: i32, y: i32, z: i32| {
        scratchpad.propagation_cache
            [(x + 16) as usize * 48 * 48 + (z + 16) as usize * 48 + (y + 16) as usize]
    };

    // Then, while the visit queue is non-empty, attempt to propagate light
    while let Some((x, y, z, light_level)) = scratchpad.visit_queue.pop() {
        let decremented =
            ((light_level & 0xf).saturating_sub(0x1)) | ((light_level & 0xf0).saturating_sub(0x10));
        for (dx, dy, dz) in [
            (-1, 0, 0),
            (1, 0, 0),
            (0, -1, 0),
            (0, 1, 0),
            (0, 0, -1),
            (0, 0, 1),
        ] {
            check_propagation_and_push(
                &mut scratchpad.visit_queue,
                &mut scratchpad.light_buffer,
                x + dx,
                y + dy,
                z + dz,
                decremented,
                propagates_light_check,
            );
        }
    }
}
