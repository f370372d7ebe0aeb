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

//! Arithmetic shared by both carvers. Everything here is pure; the order of random draws is
//! owned by each carver.
//!
//! Float operations are spelled out component by component, in single precision except where
//! a double-precision constant is involved, so that results match worlds generated before.

use calcite_core::constants::CHUNK_SIZE;
use calcite_core::coordinates::BlockCoordinate;
use cgmath::Vector3;

/// Clamps `v` to `[lo, hi]`, preferring `lo` when the bounds cross.
#[inline]
pub(crate) fn rangelim(v: i32, lo: i32, hi: i32) -> i32 {
    if v < lo {
        lo
    } else if v > hi {
        hi
    } else {
        v
    }
}

/// The box, relative to `of`, that a cave cursor may wander in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct WalkRegion {
    /// Absolute position of the region's origin
    pub(crate) of: BlockCoordinate,
    /// Size of the region
    pub(crate) ar: BlockCoordinate,
}
impl WalkRegion {
    /// The chunk's node range, widened horizontally so tunnels may start outside it and carve in.
    pub(crate) fn new(node_min: BlockCoordinate, node_max: BlockCoordinate, max_d: i32) -> Self {
        let mut ar = node_max - node_min + BlockCoordinate::splat(1);
        let mut of = node_min;
        let more = (CHUNK_SIZE - max_d / 2 - 10).max(1);
        ar.x += 2 * more;
        ar.z += 2 * more;
        of.x -= more;
        of.z -= more;
        Self { of, ar }
    }

    /// Highest cursor height: half a diameter plus seven above the stone surface.
    pub(crate) fn route_y_max(&self, max_stone_height: i32, max_d: i32) -> i32 {
        rangelim(
            -self.of.y + max_stone_height + max_d / 2 + 7,
            0,
            self.ar.y - 1,
        )
    }

    /// Absolute node position of a cursor.
    #[inline]
    pub(crate) fn absolute(&self, cursor: Vector3<f32>) -> BlockCoordinate {
        BlockCoordinate::from_vector_trunc(Vector3::new(
            self.of.x as f32 + cursor.x,
            self.of.y as f32 + cursor.y,
            self.of.z as f32 + cursor.z,
        ))
    }

    /// Keeps a route point inside the region horizontally and inside the vertical band.
    pub(crate) fn clamp_route_point(
        &self,
        mut rp: Vector3<f32>,
        route_y_min: i32,
        route_y_max: i32,
    ) -> Vector3<f32> {
        if rp.x < 0.0 {
            rp.x = 0.0;
        } else if rp.x >= self.ar.x as f32 {
            rp.x = (self.ar.x - 1) as f32;
        }
        if rp.y < route_y_min as f32 {
            rp.y = route_y_min as f32;
        } else if rp.y >= route_y_max as f32 {
            rp.y = (route_y_max - 1) as f32;
        }
        if rp.z < 0.0 {
            rp.z = 0.0;
        } else if rp.z >= self.ar.z as f32 {
            rp.z = (self.ar.z - 1) as f32;
        }
        rp
    }
}

/// For large caves crossing the water level, the band a cave may occupy is centered on the
/// waterline. Returns the lowest start draw and the adjusted maximum height.
pub(crate) fn large_cave_band(
    node_min_y: i32,
    node_max_y: i32,
    water_level: i32,
    of_y: i32,
    max_d: i32,
    route_y_max: i32,
) -> (i32, i32) {
    if node_min_y < water_level && node_max_y > water_level {
        (
            water_level - max_d / 3 - of_y,
            water_level + max_d / 3 - of_y,
        )
    } else {
        (0, route_y_max)
    }
}

/// Range of heights the starting point is drawn from.
pub(crate) fn start_y_window(route_y_min: i32, route_y_max: i32, ar_y: i32) -> (i32, i32) {
    let lo = rangelim(route_y_min, 0, ar_y - 1);
    let hi = rangelim(route_y_max, lo, ar_y - 1);
    (lo, hi)
}

/// Converts a raw draw into a starting coordinate at the center of a node.
#[inline]
pub(crate) fn start_component(draw: i32) -> f32 {
    draw as f32 + 0.5
}

/// A component of the main direction bias from a raw draw, before scaling.
#[inline]
pub(crate) fn direction_component(draw: u32, divisor: f32) -> f32 {
    ((draw % 20) as f32 - 10.0) / divisor
}

/// Displacement `draw % modulus - half`, in single precision.
#[inline]
pub(crate) fn offset_component(draw: u32, modulus: i32, half: f32) -> f32 {
    (draw % modulus as u32) as f32 - half
}

/// Euclidean length, with near-zero lengths treated as 1 so that the step count stays finite.
#[inline]
pub(crate) fn segment_length(v: Vector3<f32>) -> f32 {
    let len = (v.x * v.x + v.y * v.y + v.z * v.z).sqrt();
    if (len as f64) < 0.05 {
        1.0
    } else {
        len
    }
}

/// Advances the interpolation parameter by one node along a segment of length `veclen`.
#[inline]
pub(crate) fn advance_step(f: f32, veclen: f32) -> f32 {
    (f as f64 + 1.0 / veclen as f64) as f32
}

/// Offsets a coordinate by a tenth of a node per unit of `draw`.
#[inline]
pub(crate) fn jitter(c: f32, draw: i32) -> f32 {
    (c as f64 + 0.1 * draw as f64) as f32
}

/// Half width of a tunnel cross-section at distance `a` from its axis.
/// The cross-section is a rounded square: full width near the center, narrowing beyond rs/7.
#[inline]
pub(crate) fn half_width(rs: i32, a: i32) -> i32 {
    rs / 2 - (a - rs / 7 - 1).max(0)
}

/// Point along the segment at parameter `f`.
#[inline]
pub(crate) fn lerp_point(orp: Vector3<f32>, vec: Vector3<f32>, f: f32) -> Vector3<f32> {
    Vector3::new(orp.x + vec.x * f, orp.y + vec.y * f, orp.z + vec.z * f)
}
