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

use std::sync::Arc;

use calcite_core::constants::CHUNK_SIZE;
use calcite_core::content_id::special_contents::{CONTENT_AIR, CONTENT_IGNORE};
use calcite_core::content_id::ContentId;
use calcite_core::coordinates::BlockCoordinate;
use cgmath::Vector3;
use tracing::trace;

use super::geometry::{
    advance_step, direction_component, half_width, jitter, large_cave_band, lerp_point,
    offset_component, rangelim, segment_length, start_component, start_y_window, WalkRegion,
};
use super::{CaveLiquids, CaveRequest, TunnelCarver, DEFAULT_LAVA_DEPTH};
use crate::gennotify::{GenNotifyType, GenerateNotifier};
use crate::heightmap::Heightmap;
use crate::node_def::NodeDefManager;
use crate::noise::{NoiseField3d, OctavePerlin, NP_CAVE_LIQUIDS};
use crate::random::RandomSource;
use crate::voxel::{VoxelManipulator, VMANIP_FLAG_CAVE};

/// The current cave carver.
///
/// Small caves are winding tunnels, two to six nodes across, that avoid breaking out above the
/// terrain. Large caves are wider and straighter; when flooded, they fill with water up to the
/// water level, or with a liquid picked by noise when the chunk lies entirely below it.
pub struct CavesRandomWalk<N: NoiseField3d = OctavePerlin> {
    ndef: Arc<NodeDefManager>,
    water_level: i32,
    lava_depth: i32,
    liquids: CaveLiquids,
    liquid_noise: N,
}

impl CavesRandomWalk<OctavePerlin> {
    /// Liquids left as None are looked up by their mapgen alias.
    pub fn new(
        ndef: Arc<NodeDefManager>,
        seed: i32,
        water_level: i32,
        water_source: Option<ContentId>,
        lava_source: Option<ContentId>,
    ) -> Self {
        Self::with_noise(
            ndef,
            water_level,
            water_source,
            lava_source,
            OctavePerlin::new(NP_CAVE_LIQUIDS, seed as u32),
        )
    }
}

impl<N: NoiseField3d> CavesRandomWalk<N> {
    /// Like [CavesRandomWalk::new], but with a custom field deciding between lava and water.
    /// Values below 0.4 select lava.
    pub fn with_noise(
        ndef: Arc<NodeDefManager>,
        water_level: i32,
        water_source: Option<ContentId>,
        lava_source: Option<ContentId>,
        liquid_noise: N,
    ) -> Self {
        let liquids = CaveLiquids::resolve(&ndef, water_source, lava_source);
        Self {
            ndef,
            water_level,
            lava_depth: DEFAULT_LAVA_DEPTH,
            liquids,
            liquid_noise,
        }
    }

    /// Sets the height below which flooded caves may hold lava.
    pub fn with_lava_depth(mut self, lava_depth: i32) -> Self {
        self.lava_depth = lava_depth;
        self
    }

    pub fn liquids(&self) -> CaveLiquids {
        self.liquids
    }
}

impl<N: NoiseField3d> TunnelCarver for CavesRandomWalk<N> {
    type Streams<'r> = &'r mut dyn RandomSource;

    #[tracing::instrument(
        level = "trace",
        skip_all,
        fields(large = request.is_large_cave, node_min = ?request.node_min)
    )]
    fn make_cave(
        &self,
        vm: &mut VoxelManipulator,
        request: &CaveRequest<'_>,
        ps: Self::Streams<'_>,
        mut gennotify: Option<&mut GenerateNotifier>,
    ) {
        let mut walk = Walk::begin(self, vm, request, ps);
        trace!(
            routepoints = walk.tunnel_routepoints,
            max_d = walk.max_tunnel_diameter,
            flooded = walk.flooded,
            "starting cave"
        );
        let (begin, end) = if request.is_large_cave {
            (GenNotifyType::LargeCaveBegin, GenNotifyType::LargeCaveEnd)
        } else {
            (GenNotifyType::CaveBegin, GenNotifyType::CaveEnd)
        };
        if let Some(notifier) = gennotify.as_deref_mut() {
            notifier.add_event(begin, walk.region.absolute(walk.orp));
        }

        for j in 0..walk.tunnel_routepoints {
            walk.make_tunnel(j % walk.dswitchint == 0);
        }

        if let Some(notifier) = gennotify {
            notifier.add_event(end, walk.region.absolute(walk.orp));
        }
    }
}

/// State of one cave while it is being carved.
struct Walk<'a, R: RandomSource + ?Sized, N: NoiseField3d> {
    carver: &'a CavesRandomWalk<N>,
    vm: &'a mut VoxelManipulator,
    ps: &'a mut R,
    node_min: BlockCoordinate,
    node_max: BlockCoordinate,
    heightmap: Option<&'a Heightmap>,
    large_cave: bool,
    flooded: bool,
    large_cave_is_flat: bool,
    dswitchint: i32,
    part_max_length_rs: i32,
    tunnel_routepoints: i32,
    min_tunnel_diameter: i32,
    max_tunnel_diameter: i32,
    region: WalkRegion,
    route_y_min: i32,
    route_y_max: i32,
    main_direction: Vector3<f32>,
    /// Cursor, relative to the region origin
    orp: Vector3<f32>,
    /// Diameter of the current segment
    rs: i32,
}

impl<'a, R: RandomSource + ?Sized, N: NoiseField3d> Walk<'a, R, N> {
    fn begin(
        carver: &'a CavesRandomWalk<N>,
        vm: &'a mut VoxelManipulator,
        request: &CaveRequest<'a>,
        ps: &'a mut R,
    ) -> Self {
        let large_cave = request.is_large_cave;
        let dswitchint = ps.range(1, 14);
        let flooded = ps.range(1, 2) == 2;
        let (part_max_length_rs, tunnel_routepoints, min_tunnel_diameter, max_tunnel_diameter) =
            if large_cave {
                let part = ps.range(2, 4);
                let most_routepoints = ps.range(15, 30);
                let routepoints = ps.range(5, most_routepoints);
                let largest = ps.range(8, 24);
                (part, routepoints, 5, ps.range(7, largest))
            } else {
                let part = ps.range(2, 9);
                let most_routepoints = ps.range(15, 30);
                let routepoints = ps.range(10, most_routepoints);
                (part, routepoints, 2, ps.range(2, 6))
            };
        let large_cave_is_flat = ps.range(0, 1) == 0;

        let region = WalkRegion::new(request.node_min, request.node_max, max_tunnel_diameter);
        let mut route_y_min = 0;
        let mut route_y_max = region.route_y_max(request.max_stone_height, max_tunnel_diameter);
        if large_cave {
            let (minpos, band_max) = large_cave_band(
                request.node_min.y,
                request.node_max.y,
                carver.water_level,
                region.of.y,
                max_tunnel_diameter,
                route_y_max,
            );
            route_y_max = band_max;
            route_y_min = rangelim(
                ps.range(minpos, minpos + max_tunnel_diameter),
                0,
                route_y_max,
            );
        }

        let (start_y_min, start_y_max) = start_y_window(route_y_min, route_y_max, region.ar.y);
        let z = start_component((ps.next() % region.ar.z as u32) as i32);
        let y = start_component(ps.range(start_y_min, start_y_max));
        let x = start_component((ps.next() % region.ar.x as u32) as i32);

        Walk {
            carver,
            vm,
            ps,
            node_min: request.node_min,
            node_max: request.node_max,
            heightmap: request.heightmap,
            large_cave,
            flooded,
            large_cave_is_flat,
            dswitchint,
            part_max_length_rs,
            tunnel_routepoints,
            min_tunnel_diameter,
            max_tunnel_diameter,
            region,
            route_y_min,
            route_y_max,
            main_direction: Vector3::new(0.0, 0.0, 0.0),
            orp: Vector3::new(x, y, z),
            rs: 0,
        }
    }

    fn make_tunnel(&mut self, dirswitch: bool) {
        if dirswitch && !self.large_cave {
            let z = direction_component(self.ps.next(), 10.0);
            let y = direction_component(self.ps.next(), 30.0);
            let x = direction_component(self.ps.next(), 10.0);
            let scale = self.ps.range(0, 10) as f32 / 10.0;
            self.main_direction = Vector3::new(x * scale, y * scale, z * scale);
        }

        let rs = self
            .ps
            .range(self.min_tunnel_diameter, self.max_tunnel_diameter);
        self.rs = rs;
        let part_len = rs * self.part_max_length_rs;
        let maxlen = if self.large_cave {
            BlockCoordinate::new(part_len, part_len / 2, part_len)
        } else {
            BlockCoordinate::new(part_len, self.ps.range(1, part_len), part_len)
        };

        // Jump downward sometimes
        let jump = !self.large_cave && self.ps.range(0, 12) == 0;
        let vz = offset_component(self.ps.next(), maxlen.z, maxlen.z as f32 / 2.0);
        let vy = if jump {
            offset_component(self.ps.next(), maxlen.y * 2, maxlen.y as f32)
        } else {
            offset_component(self.ps.next(), maxlen.y, maxlen.y as f32 / 2.0)
        };
        let vx = offset_component(self.ps.next(), maxlen.x, maxlen.x as f32 / 2.0);
        let mut vec = Vector3::new(vx, vy, vz);

        // Only the endpoints are checked, and both must be above the surface. Skipping when either
        // one is would reject segments that break out of the ground, and change every cave.
        let p1 = BlockCoordinate::from_vector_trunc(self.orp)
            + self.region.of
            + BlockCoordinate::splat(rs / 2);
        let p2 = BlockCoordinate::from_vector_trunc(vec) + p1;
        if self.is_above_surface(p1) && self.is_above_surface(p2) {
            return;
        }

        vec += self.main_direction;
        let rp = self
            .region
            .clamp_route_point(self.orp + vec, self.route_y_min, self.route_y_max);
        let vec = rp - self.orp;
        let veclen = segment_length(vec);

        // Every second section is rough
        let randomize_xz = self.ps.range(1, 2) == 1;

        let mut f = 0.0f32;
        while f < 1.0 {
            self.carve_route(vec, f, randomize_xz);
            f = advance_step(f, veclen);
        }

        self.orp = rp;
    }

    fn is_above_surface(&self, p: BlockCoordinate) -> bool {
        let in_chunk = p.z >= self.node_min.z
            && p.z <= self.node_max.z
            && p.x >= self.node_min.x
            && p.x <= self.node_max.x;
        match self
            .heightmap
            .filter(|_| in_chunk)
            .and_then(|hm| hm.get(p.x, p.z))
        {
            Some(surface) => surface < p.y,
            None => p.y > self.carver.water_level,
        }
    }

    fn cave_liquid(&self, startp: BlockCoordinate) -> ContentId {
        let nval = self.carver.liquid_noise.sample3d(
            startp.x as f64,
            startp.y as f64,
            startp.z as f64,
        );
        if nval < 0.40 && self.node_max.y < self.carver.lava_depth {
            self.carver.liquids.lava
        } else {
            self.carver.liquids.water
        }
    }

    fn carve_route(&mut self, vec: Vector3<f32>, f: f32, randomize_xz: bool) {
        let startp = BlockCoordinate::from_vector_trunc(self.orp) + self.region.of;
        // The liquid only matters for flooded large caves.
        let liquid = if self.large_cave && self.flooded {
            self.cave_liquid(startp)
        } else {
            self.carver.liquids.water
        };

        let mut fp = lerp_point(self.orp, vec, f);
        fp.x = jitter(fp.x, self.ps.range(-10, 10));
        fp.z = jitter(fp.z, self.ps.range(-10, 10));
        let cp = BlockCoordinate::from_vector_trunc(fp);

        let rs = self.rs;
        let mut d0 = -rs / 2;
        let mut d1 = d0 + rs;
        if randomize_xz {
            d0 += self.ps.range(-1, 1);
            d1 += self.ps.range(-1, 1);
        }

        let flat_cave_floor = !self.large_cave && self.ps.range(0, 2) == 2;

        for z0 in d0..=d1 {
            let si = half_width(rs, z0.abs());
            // The upper bound is redrawn every time it is tested.
            let mut x0 = -si - self.ps.range(0, 1);
            while x0 <= si - 1 + self.ps.range(0, 1) {
                let si2 = half_width(rs, x0.abs().max(z0.abs()));
                for y0 in -si2..=si2 {
                    // Make better floors in small caves
                    if flat_cave_floor && y0 <= -rs / 2 && rs <= 7 {
                        continue;
                    }
                    // Make large caves not so tall
                    if self.large_cave_is_flat && rs > 7 && y0.abs() >= rs / 3 {
                        continue;
                    }
                    let p = cp + BlockCoordinate::new(x0, y0, z0) + self.region.of;
                    self.carve_node(p, startp, liquid);
                }
                x0 += 1;
            }
        }
    }

    #[inline]
    fn carve_node(&mut self, p: BlockCoordinate, startp: BlockCoordinate, liquid: ContentId) {
        let area = *self.vm.area();
        if !area.contains(p) {
            return;
        }
        let i = area.index(p);
        let c = self.vm.content_at(i);
        if !self.carver.ndef.is_ground_content(c) {
            return;
        }

        if self.large_cave {
            let full_ymin = self.node_min.y - CHUNK_SIZE;
            let full_ymax = self.node_max.y + CHUNK_SIZE;
            let water_level = self.carver.water_level;
            let content = if self.flooded && full_ymin < water_level && full_ymax > water_level {
                if p.y <= water_level {
                    self.carver.liquids.water
                } else {
                    CONTENT_AIR
                }
            } else if self.flooded && full_ymax < water_level {
                if p.y < startp.y - 4 {
                    liquid
                } else {
                    CONTENT_AIR
                }
            } else {
                CONTENT_AIR
            };
            self.vm.set_content_at(i, content);
        } else {
            if c == CONTENT_IGNORE {
                return;
            }
            self.vm.set_content_at(i, CONTENT_AIR);
            self.vm.set_flags_at(i, VMANIP_FLAG_CAVE);
        }
    }
}
