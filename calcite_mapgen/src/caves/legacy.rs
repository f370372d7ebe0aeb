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
use super::{CaveLiquids, CaveRequest, TunnelCarver};
use crate::gennotify::{GenNotifyType, GenerateNotifier};
use crate::heightmap::Heightmap;
use crate::node_def::NodeDefManager;
use crate::random::RandomSource;
use crate::voxel::{VoxelManipulator, VMANIP_FLAG_CAVE};

/// The cave carver of the legacy map generator.
///
/// Kept draw-for-draw compatible with worlds that were generated with it: it takes a second
/// random stream for the roughness coin flip, and a segment that lies above ground still makes
/// every draw a carved segment would, it just doesn't write anything.
pub struct CavesLegacy {
    ndef: Arc<NodeDefManager>,
    water_level: i32,
    liquids: CaveLiquids,
}

impl CavesLegacy {
    /// Liquids left as None are looked up by their mapgen alias.
    pub fn new(
        ndef: Arc<NodeDefManager>,
        water_level: i32,
        water_source: Option<ContentId>,
        lava_source: Option<ContentId>,
    ) -> Self {
        let liquids = CaveLiquids::resolve(&ndef, water_source, lava_source);
        Self {
            ndef,
            water_level,
            liquids,
        }
    }

    pub fn liquids(&self) -> CaveLiquids {
        self.liquids
    }
}

impl TunnelCarver for CavesLegacy {
    /// The main stream, and the stream for the roughness of each segment.
    type Streams<'r> = (&'r mut dyn RandomSource, &'r mut dyn RandomSource);

    #[tracing::instrument(
        level = "trace",
        skip_all,
        fields(large = request.is_large_cave, node_min = ?request.node_min)
    )]
    fn make_cave(
        &self,
        vm: &mut VoxelManipulator,
        request: &CaveRequest<'_>,
        streams: Self::Streams<'_>,
        mut gennotify: Option<&mut GenerateNotifier>,
    ) {
        let (ps, ps2) = streams;
        let mut walk = LegacyWalk::begin(self, vm, request, ps, ps2);
        trace!(
            routepoints = walk.tunnel_routepoints,
            max_d = walk.max_tunnel_diameter,
            "starting legacy cave"
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

struct LegacyWalk<'a, R: RandomSource + ?Sized, R2: RandomSource + ?Sized> {
    carver: &'a CavesLegacy,
    vm: &'a mut VoxelManipulator,
    ps: &'a mut R,
    ps2: &'a mut R2,
    node_min: BlockCoordinate,
    node_max: BlockCoordinate,
    heightmap: Option<&'a Heightmap>,
    large_cave: bool,
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
    orp: Vector3<f32>,
    rs: i32,
}

impl<'a, R: RandomSource + ?Sized, R2: RandomSource + ?Sized> LegacyWalk<'a, R, R2> {
    fn begin(
        carver: &'a CavesLegacy,
        vm: &'a mut VoxelManipulator,
        request: &CaveRequest<'a>,
        ps: &'a mut R,
        ps2: &'a mut R2,
    ) -> Self {
        let large_cave = request.is_large_cave;
        let mut min_tunnel_diameter = 2;
        let mut max_tunnel_diameter = ps.range(2, 6);
        let dswitchint = ps.range(1, 14);
        let part_max_length_rs;
        let tunnel_routepoints;
        if large_cave {
            part_max_length_rs = ps.range(2, 4);
            let most_routepoints = ps.range(15, 30);
            tunnel_routepoints = ps.range(5, most_routepoints);
            min_tunnel_diameter = 5;
            let largest = ps.range(8, 24);
            max_tunnel_diameter = ps.range(7, largest);
        } else {
            part_max_length_rs = ps.range(2, 9);
            let most_routepoints = ps.range(15, 30);
            tunnel_routepoints = ps.range(10, most_routepoints);
        }
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

        LegacyWalk {
            carver,
            vm,
            ps,
            ps2,
            node_min: request.node_min,
            node_max: request.node_max,
            heightmap: request.heightmap,
            large_cave,
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

        let vz = offset_component(self.ps.next(), maxlen.z, maxlen.z as f32 / 2.0);
        let vy = offset_component(self.ps.next(), maxlen.y, maxlen.y as f32 / 2.0);
        let vx = offset_component(self.ps.next(), maxlen.x, maxlen.x as f32 / 2.0);
        let mut vec = Vector3::new(vx, vy, vz);

        // Jump downward sometimes. The first vector is drawn either way.
        if !self.large_cave && self.ps.range(0, 12) == 0 {
            let vz = offset_component(self.ps.next(), maxlen.z, maxlen.z as f32 / 2.0);
            let vy = offset_component(self.ps.next(), maxlen.y * 2, maxlen.y as f32);
            let vx = offset_component(self.ps.next(), maxlen.x, maxlen.x as f32 / 2.0);
            vec = Vector3::new(vx, vy, vz);
        }

        // A segment entirely above ground is walked but not carved.
        let p1 = BlockCoordinate::from_vector_trunc(self.orp)
            + self.region.of
            + BlockCoordinate::splat(rs / 2);
        let p2 = BlockCoordinate::from_vector_trunc(vec) + p1;
        let tunnel_above_ground = p1.y > self.surface(p1) && p2.y > self.surface(p2);

        vec += self.main_direction;
        let rp = self
            .region
            .clamp_route_point(self.orp + vec, self.route_y_min, self.route_y_max);
        let vec = rp - self.orp;
        let veclen = segment_length(vec);

        // Every second section is rough
        let randomize_xz = self.ps2.range(1, 2) == 1;

        let mut f = 0.0f32;
        while f < 1.0 {
            self.carve_route(vec, f, randomize_xz, tunnel_above_ground);
            f = advance_step(f, veclen);
        }

        self.orp = rp;
    }

    fn surface(&self, p: BlockCoordinate) -> i32 {
        let in_chunk = p.z >= self.node_min.z
            && p.z <= self.node_max.z
            && p.x >= self.node_min.x
            && p.x <= self.node_max.x;
        self.heightmap
            .filter(|_| in_chunk)
            .and_then(|hm| hm.get(p.x, p.z))
            .unwrap_or(self.carver.water_level)
    }

    fn carve_route(
        &mut self,
        vec: Vector3<f32>,
        f: f32,
        randomize_xz: bool,
        tunnel_above_ground: bool,
    ) {
        let startp = BlockCoordinate::from_vector_trunc(self.orp) + self.region.of;

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

        for z0 in d0..=d1 {
            let si = half_width(rs, z0.abs());
            let mut x0 = -si - self.ps.range(0, 1);
            while x0 <= si - 1 + self.ps.range(0, 1) {
                if !tunnel_above_ground {
                    let si2 = half_width(rs, x0.abs().max(z0.abs()));
                    for y0 in -si2..=si2 {
                        // Make large caves not so tall
                        if self.large_cave_is_flat && rs > 7 && y0.abs() >= rs / 3 {
                            continue;
                        }
                        let p = cp + BlockCoordinate::new(x0, y0, z0) + self.region.of;
                        self.carve_node(p, startp);
                    }
                }
                x0 += 1;
            }
        }
    }

    #[inline]
    fn carve_node(&mut self, p: BlockCoordinate, startp: BlockCoordinate) {
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
            let content = if full_ymin < water_level && full_ymax > water_level {
                if p.y <= water_level {
                    self.carver.liquids.water
                } else {
                    CONTENT_AIR
                }
            } else if full_ymax < water_level {
                if p.y < startp.y - 2 {
                    self.carver.liquids.lava
                } else {
                    CONTENT_AIR
                }
            } else {
                CONTENT_AIR
            };
            self.vm.set_content_at(i, content);
        } else {
            if c == CONTENT_IGNORE || c == CONTENT_AIR {
                return;
            }
            self.vm.set_content_at(i, CONTENT_AIR);
            self.vm.set_flags_at(i, VMANIP_FLAG_CAVE);
        }
    }
}
