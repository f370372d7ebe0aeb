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

//! Places the caves of one chunk and relights what they touched.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use calcite_core::coordinates::BlockCoordinate;
use tracing::debug;

use crate::caves::{CaveRequest, CavesLegacy, CavesRandomWalk, TunnelCarver};
use crate::gennotify::{GenNotifyType, GenerateNotifier};
use crate::heightmap::Heightmap;
use crate::light_repair::{chunks_to_relight, LightRepair};
use crate::node_def::NodeDefManager;
use crate::noise::OctavePerlin;
use crate::random::{PseudoRandom, RandomSource};
use crate::settings::{CarverKind, CavegenSettings};
use crate::voxel::VoxelManipulator;

/// What [CaveGenerator::generate] did to a chunk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CaveGenReport {
    /// Caves attempted, large ones included.
    pub caves: u32,
    pub large_caves: u32,
    /// Map blocks that had a cell written.
    pub modified_chunks: usize,
    pub relit_chunks: usize,
    /// Cave start and end points, by event name. Empty unless notifications are enabled.
    pub events: BTreeMap<&'static str, Vec<BlockCoordinate>>,
}

enum Carver {
    RandomWalk(CavesRandomWalk),
    Legacy {
        carver: CavesLegacy,
        cave_amount: OctavePerlin,
    },
}

/// Seed shared by everything generated for the chunk starting at `node_min`.
pub fn block_seed(seed: i32, node_min: BlockCoordinate) -> u32 {
    seed.wrapping_add(node_min.z.wrapping_mul(38134234))
        .wrapping_add(node_min.y.wrapping_mul(42123))
        .wrapping_add(node_min.x.wrapping_mul(23)) as u32
}

/// Runs the configured carver over chunks. Shareable between workers, as long as the
/// manipulators they pass in don't overlap.
pub struct CaveGenerator {
    settings: CavegenSettings,
    carver: Carver,
    light_repair: LightRepair,
}

impl CaveGenerator {
    /// Liquids are looked up through their mapgen aliases.
    pub fn new(ndef: Arc<NodeDefManager>, settings: CavegenSettings) -> Result<Self> {
        settings.validate()?;
        let carver = match settings.carver {
            CarverKind::RandomWalk => Carver::RandomWalk(
                CavesRandomWalk::new(ndef.clone(), settings.seed, settings.water_level, None, None)
                    .with_lava_depth(settings.lava_depth),
            ),
            CarverKind::Legacy => Carver::Legacy {
                carver: CavesLegacy::new(ndef.clone(), settings.water_level, None, None),
                cave_amount: OctavePerlin::new(settings.cave_noise.clone(), settings.seed as u32),
            },
        };
        Ok(Self {
            settings,
            carver,
            light_repair: LightRepair::new(ndef),
        })
    }

    pub fn settings(&self) -> &CavegenSettings {
        &self.settings
    }

    /// Carves the caves of the chunk `node_min..=node_max` and repairs lighting.
    ///
    /// `vm` should extend at least 16 nodes past the chunk on every side; caves that wander
    /// beyond it are cut off. `max_stone_height` bounds how high caves may climb.
    #[tracing::instrument(level = "debug", skip_all, fields(node_min = ?node_min))]
    pub fn generate(
        &self,
        vm: &mut VoxelManipulator,
        node_min: BlockCoordinate,
        node_max: BlockCoordinate,
        max_stone_height: i32,
        heightmap: Option<&Heightmap>,
    ) -> CaveGenReport {
        let mut notifier = self
            .settings
            .notify_caves
            .then(|| GenerateNotifier::new(&GenNotifyType::ALL));
        let request = |is_large_cave| CaveRequest {
            node_min,
            node_max,
            is_large_cave,
            max_stone_height,
            heightmap,
        };
        let blockseed = block_seed(self.settings.seed, node_min) as i32;
        let mut ps = PseudoRandom::new(blockseed.wrapping_add(21343));

        let mut report = CaveGenReport::default();
        match &self.carver {
            Carver::RandomWalk(carver) => {
                let small = ps.range(
                    self.settings.small_cave_num_min,
                    self.settings.small_cave_num_max,
                );
                for _ in 0..small {
                    carver.make_cave(vm, &request(false), &mut ps, notifier.as_mut());
                }
                let mut large = 0;
                if node_max.y <= self.settings.large_cave_depth {
                    large = ps.range(
                        self.settings.large_cave_num_min,
                        self.settings.large_cave_num_max,
                    );
                    for _ in 0..large {
                        carver.make_cave(vm, &request(true), &mut ps, notifier.as_mut());
                    }
                }
                report.caves = (small + large) as u32;
                report.large_caves = large as u32;
            }
            Carver::Legacy {
                carver,
                cave_amount,
            } => {
                let mut ps2 = PseudoRandom::new(blockseed.wrapping_add(1032));
                let amount = cave_amount
                    .sample2d(node_min.x as f64, node_min.y as f64)
                    .max(0.0);
                let volume = (node_max.x - node_min.x + 1) * (node_max.y - node_min.y + 1) * 16;
                let caves_count = (amount * volume as f64 / 50000.0) as u32;
                let mut bruises = 1;
                if ps.range(1, 6) == 1 {
                    let hi = ps.range(0, 2);
                    bruises = ps.range(0, hi) as u32;
                }
                for i in 0..caves_count + bruises {
                    carver.make_cave(
                        vm,
                        &request(i >= caves_count),
                        (&mut ps, &mut ps2),
                        notifier.as_mut(),
                    );
                }
                report.caves = caves_count + bruises;
                report.large_caves = bruises;
            }
        }

        let modified = vm.take_modified_chunks();
        report.modified_chunks = modified.len();
        let relight = chunks_to_relight(modified, vm.area());
        report.relit_chunks = self.light_repair.repair(vm, relight);
        if let Some(mut notifier) = notifier {
            report.events = notifier.take_events();
        }
        debug!(
            caves = report.caves,
            large = report.large_caves,
            modified = report.modified_chunks,
            "carved chunk"
        );
        report
    }
}
