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

use calcite_core::constants::mapgen_aliases::{LAVA_SOURCE, WATER_SOURCE};
use calcite_core::content_id::special_contents::{CONTENT_AIR, CONTENT_IGNORE};
use calcite_core::content_id::ContentId;
use calcite_core::coordinates::BlockCoordinate;
use rand::{Rng, SeedableRng};

use super::{CaveLiquids, CaveRequest, CavesLegacy, CavesRandomWalk, TunnelCarver};
use crate::gennotify::{GenNotifyType, GenerateNotifier};
use crate::heightmap::Heightmap;
use crate::node_def::{ContentFeatures, NodeDefManager};
use crate::noise::ConstantField;
use crate::random::{CountingRandom, PseudoRandom, RandomSource};
use crate::voxel::{VoxelArea, VoxelManipulator, VMANIP_FLAG_CAVE};

struct TestContents {
    ndef: Arc<NodeDefManager>,
    stone: ContentId,
    brick: ContentId,
    water: ContentId,
    lava: ContentId,
}

fn test_contents() -> TestContents {
    let mut ndef = NodeDefManager::new();
    let stone = ndef
        .register(ContentFeatures::ground("default:stone"))
        .unwrap();
    let brick = ndef
        .register(ContentFeatures::structure("default:brick"))
        .unwrap();
    let water = ndef
        .register(ContentFeatures::liquid("default:water_source", 0))
        .unwrap();
    let lava = ndef
        .register(ContentFeatures::liquid("default:lava_source", 14))
        .unwrap();
    ndef.register_alias(WATER_SOURCE, "default:water_source")
        .unwrap();
    ndef.register_alias(LAVA_SOURCE, "default:lava_source")
        .unwrap();
    TestContents {
        ndef: Arc::new(ndef),
        stone,
        brick,
        water,
        lava,
    }
}

const NODE_MIN: BlockCoordinate = BlockCoordinate::new(-16, -16, -16);
const NODE_MAX: BlockCoordinate = BlockCoordinate::new(15, 15, 15);

/// The chunk plus a one-chunk margin on every side.
fn padded_area(node_min: BlockCoordinate, node_max: BlockCoordinate) -> VoxelArea {
    VoxelArea::new(node_min, node_max)
        .unwrap()
        .pad(BlockCoordinate::splat(16))
        .unwrap()
}

fn stone_vm(tc: &TestContents) -> VoxelManipulator {
    VoxelManipulator::new_filled(padded_area(NODE_MIN, NODE_MAX), tc.stone)
}

fn request(is_large_cave: bool, heightmap: Option<&Heightmap>) -> CaveRequest<'_> {
    CaveRequest {
        node_min: NODE_MIN,
        node_max: NODE_MAX,
        is_large_cave,
        max_stone_height: 15,
        heightmap,
    }
}

fn random_walk(tc: &TestContents, water_level: i32) -> CavesRandomWalk {
    CavesRandomWalk::new(tc.ndef.clone(), 42, water_level, None, None)
}

fn legacy(tc: &TestContents, water_level: i32) -> CavesLegacy {
    CavesLegacy::new(tc.ndef.clone(), water_level, None, None)
}

#[test]
fn liquids_fall_back_to_aliases_then_air() {
    let tc = test_contents();
    assert_eq!(
        random_walk(&tc, 1).liquids(),
        CaveLiquids {
            water: tc.water,
            lava: tc.lava
        }
    );
    let explicit = CavesLegacy::new(tc.ndef.clone(), 1, Some(tc.lava), Some(CONTENT_IGNORE));
    assert_eq!(explicit.liquids().water, tc.lava);
    assert_eq!(explicit.liquids().lava, tc.lava);

    let bare = Arc::new(NodeDefManager::new());
    let liquids = CavesLegacy::new(bare, 1, None, None).liquids();
    assert_eq!(liquids.water, CONTENT_AIR);
    assert_eq!(liquids.lava, CONTENT_AIR);
}

#[test]
fn random_walk_seed_42_small_cave() {
    let tc = test_contents();
    let heightmap = Heightmap::flat(NODE_MIN, NODE_MAX, 15).unwrap();
    let mut vm = stone_vm(&tc);
    let mut ps = PseudoRandom::new(42);
    let mut notifier = GenerateNotifier::new(&GenNotifyType::ALL);
    random_walk(&tc, 1).make_cave(
        &mut vm,
        &request(false, Some(&heightmap)),
        &mut ps,
        Some(&mut notifier),
    );

    let carved = vm.count_flag(VMANIP_FLAG_CAVE);
    assert!(carved > 0);
    assert_eq!(carved, 6050);
    assert_eq!(vm.count_content(CONTENT_AIR), carved);
    assert_eq!(ps.state(), -1248393279);
    assert_eq!(
        notifier.events_of(GenNotifyType::CaveBegin),
        vec![BlockCoordinate::new(-1, -14, -3)]
    );
    assert_eq!(
        notifier.events_of(GenNotifyType::CaveEnd),
        vec![BlockCoordinate::new(-19, 8, 14)]
    );
    assert!(notifier
        .events_of(GenNotifyType::LargeCaveBegin)
        .is_empty());
}

#[test]
fn legacy_seed_42_small_cave() {
    let tc = test_contents();
    let heightmap = Heightmap::flat(NODE_MIN, NODE_MAX, 15).unwrap();
    let mut vm = stone_vm(&tc);
    let mut ps = CountingRandom::new(PseudoRandom::new(42));
    let mut ps2 = CountingRandom::new(PseudoRandom::new(43));
    let mut notifier = GenerateNotifier::new(&GenNotifyType::ALL);
    legacy(&tc, 1).make_cave(
        &mut vm,
        &request(false, Some(&heightmap)),
        (&mut ps, &mut ps2),
        Some(&mut notifier),
    );

    assert_eq!(vm.count_flag(VMANIP_FLAG_CAVE), 2536);
    assert_eq!(ps.count(), 4931);
    // One roughness flip per route point
    assert_eq!(ps2.count(), 19);
    assert_eq!(ps.into_inner().state(), 914028625);
    assert_eq!(
        notifier.take_events()["cave_begin"],
        vec![BlockCoordinate::new(5, -10, 18)]
    );
}

#[test]
fn carving_is_deterministic() {
    let tc = test_contents();
    let heightmap = Heightmap::from_fn(NODE_MIN, NODE_MAX, |x, z| (x * 3 + z) / 4).unwrap();
    for large in [false, true] {
        let run = |seed: i32| {
            let mut vm = stone_vm(&tc);
            let mut ps = PseudoRandom::new(seed);
            random_walk(&tc, 1).make_cave(&mut vm, &request(large, Some(&heightmap)), &mut ps, None);
            let mut lps = PseudoRandom::new(seed);
            let mut lps2 = PseudoRandom::new(seed ^ 0x5555);
            legacy(&tc, 1).make_cave(
                &mut vm,
                &request(large, Some(&heightmap)),
                (&mut lps, &mut lps2),
                None,
            );
            (vm.nodes().to_vec(), ps, lps, lps2)
        };
        for seed in [0, 7, 12345, -99] {
            let a = run(seed);
            let b = run(seed);
            assert!(a.0 == b.0, "seed {seed} large {large} carved differently");
            assert_eq!(a.1, b.1);
            assert_eq!(a.2, b.2);
            assert_eq!(a.3, b.3);
        }
    }
}

#[test]
fn tiny_regions_stay_in_bounds() {
    let tc = test_contents();
    let mut rng = rand::rngs::StdRng::seed_from_u64(2024);
    let node_min = BlockCoordinate::new(0, -8, 0);
    let node_max = BlockCoordinate::new(15, 7, 15);
    // No margin at all: the widest tunnels reach well outside
    let area = VoxelArea::new(node_min, node_max).unwrap();
    let rw = random_walk(&tc, 1);
    let lg = legacy(&tc, 1);
    for _ in 0..64 {
        let seed: i32 = rng.gen();
        let large = rng.gen_bool(0.5);
        let req = CaveRequest {
            node_min,
            node_max,
            is_large_cave: large,
            max_stone_height: rng.gen_range(-40..40),
            heightmap: None,
        };
        let mut vm = VoxelManipulator::new_filled(area, tc.stone);
        let mut ps = PseudoRandom::new(seed);
        rw.make_cave(&mut vm, &req, &mut ps, None);
        let mut ps2 = PseudoRandom::new(seed.wrapping_add(1));
        lg.make_cave(&mut vm, &req, (&mut ps, &mut ps2), None);
        for chunk in vm.take_modified_chunks() {
            assert!(area.overlaps_chunk(chunk), "{chunk:?}");
        }
        assert_eq!(vm.nodes().len(), area.volume());
    }
}

#[test]
fn small_caves_preserve_non_ground_content() {
    let tc = test_contents();
    let heightmap = Heightmap::flat(NODE_MIN, NODE_MAX, 15).unwrap();
    let area = padded_area(NODE_MIN, NODE_MAX);
    let checkerboard = || {
        let mut vm = VoxelManipulator::new_filled(area, tc.stone);
        for i in 0..area.volume() {
            let p = area.position(i);
            if (p.x + p.y + p.z).rem_euclid(2) == 0 {
                vm.set_content_at(i, tc.brick);
            }
        }
        vm.take_modified_chunks();
        vm
    };
    let bricks = area.volume() / 2;

    let mut vm = checkerboard();
    for seed in 0..8 {
        let mut ps = PseudoRandom::new(seed);
        random_walk(&tc, 1).make_cave(&mut vm, &request(false, Some(&heightmap)), &mut ps, None);
    }
    assert_eq!(vm.count_content(tc.brick), bricks);
    assert!(vm.count_content(CONTENT_AIR) > 0);

    let mut vm = checkerboard();
    for seed in 0..8 {
        let mut ps = PseudoRandom::new(seed);
        let mut ps2 = PseudoRandom::new(seed + 100);
        legacy(&tc, 1).make_cave(
            &mut vm,
            &request(false, Some(&heightmap)),
            (&mut ps, &mut ps2),
            None,
        );
    }
    assert_eq!(vm.count_content(tc.brick), bricks);
    assert!(vm.count_content(CONTENT_AIR) > 0);
}

#[test]
fn only_large_caves_carve_ignore() {
    let tc = test_contents();
    let heightmap = Heightmap::flat(NODE_MIN, NODE_MAX, 1000).unwrap();
    let area = padded_area(NODE_MIN, NODE_MAX);
    for large in [false, true] {
        let mut vm = VoxelManipulator::new_unloaded(area);
        let mut ps = PseudoRandom::new(42);
        random_walk(&tc, 1000).make_cave(&mut vm, &request(large, Some(&heightmap)), &mut ps, None);
        assert_eq!(vm.count_content(CONTENT_IGNORE) < area.volume(), large);
        assert_eq!(vm.count_flag(VMANIP_FLAG_CAVE), 0);

        let mut vm = VoxelManipulator::new_unloaded(area);
        let mut ps = PseudoRandom::new(42);
        let mut ps2 = PseudoRandom::new(43);
        legacy(&tc, 1000).make_cave(
            &mut vm,
            &request(large, Some(&heightmap)),
            (&mut ps, &mut ps2),
            None,
        );
        assert_eq!(vm.count_content(CONTENT_IGNORE) < area.volume(), large);
    }
}

#[test]
fn random_walk_rejects_caves_above_ground() {
    let tc = test_contents();
    let buried = Heightmap::flat(NODE_MIN, NODE_MAX, -1000).unwrap();
    for seed in 0..16 {
        for large in [false, true] {
            let mut vm = stone_vm(&tc);
            let mut ps = CountingRandom::new(PseudoRandom::new(seed));
            random_walk(&tc, -1000).make_cave(&mut vm, &request(large, Some(&buried)), &mut ps, None);
            assert_eq!(vm.count_content(tc.stone), vm.area().volume());
            assert!(vm.take_modified_chunks().is_empty());

            // Rejected segments stop drawing early
            let mut vm = stone_vm(&tc);
            let mut carved_ps = CountingRandom::new(PseudoRandom::new(seed));
            random_walk(&tc, 1000).make_cave(&mut vm, &request(large, None), &mut carved_ps, None);
            assert!(carved_ps.count() > ps.count());
        }
    }
}

#[test]
fn random_walk_keeps_segments_that_break_the_surface() {
    let tc = test_contents();
    let surface = Heightmap::flat(NODE_MIN, NODE_MAX, 0).unwrap();
    let mut vm = stone_vm(&tc);
    let mut ps = PseudoRandom::new(6);
    random_walk(&tc, 1).make_cave(&mut vm, &request(false, Some(&surface)), &mut ps, None);

    // Segments with one endpoint above ground are still carved
    let area = *vm.area();
    let carved: Vec<_> = (0..area.volume())
        .filter(|&i| vm.flags_at(i) & VMANIP_FLAG_CAVE != 0)
        .map(|i| area.position(i))
        .collect();
    assert_eq!(carved.len(), 865);
    assert_eq!(carved.iter().filter(|p| p.y > 0).count(), 102);
}

#[test]
fn legacy_above_ground_segments_draw_like_carved_ones() {
    let tc = test_contents();
    let buried = Heightmap::flat(NODE_MIN, NODE_MAX, -1000).unwrap();
    let towering = Heightmap::flat(NODE_MIN, NODE_MAX, 1000).unwrap();
    for seed in 0..16 {
        let run = |heightmap: &Heightmap, water_level: i32| {
            let mut vm = stone_vm(&tc);
            let mut ps = CountingRandom::new(PseudoRandom::new(seed));
            let mut ps2 = CountingRandom::new(PseudoRandom::new(seed * 31 + 7));
            legacy(&tc, water_level).make_cave(
                &mut vm,
                &request(false, Some(heightmap)),
                (&mut ps, &mut ps2),
                None,
            );
            (
                vm.count_flag(VMANIP_FLAG_CAVE),
                ps.count(),
                ps2.count(),
                ps.into_inner(),
                ps2.into_inner(),
            )
        };
        let above = run(&buried, -1000);
        let below = run(&towering, 1000);
        assert_eq!(above.0, 0);
        assert!(below.0 > 0);
        assert_eq!(above.1, below.1);
        assert_eq!(above.2, below.2);
        assert_eq!(above.3, below.3);
        assert_eq!(above.4, below.4);
    }
}

#[test]
fn flooded_caves_fill_to_the_waterline() {
    let tc = test_contents();
    let heightmap = Heightmap::flat(NODE_MIN, NODE_MAX, 15).unwrap();
    let mut total_water = 0;
    for seed in 0..10 {
        let mut vm = stone_vm(&tc);
        let mut ps = PseudoRandom::new(seed);
        random_walk(&tc, 1).make_cave(&mut vm, &request(true, Some(&heightmap)), &mut ps, None);
        for (i, node) in vm.nodes().iter().enumerate() {
            if node.content == tc.water {
                assert!(vm.area().position(i).y <= 1);
                total_water += 1;
            }
        }
        assert_eq!(vm.count_content(tc.lava), 0);
        // Large caves don't mark their cells
        assert_eq!(vm.count_flag(VMANIP_FLAG_CAVE), 0);
    }
    assert!(total_water > 0);
}

#[test]
fn deep_flooded_caves_pick_liquid_by_noise() {
    let tc = test_contents();
    let node_min = BlockCoordinate::new(-16, -320, -16);
    let node_max = BlockCoordinate::new(15, -289, 15);
    let area = padded_area(node_min, node_max);
    let heightmap = Heightmap::flat(node_min, node_max, 15).unwrap();
    let req = CaveRequest {
        node_min,
        node_max,
        is_large_cave: true,
        max_stone_height: node_max.y,
        heightmap: Some(&heightmap),
    };
    for (field, liquid, other) in [(0.0, tc.lava, tc.water), (1.0, tc.water, tc.lava)] {
        let carver =
            CavesRandomWalk::with_noise(tc.ndef.clone(), 1, None, None, ConstantField(field));
        let mut seen = 0;
        for seed in 0..10 {
            let mut vm = VoxelManipulator::new_filled(area, tc.stone);
            let mut ps = PseudoRandom::new(seed);
            carver.make_cave(&mut vm, &req, &mut ps, None);
            seen += vm.count_content(liquid);
            assert_eq!(vm.count_content(other), 0);
        }
        assert!(seen > 0);
    }
    // Above the lava depth, it's always water
    let carver = CavesRandomWalk::with_noise(tc.ndef.clone(), 1, None, None, ConstantField(0.0))
        .with_lava_depth(-1000);
    for seed in 0..10 {
        let mut vm = VoxelManipulator::new_filled(area, tc.stone);
        let mut ps = PseudoRandom::new(seed);
        carver.make_cave(&mut vm, &req, &mut ps, None);
        assert_eq!(vm.count_content(tc.lava), 0);
    }
}

#[test]
fn legacy_deep_caves_flood_with_lava() {
    let tc = test_contents();
    let node_min = BlockCoordinate::new(-16, -64, -16);
    let node_max = BlockCoordinate::new(15, -49, 15);
    let area = padded_area(node_min, node_max);
    let heightmap = Heightmap::flat(node_min, node_max, 15).unwrap();
    let req = CaveRequest {
        node_min,
        node_max,
        is_large_cave: true,
        max_stone_height: node_max.y,
        heightmap: Some(&heightmap),
    };
    let mut lava = 0;
    for seed in 0..6 {
        let mut vm = VoxelManipulator::new_filled(area, tc.stone);
        let mut ps = PseudoRandom::new(seed);
        let mut ps2 = PseudoRandom::new(seed + 1);
        legacy(&tc, 1).make_cave(&mut vm, &req, (&mut ps, &mut ps2), None);
        assert_eq!(vm.count_content(tc.water), 0);
        lava += vm.count_content(tc.lava);
    }
    assert_eq!(lava, 4581 + 173 + 3199 + 773 + 2914 + 149);
}

#[test]
fn notifier_receives_large_cave_events() {
    let tc = test_contents();
    let mut notifier = GenerateNotifier::new(&[GenNotifyType::LargeCaveBegin]);
    let mut vm = stone_vm(&tc);
    let mut ps = PseudoRandom::new(5);
    let carver = random_walk(&tc, 1);
    carver.make_cave(&mut vm, &request(true, None), &mut ps, Some(&mut notifier));
    carver.make_cave(&mut vm, &request(false, None), &mut ps, Some(&mut notifier));
    let begins = notifier.events_of(GenNotifyType::LargeCaveBegin);
    assert_eq!(begins.len(), 1);
    assert!(vm.area().contains(begins[0]));
    assert_eq!(notifier.len(), 1);
}

#[test]
fn streams_are_usable_through_trait_objects() {
    let tc = test_contents();
    let mut vm = stone_vm(&tc);
    let mut boxed: Box<dyn RandomSource> = Box::new(PseudoRandom::new(42));
    random_walk(&tc, 1).make_cave(&mut vm, &request(false, None), boxed.as_mut(), None);
    assert!(vm.count_flag(VMANIP_FLAG_CAVE) > 0);
}
