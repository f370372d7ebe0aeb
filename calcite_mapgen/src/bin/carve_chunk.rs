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

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use calcite_core::constants::mapgen_aliases::{LAVA_SOURCE, WATER_SOURCE};
use calcite_core::coordinates::{BlockCoordinate, ChunkCoordinate};
use calcite_mapgen::driver::CaveGenerator;
use calcite_mapgen::heightmap::Heightmap;
use calcite_mapgen::node_def::{ContentFeatures, NodeDefManager};
use calcite_mapgen::settings::{self, CarverKind};
use calcite_mapgen::voxel::{VoxelArea, VoxelManipulator, VMANIP_FLAG_CAVE};
use clap::Parser;
use tracing::metadata::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

/// Carves the caves of a single chunk into solid stone and reports what happened.
#[derive(Parser, Debug, Clone)]
struct Args {
    /// Directory holding cavegen.ron. Without one, defaults are used.
    #[arg(short, long, value_name = "DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Chunk to carve, as x,y,z in chunk units.
    #[arg(short, long, default_value = "0,-4,0", allow_hyphen_values = true)]
    chunk: BlockCoordinate,

    /// Overrides the world seed.
    #[arg(long)]
    seed: Option<i32>,

    /// Uses the legacy carver regardless of the settings.
    #[arg(long)]
    legacy: bool,

    /// Surface height of the flat terrain above the chunk.
    #[arg(long, default_value_t = 0)]
    surface: i32,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer().with_filter(
                tracing_subscriber::EnvFilter::builder()
                    .with_default_directive(LevelFilter::INFO.into())
                    .from_env_lossy(),
            ),
        )
        .init();

    let args = Args::parse();
    let mut settings = match &args.data_dir {
        Some(dir) => settings::load(dir)?,
        None => Default::default(),
    };
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    if args.legacy {
        settings.carver = CarverKind::Legacy;
    }

    let mut ndef = NodeDefManager::new();
    let stone = ndef.register(ContentFeatures::ground("default:stone"))?;
    ndef.register(ContentFeatures::liquid("default:water_source", 0))?;
    ndef.register(ContentFeatures::liquid("default:lava_source", 14))?;
    ndef.register_alias(WATER_SOURCE, "default:water_source")?;
    ndef.register_alias(LAVA_SOURCE, "default:lava_source")?;
    let ndef = Arc::new(ndef);

    let chunk = ChunkCoordinate::new(args.chunk.x, args.chunk.y, args.chunk.z);
    let (node_min, node_max) = (chunk.min_block(), chunk.max_block());
    let area = VoxelArea::new(node_min, node_max)?.pad(BlockCoordinate::splat(16))?;
    let heightmap = Heightmap::flat(node_min, node_max, args.surface)?;
    let mut vm = VoxelManipulator::new_filled(area, stone);

    let generator =
        CaveGenerator::new(ndef, settings).context("setting up the cave generator")?;
    info!(?chunk, carver = ?generator.settings().carver, "carving");
    let report = generator.generate(
        &mut vm,
        node_min,
        node_max,
        args.surface.max(node_max.y),
        Some(&heightmap),
    );
    info!(
        caves = report.caves,
        large_caves = report.large_caves,
        modified_chunks = report.modified_chunks,
        relit_chunks = report.relit_chunks,
        carved = vm.count_flag(VMANIP_FLAG_CAVE),
        "done"
    );
    if report.caves > 0 && report.modified_chunks == 0 {
        warn!("no cave reached the manipulator");
    }
    for (kind, positions) in &report.events {
        for pos in positions {
            info!("{kind} at {}", pos.to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_chunk_coordinates_parse() {
        let args = Args::try_parse_from(["carve_chunk", "--chunk", "-1,-4,2"]).unwrap();
        assert_eq!(args.chunk, BlockCoordinate::new(-1, -4, 2));
        let args = Args::try_parse_from(["carve_chunk", "-c", "-3,0,-5", "--legacy"]).unwrap();
        assert_eq!(args.chunk, BlockCoordinate::new(-3, 0, -5));
        assert!(args.legacy);
    }
}
