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

use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::caves::DEFAULT_LAVA_DEPTH;
use crate::noise::{NoiseParams, NP_CAVE_AMOUNT};

/// Which cave carver a [crate::driver::CaveGenerator] runs.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum CarverKind {
    RandomWalk,
    Legacy,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct CavegenSettings {
    pub seed: i32,
    pub water_level: i32,
    /// Flooded random-walk caves may hold lava below this height.
    pub lava_depth: i32,
    pub carver: CarverKind,
    pub small_cave_num_min: i32,
    pub small_cave_num_max: i32,
    pub large_cave_num_min: i32,
    pub large_cave_num_max: i32,
    /// Large random-walk caves are only placed in chunks whose top is at or below this height.
    pub large_cave_depth: i32,
    /// Number of caves per chunk for the legacy carver.
    pub cave_noise: NoiseParams,
    /// Whether to record where caves begin and end.
    pub notify_caves: bool,
}

pub const FILENAME: &str = "cavegen.ron";

impl Default for CavegenSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            water_level: 1,
            lava_depth: DEFAULT_LAVA_DEPTH,
            carver: CarverKind::RandomWalk,
            small_cave_num_min: 0,
            small_cave_num_max: 0,
            large_cave_num_min: 0,
            large_cave_num_max: 2,
            large_cave_depth: -33,
            cave_noise: NP_CAVE_AMOUNT,
            notify_caves: false,
        }
    }
}

impl CavegenSettings {
    /// Checks the cave counts against what the random stream can draw.
    pub fn validate(&self) -> Result<()> {
        for (what, lo, hi) in [
            ("small", self.small_cave_num_min, self.small_cave_num_max),
            ("large", self.large_cave_num_min, self.large_cave_num_max),
        ] {
            ensure!(lo >= 0, "{what} cave minimum {lo} is negative");
            ensure!(
                hi >= lo,
                "{what} cave maximum {hi} is below the minimum {lo}"
            );
            ensure!(hi - lo <= 3276, "{what} cave count range {lo}..={hi} is too wide");
        }
        Ok(())
    }
}

pub fn load(data_dir: &Path) -> Result<CavegenSettings> {
    let config_file = data_dir.join(FILENAME);
    log::info!("Loading cavegen settings from {}", config_file.display());
    if !config_file.exists() {
        log::info!("No cavegen settings found; using defaults");
        return Ok(Default::default());
    }
    let config = ron::from_str::<CavegenSettings>(
        &std::fs::read_to_string(&config_file)
            .with_context(|| format!("reading {}", config_file.display()))?,
    )
    .with_context(|| format!("parsing {}", config_file.display()))?;
    config.validate()?;
    log::info!("Loaded cavegen settings from {}", config_file.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let settings: CavegenSettings =
            ron::from_str("(seed: 1234, carver: Legacy, notify_caves: true)").unwrap();
        assert_eq!(settings.seed, 1234);
        assert_eq!(settings.carver, CarverKind::Legacy);
        assert!(settings.notify_caves);
        assert_eq!(settings.water_level, 1);
        assert_eq!(settings.large_cave_depth, -33);
        assert_eq!(settings.cave_noise, NP_CAVE_AMOUNT);
        settings.validate().unwrap();
    }

    #[test]
    fn load_from_data_dir() {
        let dir = std::env::temp_dir().join(format!("calcite-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let _ = std::fs::remove_file(dir.join(FILENAME));

        let defaults = load(&dir).unwrap();
        assert_eq!(defaults.carver, CarverKind::RandomWalk);
        assert_eq!(defaults.lava_depth, -256);

        std::fs::write(dir.join(FILENAME), "(water_level: -5, small_cave_num_max: 3)").unwrap();
        let loaded = load(&dir).unwrap();
        assert_eq!(loaded.water_level, -5);
        assert_eq!(loaded.small_cave_num_max, 3);

        std::fs::write(dir.join(FILENAME), "(small_cave_num_min: 4, small_cave_num_max: 3)")
            .unwrap();
        assert!(load(&dir).is_err());
        std::fs::write(dir.join(FILENAME), "(carver: Sideways)").unwrap();
        assert!(load(&dir).is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
