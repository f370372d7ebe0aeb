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

/// Dimension of a map chunk, in blocks, along each axis.
pub const CHUNK_SIZE: i32 = 16;

/// Names of contents that are always registered.
pub mod contents {
    pub const AIR: &str = "air";
    pub const IGNORE: &str = "ignore";
    pub const UNKNOWN: &str = "unknown";
}

/// Aliases that a game registers so that the map generator can find its liquids without
/// knowing the game's own naming scheme.
pub mod mapgen_aliases {
    pub const WATER_SOURCE: &str = "mapgen_water_source";
    pub const LAVA_SOURCE: &str = "mapgen_lava_source";
    pub const STONE: &str = "mapgen_stone";
}

/// Light levels are stored as two packed nibbles.
pub mod light {
    /// Brightest possible level of either channel.
    pub const LIGHT_MAX: u8 = 15;
    /// Level of unobstructed sunlight.
    pub const LIGHT_SUN: u8 = 15;
}
