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

//! Cave carving for a voxel world generator.
//!
//! [caves] holds the carvers themselves; [driver::CaveGenerator] decides how many caves a
//! chunk gets, runs a carver over a [voxel::VoxelManipulator] and repairs the lighting of
//! everything it touched.

pub mod caves;
pub mod driver;
pub mod gennotify;
pub mod heightmap;
pub mod light_repair;
pub mod node_def;
pub mod noise;
pub mod random;
pub mod settings;
pub mod voxel;

#[cfg(test)]
#[ctor::ctor]
fn init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
