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

//! Fractal coherent noise driven by a parameter block, for cave liquid selection and the legacy
//! cave-amount field.

use ::noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

/// Describes a fractal noise field: the sum of `octaves` layers of Perlin noise, each
/// `lacunarity` times finer and `persistence` times weaker than the last.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoiseParams {
    pub offset: f64,
    pub scale: f64,
    /// Size, in nodes, of the largest features along x, y and z
    pub spread: (f64, f64, f64),
    /// Added to the world seed
    pub seed: i32,
    pub octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,
}
impl NoiseParams {
    pub const fn new(
        offset: f64,
        scale: f64,
        spread: (f64, f64, f64),
        seed: i32,
        octaves: u32,
        persistence: f64,
        lacunarity: f64,
    ) -> Self {
        Self {
            offset,
            scale,
            spread,
            seed,
            octaves,
            persistence,
            lacunarity,
        }
    }
}

/// Picks lava over water in random-walk caves.
pub const NP_CAVE_LIQUIDS: NoiseParams =
    NoiseParams::new(0.0, 1.0, (150.0, 150.0, 150.0), 776, 3, 0.6, 2.0);
/// How many caves the legacy carver places in a chunk.
pub const NP_CAVE_AMOUNT: NoiseParams =
    NoiseParams::new(6.0, 6.0, (250.0, 250.0, 250.0), 34329, 3, 0.5, 2.0);

/// A deterministic scalar field over node positions.
pub trait NoiseField3d: Send + Sync {
    fn sample3d(&self, x: f64, y: f64, z: f64) -> f64;
}

/// [NoiseParams] bound to a world seed.
pub struct OctavePerlin {
    params: NoiseParams,
    octaves: Vec<Perlin>,
}
impl OctavePerlin {
    pub fn new(params: NoiseParams, world_seed: u32) -> Self {
        let octaves = (0..params.octaves)
            .map(|i| {
                Perlin::new(
                    world_seed
                        .wrapping_add(params.seed as u32)
                        .wrapping_add(i),
                )
            })
            .collect();
        Self { params, octaves }
    }

    pub fn params(&self) -> &NoiseParams {
        &self.params
    }

    pub fn sample2d(&self, x: f64, y: f64) -> f64 {
        let (sx, sy, _) = self.params.spread;
        let mut frequency = 1.0;
        let mut amplitude = 1.0;
        let mut sum = 0.0;
        for octave in &self.octaves {
            sum += amplitude * octave.get([x * frequency / sx, y * frequency / sy]);
            frequency *= self.params.lacunarity;
            amplitude *= self.params.persistence;
        }
        self.params.offset + self.params.scale * sum
    }
}
impl NoiseField3d for OctavePerlin {
    fn sample3d(&self, x: f64, y: f64, z: f64) -> f64 {
        let (sx, sy, sz) = self.params.spread;
        let mut frequency = 1.0;
        let mut amplitude = 1.0;
        let mut sum = 0.0;
        for octave in &self.octaves {
            sum += amplitude
                * octave.get([x * frequency / sx, y * frequency / sy, z * frequency / sz]);
            frequency *= self.params.lacunarity;
            amplitude *= self.params.persistence;
        }
        self.params.offset + self.params.scale * sum
    }
}

/// A field with the same value everywhere.
pub struct ConstantField(pub f64);
impl NoiseField3d for ConstantField {
    fn sample3d(&self, _x: f64, _y: f64, _z: f64) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_field() {
        let a = OctavePerlin::new(NP_CAVE_LIQUIDS, 42);
        let b = OctavePerlin::new(NP_CAVE_LIQUIDS, 42);
        let c = OctavePerlin::new(NP_CAVE_LIQUIDS, 43);
        let mut differs = false;
        for i in 0..50 {
            let p = (i as f64 * 37.0 - 900.0, i as f64 * -11.0, i as f64 * 5.5);
            assert_eq!(a.sample3d(p.0, p.1, p.2), b.sample3d(p.0, p.1, p.2));
            differs |= a.sample3d(p.0, p.1, p.2) != c.sample3d(p.0, p.1, p.2);
        }
        assert!(differs);
    }

    #[test]
    fn output_is_bounded_by_amplitudes() {
        let amount = OctavePerlin::new(NP_CAVE_AMOUNT, 7);
        // 1 + 0.5 + 0.25, with some slack for Perlin slightly exceeding [-1, 1]
        let bound = 6.0 * 1.75 * 1.1;
        for i in 0..200 {
            let v = amount.sample2d(i as f64 * 123.0, i as f64 * -77.0);
            assert!((v - 6.0).abs() <= bound, "{v}");
        }
    }
}
