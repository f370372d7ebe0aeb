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

//! Seeded pseudorandom streams used by the map generator.
//!
//! World generation must be reproducible bit-for-bit for a given seed, so the generator is a
//! fixed linear congruential generator rather than anything from `rand`.

/// A sequential source of pseudorandom numbers. Each draw advances the stream.
pub trait RandomSource {
    /// Returns the next value, in `[0, 32768)`.
    fn next(&mut self) -> u32;

    /// Returns a value in `[min, max]`. `max - min` must be at most
    /// [PseudoRandom::RANDOM_RANGE] / 10.
    fn range(&mut self, min: i32, max: i32) -> i32 {
        assert!(max >= min, "range({min}, {max}): max < min");
        assert!(
            max - min <= (PseudoRandom::RANDOM_RANGE as i32 + 1) / 10,
            "range({min}, {max}) is too wide for an even distribution"
        );
        (self.next() % ((max - min + 1) as u32)) as i32 + min
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    #[inline]
    fn next(&mut self) -> u32 {
        (**self).next()
    }
}

/// The classic `rand()` linear congruential generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PseudoRandom {
    state: i32,
}
impl PseudoRandom {
    /// Largest value [RandomSource::next] can return.
    pub const RANDOM_RANGE: u32 = 32767;

    pub fn new(seed: i32) -> Self {
        Self { state: seed }
    }
    pub fn state(&self) -> i32 {
        self.state
    }
}
impl RandomSource for PseudoRandom {
    #[inline]
    fn next(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1103515245).wrapping_add(12345);
        // Division, not a shift: the quotient truncates toward zero for negative states.
        ((self.state / 65536) as u32) % (Self::RANDOM_RANGE + 1)
    }
}

/// Forwards to an inner stream and counts the draws made through it.
pub struct CountingRandom<R> {
    inner: R,
    count: u64,
}
impl<R: RandomSource> CountingRandom<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, count: 0 }
    }
    pub fn count(&self) -> u64 {
        self.count
    }
    pub fn into_inner(self) -> R {
        self.inner
    }
}
impl<R: RandomSource> RandomSource for CountingRandom<R> {
    #[inline]
    fn next(&mut self) -> u32 {
        self.count += 1;
        self.inner.next()
    }
}
