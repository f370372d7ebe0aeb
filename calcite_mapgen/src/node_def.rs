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

//! Registry of the contents a voxel may hold, and the properties of each that the map
//! generator cares about.

use std::collections::hash_map::Entry;

use anyhow::{bail, ensure, Result};
use calcite_core::constants::contents::{AIR, IGNORE, UNKNOWN};
use calcite_core::content_id::special_contents::{CONTENT_AIR, CONTENT_IGNORE, CONTENT_UNKNOWN};
use calcite_core::content_id::{ContentError, ContentId, MAX_REGISTERED_CONTENT};
use log::info;
use rustc_hash::FxHashMap;

/// Properties of a single content type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentFeatures {
    pub name: String,
    /// If true, cave carvers may replace this content.
    pub is_ground_content: bool,
    /// If true, light passes through this content.
    pub light_propagates: bool,
    /// Light emitted by this content, 0-15.
    pub light_source: u8,
}
impl ContentFeatures {
    /// An opaque, carvable solid such as stone.
    pub fn ground(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_ground_content: true,
            light_propagates: false,
            light_source: 0,
        }
    }
    /// An opaque solid that caves must not cut through.
    pub fn structure(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_ground_content: false,
            light_propagates: false,
            light_source: 0,
        }
    }
    /// A translucent liquid, optionally glowing.
    pub fn liquid(name: impl Into<String>, light_source: u8) -> Self {
        Self {
            name: name.into(),
            is_ground_content: false,
            light_propagates: true,
            light_source,
        }
    }

    fn builtin_air() -> Self {
        Self {
            name: AIR.to_string(),
            is_ground_content: true,
            light_propagates: true,
            light_source: 0,
        }
    }
    fn builtin_ignore() -> Self {
        Self {
            name: IGNORE.to_string(),
            is_ground_content: true,
            light_propagates: false,
            light_source: 0,
        }
    }
    fn builtin_unknown() -> Self {
        Self {
            name: UNKNOWN.to_string(),
            is_ground_content: false,
            light_propagates: false,
            light_source: 0,
        }
    }
}

/// Maps content names to ids and ids to [ContentFeatures].
///
/// Air, ignore and unknown are always present at their reserved ids. Everything else gets the
/// lowest unreserved id in registration order. Ids with no registration resolve to the unknown
/// content, which is neither ground content nor translucent.
pub struct NodeDefManager {
    features: Vec<ContentFeatures>,
    name_to_id: FxHashMap<String, ContentId>,
    aliases: FxHashMap<String, String>,
    next_id: u16,
    // Separate copies of the hot flags, packed densely in order to be more cache friendly
    ground_content: bitvec::vec::BitVec,
    light_propagation: bitvec::vec::BitVec,
}
impl NodeDefManager {
    pub fn new() -> NodeDefManager {
        let reserved_len = CONTENT_IGNORE.index() + 1;
        let mut manager = NodeDefManager {
            features: vec![ContentFeatures::builtin_unknown(); reserved_len],
            name_to_id: FxHashMap::default(),
            aliases: FxHashMap::default(),
            next_id: 0,
            ground_content: bitvec::vec::BitVec::repeat(false, reserved_len),
            light_propagation: bitvec::vec::BitVec::repeat(false, reserved_len),
        };
        manager.put(CONTENT_UNKNOWN, ContentFeatures::builtin_unknown());
        manager.put(CONTENT_AIR, ContentFeatures::builtin_air());
        manager.put(CONTENT_IGNORE, ContentFeatures::builtin_ignore());
        manager
    }

    /// Registers a new content and returns its id.
    ///
    /// Returns an error if the name is already registered (or used by an alias), or if the id
    /// space is exhausted.
    pub fn register(&mut self, features: ContentFeatures) -> Result<ContentId> {
        ensure!(
            !self.aliases.contains_key(&features.name),
            ContentError::NameAlreadyExists(features.name)
        );
        let mut id = ContentId(self.next_id);
        while id.is_reserved() {
            id = ContentId(id.0 + 1);
        }
        if id.0 > MAX_REGISTERED_CONTENT {
            bail!(ContentError::TooManyContents);
        }
        match self.name_to_id.entry(features.name.clone()) {
            Entry::Occupied(_) => bail!(ContentError::NameAlreadyExists(features.name)),
            Entry::Vacant(x) => {
                x.insert(id);
            }
        }
        info!("Registering content {} as {:?}", features.name, id);
        self.put(id, features);
        self.next_id = id.0 + 1;
        Ok(id)
    }

    /// Makes `alias` resolve to whatever `target` resolves to.
    pub fn register_alias(&mut self, alias: &str, target: &str) -> Result<()> {
        ensure!(
            !self.name_to_id.contains_key(alias),
            ContentError::NameAlreadyExists(alias.to_string())
        );
        ensure!(
            self.get_id(target).is_some(),
            ContentError::DanglingAlias(alias.to_string(), target.to_string())
        );
        info!("Registering alias {} -> {}", alias, target);
        self.aliases.insert(alias.to_string(), target.to_string());
        Ok(())
    }

    /// Looks up a name, following at most one alias.
    pub fn get_id(&self, name: &str) -> Option<ContentId> {
        let name = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        self.name_to_id.get(name).copied()
    }

    /// Looks up a name, returning [CONTENT_IGNORE] if it is not registered.
    pub fn get_id_or_ignore(&self, name: &str) -> ContentId {
        self.get_id(name).unwrap_or(CONTENT_IGNORE)
    }

    pub fn get(&self, id: ContentId) -> &ContentFeatures {
        self.features
            .get(id.index())
            .unwrap_or(&self.features[CONTENT_UNKNOWN.index()])
    }

    #[inline]
    pub fn is_ground_content(&self, id: ContentId) -> bool {
        self.ground_content
            .get(id.index())
            .map(|x| *x)
            .unwrap_or(false)
    }

    #[inline]
    pub fn allows_light_propagation(&self, id: ContentId) -> bool {
        // unknown contents don't propagate light
        self.light_propagation
            .get(id.index())
            .map(|x| *x)
            .unwrap_or(false)
    }

    #[inline]
    pub fn light_source(&self, id: ContentId) -> u8 {
        self.features.get(id.index()).map_or(0, |x| x.light_source)
    }

    /// Number of registered contents, including the builtin ones.
    pub fn len(&self) -> usize {
        self.name_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name_to_id.is_empty()
    }

    fn put(&mut self, id: ContentId, features: ContentFeatures) {
        let index = id.index();
        if index >= self.features.len() {
            self.features
                .resize(index + 1, ContentFeatures::builtin_unknown());
            self.ground_content.resize(index + 1, false);
            self.light_propagation.resize(index + 1, false);
        }
        self.ground_content.set(index, features.is_ground_content);
        self.light_propagation.set(index, features.light_propagates);
        self.name_to_id.insert(features.name.clone(), id);
        self.features[index] = features;
    }
}
impl Default for NodeDefManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calcite_core::constants::mapgen_aliases::WATER_SOURCE;

    #[test]
    fn builtins_are_present() {
        let ndef = NodeDefManager::new();
        assert_eq!(ndef.get_id(AIR), Some(CONTENT_AIR));
        assert_eq!(ndef.get_id(IGNORE), Some(CONTENT_IGNORE));
        assert!(ndef.is_ground_content(CONTENT_AIR));
        assert!(ndef.is_ground_content(CONTENT_IGNORE));
        assert!(!ndef.is_ground_content(CONTENT_UNKNOWN));
        assert!(ndef.allows_light_propagation(CONTENT_AIR));
        assert!(!ndef.allows_light_propagation(CONTENT_IGNORE));
        assert_eq!(ndef.get_id_or_ignore("default:stone"), CONTENT_IGNORE);
    }

    #[test]
    fn ids_skip_reserved_range() {
        let mut ndef = NodeDefManager::new();
        let mut last = ContentId(0);
        for i in 0..130 {
            last = ndef
                .register(ContentFeatures::ground(format!("test:block_{i}")))
                .unwrap();
            assert!(!last.is_reserved());
        }
        assert_eq!(last, ContentId(132));
        assert_eq!(ndef.get(ContentId(124)).name, "test:block_124");
        assert_eq!(ndef.get(ContentId(128)).name, "test:block_125");
        assert_eq!(ndef.get(ContentId(9000)).name, UNKNOWN);
        assert!(!ndef.is_ground_content(ContentId(9000)));
    }

    #[test]
    fn duplicates_and_aliases() {
        let mut ndef = NodeDefManager::new();
        let water = ndef
            .register(ContentFeatures::liquid("default:water_source", 0))
            .unwrap();
        assert!(ndef
            .register(ContentFeatures::ground("default:water_source"))
            .is_err());
        assert!(ndef.register_alias("bogus", "default:nonexistent").is_err());
        ndef.register_alias(WATER_SOURCE, "default:water_source")
            .unwrap();
        assert_eq!(ndef.get_id(WATER_SOURCE), Some(water));
        assert!(ndef.register(ContentFeatures::ground(WATER_SOURCE)).is_err());
        assert!(!ndef.is_ground_content(water));
    }
}
