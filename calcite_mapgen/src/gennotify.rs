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

//! Records notable structures placed during generation, for games that want to decorate them.

use std::collections::BTreeMap;

use calcite_core::coordinates::BlockCoordinate;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GenNotifyType {
    CaveBegin,
    CaveEnd,
    LargeCaveBegin,
    LargeCaveEnd,
}
impl GenNotifyType {
    pub const ALL: [GenNotifyType; 4] = [
        GenNotifyType::CaveBegin,
        GenNotifyType::CaveEnd,
        GenNotifyType::LargeCaveBegin,
        GenNotifyType::LargeCaveEnd,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GenNotifyType::CaveBegin => "cave_begin",
            GenNotifyType::CaveEnd => "cave_end",
            GenNotifyType::LargeCaveBegin => "large_cave_begin",
            GenNotifyType::LargeCaveEnd => "large_cave_end",
        }
    }
}

#[derive(Clone, Debug)]
struct GenNotifyEvent {
    kind: GenNotifyType,
    pos: BlockCoordinate,
}

/// Collects events of the types it was enabled for and drops the rest.
#[derive(Clone, Debug, Default)]
pub struct GenerateNotifier {
    enabled: Vec<GenNotifyType>,
    events: Vec<GenNotifyEvent>,
}
impl GenerateNotifier {
    pub fn new(enabled: &[GenNotifyType]) -> Self {
        Self {
            enabled: enabled.to_vec(),
            events: Vec::new(),
        }
    }

    pub fn is_enabled(&self, kind: GenNotifyType) -> bool {
        self.enabled.contains(&kind)
    }

    /// Records an event. Returns false if the type is not enabled.
    pub fn add_event(&mut self, kind: GenNotifyType, pos: BlockCoordinate) -> bool {
        if !self.is_enabled(kind) {
            return false;
        }
        self.events.push(GenNotifyEvent { kind, pos });
        true
    }

    /// Positions recorded for one type, in the order they were added.
    pub fn events_of(&self, kind: GenNotifyType) -> Vec<BlockCoordinate> {
        self.events
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.pos)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drains all events, grouped by type name.
    pub fn take_events(&mut self) -> BTreeMap<&'static str, Vec<BlockCoordinate>> {
        let mut result: BTreeMap<&'static str, Vec<BlockCoordinate>> = BTreeMap::new();
        for event in self.events.drain(..) {
            result.entry(event.kind.name()).or_default().push(event.pos);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_enabled_types_are_recorded() {
        let mut notifier = GenerateNotifier::new(&[GenNotifyType::CaveBegin, GenNotifyType::CaveEnd]);
        assert!(notifier.add_event(GenNotifyType::CaveBegin, BlockCoordinate::new(1, 2, 3)));
        assert!(!notifier.add_event(GenNotifyType::LargeCaveBegin, BlockCoordinate::new(0, 0, 0)));
        assert!(notifier.add_event(GenNotifyType::CaveEnd, BlockCoordinate::new(4, 5, 6)));
        assert!(notifier.add_event(GenNotifyType::CaveBegin, BlockCoordinate::new(7, 8, 9)));
        assert_eq!(
            notifier.events_of(GenNotifyType::CaveBegin),
            vec![BlockCoordinate::new(1, 2, 3), BlockCoordinate::new(7, 8, 9)]
        );

        let events = notifier.take_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events["cave_end"], vec![BlockCoordinate::new(4, 5, 6)]);
        assert!(notifier.is_empty());
    }
}
