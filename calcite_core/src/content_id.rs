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

use anyhow::{ensure, Result};
use std::fmt::Debug;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Content `{0}` already exists")]
    NameAlreadyExists(String),
    #[error("Too many content types are already registered")]
    TooManyContents,
    #[error("Alias `{0}` points at unregistered content `{1}`")]
    DanglingAlias(String, String),
}

/// Highest id a registered content may have.
pub const MAX_REGISTERED_CONTENT: u16 = 0x7fff;

/// Identifies the material stored in a single voxel.
///
/// Ids 125, 126 and 127 are reserved for the builtin unknown, air and ignore contents;
/// everything else is handed out by the node definition registry in registration order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ContentId(pub u16);

pub mod special_contents {
    use super::ContentId;

    /// Content with an unregistered name
    pub const CONTENT_UNKNOWN: ContentId = ContentId(125);
    /// Empty space
    pub const CONTENT_AIR: ContentId = ContentId(126);
    /// Not generated yet. Cave carvers must never write over this, except when flooding
    /// a large cave.
    pub const CONTENT_IGNORE: ContentId = ContentId(127);
}
use special_contents::*;

impl ContentId {
    pub fn new(id: u16) -> Result<ContentId> {
        ensure!(
            id <= MAX_REGISTERED_CONTENT,
            ContentError::TooManyContents
        );
        Ok(ContentId(id))
    }
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
    #[inline]
    pub fn is_reserved(&self) -> bool {
        (CONTENT_UNKNOWN.0..=CONTENT_IGNORE.0).contains(&self.0)
    }
    #[inline]
    pub fn is_air(&self) -> bool {
        *self == CONTENT_AIR
    }
    #[inline]
    pub fn is_ignore(&self) -> bool {
        *self == CONTENT_IGNORE
    }
}

impl From<u16> for ContentId {
    fn from(value: u16) -> Self {
        ContentId(value)
    }
}
impl From<ContentId> for u16 {
    fn from(value: ContentId) -> Self {
        value.0
    }
}
impl Debug for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            CONTENT_AIR => f.write_str("content:air"),
            CONTENT_IGNORE => f.write_str("content:ignore"),
            CONTENT_UNKNOWN => f.write_str("content:unknown"),
            _ => f.write_str(&format!("content:0x{:x}", self.0)),
        }
    }
}
