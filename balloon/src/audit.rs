// Copyright 2024 Parity Technologies
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

use crate::{position::Position, Error, Hasher, Result};
use parity_scale_codec::{Decode, Encode};
use std::collections::{btree_map, BTreeMap};

/// Digests a verifier needs, besides the queried leaf, to recompute a root.
/// Keyed by [`Position::string_id`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct AuditPath {
	entries: BTreeMap<String, Vec<u8>>,
}

impl AuditPath {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, id: String, digest: Vec<u8>) {
		self.entries.insert(id, digest);
	}

	pub fn get(&self, id: &str) -> Option<&[u8]> {
		self.entries.get(id).map(|d| &d[..])
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> btree_map::Iter<'_, String, Vec<u8>> {
		self.entries.iter()
	}

	pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, String, Vec<u8>> {
		self.entries.iter_mut()
	}

	/// Digest recorded for `pos`. A missing or malformed entry is an invalid proof.
	pub(crate) fn digest_at<H: Hasher, P: Position>(&self, pos: &P) -> Result<H::Out> {
		let id = pos.string_id();
		let raw = self
			.entries
			.get(&id)
			.ok_or_else(|| Error::InvalidProof(format!("audit path misses position {}", id)))?;
		H::out_from_slice(raw)
			.ok_or_else(|| Error::InvalidProof(format!("audit path entry {} has a bad length", id)))
	}
}
