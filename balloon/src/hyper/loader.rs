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

//! Batch loading, and the set of batches touched by one insert.

use super::{batch::BatchNode, HyperPosition};
use crate::{position::Position, stats::Stats, Cache, Error, Result, Store, StoreError, Table};
use std::collections::{btree_map::Entry, BTreeMap};

/// Reads batches: above the cache height limit from the cache, at or below it
/// from the [`Table::Hyper`] table.
pub(crate) struct BatchLoader<'a, S, C> {
	pub store: &'a S,
	pub cache: &'a C,
	pub cache_height_limit: u16,
	pub node_size: usize,
	pub stats: &'a Stats,
}

impl<'a, S: Store, C: Cache> BatchLoader<'a, S, C> {
	/// Batch rooted at `pos`, `None` if it was never written.
	pub fn load(&self, pos: &HyperPosition) -> Result<Option<BatchNode>> {
		self.stats.batch_load();
		let raw = if pos.height() > self.cache_height_limit {
			let raw = self.cache.get(pos.bytes());
			self.stats.cache_lookup(raw.is_some());
			raw
		} else {
			match self.store.get(Table::Hyper, pos.bytes()) {
				Ok(pair) => Some(pair.value),
				Err(StoreError::KeyNotFound) => None,
				Err(e) => return Err(e.into()),
			}
		};
		match raw {
			Some(raw) => Ok(Some(BatchNode::decode(self.node_size, &raw)?)),
			None => Ok(None),
		}
	}

	/// Batch rooted at `pos` referenced by a populated parent slot.
	pub fn load_referenced(&self, pos: &HyperPosition) -> Result<BatchNode> {
		self.load(pos)?.ok_or_else(|| Error::MissingBatch(pos.string_id()))
	}
}

struct Loaded {
	pos: HyperPosition,
	batch: BatchNode,
	dirty: bool,
}

/// Batches read or created during one insert, keyed by root position.
#[derive(Default)]
pub(crate) struct BatchSet {
	batches: BTreeMap<Vec<u8>, Loaded>,
}

impl BatchSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn contains(&self, root: &HyperPosition) -> bool {
		self.batches.contains_key(root.bytes())
	}

	pub fn insert(&mut self, root: HyperPosition, batch: BatchNode) {
		let key = root.bytes().to_vec();
		self.batches.insert(key, Loaded { pos: root, batch, dirty: false });
	}

	pub fn get(&self, root: &HyperPosition) -> Result<&BatchNode> {
		self.batches
			.get(root.bytes())
			.map(|l| &l.batch)
			.ok_or_else(|| Error::MissingBatch(root.string_id()))
	}

	pub fn get_mut(&mut self, root: &HyperPosition) -> Result<&mut BatchNode> {
		self.batches
			.get_mut(root.bytes())
			.map(|l| &mut l.batch)
			.ok_or_else(|| Error::MissingBatch(root.string_id()))
	}

	/// Write `digest` at `slot` of the batch rooted at `root` and mark it dirty.
	pub fn write_digest(&mut self, root: &HyperPosition, slot: usize, digest: &[u8]) {
		let loaded = match self.batches.entry(root.bytes().to_vec()) {
			Entry::Occupied(entry) => entry.into_mut(),
			Entry::Vacant(entry) => entry.insert(Loaded {
				pos: root.clone(),
				batch: BatchNode::new(digest.len()),
				dirty: false,
			}),
		};
		loaded.batch.set_digest_at(slot, digest);
		loaded.dirty = true;
	}

	/// Batches written since they were loaded, in position order.
	pub fn into_dirty(self) -> impl Iterator<Item = (HyperPosition, BatchNode)> {
		self.batches.into_iter().filter(|(_, l)| l.dirty).map(|(_, l)| (l.pos, l.batch))
	}
}
