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

//! History tree resolvers. A subtree lying entirely before a target is frozen
//! and is read from the cache; subtrees holding a target are expanded.

use super::HistoryPosition;
use crate::{position::Position, resolver::CacheResolver};

/// Expands the path to a single version.
#[derive(Clone, Copy, Debug)]
pub struct SingleTargetedCacheResolver {
	version: u64,
}

impl SingleTargetedCacheResolver {
	pub fn new(version: u64) -> Self {
		SingleTargetedCacheResolver { version }
	}
}

impl CacheResolver<HistoryPosition> for SingleTargetedCacheResolver {
	fn should_get_from_cache(&self, pos: &HistoryPosition) -> bool {
		self.version > pos.last_descendant().index()
	}
}

/// Expands the paths to two versions, `start <= end`.
#[derive(Clone, Copy, Debug)]
pub struct DoubleTargetedCacheResolver {
	start: u64,
	end: u64,
}

impl DoubleTargetedCacheResolver {
	pub fn new(start: u64, end: u64) -> Self {
		DoubleTargetedCacheResolver { start, end }
	}
}

fn double_targeted(start: u64, end: u64, pos: &HistoryPosition) -> bool {
	let last = pos.last_descendant().index();
	if start > last {
		return true
	}
	pos.index() > start && last <= end
}

impl CacheResolver<HistoryPosition> for DoubleTargetedCacheResolver {
	fn should_get_from_cache(&self, pos: &HistoryPosition) -> bool {
		if pos.is_leaf() && pos.index() == self.start {
			return false
		}
		double_targeted(self.start, self.end, pos)
	}
}

/// Like [`DoubleTargetedCacheResolver`] but the `start` leaf is read from the
/// cache as well: one audit path then rebuilds both the `start` and `end` roots.
#[derive(Clone, Copy, Debug)]
pub struct IncrementalCacheResolver {
	start: u64,
	end: u64,
}

impl IncrementalCacheResolver {
	pub fn new(start: u64, end: u64) -> Self {
		IncrementalCacheResolver { start, end }
	}
}

impl CacheResolver<HistoryPosition> for IncrementalCacheResolver {
	fn should_get_from_cache(&self, pos: &HistoryPosition) -> bool {
		if pos.is_leaf() && pos.index() == self.start {
			return true
		}
		double_targeted(self.start, self.end, pos)
	}
}
