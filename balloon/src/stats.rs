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

//! Operation counters shared by the trees of one log.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters handed to trees and logs at construction, usually behind an `Arc`.
#[derive(Debug, Default)]
pub struct Stats {
	history_adds: AtomicU64,
	hyper_adds: AtomicU64,
	membership_queries: AtomicU64,
	consistency_queries: AtomicU64,
	cache_hits: AtomicU64,
	cache_misses: AtomicU64,
	batch_loads: AtomicU64,
}

/// Point in time copy of [`Stats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
	pub history_adds: u64,
	pub hyper_adds: u64,
	pub membership_queries: u64,
	pub consistency_queries: u64,
	pub cache_hits: u64,
	pub cache_misses: u64,
	pub batch_loads: u64,
}

fn bump(counter: &AtomicU64) {
	counter.fetch_add(1, Ordering::Relaxed);
}

impl Stats {
	pub fn new() -> Self {
		Self::default()
	}

	pub(crate) fn history_add(&self) {
		bump(&self.history_adds)
	}

	pub(crate) fn hyper_add(&self) {
		bump(&self.hyper_adds)
	}

	pub(crate) fn membership_query(&self) {
		bump(&self.membership_queries)
	}

	pub(crate) fn consistency_query(&self) {
		bump(&self.consistency_queries)
	}

	pub(crate) fn cache_lookup(&self, hit: bool) {
		if hit {
			bump(&self.cache_hits)
		} else {
			bump(&self.cache_misses)
		}
	}

	pub(crate) fn batch_load(&self) {
		bump(&self.batch_loads)
	}

	/// Read every counter.
	pub fn snapshot(&self) -> StatsSnapshot {
		let read = |c: &AtomicU64| c.load(Ordering::Relaxed);
		StatsSnapshot {
			history_adds: read(&self.history_adds),
			hyper_adds: read(&self.hyper_adds),
			membership_queries: read(&self.membership_queries),
			consistency_queries: read(&self.consistency_queries),
			cache_hits: read(&self.cache_hits),
			cache_misses: read(&self.cache_misses),
			batch_loads: read(&self.batch_loads),
		}
	}
}
