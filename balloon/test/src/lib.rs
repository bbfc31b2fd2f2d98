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

//! Tests for balloon crate.

#[cfg(test)]
mod consistency;
#[cfg(test)]
mod history;
#[cfg(test)]
mod hyper;
#[cfg(test)]
mod membership;
#[cfg(test)]
mod restore;

use balloon::{Balloon, BalloonConfig, Commitment, Hasher, Store};
use event_standardmap::{Alphabet, StandardEvents};
use keccak_hasher::KeccakHasher;
use memory_store::{MemoryStore, SimpleCache};
use pearson_hasher::PearsonHasher;
use std::sync::Arc;

/// Apply a generic test method on every test hasher.
#[macro_export]
macro_rules! test_hashers {
	($test:ident, $test_internal:ident) => {
		#[test]
		fn $test() {
			let _ = env_logger::try_init();
			eprintln!("Running with hasher `KeccakHasher`");
			$test_internal::<keccak_hasher::KeccakHasher>();
			eprintln!("Running with hasher `PearsonHasher`");
			$test_internal::<pearson_hasher::PearsonHasher>();
		}
	};
}

/// Hashers the log is tested with, and the events each one can tell apart.
pub trait TestHasher: Hasher + Sized {
	/// Largest number of events with distinct digests the hasher accepts.
	const MAX_EVENTS: u32;

	/// `count` distinct events whose digests are distinct too.
	fn events(count: u32) -> Vec<Vec<u8>>;
}

impl TestHasher for KeccakHasher {
	const MAX_EVENTS: u32 = u32::MAX;

	fn events(count: u32) -> Vec<Vec<u8>> {
		StandardEvents {
			alphabet: Alphabet::Low,
			min_len: 4,
			journal_len: 28,
			count,
			unique: true,
		}
		.make()
	}
}

impl TestHasher for PearsonHasher {
	// Versions are stored on one byte.
	const MAX_EVENTS: u32 = 256;

	fn events(count: u32) -> Vec<Vec<u8>> {
		assert!(count <= Self::MAX_EVENTS);
		// The Pearson table is a permutation: one byte events never collide.
		(0..count).map(|i| vec![i as u8]).collect()
	}
}

/// Log over an in-memory store.
pub type TestBalloon<H> = Balloon<H, MemoryStore, SimpleCache, SimpleCache>;

/// A log that persists every add and remembers every commitment.
pub struct TestLog<H: Hasher> {
	pub store: Arc<MemoryStore>,
	pub balloon: TestBalloon<H>,
	pub commitments: Vec<Commitment<H::Out>>,
}

impl<H: Hasher> TestLog<H> {
	pub fn new() -> Self {
		Self::with_config(BalloonConfig::for_hasher::<H>())
	}

	pub fn with_config(config: BalloonConfig) -> Self {
		let store = Arc::new(MemoryStore::new());
		let balloon = Balloon::new(store.clone(), SimpleCache::new(), SimpleCache::new(), config)
			.expect("valid configuration");
		TestLog { store, balloon, commitments: Vec::new() }
	}

	/// Reload the log from its store with empty caches.
	pub fn reload(self) -> Self {
		let TestLog { store, balloon, commitments } = self;
		drop(balloon);
		let balloon = Balloon::load(
			store.clone(),
			SimpleCache::new(),
			SimpleCache::new(),
			BalloonConfig::for_hasher::<H>(),
		)
		.expect("log loads");
		TestLog { store, balloon, commitments }
	}

	pub fn add(&mut self, event: &[u8]) -> Commitment<H::Out> {
		let (commitment, mutations) = self.balloon.add(event).expect("add succeeds");
		self.store.mutate(mutations).expect("mutations apply");
		self.commitments.push(commitment);
		commitment
	}

	pub fn add_all(&mut self, events: &[Vec<u8>]) {
		for event in events {
			self.add(event);
		}
	}

	pub fn last(&self) -> Commitment<H::Out> {
		*self.commitments.last().expect("log is not empty")
	}

	/// Commitment a membership proof at `version` verifies against: the
	/// history root of `version` with the current hyper root.
	pub fn commitment_at(&self, version: u64) -> Commitment<H::Out> {
		Commitment { hyper_digest: self.last().hyper_digest, ..self.commitments[version as usize] }
	}
}

impl<H: Hasher> Default for TestLog<H> {
	fn default() -> Self {
		Self::new()
	}
}
