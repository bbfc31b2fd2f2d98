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

use crate::{test_hashers, TestHasher, TestLog};
use balloon::{Balloon, BalloonConfig, MutableCache, Mutation, Store, Table, VERSION_KEY};
use memory_store::{MemoryStore, PassThroughCache, SimpleCache};
use std::sync::Arc;

/// Copy every table of `store` into a fresh store.
fn snapshot(store: &MemoryStore) -> Arc<MemoryStore> {
	let copy = Arc::new(MemoryStore::new());
	for table in Table::ALL.iter() {
		let mutations = store
			.get_all(*table)
			.unwrap()
			.map(|pair| Mutation::new(*table, pair.key, pair.value))
			.collect();
		copy.mutate(mutations).unwrap();
	}
	copy
}

test_hashers!(independent_logs_agree, independent_logs_agree_internal);
fn independent_logs_agree_internal<H: TestHasher>() {
	let events = H::events(50);
	let mut a = TestLog::<H>::new();
	let mut b = TestLog::<H>::new();
	a.add_all(&events);
	b.add_all(&events);
	assert_eq!(a.commitments, b.commitments);
}

test_hashers!(reloaded_log_continues, reloaded_log_continues_internal);
fn reloaded_log_continues_internal<H: TestHasher>() {
	let events = H::events(60);
	let mut reference = TestLog::<H>::new();
	reference.add_all(&events);

	let mut log = TestLog::<H>::new();
	log.add_all(&events[..25]);
	let mut log = log.reload();
	assert_eq!(log.balloon.version(), Some(24));
	log.add_all(&events[25..]);
	assert_eq!(log.commitments, reference.commitments);

	let proof = log.balloon.query_membership(&events[3], 59).unwrap();
	assert!(proof.exists);
	assert!(proof.verify::<H>(&events[3], &log.last()));
	assert!(log.balloon.query_consistency(10, 40).unwrap().verify::<H>(&log.commitments[10], &log.commitments[40]));
}

test_hashers!(empty_store_loads_an_empty_log, empty_store_loads_an_empty_log_internal);
fn empty_store_loads_an_empty_log_internal<H: TestHasher>() {
	let log = TestLog::<H>::new().reload();
	assert_eq!(log.balloon.version(), None);
	assert_eq!(log.balloon.hyper_tree().cache().size(), 0);
}

test_hashers!(snapshot_restores_on_another_store, snapshot_restores_on_another_store_internal);
fn snapshot_restores_on_another_store_internal<H: TestHasher>() {
	let events = H::events(30);
	let mut log = TestLog::<H>::new();
	log.add_all(&events);
	let version = log.store.get(Table::Version, VERSION_KEY).unwrap();
	assert_eq!(version.value, 29u64.to_be_bytes().to_vec());

	let copy = snapshot(&log.store);
	let restored: Balloon<H, _, _, _> = Balloon::load(
		copy.clone(),
		PassThroughCache::new(Table::HistoryCache, copy.clone()),
		SimpleCache::new(),
		BalloonConfig::for_hasher::<H>(),
	)
	.unwrap();
	assert_eq!(restored.version(), Some(29));
	assert_eq!(restored.hyper_tree().cache().size(), log.balloon.hyper_tree().cache().size());
	assert_eq!(restored.hyper_tree().root_digest().unwrap(), log.last().hyper_digest);

	for (version, event) in events.iter().enumerate().step_by(5) {
		let proof = restored.query_membership(event, 29).unwrap();
		assert_eq!(proof, log.balloon.query_membership(event, 29).unwrap());
		assert_eq!(proof.actual_version, Some(version as u64));
	}

	let (commitment, mutations) = restored.add(b"after restore").unwrap();
	copy.mutate(mutations).unwrap();
	assert_eq!(commitment, log.add(b"after restore"));
}
