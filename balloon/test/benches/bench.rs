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

use balloon::{Balloon, BalloonConfig, Store, Table};
use balloon_test::{TestHasher, TestLog};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use keccak_hasher::KeccakHasher;
use memory_store::{MemoryStore, PassThroughCache, SimpleCache};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::sync::Arc;

criterion_group!(benches, add, add_pass_through_history, membership, consistency);
criterion_main!(benches);

fn populated(count: u32) -> (TestLog<KeccakHasher>, Vec<Vec<u8>>) {
	let events = KeccakHasher::events(count);
	let mut log = TestLog::new();
	log.add_all(&events);
	(log, events)
}

fn add(c: &mut Criterion) {
	let events = KeccakHasher::events(1000);
	c.bench_function("add_1000", |b| {
		b.iter_batched(
			TestLog::<KeccakHasher>::new,
			|mut log| {
				for event in events.iter() {
					black_box(log.add(event));
				}
			},
			BatchSize::LargeInput,
		)
	});
}

fn add_pass_through_history(c: &mut Criterion) {
	let events = KeccakHasher::events(1000);
	c.bench_function("add_1000_pass_through_history", |b| {
		b.iter(|| {
			let store = Arc::new(MemoryStore::new());
			let balloon = Balloon::<KeccakHasher, _, _, _>::new(
				store.clone(),
				PassThroughCache::new(Table::HistoryCache, store.clone()),
				SimpleCache::new(),
				BalloonConfig::for_hasher::<KeccakHasher>(),
			)
			.unwrap();
			for event in events.iter() {
				let (commitment, mutations) = balloon.add(event).unwrap();
				store.mutate(mutations).unwrap();
				black_box(commitment);
			}
		})
	});
}

fn membership(c: &mut Criterion) {
	let (log, events) = populated(10_000);
	let current = log.last();
	let mut rng = SmallRng::seed_from_u64(1);
	c.bench_function("membership_query_and_verify", |b| {
		b.iter(|| {
			let index = rng.gen_range(0..events.len());
			let proof = log.balloon.query_membership(&events[index], current.version).unwrap();
			assert!(proof.verify::<KeccakHasher>(&events[index], &current));
		})
	});
}

fn consistency(c: &mut Criterion) {
	let (log, _) = populated(10_000);
	let mut rng = SmallRng::seed_from_u64(2);
	c.bench_function("consistency_query_and_verify", |b| {
		b.iter(|| {
			let end = rng.gen_range(0..log.commitments.len());
			let start = rng.gen_range(0..=end);
			let proof = log.balloon.query_consistency(start as u64, end as u64).unwrap();
			assert!(proof.verify::<KeccakHasher>(&log.commitments[start], &log.commitments[end]));
		})
	});
}
