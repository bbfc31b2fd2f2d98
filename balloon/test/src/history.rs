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

use crate::test_hashers;
use balloon::{history::HistoryTree, Hasher, MutableCache, Store, Table};
use memory_store::{MemoryStore, PassThroughCache, SimpleCache};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::sync::Arc;

fn digest<H: Hasher>(version: u64) -> H::Out {
	H::hash(&version.to_be_bytes())
}

fn build<H: Hasher, C: MutableCache>(tree: &HistoryTree<H, C>, count: u64, store: Option<&MemoryStore>) -> Vec<H::Out> {
	(0..count)
		.map(|version| {
			let (root, mutations) = tree.add(&digest::<H>(version), version).unwrap();
			if let Some(store) = store {
				store.mutate(mutations).unwrap();
			}
			root
		})
		.collect()
}

test_hashers!(random_memberships_verify, random_memberships_verify_internal);
fn random_memberships_verify_internal<H: Hasher>() {
	let tree = HistoryTree::<H, _>::new(SimpleCache::new());
	let roots = build(&tree, 1000, None);

	let mut rng = SmallRng::seed_from_u64(7);
	for _ in 0..200 {
		let version = rng.gen_range(0..1000u64);
		let index = rng.gen_range(0..=version);
		let proof = tree.prove_membership(index, version).unwrap();
		assert!(proof.audit_path.len() < 32, "{} in {}", index, version);
		assert!(proof.verify::<H>(digest::<H>(index).as_ref(), &roots[version as usize]));
	}
}

test_hashers!(roots_do_not_depend_on_the_cache, roots_do_not_depend_on_the_cache_internal);
fn roots_do_not_depend_on_the_cache_internal<H: Hasher>() {
	let store = Arc::new(MemoryStore::new());
	let through_store = HistoryTree::<H, _>::new(PassThroughCache::new(Table::HistoryCache, store.clone()));
	let in_memory = HistoryTree::<H, _>::new(SimpleCache::new());

	let stored_roots = build(&through_store, 64, Some(&store));
	let cached_roots = build(&in_memory, 64, None);
	assert_eq!(stored_roots, cached_roots);
	assert_eq!(store.len(Table::HistoryCache), in_memory.cache().size());

	let proof = through_store.prove_consistency(10, 63).unwrap();
	assert_eq!(proof, in_memory.prove_consistency(10, 63).unwrap());
	assert!(proof.verify_digests::<H>(&cached_roots[10], &cached_roots[63]));
}

test_hashers!(tampered_memberships_fail, tampered_memberships_fail_internal);
fn tampered_memberships_fail_internal<H: Hasher>() {
	let tree = HistoryTree::<H, _>::new(SimpleCache::new());
	let roots = build(&tree, 37, None);
	let proof = tree.prove_membership(12, 36).unwrap();
	let leaf = digest::<H>(12);
	assert!(proof.verify::<H>(leaf.as_ref(), &roots[36]));
	assert!(!proof.verify::<H>(leaf.as_ref(), &roots[35]));
	assert!(!proof.verify::<H>(digest::<H>(13).as_ref(), &roots[36]));

	for entry in 0..proof.audit_path.len() {
		for byte in 0..H::LENGTH {
			let mut tampered = proof.clone();
			let (_, digest) = tampered.audit_path.iter_mut().nth(entry).unwrap();
			digest[byte] ^= 0x80;
			assert!(!tampered.verify::<H>(leaf.as_ref(), &roots[36]), "entry {} byte {}", entry, byte);
		}
	}
}
