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

use crate::{test_hashers, TestHasher};
use balloon::{hyper::HyperTree, Hasher, Store, Table};
use memory_store::{MemoryStore, SimpleCache};
use pearson_hasher::PearsonHasher;
use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};
use std::sync::Arc;

type Tree<H> = HyperTree<H, MemoryStore, SimpleCache>;

fn new_tree<H: Hasher>() -> (Arc<MemoryStore>, Tree<H>) {
	let store = Arc::new(MemoryStore::new());
	let tree = HyperTree::new(store.clone(), SimpleCache::new());
	(store, tree)
}

fn insert<H: Hasher>(store: &MemoryStore, tree: &Tree<H>, keys: &[H::Out]) -> H::Out {
	let mut root = tree.root_digest().unwrap();
	for (version, key) in keys.iter().enumerate() {
		let (new_root, mutations) = tree.add(key, version as u64).unwrap();
		store.mutate(mutations).unwrap();
		root = new_root;
	}
	root
}

#[test]
fn every_pearson_key() {
	let _ = env_logger::try_init();
	let mut keys: Vec<_> = (0..=255u8).map(|k| [k]).collect();
	keys.shuffle(&mut SmallRng::seed_from_u64(3));

	let (store, tree) = new_tree::<PearsonHasher>();
	let half = insert(&store, &tree, &keys[..128]);
	for (version, key) in keys.iter().enumerate() {
		let proof = tree.query_membership(key).unwrap();
		assert_eq!(proof.exists(), version < 128, "key {:02x}", key[0]);
		if version < 128 {
			assert_eq!(proof.version(), Some(version as u64));
		}
		assert!(proof.verify::<PearsonHasher>(key, &half), "key {:02x}", key[0]);
	}

	let (store, full_tree) = new_tree::<PearsonHasher>();
	let full = insert(&store, &full_tree, &keys);
	for (version, key) in keys.iter().enumerate() {
		let proof = full_tree.query_membership(key).unwrap();
		assert_eq!(proof.version(), Some(version as u64));
		assert!(proof.verify::<PearsonHasher>(key, &full));
		// A full tree has no shortcut above the leaves.
		assert_eq!(proof.audit_path.len(), 8);
	}
	assert_eq!(store.len(Table::Index), 256);
}

test_hashers!(insertion_order_is_irrelevant, insertion_order_is_irrelevant_internal);
fn insertion_order_is_irrelevant_internal<H: TestHasher>() {
	let keys: Vec<H::Out> = H::events(60).iter().map(|e| H::hash(e)).collect();
	let (store, sorted) = new_tree::<H>();
	let mut sorted_keys = keys.clone();
	sorted_keys.sort_by(|a, b| a.as_ref().cmp(b.as_ref()));
	// Same versions whatever the order: insert every key with version 0.
	let expected = {
		let mut root = Default::default();
		for key in sorted_keys.iter() {
			let (new_root, mutations) = sorted.add(key, 0).unwrap();
			store.mutate(mutations).unwrap();
			root = new_root;
		}
		root
	};

	let mut rng = SmallRng::seed_from_u64(11);
	for _ in 0..3 {
		let mut shuffled = keys.clone();
		shuffled.shuffle(&mut rng);
		let (store, tree) = new_tree::<H>();
		let mut root = Default::default();
		for key in shuffled.iter() {
			let (new_root, mutations) = tree.add(key, 0).unwrap();
			store.mutate(mutations).unwrap();
			root = new_root;
		}
		assert_eq!(root, expected);
		assert_eq!(tree.root_digest().unwrap(), expected);
	}
}

test_hashers!(tampered_hyper_proofs_fail, tampered_hyper_proofs_fail_internal);
fn tampered_hyper_proofs_fail_internal<H: TestHasher>() {
	let keys: Vec<H::Out> = H::events(40).iter().map(|e| H::hash(e)).collect();
	let (store, tree) = new_tree::<H>();
	let root = insert(&store, &tree, &keys);

	for key in keys.iter().step_by(9) {
		let proof = tree.query_membership(key.as_ref()).unwrap();
		assert!(proof.verify::<H>(key.as_ref(), &root));
		for entry in 0..proof.audit_path.len() {
			let mut tampered = proof.clone();
			let (id, digest) = tampered.audit_path.iter_mut().nth(entry).unwrap();
			let id = id.clone();
			digest[0] ^= 0x01;
			assert!(!tampered.verify::<H>(key.as_ref(), &root), "entry {}", id);
		}

		let mut tampered = proof.clone();
		if let Some((_, value)) = tampered.shortcut.as_mut() {
			let last = value.len() - 1;
			value[last] ^= 0x01;
		}
		assert!(!tampered.verify::<H>(key.as_ref(), &root));
	}
}
