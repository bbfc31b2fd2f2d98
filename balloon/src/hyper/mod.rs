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

//! Sparse tree keyed by event digest.
//!
//! The tree has one leaf per possible digest, almost all of them empty. It is
//! stored as [batches](batch) of four levels each; batches rooted above the
//! cache height limit are kept in a cache, the others in the store. A leaf's
//! value is the version its event was added at.

pub mod batch;
mod loader;
mod position;
mod proof;
mod pruner;
pub mod resolver;

pub use self::{position::HyperPosition, proof::HyperProof};

use self::{
	loader::{BatchLoader, BatchSet},
	pruner::{InsertPruner, SearchPruner},
};
use crate::{
	position::Position,
	stats::Stats,
	version_to_bytes,
	visitor::{AuditPathVisitor, CollectMutationsVisitor, ComputeHashVisitor, MutationCollector, PrintVisitor},
	Error, Hasher, MutableCache, Mutation, Result, Store, Table,
};
use log::debug;
use parking_lot::Mutex;
use std::sync::Arc;

const LOG_TARGET: &str = "balloon::hyper";

/// Levels of the tree held by one batch.
pub const BATCH_LEVELS: u16 = 4;

/// Digests of empty subtrees, indexed by height from 0 to `H::bits()`.
pub fn default_hashes<H: Hasher>() -> Vec<H::Out> {
	let mut defaults = Vec::with_capacity(H::bits() as usize + 1);
	let mut current = H::hash(&[0x00, 0x00]);
	defaults.push(current);
	for _ in 0..H::bits() {
		current = H::hash_parts(&[current.as_ref(), current.as_ref()]);
		defaults.push(current);
	}
	defaults
}

/// Keeps the top of the tree, at most 24 levels, in the cache.
pub fn default_cache_height_limit<H: Hasher>() -> u16 {
	let bits = H::bits();
	bits - std::cmp::min(24, (bits / 8) * 4)
}

/// Writes digests back into the slots of the batches holding them.
struct BatchWriter<'a> {
	batches: &'a mut BatchSet,
}

impl<'a, O: AsRef<[u8]>> MutationCollector<HyperPosition, O> for BatchWriter<'a> {
	fn collect(&mut self, pos: &HyperPosition, digest: &O) {
		if pos.height() < pos.num_bits() {
			let (root, slot) = pos.slot_in_parent_batch();
			self.batches.write_digest(&root, slot, digest.as_ref());
		}
		if pos.height() % BATCH_LEVELS == 0 {
			self.batches.write_digest(pos, 0, digest.as_ref());
		}
	}
}

/// Hyper tree reading its lower batches from `store` and its upper ones from
/// `cache`.
pub struct HyperTree<H: Hasher, S, C> {
	store: Arc<S>,
	cache: C,
	cache_height_limit: u16,
	defaults: Vec<H::Out>,
	write_lock: Mutex<()>,
	stats: Arc<Stats>,
}

impl<H: Hasher, S: Store, C: MutableCache> HyperTree<H, S, C> {
	pub fn new(store: Arc<S>, cache: C) -> Self {
		HyperTree {
			store,
			cache,
			cache_height_limit: default_cache_height_limit::<H>(),
			defaults: default_hashes::<H>(),
			write_lock: Mutex::new(()),
			stats: Default::default(),
		}
	}

	/// Tree with an explicit cache height limit, which cannot exceed `H::bits()`.
	pub fn with_config(
		store: Arc<S>,
		cache: C,
		cache_height_limit: u16,
		stats: Arc<Stats>,
	) -> Result<Self> {
		if cache_height_limit > H::bits() {
			return Err(Error::InvalidConfig(format!(
				"cache height limit {} above tree height {}",
				cache_height_limit,
				H::bits()
			)))
		}
		Ok(HyperTree { cache_height_limit, stats, ..Self::new(store, cache) })
	}

	pub fn cache(&self) -> &C {
		&self.cache
	}

	pub fn cache_height_limit(&self) -> u16 {
		self.cache_height_limit
	}

	fn loader(&self) -> BatchLoader<'_, S, C> {
		BatchLoader {
			store: &*self.store,
			cache: &self.cache,
			cache_height_limit: self.cache_height_limit,
			node_size: H::LENGTH,
			stats: &self.stats,
		}
	}

	/// Insert, or update, the leaf of `event_digest` with `version`. Returns
	/// the new root and the batches to persist, followed by the index entry
	/// of the event.
	///
	/// Mutations of previous inserts must have been applied to the store.
	pub fn add(&self, event_digest: &H::Out, version: u64) -> Result<(H::Out, Vec<Mutation>)> {
		let _lock = self.write_lock.lock();
		let (root, mutations) = self.insert(event_digest, version)?;
		self.publish(&mutations);
		Ok((root, mutations))
	}

	/// Same as [`add`](Self::add) without touching the cache: the insert only
	/// becomes visible once its mutations are given to [`commit`](Self::commit).
	pub fn prepare(&self, event_digest: &H::Out, version: u64) -> Result<(H::Out, Vec<Mutation>)> {
		let _lock = self.write_lock.lock();
		self.insert(event_digest, version)
	}

	/// Publish the cached batches of a prepared insert.
	pub fn commit(&self, mutations: &[Mutation]) {
		let _lock = self.write_lock.lock();
		self.publish(mutations);
	}

	fn publish(&self, mutations: &[Mutation]) {
		for mutation in mutations.iter().filter(|m| m.table == Table::HyperCache) {
			self.cache.put(mutation.key.clone(), mutation.value.clone());
		}
	}

	fn insert(&self, event_digest: &H::Out, version: u64) -> Result<(H::Out, Vec<Mutation>)> {
		self.stats.hyper_add();

		let key = event_digest.as_ref();
		let value = version_to_bytes(version, H::LENGTH)?;
		let mut batches = BatchSet::new();
		let pruned = InsertPruner::<H, S, C>::new(
			key,
			&value,
			self.cache_height_limit,
			&self.defaults,
			self.loader(),
			&mut batches,
		)
		.prune()?;

		let mut visitor = CollectMutationsVisitor::new(
			PrintVisitor::new(ComputeHashVisitor::<H>::new(), LOG_TARGET),
			BatchWriter { batches: &mut batches },
		);
		let root = pruned.post_order(&mut visitor);

		let mut mutations = Vec::new();
		for (pos, batch) in batches.into_dirty() {
			let table = if pos.height() > self.cache_height_limit { Table::HyperCache } else { Table::Hyper };
			mutations.push(Mutation::new(table, pos.bytes().to_vec(), batch.encode()));
		}
		mutations.push(Mutation::new(Table::Index, key.to_vec(), version.to_be_bytes().to_vec()));

		debug!(
			target: LOG_TARGET,
			"added {} at version {}, root {}, {} mutations",
			hex::encode(key),
			version,
			hex::encode(root),
			mutations.len(),
		);
		Ok((root, mutations))
	}

	/// Prove presence or absence of `event_digest`.
	pub fn query_membership(&self, event_digest: &[u8]) -> Result<HyperProof> {
		let (pruned, shortcut) =
			SearchPruner::<H, S, C>::new(event_digest, &self.defaults, self.loader()).prune()?;
		let mut visitor =
			AuditPathVisitor::new(PrintVisitor::new(ComputeHashVisitor::<H>::new(), LOG_TARGET));
		pruned.post_order(&mut visitor);
		let audit_path = visitor.into_audit_path();

		debug!(
			target: LOG_TARGET,
			"membership of {}: {} digests, shortcut {:?}",
			hex::encode(event_digest),
			audit_path.len(),
			shortcut.as_ref().map(|(k, _)| hex::encode(k)),
		);
		Ok(HyperProof { key: event_digest.to_vec(), shortcut, audit_path })
	}

	/// Digest of the whole tree.
	pub fn root_digest(&self) -> Result<H::Out> {
		let root = HyperPosition::root(H::bits());
		match self.loader().load(&root)?.as_ref().and_then(|b| b.element_at(0)) {
			Some(raw) => pruner::slot_digest::<H>(raw),
			None => Ok(self.defaults[H::bits() as usize]),
		}
	}

	/// Load every cached batch persisted in [`Table::HyperCache`] into the cache.
	pub fn rebuild_cache(&self) -> Result<()> {
		let _lock = self.write_lock.lock();
		self.cache.fill(self.store.get_all(Table::HyperCache)?)?;
		debug!(target: LOG_TARGET, "rebuilt cache with {} batches", self.cache.size());
		Ok(())
	}
}
