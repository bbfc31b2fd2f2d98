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

//! Version-ordered history tree.
//!
//! Leaf `v` holds the digest of the event added at version `v`. The tree of
//! version `v` is rooted at `(0, bit_length(v))` and grows on its right edge;
//! every subtree is frozen, and its digest cached, once its last leaf exists.

mod position;
mod proof;
mod pruner;
pub mod resolver;

pub use self::{
	position::HistoryPosition,
	proof::{HistoryProof, IncrementalProof},
};

use self::{
	pruner::{CacheSource, InsertPruner, ReadPruner},
	resolver::{DoubleTargetedCacheResolver, IncrementalCacheResolver, SingleTargetedCacheResolver},
};
use crate::{
	position::Position,
	stats::Stats,
	visitor::{AuditPathVisitor, CollectMutationsVisitor, ComputeHashVisitor, MutationCollector, PrintVisitor},
	Error, Hasher, MutableCache, Mutation, Result, Table,
};
use log::debug;
use parking_lot::Mutex;
use std::{marker::PhantomData, sync::Arc};

const LOG_TARGET: &str = "balloon::history";

/// Turns every frozen digest into a pending mutation.
#[derive(Default)]
struct HistoryCacheWriter {
	mutations: Vec<Mutation>,
}

impl<O: AsRef<[u8]>> MutationCollector<HistoryPosition, O> for HistoryCacheWriter {
	fn collect(&mut self, pos: &HistoryPosition, digest: &O) {
		self.mutations.push(Mutation::new(Table::HistoryCache, pos.bytes().to_vec(), digest.as_ref().to_vec()));
	}
}

/// History tree over a cache of frozen digests.
pub struct HistoryTree<H, C> {
	cache: C,
	write_lock: Mutex<()>,
	stats: Arc<Stats>,
	_hasher: PhantomData<H>,
}

impl<H: Hasher, C: MutableCache> HistoryTree<H, C> {
	pub fn new(cache: C) -> Self {
		Self::with_stats(cache, Default::default())
	}

	pub fn with_stats(cache: C, stats: Arc<Stats>) -> Self {
		HistoryTree { cache, write_lock: Mutex::new(()), stats, _hasher: PhantomData }
	}

	pub fn cache(&self) -> &C {
		&self.cache
	}

	/// Append the digest of the event of `version` and return the new root
	/// along with the digests frozen by it.
	///
	/// Versions must be added in order, and the mutations of the previous
	/// version must be visible through the cache.
	pub fn add(&self, event_digest: &H::Out, version: u64) -> Result<(H::Out, Vec<Mutation>)> {
		let _lock = self.write_lock.lock();
		let (root, mutations) = self.insert(event_digest, version)?;
		self.publish(&mutations);
		Ok((root, mutations))
	}

	/// Same as [`add`](Self::add) but the frozen digests only reach the cache
	/// through [`commit`](Self::commit).
	pub fn prepare(&self, event_digest: &H::Out, version: u64) -> Result<(H::Out, Vec<Mutation>)> {
		let _lock = self.write_lock.lock();
		self.insert(event_digest, version)
	}

	/// Cache the frozen digests of a prepared version.
	pub fn commit(&self, mutations: &[Mutation]) {
		let _lock = self.write_lock.lock();
		self.publish(mutations);
	}

	fn publish(&self, mutations: &[Mutation]) {
		for mutation in mutations.iter().filter(|m| m.table == Table::HistoryCache) {
			self.cache.put(mutation.key.clone(), mutation.value.clone());
		}
	}

	fn insert(&self, event_digest: &H::Out, version: u64) -> Result<(H::Out, Vec<Mutation>)> {
		self.stats.history_add();

		let pruned =
			InsertPruner::<H, C>::new(version, event_digest.as_ref(), &self.cache, &self.stats).prune()?;
		let mut visitor = CollectMutationsVisitor::new(
			PrintVisitor::new(ComputeHashVisitor::<H>::new(), LOG_TARGET),
			HistoryCacheWriter::default(),
		);
		let root = pruned.post_order(&mut visitor);
		let mutations = visitor.into_collector().mutations;

		debug!(target: LOG_TARGET, "added version {}, root {}", version, hex::encode(root));
		Ok((root, mutations))
	}

	/// Prove that the event of `index` belongs to the tree of `version`.
	pub fn prove_membership(&self, index: u64, version: u64) -> Result<HistoryProof> {
		if index > version {
			return Err(Error::OutOfRange { start: index, end: version, current: None })
		}
		let source = CacheSource { cache: &self.cache, target: Some(index), stats: &self.stats };
		let pruned = if index == version {
			let resolver = SingleTargetedCacheResolver::new(version);
			ReadPruner::<H, _, _>::new(version, &resolver, &source).prune()?
		} else {
			let resolver = DoubleTargetedCacheResolver::new(index, version);
			ReadPruner::<H, _, _>::new(version, &resolver, &source).prune()?
		};

		let mut visitor =
			AuditPathVisitor::new(PrintVisitor::new(ComputeHashVisitor::<H>::new(), LOG_TARGET));
		pruned.post_order(&mut visitor);
		let audit_path = visitor.into_audit_path();

		debug!(target: LOG_TARGET, "membership of {} in {}: {} digests", index, version, audit_path.len());
		Ok(HistoryProof { index, version, audit_path })
	}

	/// Prove that the tree of `end` is an append-only extension of the tree of `start`.
	pub fn prove_consistency(&self, start: u64, end: u64) -> Result<IncrementalProof> {
		if start > end {
			return Err(Error::OutOfRange { start, end, current: None })
		}
		let source = CacheSource { cache: &self.cache, target: None, stats: &self.stats };
		let resolver = IncrementalCacheResolver::new(start, end);
		let pruned = ReadPruner::<H, _, _>::new(end, &resolver, &source).prune()?;

		let mut visitor =
			AuditPathVisitor::new(PrintVisitor::new(ComputeHashVisitor::<H>::new(), LOG_TARGET));
		pruned.post_order(&mut visitor);
		let audit_path = visitor.into_audit_path();

		debug!(target: LOG_TARGET, "consistency {}..{}: {} digests", start, end, audit_path.len());
		Ok(IncrementalProof { start, end, audit_path })
	}
}
