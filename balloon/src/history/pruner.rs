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

//! Pruners of the history tree.
//!
//! All of them walk down from the root of a version and stop wherever the
//! resolver allows reading a frozen digest. Subtrees whose right child does
//! not exist yet become partial nodes.

use super::{resolver::SingleTargetedCacheResolver, HistoryPosition};
use crate::{
	audit::AuditPath, position::Position, resolver::CacheResolver, stats::Stats, visitor::Visitable,
	CodecError, Error, Hasher, MutableCache, Result,
};
use std::marker::PhantomData;

pub(crate) type HistoryOp<H> = Visitable<HistoryPosition, <H as Hasher>::Out>;

/// Read a frozen digest from `cache`, a miss is a corruption of the store.
fn cached_digest<H: Hasher, C: MutableCache>(
	cache: &C,
	pos: &HistoryPosition,
	stats: &Stats,
) -> Result<H::Out> {
	let raw = cache.get(pos.bytes());
	stats.cache_lookup(raw.is_some());
	let raw = raw.ok_or_else(|| Error::CacheMiss(pos.string_id()))?;
	H::out_from_slice(&raw).ok_or(Error::Codec(CodecError::LengthMismatch {
		expected: H::LENGTH,
		actual: raw.len(),
	}))
}

/// Prunes the tree to append `version`. Every subtree frozen by this version
/// is tagged mutable, the new leaf included.
pub(crate) struct InsertPruner<'a, H, C> {
	version: u64,
	event_digest: &'a [u8],
	resolver: SingleTargetedCacheResolver,
	cache: &'a C,
	stats: &'a Stats,
	_hasher: PhantomData<H>,
}

impl<'a, H: Hasher, C: MutableCache> InsertPruner<'a, H, C> {
	pub fn new(version: u64, event_digest: &'a [u8], cache: &'a C, stats: &'a Stats) -> Self {
		InsertPruner {
			version,
			event_digest,
			resolver: SingleTargetedCacheResolver::new(version),
			cache,
			stats,
			_hasher: PhantomData,
		}
	}

	pub fn prune(&self) -> Result<HistoryOp<H>> {
		self.traverse(HistoryPosition::root(self.version))
	}

	fn traverse(&self, pos: HistoryPosition) -> Result<HistoryOp<H>> {
		if self.resolver.should_get_from_cache(&pos) {
			let digest = cached_digest::<H, C>(self.cache, &pos, self.stats)?;
			return Ok(Visitable::cached(pos, digest))
		}
		if pos.is_leaf() {
			return Ok(Visitable::leaf(pos, self.event_digest.to_vec()).mutable())
		}

		let left = self.traverse(pos.left())?;
		let right_pos = pos.right();
		let node = if right_pos.index() > self.version {
			Visitable::partial(pos, left)
		} else {
			Visitable::node(pos, left, self.traverse(right_pos)?)
		};

		if pos.is_frozen_at(self.version) {
			Ok(node.mutable())
		} else {
			Ok(node)
		}
	}
}

/// Where a read-only pruner takes its digests from.
pub(crate) trait DigestSource<H: Hasher> {
	/// Digest of a position the resolver decided not to expand.
	fn digest(&self, pos: &HistoryPosition) -> Result<H::Out>;

	/// Representation of an expanded leaf.
	fn leaf(&self, pos: HistoryPosition) -> Result<HistoryOp<H>>;
}

/// Digests of a live cache. Only the `target` leaf may be expanded; it is read
/// from the cache but not collected, the verifier holds its value.
pub(crate) struct CacheSource<'a, C> {
	pub cache: &'a C,
	pub target: Option<u64>,
	pub stats: &'a Stats,
}

impl<'a, H: Hasher, C: MutableCache> DigestSource<H> for CacheSource<'a, C> {
	fn digest(&self, pos: &HistoryPosition) -> Result<H::Out> {
		cached_digest::<H, C>(self.cache, pos, self.stats)
	}

	fn leaf(&self, pos: HistoryPosition) -> Result<HistoryOp<H>> {
		if self.target != Some(pos.index()) {
			return Err(Error::CacheMiss(pos.string_id()))
		}
		let digest = cached_digest::<H, C>(self.cache, &pos, self.stats)?;
		Ok(Visitable::cached(pos, digest))
	}
}

/// Digests of a received audit path. Only the `target` leaf may be expanded
/// and it is rebuilt from the event digest.
pub(crate) struct PathSource<'a> {
	pub path: &'a AuditPath,
	pub target: Option<(u64, &'a [u8])>,
}

impl<'a, H: Hasher> DigestSource<H> for PathSource<'a> {
	fn digest(&self, pos: &HistoryPosition) -> Result<H::Out> {
		self.path.digest_at::<H, _>(pos)
	}

	fn leaf(&self, pos: HistoryPosition) -> Result<HistoryOp<H>> {
		match self.target {
			Some((index, value)) if index == pos.index() => Ok(Visitable::leaf(pos, value.to_vec())),
			_ => Err(Error::InvalidProof(format!("proof reaches unexpected leaf {}", pos))),
		}
	}
}

/// Prunes the tree of `version` for a read-only request: frozen positions are
/// collectable digests, the rest is expanded. Shared by searches and
/// verifications, which only differ by their [`DigestSource`].
pub(crate) struct ReadPruner<'a, H, R, S> {
	version: u64,
	resolver: &'a R,
	source: &'a S,
	_hasher: PhantomData<H>,
}

impl<'a, H, R, S> ReadPruner<'a, H, R, S>
where
	H: Hasher,
	R: CacheResolver<HistoryPosition>,
	S: DigestSource<H>,
{
	pub fn new(version: u64, resolver: &'a R, source: &'a S) -> Self {
		ReadPruner { version, resolver, source, _hasher: PhantomData }
	}

	pub fn prune(&self) -> Result<HistoryOp<H>> {
		self.traverse(HistoryPosition::root(self.version))
	}

	fn traverse(&self, pos: HistoryPosition) -> Result<HistoryOp<H>> {
		if self.resolver.should_get_from_cache(&pos) {
			let digest = self.source.digest(&pos)?;
			return Ok(Visitable::cached(pos, digest).collectable())
		}
		if pos.is_leaf() {
			return self.source.leaf(pos)
		}

		let left = self.traverse(pos.left())?;
		let right_pos = pos.right();
		if right_pos.index() > self.version {
			return Ok(Visitable::partial(pos, left))
		}
		Ok(Visitable::node(pos, left, self.traverse(right_pos)?))
	}
}
