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

//! Pruners of the hyper tree.
//!
//! Empty subtrees are never materialized: they are read as the default digest
//! of their height. A subtree holding a single leaf is a shortcut, hashed as
//! a leaf at the position of the subtree.

use super::{
	batch::BatchNode,
	loader::{BatchLoader, BatchSet},
	resolver::SingleTargetedCacheResolver,
	HyperPosition, BATCH_LEVELS, LOG_TARGET,
};
use crate::{
	audit::AuditPath, position::Position, resolver::CacheResolver, visitor::Visitable, Cache,
	CodecError, Error, Hasher, Result, Store,
};
use log::trace;
use smallvec::SmallVec;
use std::convert::TryFrom;

pub(crate) type HyperOp<H> = Visitable<HyperPosition, <H as Hasher>::Out>;

/// Key and value of a leaf.
pub(crate) type KeyValue = (Vec<u8>, Vec<u8>);

/// Leaves to place below a position, sorted by key.
type Leaves = SmallVec<[KeyValue; 2]>;

/// Keeps the leaf already present for an equal key.
fn insert_sorted(leaves: &mut Leaves, leaf: KeyValue) {
	if let Err(i) = leaves.binary_search_by(|l| l.0.cmp(&leaf.0)) {
		leaves.insert(i, leaf);
	}
}

/// Split at the first key not below `at`.
fn split(mut leaves: Leaves, at: &[u8]) -> (Leaves, Leaves) {
	let i = leaves.iter().position(|l| l.0.as_slice() >= at).unwrap_or(leaves.len());
	let right = leaves.drain(i..).collect();
	(leaves, right)
}

/// Hashed value of a leaf, binding its key.
pub(crate) fn leaf_value(key: &[u8], value: &[u8]) -> Vec<u8> {
	[key, value].concat()
}

pub(crate) fn slot_digest<H: Hasher>(raw: &[u8]) -> Result<H::Out> {
	H::out_from_slice(raw)
		.ok_or(Error::Codec(CodecError::LengthMismatch { expected: H::LENGTH, actual: raw.len() }))
}

fn is_batch_boundary(pos: &HyperPosition, slot: usize) -> bool {
	slot > 0 && pos.height() % BATCH_LEVELS == 0
}

/// Prunes the tree to insert one leaf. Batches are read into, and updated in,
/// a [`BatchSet`]; every node on the path is tagged mutable so that its
/// digest is written back to its slots.
pub(crate) struct InsertPruner<'a, H: Hasher, S, C> {
	key: &'a [u8],
	value: &'a [u8],
	cache_height_limit: u16,
	defaults: &'a [H::Out],
	loader: BatchLoader<'a, S, C>,
	batches: &'a mut BatchSet,
}

impl<'a, H: Hasher, S: Store, C: Cache> InsertPruner<'a, H, S, C> {
	pub fn new(
		key: &'a [u8],
		value: &'a [u8],
		cache_height_limit: u16,
		defaults: &'a [H::Out],
		loader: BatchLoader<'a, S, C>,
		batches: &'a mut BatchSet,
	) -> Self {
		InsertPruner { key, value, cache_height_limit, defaults, loader, batches }
	}

	pub fn prune(mut self) -> Result<HyperOp<H>> {
		let root = HyperPosition::root(H::bits());
		if !self.batches.contains(&root) {
			let batch = self.loader.load(&root)?.unwrap_or_else(|| BatchNode::new(H::LENGTH));
			self.batches.insert(root.clone(), batch);
		}
		let mut leaves = Leaves::new();
		leaves.push((self.key.to_vec(), self.value.to_vec()));
		self.traverse(root.clone(), leaves, &root, 0)
	}

	fn traverse(
		&mut self,
		pos: HyperPosition,
		mut leaves: Leaves,
		batch_root: &HyperPosition,
		slot: usize,
	) -> Result<HyperOp<H>> {
		let height = pos.height() as usize;
		if leaves.is_empty() {
			let digest = match self.batches.get(batch_root)?.element_at(slot) {
				Some(raw) => slot_digest::<H>(raw)?,
				None => self.defaults[height],
			};
			return Ok(Visitable::cached(pos, digest))
		}

		if is_batch_boundary(&pos, slot) {
			if !self.batches.contains(&pos) {
				let child = if self.batches.get(batch_root)?.has_element_at(slot) {
					self.loader.load_referenced(&pos)?
				} else {
					BatchNode::new(H::LENGTH)
				};
				self.batches.insert(pos.clone(), child);
			}
			let child_root = pos.clone();
			return self.traverse(pos, leaves, &child_root, 0)
		}

		let after_cache = batch_root.height() <= self.cache_height_limit;
		let batch = self.batches.get_mut(batch_root)?;

		let pushed = batch.shortcut_at(slot)?.map(|(k, v)| (k.to_vec(), v.to_vec()));
		if let Some(pushed) = pushed {
			trace!(target: LOG_TARGET, "pushing down {} from {}", hex::encode(&pushed.0), pos);
			batch.reset_shortcut_at(slot);
			insert_sorted(&mut leaves, pushed);
			return self.traverse(pos, leaves, batch_root, slot)
		}

		if pos.is_leaf() || (after_cache && leaves.len() == 1 && !batch.has_element_at(slot)) {
			debug_assert_eq!(leaves.len(), 1);
			let (key, value) = &leaves[0];
			batch.set_shortcut_at(slot, key, value);
			return Ok(Visitable::leaf(pos, leaf_value(key, value)).mutable())
		}

		let right_pos = pos.right();
		let (left_leaves, right_leaves) = split(leaves, right_pos.index());
		let left = self.traverse(pos.left(), left_leaves, batch_root, 2 * slot + 1)?;
		let right = self.traverse(right_pos, right_leaves, batch_root, 2 * slot + 2)?;
		Ok(Visitable::node(pos, left, right).mutable())
	}
}

/// Prunes the tree to prove membership or absence of a key. Off-path
/// siblings are collected; the walk stops at an empty subtree or a shortcut,
/// neither of them collected.
pub(crate) struct SearchPruner<'a, H: Hasher, S, C> {
	resolver: SingleTargetedCacheResolver<'a>,
	defaults: &'a [H::Out],
	loader: BatchLoader<'a, S, C>,
	shortcut: Option<KeyValue>,
}

impl<'a, H: Hasher, S: Store, C: Cache> SearchPruner<'a, H, S, C> {
	pub fn new(key: &'a [u8], defaults: &'a [H::Out], loader: BatchLoader<'a, S, C>) -> Self {
		SearchPruner {
			resolver: SingleTargetedCacheResolver::new(key),
			defaults,
			loader,
			shortcut: None,
		}
	}

	/// Pruned tree, and the shortcut the walk ended on if any.
	pub fn prune(mut self) -> Result<(HyperOp<H>, Option<KeyValue>)> {
		let root = HyperPosition::root(H::bits());
		let batch = self.loader.load(&root)?.unwrap_or_else(|| BatchNode::new(H::LENGTH));
		let pruned = self.traverse(root, &batch, 0)?;
		Ok((pruned, self.shortcut))
	}

	fn traverse(&mut self, pos: HyperPosition, batch: &BatchNode, slot: usize) -> Result<HyperOp<H>> {
		let height = pos.height() as usize;
		let digest = match batch.element_at(slot) {
			Some(raw) => slot_digest::<H>(raw)?,
			None => return Ok(Visitable::cached(pos, self.defaults[height])),
		};

		if is_batch_boundary(&pos, slot) {
			let child = self.loader.load_referenced(&pos)?;
			return self.traverse(pos, &child, 0)
		}

		if let Some((key, value)) = batch.shortcut_at(slot)? {
			self.shortcut = Some((key.to_vec(), value.to_vec()));
			return Ok(Visitable::cached(pos, digest))
		}
		if pos.is_leaf() {
			return Err(CodecError::MissingShortcut(slot).into())
		}

		let left = self.child(pos.left(), batch, 2 * slot + 1)?;
		let right = self.child(pos.right(), batch, 2 * slot + 2)?;
		Ok(Visitable::node(pos, left, right))
	}

	fn child(&mut self, pos: HyperPosition, batch: &BatchNode, slot: usize) -> Result<HyperOp<H>> {
		if !self.resolver.should_get_from_cache(&pos) {
			return self.traverse(pos, batch, slot)
		}
		let digest = match batch.element_at(slot) {
			Some(raw) => slot_digest::<H>(raw)?,
			None => self.defaults[pos.height() as usize],
		};
		Ok(Visitable::cached(pos, digest).collectable())
	}
}

/// Rebuilds the pruned tree of a search from its audit path. The walk ends at
/// `terminal_height`, on the shortcut leaf if there is one and on an empty
/// subtree otherwise.
pub(crate) struct VerifyPruner<'a, H: Hasher> {
	resolver: SingleTargetedCacheResolver<'a>,
	shortcut: Option<(&'a [u8], &'a [u8])>,
	path: &'a AuditPath,
	terminal_height: u16,
	defaults: &'a [H::Out],
}

impl<'a, H: Hasher> VerifyPruner<'a, H> {
	pub fn new(
		key: &'a [u8],
		shortcut: Option<(&'a [u8], &'a [u8])>,
		path: &'a AuditPath,
		defaults: &'a [H::Out],
	) -> Result<Self> {
		if key.len() != H::LENGTH {
			return Err(Error::InvalidProof(format!("key of {} bytes", key.len())))
		}
		let terminal_height = u16::try_from(path.len())
			.ok()
			.and_then(|len| H::bits().checked_sub(len))
			.ok_or_else(|| Error::InvalidProof(format!("audit path of {} digests is too long", path.len())))?;
		Ok(VerifyPruner {
			resolver: SingleTargetedCacheResolver::new(key),
			shortcut,
			path,
			terminal_height,
			defaults,
		})
	}

	pub fn prune(&self) -> Result<HyperOp<H>> {
		self.traverse(HyperPosition::root(H::bits()))
	}

	fn traverse(&self, pos: HyperPosition) -> Result<HyperOp<H>> {
		let height = pos.height();
		if height == self.terminal_height {
			return match self.shortcut {
				Some((key, value)) if pos.contains(key) => Ok(Visitable::leaf(pos, leaf_value(key, value))),
				Some(_) => Err(Error::InvalidProof(format!("shortcut key outside of {}", pos))),
				None => Ok(Visitable::cached(pos, self.defaults[height as usize])),
			}
		}
		let left = self.child(pos.left())?;
		let right = self.child(pos.right())?;
		Ok(Visitable::node(pos, left, right))
	}

	fn child(&self, pos: HyperPosition) -> Result<HyperOp<H>> {
		if !self.resolver.should_get_from_cache(&pos) {
			return self.traverse(pos)
		}
		let digest = self.path.digest_at::<H, _>(&pos)?;
		Ok(Visitable::cached(pos, digest).collectable())
	}
}
