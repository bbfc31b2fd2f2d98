// Copyright 2017, 2021 Parity Technologies
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

//! Pruned trees and their interpreters.
//!
//! Pruners build a [`Visitable`] tree describing only the part of a tree a
//! request needs. It is interpreted once, in post-order, by a
//! [`PostOrderVisitor`]: children are always visited before their parent.
//! Side effects are layered by wrapping a base visitor:
//!
//! - [`ComputeHashVisitor`] applies the combine rules,
//! - [`CollectMutationsVisitor`] hands the digest of every `Mutable` node to a [`MutationCollector`],
//! - [`AuditPathVisitor`] records the digest of every `Collectable` node,
//! - [`PrintVisitor`] traces every visit.

use crate::{audit::AuditPath, position::Position, Hasher};
use log::trace;
use std::{fmt, marker::PhantomData};

/// Operation tree produced by a pruner and consumed by one visitor pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Visitable<P, O> {
	/// Leaf holding a value, hashed with its position.
	Leaf { pos: P, value: Vec<u8> },
	/// Inner node with both children.
	Node { pos: P, left: Box<Visitable<P, O>>, right: Box<Visitable<P, O>> },
	/// Inner node whose right subtree does not exist yet.
	PartialNode { pos: P, left: Box<Visitable<P, O>> },
	/// Trusted digest, from a cache or an audit path.
	Cached { pos: P, digest: O },
	/// The digest of the wrapped node must be persisted.
	Mutable(Box<Visitable<P, O>>),
	/// The digest of the wrapped node must be part of the audit path.
	Collectable(Box<Visitable<P, O>>),
}

impl<P: Position, O> Visitable<P, O> {
	pub fn leaf(pos: P, value: Vec<u8>) -> Self {
		Visitable::Leaf { pos, value }
	}

	pub fn node(pos: P, left: Self, right: Self) -> Self {
		Visitable::Node { pos, left: Box::new(left), right: Box::new(right) }
	}

	pub fn partial(pos: P, left: Self) -> Self {
		Visitable::PartialNode { pos, left: Box::new(left) }
	}

	pub fn cached(pos: P, digest: O) -> Self {
		Visitable::Cached { pos, digest }
	}

	/// Tag as mutable.
	pub fn mutable(self) -> Self {
		Visitable::Mutable(Box::new(self))
	}

	/// Tag as collectable.
	pub fn collectable(self) -> Self {
		Visitable::Collectable(Box::new(self))
	}

	/// Position of the node, looking through tags.
	pub fn position(&self) -> &P {
		match self {
			Visitable::Leaf { pos, .. } |
			Visitable::Node { pos, .. } |
			Visitable::PartialNode { pos, .. } |
			Visitable::Cached { pos, .. } => pos,
			Visitable::Mutable(inner) | Visitable::Collectable(inner) => inner.position(),
		}
	}

	/// Interpret the tree, children first.
	pub fn post_order<V: PostOrderVisitor<P, O>>(&self, visitor: &mut V) -> V::Output {
		match self {
			Visitable::Leaf { pos, value } => visitor.visit_leaf(pos, value),
			Visitable::Node { pos, left, right } => {
				let left = left.post_order(visitor);
				let right = right.post_order(visitor);
				visitor.visit_node(pos, left, right)
			},
			Visitable::PartialNode { pos, left } => {
				let left = left.post_order(visitor);
				visitor.visit_partial_node(pos, left)
			},
			Visitable::Cached { pos, digest } => visitor.visit_cached(pos, digest),
			Visitable::Mutable(inner) => {
				let result = inner.post_order(visitor);
				visitor.visit_mutable(inner.position(), result)
			},
			Visitable::Collectable(inner) => {
				let result = inner.post_order(visitor);
				visitor.visit_collectable(inner.position(), result)
			},
		}
	}
}

impl<P: Position, O> fmt::Display for Visitable<P, O> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Visitable::Leaf { pos, .. } => write!(f, "Leaf({})", pos),
			Visitable::Node { pos, left, right } => write!(f, "Node({})[ {} | {} ]", pos, left, right),
			Visitable::PartialNode { pos, left } => write!(f, "PartialNode({})[ {} ]", pos, left),
			Visitable::Cached { pos, .. } => write!(f, "Cached({})", pos),
			Visitable::Mutable(inner) => write!(f, "Mutable[ {} ]", inner),
			Visitable::Collectable(inner) => write!(f, "Collectable[ {} ]", inner),
		}
	}
}

/// Interpreter of a [`Visitable`] tree.
pub trait PostOrderVisitor<P, O> {
	type Output;

	fn visit_leaf(&mut self, pos: &P, value: &[u8]) -> Self::Output;
	fn visit_node(&mut self, pos: &P, left: Self::Output, right: Self::Output) -> Self::Output;
	fn visit_partial_node(&mut self, pos: &P, left: Self::Output) -> Self::Output;
	fn visit_cached(&mut self, pos: &P, digest: &O) -> Self::Output;

	fn visit_mutable(&mut self, _pos: &P, result: Self::Output) -> Self::Output {
		result
	}

	fn visit_collectable(&mut self, _pos: &P, result: Self::Output) -> Self::Output {
		result
	}
}

/// Prefix byte of leaf digests.
pub const LEAF_PREFIX: u8 = 0x00;
/// Prefix byte of inner node digests.
pub const NODE_PREFIX: u8 = 0x01;
/// Prefix byte of partial node digests.
pub const PARTIAL_NODE_PREFIX: u8 = 0x02;

/// Pure combine rules:
///
/// - leaf: `H(0x00 ‖ pos ‖ value)`,
/// - node: `H(0x01 ‖ pos ‖ left ‖ right)`,
/// - partial node: `H(0x02 ‖ pos ‖ left)`,
/// - cached: the digest as is.
///
/// A hyper tree leaf may sit at any height, and its value has the length of
/// two digests: only the prefix keeps it apart from a node at the same position.
pub struct ComputeHashVisitor<H>(PhantomData<H>);

impl<H> ComputeHashVisitor<H> {
	pub fn new() -> Self {
		ComputeHashVisitor(PhantomData)
	}
}

impl<H> Default for ComputeHashVisitor<H> {
	fn default() -> Self {
		Self::new()
	}
}

impl<H: Hasher, P: Position> PostOrderVisitor<P, H::Out> for ComputeHashVisitor<H> {
	type Output = H::Out;

	fn visit_leaf(&mut self, pos: &P, value: &[u8]) -> H::Out {
		H::hash_parts(&[&[LEAF_PREFIX], pos.bytes(), value])
	}

	fn visit_node(&mut self, pos: &P, left: H::Out, right: H::Out) -> H::Out {
		H::hash_parts(&[&[NODE_PREFIX], pos.bytes(), left.as_ref(), right.as_ref()])
	}

	fn visit_partial_node(&mut self, pos: &P, left: H::Out) -> H::Out {
		H::hash_parts(&[&[PARTIAL_NODE_PREFIX], pos.bytes(), left.as_ref()])
	}

	fn visit_cached(&mut self, _pos: &P, digest: &H::Out) -> H::Out {
		*digest
	}
}

/// Receives the digest of every `Mutable` node.
pub trait MutationCollector<P, O> {
	fn collect(&mut self, pos: &P, digest: &O);
}

/// Decorator handing mutable digests to a collector.
pub struct CollectMutationsVisitor<V, C> {
	decorated: V,
	collector: C,
}

impl<V, C> CollectMutationsVisitor<V, C> {
	pub fn new(decorated: V, collector: C) -> Self {
		CollectMutationsVisitor { decorated, collector }
	}

	pub fn collector(&self) -> &C {
		&self.collector
	}

	pub fn into_collector(self) -> C {
		self.collector
	}
}

impl<P, O, V, C> PostOrderVisitor<P, O> for CollectMutationsVisitor<V, C>
where
	V: PostOrderVisitor<P, O, Output = O>,
	C: MutationCollector<P, O>,
{
	type Output = O;

	fn visit_leaf(&mut self, pos: &P, value: &[u8]) -> O {
		self.decorated.visit_leaf(pos, value)
	}

	fn visit_node(&mut self, pos: &P, left: O, right: O) -> O {
		self.decorated.visit_node(pos, left, right)
	}

	fn visit_partial_node(&mut self, pos: &P, left: O) -> O {
		self.decorated.visit_partial_node(pos, left)
	}

	fn visit_cached(&mut self, pos: &P, digest: &O) -> O {
		self.decorated.visit_cached(pos, digest)
	}

	fn visit_mutable(&mut self, pos: &P, result: O) -> O {
		let digest = self.decorated.visit_mutable(pos, result);
		self.collector.collect(pos, &digest);
		digest
	}

	fn visit_collectable(&mut self, pos: &P, result: O) -> O {
		self.decorated.visit_collectable(pos, result)
	}
}

/// Decorator recording collectable digests into an [`AuditPath`].
pub struct AuditPathVisitor<V> {
	decorated: V,
	path: AuditPath,
}

impl<V> AuditPathVisitor<V> {
	pub fn new(decorated: V) -> Self {
		AuditPathVisitor { decorated, path: AuditPath::new() }
	}

	pub fn into_audit_path(self) -> AuditPath {
		self.path
	}
}

impl<P, O, V> PostOrderVisitor<P, O> for AuditPathVisitor<V>
where
	P: Position,
	O: AsRef<[u8]>,
	V: PostOrderVisitor<P, O, Output = O>,
{
	type Output = O;

	fn visit_leaf(&mut self, pos: &P, value: &[u8]) -> O {
		self.decorated.visit_leaf(pos, value)
	}

	fn visit_node(&mut self, pos: &P, left: O, right: O) -> O {
		self.decorated.visit_node(pos, left, right)
	}

	fn visit_partial_node(&mut self, pos: &P, left: O) -> O {
		self.decorated.visit_partial_node(pos, left)
	}

	fn visit_cached(&mut self, pos: &P, digest: &O) -> O {
		self.decorated.visit_cached(pos, digest)
	}

	fn visit_mutable(&mut self, pos: &P, result: O) -> O {
		self.decorated.visit_mutable(pos, result)
	}

	fn visit_collectable(&mut self, pos: &P, result: O) -> O {
		let digest = self.decorated.visit_collectable(pos, result);
		self.path.insert(pos.string_id(), digest.as_ref().to_vec());
		digest
	}
}

/// Decorator tracing every visit at `trace` level.
pub struct PrintVisitor<V> {
	decorated: V,
	target: &'static str,
}

impl<V> PrintVisitor<V> {
	pub fn new(decorated: V, target: &'static str) -> Self {
		PrintVisitor { decorated, target }
	}
}

impl<P, O, V> PostOrderVisitor<P, O> for PrintVisitor<V>
where
	P: Position,
	O: AsRef<[u8]>,
	V: PostOrderVisitor<P, O, Output = O>,
{
	type Output = O;

	fn visit_leaf(&mut self, pos: &P, value: &[u8]) -> O {
		let digest = self.decorated.visit_leaf(pos, value);
		trace!(target: self.target, "leaf {} -> {}", pos, hex::encode(&digest));
		digest
	}

	fn visit_node(&mut self, pos: &P, left: O, right: O) -> O {
		let digest = self.decorated.visit_node(pos, left, right);
		trace!(target: self.target, "node {} -> {}", pos, hex::encode(&digest));
		digest
	}

	fn visit_partial_node(&mut self, pos: &P, left: O) -> O {
		let digest = self.decorated.visit_partial_node(pos, left);
		trace!(target: self.target, "partial {} -> {}", pos, hex::encode(&digest));
		digest
	}

	fn visit_cached(&mut self, pos: &P, digest: &O) -> O {
		let digest = self.decorated.visit_cached(pos, digest);
		trace!(target: self.target, "cached {} -> {}", pos, hex::encode(&digest));
		digest
	}

	fn visit_mutable(&mut self, pos: &P, result: O) -> O {
		let digest = self.decorated.visit_mutable(pos, result);
		trace!(target: self.target, "mutable {}", pos);
		digest
	}

	fn visit_collectable(&mut self, pos: &P, result: O) -> O {
		let digest = self.decorated.visit_collectable(pos, result);
		trace!(target: self.target, "collectable {}", pos);
		digest
	}
}
