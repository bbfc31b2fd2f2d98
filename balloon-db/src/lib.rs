// Copyright 2017, 2018 Parity Technologies
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

//! Hashing, caching and storage contracts consumed by the balloon engine.
//!
//! The engine never writes to a store directly: tree operations return a list
//! of [`Mutation`]s that the caller persists, and read back through the
//! [`Store`] and [`Cache`] traits defined here.

use std::{fmt::Debug, hash};

/// Trait describing an object that can hash a slice of bytes. Used to abstract
/// the trees over the hashing algorithm. Defines a single `hash` method and an
/// `Out` associated type with the necessary bounds.
pub trait Hasher: Sync + Send {
	/// The output type of the `Hasher`
	type Out: AsRef<[u8]>
		+ AsMut<[u8]>
		+ Default
		+ Debug
		+ PartialEq
		+ Eq
		+ hash::Hash
		+ Send
		+ Sync
		+ Clone
		+ Copy;
	/// The length in bytes of the `Hasher` output.
	const LENGTH: usize;

	/// Compute the hash of the provided slice of bytes returning the `Out` type of the `Hasher`.
	fn hash(x: &[u8]) -> Self::Out;

	/// Hash the concatenation of `parts`, in order.
	fn hash_parts(parts: &[&[u8]]) -> Self::Out {
		let len = parts.iter().map(|p| p.len()).sum();
		let mut buf = Vec::with_capacity(len);
		for part in parts {
			buf.extend_from_slice(part);
		}
		Self::hash(&buf)
	}

	/// Number of bits of a digest, which is also the height of a sparse tree keyed by it.
	fn bits() -> u16 {
		(Self::LENGTH * 8) as u16
	}

	/// Build an output value from raw bytes, `None` if the length does not match.
	fn out_from_slice(bytes: &[u8]) -> Option<Self::Out> {
		if bytes.len() != Self::LENGTH {
			return None
		}
		let mut out = Self::Out::default();
		out.as_mut().copy_from_slice(bytes);
		Some(out)
	}
}

/// Logical tables of the backing store. Each one maps to a one-byte key prefix
/// for stores sharing a single keyspace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Table {
	/// Event digest to the version it was added at.
	Index,
	/// Hyper tree batches rooted above the cache height limit.
	HyperCache,
	/// Frozen history tree digests.
	HistoryCache,
	/// Hyper tree batches rooted at or below the cache height limit.
	Hyper,
	/// Last version assigned by the log.
	Version,
}

impl Table {
	/// All tables, in prefix order.
	pub const ALL: [Table; 5] =
		[Table::Index, Table::HyperCache, Table::HistoryCache, Table::Hyper, Table::Version];

	/// Key prefix of this table.
	pub fn prefix(&self) -> u8 {
		match self {
			Table::Index => 0x00,
			Table::HyperCache => 0x01,
			Table::HistoryCache => 0x02,
			Table::Hyper => 0x03,
			Table::Version => 0x04,
		}
	}

	/// Prefix `key` with this table's prefix byte.
	pub fn prefixed_key(&self, key: &[u8]) -> Vec<u8> {
		let mut prefixed = Vec::with_capacity(key.len() + 1);
		prefixed.push(self.prefix());
		prefixed.extend_from_slice(key);
		prefixed
	}
}

/// A pending write, produced by a tree operation and applied by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mutation {
	pub table: Table,
	pub key: Vec<u8>,
	pub value: Vec<u8>,
}

impl Mutation {
	pub fn new(table: Table, key: Vec<u8>, value: Vec<u8>) -> Self {
		Mutation { table, key, value }
	}
}

/// A key and its value as read back from a store or cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KVPair {
	pub key: Vec<u8>,
	pub value: Vec<u8>,
}

impl KVPair {
	pub fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
		KVPair { key, value }
	}
}

/// Store access error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
	/// No value under the requested key.
	#[error("key not found")]
	KeyNotFound,
	/// The store has been closed.
	#[error("store closed")]
	Closed,
	/// Failure reported by the backend.
	#[error("store backend error: {0}")]
	Backend(String),
}

/// Iterator over the ordered content of one table.
pub type KVPairIter<'a> = Box<dyn Iterator<Item = KVPair> + 'a>;

/// Read access to cached values.
pub trait Cache: Send + Sync {
	/// Look up the value stored under `key`, if any.
	fn get(&self, key: &[u8]) -> Option<Vec<u8>>;
}

/// A cache that can be written to. Implementations synchronize internally.
pub trait MutableCache: Cache {
	/// Insert or replace the value under `key`.
	fn put(&self, key: Vec<u8>, value: Vec<u8>);

	/// Load every pair yielded by `entries`.
	fn fill(&self, entries: KVPairIter<'_>) -> Result<(), StoreError>;

	/// Number of entries held.
	fn size(&self) -> usize;
}

/// Ordered key-value storage split in [`Table`]s.
pub trait Store: Send + Sync {
	/// Apply every mutation.
	fn mutate(&self, mutations: Vec<Mutation>) -> Result<(), StoreError>;

	/// Value under `key`, [`StoreError::KeyNotFound`] if absent.
	fn get(&self, table: Table, key: &[u8]) -> Result<KVPair, StoreError>;

	/// Ordered pairs with `start <= key < end`.
	fn get_range(&self, table: Table, start: &[u8], end: &[u8]) -> Result<Vec<KVPair>, StoreError>;

	/// Ordered iterator over the whole table.
	fn get_all(&self, table: Table) -> Result<KVPairIter<'_>, StoreError>;

	/// Pair with the greatest key, [`StoreError::KeyNotFound`] if the table is empty.
	fn get_last(&self, table: Table) -> Result<KVPair, StoreError>;

	/// Release the store. Later calls fail with [`StoreError::Closed`].
	fn close(&self) -> Result<(), StoreError>;
}
