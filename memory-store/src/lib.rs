// Copyright 2017-2020 Parity Technologies
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

//! In-memory implementations of the balloon store and caches.

use balloon_db::{Cache, KVPair, KVPairIter, MutableCache, Mutation, Store, StoreError, Table};
use hashbrown::HashMap;
use log::trace;
use parking_lot::RwLock;
use std::{collections::BTreeMap, ops::Bound, sync::Arc};

type FastMap<K, V> = HashMap<K, V, foldhash::fast::RandomState>;

#[derive(Default)]
struct Keyspace {
	entries: BTreeMap<Vec<u8>, Vec<u8>>,
	closed: bool,
}

impl Keyspace {
	fn open(&self) -> Result<&BTreeMap<Vec<u8>, Vec<u8>>, StoreError> {
		if self.closed {
			return Err(StoreError::Closed)
		}
		Ok(&self.entries)
	}
}

/// Keys of `table`, in order, without their prefix.
fn table_range(
	entries: &BTreeMap<Vec<u8>, Vec<u8>>,
	table: Table,
) -> impl DoubleEndedIterator<Item = KVPair> + '_ {
	let start = Bound::Included(vec![table.prefix()]);
	let end = match table.prefix().checked_add(1) {
		Some(next) => Bound::Excluded(vec![next]),
		None => Bound::Unbounded,
	};
	entries.range((start, end)).map(|(k, v)| KVPair::new(k[1..].to_vec(), v.clone()))
}

/// Ordered in-memory store over a single keyspace: every key is prefixed by
/// its [`Table`], the way a key-value database shares one column.
///
/// # Example
/// ```rust
///   use balloon_db::{Mutation, Store, Table};
///   use memory_store::MemoryStore;
///
///   let store = MemoryStore::default();
///   store.mutate(vec![Mutation::new(Table::Index, b"key".to_vec(), b"value".to_vec())]).unwrap();
///   assert_eq!(store.get(Table::Index, b"key").unwrap().value, b"value".to_vec());
///   assert!(store.get(Table::Hyper, b"key").is_err());
/// ```
#[derive(Default)]
pub struct MemoryStore {
	inner: RwLock<Keyspace>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of entries held in `table`.
	pub fn len(&self, table: Table) -> usize {
		table_range(&self.inner.read().entries, table).count()
	}

	/// Whether `table` holds no entry.
	pub fn is_empty(&self, table: Table) -> bool {
		self.len(table) == 0
	}
}

impl Store for MemoryStore {
	fn mutate(&self, mutations: Vec<Mutation>) -> Result<(), StoreError> {
		let mut inner = self.inner.write();
		if inner.closed {
			return Err(StoreError::Closed)
		}
		trace!(target: "memory-store", "applying {} mutations", mutations.len());
		for Mutation { table, key, value } in mutations {
			inner.entries.insert(table.prefixed_key(&key), value);
		}
		Ok(())
	}

	fn get(&self, table: Table, key: &[u8]) -> Result<KVPair, StoreError> {
		let inner = self.inner.read();
		inner
			.open()?
			.get(&table.prefixed_key(key))
			.map(|value| KVPair::new(key.to_vec(), value.clone()))
			.ok_or(StoreError::KeyNotFound)
	}

	fn get_range(&self, table: Table, start: &[u8], end: &[u8]) -> Result<Vec<KVPair>, StoreError> {
		let inner = self.inner.read();
		let entries = inner.open()?;
		if start >= end {
			return Ok(Vec::new())
		}
		let bounds = (Bound::Included(table.prefixed_key(start)), Bound::Excluded(table.prefixed_key(end)));
		Ok(entries.range(bounds).map(|(k, v)| KVPair::new(k[1..].to_vec(), v.clone())).collect())
	}

	fn get_all(&self, table: Table) -> Result<KVPairIter<'_>, StoreError> {
		let inner = self.inner.read();
		let pairs: Vec<KVPair> = table_range(inner.open()?, table).collect();
		Ok(Box::new(pairs.into_iter()))
	}

	fn get_last(&self, table: Table) -> Result<KVPair, StoreError> {
		let inner = self.inner.read();
		let last = table_range(inner.open()?, table).next_back();
		last.ok_or(StoreError::KeyNotFound)
	}

	fn close(&self) -> Result<(), StoreError> {
		let mut inner = self.inner.write();
		inner.closed = true;
		inner.entries.clear();
		Ok(())
	}
}

/// Unbounded thread-safe cache.
#[derive(Default)]
pub struct SimpleCache {
	entries: RwLock<FastMap<Vec<u8>, Vec<u8>>>,
}

impl SimpleCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a cache pre-sized for `capacity` entries.
	pub fn with_capacity(capacity: usize) -> Self {
		SimpleCache {
			entries: RwLock::new(FastMap::with_capacity_and_hasher(capacity, Default::default())),
		}
	}
}

impl Cache for SimpleCache {
	fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
		self.entries.read().get(key).cloned()
	}
}

impl MutableCache for SimpleCache {
	fn put(&self, key: Vec<u8>, value: Vec<u8>) {
		self.entries.write().insert(key, value);
	}

	fn fill(&self, entries: KVPairIter<'_>) -> Result<(), StoreError> {
		let mut map = self.entries.write();
		for KVPair { key, value } in entries {
			map.insert(key, value);
		}
		trace!(target: "memory-store", "cache filled up to {} entries", map.len());
		Ok(())
	}

	fn size(&self) -> usize {
		self.entries.read().len()
	}
}

/// Cache reading straight from one table of a store.
///
/// Writes are dropped: the store receives them through the mutations the trees return.
pub struct PassThroughCache<S> {
	table: Table,
	store: Arc<S>,
}

impl<S: Store> PassThroughCache<S> {
	pub fn new(table: Table, store: Arc<S>) -> Self {
		PassThroughCache { table, store }
	}
}

impl<S: Store> Cache for PassThroughCache<S> {
	fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
		self.store.get(self.table, key).ok().map(|pair| pair.value)
	}
}

impl<S: Store> MutableCache for PassThroughCache<S> {
	fn put(&self, _key: Vec<u8>, _value: Vec<u8>) {}

	fn fill(&self, _entries: KVPairIter<'_>) -> Result<(), StoreError> {
		Ok(())
	}

	fn size(&self) -> usize {
		self.store.get_all(self.table).map(|it| it.count()).unwrap_or(0)
	}
}
