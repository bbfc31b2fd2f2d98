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

//! The log itself: one history tree and one hyper tree fed with the same
//! event digests.

use crate::{
	history::{HistoryProof, HistoryTree},
	hyper::{default_cache_height_limit, HyperProof, HyperTree},
	stats::{Stats, StatsSnapshot},
	CodecError, Error, Hasher, MutableCache, Mutation, Result, Store, StoreError, Table,
};
use log::debug;
use parity_scale_codec::{Decode, Encode};
use parking_lot::Mutex;
use std::{
	convert::TryInto,
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc,
	},
	thread,
};

pub use crate::history::IncrementalProof;

const LOG_TARGET: &str = "balloon";

/// Key of the last assigned version in [`Table::Version`].
pub const VERSION_KEY: &[u8] = b"version";

/// Construction parameters of a [`Balloon`].
#[derive(Clone, Debug)]
pub struct BalloonConfig {
	cache_height_limit: u16,
	stats: Arc<Stats>,
}

impl BalloonConfig {
	/// Defaults suited to the digest length of `H`.
	pub fn for_hasher<H: Hasher>() -> Self {
		BalloonConfig { cache_height_limit: default_cache_height_limit::<H>(), stats: Default::default() }
	}

	/// Hyper batches rooted above `limit` are kept in the hyper cache.
	pub fn with_cache_height_limit(mut self, limit: u16) -> Self {
		self.cache_height_limit = limit;
		self
	}

	/// Counters to bump, shared with the caller.
	pub fn with_stats(mut self, stats: Arc<Stats>) -> Self {
		self.stats = stats;
		self
	}
}

/// State of the log after one event: the roots of both trees and the version
/// the event was added at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct Commitment<O> {
	pub history_digest: O,
	pub hyper_digest: O,
	pub version: u64,
}

/// Answer to a membership query.
///
/// `exists` is only set when the event was added at or before `query_version`,
/// in which case `history_proof` links it to the history root of that version.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct MembershipProof {
	pub exists: bool,
	pub hyper_proof: HyperProof,
	pub history_proof: Option<HistoryProof>,
	pub current_version: u64,
	pub query_version: u64,
	/// Version the event was added at, if it was added at all.
	pub actual_version: Option<u64>,
}

impl MembershipProof {
	/// Verify the proof for `event` against `commitment`.
	///
	/// The hyper tree is not versioned: `commitment.hyper_digest` must be the
	/// hyper root of `current_version`. When the event exists,
	/// `commitment.history_digest` must be the history root of `query_version`.
	pub fn verify<H: Hasher>(&self, event: &[u8], commitment: &Commitment<H::Out>) -> bool {
		let digest = H::hash(event);
		if !self.hyper_proof.verify::<H>(digest.as_ref(), &commitment.hyper_digest) {
			return false
		}

		if !self.exists {
			// A present key is only acceptable if it was added after the queried version.
			return match self.hyper_proof.version() {
				Some(actual) if actual <= self.query_version => {
					debug!(
						target: LOG_TARGET,
						"absence claimed at {} for an event added at {}",
						self.query_version,
						actual,
					);
					false
				},
				_ => true,
			}
		}

		let history_proof = match &self.history_proof {
			Some(proof) => proof,
			None => {
				debug!(target: LOG_TARGET, "membership claimed without a history proof");
				return false
			},
		};
		let consistent = match (self.hyper_proof.version(), self.actual_version) {
			(Some(stored), Some(actual)) =>
				stored == actual &&
					history_proof.index == actual &&
					history_proof.version == self.query_version &&
					commitment.version == self.query_version,
			_ => false,
		};
		if !consistent {
			debug!(
				target: LOG_TARGET,
				"inconsistent versions: hyper {:?}, actual {:?}, history {}..{}, query {}, commitment {}",
				self.hyper_proof.version(),
				self.actual_version,
				history_proof.index,
				history_proof.version,
				self.query_version,
				commitment.version,
			);
			return false
		}
		history_proof.verify::<H>(digest.as_ref(), &commitment.history_digest)
	}
}

impl IncrementalProof {
	/// Verify that the history of `end` extends the history of `start`.
	pub fn verify<H: Hasher>(&self, start: &Commitment<H::Out>, end: &Commitment<H::Out>) -> bool {
		if start.version != self.start || end.version != self.end {
			debug!(
				target: LOG_TARGET,
				"proof covers {}..{}, commitments are {}..{}",
				self.start,
				self.end,
				start.version,
				end.version,
			);
			return false
		}
		self.verify_digests::<H>(&start.history_digest, &end.history_digest)
	}
}

/// Append-only log over a store `S`, with a history cache `HC` and a hyper
/// cache `YC`.
///
/// Operations never write to the store: `add` returns the mutations to apply,
/// and queries expect every returned mutation to have been applied.
pub struct Balloon<H: Hasher, S, HC, YC> {
	store: Arc<S>,
	history: HistoryTree<H, HC>,
	hyper: HyperTree<H, S, YC>,
	/// Number of events added, which is also the next version.
	next_version: AtomicU64,
	add_lock: Mutex<()>,
	stats: Arc<Stats>,
}

impl<H, S, HC, YC> Balloon<H, S, HC, YC>
where
	H: Hasher,
	S: Store,
	HC: MutableCache,
	YC: MutableCache,
{
	/// Empty log.
	pub fn new(store: Arc<S>, history_cache: HC, hyper_cache: YC, config: BalloonConfig) -> Result<Self> {
		let hyper = HyperTree::with_config(
			store.clone(),
			hyper_cache,
			config.cache_height_limit,
			config.stats.clone(),
		)?;
		Ok(Balloon {
			store,
			history: HistoryTree::with_stats(history_cache, config.stats.clone()),
			hyper,
			next_version: AtomicU64::new(0),
			add_lock: Mutex::new(()),
			stats: config.stats,
		})
	}

	/// Log restored from `store`: the version counter is read back and both
	/// caches are filled from their tables.
	pub fn load(store: Arc<S>, history_cache: HC, hyper_cache: YC, config: BalloonConfig) -> Result<Self> {
		let balloon = Self::new(store, history_cache, hyper_cache, config)?;
		let next = match balloon.store.get(Table::Version, VERSION_KEY) {
			Ok(pair) => decode_version(&pair.value)?.checked_add(1).ok_or(Error::VersionOverflow(u64::MAX))?,
			Err(StoreError::KeyNotFound) => 0,
			Err(e) => return Err(e.into()),
		};
		balloon.history.cache().fill(balloon.store.get_all(Table::HistoryCache)?)?;
		balloon.hyper.rebuild_cache()?;
		balloon.next_version.store(next, Ordering::SeqCst);

		debug!(target: LOG_TARGET, "loaded log with {} events", next);
		Ok(balloon)
	}

	/// Last assigned version, `None` while the log is empty.
	pub fn version(&self) -> Option<u64> {
		self.next_version.load(Ordering::SeqCst).checked_sub(1)
	}

	pub fn history_tree(&self) -> &HistoryTree<H, HC> {
		&self.history
	}

	pub fn hyper_tree(&self) -> &HyperTree<H, S, YC> {
		&self.hyper
	}

	pub fn stats(&self) -> StatsSnapshot {
		self.stats.snapshot()
	}

	/// Add `event` at the next version. Returns the commitment to the new
	/// state and the mutations to persist, the version record first.
	///
	/// On error the log and both caches are left as they were.
	pub fn add(&self, event: &[u8]) -> Result<(Commitment<H::Out>, Vec<Mutation>)> {
		let _lock = self.add_lock.lock();
		let version = self.next_version.load(Ordering::SeqCst);
		let next = version.checked_add(1).ok_or(Error::VersionOverflow(version))?;
		let digest = H::hash(event);

		let (history, hyper) = thread::scope(|s| {
			let history = s.spawn(|| self.history.prepare(&digest, version));
			let hyper = self.hyper.prepare(&digest, version);
			let history = history.join().unwrap_or_else(|e| std::panic::resume_unwind(e));
			(history, hyper)
		});
		let (history_digest, history_mutations) = history?;
		let (hyper_digest, hyper_mutations) = hyper?;
		// Neither cache sees the version until both trees accepted it.
		self.history.commit(&history_mutations);
		self.hyper.commit(&hyper_mutations);

		let mut mutations = Vec::with_capacity(1 + history_mutations.len() + hyper_mutations.len());
		mutations.push(Mutation::new(Table::Version, VERSION_KEY.to_vec(), version.to_be_bytes().to_vec()));
		mutations.extend(history_mutations);
		mutations.extend(hyper_mutations);
		self.next_version.store(next, Ordering::SeqCst);

		debug!(
			target: LOG_TARGET,
			"added {} at version {}: history {}, hyper {}",
			hex::encode(digest),
			version,
			hex::encode(history_digest),
			hex::encode(hyper_digest),
		);
		Ok((Commitment { history_digest, hyper_digest, version }, mutations))
	}

	/// Prove whether `event` was added at or before `version`.
	pub fn query_membership(&self, event: &[u8], version: u64) -> Result<MembershipProof> {
		let current = self.version();
		match current {
			Some(current) if version <= current => (),
			_ => return Err(Error::OutOfRange { start: version, end: version, current }),
		}
		let current_version = current.unwrap_or_default();
		self.stats.membership_query();

		let digest = H::hash(event);
		let actual_version = match self.store.get(Table::Index, digest.as_ref()) {
			Ok(pair) => Some(decode_version(&pair.value)?),
			Err(StoreError::KeyNotFound) => None,
			Err(e) => return Err(e.into()),
		};
		let hyper_proof = self.hyper.query_membership(digest.as_ref())?;

		let history_proof = match actual_version {
			Some(actual) if actual <= version => Some(self.history.prove_membership(actual, version)?),
			_ => None,
		};

		debug!(
			target: LOG_TARGET,
			"membership of {} at {}: added at {:?}, current {}",
			hex::encode(digest),
			version,
			actual_version,
			current_version,
		);
		Ok(MembershipProof {
			exists: history_proof.is_some(),
			hyper_proof,
			history_proof,
			current_version,
			query_version: version,
			actual_version,
		})
	}

	/// Prove that the log at `end` extends the log at `start`.
	pub fn query_consistency(&self, start: u64, end: u64) -> Result<IncrementalProof> {
		let current = self.version();
		match current {
			Some(current) if start <= end && end <= current => (),
			_ => return Err(Error::OutOfRange { start, end, current }),
		}
		self.stats.consistency_query();
		self.history.prove_consistency(start, end)
	}
}

fn decode_version(bytes: &[u8]) -> Result<u64> {
	let be: [u8; 8] = bytes.try_into().map_err(|_| CodecError::InvalidVersion(bytes.len()))?;
	Ok(u64::from_be_bytes(be))
}
