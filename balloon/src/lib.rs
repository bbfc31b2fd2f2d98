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

//! Tamper-evident append-only log.
//!
//! A [`Balloon`] keeps two authenticated trees over the digests of the events
//! it accepts: a version-ordered [`HistoryTree`](history::HistoryTree) proving
//! that a later state extends an earlier one, and a key-ordered sparse
//! [`HyperTree`](hyper::HyperTree) proving presence or absence of an event.
//! Every request prunes the tree it touches into a small [`Visitable`] tree
//! and interprets it bottom-up with decorated [visitors](visitor).

pub mod history;
pub mod hyper;
pub mod position;
pub mod resolver;
pub mod visitor;

mod audit;
mod balloon;
mod stats;

pub use self::{
	audit::AuditPath,
	balloon::{Balloon, BalloonConfig, Commitment, IncrementalProof, MembershipProof, VERSION_KEY},
	position::Position,
	resolver::CacheResolver,
	stats::{Stats, StatsSnapshot},
	visitor::{PostOrderVisitor, Visitable},
};
pub use balloon_db::{Cache, Hasher, KVPair, MutableCache, Mutation, Store, StoreError, Table};

/// Malformed stored value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
	/// Fewer bytes than the bitmap.
	#[error("batch of {0} bytes is shorter than its bitmap")]
	MissingBitmap(usize),
	/// Slot payload does not match the bitmap.
	#[error("batch length {actual} does not match the {expected} bytes announced by its bitmap")]
	LengthMismatch { expected: usize, actual: usize },
	/// Bitmap marks a slot beyond the last one.
	#[error("bitmap marks slot {0} which does not exist")]
	SlotOutOfRange(usize),
	/// Unknown slot flag.
	#[error("unknown slot flag {0:#04x}")]
	UnknownFlag(u8),
	/// A slot that must hold a shortcut does not, or its key or value is missing.
	#[error("slot {0} does not hold a complete shortcut")]
	MissingShortcut(usize),
	/// A stored version does not fit in 64 bits.
	#[error("stored version of {0} bytes does not fit in 64 bits")]
	InvalidVersion(usize),
}

/// Engine errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	/// A frozen digest was expected in the cache and is not there: the store is corrupted.
	#[error("digest for frozen position {0} missing from cache")]
	CacheMiss(String),
	/// A batch referenced by its parent slot could not be loaded.
	#[error("batch rooted at {0} missing while its parent references it")]
	MissingBatch(String),
	/// A stored value could not be decoded.
	#[error("corrupted stored value: {0}")]
	Codec(#[from] CodecError),
	/// The store failed.
	#[error(transparent)]
	Store(#[from] StoreError),
	/// The request addresses versions the log does not have.
	#[error("versions {start}..={end} out of range, current version is {current:?}")]
	OutOfRange { start: u64, end: u64, current: Option<u64> },
	/// A proof is malformed or does not match.
	#[error("invalid proof: {0}")]
	InvalidProof(String),
	/// A version does not fit in a digest of the configured hasher.
	#[error("version {0} does not fit in a digest")]
	VersionOverflow(u64),
	/// Rejected configuration.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),
}

/// Engine result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Encode `version` big-endian on exactly `len` bytes.
pub fn version_to_bytes(version: u64, len: usize) -> Result<Vec<u8>> {
	let be = version.to_be_bytes();
	if len >= be.len() {
		let mut out = vec![0u8; len - be.len()];
		out.extend_from_slice(&be);
		return Ok(out)
	}
	let (high, low) = be.split_at(be.len() - len);
	if high.iter().any(|b| *b != 0) {
		return Err(Error::VersionOverflow(version))
	}
	Ok(low.to_vec())
}

/// Decode a big-endian version, `None` if it does not fit in a `u64`.
pub fn version_from_bytes(bytes: &[u8]) -> Option<u64> {
	let significant = bytes.len().saturating_sub(8);
	if bytes[..significant].iter().any(|b| *b != 0) {
		return None
	}
	Some(bytes[significant..].iter().fold(0u64, |v, b| (v << 8) | *b as u64))
}
