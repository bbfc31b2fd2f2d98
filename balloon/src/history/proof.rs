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

//! History tree proofs and their client side verification.

use super::{
	pruner::{PathSource, ReadPruner},
	resolver::{DoubleTargetedCacheResolver, IncrementalCacheResolver, SingleTargetedCacheResolver},
};
use crate::{
	audit::AuditPath,
	visitor::{ComputeHashVisitor, PrintVisitor},
	Error, Hasher, Result,
};
use log::debug;
use parity_scale_codec::{Decode, Encode};

const LOG_TARGET: &str = "balloon::history";

/// Proof that the event at version `index` is part of the tree of `version`.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct HistoryProof {
	pub index: u64,
	pub version: u64,
	pub audit_path: AuditPath,
}

impl HistoryProof {
	/// Recompute the root of `version` from the proof and the digest of the
	/// event, and compare it with `expected`.
	pub fn verify<H: Hasher>(&self, event_digest: &[u8], expected: &H::Out) -> bool {
		match self.root::<H>(event_digest) {
			Ok(root) if root == *expected => true,
			Ok(_) => {
				debug!(target: LOG_TARGET, "membership of {} in {} does not match", self.index, self.version);
				false
			},
			Err(e) => {
				debug!(target: LOG_TARGET, "membership of {} in {}: {}", self.index, self.version, e);
				false
			},
		}
	}

	fn root<H: Hasher>(&self, event_digest: &[u8]) -> Result<H::Out> {
		if self.index > self.version {
			return Err(Error::InvalidProof(format!(
				"index {} after version {}",
				self.index, self.version
			)))
		}
		let source = PathSource { path: &self.audit_path, target: Some((self.index, event_digest)) };
		let pruned = if self.index == self.version {
			let resolver = SingleTargetedCacheResolver::new(self.version);
			ReadPruner::<H, _, _>::new(self.version, &resolver, &source).prune()?
		} else {
			let resolver = DoubleTargetedCacheResolver::new(self.index, self.version);
			ReadPruner::<H, _, _>::new(self.version, &resolver, &source).prune()?
		};
		let mut visitor = PrintVisitor::new(ComputeHashVisitor::<H>::new(), LOG_TARGET);
		Ok(pruned.post_order(&mut visitor))
	}
}

/// Proof that the tree of `end` extends the tree of `start`.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct IncrementalProof {
	pub start: u64,
	pub end: u64,
	pub audit_path: AuditPath,
}

impl IncrementalProof {
	/// Rebuild both roots from the single audit path and compare them with the
	/// expected ones.
	pub fn verify_digests<H: Hasher>(&self, start_digest: &H::Out, end_digest: &H::Out) -> bool {
		match self.roots::<H>() {
			Ok((start, end)) => {
				let valid = start == *start_digest && end == *end_digest;
				if !valid {
					debug!(target: LOG_TARGET, "consistency {}..{} does not match", self.start, self.end);
				}
				valid
			},
			Err(e) => {
				debug!(target: LOG_TARGET, "consistency {}..{}: {}", self.start, self.end, e);
				false
			},
		}
	}

	fn roots<H: Hasher>(&self) -> Result<(H::Out, H::Out)> {
		if self.start > self.end {
			return Err(Error::InvalidProof(format!("start {} after end {}", self.start, self.end)))
		}
		let resolver = IncrementalCacheResolver::new(self.start, self.end);
		let source = PathSource { path: &self.audit_path, target: None };

		let root = |version: u64| -> Result<H::Out> {
			let pruned = ReadPruner::<H, _, _>::new(version, &resolver, &source).prune()?;
			let mut visitor = PrintVisitor::new(ComputeHashVisitor::<H>::new(), LOG_TARGET);
			Ok(pruned.post_order(&mut visitor))
		};
		Ok((root(self.start)?, root(self.end)?))
	}
}
