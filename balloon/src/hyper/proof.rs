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

use super::{default_hashes, pruner::VerifyPruner, LOG_TARGET};
use crate::{
	audit::AuditPath,
	version_from_bytes,
	visitor::{ComputeHashVisitor, PrintVisitor},
	Hasher, Result,
};
use log::debug;
use parity_scale_codec::{Decode, Encode};

/// Proof of presence or absence of `key` in the hyper tree.
///
/// The search for `key` ends either on an empty subtree, proving absence, or
/// on a shortcut. The shortcut proves presence when its key is `key` and
/// absence otherwise.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct HyperProof {
	pub key: Vec<u8>,
	/// Key and value of the shortcut the search ended on.
	pub shortcut: Option<(Vec<u8>, Vec<u8>)>,
	pub audit_path: AuditPath,
}

impl HyperProof {
	pub fn exists(&self) -> bool {
		matches!(&self.shortcut, Some((key, _)) if *key == self.key)
	}

	/// Version stored with `key`, if present.
	pub fn version(&self) -> Option<u64> {
		match &self.shortcut {
			Some((key, value)) if *key == self.key => version_from_bytes(value),
			_ => None,
		}
	}

	/// Check the proof is about `key` and rebuilds `expected`.
	pub fn verify<H: Hasher>(&self, key: &[u8], expected: &H::Out) -> bool {
		if key != &self.key[..] {
			debug!(target: LOG_TARGET, "proof is about {}, not {}", hex::encode(&self.key), hex::encode(key));
			return false
		}
		match self.root::<H>() {
			Ok(root) if root == *expected => true,
			Ok(root) => {
				debug!(
					target: LOG_TARGET,
					"proof of {} rebuilds {}, expected {}",
					hex::encode(key),
					hex::encode(root),
					hex::encode(expected),
				);
				false
			},
			Err(e) => {
				debug!(target: LOG_TARGET, "proof of {}: {}", hex::encode(key), e);
				false
			},
		}
	}

	fn root<H: Hasher>(&self) -> Result<H::Out> {
		let defaults = default_hashes::<H>();
		let shortcut = self.shortcut.as_ref().map(|(k, v)| (&k[..], &v[..]));
		let pruned = VerifyPruner::<H>::new(&self.key, shortcut, &self.audit_path, &defaults)?.prune()?;
		let mut visitor = PrintVisitor::new(ComputeHashVisitor::<H>::new(), LOG_TARGET);
		Ok(pruned.post_order(&mut visitor))
	}
}
