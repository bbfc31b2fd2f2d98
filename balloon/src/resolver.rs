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

//! Cache resolution policies.
//!
//! A resolver is built for a single request from its target(s) and tells the
//! pruners, top-down, where to stop descending. Every request thus expands
//! O(log n) positions and collects O(log n) digests.

use crate::position::Position;

/// Per request policy deciding whether a position is read as an opaque digest
/// or expanded into its children.
pub trait CacheResolver<P: Position> {
	/// `true` when the digest of `pos` is frozen and can be read from the cache
	/// (or audit path) instead of being recomputed.
	fn should_get_from_cache(&self, pos: &P) -> bool;
}
