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

use super::HyperPosition;
use crate::resolver::CacheResolver;

/// Expands the path to one key, every subtree off that path is read as a
/// single digest.
#[derive(Clone, Debug)]
pub struct SingleTargetedCacheResolver<'a> {
	key: &'a [u8],
}

impl<'a> SingleTargetedCacheResolver<'a> {
	pub fn new(key: &'a [u8]) -> Self {
		SingleTargetedCacheResolver { key }
	}
}

impl<'a> CacheResolver<HyperPosition> for SingleTargetedCacheResolver<'a> {
	fn should_get_from_cache(&self, pos: &HyperPosition) -> bool {
		!pos.contains(self.key)
	}
}
