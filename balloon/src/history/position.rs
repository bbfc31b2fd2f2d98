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

use crate::position::Position;
use std::fmt;

const POSITION_BYTES: usize = 10;

/// Node of the history tree: `index` is the first version it covers, leaves
/// are at height 0.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistoryPosition {
	index: u64,
	height: u16,
	bytes: [u8; POSITION_BYTES],
}

/// Number of versions after the first one covered by a subtree of `height`.
fn span(height: u16) -> u64 {
	match height {
		0 => 0,
		h if h >= 64 => u64::MAX,
		h => (1u64 << h) - 1,
	}
}

impl HistoryPosition {
	pub fn new(index: u64, height: u16) -> Self {
		let mut bytes = [0u8; POSITION_BYTES];
		bytes[..8].copy_from_slice(&index.to_be_bytes());
		bytes[8..].copy_from_slice(&height.to_be_bytes());
		HistoryPosition { index, height, bytes }
	}

	/// Root of the tree holding versions `0..=version`.
	pub fn root(version: u64) -> Self {
		Self::new(0, (64 - version.leading_zeros()) as u16)
	}

	pub fn index(&self) -> u64 {
		self.index
	}

	/// Left child. Must not be called on a leaf.
	pub fn left(&self) -> Self {
		Self::new(self.index, self.height - 1)
	}

	/// Right child. Must not be called on a leaf.
	pub fn right(&self) -> Self {
		Self::new(self.index.saturating_add(span(self.height - 1) + 1), self.height - 1)
	}

	pub fn first_descendant(&self) -> Self {
		Self::new(self.index, 0)
	}

	pub fn last_descendant(&self) -> Self {
		Self::new(self.index.saturating_add(span(self.height)), 0)
	}

	/// Whether the subtree can still change once `version` has been added.
	pub fn is_frozen_at(&self, version: u64) -> bool {
		version >= self.last_descendant().index
	}
}

impl Position for HistoryPosition {
	fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	fn string_id(&self) -> String {
		format!("{}|{}", self.index, self.height)
	}

	fn height(&self) -> u16 {
		self.height
	}
}

impl fmt::Display for HistoryPosition {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}|{}", self.index, self.height)
	}
}

impl fmt::Debug for HistoryPosition {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "HistoryPosition({}|{})", self.index, self.height)
	}
}
