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

use super::BATCH_LEVELS;
use crate::position::Position;
use smallvec::SmallVec;
use std::fmt;

/// Inline capacity covering a 32 bytes index and its height.
const INLINE_LEN: usize = 34;

type PositionBytes = SmallVec<[u8; INLINE_LEN]>;

/// Bit `i` of `bits`, most significant bit first.
pub(crate) fn bit_is_set(bits: &[u8], i: usize) -> bool {
	bits[i / 8] & (1 << (7 - i % 8)) != 0
}

pub(crate) fn set_bit(bits: &mut [u8], i: usize) {
	bits[i / 8] |= 1 << (7 - i % 8);
}

fn clear_bit(bits: &mut [u8], i: usize) {
	bits[i / 8] &= !(1 << (7 - i % 8));
}

/// Node of the hyper tree. The index has as many bits as a digest, only the
/// first `num_bits - height` of them are significant; leaves are at height 0
/// and the root at height `num_bits`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HyperPosition {
	/// Index followed by the height, big-endian.
	bytes: PositionBytes,
	height: u16,
}

impl HyperPosition {
	pub fn new(index: &[u8], height: u16) -> Self {
		let mut bytes = PositionBytes::with_capacity(index.len() + 2);
		bytes.extend_from_slice(index);
		bytes.extend_from_slice(&height.to_be_bytes());
		HyperPosition { bytes, height }
	}

	/// Root of a tree keyed by digests of `num_bits` bits.
	pub fn root(num_bits: u16) -> Self {
		let index = PositionBytes::from_elem(0, num_bits as usize / 8);
		Self::new(&index, num_bits)
	}

	pub fn index(&self) -> &[u8] {
		&self.bytes[..self.bytes.len() - 2]
	}

	pub fn num_bits(&self) -> u16 {
		(self.index().len() * 8) as u16
	}

	/// Number of significant bits of the index.
	fn depth(&self) -> usize {
		(self.num_bits() - self.height) as usize
	}

	fn with_bits(&self, height: u16, from: usize, set: bool) -> Self {
		let mut index = PositionBytes::from_slice(self.index());
		for i in from..index.len() * 8 {
			if set {
				set_bit(&mut index, i)
			} else {
				clear_bit(&mut index, i)
			}
		}
		Self::new(&index, height)
	}

	/// Left child. Must not be called on a leaf.
	pub fn left(&self) -> Self {
		Self::new(self.index(), self.height - 1)
	}

	/// Right child. Must not be called on a leaf.
	pub fn right(&self) -> Self {
		let mut index = PositionBytes::from_slice(self.index());
		set_bit(&mut index, self.depth());
		Self::new(&index, self.height - 1)
	}

	pub fn first_descendant(&self) -> Self {
		Self::new(self.index(), 0)
	}

	pub fn last_descendant(&self) -> Self {
		self.with_bits(0, self.depth(), true)
	}

	/// Ancestor at `height`, which must not be below this position.
	pub fn ancestor(&self, height: u16) -> Self {
		self.with_bits(height, (self.num_bits() - height) as usize, false)
	}

	/// Whether `key` is a leaf of this subtree.
	pub fn contains(&self, key: &[u8]) -> bool {
		let index = self.index();
		if key.len() != index.len() {
			return false
		}
		let depth = self.depth();
		let full = depth / 8;
		if index[..full] != key[..full] {
			return false
		}
		match depth % 8 {
			0 => true,
			rem => {
				let mask = 0xffu8 << (8 - rem);
				index[full] & mask == key[full] & mask
			},
		}
	}

	/// Root of the batch holding this position as an inner slot, and the slot.
	/// Positions at a batch boundary are also slot 0 of their own batch, this
	/// returns the slot they take in the batch above. Not defined for the root.
	pub(crate) fn slot_in_parent_batch(&self) -> (HyperPosition, usize) {
		let batch_height = (self.height / BATCH_LEVELS + 1) * BATCH_LEVELS;
		let root = self.ancestor(batch_height);
		let depth = (batch_height - self.height) as usize;
		let start = (self.num_bits() - batch_height) as usize;
		let bits = (start..start + depth)
			.fold(0usize, |acc, i| (acc << 1) | bit_is_set(self.index(), i) as usize);
		(root, (1 << depth) - 1 + bits)
	}
}

impl Position for HyperPosition {
	fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	fn string_id(&self) -> String {
		format!("{}|{}", hex::encode(self.index()), self.height)
	}

	fn height(&self) -> u16 {
		self.height
	}
}

impl fmt::Display for HyperPosition {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}|{}", hex::encode(self.index()), self.height)
	}
}

impl fmt::Debug for HyperPosition {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "HyperPosition({}|{})", hex::encode(self.index()), self.height)
	}
}
