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

//! Four levels of the hyper tree stored as one value.
//!
//! Slot 0 is the batch root, the children of slot `i` are `2i + 1` and
//! `2i + 2`, and slots 15 to 30 are the roots of the batches below.
//!
//! Encoding: a 4 bytes bitmap, most significant bit first, marking populated
//! slots, then every populated slot in order as `bytes ‖ flag`. A shortcut
//! slot holds the digest of a single leaf subtree; its two children hold the
//! key and the value of that leaf.

use super::position::{bit_is_set, set_bit};
use crate::CodecError;
use std::fmt;

/// Number of slots of a batch.
pub const BATCH_SLOTS: usize = 31;

/// Last slot that can hold a shortcut, its payload takes the two children.
pub const LAST_SHORTCUT_SLOT: usize = 14;

const BITMAP_LEN: usize = 4;

/// Kind of a populated slot, stored in its last byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotFlag {
	Hash = 0,
	Shortcut = 1,
	Payload = 2,
}

impl SlotFlag {
	fn from_byte(byte: u8) -> Result<Self, CodecError> {
		match byte {
			0 => Ok(SlotFlag::Hash),
			1 => Ok(SlotFlag::Shortcut),
			2 => Ok(SlotFlag::Payload),
			other => Err(CodecError::UnknownFlag(other)),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Slot {
	bytes: Vec<u8>,
	flag: SlotFlag,
}

/// Decoded batch. Every populated slot holds exactly `node_size` bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct BatchNode {
	node_size: usize,
	slots: Vec<Option<Slot>>,
}

impl BatchNode {
	pub fn new(node_size: usize) -> Self {
		BatchNode { node_size, slots: vec![None; BATCH_SLOTS] }
	}

	pub fn decode(node_size: usize, data: &[u8]) -> Result<Self, CodecError> {
		if data.len() < BITMAP_LEN {
			return Err(CodecError::MissingBitmap(data.len()))
		}
		let (bitmap, mut payload) = data.split_at(BITMAP_LEN);
		if bit_is_set(bitmap, BATCH_SLOTS) {
			return Err(CodecError::SlotOutOfRange(BATCH_SLOTS))
		}

		let populated = (0..BATCH_SLOTS).filter(|i| bit_is_set(bitmap, *i)).count();
		let slot_len = node_size + 1;
		let expected = BITMAP_LEN + populated * slot_len;
		if data.len() != expected {
			return Err(CodecError::LengthMismatch { expected, actual: data.len() })
		}

		let mut batch = Self::new(node_size);
		for i in 0..BATCH_SLOTS {
			if !bit_is_set(bitmap, i) {
				continue
			}
			let (slot, rest) = payload.split_at(slot_len);
			payload = rest;
			let flag = SlotFlag::from_byte(slot[node_size])?;
			batch.slots[i] = Some(Slot { bytes: slot[..node_size].to_vec(), flag });
		}
		Ok(batch)
	}

	pub fn encode(&self) -> Vec<u8> {
		let populated = self.slots.iter().filter(|s| s.is_some()).count();
		let mut out = vec![0u8; BITMAP_LEN];
		out.reserve(populated * (self.node_size + 1));
		for (i, slot) in self.slots.iter().enumerate() {
			if let Some(slot) = slot {
				set_bit(&mut out[..BITMAP_LEN], i);
				out.extend_from_slice(&slot.bytes);
				out.push(slot.flag as u8);
			}
		}
		out
	}

	pub fn node_size(&self) -> usize {
		self.node_size
	}

	pub fn is_empty(&self) -> bool {
		self.slots.iter().all(Option::is_none)
	}

	pub fn has_element_at(&self, i: usize) -> bool {
		self.slots[i].is_some()
	}

	/// Bytes of slot `i`: a digest, or a key or value for payload slots.
	pub fn element_at(&self, i: usize) -> Option<&[u8]> {
		self.slots[i].as_ref().map(|s| &s.bytes[..])
	}

	pub fn flag_at(&self, i: usize) -> Option<SlotFlag> {
		self.slots[i].as_ref().map(|s| s.flag)
	}

	pub fn has_shortcut_at(&self, i: usize) -> bool {
		self.flag_at(i) == Some(SlotFlag::Shortcut)
	}

	/// Key and value of the shortcut at `i`, `None` if `i` is not a shortcut.
	pub fn shortcut_at(&self, i: usize) -> Result<Option<(&[u8], &[u8])>, CodecError> {
		if !self.has_shortcut_at(i) {
			return Ok(None)
		}
		match (self.element_at(2 * i + 1), self.element_at(2 * i + 2)) {
			(Some(key), Some(value)) => Ok(Some((key, value))),
			_ => Err(CodecError::MissingShortcut(i)),
		}
	}

	/// Store `digest` at `i`, keeping the flag of a populated slot.
	pub fn set_digest_at(&mut self, i: usize, digest: &[u8]) {
		let flag = self.flag_at(i).unwrap_or(SlotFlag::Hash);
		self.slots[i] = Some(Slot { bytes: digest.to_vec(), flag });
	}

	/// Turn `i` into a shortcut to the leaf `key`. The digest is filled
	/// in later with [`set_digest_at`](Self::set_digest_at).
	pub fn set_shortcut_at(&mut self, i: usize, key: &[u8], value: &[u8]) {
		debug_assert!(i <= LAST_SHORTCUT_SLOT);
		self.slots[i] = Some(Slot { bytes: vec![0; self.node_size], flag: SlotFlag::Shortcut });
		self.slots[2 * i + 1] = Some(Slot { bytes: key.to_vec(), flag: SlotFlag::Payload });
		self.slots[2 * i + 2] = Some(Slot { bytes: value.to_vec(), flag: SlotFlag::Payload });
	}

	/// Drop the shortcut at `i` and its payload.
	pub fn reset_shortcut_at(&mut self, i: usize) {
		self.slots[i] = None;
		self.slots[2 * i + 1] = None;
		self.slots[2 * i + 2] = None;
	}
}

impl fmt::Debug for BatchNode {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let mut list = f.debug_map();
		for (i, slot) in self.slots.iter().enumerate() {
			if let Some(slot) = slot {
				list.entry(&i, &format_args!("{}/{:?}", hex::encode(&slot.bytes), slot.flag));
			}
		}
		list.finish()
	}
}
