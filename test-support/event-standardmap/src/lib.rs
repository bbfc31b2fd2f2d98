// Copyright 2017, 2018 Parity Technologies
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

//! Deterministic event journals for testing and profiling the log.

use balloon_db::Hasher;
use keccak_hasher::KeccakHasher;

type H256 = <KeccakHasher as Hasher>::Out;

/// Alphabet to use when creating event payloads.
pub enum Alphabet {
	/// All values are allowed in each byte of the event.
	All,
	/// Only a 6 values ('a' - 'f') are chosen to compose the event.
	Low,
	/// Quite a few values (around 32) are chosen to compose the event.
	Mid,
	/// A set of bytes given is used to compose the event.
	Custom(Vec<u8>),
}

/// Standard event journal.
pub struct StandardEvents {
	/// The alphabet to use for payloads.
	pub alphabet: Alphabet,
	/// Minimum size of an event.
	pub min_len: usize,
	/// Delta size of an event.
	pub journal_len: usize,
	/// Number of events.
	pub count: u32,
	/// Prefix every event with its position in the journal, making all events distinct.
	pub unique: bool,
}

impl StandardEvents {
	/// Get a random word of, at least `min_count` bytes, at most `min_count` + `journal_count`
	/// bytes. Each byte is an item from `alphabet`. `seed` is mutated pseudoramdonly and used.
	fn random_word(
		alphabet: &[u8],
		min_count: usize,
		journal_count: usize,
		seed: &mut H256,
	) -> Vec<u8> {
		let r = min_count + (seed[31] as usize % (journal_count + 1));
		let mut ret: Vec<u8> = Vec::with_capacity(r);
		while ret.len() < r {
			*seed = KeccakHasher::hash(&seed[..]);
			for b in seed.iter().take(r - ret.len()) {
				ret.push(alphabet[*b as usize % alphabet.len()]);
			}
		}
		ret
	}

	/// Create the journal for the object's fields.
	pub fn make(&self) -> Vec<Vec<u8>> {
		self.make_with(&mut H256::default())
	}

	/// Create the journal for the object's fields, using the given seed.
	pub fn make_with(&self, seed: &mut H256) -> Vec<Vec<u8>> {
		let all: Vec<u8> = (0..=255).collect();
		let low = b"abcdef";
		let mid = b"@QWERTYUIOPASDFGHJKLZXCVBNM[/]^_";

		let mut events = Vec::with_capacity(self.count as usize);
		for index in 0..self.count {
			let alphabet: &[u8] = match self.alphabet {
				Alphabet::All => &all,
				Alphabet::Low => low,
				Alphabet::Mid => mid,
				Alphabet::Custom(ref a) => a,
			};
			let mut event = if self.unique { index.to_be_bytes().to_vec() } else { Vec::new() };
			event.extend(Self::random_word(alphabet, self.min_len, self.journal_len, seed));
			events.push(event);
		}
		events
	}
}
