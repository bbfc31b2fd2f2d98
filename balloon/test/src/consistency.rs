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

use crate::{test_hashers, TestHasher, TestLog};
use balloon::{Error, IncrementalProof};
use parity_scale_codec::{Decode, Encode};
use rand::{rngs::SmallRng, Rng, SeedableRng};

test_hashers!(every_pair_is_consistent, every_pair_is_consistent_internal);
fn every_pair_is_consistent_internal<H: TestHasher>() {
	let mut log = TestLog::<H>::new();
	log.add_all(&H::events(17));

	for start in 0..17u64 {
		for end in start..17u64 {
			let proof = log.balloon.query_consistency(start, end).unwrap();
			let (a, b) = (&log.commitments[start as usize], &log.commitments[end as usize]);
			assert!(proof.verify::<H>(a, b), "{}..{}", start, end);
			if start != end {
				assert!(!proof.verify::<H>(b, a), "{}..{} reversed", start, end);
			}
		}
	}
}

test_hashers!(random_pairs_are_consistent, random_pairs_are_consistent_internal);
fn random_pairs_are_consistent_internal<H: TestHasher>() {
	let count = std::cmp::min(H::MAX_EVENTS, 200);
	let mut log = TestLog::<H>::new();
	log.add_all(&H::events(count));

	let mut rng = SmallRng::seed_from_u64(42);
	for _ in 0..100 {
		let end = rng.gen_range(0..count as u64);
		let start = rng.gen_range(0..=end);
		let proof = log.balloon.query_consistency(start, end).unwrap();
		let decoded = IncrementalProof::decode(&mut &proof.encode()[..]).unwrap();
		assert!(
			decoded.verify::<H>(&log.commitments[start as usize], &log.commitments[end as usize]),
			"{}..{}",
			start,
			end,
		);
	}
}

test_hashers!(proof_does_not_fit_other_versions, proof_does_not_fit_other_versions_internal);
fn proof_does_not_fit_other_versions_internal<H: TestHasher>() {
	let mut log = TestLog::<H>::new();
	log.add_all(&H::events(9));

	let proof = log.balloon.query_consistency(2, 6).unwrap();
	let commitments = &log.commitments;
	assert!(proof.verify::<H>(&commitments[2], &commitments[6]));
	assert!(!proof.verify::<H>(&commitments[3], &commitments[6]));
	assert!(!proof.verify::<H>(&commitments[2], &commitments[7]));

	let mut forged = commitments[6];
	forged.version = 7;
	assert!(!proof.verify::<H>(&commitments[2], &forged));
}

test_hashers!(ranges_are_checked, ranges_are_checked_internal);
fn ranges_are_checked_internal<H: TestHasher>() {
	let mut log = TestLog::<H>::new();
	assert!(matches!(log.balloon.query_consistency(0, 0), Err(Error::OutOfRange { current: None, .. })));

	log.add_all(&H::events(4));
	assert_eq!(
		log.balloon.query_consistency(2, 1).unwrap_err(),
		Error::OutOfRange { start: 2, end: 1, current: Some(3) },
	);
	assert_eq!(
		log.balloon.query_consistency(0, 4).unwrap_err(),
		Error::OutOfRange { start: 0, end: 4, current: Some(3) },
	);
	assert!(log.balloon.query_consistency(3, 3).is_ok());
}
