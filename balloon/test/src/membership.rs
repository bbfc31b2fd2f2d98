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
use balloon::{BalloonConfig, Commitment, MembershipProof};
use keccak_hasher::KeccakHasher;
use parity_scale_codec::{Decode, Encode};

test_hashers!(added_events_verify, added_events_verify_internal);
fn added_events_verify_internal<H: TestHasher>() {
	let events = H::events(40);
	let mut log = TestLog::<H>::new();
	log.add_all(&events);
	let current = log.last();

	for (version, event) in events.iter().enumerate() {
		let version = version as u64;

		let proof = log.balloon.query_membership(event, version).unwrap();
		assert!(proof.exists);
		assert_eq!(proof.actual_version, Some(version));
		assert_eq!(proof.query_version, version);
		assert_eq!(proof.current_version, 39);
		assert!(proof.verify::<H>(event, &log.commitment_at(version)));

		let proof = log.balloon.query_membership(event, 39).unwrap();
		assert!(proof.exists);
		assert!(proof.verify::<H>(event, &current));
	}
}

test_hashers!(missing_events_are_absent, missing_events_are_absent_internal);
fn missing_events_are_absent_internal<H: TestHasher>() {
	let events = H::events(50);
	let (added, missing) = events.split_at(40);
	let mut log = TestLog::<H>::new();
	log.add_all(added);
	let current = log.last();

	for event in missing {
		let proof = log.balloon.query_membership(event, 39).unwrap();
		assert!(!proof.exists);
		assert_eq!(proof.actual_version, None);
		assert!(proof.history_proof.is_none());
		assert!(!proof.hyper_proof.exists());
		assert!(proof.verify::<H>(event, &current));
	}
}

test_hashers!(events_added_after_the_query_are_absent, events_added_after_the_query_are_absent_internal);
fn events_added_after_the_query_are_absent_internal<H: TestHasher>() {
	let events = H::events(10);
	let mut log = TestLog::<H>::new();
	log.add_all(&events);

	for query in 0..9u64 {
		let event = &events[query as usize + 1];
		let proof = log.balloon.query_membership(event, query).unwrap();
		assert!(!proof.exists);
		assert_eq!(proof.actual_version, Some(query + 1));
		assert!(proof.hyper_proof.exists());
		assert!(proof.verify::<H>(event, &log.commitment_at(query)));
	}
}

test_hashers!(two_events, two_events_internal);
fn two_events_internal<H: TestHasher>() {
	let mut log = TestLog::<H>::new();
	let a = log.add(b"a");
	let b = log.add(b"b");
	assert_eq!((a.version, b.version), (0, 1));

	assert!(log.balloon.query_consistency(0, 1).unwrap().verify::<H>(&a, &b));

	let proof = log.balloon.query_membership(b"a", 0).unwrap();
	assert!(proof.exists);
	assert_eq!(proof.actual_version, Some(0));
	assert!(proof.verify::<H>(b"a", &log.commitment_at(0)));
}

test_hashers!(readding_an_event_moves_it, readding_an_event_moves_it_internal);
fn readding_an_event_moves_it_internal<H: TestHasher>() {
	let events = H::events(3);
	let mut log = TestLog::<H>::new();
	log.add_all(&events);
	log.add(&events[0]);

	let proof = log.balloon.query_membership(&events[0], 3).unwrap();
	assert!(proof.exists);
	assert_eq!(proof.actual_version, Some(3));
	assert!(proof.verify::<H>(&events[0], &log.last()));

	// The index only remembers the latest version.
	let proof = log.balloon.query_membership(&events[0], 1).unwrap();
	assert!(!proof.exists);
	assert!(proof.verify::<H>(&events[0], &log.commitment_at(1)));
}

test_hashers!(queries_are_idempotent, queries_are_idempotent_internal);
fn queries_are_idempotent_internal<H: TestHasher>() {
	let events = H::events(20);
	let mut log = TestLog::<H>::new();
	log.add_all(&events);

	for (version, event) in events.iter().enumerate().step_by(3) {
		let first = log.balloon.query_membership(event, 19).unwrap();
		let second = log.balloon.query_membership(event, 19).unwrap();
		assert_eq!(first, second);
		assert_eq!(first.encode(), second.encode());

		let first = log.balloon.query_consistency(version as u64, 19).unwrap();
		let second = log.balloon.query_consistency(version as u64, 19).unwrap();
		assert_eq!(first.encode(), second.encode());
	}
}

test_hashers!(proofs_survive_transport, proofs_survive_transport_internal);
fn proofs_survive_transport_internal<H: TestHasher>() {
	let events = H::events(12);
	let mut log = TestLog::<H>::new();
	log.add_all(&events);

	let proof = log.balloon.query_membership(&events[5], 8).unwrap();
	let decoded = MembershipProof::decode(&mut &proof.encode()[..]).unwrap();
	assert_eq!(decoded, proof);
	assert!(decoded.verify::<H>(&events[5], &log.commitment_at(8)));
}

#[test]
fn commitments_survive_transport() {
	let _ = env_logger::try_init();
	let events = KeccakHasher::events(12);
	let mut log = TestLog::<KeccakHasher>::new();
	log.add_all(&events);

	let commitment = log.commitment_at(8);
	let encoded = commitment.encode();
	assert_eq!(encoded.len(), 2 * 32 + 8);
	let decoded = Commitment::<[u8; 32]>::decode(&mut &encoded[..]).unwrap();
	assert_eq!(decoded, commitment);

	let proof = log.balloon.query_membership(&events[5], 8).unwrap();
	assert!(proof.verify::<KeccakHasher>(&events[5], &decoded));
}

test_hashers!(custom_cache_height_limit, custom_cache_height_limit_internal);
fn custom_cache_height_limit_internal<H: TestHasher>() {
	let events = H::events(30);
	for limit in [0, 4, H::bits() / 2, H::bits()] {
		let config = BalloonConfig::for_hasher::<H>().with_cache_height_limit(limit);
		let mut log = TestLog::<H>::with_config(config);
		log.add_all(&events);
		assert_eq!(log.balloon.hyper_tree().cache_height_limit(), limit);

		for (version, event) in events.iter().enumerate().step_by(4) {
			let proof = log.balloon.query_membership(event, 29).unwrap();
			assert_eq!(proof.actual_version, Some(version as u64));
			assert!(proof.verify::<H>(event, &log.last()), "limit {}", limit);
		}
		let proof = log.balloon.query_membership(b"never added", 29).unwrap();
		assert!(!proof.exists);
		assert!(proof.verify::<H>(b"never added", &log.last()), "limit {}", limit);
	}
}
