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

//! One byte Pearson hashing. Not collision resistant at all: it only exists so
//! that tests can reach every shape of a tree keyed by eight bits.

use balloon_db::Hasher;

const TABLE: [u8; 256] = [
	44, 98, 20, 4, 94, 221, 30, 74, 208, 177, 86, 28, 180, 64, 126, 96,
	174, 22, 92, 80, 2, 204, 5, 82, 66, 121, 138, 148, 37, 245, 14, 194,
	104, 60, 56, 146, 202, 160, 42, 132, 186, 188, 152, 45, 6, 220, 140, 70,
	170, 167, 165, 54, 73, 157, 83, 200, 111, 163, 118, 72, 34, 102, 55, 226,
	192, 218, 0, 136, 228, 213, 62, 76, 91, 129, 8, 7, 181, 173, 58, 246,
	225, 57, 120, 149, 233, 13, 100, 231, 38, 101, 114, 168, 71, 189, 206, 169,
	18, 141, 84, 164, 244, 61, 122, 232, 154, 53, 130, 115, 40, 117, 234, 237,
	190, 95, 176, 195, 210, 153, 137, 230, 97, 222, 41, 254, 78, 142, 90, 235,
	23, 89, 199, 197, 50, 133, 216, 184, 128, 193, 52, 215, 178, 93, 227, 243,
	124, 158, 112, 203, 87, 240, 69, 187, 105, 127, 162, 147, 242, 21, 65, 43,
	196, 29, 252, 224, 241, 47, 156, 3, 125, 143, 48, 63, 134, 182, 110, 27,
	116, 25, 108, 251, 144, 219, 33, 191, 183, 103, 10, 198, 106, 205, 166, 239,
	85, 249, 250, 229, 113, 59, 11, 211, 172, 214, 68, 131, 32, 161, 12, 171,
	88, 209, 36, 123, 185, 79, 175, 155, 201, 109, 217, 247, 35, 248, 212, 255,
	31, 77, 145, 207, 238, 51, 135, 236, 119, 253, 24, 151, 19, 107, 46, 75,
	39, 99, 49, 159, 16, 81, 223, 67, 9, 17, 150, 179, 26, 1, 15, 139,
];

/// Concrete `Hasher` impl for 8-bit Pearson hashing.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct PearsonHasher;
impl Hasher for PearsonHasher {
	type Out = [u8; 1];

	const LENGTH: usize = 1;

	fn hash(x: &[u8]) -> Self::Out {
		[x.iter().fold(0u8, |h, b| TABLE[(h ^ b) as usize])]
	}
}
