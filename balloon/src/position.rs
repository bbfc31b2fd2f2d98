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

//! Addressing of tree nodes.

use std::fmt;

/// A node address. Two positions are equal iff their serialized ids are.
pub trait Position: Clone + fmt::Debug + fmt::Display + PartialEq + Eq {
	/// Fixed width serialization, used as cache and store key.
	fn bytes(&self) -> &[u8];

	/// Key of the position in an audit path.
	fn string_id(&self) -> String;

	/// Distance to the leaves.
	fn height(&self) -> u16;

	fn is_leaf(&self) -> bool {
		self.height() == 0
	}
}
