// Copyright (c) 2024 Huawei Technologies Co.,Ltd. All rights reserved.
//
// StratoVirt is licensed under Mulan PSL v2.
// You can use this software according to the terms and conditions of the Mulan
// PSL v2.
// You may obtain a copy of Mulan PSL v2 at:
//         http://license.coscl.org.cn/MulanPSL2
// THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY
// KIND, EITHER EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO
// NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR PURPOSE.
// See the Mulan PSL v2 for more details.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// Set of topology ids along one dimension.
///
/// Equality is plain set equality, no matter whether the set was built from
/// a range or from explicit ids.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct IdSet(BTreeSet<u32>);

impl IdSet {
    /// The empty set, reported for dimensions a platform does not model.
    pub fn empty() -> Self {
        IdSet(BTreeSet::new())
    }

    /// `{0, .., count - 1}`.
    pub fn range(count: u32) -> Self {
        IdSet((0..count).collect())
    }

    pub fn from_ids<I: IntoIterator<Item = u32>>(ids: I) -> Self {
        IdSet(ids.into_iter().collect())
    }

    pub fn insert(&mut self, id: u32) -> bool {
        self.0.insert(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.0.contains(&id)
    }

    /// Whether the set is exactly `{0, .., len - 1}`.
    pub fn is_contiguous(&self) -> bool {
        self.0
            .iter()
            .next_back()
            .map_or(true, |last| *last as usize + 1 == self.0.len())
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<u32> for IdSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        IdSet(iter.into_iter().collect())
    }
}

impl fmt::Display for IdSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ids: Vec<String> = self.0.iter().map(|id| id.to_string()).collect();
        write!(f, "{{{}}}", ids.join(", "))
    }
}
