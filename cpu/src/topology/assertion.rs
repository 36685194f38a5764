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

use std::fmt;

use log::{info, warn};
use serde::Serialize;

use super::id_set::IdSet;
use super::observed::ObservedTopology;
use super::policy::Dimension;
use super::resolver::ExpectedTopology;

/// Judgment of a single dimension.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DimensionCheck {
    pub dimension: Dimension,
    pub expected: IdSet,
    pub observed: IdSet,
}

impl DimensionCheck {
    pub fn passed(&self) -> bool {
        self.expected == self.observed
    }
}

impl fmt::Display for DimensionCheck {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let state = if self.passed() { "passed" } else { "failed" };
        write!(
            f,
            "check {} {}: expected {}, observed {}",
            self.dimension, state, self.expected, self.observed
        )
    }
}

/// Outcome of comparing all dimensions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub checks: Vec<DimensionCheck>,
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        self.checks.iter().all(DimensionCheck::passed)
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &DimensionCheck> {
        self.checks.iter().filter(|check| !check.passed())
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_pass() {
            return write!(f, "all dimensions match");
        }
        let failures: Vec<String> = self.mismatches().map(|check| check.to_string()).collect();
        write!(f, "{}", failures.join("; "))
    }
}

/// Compare cores, threads and sockets. A failing dimension never hides the
/// result of the others.
pub fn check(expected: &ExpectedTopology, observed: &ObservedTopology) -> Verdict {
    let checks: Vec<DimensionCheck> = [Dimension::Cores, Dimension::Threads, Dimension::Sockets]
        .into_iter()
        .map(|dimension| DimensionCheck {
            dimension,
            expected: expected.ids(dimension).clone(),
            observed: observed.ids(dimension).clone(),
        })
        .collect();

    for check in &checks {
        if check.passed() {
            info!("{}", check);
        } else {
            warn!("{}", check);
        }
    }
    Verdict { checks }
}
