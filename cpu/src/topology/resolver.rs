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

use std::collections::BTreeMap;

use log::debug;
use machine_manager::config::TopologyRequest;
use serde::Serialize;
use strum::IntoEnumIterator;
use strum_macros::Display;

use super::id_set::IdSet;
use super::policy::{Dimension, ResolutionPolicy, UnsetDimension};

/// Why a target must refuse a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, Serialize)]
pub enum RejectReason {
    /// `cpus` is larger than `maxcpus`.
    CpuCountExceedsMax,
    /// cores * threads * sockets differs from the requested cpus.
    TopologyProductMismatch,
    /// `maxcpus` is above what the platform supports.
    ExceedsPlatformCeiling,
    /// An explicit dimension is zero.
    NonPositiveDimension,
    /// More threads per core than the platform runs.
    UnsupportedThreads,
    /// The explicit dimensions cannot be completed to the vcpu total.
    IncompleteTopology,
}

/// Ids the target is expected to report for an accepted request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExpectedTopology {
    pub core_ids: IdSet,
    pub thread_ids: IdSet,
    pub socket_ids: IdSet,
}

impl ExpectedTopology {
    pub fn ids(&self, dimension: Dimension) -> &IdSet {
        match dimension {
            Dimension::Sockets => &self.socket_ids,
            Dimension::Cores => &self.core_ids,
            Dimension::Threads => &self.thread_ids,
        }
    }

    fn ids_mut(&mut self, dimension: Dimension) -> &mut IdSet {
        match dimension {
            Dimension::Sockets => &mut self.socket_ids,
            Dimension::Cores => &mut self.core_ids,
            Dimension::Threads => &mut self.thread_ids,
        }
    }
}

/// Outcome of resolving a request under a policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Valid(ExpectedTopology),
    Rejected(RejectReason),
}

impl Resolution {
    pub fn is_valid(&self) -> bool {
        matches!(self, Resolution::Valid(_))
    }

    pub fn expected(&self) -> Option<&ExpectedTopology> {
        match self {
            Resolution::Valid(expected) => Some(expected),
            Resolution::Rejected(_) => None,
        }
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Resolution::Valid(_) => None,
            Resolution::Rejected(reason) => Some(*reason),
        }
    }
}

fn explicit(request: &TopologyRequest, dimension: Dimension) -> Option<u32> {
    match dimension {
        Dimension::Sockets => request.sockets(),
        Dimension::Cores => request.cores(),
        Dimension::Threads => request.threads(),
    }
}

/// Check the request and return the number of vcpu slots it describes.
///
/// Rules are evaluated in a fixed order and the first one violated is the
/// rejection reason.
pub(crate) fn validate(
    request: &TopologyRequest,
    policy: &ResolutionPolicy,
) -> Result<u64, RejectReason> {
    let cpus = request.cpus().map(u64::from);
    let maxcpus = request.maxcpus().map(u64::from);

    if let (Some(cpus), Some(maxcpus)) = (cpus, maxcpus) {
        if cpus > maxcpus {
            return Err(RejectReason::CpuCountExceedsMax);
        }
    }

    let explicit_dims: Vec<u64> = Dimension::iter()
        .filter_map(|dimension| explicit(request, dimension))
        .map(u64::from)
        .collect();
    let all_explicit = explicit_dims.len() == Dimension::iter().count();
    // None when the product does not fit in u64, far above any ceiling.
    let explicit_product = explicit_dims
        .iter()
        .try_fold(1u64, |product, count| product.checked_mul(*count));

    if all_explicit {
        if let Some(cpus) = cpus {
            if explicit_product != Some(cpus) {
                return Err(RejectReason::TopologyProductMismatch);
            }
        }
    }

    let total = match maxcpus.or(cpus).or(explicit_product) {
        Some(total) if total <= u64::from(policy.max_cpus) => total,
        _ => return Err(RejectReason::ExceedsPlatformCeiling),
    };
    let explicit_product = match explicit_product {
        Some(product) => product,
        None => return Err(RejectReason::ExceedsPlatformCeiling),
    };

    if explicit_dims.contains(&0) {
        return Err(RejectReason::NonPositiveDimension);
    }

    if let Some(max_threads) = policy.max_threads {
        if request.threads().unwrap_or(1) > max_threads {
            return Err(RejectReason::UnsupportedThreads);
        }
    }

    let complete = if total == 0 {
        false
    } else if all_explicit {
        cpus.is_some() || explicit_product == total
    } else {
        total % explicit_product == 0
    };
    if !complete {
        return Err(RejectReason::IncompleteTopology);
    }

    Ok(total)
}

/// Number of slots along each dimension.
pub(crate) fn distribute(
    request: &TopologyRequest,
    policy: &ResolutionPolicy,
    total: u64,
) -> BTreeMap<Dimension, u64> {
    // Validated requests keep the product within `total`.
    let explicit_product = Dimension::iter()
        .filter_map(|dimension| explicit(request, dimension))
        .map(u64::from)
        .fold(1u64, u64::saturating_mul)
        .max(1);

    let mut counts = BTreeMap::new();
    let mut absorbed = false;
    for dimension in policy.order {
        let count = match explicit(request, dimension) {
            Some(count) => u64::from(count),
            None if !absorbed => {
                absorbed = true;
                total / explicit_product
            }
            None => 1,
        };
        counts.insert(dimension, count);
    }
    counts
}

fn to_id_count(count: u64) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Compute what a target following `policy` reports for `request`.
///
/// # Arguments
///
/// * `request` - The partial topology handed to `-smp`.
/// * `policy` - Resolution rules of the target platform.
pub fn resolve(request: &TopologyRequest, policy: &ResolutionPolicy) -> Resolution {
    let total = match validate(request, policy) {
        Ok(total) => total,
        Err(reason) => {
            debug!("smp {} is rejected: {}", request, reason);
            return Resolution::Rejected(reason);
        }
    };

    let counts = distribute(request, policy, total);
    let folded: u64 = Dimension::iter()
        .filter(|dimension| !policy.models(*dimension))
        .map(|dimension| counts.get(&dimension).copied().unwrap_or(1))
        .product();
    let first_modeled = policy.first_modeled();

    let mut expected = ExpectedTopology::default();
    for dimension in Dimension::iter() {
        if !policy.models(dimension) {
            continue;
        }
        let mut count = counts.get(&dimension).copied().unwrap_or(1);
        if policy.unset_dimension == UnsetDimension::EqualsCpuCount
            && Some(dimension) == first_modeled
        {
            count *= folded;
        }
        *expected.ids_mut(dimension) = IdSet::range(to_id_count(count));
    }

    if let Some(fixture) = policy.fixture_for(request) {
        for (dimension, ids) in [
            (Dimension::Cores, &fixture.core_ids),
            (Dimension::Threads, &fixture.thread_ids),
            (Dimension::Sockets, &fixture.socket_ids),
        ] {
            if let Some(ids) = ids {
                *expected.ids_mut(dimension) = ids.clone();
            }
        }
    }

    debug!(
        "smp {} resolves to cores {}, threads {}, sockets {}",
        request, expected.core_ids, expected.thread_ids, expected.socket_ids
    );
    Resolution::Valid(expected)
}
