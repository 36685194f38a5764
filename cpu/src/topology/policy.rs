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

use anyhow::{anyhow, Result};
use log::debug;
use machine_manager::config::TopologyRequest;
use serde::Serialize;
use strum_macros::{Display, EnumIter, EnumString};

use super::id_set::IdSet;
use crate::error::CpuError;

/// Ceiling on `maxcpus` used when the harness is not told otherwise.
pub const DEFAULT_MAXCPUS_LIMIT: u32 = 288;

/// Axis along which vcpus are grouped.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumString, Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Sockets,
    Cores,
    Threads,
}

/// How a dimension the platform does not model shows up in the reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, Serialize)]
pub enum UnsetDimension {
    /// The dimension reports no id at all.
    Zero,
    /// The dimension is folded into the first modeled one, which then
    /// reports one id per vcpu slot.
    EqualsCpuCount,
}

/// Explicit id sets a platform reports for one exact request.
///
/// Only the sets which are `Some` replace the computed expectation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SpreadFixture {
    pub request: TopologyRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub core_ids: Option<IdSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ids: Option<IdSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket_ids: Option<IdSet>,
}

/// Per platform rules for filling in the dimensions a request leaves out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolutionPolicy {
    pub arch: String,
    pub machine: String,
    pub accel: String,
    /// Precedence used to distribute vcpus over unset dimensions.
    pub order: [Dimension; 3],
    /// Dimensions the platform reports in `query-hotpluggable-cpus`.
    pub modeled: Vec<Dimension>,
    pub unset_dimension: UnsetDimension,
    /// Hard ceiling of `maxcpus`.
    pub max_cpus: u32,
    /// Highest accepted threads per core, if the platform limits it.
    pub max_threads: Option<u32>,
    pub fixtures: Vec<SpreadFixture>,
    /// Machine arguments the target is launched with.
    pub launch_args: Vec<String>,
}

impl ResolutionPolicy {
    pub fn models(&self, dimension: Dimension) -> bool {
        self.modeled.contains(&dimension)
    }

    /// The modeled dimension that comes first in `order`.
    pub fn first_modeled(&self) -> Option<Dimension> {
        self.order
            .iter()
            .copied()
            .find(|dimension| self.models(*dimension))
    }

    /// Override the ceiling of `maxcpus`.
    pub fn with_max_cpus(mut self, max_cpus: u32) -> Self {
        self.max_cpus = max_cpus;
        self
    }

    pub fn with_fixture(mut self, fixture: SpreadFixture) -> Self {
        self.fixtures.push(fixture);
        self
    }

    /// The fixture registered for exactly this request.
    pub fn fixture_for(&self, request: &TopologyRequest) -> Option<&SpreadFixture> {
        self.fixtures
            .iter()
            .find(|fixture| fixture.request == *request)
    }

    pub fn matches(&self, arch: &str, machine: &str, accel: &str) -> bool {
        self.arch == arch && self.machine == machine && self.accel == accel
    }

    /// Find the built-in policy of a platform.
    ///
    /// # Arguments
    ///
    /// * `arch` - Target architecture, like `x86_64` or `ppc64`.
    /// * `machine` - Machine type, like `q35` or `pseries`.
    /// * `accel` - Accelerator, `kvm` or `tcg`.
    pub fn lookup(arch: &str, machine: &str, accel: &str) -> Result<ResolutionPolicy> {
        let policy = builtin_policies()?
            .into_iter()
            .find(|policy| policy.matches(arch, machine, accel))
            .ok_or_else(|| {
                anyhow!(CpuError::UnknownPlatform(
                    arch.to_string(),
                    machine.to_string(),
                    accel.to_string()
                ))
            })?;
        debug!(
            "Resolution policy for {}/{}/{}: order {:?}, modeled {:?}",
            arch, machine, accel, policy.order, policy.modeled
        );
        Ok(policy)
    }
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|arg| arg.to_string()).collect()
}

fn x86_policy(machine: &str, launch_args: Vec<String>) -> ResolutionPolicy {
    ResolutionPolicy {
        arch: "x86_64".to_string(),
        machine: machine.to_string(),
        accel: "kvm".to_string(),
        order: [Dimension::Sockets, Dimension::Cores, Dimension::Threads],
        modeled: vec![Dimension::Sockets, Dimension::Cores, Dimension::Threads],
        unset_dimension: UnsetDimension::Zero,
        max_cpus: DEFAULT_MAXCPUS_LIMIT,
        max_threads: None,
        fixtures: Vec::new(),
        launch_args,
    }
}

fn pseries_policy(accel: &str) -> ResolutionPolicy {
    ResolutionPolicy {
        arch: "ppc64".to_string(),
        machine: "pseries".to_string(),
        accel: accel.to_string(),
        order: [Dimension::Cores, Dimension::Threads, Dimension::Sockets],
        modeled: vec![Dimension::Cores],
        unset_dimension: UnsetDimension::Zero,
        max_cpus: DEFAULT_MAXCPUS_LIMIT,
        max_threads: None,
        fixtures: Vec::new(),
        launch_args: args(&["-machine", &format!("pseries,accel={}", accel)]),
    }
}

/// All platforms the harness knows how to resolve.
pub fn builtin_policies() -> Result<Vec<ResolutionPolicy>> {
    let pc = x86_policy("pc", args(&["-cpu", "host", "-machine", "pc,accel=kvm"]));
    let q35 = x86_policy(
        "q35",
        args(&[
            "-cpu",
            "host",
            "-machine",
            "q35,accel=kvm,kernel-irqchip=split",
            "-device",
            "intel-iommu,intremap=on,eim=on",
        ]),
    );

    // TCG cannot run more than one thread per core on pseries.
    let mut pseries_tcg = pseries_policy("tcg");
    pseries_tcg.max_threads = Some(1);

    // spapr numbers cores by the index of their first thread.
    let pseries_kvm = pseries_policy("kvm").with_fixture(SpreadFixture {
        request: TopologyRequest::builder()
            .cpus(4)
            .cores(2)
            .threads(2)
            .build()?,
        core_ids: Some(IdSet::from_ids([0, 2])),
        thread_ids: None,
        socket_ids: None,
    });

    let virt = ResolutionPolicy {
        arch: "aarch64".to_string(),
        machine: "virt".to_string(),
        accel: "kvm".to_string(),
        order: [Dimension::Threads, Dimension::Cores, Dimension::Sockets],
        modeled: vec![Dimension::Threads],
        unset_dimension: UnsetDimension::EqualsCpuCount,
        max_cpus: DEFAULT_MAXCPUS_LIMIT,
        max_threads: None,
        fixtures: Vec::new(),
        launch_args: args(&["-cpu", "host", "-machine", "virt,accel=kvm"]),
    };

    Ok(vec![pc, q35, pseries_tcg, pseries_kvm, virt])
}
