// Copyright (c) 2020 Huawei Technologies Co.,Ltd. All rights reserved.
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

//! # Cpu
//!
//! This mod is to work out which cpu topology a `-smp` request stands for
//! and to verify the topology a running VM reports.
//!
//! ## Design
//!
//! This module offers support for:
//! 1. Resolve a partial request with the rules of one platform.
//! 2. Read the reply of `query-hotpluggable-cpus`.
//! 3. Compare expected and observed ids per dimension.
//! 4. Enumerate the vcpu slots of a topology the way a target reports them.
//!
//! ## Platform Support
//!
//! - `x86_64` (`pc`, `q35`)
//! - `ppc64` (`pseries`)
//! - `aarch64` (`virt`)

pub mod error;
pub mod topology;

pub use error::CpuError;
pub use topology::{
    check, read, read_value, resolve, Dimension, ExpectedTopology, IdSet, ObservedTopology,
    RejectReason, Resolution, ResolutionPolicy, UnsetDimension, Verdict,
};

use machine_manager::config::TopologyRequest;
use machine_manager::qmp::qmp_schema::{CpuInstanceProperties, HotpluggableCPU};

/// Where a target puts the thread id of a vcpu slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThreadReporting {
    /// As the `thread-id` property.
    Property,
    /// Only as the trailing `thread[<n>]` of the QOM path.
    QomPath,
}

/// Layout of the vcpu slots of one VM.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CpuTopology {
    /// Number of vcpus plugged at boot.
    pub nrcpus: u32,
    /// Number of sockets in VM.
    pub sockets: u32,
    /// Number of cores in one socket.
    pub cores: u32,
    /// Number of threads in one core.
    pub threads: u32,
    /// Number of vcpu slots, plugged or not.
    pub max_cpus: u32,
}

impl CpuTopology {
    /// * `nr_cpus`: Number of vcpus plugged at boot.
    /// * `nr_sockets`: Number of sockets in one VM.
    /// * `nr_cores`: Number of cores in one socket.
    /// * `nr_threads`: Number of threads in one core.
    /// * `max_cpus`: Number of vcpu slots.
    pub fn new(
        nr_cpus: u32,
        nr_sockets: u32,
        nr_cores: u32,
        nr_threads: u32,
        max_cpus: u32,
    ) -> Self {
        Self {
            nrcpus: nr_cpus,
            sockets: nr_sockets,
            cores: nr_cores,
            threads: nr_threads,
            max_cpus,
        }
    }

    /// Lay out the slots of an accepted request.
    ///
    /// Returns the reason the request is refused otherwise.
    pub fn from_request(
        request: &TopologyRequest,
        policy: &ResolutionPolicy,
    ) -> std::result::Result<Self, RejectReason> {
        let total = topology::resolver::validate(request, policy)?;
        let counts = topology::resolver::distribute(request, policy, total);
        let count = |dimension: Dimension| {
            counts
                .get(&dimension)
                .map_or(1, |count| u32::try_from(*count).unwrap_or(u32::MAX))
        };
        let max_cpus = u32::try_from(total).unwrap_or(u32::MAX);
        Ok(Self::new(
            request.cpus().unwrap_or(max_cpus),
            count(Dimension::Sockets),
            count(Dimension::Cores),
            count(Dimension::Threads),
            max_cpus,
        ))
    }

    /// Get single cpu topology for vcpu, return this vcpu's `socket-id`,
    /// `core-id` and `thread-id`.
    ///
    /// # Arguments
    ///
    /// * `vcpu_id` - ID of vcpu.
    fn get_topo_item(&self, vcpu_id: u32) -> (u32, u32, u32) {
        let socketid = vcpu_id / (self.cores * self.threads);
        let coreid = (vcpu_id / self.threads) % self.cores;
        let threadid = vcpu_id % self.threads;
        (socketid, coreid, threadid)
    }

    /// Properties of one slot, limited to what the platform models.
    pub fn get_topo_instance_for_qmp(
        &self,
        cpu_index: u32,
        policy: &ResolutionPolicy,
    ) -> CpuInstanceProperties {
        let (socketid, coreid, threadid) = self.get_topo_item(cpu_index);
        let folded = policy.unset_dimension == UnsetDimension::EqualsCpuCount;
        let first_modeled = policy.first_modeled();
        let id = |dimension: Dimension, value: u32| {
            if !policy.models(dimension) {
                None
            } else if folded && Some(dimension) == first_modeled {
                Some(i64::from(cpu_index))
            } else {
                Some(i64::from(value))
            }
        };
        CpuInstanceProperties {
            socket_id: id(Dimension::Sockets, socketid),
            core_id: id(Dimension::Cores, coreid),
            thread_id: id(Dimension::Threads, threadid),
            ..Default::default()
        }
    }

    /// Entries of `query-hotpluggable-cpus` for every slot.
    ///
    /// Plugged slots carry a QOM path. With `ThreadReporting::QomPath` every
    /// slot does, and its thread id appears only there.
    pub fn hotpluggable_cpus(
        &self,
        policy: &ResolutionPolicy,
        reporting: ThreadReporting,
    ) -> Vec<HotpluggableCPU> {
        (0..self.max_cpus)
            .map(|cpu_index| {
                let mut props = self.get_topo_instance_for_qmp(cpu_index, policy);
                let qom_path = match reporting {
                    ThreadReporting::Property if cpu_index < self.nrcpus => {
                        Some(format!("/machine/unattached/device[{}]", cpu_index))
                    }
                    ThreadReporting::Property => None,
                    ThreadReporting::QomPath => props.thread_id.take().map(|thread| {
                        format!(
                            "/machine/unattached/device[{}]/thread[{}]",
                            cpu_index, thread
                        )
                    }),
                };
                HotpluggableCPU {
                    type_: format!("{}-cpu", policy.arch),
                    vcpus_count: 1,
                    props,
                    qom_path,
                }
            })
            .collect()
    }
}
