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

use anyhow::{anyhow, Context, Result};
use clap::{builder::NonEmptyStringValueParser, Parser};
use cpu::{CpuTopology, ResolutionPolicy, ThreadReporting};
use machine_manager::config::parse_smp;

use super::print_json;

/// Print the query-hotpluggable-cpus reply of a simulated target
#[derive(Debug, Parser)]
pub struct Simulate {
    /// The -smp option of the simulated target
    #[arg(value_parser = NonEmptyStringValueParser::new(), required = true)]
    pub smp: String,
    /// Report thread ids only in the qom-path
    #[arg(long)]
    pub qom_path: bool,
}

impl Simulate {
    pub fn run(&self, policy: &ResolutionPolicy) -> Result<()> {
        let request = parse_smp(&self.smp)?;
        let topology = CpuTopology::from_request(&request, policy)
            .map_err(|reason| anyhow!("Target refuses smp {}: {}", self.smp, reason))?;
        let reporting = if self.qom_path {
            ThreadReporting::QomPath
        } else {
            ThreadReporting::Property
        };
        let cpus = topology.hotpluggable_cpus(policy, reporting);
        print_json(
            &serde_json::to_value(&cpus).with_context(|| "Failed to serialize cpu entries")?,
        )
    }
}
