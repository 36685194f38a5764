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

use anyhow::{Context, Result};
use clap::Parser;
use cpu::topology::builtin_policies;

use super::print_json;

/// List the built-in resolution policies
#[derive(Debug, Parser)]
pub struct Policies {}

impl Policies {
    pub fn run(&self, maxcpus_limit: u32) -> Result<()> {
        let policies: Vec<_> = builtin_policies()?
            .into_iter()
            .map(|policy| policy.with_max_cpus(maxcpus_limit))
            .collect();
        print_json(
            &serde_json::to_value(&policies).with_context(|| "Failed to serialize policies")?,
        )
    }
}
