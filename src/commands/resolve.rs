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
use clap::{builder::NonEmptyStringValueParser, Parser};
use cpu::{resolve, ResolutionPolicy};
use machine_manager::config::parse_smp;

use super::print_json;

/// Print what a conforming target reports for a -smp option
#[derive(Debug, Parser)]
pub struct Resolve {
    /// The -smp option, like "4,cores=2,maxcpus=8"
    #[arg(value_parser = NonEmptyStringValueParser::new(), required = true)]
    pub smp: String,
}

impl Resolve {
    pub fn run(&self, policy: &ResolutionPolicy) -> Result<()> {
        let request = parse_smp(&self.smp)?;
        let resolution = resolve(&request, policy);
        print_json(
            &serde_json::to_value(&resolution)
                .with_context(|| format!("Failed to serialize resolution of {}", self.smp))?,
        )
    }
}
