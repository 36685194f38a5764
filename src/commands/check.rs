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

use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{builder::NonEmptyStringValueParser, Parser};
use cpu::{check, read_value, resolve, Resolution, ResolutionPolicy};
use machine_manager::config::parse_smp;
use serde_json::Value;

/// Check a saved query-hotpluggable-cpus reply against a -smp option
#[derive(Debug, Parser)]
pub struct Check {
    /// The -smp option the target was launched with
    #[arg(value_parser = NonEmptyStringValueParser::new(), required = true)]
    pub smp: String,
    /// File holding the reply, either the whole response or its "return"
    /// array
    #[arg(long, required = true)]
    pub reply: PathBuf,
}

/// The cpu entries of a reply file.
fn reply_entries(content: &str) -> Result<Value> {
    let mut reply: Value =
        serde_json::from_str(content).with_context(|| "Reply is not valid json")?;
    if let Some(entries) = reply.get_mut("return") {
        return Ok(entries.take());
    }
    Ok(reply)
}

impl Check {
    pub fn run(&self, policy: &ResolutionPolicy) -> Result<()> {
        let request = parse_smp(&self.smp)?;
        let expected = match resolve(&request, policy) {
            Resolution::Valid(expected) => expected,
            Resolution::Rejected(reason) => {
                bail!("smp {} must be rejected by the target: {}", self.smp, reason)
            }
        };

        let content = fs::read_to_string(&self.reply)
            .with_context(|| format!("Failed to read {}", self.reply.display()))?;
        let observed = read_value(&reply_entries(&content)?)?;
        let verdict = check(&expected, &observed);
        for dimension_check in &verdict.checks {
            println!("{}", dimension_check);
        }
        if !verdict.is_pass() {
            bail!("Topology of smp {} mismatch: {}", self.smp, verdict);
        }
        Ok(())
    }
}
