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

mod commands;

use std::{path::PathBuf, process::exit};

use anyhow::{Context, Result};
use clap::{crate_description, Args, Parser, Subcommand};
use cpu::{topology::DEFAULT_MAXCPUS_LIMIT, ResolutionPolicy};
use log::info;

use crate::commands::{Check, Encode, Policies, Resolve, Simulate};

// Options shared by all commands.
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path of log file, logs go to stderr if not set.
    #[arg(short, long)]
    log: Option<PathBuf>,
    /// Target architecture.
    #[arg(long, default_value = "x86_64")]
    arch: String,
    /// Machine type.
    #[arg(long, default_value = "q35")]
    machine: String,
    /// Accelerator.
    #[arg(long, default_value = "kvm")]
    accel: String,
    /// Ceiling of maxcpus on the target.
    #[arg(long, default_value_t = DEFAULT_MAXCPUS_LIMIT)]
    maxcpus_limit: u32,
}

impl GlobalOpts {
    fn policy(&self) -> Result<ResolutionPolicy> {
        Ok(
            ResolutionPolicy::lookup(&self.arch, &self.machine, &self.accel)?
                .with_max_cpus(self.maxcpus_limit),
        )
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    Encode(Encode),
    Resolve(Resolve),
    Check(Check),
    Simulate(Simulate),
    Policies(Policies),
}

#[derive(Parser, Debug)]
#[command(version, author, about = crate_description!())]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,
    #[command(subcommand)]
    cmd: Command,
}

fn cmd_run(command: Command, global: &GlobalOpts) -> Result<()> {
    match command {
        Command::Encode(encode) => {
            info!("Run command: {:?}", encode);
            encode.run()?
        }
        Command::Resolve(resolve) => {
            info!("Run command: {:?}", resolve);
            resolve.run(&global.policy()?)?
        }
        Command::Check(check) => {
            info!("Run command: {:?}", check);
            check.run(&global.policy()?)?
        }
        Command::Simulate(simulate) => {
            info!("Run command: {:?}", simulate);
            simulate.run(&global.policy()?)?
        }
        Command::Policies(policies) => {
            info!("Run command: {:?}", policies);
            policies.run(global.maxcpus_limit)?
        }
    }
    Ok(())
}

fn real_main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = cli
        .global
        .log
        .as_ref()
        .map(|path| path.to_string_lossy().to_string())
        .unwrap_or_default();
    util::logger::init_log(log_path).with_context(|| "Failed to init logger")?;

    cmd_run(cli.cmd, &cli.global)
}

fn main() {
    if let Err(e) = real_main() {
        eprintln!("ERROR: {:?}", e);
        exit(1);
    }
    exit(0);
}
