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

use anyhow::Result;
use clap::Parser;
use machine_manager::config::TopologyRequest;

/// Build the -smp option of a topology request
#[derive(Debug, Parser)]
pub struct Encode {
    /// Number of vcpus plugged at boot
    #[arg(long)]
    pub cpus: Option<u32>,
    #[arg(long)]
    pub cores: Option<u32>,
    #[arg(long)]
    pub threads: Option<u32>,
    #[arg(long)]
    pub sockets: Option<u32>,
    /// Number of vcpu slots
    #[arg(long)]
    pub maxcpus: Option<u32>,
}

impl Encode {
    fn request(&self) -> Result<TopologyRequest> {
        let mut builder = TopologyRequest::builder();
        if let Some(cpus) = self.cpus {
            builder = builder.cpus(cpus);
        }
        if let Some(cores) = self.cores {
            builder = builder.cores(cores);
        }
        if let Some(threads) = self.threads {
            builder = builder.threads(threads);
        }
        if let Some(sockets) = self.sockets {
            builder = builder.sockets(sockets);
        }
        if let Some(maxcpus) = self.maxcpus {
            builder = builder.maxcpus(maxcpus);
        }
        builder.build()
    }

    pub fn run(&self) -> Result<()> {
        println!("{}", self.request()?.encode());
        Ok(())
    }
}
