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

use anyhow::{anyhow, bail, Result};
use serde::Serialize;

use super::error::ConfigError;
use super::{CmdParser, ConfigCheck};

const SMP_NAME: &str = "smp";

/// Partial `-smp` topology request.
///
/// Every field is optional, but a request always carries at least one of
/// them. Fields are only readable once the request is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TopologyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    cpus: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cores: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    threads: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sockets: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    maxcpus: Option<u32>,
}

impl TopologyRequest {
    pub fn builder() -> TopologyRequestBuilder {
        TopologyRequestBuilder::default()
    }

    pub fn cpus(&self) -> Option<u32> {
        self.cpus
    }

    pub fn cores(&self) -> Option<u32> {
        self.cores
    }

    pub fn threads(&self) -> Option<u32> {
        self.threads
    }

    pub fn sockets(&self) -> Option<u32> {
        self.sockets
    }

    /// The explicit `maxcpus` field, `None` when it was not requested.
    pub fn maxcpus(&self) -> Option<u32> {
        self.maxcpus
    }

    /// `maxcpus` as the target sees it: defaults to `cpus` when absent.
    pub fn effective_maxcpus(&self) -> Option<u32> {
        self.maxcpus.or(self.cpus)
    }

    /// Render the request as a `-smp` option string.
    ///
    /// `cpus` goes first without a label, the other present fields follow
    /// as `key=value` in the order cores, threads, sockets, maxcpus.
    pub fn encode(&self) -> String {
        let mut option_list = Vec::new();
        if let Some(cpus) = self.cpus {
            option_list.push(cpus.to_string());
        }
        for (key, value) in [
            ("cores", self.cores),
            ("threads", self.threads),
            ("sockets", self.sockets),
            ("maxcpus", self.maxcpus),
        ] {
            if let Some(value) = value {
                option_list.push(format!("{}={}", key, value));
            }
        }

        option_list.join(",")
    }

    const fn empty() -> Self {
        TopologyRequest {
            cpus: None,
            cores: None,
            threads: None,
            sockets: None,
            maxcpus: None,
        }
    }

    fn is_empty(&self) -> bool {
        self.cpus.is_none()
            && self.cores.is_none()
            && self.threads.is_none()
            && self.sockets.is_none()
            && self.maxcpus.is_none()
    }
}

impl ConfigCheck for TopologyRequest {
    fn check(&self) -> Result<()> {
        if self.is_empty() {
            return Err(anyhow!(ConfigError::InvalidRequest(
                SMP_NAME.to_string(),
                "none of cpus, cores, threads, sockets or maxcpus is given".to_string()
            )));
        }

        Ok(())
    }
}

impl fmt::Display for TopologyRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

/// Builder of `TopologyRequest`, `build` refuses an empty request.
#[derive(Clone, Copy, Debug)]
pub struct TopologyRequestBuilder {
    inner: TopologyRequest,
}

impl Default for TopologyRequestBuilder {
    fn default() -> Self {
        TopologyRequestBuilder {
            inner: TopologyRequest::empty(),
        }
    }
}

impl TopologyRequestBuilder {
    pub fn cpus(mut self, cpus: u32) -> Self {
        self.inner.cpus = Some(cpus);
        self
    }

    pub fn cores(mut self, cores: u32) -> Self {
        self.inner.cores = Some(cores);
        self
    }

    pub fn threads(mut self, threads: u32) -> Self {
        self.inner.threads = Some(threads);
        self
    }

    pub fn sockets(mut self, sockets: u32) -> Self {
        self.inner.sockets = Some(sockets);
        self
    }

    pub fn maxcpus(mut self, maxcpus: u32) -> Self {
        self.inner.maxcpus = Some(maxcpus);
        self
    }

    pub fn build(self) -> Result<TopologyRequest> {
        self.inner.check()?;
        Ok(self.inner)
    }
}

/// Parse a `-smp` option string back into a `TopologyRequest`.
///
/// # Arguments
///
/// * `smp_config` - Option string like `4,cores=2,maxcpus=8`.
pub fn parse_smp(smp_config: &str) -> Result<TopologyRequest> {
    let mut cmd_parser = CmdParser::new(SMP_NAME);
    cmd_parser
        .push("")
        .push("cpus")
        .push("cores")
        .push("threads")
        .push("sockets")
        .push("maxcpus");

    cmd_parser.parse(smp_config)?;

    let positional = cmd_parser.get_value::<u32>("")?;
    let labeled = cmd_parser.get_value::<u32>("cpus")?;
    if positional.is_some() && labeled.is_some() {
        bail!(ConfigError::FieldRepeat(
            "cpus".to_string(),
            SMP_NAME.to_string()
        ));
    }

    let request = TopologyRequest {
        cpus: positional.or(labeled),
        cores: cmd_parser.get_value::<u32>("cores")?,
        threads: cmd_parser.get_value::<u32>("threads")?,
        sockets: cmd_parser.get_value::<u32>("sockets")?,
        maxcpus: cmd_parser.get_value::<u32>("maxcpus")?,
    };
    request.check()?;

    Ok(request)
}
