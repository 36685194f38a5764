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

//! Client side of QMP.
//!
//! # Qmp Introduction
//!
//! [Qmp](https://wiki.qemu.org/Documentation/QMP) is a Json-based protocol
//! which allows applications to control a VM instance. The harness only
//! needs the handshake, `query-hotpluggable-cpus` and `quit`, so only those
//! structures are kept here.

pub mod qmp_response;
#[allow(non_upper_case_globals)]
#[allow(non_camel_case_types)]
#[allow(non_snake_case)]
pub mod qmp_schema;

use anyhow::{Context, Result};

use self::qmp_schema::QmpCommand;

/// Serialize a command into one qmp line.
pub fn command_line(cmd: &QmpCommand) -> Result<String> {
    let mut line = serde_json::to_string(cmd)
        .with_context(|| format!("Failed to serialize qmp command {:?}", cmd))?;
    line.push('\n');
    Ok(line)
}
