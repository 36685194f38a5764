// Copyright (c) 2023 Huawei Technologies Co.,Ltd. All rights reserved.
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

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Qmp greeting message sent by the VM once a client connects.
#[derive(Default, Debug, Serialize, Deserialize, PartialEq)]
pub struct QmpGreeting {
    #[serde(rename = "QMP")]
    pub qmp: Greeting,
}

#[derive(Default, Debug, Serialize, Deserialize, PartialEq)]
pub struct Greeting {
    pub version: Version,
    #[serde(default)]
    pub capabilities: Vec<Value>,
}

#[derive(Default, Debug, Serialize, Deserialize, PartialEq)]
pub struct Version {
    #[serde(rename = "qemu")]
    pub application: VersionNumber,
    #[serde(default)]
    pub package: String,
}

#[derive(Default, Debug, Serialize, Deserialize, PartialEq)]
pub struct VersionNumber {
    pub micro: u8,
    pub minor: u8,
    pub major: u8,
}

/// `ErrorMessage` for Qmp Response.
#[derive(Default, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorMessage {
    #[serde(rename = "class")]
    pub errorkind: String,
    pub desc: String,
}

/// Qmp response from the VM.
///
/// # Notes
///
/// Exactly one of `return` and `error` is set, depending on whether the
/// command succeeded.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Response {
    #[serde(rename = "return", default, skip_serializing_if = "Option::is_none")]
    pub return_: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Response {
    /// Turn the response into the `return` value or an error carrying the
    /// qmp error class and description.
    pub fn into_result(self) -> Result<Value> {
        match (self.return_, self.error) {
            (Some(value), None) => Ok(value),
            (_, Some(err)) => bail!("Qmp command failed: {}: {}", err.errorkind, err.desc),
            (None, None) => bail!("Qmp response carries neither return nor error"),
        }
    }
}

/// Whether a raw qmp message is an asynchronous event instead of a reply.
pub fn is_event(message: &Value) -> bool {
    message.get("event").is_some()
}
