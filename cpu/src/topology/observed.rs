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
use log::debug;
use machine_manager::qmp::qmp_schema::HotpluggableCPU;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use super::id_set::IdSet;
use super::policy::Dimension;
use crate::error::CpuError;

/// Trailing `thread[<n>]` component of a vcpu QOM path.
static QOM_THREAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"thread\[(\d+)\]$").unwrap_or_else(|e| panic!("Invalid QOM path pattern: {}", e))
});

/// Ids reported by a running target.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ObservedTopology {
    pub core_ids: IdSet,
    pub thread_ids: IdSet,
    pub socket_ids: IdSet,
}

impl ObservedTopology {
    pub fn ids(&self, dimension: Dimension) -> &IdSet {
        match dimension {
            Dimension::Sockets => &self.socket_ids,
            Dimension::Cores => &self.core_ids,
            Dimension::Threads => &self.thread_ids,
        }
    }
}

fn to_id(value: i64, name: &str, index: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        anyhow!(CpuError::MalformedObservation(format!(
            "{} {} of entry {} is not a valid id",
            name, value, index
        )))
    })
}

fn thread_from_path(path: &str, index: usize) -> Result<Option<u32>> {
    let caps = match QOM_THREAD.captures(path) {
        Some(caps) => caps,
        None => return Ok(None),
    };
    let id = caps[1].parse::<u32>().map_err(|_| {
        anyhow!(CpuError::MalformedObservation(format!(
            "thread index in qom-path {} of entry {} is out of range",
            path, index
        )))
    })?;
    Ok(Some(id))
}

/// Collect the core, thread and socket ids of a `query-hotpluggable-cpus`
/// reply.
///
/// The thread id comes from the `thread-id` property, or from the QOM path
/// when the platform only encodes it there. Missing properties contribute
/// nothing to their dimension.
pub fn read(records: &[HotpluggableCPU]) -> Result<ObservedTopology> {
    let mut observed = ObservedTopology::default();
    for (index, record) in records.iter().enumerate() {
        let props = &record.props;
        if let Some(core_id) = props.core_id {
            observed.core_ids.insert(to_id(core_id, "core-id", index)?);
        }
        if let Some(socket_id) = props.socket_id {
            observed
                .socket_ids
                .insert(to_id(socket_id, "socket-id", index)?);
        }
        let thread_id = match props.thread_id {
            Some(thread_id) => Some(to_id(thread_id, "thread-id", index)?),
            None => match record.qom_path.as_deref() {
                Some(path) => thread_from_path(path, index)?,
                None => None,
            },
        };
        if let Some(thread_id) = thread_id {
            observed.thread_ids.insert(thread_id);
        }
    }
    debug!(
        "Observed {} cpu entries: cores {}, threads {}, sockets {}",
        records.len(),
        observed.core_ids,
        observed.thread_ids,
        observed.socket_ids
    );
    Ok(observed)
}

/// Same as `read`, for the raw `return` value of the command.
pub fn read_value(value: &Value) -> Result<ObservedTopology> {
    let entries = value.as_array().ok_or_else(|| {
        anyhow!(CpuError::MalformedObservation(format!(
            "expected an array of cpu entries, got {}",
            value
        )))
    })?;
    for (index, entry) in entries.iter().enumerate() {
        if !entry.get("props").map_or(false, Value::is_object) {
            return Err(anyhow!(CpuError::MalformedObservation(format!(
                "entry {} has no props object",
                index
            ))));
        }
    }
    let records: Vec<HotpluggableCPU> = serde_json::from_value(value.clone())
        .map_err(|e| anyhow!(CpuError::MalformedObservation(e.to_string())))
        .with_context(|| "Failed to decode query-hotpluggable-cpus reply")?;
    read(&records)
}
