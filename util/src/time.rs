// Copyright (c) 2022 Huawei Technologies Co.,Ltd. All rights reserved.
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

pub const NANOSECONDS_PER_SECOND: u64 = 1_000_000_000;

/// Get the wall clock time as `(seconds, nanoseconds)` since the epoch.
pub fn gettime() -> Result<(i64, i64)> {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: ts is a local variable and valid.
    let ret = unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut ts) };
    if ret != 0 {
        bail!(
            "Failed to get realtime clock: {}",
            std::io::Error::last_os_error()
        );
    }

    Ok((ts.tv_sec as i64, ts.tv_nsec as i64))
}

/// Split seconds since the epoch into local
/// `[year, month, day, hour, minute, second]`.
pub fn get_format_time(sec: i64) -> [i32; 6] {
    // SAFETY: an all-zero value is valid for libc::tm.
    let mut ti: libc::tm = unsafe { std::mem::zeroed() };
    let time = sec as libc::time_t;
    // SAFETY: time and ti are both local variables and valid.
    unsafe {
        libc::localtime_r(&time, &mut ti);
    }

    [
        ti.tm_year + 1900,
        ti.tm_mon + 1,
        ti.tm_mday,
        ti.tm_hour,
        ti.tm_min,
        ti.tm_sec,
    ]
}
