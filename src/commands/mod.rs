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

mod check;
mod encode;
mod policies;
mod resolve;
mod simulate;

pub use check::Check;
pub use encode::Encode;
pub use policies::Policies;
pub use resolve::Resolve;
pub use simulate::Simulate;

use anyhow::{Context, Result};
use serde_json::Value;

fn print_json(value: &Value) -> Result<()> {
    let json_data =
        serde_json::to_string_pretty(value).with_context(|| "Failed to format json output")?;
    println!("{}", json_data);
    Ok(())
}
