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

//! Expected and observed cpu topology.
//!
//! A `-smp` request is resolved against the rules of one platform into the
//! ids `query-hotpluggable-cpus` should report, the live reply is read back
//! into the same shape, and both are compared dimension by dimension.

pub mod assertion;
pub mod id_set;
pub mod observed;
pub mod policy;
pub mod resolver;

pub use assertion::{check, DimensionCheck, Verdict};
pub use id_set::IdSet;
pub use observed::{read, read_value, ObservedTopology};
pub use policy::{
    builtin_policies, Dimension, ResolutionPolicy, SpreadFixture, UnsetDimension,
    DEFAULT_MAXCPUS_LIMIT,
};
pub use resolver::{resolve, ExpectedTopology, RejectReason, Resolution};
