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

//! Driver of one `-smp` scenario.
//!
//! A scenario walks `Built -> Encoded -> Launched` and then either stops at
//! `Rejected`, or goes on `Running -> Observed -> Asserted`.

use std::fmt;

use anyhow::{anyhow, Context, Result};
use cpu::{
    check, read_value, resolve, CpuTopology, ObservedTopology, RejectReason, Resolution,
    ResolutionPolicy, ThreadReporting, Verdict,
};
use log::{info, warn};
use machine_manager::config::{parse_smp, TopologyRequest};
use machine_manager::qmp::qmp_schema::HotpluggableCPU;
use serde_json::Value;
use thiserror::Error;

/// A target instance that came up.
pub trait RunningTarget {
    /// Raw `return` value of `query-hotpluggable-cpus`.
    fn query_hotpluggable_cpus(&mut self) -> Result<Value>;

    fn shutdown(&mut self) -> Result<()>;
}

pub enum LaunchOutcome {
    /// The target terminated on its own with this exit code.
    Exited(i32),
    Running(Box<dyn RunningTarget>),
}

impl fmt::Debug for LaunchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LaunchOutcome::Exited(code) => write!(f, "Exited({})", code),
            LaunchOutcome::Running(_) => write!(f, "Running"),
        }
    }
}

/// Starts a target with a `-smp` option.
pub trait Launcher {
    fn launch(&mut self, smp_option: &str) -> Result<LaunchOutcome>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScenarioState {
    Built,
    Encoded,
    Launched,
    Rejected,
    Running,
    Observed,
    Asserted,
}

impl ScenarioState {
    fn can_advance_to(self, next: ScenarioState) -> bool {
        matches!(
            (self, next),
            (ScenarioState::Built, ScenarioState::Encoded)
                | (ScenarioState::Encoded, ScenarioState::Launched)
                | (ScenarioState::Launched, ScenarioState::Rejected)
                | (ScenarioState::Launched, ScenarioState::Running)
                | (ScenarioState::Running, ScenarioState::Observed)
                | (ScenarioState::Observed, ScenarioState::Asserted)
        )
    }
}

impl fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("smp {0} should be rejected ({1}), but the target is running")]
    RejectionExpectedButRunning(String, RejectReason),
    #[error("smp {0} should be rejected ({1}), but the target exited with 0")]
    RejectionExpectedButSucceeded(String, RejectReason),
    #[error("smp {0} should be accepted, but the target exited with {1}")]
    AcceptanceExpectedButExited(String, i32),
    #[error("Topology of smp {0} mismatch: {1}")]
    TopologyMismatch(String, Verdict),
    #[error("Scenario cannot move from {0} to {1}")]
    InvalidTransition(ScenarioState, ScenarioState),
}

/// What happened in a finished scenario.
#[derive(Debug)]
pub struct ScenarioReport {
    pub option: String,
    pub state: ScenarioState,
    pub resolution: Resolution,
    pub exit_code: Option<i32>,
    pub verdict: Option<Verdict>,
}

pub struct SmpScenario {
    request: TopologyRequest,
    resolution: Resolution,
    state: ScenarioState,
    option: String,
    exit_code: Option<i32>,
}

impl SmpScenario {
    pub fn new(request: TopologyRequest, policy: &ResolutionPolicy) -> Self {
        SmpScenario {
            resolution: resolve(&request, policy),
            request,
            state: ScenarioState::Built,
            option: String::new(),
            exit_code: None,
        }
    }

    pub fn state(&self) -> ScenarioState {
        self.state
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    fn advance(&mut self, next: ScenarioState) -> Result<()> {
        if !self.state.can_advance_to(next) {
            return Err(anyhow!(ScenarioError::InvalidTransition(self.state, next)));
        }
        self.state = next;
        Ok(())
    }

    /// Produce the `-smp` option of the request.
    pub fn encode(&mut self) -> Result<String> {
        self.advance(ScenarioState::Encoded)?;
        self.option = self.request.encode();
        Ok(self.option.clone())
    }

    /// Start the target and judge whether it accepted the option as
    /// expected. Returns the target when it is running.
    pub fn launch(
        &mut self,
        launcher: &mut dyn Launcher,
    ) -> Result<Option<Box<dyn RunningTarget>>> {
        self.advance(ScenarioState::Launched)?;
        let outcome = launcher
            .launch(&self.option)
            .with_context(|| format!("Failed to launch target with -smp {}", self.option))?;
        info!("Launch with -smp {}: {:?}", self.option, outcome);

        match (self.resolution.reject_reason(), outcome) {
            (Some(reason), LaunchOutcome::Exited(code)) => {
                self.exit_code = Some(code);
                if code == 0 {
                    return Err(anyhow!(ScenarioError::RejectionExpectedButSucceeded(
                        self.option.clone(),
                        reason
                    )));
                }
                self.advance(ScenarioState::Rejected)?;
                Ok(None)
            }
            (Some(reason), LaunchOutcome::Running(mut target)) => {
                if let Err(e) = target.shutdown() {
                    warn!("Failed to shut down target: {:?}", e);
                }
                Err(anyhow!(ScenarioError::RejectionExpectedButRunning(
                    self.option.clone(),
                    reason
                )))
            }
            (None, LaunchOutcome::Exited(code)) => {
                self.exit_code = Some(code);
                Err(anyhow!(ScenarioError::AcceptanceExpectedButExited(
                    self.option.clone(),
                    code
                )))
            }
            (None, LaunchOutcome::Running(target)) => {
                self.advance(ScenarioState::Running)?;
                Ok(Some(target))
            }
        }
    }

    pub fn observe(&mut self, target: &mut dyn RunningTarget) -> Result<ObservedTopology> {
        self.advance(ScenarioState::Observed)?;
        let reply = target.query_hotpluggable_cpus()?;
        read_value(&reply)
    }

    pub fn assert(&mut self, observed: &ObservedTopology) -> Result<Verdict> {
        self.advance(ScenarioState::Asserted)?;
        let expected = self
            .resolution
            .expected()
            .ok_or_else(|| anyhow!("smp {} has no expected topology", self.option))?;
        let verdict = check(expected, observed);
        if !verdict.is_pass() {
            return Err(anyhow!(ScenarioError::TopologyMismatch(
                self.option.clone(),
                verdict
            )));
        }
        Ok(verdict)
    }

    /// Run all steps with one launcher.
    pub fn run(&mut self, launcher: &mut dyn Launcher) -> Result<ScenarioReport> {
        self.encode()?;
        let verdict = match self.launch(launcher)? {
            None => None,
            Some(mut target) => {
                let observed = self.observe(target.as_mut());
                if let Err(e) = target.shutdown() {
                    warn!("Failed to shut down target: {:?}", e);
                }
                Some(self.assert(&observed?)?)
            }
        };
        Ok(ScenarioReport {
            option: self.option.clone(),
            state: self.state,
            resolution: self.resolution.clone(),
            exit_code: self.exit_code,
            verdict,
        })
    }
}

enum SimulatedBehavior {
    Exit(i32),
    Report(Value),
    Conform(ResolutionPolicy, ThreadReporting),
}

/// In-process target for driving scenarios without a hypervisor.
pub struct SimulatedLauncher {
    behavior: SimulatedBehavior,
    launches: Vec<String>,
}

impl SimulatedLauncher {
    /// Target that always exits with `code`.
    pub fn exiting(code: i32) -> Self {
        Self::with_behavior(SimulatedBehavior::Exit(code))
    }

    /// Target that always runs and replies `reply`.
    pub fn reporting(reply: Value) -> Self {
        Self::with_behavior(SimulatedBehavior::Report(reply))
    }

    pub fn reporting_cpus(cpus: &[HotpluggableCPU]) -> Result<Self> {
        let reply = serde_json::to_value(cpus)?;
        Ok(Self::reporting(reply))
    }

    /// Target that parses the option and behaves as the platform of
    /// `policy` does.
    pub fn conforming(policy: ResolutionPolicy, reporting: ThreadReporting) -> Self {
        Self::with_behavior(SimulatedBehavior::Conform(policy, reporting))
    }

    fn with_behavior(behavior: SimulatedBehavior) -> Self {
        SimulatedLauncher {
            behavior,
            launches: Vec::new(),
        }
    }

    /// Options of every launch so far.
    pub fn launches(&self) -> &[String] {
        &self.launches
    }
}

impl Launcher for SimulatedLauncher {
    fn launch(&mut self, smp_option: &str) -> Result<LaunchOutcome> {
        self.launches.push(smp_option.to_string());
        let reply = match &self.behavior {
            SimulatedBehavior::Exit(code) => return Ok(LaunchOutcome::Exited(*code)),
            SimulatedBehavior::Report(reply) => reply.clone(),
            SimulatedBehavior::Conform(policy, reporting) => {
                let request = match parse_smp(smp_option) {
                    Ok(request) => request,
                    Err(e) => {
                        warn!("Invalid -smp {}: {:?}", smp_option, e);
                        return Ok(LaunchOutcome::Exited(1));
                    }
                };
                match CpuTopology::from_request(&request, policy) {
                    Ok(topology) => {
                        serde_json::to_value(topology.hotpluggable_cpus(policy, *reporting))?
                    }
                    Err(reason) => {
                        warn!("Invalid -smp {}: {}", smp_option, reason);
                        return Ok(LaunchOutcome::Exited(1));
                    }
                }
            }
        };
        Ok(LaunchOutcome::Running(Box::new(SimulatedTarget {
            reply,
            shut_down: false,
        })))
    }
}

struct SimulatedTarget {
    reply: Value,
    shut_down: bool,
}

impl RunningTarget for SimulatedTarget {
    fn query_hotpluggable_cpus(&mut self) -> Result<Value> {
        if self.shut_down {
            return Err(anyhow!("Target is already shut down"));
        }
        Ok(self.reply.clone())
    }

    fn shutdown(&mut self) -> Result<()> {
        self.shut_down = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn q35() -> ResolutionPolicy {
        ResolutionPolicy::lookup("x86_64", "q35", "kvm").unwrap()
    }

    fn request(cpus: u32) -> TopologyRequest {
        TopologyRequest::builder().cpus(cpus).build().unwrap()
    }

    #[test]
    fn test_transitions() {
        use ScenarioState::*;
        assert!(Built.can_advance_to(Encoded));
        assert!(Launched.can_advance_to(Rejected));
        assert!(Launched.can_advance_to(Running));
        assert!(!Built.can_advance_to(Launched));
        assert!(!Rejected.can_advance_to(Running));
        assert!(!Running.can_advance_to(Asserted));
        assert!(!Asserted.can_advance_to(Built));
    }

    #[test]
    fn test_step_out_of_order() {
        let mut scenario = SmpScenario::new(request(4), &q35());
        let mut launcher = SimulatedLauncher::exiting(1);
        let err = scenario.launch(&mut launcher).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<ScenarioError>(),
            Some(ScenarioError::InvalidTransition(
                ScenarioState::Built,
                ScenarioState::Launched
            ))
        ));
        assert!(launcher.launches().is_empty());

        assert_eq!(scenario.encode().unwrap(), "4");
        assert!(scenario.encode().is_err());
    }

    #[test]
    fn test_run_conforming() {
        let mut scenario = SmpScenario::new(request(4), &q35());
        let mut launcher = SimulatedLauncher::conforming(q35(), ThreadReporting::Property);
        let report = scenario.run(&mut launcher).unwrap();
        assert_eq!(report.state, ScenarioState::Asserted);
        assert!(report.verdict.unwrap().is_pass());
        assert_eq!(launcher.launches().to_vec(), vec!["4".to_string()]);
    }

    #[test]
    fn test_run_rejected() {
        let request = TopologyRequest::builder().cpus(8).maxcpus(4).build().unwrap();
        let mut scenario = SmpScenario::new(request, &q35());
        let report = scenario
            .run(&mut SimulatedLauncher::exiting(1))
            .unwrap();
        assert_eq!(report.state, ScenarioState::Rejected);
        assert_eq!(report.exit_code, Some(1));
        assert!(report.verdict.is_none());
    }

    #[test]
    fn test_rejection_expected_but_running() {
        let request = TopologyRequest::builder().cpus(8).maxcpus(4).build().unwrap();
        let mut scenario = SmpScenario::new(request, &q35());
        let err = scenario
            .run(&mut SimulatedLauncher::reporting(json!([])))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScenarioError>(),
            Some(ScenarioError::RejectionExpectedButRunning(
                _,
                RejectReason::CpuCountExceedsMax
            ))
        ));
    }

    #[test]
    fn test_rejection_expected_but_succeeded() {
        let request = TopologyRequest::builder().cpus(8).maxcpus(4).build().unwrap();
        let mut scenario = SmpScenario::new(request, &q35());
        let err = scenario
            .run(&mut SimulatedLauncher::exiting(0))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScenarioError>(),
            Some(ScenarioError::RejectionExpectedButSucceeded(..))
        ));
    }

    #[test]
    fn test_acceptance_expected_but_exited() {
        let mut scenario = SmpScenario::new(request(4), &q35());
        let err = scenario
            .run(&mut SimulatedLauncher::exiting(1))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScenarioError>(),
            Some(ScenarioError::AcceptanceExpectedButExited(_, 1))
        ));
        assert_eq!(scenario.state(), ScenarioState::Launched);
    }

    #[test]
    fn test_topology_mismatch() {
        let mut scenario = SmpScenario::new(request(2), &q35());
        let reply = json!([
            {"props": {"core-id": 0, "thread-id": 0, "socket-id": 0}},
            {"props": {"core-id": 1, "thread-id": 0, "socket-id": 0}}
        ]);
        let err = scenario
            .run(&mut SimulatedLauncher::reporting(reply))
            .unwrap_err();
        match err.downcast_ref::<ScenarioError>() {
            Some(ScenarioError::TopologyMismatch(option, verdict)) => {
                assert_eq!(option, "2");
                assert_eq!(verdict.mismatches().count(), 2);
            }
            other => panic!("Unexpected error {:?}", other),
        }
        assert_eq!(scenario.state(), ScenarioState::Asserted);
    }

    #[test]
    fn test_malformed_reply() {
        let mut scenario = SmpScenario::new(request(2), &q35());
        let err = scenario
            .run(&mut SimulatedLauncher::reporting(json!({"cpus": []})))
            .unwrap_err();
        assert!(err.downcast_ref::<cpu::CpuError>().is_some());
        assert_eq!(scenario.state(), ScenarioState::Observed);
    }
}
