#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use samsungac_cli::{CliOutput, CommandRunner, Error, Result};

pub const TOKEN: &str = "secret-token";
pub const DEVICE: &str = "dev-1";

pub enum Reply {
    Body(String),
    Fail,
}

#[derive(Default)]
struct Inner {
    calls: Vec<(String, Vec<String>)>,
    status: VecDeque<Reply>,
    sticky_status: Option<String>,
    fail_commands: bool,
}

/// Scripted stand-in for the SmartThings CLI. Records every invocation.
#[derive(Clone, Default)]
pub struct FakeRunner {
    inner: Arc<Mutex<Inner>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Body returned by every status call once the queue is drained.
    pub fn with_status(self, body: impl Into<String>) -> Self {
        self.inner.lock().unwrap().sticky_status = Some(body.into());
        self
    }

    pub fn push_status(&self, reply: Reply) {
        self.inner.lock().unwrap().status.push_back(reply);
    }

    pub fn set_status(&self, body: impl Into<String>) {
        self.inner.lock().unwrap().sticky_status = Some(body.into());
    }

    pub fn fail_commands(&self) {
        self.inner.lock().unwrap().fail_commands = true;
    }

    pub fn accept_commands(&self) {
        self.inner.lock().unwrap().fail_commands = false;
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Capability commands sent through `devices:commands`, in order.
    pub fn commands(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(_, args)| args[0] == "devices:commands")
            .map(|(_, args)| args[2].clone())
            .collect()
    }

    pub fn status_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|(_, args)| args[0] == "devices:status")
            .count()
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap().calls.clear();
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CliOutput> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push((program.to_string(), args.to_vec()));

        let failed = || Error::CommandFailed {
            code: Some(1),
            stderr: "simulated failure".to_string(),
        };

        if args[0] == "devices:commands" {
            if inner.fail_commands {
                return Err(failed());
            }
            return Ok(CliOutput::default());
        }

        let reply = match inner.status.pop_front() {
            Some(reply) => reply,
            None => match &inner.sticky_status {
                Some(body) => Reply::Body(body.clone()),
                None => Reply::Fail,
            },
        };
        match reply {
            Reply::Body(stdout) => Ok(CliOutput {
                stdout,
                stderr: String::new(),
            }),
            Reply::Fail => Err(failed()),
        }
    }
}

pub struct Status<'a> {
    pub switch: &'a str,
    pub mode: &'a str,
    pub fan: &'a str,
    pub current: f64,
    pub target: f64,
    pub power: f64,
}

impl Default for Status<'_> {
    fn default() -> Self {
        Self {
            switch: "on",
            mode: "cool",
            fan: "low",
            current: 24.0,
            target: 22.0,
            power: 410.0,
        }
    }
}

impl Status<'_> {
    pub fn body(&self) -> String {
        serde_json::json!({
            "components": {
                "main": {
                    "custom.thermostatSetpointControl": {
                        "minimumSetpoint": { "value": 16, "unit": "C" },
                        "maximumSetpoint": { "value": 30, "unit": "C" }
                    },
                    "airConditionerMode": {
                        "airConditionerMode": { "value": self.mode },
                        "supportedAcModes": { "value": ["cool", "dry", "wind", "auto", "heat"] }
                    },
                    "switch": { "switch": { "value": self.switch } },
                    "airConditionerFanMode": { "fanMode": { "value": self.fan } },
                    "temperatureMeasurement": { "temperature": { "value": self.current, "unit": "C" } },
                    "thermostatCoolingSetpoint": { "coolingSetpoint": { "value": self.target, "unit": "C" } },
                    "powerConsumptionReport": {
                        "powerConsumption": { "value": { "energy": 81230, "power": self.power } }
                    }
                }
            }
        })
        .to_string()
    }
}
