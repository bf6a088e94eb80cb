use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;
use tracing::{Instrument, Span, debug, info_span, trace};
use uuid::Uuid;

use crate::config::Config;
use crate::diff::state_events;
use crate::logger::{MessageLogMode, MessageLogger};
use crate::protocol::{
    self, COMMANDS_SUBCOMMAND, DEFAULT_NAME, DEFAULT_SMARTTHINGS_PATH, STATUS_SUBCOMMAND, cli_args,
};
use crate::runner::{CliRunner, CommandRunner};
use crate::types::*;
use crate::{Error, Result};

const TARGET_TEMPERATURE_STEP: f64 = 1.0;

/// Band around the measured temperature inside which `auto` mode is
/// reported as idle.
const AUTO_IDLE_BAND_C: f64 = 1.0;

type EventCallback = Box<dyn Fn(&Event) + Send + Sync>;
type StateCallback = Box<dyn Fn(&ClimateState) + Send + Sync>;

pub struct SamsungAcClientBuilder {
    name: String,
    access_token: String,
    device_id: String,
    smartthings_path: String,
    api_version: ApiVersion,
    runner: Option<Box<dyn CommandRunner>>,
    timeout: Option<Duration>,
    event_callbacks: Vec<EventCallback>,
    state_callbacks: Vec<StateCallback>,
    log_mode: Option<MessageLogMode>,
    log_path: Option<PathBuf>,
    span: Option<Span>,
    refresh_after_command: bool,
}

impl SamsungAcClientBuilder {
    pub fn new(access_token: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            access_token: access_token.into(),
            device_id: device_id.into(),
            smartthings_path: DEFAULT_SMARTTHINGS_PATH.to_string(),
            api_version: ApiVersion::default(),
            runner: None,
            timeout: None,
            event_callbacks: Vec::new(),
            state_callbacks: Vec::new(),
            log_mode: None,
            log_path: None,
            span: None,
            refresh_after_command: true,
        }
    }

    /// Builder preloaded with every setting from `config`, for callers that
    /// still want to add callbacks or a message log.
    pub fn from_config(config: &Config) -> Self {
        let mut builder = Self::new(&config.access_token, &config.device_id)
            .name(&config.name)
            .smartthings_path(&config.smartthings_path)
            .api_version(config.api_version);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn smartthings_path(mut self, path: impl Into<String>) -> Self {
        self.smartthings_path = path.into();
        self
    }

    pub fn api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = version;
        self
    }

    /// Replace the subprocess runner, e.g. with a scripted one in tests.
    pub fn runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Some(Box::new(runner));
        self
    }

    /// Timeout for each CLI invocation. Ignored when a custom runner is set.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn on_event(mut self, f: impl Fn(&Event) + Send + Sync + 'static) -> Self {
        self.event_callbacks.push(Box::new(f));
        self
    }

    pub fn on_state(mut self, f: impl Fn(&ClimateState) + Send + Sync + 'static) -> Self {
        self.state_callbacks.push(Box::new(f));
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<PathBuf>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    /// Span every operation of this client runs in. Defaults to
    /// `samsung_ac{device_id}`.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Whether `set_*` re-reads device status after sending commands.
    pub fn refresh_after_command(mut self, refresh: bool) -> Self {
        self.refresh_after_command = refresh;
        self
    }

    pub fn build(self) -> Result<SamsungAcClient> {
        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => Some(MessageLogger::new(mode, path)?),
            _ => None,
        };

        let runner: Box<dyn CommandRunner> = match (self.runner, self.timeout) {
            (Some(runner), _) => runner,
            (None, Some(t)) => Box::new(CliRunner::with_timeout(t)),
            (None, None) => Box::new(CliRunner::new()),
        };

        let span = self
            .span
            .unwrap_or_else(|| info_span!("samsung_ac", device_id = %self.device_id));

        Ok(SamsungAcClient {
            name: self.name,
            access_token: self.access_token,
            device_id: self.device_id,
            smartthings_path: self.smartthings_path,
            api_version: self.api_version,
            runner,
            state: ClimateState::default(),
            ac_mode: None,
            fan_mode_setting: None,
            event_callbacks: self.event_callbacks,
            state_callbacks: self.state_callbacks,
            logger,
            span,
            refresh_after_command: self.refresh_after_command,
            last_error: None,
            last_command_error: None,
        })
    }
}

/// Climate entity backed by the SmartThings CLI.
///
/// The host calls [`update`](Self::update) periodically and the `set_*`
/// methods on user action. Neither ever fails: CLI and parse errors are
/// logged and turn the entity unavailable. Poll failures are kept in
/// [`last_error`](Self::last_error), failed commands in
/// [`last_command_error`](Self::last_command_error).
pub struct SamsungAcClient {
    name: String,
    access_token: String,
    device_id: String,
    smartthings_path: String,
    api_version: ApiVersion,
    runner: Box<dyn CommandRunner>,
    state: ClimateState,
    ac_mode: Option<String>,
    fan_mode_setting: Option<String>,
    event_callbacks: Vec<EventCallback>,
    state_callbacks: Vec<StateCallback>,
    logger: Option<MessageLogger>,
    span: Span,
    refresh_after_command: bool,
    last_error: Option<Error>,
    last_command_error: Option<Error>,
}

impl SamsungAcClient {
    pub fn builder(
        access_token: impl Into<String>,
        device_id: impl Into<String>,
    ) -> SamsungAcClientBuilder {
        SamsungAcClientBuilder::new(access_token, device_id)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        SamsungAcClientBuilder::from_config(config).build()
    }

    // -- Entity properties --

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    pub fn available(&self) -> bool {
        self.state.available
    }

    pub fn supported_features(&self) -> u32 {
        SUPPORT_TARGET_TEMPERATURE | SUPPORT_FAN_MODE
    }

    pub fn hvac_mode(&self) -> Option<HvacMode> {
        self.state.mode
    }

    pub fn hvac_modes(&self) -> &'static [HvacMode] {
        &HvacMode::ALL
    }

    pub fn hvac_action(&self) -> Option<HvacAction> {
        self.state.action
    }

    pub fn min_temp(&self) -> Temperature {
        self.state.min_temp
    }

    pub fn max_temp(&self) -> Temperature {
        self.state.max_temp
    }

    pub fn target_temperature_step(&self) -> f64 {
        TARGET_TEMPERATURE_STEP
    }

    pub fn temperature_unit(&self) -> TemperatureUnit {
        TemperatureUnit::Celsius
    }

    pub fn current_temperature(&self) -> Temperature {
        self.state.current_temperature
    }

    pub fn target_temperature(&self) -> Temperature {
        self.state.target_temperature
    }

    pub fn fan_mode(&self) -> Option<FanMode> {
        self.state.fan_mode
    }

    pub fn fan_modes(&self) -> &'static [FanMode] {
        &FanMode::SELECTABLE
    }

    pub fn power_consumption(&self) -> f64 {
        self.state.power_consumption
    }

    /// Device-side mode string as last polled or requested (`"wind"` for
    /// fan-only).
    pub fn ac_mode(&self) -> Option<&str> {
        self.ac_mode.as_deref()
    }

    pub fn state(&self) -> &ClimateState {
        &self.state
    }

    /// Most recent status poll failure; cleared by a successful update.
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    /// First failed command of the most recent `set_*` call. Reset when the
    /// next call starts sending commands, not by the refresh that follows.
    pub fn last_command_error(&self) -> Option<&Error> {
        self.last_command_error.as_ref()
    }

    // -- Polling --

    /// Called once when the host registers the entity.
    pub async fn on_added(&mut self) {
        debug!(parent: &self.span, name = %self.name, "entity added");
        self.update().await;
    }

    /// Refresh state from `devices:status`. On failure only the
    /// availability flag changes.
    pub async fn update(&mut self) {
        let span = self.span.clone();
        self.update_inner().instrument(span).await;
    }

    /// Fetch and parse device status without touching entity state.
    pub async fn fetch_status(&mut self) -> Result<DeviceStatus> {
        let span = self.span.clone();
        self.fetch_status_inner().instrument(span).await
    }

    async fn update_inner(&mut self) {
        let prev = self.state.clone();

        match self.fetch_status_inner().await {
            Ok(status) => {
                self.apply_status(&status);
                self.last_error = None;
                debug!(
                    action = self.state.action.map_or("none", |a| a.as_str()),
                    target_temp = status.cooling_setpoint,
                    current_temp = status.temperature,
                    min_temp = status.min_setpoint,
                    max_temp = status.max_setpoint,
                    ac_mode = %status.ac_mode,
                    switch = status.switch.as_str(),
                    fan_mode = %status.fan_mode,
                    power = status.power_watts,
                    "state update complete"
                );
            }
            Err(e) => {
                debug!(error = %e, "state update failed, marking unavailable");
                self.state.available = false;
                self.last_error = Some(e);
            }
        }

        let events = state_events(&prev, &self.state);
        for event in &events {
            for cb in &self.event_callbacks {
                cb(event);
            }
        }
        for cb in &self.state_callbacks {
            cb(&self.state);
        }
        if !events.is_empty() {
            trace!(count = events.len(), "state events emitted");
        }
    }

    async fn fetch_status_inner(&mut self) -> Result<DeviceStatus> {
        let id = Uuid::new_v4();
        let stdout = match self.invoke(STATUS_SUBCOMMAND, None).await {
            Ok(stdout) => stdout,
            Err(e) => {
                self.log_failure(id, STATUS_SUBCOMMAND, &e);
                return Err(e);
            }
        };

        let body: Value = match serde_json::from_str(&stdout) {
            Ok(v) => v,
            Err(e) => {
                let e = Error::from(e);
                self.log_failure(id, STATUS_SUBCOMMAND, &e);
                return Err(e);
            }
        };
        if let Some(ref mut logger) = self.logger {
            logger.log_status(id, &body);
        }

        protocol::status_from_value(&body)
    }

    fn apply_status(&mut self, status: &DeviceStatus) {
        let current = Temperature::from_celsius(status.temperature);
        let target = Temperature::from_celsius(status.cooling_setpoint);
        let (mode, action) =
            derive_mode_action(self.api_version, status.switch, &status.ac_mode, current, target);

        let fan_mode = FanMode::from_device_str(&status.fan_mode).unwrap_or_else(|| {
            debug!(fan_mode = %status.fan_mode, "unknown fan mode");
            FanMode::Off
        });

        let power_consumption = match self.api_version {
            ApiVersion::Legacy => status.power_watts,
            ApiVersion::Current if mode == HvacMode::Off => 0.0,
            ApiVersion::Current => status.power_watts / 1000.0,
        };

        self.state = ClimateState {
            available: true,
            mode: Some(mode),
            action: Some(action),
            fan_mode: Some(fan_mode),
            switch: Some(status.switch),
            min_temp: Temperature::from_celsius(status.min_setpoint),
            max_temp: Temperature::from_celsius(status.max_setpoint),
            current_temperature: current,
            target_temperature: target,
            power_consumption,
        };
        self.ac_mode = Some(status.ac_mode.clone());
        self.fan_mode_setting = Some(status.fan_mode.clone());
    }

    // -- Command methods --

    /// Set the cooling setpoint. `None` and non-finite values are ignored.
    pub async fn set_temperature(&mut self, temperature: Option<f64>) {
        let Some(temperature) = temperature.filter(|t| t.is_finite()) else {
            return;
        };
        let span = self.span.clone();
        async {
            self.last_command_error = None;
            let target = Temperature::from_celsius(temperature);
            self.state.target_temperature = target;

            let send = match self.api_version {
                ApiVersion::Current => true,
                ApiVersion::Legacy => self.state.switch == Some(SwitchState::On),
            };
            if send {
                let cmd = protocol::set_cooling_setpoint_command(target.to_setpoint());
                self.run_command(&cmd).await;
            } else {
                debug!(setpoint = %target, "unit is off, setpoint kept locally");
            }

            self.finish_dispatch().await;
        }
        .instrument(span)
        .await
    }

    /// Switch the unit on or off and select its mode. `None` is ignored.
    pub async fn set_hvac_mode(&mut self, mode: Option<HvacMode>) {
        let Some(mode) = mode else {
            return;
        };
        let span = self.span.clone();
        async {
            self.last_command_error = None;
            let device_mode = mode.as_device_str();
            let prev_switch = self.state.switch;
            let switch = if mode == HvacMode::Off {
                SwitchState::Off
            } else {
                SwitchState::On
            };
            let turned_on = switch == SwitchState::On && prev_switch != Some(SwitchState::On);
            self.state.switch = Some(switch);

            let send_switch = match self.api_version {
                ApiVersion::Current => true,
                ApiVersion::Legacy => prev_switch != Some(switch),
            };
            if send_switch {
                self.run_command(&protocol::switch_command(switch)).await;
            }

            if switch == SwitchState::On {
                self.ac_mode = Some(device_mode.to_string());
                self.run_command(&protocol::set_ac_mode_command(device_mode)).await;

                // The legacy unit forgets setpoint and fan speed while off.
                if turned_on && self.api_version == ApiVersion::Legacy {
                    let setpoint = self.state.target_temperature.to_setpoint();
                    self.run_command(&protocol::set_cooling_setpoint_command(setpoint)).await;
                    if let Some(fan) = self.fan_mode_setting.clone() {
                        self.run_command(&protocol::set_fan_mode_command_legacy(&fan)).await;
                    }
                }
            }

            self.finish_dispatch().await;
        }
        .instrument(span)
        .await
    }

    /// Set the fan speed. Only sent while the unit is on. `None` is ignored.
    pub async fn set_fan_mode(&mut self, fan_mode: Option<FanMode>) {
        let Some(fan_mode) = fan_mode else {
            return;
        };
        let span = self.span.clone();
        async {
            self.last_command_error = None;
            self.fan_mode_setting = Some(fan_mode.as_str().to_string());

            // Last polled switch state; may lag a command sent since.
            if self.state.switch == Some(SwitchState::On) {
                let cmd = match self.api_version {
                    ApiVersion::Current => protocol::set_fan_mode_command(fan_mode.as_str()),
                    ApiVersion::Legacy => protocol::set_fan_mode_command_legacy(fan_mode.as_str()),
                };
                self.run_command(&cmd).await;
            } else {
                debug!(fan_mode = fan_mode.as_str(), "unit is off, fan mode kept locally");
            }

            self.finish_dispatch().await;
        }
        .instrument(span)
        .await
    }

    // -- Helpers --

    async fn finish_dispatch(&mut self) {
        if self.refresh_after_command {
            self.update_inner().await;
        }
    }

    async fn run_command(&mut self, command: &str) {
        let id = Uuid::new_v4();
        if let Some(ref mut logger) = self.logger {
            logger.log_command(id, &self.device_id, command);
        }
        if let Err(e) = self.invoke(COMMANDS_SUBCOMMAND, Some(command)).await {
            debug!(command, error = %e, "command failed");
            self.log_failure(id, COMMANDS_SUBCOMMAND, &e);
            if self.last_command_error.is_none() {
                self.last_command_error = Some(e);
            }
        }
    }

    async fn invoke(&self, subcommand: &str, command: Option<&str>) -> Result<String> {
        debug!(
            program = %self.smartthings_path,
            subcommand,
            command = command.unwrap_or(""),
            "running smartthings CLI"
        );
        let args = cli_args(subcommand, &self.device_id, command, &self.access_token);
        let output = self.runner.run(&self.smartthings_path, &args).await?;
        trace!(stdout = %output.stdout, "CLI output");
        Ok(output.stdout)
    }

    fn log_failure(&mut self, id: Uuid, subcommand: &str, error: &Error) {
        if let Some(ref mut logger) = self.logger {
            logger.log_error(id, subcommand, &error.to_string());
        }
    }
}

/// Map switch state and device mode to the entity mode and action.
///
/// The unit reports no running state, so in `auto` mode the action is a
/// guess from the setpoint against the measured temperature.
pub(crate) fn derive_mode_action(
    version: ApiVersion,
    switch: SwitchState,
    ac_mode: &str,
    current: Temperature,
    target: Temperature,
) -> (HvacMode, HvacAction) {
    if switch == SwitchState::Off {
        return (HvacMode::Off, HvacAction::Off);
    }
    match (ac_mode, version) {
        ("auto", ApiVersion::Current) => (HvacMode::Auto, auto_action(current, target)),
        ("auto", ApiVersion::Legacy) => (HvacMode::Auto, HvacAction::Idle),
        ("cool", _) => (HvacMode::Cool, HvacAction::Cooling),
        ("heat", ApiVersion::Current) => (HvacMode::Heat, HvacAction::Heating),
        ("dry", _) => (HvacMode::Dry, HvacAction::Drying),
        ("wind", _) => (HvacMode::FanOnly, HvacAction::Fan),
        (other, _) => {
            debug!(ac_mode = other, "unknown air conditioner mode");
            (HvacMode::Off, HvacAction::Off)
        }
    }
}

fn auto_action(current: Temperature, target: Temperature) -> HvacAction {
    if target.celsius() > current.celsius() + AUTO_IDLE_BAND_C {
        HvacAction::Heating
    } else if target.celsius() < current.celsius() - AUTO_IDLE_BAND_C {
        HvacAction::Cooling
    } else {
        HvacAction::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(v: f64) -> Temperature {
        Temperature::from_celsius(v)
    }

    #[test]
    fn switch_off_wins_over_mode() {
        for mode in ["auto", "cool", "heat", "dry", "wind", "bogus"] {
            for version in [ApiVersion::Legacy, ApiVersion::Current] {
                assert_eq!(
                    derive_mode_action(version, SwitchState::Off, mode, c(24.0), c(22.0)),
                    (HvacMode::Off, HvacAction::Off)
                );
            }
        }
    }

    #[test]
    fn auto_action_thresholds() {
        assert_eq!(auto_action(c(20.0), c(21.5)), HvacAction::Heating);
        assert_eq!(auto_action(c(20.0), c(21.0)), HvacAction::Idle);
        assert_eq!(auto_action(c(20.0), c(19.0)), HvacAction::Idle);
        assert_eq!(auto_action(c(20.0), c(18.5)), HvacAction::Cooling);
        assert_eq!(auto_action(c(20.0), c(20.0)), HvacAction::Idle);
    }

    #[test]
    fn current_mode_table() {
        let on = SwitchState::On;
        let v = ApiVersion::Current;
        assert_eq!(
            derive_mode_action(v, on, "cool", c(24.0), c(22.0)),
            (HvacMode::Cool, HvacAction::Cooling)
        );
        assert_eq!(
            derive_mode_action(v, on, "heat", c(18.0), c(22.0)),
            (HvacMode::Heat, HvacAction::Heating)
        );
        assert_eq!(
            derive_mode_action(v, on, "dry", c(24.0), c(22.0)),
            (HvacMode::Dry, HvacAction::Drying)
        );
        assert_eq!(
            derive_mode_action(v, on, "wind", c(24.0), c(22.0)),
            (HvacMode::FanOnly, HvacAction::Fan)
        );
        assert_eq!(
            derive_mode_action(v, on, "auto", c(24.0), c(20.0)),
            (HvacMode::Auto, HvacAction::Cooling)
        );
        assert_eq!(
            derive_mode_action(v, on, "aIComfort", c(24.0), c(22.0)),
            (HvacMode::Off, HvacAction::Off)
        );
    }

    #[test]
    fn legacy_auto_is_idle_and_heat_unknown() {
        let on = SwitchState::On;
        let v = ApiVersion::Legacy;
        assert_eq!(
            derive_mode_action(v, on, "auto", c(24.0), c(18.0)),
            (HvacMode::Auto, HvacAction::Idle)
        );
        assert_eq!(
            derive_mode_action(v, on, "heat", c(18.0), c(24.0)),
            (HvacMode::Off, HvacAction::Off)
        );
    }
}
