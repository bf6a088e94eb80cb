use serde_json::Value;

use crate::types::{DeviceStatus, SwitchState};
use crate::{Error, Result};

pub const DEFAULT_NAME: &str = "SamsungAC SmartThings CLI";
pub const DEFAULT_SMARTTHINGS_PATH: &str = "/usr/local/bin/smartthings";

pub const STATUS_SUBCOMMAND: &str = "devices:status";
pub const COMMANDS_SUBCOMMAND: &str = "devices:commands";

const MAIN: &str = "/components/main";

const MIN_SETPOINT: &str = "/custom.thermostatSetpointControl/minimumSetpoint/value";
const MAX_SETPOINT: &str = "/custom.thermostatSetpointControl/maximumSetpoint/value";
const AC_MODE: &str = "/airConditionerMode/airConditionerMode/value";
const SWITCH: &str = "/switch/switch/value";
const FAN_MODE: &str = "/airConditionerFanMode/fanMode/value";
const TEMPERATURE: &str = "/temperatureMeasurement/temperature/value";
const COOLING_SETPOINT: &str = "/thermostatCoolingSetpoint/coolingSetpoint/value";
const POWER: &str = "/powerConsumptionReport/powerConsumption/value/power";
const POWER_FLAT: &str = "/powerConsumptionReport/powerConsumption/power/value";

/// Argument vector for one CLI invocation, without the program path:
/// `<subcommand> <device_id> [<command>] -j --token <token>`.
pub fn cli_args(subcommand: &str, device_id: &str, command: Option<&str>, token: &str) -> Vec<String> {
    let mut args = Vec::with_capacity(6);
    args.push(subcommand.to_string());
    args.push(device_id.to_string());
    if let Some(cmd) = command {
        args.push(cmd.to_string());
    }
    args.push("-j".to_string());
    args.push("--token".to_string());
    args.push(token.to_string());
    args
}

pub fn switch_command(state: SwitchState) -> String {
    format!("switch:{}()", state.as_str())
}

pub fn set_cooling_setpoint_command(setpoint: i64) -> String {
    format!("thermostatCoolingSetpoint:setCoolingSetpoint({setpoint})")
}

pub fn set_ac_mode_command(mode: &str) -> String {
    format!("airConditionerMode:setAirConditionerMode({mode})")
}

pub fn set_fan_mode_command(mode: &str) -> String {
    format!("airConditionerFanMode:setFanMode({mode})")
}

/// Fan command name used by the older adapter.
pub fn set_fan_mode_command_legacy(mode: &str) -> String {
    format!("airConditionerFanMode:setAirConditionerFanMode({mode})")
}

pub fn parse_status(body: &str) -> Result<DeviceStatus> {
    let value: Value = serde_json::from_str(body)?;
    status_from_value(&value)
}

/// Extract every field the adapter needs from a parsed status tree.
pub fn status_from_value(root: &Value) -> Result<DeviceStatus> {
    let main = root
        .pointer(MAIN)
        .ok_or_else(|| Error::MissingField(MAIN.to_string()))?;

    let switch_raw = string_at(main, SWITCH)?;
    let switch = SwitchState::from_device_str(switch_raw).ok_or_else(|| Error::InvalidField {
        path: format!("{MAIN}{SWITCH}"),
        expected: "\"on\" or \"off\"",
    })?;

    let power_watts = match main.pointer(POWER) {
        Some(_) => number_at(main, POWER)?,
        None => number_at(main, POWER_FLAT)?,
    };

    Ok(DeviceStatus {
        min_setpoint: number_at(main, MIN_SETPOINT)?,
        max_setpoint: number_at(main, MAX_SETPOINT)?,
        ac_mode: string_at(main, AC_MODE)?.to_string(),
        switch,
        fan_mode: string_at(main, FAN_MODE)?.to_string(),
        temperature: number_at(main, TEMPERATURE)?,
        cooling_setpoint: number_at(main, COOLING_SETPOINT)?,
        power_watts,
    })
}

fn field<'a>(main: &'a Value, path: &str) -> Result<&'a Value> {
    main.pointer(path)
        .filter(|v| !v.is_null())
        .ok_or_else(|| Error::MissingField(format!("{MAIN}{path}")))
}

fn number_at(main: &Value, path: &str) -> Result<f64> {
    field(main, path)?.as_f64().ok_or_else(|| Error::InvalidField {
        path: format!("{MAIN}{path}"),
        expected: "number",
    })
}

fn string_at<'a>(main: &'a Value, path: &str) -> Result<&'a str> {
    field(main, path)?.as_str().ok_or_else(|| Error::InvalidField {
        path: format!("{MAIN}{path}"),
        expected: "string",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status_json() -> Value {
        json!({
            "components": {
                "main": {
                    "custom.thermostatSetpointControl": {
                        "minimumSetpoint": { "value": 16, "unit": "C" },
                        "maximumSetpoint": { "value": 30, "unit": "C" }
                    },
                    "airConditionerMode": { "airConditionerMode": { "value": "cool" } },
                    "switch": { "switch": { "value": "on" } },
                    "airConditionerFanMode": { "fanMode": { "value": "low" } },
                    "temperatureMeasurement": { "temperature": { "value": 24, "unit": "C" } },
                    "thermostatCoolingSetpoint": { "coolingSetpoint": { "value": 22, "unit": "C" } },
                    "powerConsumptionReport": {
                        "powerConsumption": { "value": { "energy": 81230, "power": 410 } }
                    }
                }
            }
        })
    }

    #[test]
    fn cli_args_status() {
        let args = cli_args(STATUS_SUBCOMMAND, "dev-1", None, "tok");
        assert_eq!(args, ["devices:status", "dev-1", "-j", "--token", "tok"]);
    }

    #[test]
    fn cli_args_keep_spaces_in_one_argument() {
        let args = cli_args(COMMANDS_SUBCOMMAND, "dev 1", Some("switch:on()"), "a b");
        assert_eq!(args.len(), 6);
        assert_eq!(args[1], "dev 1");
        assert_eq!(args[2], "switch:on()");
        assert_eq!(args[5], "a b");
    }

    #[test]
    fn command_strings() {
        assert_eq!(switch_command(SwitchState::Off), "switch:off()");
        assert_eq!(
            set_cooling_setpoint_command(22),
            "thermostatCoolingSetpoint:setCoolingSetpoint(22)"
        );
        assert_eq!(
            set_ac_mode_command("wind"),
            "airConditionerMode:setAirConditionerMode(wind)"
        );
        assert_eq!(set_fan_mode_command("high"), "airConditionerFanMode:setFanMode(high)");
        assert_eq!(
            set_fan_mode_command_legacy("high"),
            "airConditionerFanMode:setAirConditionerFanMode(high)"
        );
    }

    #[test]
    fn parse_full_status() {
        let status = status_from_value(&status_json()).unwrap();
        assert_eq!(status.min_setpoint, 16.0);
        assert_eq!(status.max_setpoint, 30.0);
        assert_eq!(status.ac_mode, "cool");
        assert_eq!(status.switch, SwitchState::On);
        assert_eq!(status.fan_mode, "low");
        assert_eq!(status.temperature, 24.0);
        assert_eq!(status.cooling_setpoint, 22.0);
        assert_eq!(status.power_watts, 410.0);
    }

    #[test]
    fn parse_flat_power_layout() {
        let mut value = status_json();
        value["components"]["main"]["powerConsumptionReport"] =
            json!({ "powerConsumption": { "power": { "value": 120.5 } } });
        let status = status_from_value(&value).unwrap();
        assert_eq!(status.power_watts, 120.5);
    }

    #[test]
    fn missing_field_is_reported_with_path() {
        let mut value = status_json();
        value["components"]["main"]
            .as_object_mut()
            .unwrap()
            .remove("temperatureMeasurement");
        let err = status_from_value(&value).unwrap_err();
        match err {
            Error::MissingField(path) => assert!(path.ends_with("/temperatureMeasurement/temperature/value")),
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn wrong_type_is_invalid_field() {
        let mut value = status_json();
        value["components"]["main"]["thermostatCoolingSetpoint"]["coolingSetpoint"]["value"] =
            json!("twenty");
        let err = status_from_value(&value).unwrap_err();
        assert!(matches!(err, Error::InvalidField { expected: "number", .. }));
    }

    #[test]
    fn unknown_switch_value_rejected() {
        let mut value = status_json();
        value["components"]["main"]["switch"]["switch"]["value"] = json!("standby");
        assert!(matches!(
            status_from_value(&value),
            Err(Error::InvalidField { .. })
        ));
    }

    #[test]
    fn empty_and_malformed_bodies() {
        assert!(matches!(parse_status(""), Err(Error::Json(_))));
        assert!(matches!(parse_status("Error: unauthorized"), Err(Error::Json(_))));
        assert!(matches!(parse_status("{}"), Err(Error::MissingField(_))));
    }
}
