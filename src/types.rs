use std::fmt;

use serde::{Deserialize, Serialize};

pub const SUPPORT_TARGET_TEMPERATURE: u32 = 1;
pub const SUPPORT_FAN_MODE: u32 = 8;

/// Temperature in Celsius. The unit reports setpoints in Celsius and the
/// adapter never converts, so this is a thin wrapper for display and
/// setpoint rounding.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct Temperature(f64);

impl Temperature {
    pub fn from_celsius(c: f64) -> Self {
        Self(c)
    }

    pub fn celsius(&self) -> f64 {
        self.0
    }

    /// Whole-degree value accepted by `setCoolingSetpoint`.
    pub fn to_setpoint(&self) -> i64 {
        self.0.round() as i64
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}\u{00b0}C", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

/// Which generation of the adapter's behaviour to reproduce.
///
/// `Legacy` only pushes a setpoint while the unit is on, re-sends the
/// setpoint and fan mode when switching the unit back on, and reports raw
/// watts. `Current` always pushes setpoints, derives an action for `auto`
/// mode and reports kilowatts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    Legacy,
    #[default]
    Current,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HvacMode {
    Off,
    Auto,
    Cool,
    Heat,
    Dry,
    FanOnly,
}

impl HvacMode {
    pub const ALL: [HvacMode; 6] = [
        HvacMode::Auto,
        HvacMode::Cool,
        HvacMode::Dry,
        HvacMode::FanOnly,
        HvacMode::Heat,
        HvacMode::Off,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HvacMode::Off => "off",
            HvacMode::Auto => "auto",
            HvacMode::Cool => "cool",
            HvacMode::Heat => "heat",
            HvacMode::Dry => "dry",
            HvacMode::FanOnly => "fan_only",
        }
    }

    /// Value for `airConditionerMode:setAirConditionerMode`. The device
    /// calls fan-only mode "wind".
    pub fn as_device_str(&self) -> &'static str {
        match self {
            HvacMode::FanOnly => "wind",
            other => other.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HvacAction {
    Off,
    Heating,
    Cooling,
    Drying,
    Idle,
    Fan,
}

impl HvacAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HvacAction::Off => "off",
            HvacAction::Heating => "heating",
            HvacAction::Cooling => "cooling",
            HvacAction::Drying => "drying",
            HvacAction::Idle => "idle",
            HvacAction::Fan => "fan",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FanMode {
    Auto,
    Low,
    Medium,
    High,
    Off,
}

impl FanMode {
    pub const SELECTABLE: [FanMode; 4] = [FanMode::Auto, FanMode::Low, FanMode::Medium, FanMode::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            FanMode::Auto => "auto",
            FanMode::Low => "low",
            FanMode::Medium => "medium",
            FanMode::High => "high",
            FanMode::Off => "off",
        }
    }

    /// Device fan mode string. Anything else is not a mode the unit reports.
    pub fn from_device_str(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(FanMode::Auto),
            "low" => Some(FanMode::Low),
            "medium" => Some(FanMode::Medium),
            "high" => Some(FanMode::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchState {
    On,
    Off,
}

impl SwitchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwitchState::On => "on",
            SwitchState::Off => "off",
        }
    }

    pub fn from_device_str(s: &str) -> Option<Self> {
        match s {
            "on" => Some(SwitchState::On),
            "off" => Some(SwitchState::Off),
            _ => None,
        }
    }
}

/// Fields extracted from one `devices:status` response. Every field is
/// required; a status missing any of them is rejected as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceStatus {
    pub min_setpoint: f64,
    pub max_setpoint: f64,
    pub ac_mode: String,
    pub switch: SwitchState,
    pub fan_mode: String,
    pub temperature: f64,
    pub cooling_setpoint: f64,
    pub power_watts: f64,
}

/// Climate entity state as the host renders it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClimateState {
    pub available: bool,
    pub mode: Option<HvacMode>,
    pub action: Option<HvacAction>,
    pub fan_mode: Option<FanMode>,
    pub switch: Option<SwitchState>,
    pub min_temp: Temperature,
    pub max_temp: Temperature,
    pub current_temperature: Temperature,
    pub target_temperature: Temperature,
    /// Watts for [`ApiVersion::Legacy`], kilowatts for [`ApiVersion::Current`].
    pub power_consumption: f64,
}

/// Events emitted when a refresh changes the entity state.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    AvailabilityChanged { available: bool },
    ModeChanged { mode: Option<HvacMode> },
    ActionChanged { action: Option<HvacAction> },
    FanModeChanged { fan_mode: Option<FanMode> },
    CurrentTemperatureChanged { temp: Temperature },
    TargetTemperatureChanged { temp: Temperature },
    SetpointRangeChanged { min: Temperature, max: Temperature },
    PowerChanged { power: f64 },
}
